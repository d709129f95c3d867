//! Knowledge records and the users who add them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The fields recovered from one free-text message.
///
/// An unset string field is empty, an unset number is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeRecord {
    pub name: String,
    /// Never contains whitespace.
    pub link: String,
    pub theme: String,
    pub sphere: String,
    #[serde(rename = "type")]
    pub knowledge_type: String,
    pub subtype: String,
    /// Minutes.
    pub duration: u64,
    pub word_count: u64,
}

impl KnowledgeRecord {
    /// True when no field was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A record as persisted: the parsed fields plus who added it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub id: String,
    pub adder: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(flatten)]
    pub record: KnowledgeRecord,
}

impl Knowledge {
    /// Attach an owner and a creation time to a freshly parsed record.
    #[must_use]
    pub fn new(adder: &str, record: KnowledgeRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id: knowledge_id(adder, created_at, &record),
            adder: adder.to_string(),
            created_at,
            is_read: false,
            record,
        }
    }
}

/// A chat user known to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tg_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub language: String,
}

fn short_digest(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Stable user identifier derived from the chat-side numeric id.
#[must_use]
pub fn user_id(chat_id: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chat_id.to_be_bytes());
    format!("usr-{}", short_digest(hasher))
}

/// Identifier of a stored record, derived from its owner, creation time and content.
#[must_use]
pub fn knowledge_id(adder: &str, created_at: DateTime<Utc>, record: &KnowledgeRecord) -> String {
    // Adder ids and links never contain a newline, so it delimits them.
    let mut hasher = Sha256::new();
    hasher.update(adder.as_bytes());
    hasher.update(b"\n");
    hasher.update(
        created_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| created_at.timestamp())
            .to_be_bytes(),
    );
    hasher.update(record.link.as_bytes());
    hasher.update(b"\n");
    hasher.update(record.name.as_bytes());
    format!("knw-{}", short_digest(hasher))
}
