//! Field labels: the literal spellings that name a structured field in a message.
//!
//! Labels are matched case-insensitively only in the narrow sense of trying the
//! original, all-lowercase and all-uppercase spellings. There is no other
//! normalization: diacritics and typos are not tolerated.

use serde::{Deserialize, Serialize};

/// A structured field of a [`crate::KnowledgeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Link,
    Name,
    Theme,
    Sphere,
    KnowledgeType,
    Subtype,
    Duration,
    WordCount,
}

impl Field {
    /// Every field, in the order lines are dispatched to them.
    ///
    /// Link comes first: a bare URL matches no other label.
    pub const ALL: [Field; 8] = [
        Field::Link,
        Field::Name,
        Field::Theme,
        Field::Sphere,
        Field::KnowledgeType,
        Field::Subtype,
        Field::Duration,
        Field::WordCount,
    ];

    /// Whether the extracted value must parse as an integer.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Duration | Field::WordCount)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Link => "link",
            Self::Name => "name",
            Self::Theme => "theme",
            Self::Sphere => "sphere",
            Self::KnowledgeType => "type",
            Self::Subtype => "subtype",
            Self::Duration => "duration",
            Self::WordCount => "word_count",
        };
        f.write_str(name)
    }
}

/// Recognized spellings per field, as declared (before case expansion).
///
/// Deserializes with per-field defaults so a config file can override a
/// single field and keep the canonical spellings of the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub link: Vec<String>,
    pub name: Vec<String>,
    pub theme: Vec<String>,
    pub sphere: Vec<String>,
    #[serde(rename = "type")]
    pub knowledge_type: Vec<String>,
    pub subtype: Vec<String>,
    pub duration: Vec<String>,
    pub word_count: Vec<String>,
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            link: owned(&["Ссылка", "Link"]),
            name: owned(&["Название", "Name"]),
            theme: owned(&["Тема", "Theme", "Topic"]),
            sphere: owned(&["Сфера", "#", "Sphere"]),
            knowledge_type: owned(&["Тип", "Type"]),
            subtype: owned(&["Подтип", "Subtype"]),
            duration: owned(&["Длительность", "Duration"]),
            word_count: owned(&[
                "Количество слов",
                "Word Count",
                "Word",
                "Слов",
                "Words",
                "Слова",
                "Слово",
            ]),
        }
    }
}

impl FieldLabels {
    /// The declared spellings of one field.
    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        match field {
            Field::Link => &self.link,
            Field::Name => &self.name,
            Field::Theme => &self.theme,
            Field::Sphere => &self.sphere,
            Field::KnowledgeType => &self.knowledge_type,
            Field::Subtype => &self.subtype,
            Field::Duration => &self.duration,
            Field::WordCount => &self.word_count,
        }
    }

    /// Expand one field's spellings into a [`LabelSet`].
    #[must_use]
    pub fn label_set(&self, field: Field) -> LabelSet {
        LabelSet::expand(self.get(field))
    }
}

/// The widened spelling list of one field.
///
/// Order is originals, then all-lowercase copies, then all-uppercase copies,
/// each group in declaration order. Entries are not deduplicated: extraction
/// runs one pass per entry, so `#` is stripped up to three times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    expanded: Vec<String>,
}

impl LabelSet {
    /// Expand declared spellings with their lowercase and uppercase copies.
    pub fn expand<S: AsRef<str>>(labels: &[S]) -> Self {
        let originals = labels.iter().map(|s| s.as_ref().to_string());
        let lower = labels.iter().map(|s| s.as_ref().to_lowercase());
        let upper = labels.iter().map(|s| s.as_ref().to_uppercase());
        Self {
            expanded: originals.chain(lower).chain(upper).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
