//! # kinbox-parser
//!
//! Turns a loosely formatted chat message into a [`KnowledgeRecord`].
//!
//! A message is read line by line. Each line is tried against every field's
//! label spellings (Russian and English by default); a line matches a field
//! when it starts or ends with one of them, and any line carrying a URL is a
//! link candidate. The label and its separator are stripped and the rest is
//! the value:
//!
//! ```text
//! /add https://example.com/talk
//! Название: Talk about parsers
//! Тема: Rust
//! #Engineering
//! Duration: 45
//! ```
//!
//! Parsing is all-or-nothing: a link with spaces in it or a non-numeric
//! duration or word count rejects the whole message.

pub mod dispatch;
pub mod extract;
pub mod matcher;

use std::sync::LazyLock;

use kinbox_core::{Config, FieldLabels, KnowledgeRecord, ParseError};

pub use dispatch::{dispatch, ExpandedLabels};
pub use extract::extract;
pub use matcher::{looks_like_url, matches};

/// Command token stripped from the start of a message by default.
pub const DEFAULT_COMMAND: &str = "/add";

static DEFAULT_PARSER: LazyLock<KnowledgeParser> = LazyLock::new(KnowledgeParser::default);

/// Parser over a fixed label table.
///
/// Holds no mutable state, so one instance can serve any number of callers.
#[derive(Debug, Clone)]
pub struct KnowledgeParser {
    labels: ExpandedLabels,
    command: String,
}

impl KnowledgeParser {
    /// Build a parser for the given labels and command token.
    #[must_use]
    pub fn new(labels: &FieldLabels, command: impl Into<String>) -> Self {
        Self {
            labels: ExpandedLabels::new(labels),
            command: command.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.labels, config.command.as_str())
    }

    /// The command token that introduces a submission.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Parse a whole message.
    ///
    /// The command token is removed if the message starts with it (case
    /// sensitive), then each non-empty trimmed line is dispatched in order.
    /// When several lines set the same field the last one wins.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] hit; nothing parsed before it is kept.
    pub fn parse(&self, text: &str) -> Result<KnowledgeRecord, ParseError> {
        let text = text.strip_prefix(self.command.as_str()).unwrap_or(text);
        let mut record = KnowledgeRecord::default();

        for line in text.trim().split('\n').map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if let Err(err) = dispatch(line, &self.labels, &mut record) {
                tracing::warn!(%line, error = %err, "rejected knowledge message");
                return Err(err);
            }
        }

        Ok(record)
    }
}

impl Default for KnowledgeParser {
    fn default() -> Self {
        Self::new(&FieldLabels::default(), DEFAULT_COMMAND)
    }
}

/// Parse with the canonical labels and the `/add` command.
///
/// # Errors
///
/// See [`KnowledgeParser::parse`].
pub fn parse_knowledge(text: &str) -> Result<KnowledgeRecord, ParseError> {
    DEFAULT_PARSER.parse(text)
}
