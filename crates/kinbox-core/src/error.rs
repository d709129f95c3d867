//! Error types for kinbox.

use thiserror::Error;

use crate::texts::TextKey;

/// Top-level result type for kinbox operations.
pub type Result<T> = std::result::Result<T, InboxError>;

/// Top-level error type for kinbox.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Reasons a message cannot be turned into a record.
///
/// The variants are language-agnostic. `Display` is meant for logs; what the
/// user sees is resolved through [`crate::Texts`] via [`ParseError::text_key`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("link candidate contains whitespace: {value:?}")]
    NoLink { value: String },

    #[error("duration is not a non-negative integer: {value:?}")]
    InvalidDuration { value: String },

    #[error("word count is not a non-negative integer: {value:?}")]
    InvalidWordCount { value: String },
}

impl ParseError {
    /// The localized text that describes this error to the sender.
    #[must_use]
    pub fn text_key(&self) -> TextKey {
        match self {
            Self::NoLink { .. } => TextKey::NoLinkError,
            Self::InvalidDuration { .. } => TextKey::InvalidDurationError,
            Self::InvalidWordCount { .. } => TextKey::InvalidWordCountError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = ParseError::InvalidDuration {
            value: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("duration"));
        assert!(msg.contains("abc"));

        let err = InboxError::from(ParseError::NoLink {
            value: "https://x.com/a Something".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("parse error"));
        assert!(msg.contains("Something"));
    }

    #[test]
    fn each_parse_error_has_its_own_text() {
        let keys = [
            ParseError::NoLink {
                value: String::new(),
            }
            .text_key(),
            ParseError::InvalidDuration {
                value: String::new(),
            }
            .text_key(),
            ParseError::InvalidWordCount {
                value: String::new(),
            }
            .text_key(),
        ];
        assert_eq!(
            keys,
            [
                TextKey::NoLinkError,
                TextKey::InvalidDurationError,
                TextKey::InvalidWordCountError
            ]
        );
    }
}
