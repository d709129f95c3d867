//! # kinbox-core
//!
//! Core types shared by every kinbox crate.
//!
//! - [`KnowledgeRecord`]: the fields recovered from one free-text message
//! - [`Knowledge`] and [`User`]: what the store persists
//! - [`Field`], [`FieldLabels`], [`LabelSet`]: recognized label spellings
//! - Error hierarchy ([`InboxError`], [`ParseError`])
//! - Localized reply texts ([`Texts`], [`TextKey`])
//! - Startup configuration ([`Config`])

pub mod config;
pub mod error;
pub mod labels;
pub mod record;
pub mod texts;

pub use config::Config;
pub use error::{InboxError, ParseError, Result};
pub use labels::{Field, FieldLabels, LabelSet};
pub use record::{knowledge_id, user_id, Knowledge, KnowledgeRecord, User};
pub use texts::{TextKey, Texts};
