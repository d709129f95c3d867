//! Startup configuration.
//!
//! Read once from a TOML file and handed to the components that need it.
//!
//! ```toml
//! db_path = "kinbox.db"
//! local = false
//! log_file = "logs.txt"
//! default_locale = "ru"
//! texts_path = "texts.json"
//! command = "/add"
//!
//! [labels]
//! theme = ["Тема", "Theme", "Topic", "Subject"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InboxError;
use crate::labels::FieldLabels;
use crate::texts::Texts;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kinbox.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Log to stderr when true, append to `log_file` otherwise.
    pub local: bool,
    pub log_file: PathBuf,
    /// Locale used when the sender's language has no text table.
    pub default_locale: String,
    /// Optional JSON text table layered over the built-in texts.
    pub texts_path: Option<PathBuf>,
    /// Command token stripped from the start of a submitted message.
    pub command: String,
    pub labels: FieldLabels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("kinbox.db"),
            local: true,
            log_file: PathBuf::from("logs.txt"),
            default_locale: "en".to_string(),
            texts_path: None,
            command: "/add".to_string(),
            labels: FieldLabels::default(),
        }
    }
}

impl Config {
    /// Parse a TOML config document.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Config`] if the TOML is malformed.
    pub fn from_toml(content: &str) -> Result<Self, InboxError> {
        toml::from_str(content).map_err(|e| InboxError::Config(e.to_string()))
    }

    /// Read a config file.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Io`] if the file cannot be read and
    /// [`InboxError::Config`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, InboxError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Read `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// An explicitly given path must exist; see [`Config::load`].
    pub fn discover(path: Option<&Path>) -> Result<Self, InboxError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Build the text table this config describes.
    ///
    /// # Errors
    ///
    /// Propagates [`Texts::load`] failures for a configured `texts_path`.
    pub fn texts(&self) -> Result<Texts, InboxError> {
        let texts = match &self.texts_path {
            Some(path) => Texts::load(path)?,
            None => Texts::builtin(),
        };
        Ok(texts.with_fallback(&self.default_locale))
    }
}
