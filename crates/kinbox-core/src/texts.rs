//! Localized reply texts.
//!
//! Errors and replies are identified by a [`TextKey`]; the user-facing string
//! is looked up per locale at render time. A JSON file may override or add
//! locales:
//!
//! ```json
//! { "ru": { "no_link_error": "Ссылка не должна содержать пробелов" } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{InboxError, ParseError};

/// Identifies one localized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    DefaultError,
    NoLinkError,
    InvalidDurationError,
    InvalidWordCountError,
    Greeting,
    Added,
    NothingFound,
    MarkedRead,
    MarkedUnread,
    NotFound,
    Help,
}

impl TextKey {
    pub const ALL: [TextKey; 11] = [
        TextKey::DefaultError,
        TextKey::NoLinkError,
        TextKey::InvalidDurationError,
        TextKey::InvalidWordCountError,
        TextKey::Greeting,
        TextKey::Added,
        TextKey::NothingFound,
        TextKey::MarkedRead,
        TextKey::MarkedUnread,
        TextKey::NotFound,
        TextKey::Help,
    ];

    /// Key used in text files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultError => "default_error",
            Self::NoLinkError => "no_link_error",
            Self::InvalidDurationError => "invalid_duration_error",
            Self::InvalidWordCountError => "invalid_wordcount_error",
            Self::Greeting => "greeting",
            Self::Added => "added",
            Self::NothingFound => "nothing_found",
            Self::MarkedRead => "marked_read",
            Self::MarkedUnread => "marked_unread",
            Self::NotFound => "not_found",
            Self::Help => "help",
        }
    }

    fn english(self) -> &'static str {
        match self {
            Self::DefaultError => "Something went wrong, please try again later.",
            Self::NoLinkError => "The link must not contain spaces.",
            Self::InvalidDurationError => "Duration must be a whole number of minutes.",
            Self::InvalidWordCountError => "Word count must be a whole number.",
            Self::Greeting => "Hello, human",
            Self::Added => "Added!",
            Self::NothingFound => "Nothing found.",
            Self::MarkedRead => "Marked as read.",
            Self::MarkedUnread => "Marked as unread.",
            Self::NotFound => "No such record.",
            Self::Help => "Send a message with a link and labeled lines (Name:, Theme:, Duration: ...). \
                 Commands: /list, /search <words>, /read <id>.",
        }
    }

    fn russian(self) -> &'static str {
        match self {
            Self::DefaultError => "Что-то пошло не так, попробуйте позже.",
            Self::NoLinkError => "Ссылка не должна содержать пробелов.",
            Self::InvalidDurationError => "Длительность должна быть целым числом минут.",
            Self::InvalidWordCountError => "Количество слов должно быть целым числом.",
            Self::Greeting => "Привет, человек",
            Self::Added => "Успешно добавлено!",
            Self::NothingFound => "Ничего не найдено.",
            Self::MarkedRead => "Отмечено как прочитанное.",
            Self::MarkedUnread => "Отмечено как непрочитанное.",
            Self::NotFound => "Нет такой записи.",
            Self::Help => "Отправьте сообщение со ссылкой и строками с метками (Название:, Тема:, Длительность: ...). \
                 Команды: /list, /search <слова>, /read <id>.",
        }
    }
}

/// Locale-keyed text table with a fallback locale.
#[derive(Debug, Clone)]
pub struct Texts {
    locales: HashMap<String, HashMap<String, String>>,
    fallback: String,
}

impl Texts {
    /// The shipped `en` and `ru` tables, falling back to `en`.
    #[must_use]
    pub fn builtin() -> Self {
        let table = |text: fn(TextKey) -> &'static str| {
            TextKey::ALL
                .iter()
                .map(|k| (k.as_str().to_string(), text(*k).to_string()))
                .collect::<HashMap<_, _>>()
        };

        let mut locales = HashMap::new();
        locales.insert("en".to_string(), table(TextKey::english));
        locales.insert("ru".to_string(), table(TextKey::russian));
        Self {
            locales,
            fallback: "en".to_string(),
        }
    }

    /// Load a JSON text file layered over [`Texts::builtin`].
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Io`] if the file cannot be read and
    /// [`InboxError::Serialization`] if it is not a locale → key → text map.
    pub fn load(path: &Path) -> Result<Self, InboxError> {
        let content = std::fs::read_to_string(path)?;
        Self::builtin().merge_json(&content)
    }

    /// Layer a JSON text table over this one.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Serialization`] on malformed JSON.
    pub fn merge_json(mut self, json: &str) -> Result<Self, InboxError> {
        let overrides: HashMap<String, HashMap<String, String>> =
            serde_json::from_str(json).map_err(|e| InboxError::Serialization(e.to_string()))?;
        for (locale, entries) in overrides {
            self.locales
                .entry(normalize_locale(&locale))
                .or_default()
                .extend(entries);
        }
        Ok(self)
    }

    /// Use a different fallback locale.
    #[must_use]
    pub fn with_fallback(mut self, locale: &str) -> Self {
        self.fallback = normalize_locale(locale);
        self
    }

    /// Resolve a text for a locale such as `ru`, `en-US` or `""`.
    ///
    /// Lookup order is the requested locale, the fallback locale, then the
    /// built-in English text, so this never fails.
    #[must_use]
    pub fn render(&self, key: TextKey, locale: &str) -> &str {
        let requested = normalize_locale(locale);
        [requested.as_str(), self.fallback.as_str()]
            .iter()
            .find_map(|l| self.locales.get(*l)?.get(key.as_str()))
            .map_or_else(|| key.english(), String::as_str)
    }

    /// Display text for a parse error in the given locale.
    #[must_use]
    pub fn render_error(&self, err: &ParseError, locale: &str) -> &str {
        self.render(err.text_key(), locale)
    }
}

impl Default for Texts {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `en-US` → `en`, `RU` → `ru`.
fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}
