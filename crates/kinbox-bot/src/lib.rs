//! # kinbox-bot
//!
//! Chat layer for kinbox, independent of any messaging network.
//!
//! A transport hands the [`Bot`] one [`IncomingMessage`] at a time and
//! delivers the returned [`Reply`], if any. Commands:
//! - `/start`: greeting
//! - the configured command (`/add <message>` by default) or any plain
//!   message: parse and store a record
//! - `/list`: recent unread records
//! - `/search <words>`: full-text search over the sender's records
//! - `/read <id>`: toggle a record between read and unread
//! - `/help`: usage
//!
//! Unknown commands get no reply.

pub mod command;

use serde::{Deserialize, Serialize};

use kinbox_core::{user_id, InboxError, Knowledge, TextKey, Texts, User};
use kinbox_parser::KnowledgeParser;
use kinbox_store::{ListFilter, Store};

pub use command::Command;

/// Records shown by `/list` and `/search`.
const LISTING_LIMIT: usize = 20;

/// The sender as the chat network describes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// IETF language code such as `ru` or `en-US`.
    pub language: String,
}

impl ChatUser {
    fn to_user(&self) -> User {
        User {
            id: user_id(self.id),
            tg_id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            language: self.language.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub user: ChatUser,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
}

/// Routes messages to the parser and the store.
pub struct Bot {
    parser: KnowledgeParser,
    store: Store,
    texts: Texts,
}

impl Bot {
    #[must_use]
    pub fn new(parser: KnowledgeParser, store: Store, texts: Texts) -> Self {
        Self {
            parser,
            store,
            texts,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handle one message and produce the reply to send back, if any.
    pub fn handle(&self, msg: &IncomingMessage) -> Option<Reply> {
        let user = msg.user.to_user();
        self.ensure_user(&user);
        let locale = msg.user.language.as_str();

        let text = match Command::parse(&msg.text, self.parser.command()) {
            Command::Start => self.text(TextKey::Greeting, locale),
            Command::Add(body) => self.add(&user.id, body, locale),
            Command::List => self.list(&user.id, locale),
            Command::Search(query) if query.is_empty() => self.text(TextKey::Help, locale),
            Command::Search(query) => self.search(&user.id, query, locale),
            Command::Read(id) => self.toggle(&user.id, id, locale),
            Command::Help => self.text(TextKey::Help, locale),
            Command::Unknown(name) => {
                tracing::debug!(command = name, "ignoring unknown command");
                return None;
            }
        };

        Some(Reply {
            chat_id: msg.user.id,
            text,
        })
    }

    /// Register the sender on first contact. Failures are logged, not fatal.
    fn ensure_user(&self, user: &User) {
        let result = self.store.user_exists(&user.id).and_then(|exists| {
            if exists {
                Ok(())
            } else {
                self.store.create_user(user)
            }
        });
        if let Err(e) = result {
            tracing::error!(user = %user.id, error = %e, "failed to register user");
        }
    }

    fn text(&self, key: TextKey, locale: &str) -> String {
        self.texts.render(key, locale).to_string()
    }

    fn add(&self, adder: &str, body: &str, locale: &str) -> String {
        let record = match self.parser.parse(body) {
            Ok(record) => record,
            Err(e) => {
                tracing::info!(%adder, error = %e, "failed to parse knowledge");
                return self.texts.render_error(&e, locale).to_string();
            }
        };

        match self.store.create_knowledge(adder, record) {
            Ok(knw) => format!("{} ({})", self.texts.render(TextKey::Added, locale), knw.id),
            Err(e) => {
                tracing::error!(%adder, error = %e, "error while creating knowledge");
                self.text(TextKey::DefaultError, locale)
            }
        }
    }

    fn list(&self, adder: &str, locale: &str) -> String {
        let filter = ListFilter {
            unread_only: true,
            limit: Some(LISTING_LIMIT),
            ..ListFilter::for_adder(adder)
        };
        self.render_listing(self.store.list(&filter), locale)
    }

    fn search(&self, adder: &str, query: &str, locale: &str) -> String {
        let filter = ListFilter {
            limit: Some(LISTING_LIMIT),
            ..ListFilter::for_adder(adder)
        };
        self.render_listing(self.store.search(query, &filter), locale)
    }

    fn render_listing(&self, found: Result<Vec<Knowledge>, InboxError>, locale: &str) -> String {
        match found {
            Ok(items) if items.is_empty() => self.text(TextKey::NothingFound, locale),
            Ok(items) => items.iter().map(summary).collect::<Vec<_>>().join("\n"),
            Err(e) => {
                tracing::error!(error = %e, "error while reading knowledge");
                self.text(TextKey::DefaultError, locale)
            }
        }
    }

    fn toggle(&self, adder: &str, id: &str, locale: &str) -> String {
        // Records of other users look the same as missing ones.
        let owned = match self.store.get_knowledge(id) {
            Ok(found) => found.is_some_and(|k| k.adder == adder),
            Err(e) => {
                tracing::error!(%id, error = %e, "error while reading knowledge");
                return self.text(TextKey::DefaultError, locale);
            }
        };
        if !owned {
            return self.text(TextKey::NotFound, locale);
        }

        match self.store.toggle_read(id) {
            Ok(true) => self.text(TextKey::MarkedRead, locale),
            Ok(false) => self.text(TextKey::MarkedUnread, locale),
            Err(InboxError::NotFound(_)) => self.text(TextKey::NotFound, locale),
            Err(e) => {
                tracing::error!(%id, error = %e, "error while toggling read flag");
                self.text(TextKey::DefaultError, locale)
            }
        }
    }
}

/// One listing line: read mark, title, link, id.
fn summary(k: &Knowledge) -> String {
    let mark = if k.is_read { "[x]" } else { "[ ]" };
    let r = &k.record;
    let mut line = String::from(mark);
    for part in [&r.name, &r.link] {
        if !part.is_empty() {
            line.push(' ');
            line.push_str(part);
        }
    }
    line.push_str(&format!(" ({})", k.id));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinbox_core::Config;

    fn bot() -> Bot {
        Bot::new(
            KnowledgeParser::default(),
            Store::in_memory().unwrap(),
            Texts::builtin(),
        )
    }

    fn msg(chat_id: i64, language: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            user: ChatUser {
                id: chat_id,
                username: "tester".to_string(),
                language: language.to_string(),
                ..ChatUser::default()
            },
            text: text.to_string(),
        }
    }

    fn added_id(reply: &Reply) -> String {
        let start = reply.text.rfind('(').unwrap() + 1;
        reply.text[start..reply.text.len() - 1].to_string()
    }

    #[test]
    fn start_greets_in_user_language() {
        let bot = bot();
        let reply = bot.handle(&msg(1, "ru", "/start")).unwrap();
        assert_eq!(reply.text, "Привет, человек");
        assert_eq!(reply.chat_id, 1);
    }

    #[test]
    fn first_message_registers_user() {
        let bot = bot();
        bot.handle(&msg(7, "en", "/help")).unwrap();
        let user = bot.store().get_user(&user_id(7)).unwrap().unwrap();
        assert_eq!(user.tg_id, 7);
        assert_eq!(user.username, "tester");

        // A second message does not fail on the existing user.
        bot.handle(&msg(7, "en", "/help")).unwrap();
    }

    #[test]
    fn plain_message_is_stored() {
        let bot = bot();
        let reply = bot
            .handle(&msg(
                1,
                "en",
                "https://x.com/a\nName: Talk\nTheme: Rust\nDuration: 45",
            ))
            .unwrap();
        assert!(reply.text.starts_with("Added!"), "{}", reply.text);

        let knw = bot.store().get_knowledge(&added_id(&reply)).unwrap().unwrap();
        assert_eq!(knw.adder, user_id(1));
        assert_eq!(knw.record.link, "https://x.com/a");
        assert_eq!(knw.record.name, "Talk");
        assert_eq!(knw.record.duration, 45);
    }

    #[test]
    fn add_command_is_stored() {
        let bot = bot();
        let reply = bot
            .handle(&msg(1, "ru", "/add Ссылка: https://x.com/a"))
            .unwrap();
        assert!(reply.text.starts_with("Успешно добавлено!"));
        assert_eq!(bot.store().count().unwrap(), 1);
    }

    #[test]
    fn configured_command_is_a_submission() {
        let config = Config {
            command: "/save".to_string(),
            ..Config::default()
        };
        let bot = Bot::new(
            KnowledgeParser::from_config(&config),
            Store::in_memory().unwrap(),
            Texts::builtin(),
        );

        let reply = bot.handle(&msg(1, "en", "/save Name: Notes")).unwrap();
        assert!(reply.text.starts_with("Added!"), "{}", reply.text);
        let stored = bot.store().list(&ListFilter::for_adder(&user_id(1))).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.name, "Notes");

        // The default token is no longer special.
        assert!(bot.handle(&msg(1, "en", "/add Name: Other")).is_none());
        assert_eq!(bot.store().count().unwrap(), 1);
    }

    #[test]
    fn parse_errors_are_localized_and_nothing_is_stored() {
        let bot = bot();
        let reply = bot
            .handle(&msg(1, "ru", "Длительность: 10\nDuration: abc"))
            .unwrap();
        assert_eq!(reply.text, "Длительность должна быть целым числом минут.");

        let reply = bot
            .handle(&msg(1, "en", "https://x.com/a Something"))
            .unwrap();
        assert_eq!(reply.text, "The link must not contain spaces.");

        assert_eq!(bot.store().count().unwrap(), 0);
    }

    #[test]
    fn list_shows_only_unread_of_sender() {
        let bot = bot();
        let first = bot.handle(&msg(1, "en", "Name: First")).unwrap();
        bot.handle(&msg(1, "en", "Name: Second")).unwrap();
        bot.handle(&msg(2, "en", "Name: Foreign")).unwrap();

        bot.handle(&msg(1, "en", &format!("/read {}", added_id(&first))))
            .unwrap();

        let listing = bot.handle(&msg(1, "en", "/list")).unwrap().text;
        assert!(listing.contains("Second"));
        assert!(!listing.contains("First"));
        assert!(!listing.contains("Foreign"));
    }

    #[test]
    fn empty_list_says_nothing_found() {
        let bot = bot();
        assert_eq!(bot.handle(&msg(1, "en", "/list")).unwrap().text, "Nothing found.");
    }

    #[test]
    fn search_finds_own_records() {
        let bot = bot();
        bot.handle(&msg(1, "en", "Name: Cognitive Design\nTheme: Market Research"))
            .unwrap();
        bot.handle(&msg(2, "en", "Name: Market basics")).unwrap();

        let found = bot.handle(&msg(1, "en", "/search market")).unwrap().text;
        assert!(found.contains("Cognitive Design"));
        assert!(!found.contains("Market basics"));

        let none = bot.handle(&msg(1, "en", "/search zebra")).unwrap().text;
        assert_eq!(none, "Nothing found.");

        let usage = bot.handle(&msg(1, "en", "/search")).unwrap().text;
        assert_eq!(usage, Texts::builtin().render(TextKey::Help, "en"));
    }

    #[test]
    fn read_toggles_back_and_forth() {
        let bot = bot();
        let id = added_id(&bot.handle(&msg(1, "en", "Name: Toggle me")).unwrap());
        let read = format!("/read {id}");

        assert_eq!(bot.handle(&msg(1, "en", &read)).unwrap().text, "Marked as read.");
        assert_eq!(bot.handle(&msg(1, "en", &read)).unwrap().text, "Marked as unread.");
    }

    #[test]
    fn read_of_foreign_or_missing_record_is_not_found() {
        let bot = bot();
        let id = added_id(&bot.handle(&msg(1, "en", "Name: Mine")).unwrap());

        let reply = bot.handle(&msg(2, "en", &format!("/read {id}"))).unwrap();
        assert_eq!(reply.text, "No such record.");
        assert!(!bot.store().get_knowledge(&id).unwrap().unwrap().is_read);

        let reply = bot.handle(&msg(1, "en", "/read knw-missing")).unwrap();
        assert_eq!(reply.text, "No such record.");
    }

    #[test]
    fn unknown_command_gets_no_reply() {
        let bot = bot();
        assert!(bot.handle(&msg(1, "en", "/raffle")).is_none());
    }

    #[test]
    fn messages_deserialize_from_json_lines() {
        let line = r#"{"user": {"id": 5, "language": "ru"}, "text": "/start"}"#;
        let msg: IncomingMessage = serde_json::from_str(line).unwrap();
        assert_eq!(msg.user.id, 5);
        assert_eq!(msg.user.username, "");
        assert_eq!(bot().handle(&msg).unwrap().text, "Привет, человек");
    }

    #[test]
    fn summary_marks_read_state() {
        let k = Knowledge {
            id: "knw-1".to_string(),
            adder: "usr-1".to_string(),
            created_at: chrono::Utc::now(),
            is_read: true,
            record: kinbox_core::KnowledgeRecord {
                name: "Talk".to_string(),
                link: "https://x.com".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(summary(&k), "[x] Talk https://x.com (knw-1)");
    }
}
