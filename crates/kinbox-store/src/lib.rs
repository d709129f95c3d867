//! # kinbox-store
//!
//! SQLite record store for kinbox.
//!
//! - `users` table for chat users, keyed by a derived id
//! - `knowledge` table for parsed records with a read/unread flag
//! - FTS5 virtual table over the text fields for search

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use kinbox_core::error::InboxError;
use kinbox_core::{Knowledge, KnowledgeRecord, User};

const KNOWLEDGE_COLUMNS: &str = "k.id, k.adder, k.created_at, k.is_read, k.name, k.link, k.theme, \
     k.sphere, k.knowledge_type, k.subtype, k.duration, k.word_count";

/// Which stored records to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only records added by this user id.
    pub adder: Option<String>,
    pub unread_only: bool,
    pub limit: Option<usize>,
}

impl ListFilter {
    #[must_use]
    pub fn for_adder(adder: &str) -> Self {
        Self {
            adder: Some(adder.to_string()),
            ..Self::default()
        }
    }

    fn sql_limit(&self) -> i64 {
        // SQLite treats a negative LIMIT as unbounded.
        self.limit
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1)
    }
}

/// The Store owns the SQLite connection.
pub struct Store {
    conn: Connection,
}

fn store_err(e: rusqlite::Error) -> InboxError {
    InboxError::Store(e.to_string())
}

/// SQLite integers are signed 64-bit.
fn count_to_sql(n: u64) -> Result<i64, InboxError> {
    i64::try_from(n).map_err(|_| InboxError::Store(format!("count {n} exceeds the integer range")))
}

fn count_from_sql(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let n: i64 = row.get(idx)?;
    u64::try_from(n).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Integer, Box::new(e))
    })
}

impl Store {
    /// Open or create a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, InboxError> {
        let conn = Connection::open(path).map_err(store_err)?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if schema creation fails.
    pub fn in_memory() -> Result<Self, InboxError> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<(), InboxError> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                tg_id INTEGER NOT NULL UNIQUE,
                username TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                language TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS knowledge (
                id TEXT PRIMARY KEY,
                adder TEXT NOT NULL,
                created_at TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                name TEXT NOT NULL DEFAULT '',
                link TEXT NOT NULL DEFAULT '',
                theme TEXT NOT NULL DEFAULT '',
                sphere TEXT NOT NULL DEFAULT '',
                knowledge_type TEXT NOT NULL DEFAULT '',
                subtype TEXT NOT NULL DEFAULT '',
                duration INTEGER NOT NULL DEFAULT 0,
                word_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts USING fts5(
                name,
                theme,
                sphere,
                knowledge_type,
                subtype,
                link,
                content='knowledge',
                content_rowid='rowid'
            );

            CREATE TRIGGER IF NOT EXISTS knowledge_ai AFTER INSERT ON knowledge BEGIN
                INSERT INTO knowledge_fts(rowid, name, theme, sphere, knowledge_type, subtype, link)
                VALUES (new.rowid, new.name, new.theme, new.sphere, new.knowledge_type, new.subtype, new.link);
            END;

            CREATE TRIGGER IF NOT EXISTS knowledge_ad AFTER DELETE ON knowledge BEGIN
                INSERT INTO knowledge_fts(knowledge_fts, rowid, name, theme, sphere, knowledge_type, subtype, link)
                VALUES ('delete', old.rowid, old.name, old.theme, old.sphere, old.knowledge_type, old.subtype, old.link);
            END;

            CREATE TRIGGER IF NOT EXISTS knowledge_au AFTER UPDATE ON knowledge BEGIN
                INSERT INTO knowledge_fts(knowledge_fts, rowid, name, theme, sphere, knowledge_type, subtype, link)
                VALUES ('delete', old.rowid, old.name, old.theme, old.sphere, old.knowledge_type, old.subtype, old.link);
                INSERT INTO knowledge_fts(rowid, name, theme, sphere, knowledge_type, subtype, link)
                VALUES (new.rowid, new.name, new.theme, new.sphere, new.knowledge_type, new.subtype, new.link);
            END;

            CREATE INDEX IF NOT EXISTS idx_knowledge_adder ON knowledge(adder);
            CREATE INDEX IF NOT EXISTS idx_knowledge_created_at ON knowledge(created_at);
            ",
            )
            .map_err(store_err)?;

        Ok(())
    }

    /// Register a chat user.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the insert fails (e.g. the id exists).
    pub fn create_user(&self, user: &User) -> Result<(), InboxError> {
        self.conn
            .execute(
                "INSERT INTO users (id, tg_id, username, first_name, last_name, language)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id,
                    user.tg_id,
                    user.username,
                    user.first_name,
                    user.last_name,
                    user.language,
                ],
            )
            .map_err(store_err)?;
        tracing::debug!(id = %user.id, "created user");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn user_exists(&self, id: &str) -> Result<bool, InboxError> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .map_err(store_err)
    }

    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn get_user(&self, id: &str) -> Result<Option<User>, InboxError> {
        self.conn
            .query_row(
                "SELECT id, tg_id, username, first_name, last_name, language
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        tg_id: row.get(1)?,
                        username: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        language: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(store_err)
    }

    /// Store a freshly parsed record for `adder`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the insert fails.
    pub fn create_knowledge(
        &self,
        adder: &str,
        record: KnowledgeRecord,
    ) -> Result<Knowledge, InboxError> {
        let knowledge = Knowledge::new(adder, record, Utc::now());
        self.insert_knowledge(&knowledge)?;
        Ok(knowledge)
    }

    /// Insert a fully formed record.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the insert fails.
    pub fn insert_knowledge(&self, knw: &Knowledge) -> Result<(), InboxError> {
        let r = &knw.record;
        self.conn
            .execute(
                "INSERT INTO knowledge
                (id, adder, created_at, is_read, name, link, theme, sphere,
                 knowledge_type, subtype, duration, word_count)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    knw.id,
                    knw.adder,
                    format_time(knw.created_at),
                    knw.is_read,
                    r.name,
                    r.link,
                    r.theme,
                    r.sphere,
                    r.knowledge_type,
                    r.subtype,
                    count_to_sql(r.duration)?,
                    count_to_sql(r.word_count)?,
                ],
            )
            .map_err(store_err)?;
        tracing::debug!(id = %knw.id, adder = %knw.adder, "stored knowledge");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn get_knowledge(&self, id: &str) -> Result<Option<Knowledge>, InboxError> {
        self.conn
            .query_row(
                &format!("SELECT {KNOWLEDGE_COLUMNS} FROM knowledge k WHERE k.id = ?1"),
                params![id],
                row_to_knowledge,
            )
            .optional()
            .map_err(store_err)
    }

    /// Stored records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Knowledge>, InboxError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {KNOWLEDGE_COLUMNS}
                 FROM knowledge k
                 WHERE (?1 IS NULL OR k.adder = ?1)
                   AND (?2 = 0 OR k.is_read = 0)
                 ORDER BY k.created_at DESC
                 LIMIT ?3"
            ))
            .map_err(store_err)?;

        let results = stmt
            .query_map(
                params![filter.adder, filter.unread_only, filter.sql_limit()],
                row_to_knowledge,
            )
            .map_err(store_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)?;

        Ok(results)
    }

    /// Full-text search over name, theme, sphere, type, subtype and link.
    ///
    /// Every word of `query` must occur, as a word or word prefix, in any of
    /// those fields. Results are ranked by relevance.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn search(&self, query: &str, filter: &ListFilter) -> Result<Vec<Knowledge>, InboxError> {
        let Some(fts) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {KNOWLEDGE_COLUMNS}
                 FROM knowledge_fts f
                 JOIN knowledge k ON k.rowid = f.rowid
                 WHERE knowledge_fts MATCH ?1
                   AND (?2 IS NULL OR k.adder = ?2)
                   AND (?3 = 0 OR k.is_read = 0)
                 ORDER BY rank
                 LIMIT ?4"
            ))
            .map_err(store_err)?;

        let results = stmt
            .query_map(
                params![fts, filter.adder, filter.unread_only, filter.sql_limit()],
                row_to_knowledge,
            )
            .map_err(store_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)?;

        Ok(results)
    }

    /// Set the read flag of a record.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::NotFound`] for an unknown id.
    pub fn set_read(&self, id: &str, read: bool) -> Result<(), InboxError> {
        let changed = self
            .conn
            .execute(
                "UPDATE knowledge SET is_read = ?2 WHERE id = ?1",
                params![id, read],
            )
            .map_err(store_err)?;
        if changed == 0 {
            return Err(InboxError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Flip the read flag of a record and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::NotFound`] for an unknown id.
    pub fn toggle_read(&self, id: &str) -> Result<bool, InboxError> {
        self.conn
            .query_row(
                "UPDATE knowledge SET is_read = NOT is_read WHERE id = ?1 RETURNING is_read",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?
            .ok_or_else(|| InboxError::NotFound(id.to_string()))
    }

    /// Get count of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] if the query fails.
    pub fn count(&self) -> Result<u64, InboxError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM knowledge", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count.unsigned_abs())
    }
}

/// Fixed-width UTC timestamps so text order is time order.
fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_knowledge(row: &Row<'_>) -> rusqlite::Result<Knowledge> {
    let created_at: String = row.get(2)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Knowledge {
        id: row.get(0)?,
        adder: row.get(1)?,
        created_at,
        is_read: row.get(3)?,
        record: KnowledgeRecord {
            name: row.get(4)?,
            link: row.get(5)?,
            theme: row.get(6)?,
            sphere: row.get(7)?,
            knowledge_type: row.get(8)?,
            subtype: row.get(9)?,
            duration: count_from_sql(row, 10)?,
            word_count: count_from_sql(row, 11)?,
        },
    })
}

/// Quote each word as an FTS5 prefix phrase so user punctuation is never syntax.
///
/// `market "research` becomes `"market"* """research"*`. Words without any
/// letter or digit are dropped.
fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{}\"*", word.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
