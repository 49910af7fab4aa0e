use std::path::PathBuf;

use log::debug;
use rusqlite::{Connection, params};

use crate::errors::WikiError;
use crate::types::HistoryEntry;
use crate::utils::now_timestamp;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS access_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    last_accessed INTEGER NOT NULL,
    access_count INTEGER NOT NULL,
    user TEXT NOT NULL,
    UNIQUE(user, url)
)";

/// SQLite-backed per-user page-access history, one row per (user, url)
pub struct HistoryStore {
    database: PathBuf,
}

impl HistoryStore {
    /// Open the history store, creating the schema on first use
    pub fn open(database: impl Into<PathBuf>) -> Result<Self, WikiError> {
        let store = Self {
            database: database.into(),
        };
        let conn = store.connect()?;
        conn.execute(SCHEMA, [])?;
        debug!("Opened history store at {:?}", store.database);
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, WikiError> {
        Connection::open(&self.database).map_err(WikiError::Db)
    }

    /// Record a page visit: insert on first access, otherwise bump the
    /// counter and refresh the timestamp
    pub fn record(&self, user: &str, url: &str) -> Result<(), WikiError> {
        let conn = self.connect()?;
        let now = now_timestamp();
        let updated = conn.execute(
            "UPDATE access_history
             SET last_accessed = ?1, access_count = access_count + 1
             WHERE user = ?2 AND url = ?3",
            params![now, user, url],
        )?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO access_history (url, last_accessed, access_count, user)
                 VALUES (?1, ?2, 1, ?3)",
                params![url, now, user],
            )?;
        }
        debug!("Recorded access to '{}' by '{}'", url, user);
        Ok(())
    }

    /// All rows for a user, most recently accessed first
    pub fn entries_for(&self, user: &str) -> Result<Vec<HistoryEntry>, WikiError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT url, user, last_accessed, access_count
             FROM access_history WHERE user = ?1
             ORDER BY last_accessed DESC",
        )?;
        let entries = stmt
            .query_map([user], |row| {
                Ok(HistoryEntry {
                    url: row.get(0)?,
                    user: row.get(1)?,
                    last_accessed: row.get(2)?,
                    access_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
