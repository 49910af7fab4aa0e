use std::path::PathBuf;

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::errors::WikiError;
use crate::types::PageVersion;
use crate::utils::now_timestamp;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS page_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    version INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    author TEXT NOT NULL,
    approved INTEGER NOT NULL,
    UNIQUE(url, version)
)";

/// SQLite-backed version history for wiki pages.
///
/// Every operation opens its own short-lived connection, executes, commits
/// and closes. `append` and `rename` run inside a transaction; together with
/// the `UNIQUE(url, version)` constraint this keeps version numbers a
/// contiguous ascending sequence per url even when writers race.
pub struct VersionLedger {
    database: PathBuf,
}

impl VersionLedger {
    /// Open the ledger, creating the schema on first use
    pub fn open(database: impl Into<PathBuf>) -> Result<Self, WikiError> {
        let ledger = Self {
            database: database.into(),
        };
        let conn = ledger.connect()?;
        conn.execute(SCHEMA, [])?;
        debug!("Opened version ledger at {:?}", ledger.database);
        Ok(ledger)
    }

    fn connect(&self) -> Result<Connection, WikiError> {
        Connection::open(&self.database).map_err(WikiError::Db)
    }

    /// Append a new version of a page.
    ///
    /// The version number is `max(existing) + 1`. The first version is always
    /// approved; later versions are approved only when the author is the
    /// page's original author.
    pub fn append(&self, url: &str, content: &str, author: &str) -> Result<i64, WikiError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let max: Option<i64> = tx.query_row(
            "SELECT MAX(version) FROM page_versions WHERE url = ?1",
            [url],
            |row| row.get(0),
        )?;
        let version = max.unwrap_or(0) + 1;
        let approved = if version == 1 {
            true
        } else {
            let owner: String = tx.query_row(
                "SELECT author FROM page_versions WHERE url = ?1 AND version = 1",
                [url],
                |row| row.get(0),
            )?;
            author == owner
        };

        tx.execute(
            "INSERT INTO page_versions (url, version, content, created_at, author, approved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![url, version, content, now_timestamp(), author, approved],
        )?;
        tx.commit()?;

        info!(
            "Appended version {} of '{}' by '{}' (approved: {})",
            version, url, author, approved
        );
        Ok(version)
    }

    /// Highest version number, approved or not
    pub fn max_version(&self, url: &str) -> Result<Option<i64>, WikiError> {
        let conn = self.connect()?;
        let max = conn.query_row(
            "SELECT MAX(version) FROM page_versions WHERE url = ?1",
            [url],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Highest approved version number; this is what "live" means
    pub fn max_approved_version(&self, url: &str) -> Result<Option<i64>, WikiError> {
        let conn = self.connect()?;
        let max = conn.query_row(
            "SELECT MAX(version) FROM page_versions WHERE url = ?1 AND approved = 1",
            [url],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Number of versions recorded for a page
    pub fn version_count(&self, url: &str) -> Result<i64, WikiError> {
        let conn = self.connect()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM page_versions WHERE url = ?1",
            [url],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Author of version 1, the page's permanent owner
    pub fn author_of(&self, url: &str) -> Result<String, WikiError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT author FROM page_versions WHERE url = ?1 AND version = 1",
            [url],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                WikiError::NotFound(format!("page '{}' has no versions", url))
            }
            other => WikiError::Db(other),
        })
    }

    /// Change the approval flag of one version. Idempotent; a missing row is
    /// silently ignored.
    pub fn set_approval(&self, url: &str, version: i64, approved: bool) -> Result<(), WikiError> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE page_versions SET approved = ?1 WHERE url = ?2 AND version = ?3",
            params![approved, url, version],
        )?;
        debug!(
            "Set approval of '{}' version {} to {} ({} rows)",
            url, version, approved, updated
        );
        Ok(())
    }

    /// Approval flag of one version, if the row exists
    pub fn approval(&self, url: &str, version: i64) -> Result<Option<bool>, WikiError> {
        let conn = self.connect()?;
        let approved = conn
            .query_row(
                "SELECT approved FROM page_versions WHERE url = ?1 AND version = ?2",
                params![url, version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(approved)
    }

    /// Version numbers still waiting for the author's review, ascending
    pub fn pending_versions(&self, url: &str) -> Result<Vec<i64>, WikiError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT version FROM page_versions
             WHERE url = ?1 AND approved = 0 ORDER BY version ASC",
        )?;
        let versions = stmt
            .query_map([url], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(versions)
    }

    /// Stored content of one version
    pub fn content_at(&self, url: &str, version: i64) -> Result<String, WikiError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT content FROM page_versions WHERE url = ?1 AND version = ?2",
            params![url, version],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                WikiError::NotFound(format!("'{}' version {}", url, version))
            }
            other => WikiError::Db(other),
        })
    }

    /// Full rows for a page, ascending by version
    pub fn versions(&self, url: &str) -> Result<Vec<PageVersion>, WikiError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT url, version, content, created_at, author, approved
             FROM page_versions WHERE url = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt
            .query_map([url], |row| {
                Ok(PageVersion {
                    url: row.get(0)?,
                    version: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                    author: row.get(4)?,
                    approved: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove every version of a page. No-op when nothing matches.
    pub fn delete(&self, url: &str) -> Result<(), WikiError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM page_versions WHERE url = ?1", [url])?;
        info!("Deleted {} ledger rows for '{}'", removed, url);
        Ok(())
    }

    /// Remove a single version. No-op when nothing matches.
    pub fn delete_version(&self, url: &str, version: i64) -> Result<(), WikiError> {
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM page_versions WHERE url = ?1 AND version = ?2",
            params![url, version],
        )?;
        info!(
            "Deleted version {} of '{}' ({} rows)",
            version, url, removed
        );
        Ok(())
    }

    /// Rewrite the url column for a moved page, atomically for the request.
    /// If the target url already has rows, last write wins.
    pub fn rename(&self, old_url: &str, new_url: &str) -> Result<(), WikiError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let moved = tx.execute(
            "UPDATE page_versions SET url = ?1 WHERE url = ?2",
            params![new_url, old_url],
        )?;
        tx.commit()?;
        info!(
            "Renamed '{}' to '{}' in the ledger ({} rows)",
            old_url, new_url, moved
        );
        Ok(())
    }
}
