//! Storage layer for saved claims.
//!
//! This module provides `SQLite`-based persistent storage for [`Claim`]s
//! behind the [`ClaimStore`] trait.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::claim::Claim;
use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_CLAIM: &str = r"
SELECT id, flight_number, flight_date, scheduled_arrival, actual_arrival,
       delay_hours, is_eligible, error, saved_at
FROM claims
";

/// Persistence for saved claims, keyed by claim id.
pub trait ClaimStore {
    /// Save a claim, replacing any claim with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim cannot be written.
    fn save(&self, claim: &Claim) -> Result<()>;

    /// All saved claims, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be read.
    fn list(&self) -> Result<Vec<Claim>>;

    /// A single claim by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim cannot be read.
    fn get(&self, id: &str) -> Result<Option<Claim>>;

    /// Delete a claim. Returns `false` if no claim had that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// `SQLite` claim storage.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete a claim, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClaimNotFound`] for an unknown id, or a database error.
    pub fn remove(&self, id: &str) -> Result<()> {
        if self.delete(id)? {
            Ok(())
        } else {
            Err(Error::ClaimNotFound { id: id.to_string() })
        }
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_claims, eligible_claims, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            r"
            SELECT COUNT(*), COALESCE(SUM(is_eligible), 0), MIN(saved_at), MAX(saved_at)
            FROM claims
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let parse = |value: Option<String>| {
            value
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };

        Ok(StorageStats {
            total_claims,
            eligible_claims,
            oldest_claim: parse(oldest),
            newest_claim: parse(newest),
        })
    }

    /// Convert a database row to a [`Claim`].
    fn row_to_claim(row: &rusqlite::Row) -> rusqlite::Result<Claim> {
        let date: String = row.get(2)?;
        let actual_arrival: Option<String> = row.get(4)?;
        let saved_at: String = row.get(8)?;

        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let actual_arrival = actual_arrival
            .map(|s| parse_timestamp(&s, 4))
            .transpose()?;
        let saved_at = parse_timestamp(&saved_at, 8)?;

        Ok(Claim {
            id: row.get(0)?,
            flight_number: row.get(1)?,
            date,
            scheduled_arrival: row.get(3)?,
            actual_arrival,
            delay_hours: row.get(5)?,
            is_eligible: row.get(6)?,
            error: row.get(7)?,
            saved_at,
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl ClaimStore for Storage {
    fn save(&self, claim: &Claim) -> Result<()> {
        self.conn.execute(
            r"
            INSERT OR REPLACE INTO claims
                (id, flight_number, flight_date, scheduled_arrival, actual_arrival,
                 delay_hours, is_eligible, error, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                claim.id,
                claim.flight_number,
                claim.date.format(DATE_FORMAT).to_string(),
                claim.scheduled_arrival,
                claim.actual_arrival.map(timestamp),
                claim.delay_hours,
                claim.is_eligible,
                claim.error,
                timestamp(claim.saved_at),
            ],
        )?;
        info!("Claim saved: {}", claim.id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Claim>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_CLAIM} ORDER BY saved_at DESC, rowid DESC"))?;
        let claims = stmt
            .query_map([], Self::row_to_claim)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(claims)
    }

    fn get(&self, id: &str) -> Result<Option<Claim>> {
        let claim = self
            .conn
            .query_row(&format!("{SELECT_CLAIM} WHERE id = ?1"), [id], Self::row_to_claim)
            .optional()?;
        Ok(claim)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM claims WHERE id = ?1", [id])?;
        if affected > 0 {
            info!("Claim removed: {}", id);
        }
        Ok(affected > 0)
    }
}

/// Statistics about saved claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of saved claims.
    pub total_claims: i64,
    /// Claims whose delay met the threshold.
    pub eligible_claims: i64,
    /// When the oldest claim was saved.
    pub oldest_claim: Option<DateTime<Utc>>,
    /// When the newest claim was saved.
    pub newest_claim: Option<DateTime<Utc>>,
}

impl std::fmt::Display for StorageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let noun = if self.total_claims == 1 { "claim" } else { "claims" };
        write!(
            f,
            "{} saved {noun}, {} eligible",
            self.total_claims, self.eligible_claims
        )?;
        if let (Some(oldest), Some(newest)) = (self.oldest_claim, self.newest_claim) {
            write!(
                f,
                " (saved {} to {})",
                oldest.format("%Y-%m-%d"),
                newest.format("%Y-%m-%d")
            )?;
        }
        Ok(())
    }
}
