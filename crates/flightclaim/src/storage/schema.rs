//! `SQLite` schema definitions for saved claims.

/// SQL statement to create the claims table.
pub const CREATE_CLAIMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS claims (
    id TEXT PRIMARY KEY,
    flight_number TEXT NOT NULL,
    flight_date TEXT NOT NULL,
    scheduled_arrival TEXT,
    actual_arrival TEXT,
    delay_hours REAL NOT NULL,
    is_eligible INTEGER NOT NULL,
    error TEXT,
    saved_at TEXT NOT NULL
)
";

/// Index backing newest-first listing.
pub const CREATE_SAVED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_claims_saved_at ON claims(saved_at DESC)
";

/// Index for lookups by flight.
pub const CREATE_FLIGHT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_claims_flight ON claims(flight_number, flight_date)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CLAIMS_TABLE,
    CREATE_SAVED_AT_INDEX,
    CREATE_FLIGHT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_table_columns() {
        for column in [
            "id TEXT PRIMARY KEY",
            "flight_number TEXT NOT NULL",
            "flight_date TEXT NOT NULL",
            "delay_hours REAL NOT NULL",
            "is_eligible INTEGER NOT NULL",
            "saved_at TEXT NOT NULL",
        ] {
            assert!(CREATE_CLAIMS_TABLE.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_metadata_table_comes_last() {
        assert_eq!(SCHEMA_STATEMENTS.last(), Some(&CREATE_METADATA_TABLE));
    }
}
