//! Saved compensation claims.
//!
//! A [`Claim`] is the persisted form of one lookup: what the user asked for
//! and what the lookup concluded, stamped with the time it was saved.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::flight::{FlightNumber, LookupQuery};
use crate::lookup::LookupResult;

/// A lookup outcome saved for later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Opaque identifier, `{unix_millis}-{flight_number}`.
    pub id: String,

    /// Flight number as looked up (normalized when valid).
    pub flight_number: String,

    /// Date of the flight.
    pub date: NaiveDate,

    /// Scheduled arrival as entered, `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_arrival: Option<String>,

    /// Actual arrival, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_arrival: Option<DateTime<Utc>>,

    /// Arrival delay in hours; zero when the lookup failed.
    pub delay_hours: f64,

    /// Whether the delay meets the compensation threshold.
    pub is_eligible: bool,

    /// User-facing error message of a failed lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the claim was saved.
    pub saved_at: DateTime<Utc>,
}

impl Claim {
    /// Build a claim from a query and its result, saved now.
    #[must_use]
    pub fn from_result(query: &LookupQuery, result: &LookupResult) -> Self {
        Self::from_result_at(query, result, Utc::now())
    }

    /// Build a claim from a query and its result, saved at `saved_at`.
    #[must_use]
    pub fn from_result_at(
        query: &LookupQuery,
        result: &LookupResult,
        saved_at: DateTime<Utc>,
    ) -> Self {
        let flight_number = FlightNumber::parse(&query.flight_number).map_or_else(
            |_| query.flight_number.trim().to_uppercase(),
            |number| number.as_str().to_string(),
        );

        let (actual_arrival, delay_hours, is_eligible, error) = match result {
            Ok(delay) => (delay.actual_arrival, delay.delay_hours, delay.is_eligible, None),
            Err(e) => (None, 0.0, false, Some(e.to_string())),
        };

        Self {
            id: Self::make_id(saved_at, &flight_number),
            flight_number,
            date: query.date,
            scheduled_arrival: query.scheduled_arrival.clone(),
            actual_arrival,
            delay_hours,
            is_eligible,
            error,
            saved_at,
        }
    }

    /// Identifier for a claim on `flight_number` saved at `saved_at`.
    #[must_use]
    pub fn make_id(saved_at: DateTime<Utc>, flight_number: &str) -> String {
        format!("{}-{}", saved_at.timestamp_millis(), flight_number)
    }

    /// Whether the saved lookup failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// One-line summary suitable for sharing.
    #[must_use]
    pub fn share_text(&self) -> String {
        let summary = format!(
            "My flight {} on {} was delayed by {} hours.",
            self.flight_number,
            self.date.format("%b %-d, %Y"),
            self.delay_hours
        );
        if self.is_eligible {
            format!("{summary} I might be eligible for EU261 compensation!")
        } else {
            summary
        }
    }
}
