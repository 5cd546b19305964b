//! Core flight types for flightclaim.
//!
//! This module defines the data exchanged between the lookup pipeline and
//! its collaborators: validated flight numbers, raw tracking records from the
//! flight data source, the user's query, and the one-day search window.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Seconds in one search window.
const DAY_SECS: i64 = 24 * 60 * 60;

fn flight_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{1,3}\d{1,4}$").expect("valid flight number regex"))
}

/// Extract the first maximal run of ASCII digits from `input`.
///
/// `"BA123"` gives `"123"`, `"U2 8001X"` gives `"2"`.
#[must_use]
pub fn numeric_part(input: &str) -> Option<&str> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let rest = &input[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// A validated commercial flight number such as `BA123`.
///
/// Always uppercase and of the form one to three letters followed by one to
/// four digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlightNumber(String);

impl FlightNumber {
    /// Normalize and validate a user-supplied flight number.
    ///
    /// Surrounding whitespace is trimmed and the value is uppercased before
    /// validation, so `" ba123 "` parses as `BA123`. Whitespace inside the
    /// number is rejected.
    ///
    /// Designators ending in a digit are not special-cased: easyJet's
    /// `U2123` parses as airline `U` with digits `2123`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFlightNumber`] if the normalized value does
    /// not match `^[A-Z]{1,3}\d{1,4}$`.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();

        if flight_number_pattern().is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::malformed_flight_number(raw.trim()))
        }
    }

    /// The normalized flight number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The airline code (letters before the first digit).
    #[must_use]
    pub fn airline_code(&self) -> &str {
        let end = self
            .0
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// The numeric part of the flight number.
    #[must_use]
    pub fn digits(&self) -> &str {
        numeric_part(&self.0).unwrap_or_default()
    }
}

impl std::fmt::Display for FlightNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FlightNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FlightNumber> for String {
    fn from(value: FlightNumber) -> Self {
        value.0
    }
}

/// Which side of an airport's traffic to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Flights arriving at the airport.
    Arrival,
    /// Flights departing from the airport.
    Departure,
}

impl Direction {
    /// Search order used by the lookup pipeline.
    pub const ALL: [Direction; 2] = [Direction::Arrival, Direction::Departure];

    /// Path segment used by the tracking API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arrival => "arrival",
            Self::Departure => "departure",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flight as reported by the tracking API.
///
/// Records are transient: fetched per query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    /// ICAO 24-bit transponder address.
    #[serde(default)]
    pub icao24: Option<String>,

    /// Broadcast callsign, frequently space padded (`"BAW123  "`) or absent.
    #[serde(default)]
    pub callsign: Option<String>,

    /// First time the aircraft was seen, epoch seconds.
    pub first_seen: i64,

    /// Last time the aircraft was seen, epoch seconds.
    pub last_seen: i64,

    /// Estimated departure airport (ICAO).
    #[serde(rename = "estDepartureAirport", default)]
    pub departure_airport: Option<String>,

    /// Estimated arrival airport (ICAO).
    #[serde(rename = "estArrivalAirport", default)]
    pub arrival_airport: Option<String>,
}

impl FlightRecord {
    /// Whether the record carries a non-blank callsign.
    #[must_use]
    pub fn has_callsign(&self) -> bool {
        self.callsign
            .as_deref()
            .is_some_and(|callsign| !callsign.trim().is_empty())
    }

    /// `last_seen` as a UTC timestamp; used as the actual arrival time.
    #[must_use]
    pub fn last_seen_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_seen, 0)
    }
}

/// A user's request to check one flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    /// Flight number as typed by the user.
    pub flight_number: String,
    /// Calendar date of the flight.
    pub date: NaiveDate,
    /// Scheduled arrival time, `HH:MM` local time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_arrival: Option<String>,
}

impl LookupQuery {
    /// Create a query without a scheduled arrival time.
    #[must_use]
    pub fn new(flight_number: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            flight_number: flight_number.into(),
            date,
            scheduled_arrival: None,
        }
    }

    /// Attach a scheduled arrival time (`HH:MM`).
    #[must_use]
    pub fn with_scheduled_arrival(mut self, time: impl Into<String>) -> Self {
        self.scheduled_arrival = Some(time.into());
        self
    }

    /// Parse the scheduled arrival, if one was supplied.
    ///
    /// # Errors
    ///
    /// Returns the chrono parse error when the value is not `HH:MM`.
    pub fn scheduled_time(&self) -> std::result::Result<Option<NaiveTime>, chrono::ParseError> {
        self.scheduled_arrival
            .as_deref()
            .map(|raw| NaiveTime::parse_from_str(raw.trim(), "%H:%M"))
            .transpose()
    }
}

/// Half-open epoch-second interval `[begin, end)` covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// Local midnight, epoch seconds.
    pub begin: i64,
    /// `begin` plus 24 hours.
    pub end: i64,
}

/// The clock used to interpret dates and `HH:MM` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    /// The machine's local time zone.
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl ClockZone {
    /// Build a zone from an optional offset in minutes east of UTC.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the offset is out of range.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Result<Self> {
        match minutes {
            None => Ok(Self::Local),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(Self::Fixed)
                .ok_or_else(|| Error::ConfigValidation {
                    message: format!("utc_offset_minutes out of range: {minutes}"),
                }),
        }
    }

    /// Convert a wall-clock time in this zone to UTC.
    ///
    /// Ambiguous local times resolve to the earlier instant; times skipped
    /// by a DST transition yield `None`.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => Local
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Fixed(offset) => offset
                .from_local_datetime(&local)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// The search window for `date`: local midnight plus 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DayWindow`] when local midnight does not exist.
    pub fn day_window(&self, date: NaiveDate) -> Result<DayWindow> {
        let midnight = self
            .to_utc(date.and_time(NaiveTime::MIN))
            .ok_or_else(|| Error::DayWindow {
                date,
                message: "local midnight does not exist in this time zone".to_string(),
            })?;
        let begin = midnight.timestamp();
        Ok(DayWindow {
            begin,
            end: begin + DAY_SECS,
        })
    }

    /// The scheduled arrival instant for `time` on `date`.
    #[must_use]
    pub fn scheduled_at(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.to_utc(date.and_time(time))
    }
}
