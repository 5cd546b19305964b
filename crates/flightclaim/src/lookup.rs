//! Flight lookup orchestration.
//!
//! [`LookupOrchestrator::lookup`] is the single entry point front-ends call.
//! It validates the query, walks the configured airports for both arrival
//! and departure traffic until the callsign matcher finds the flight, and
//! turns the match into a delay and an eligibility verdict. When nothing
//! matches it falls back to a synthetic delay (unless disabled).
//!
//! Queries run one at a time and the search stops at the first airport that
//! yields a match.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{Config, LookupConfig};
use crate::delay::{delay_hours, is_eligible, synthetic_delay_hours};
use crate::error::Error;
use crate::flight::{ClockZone, Direction, FlightNumber, FlightRecord, LookupQuery};
use crate::matcher::{CallsignMatcher, MatchTier, MatchTiers};
use crate::random::{RandomSource, SeededRandom};
use crate::source::{FlightDataSource, OpenSkyClient};

/// Terminal, user-facing lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The flight number is not letters followed by digits.
    #[error("Invalid flight number format. Please enter an airline code followed by numbers (e.g., BA123).")]
    InvalidFormat,

    /// The scheduled arrival is not `HH:MM`.
    #[error("Invalid scheduled arrival time '{0}'. Please use the 24-hour HH:MM format (e.g., 14:35).")]
    InvalidArrivalTime(String),

    /// No tracked flight matched and fallback is disabled.
    #[error("Flight not found. Please double-check your flight number and date, or try a different date.")]
    NotFound,

    /// The search failed unexpectedly and fallback is disabled.
    #[error("Failed to retrieve flight data. Please try again later.")]
    LookupFailed,
}

/// Where a delay figure came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// A tracking record matched the flight.
    Tracked {
        /// Callsign of the matched record, as reported.
        callsign: String,
        /// Matcher tier that selected the record.
        tier: MatchTier,
        /// Airport whose query returned the record; `None` when the match
        /// came from the aggregated pool.
        airport: Option<String>,
        /// Direction of that query.
        direction: Option<Direction>,
        /// The delay is a random estimate because no scheduled arrival
        /// was supplied.
        delay_estimated: bool,
    },
    /// No record matched; the delay is synthetic.
    Synthetic,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightDelay {
    /// Actual arrival time, when known.
    pub actual_arrival: Option<DateTime<Utc>>,
    /// Arrival delay in hours, one decimal.
    pub delay_hours: f64,
    /// Whether the delay meets the EU 261 threshold.
    pub is_eligible: bool,
    /// Origin of the figures above.
    pub provenance: Provenance,
}

impl FlightDelay {
    /// Whether the figures come from a real tracking record.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        matches!(self.provenance, Provenance::Tracked { .. })
    }
}

/// Outcome of a lookup.
pub type LookupResult = std::result::Result<FlightDelay, LookupError>;

/// Counters reported at the end of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Records returned across all successful queries.
    pub flights_checked: usize,
    /// Queries that returned data.
    pub queries_succeeded: usize,
    /// Queries that failed after retries.
    pub queries_failed: usize,
}

#[derive(Debug)]
struct Found {
    record: FlightRecord,
    tier: MatchTier,
    airport: Option<String>,
    direction: Option<Direction>,
}

/// Drives a flight lookup from query to result.
pub struct LookupOrchestrator {
    source: Arc<dyn FlightDataSource>,
    random: Arc<dyn RandomSource>,
    matcher: CallsignMatcher,
    config: LookupConfig,
    zone: ClockZone,
}

impl std::fmt::Debug for LookupOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupOrchestrator")
            .field("matcher", &self.matcher)
            .field("config", &self.config)
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

impl LookupOrchestrator {
    /// Create an orchestrator over an arbitrary data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured UTC offset is out of range.
    pub fn new(
        source: Arc<dyn FlightDataSource>,
        random: Arc<dyn RandomSource>,
        config: LookupConfig,
        tiers: MatchTiers,
    ) -> crate::Result<Self> {
        let zone = config.clock_zone()?;
        Ok(Self {
            source,
            random,
            matcher: CallsignMatcher::new(tiers),
            config,
            zone,
        })
    }

    /// Create an orchestrator backed by the OpenSky API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the
    /// configuration is invalid.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let source = OpenSkyClient::new(&config.source)?;
        let random = SeededRandom::new(config.lookup.random_seed);
        Self::new(
            Arc::new(source),
            Arc::new(random),
            config.lookup.clone(),
            config.matching,
        )
    }

    /// Look up a flight and evaluate its compensation eligibility.
    ///
    /// Input errors are reported before any network access. Per-airport
    /// source failures are logged and skipped; with fallback enabled every
    /// other failure degrades to a synthetic result.
    pub async fn lookup(&self, query: &LookupQuery) -> LookupResult {
        info!("Looking up flight {} on {}", query.flight_number, query.date);

        let flight_number = FlightNumber::parse(&query.flight_number).map_err(|e| {
            debug!("Rejected flight number: {}", e);
            LookupError::InvalidFormat
        })?;

        let scheduled = match query.scheduled_time() {
            Ok(time) => time.and_then(|time| {
                let at = self.zone.scheduled_at(query.date, time);
                if at.is_none() {
                    warn!("Scheduled arrival {} does not exist on {}", time, query.date);
                }
                at
            }),
            Err(_) => {
                return Err(LookupError::InvalidArrivalTime(
                    query.scheduled_arrival.clone().unwrap_or_default(),
                ))
            }
        };

        if self.config.mock_mode {
            info!("Mock mode enabled; returning synthetic data for {}", flight_number);
            return Ok(self.synthetic(scheduled));
        }

        let outcome = match self.config.search_deadline() {
            Some(deadline) => tokio::time::timeout(deadline, self.search(&flight_number, query.date))
                .await
                .unwrap_or_else(|_| Err(Error::timeout("flight search"))),
            None => self.search(&flight_number, query.date).await,
        };

        match outcome {
            Ok(Some(found)) => Ok(self.tracked(found, scheduled)),
            Ok(None) if self.config.fallback_enabled => {
                info!("No tracked flight matched {}; falling back to synthetic data", flight_number);
                Ok(self.synthetic(scheduled))
            }
            Ok(None) => Err(LookupError::NotFound),
            Err(e) if self.config.fallback_enabled => {
                warn!("Search for {} failed: {}; falling back to synthetic data", flight_number, e);
                Ok(self.synthetic(scheduled))
            }
            Err(e) => {
                error!("Search for {} failed: {}", flight_number, e);
                Err(LookupError::LookupFailed)
            }
        }
    }

    async fn search(
        &self,
        flight_number: &FlightNumber,
        date: NaiveDate,
    ) -> crate::Result<Option<Found>> {
        let window = self.zone.day_window(date)?;
        let mut stats = SearchStats::default();
        let mut pool: Vec<FlightRecord> = Vec::new();

        info!(
            "Searching {} airports in both directions for {}",
            self.config.airports.len(),
            flight_number
        );

        for direction in Direction::ALL {
            for airport in &self.config.airports {
                let records = match self.source.fetch_records(airport, direction, window).await {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("Skipping {} ({}): {}", airport, direction, e);
                        stats.queries_failed += 1;
                        continue;
                    }
                };
                stats.queries_succeeded += 1;
                stats.flights_checked += records.len();

                let records: Vec<FlightRecord> =
                    records.into_iter().filter(FlightRecord::has_callsign).collect();

                if let Some(found) = self.matcher.find_match(&records, flight_number) {
                    info!(
                        "Found {} at {} ({}) via {} match on callsign {:?}",
                        flight_number,
                        airport,
                        direction,
                        found.tier,
                        found.record.callsign.as_deref().unwrap_or_default()
                    );
                    Self::log_stats(stats);
                    return Ok(Some(Found {
                        record: found.record.clone(),
                        tier: found.tier,
                        airport: Some(airport.clone()),
                        direction: Some(direction),
                    }));
                }
                pool.extend(records);
            }
        }

        Self::log_stats(stats);

        debug!("Matching against all {} collected flights", pool.len());
        Ok(self
            .matcher
            .find_match(&pool, flight_number)
            .map(|found| Found {
                record: found.record.clone(),
                tier: found.tier,
                airport: None,
                direction: None,
            }))
    }

    fn log_stats(stats: SearchStats) {
        info!(
            "Checked {} flights across {} queries ({} failed)",
            stats.flights_checked,
            stats.queries_succeeded + stats.queries_failed,
            stats.queries_failed
        );
    }

    fn tracked(&self, found: Found, scheduled: Option<DateTime<Utc>>) -> FlightDelay {
        let actual_arrival = found.record.last_seen_utc();
        let (hours, delay_estimated) = match (scheduled, actual_arrival) {
            (Some(scheduled), Some(actual)) => (delay_hours(scheduled, actual), false),
            _ => (f64::from(synthetic_delay_hours(self.random.as_ref())), true),
        };

        FlightDelay {
            actual_arrival,
            delay_hours: hours,
            is_eligible: is_eligible(hours),
            provenance: Provenance::Tracked {
                callsign: found.record.callsign.unwrap_or_default(),
                tier: found.tier,
                airport: found.airport,
                direction: found.direction,
                delay_estimated,
            },
        }
    }

    fn synthetic(&self, scheduled: Option<DateTime<Utc>>) -> FlightDelay {
        let hours = synthetic_delay_hours(self.random.as_ref());
        FlightDelay {
            actual_arrival: scheduled.map(|at| at + chrono::Duration::hours(i64::from(hours))),
            delay_hours: f64::from(hours),
            is_eligible: is_eligible(f64::from(hours)),
            provenance: Provenance::Synthetic,
        }
    }
}
