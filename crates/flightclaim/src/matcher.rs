//! Callsign matching between a flight number and tracking records.
//!
//! Tracking data is noisy: callsigns are padded, use the ICAO prefix instead
//! of the commercial airline code, or are missing entirely. The matcher
//! tries progressively looser strategies and stops at the first one that
//! yields a record:
//!
//! 1. [`MatchTier::Exact`]: normalized callsign equals `{prefix}{digits}`.
//! 2. [`MatchTier::ContainsBoth`]: callsign contains a prefix and, separately,
//!    the digits.
//! 3. [`MatchTier::NumericOnly`]: callsign contains the digits.
//!
//! Tier 3 can pair a flight with an unrelated one that happens to share its
//! digits (`BA123` against `DLH123`). That trade of accuracy for
//! availability is kept; disable the tier through [`MatchTiers`] to measure
//! or avoid it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::airline::resolve_callsign_prefixes;
use crate::flight::{FlightNumber, FlightRecord};

/// Which matching strategies are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTiers {
    /// Exact `{prefix}{digits}` comparison.
    pub exact: bool,
    /// Prefix and digits both present as substrings.
    pub contains: bool,
    /// Digits present as a substring.
    pub numeric_only: bool,
}

impl Default for MatchTiers {
    fn default() -> Self {
        Self {
            exact: true,
            contains: true,
            numeric_only: true,
        }
    }
}

impl MatchTiers {
    /// Whether at least one tier is enabled.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.exact || self.contains || self.numeric_only
    }

    fn enabled(self) -> impl Iterator<Item = MatchTier> {
        [
            (self.exact, MatchTier::Exact),
            (self.contains, MatchTier::ContainsBoth),
            (self.numeric_only, MatchTier::NumericOnly),
        ]
        .into_iter()
        .filter_map(|(on, tier)| on.then_some(tier))
    }
}

/// The strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Callsign equals a candidate `{prefix}{digits}`.
    Exact,
    /// Callsign contains a candidate prefix and the digits.
    ContainsBoth,
    /// Callsign contains the digits only.
    NumericOnly,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::ContainsBoth => write!(f, "contains_both"),
            Self::NumericOnly => write!(f, "numeric_only"),
        }
    }
}

/// A record selected by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    /// The matching record.
    pub record: &'a FlightRecord,
    /// The tier that selected it.
    pub tier: MatchTier,
}

/// Normalize a callsign for comparison: drop all whitespace, uppercase.
#[must_use]
pub fn normalize_callsign(callsign: &str) -> String {
    callsign
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Tiered callsign matcher.
///
/// Pure: it only reads the record slice it is given, so it can be run over a
/// single airport's response and later over an aggregated pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallsignMatcher {
    tiers: MatchTiers,
}

impl CallsignMatcher {
    /// Create a matcher with the given tiers enabled.
    #[must_use]
    pub fn new(tiers: MatchTiers) -> Self {
        Self { tiers }
    }

    /// Find the record that best matches `flight_number`.
    ///
    /// Tiers run in order and the first tier with a hit wins; within a tier
    /// the earliest record in `records` wins. Records without a callsign
    /// never match.
    #[must_use]
    pub fn find_match<'a>(
        &self,
        records: &'a [FlightRecord],
        flight_number: &FlightNumber,
    ) -> Option<Match<'a>> {
        let prefixes = match resolve_callsign_prefixes(flight_number.as_str()) {
            Ok(prefixes) => prefixes,
            Err(e) => {
                debug!("Cannot build callsign variations: {}", e);
                return None;
            }
        };
        let digits = flight_number.digits();
        if digits.is_empty() {
            return None;
        }

        let candidates: Vec<&str> = prefixes.candidates().collect();
        let exact_forms: Vec<String> = candidates.iter().map(|p| format!("{p}{digits}")).collect();

        let callsigns: Vec<(&FlightRecord, String)> = records
            .iter()
            .filter(|record| record.has_callsign())
            .filter_map(|record| {
                record
                    .callsign
                    .as_deref()
                    .map(|callsign| (record, normalize_callsign(callsign)))
            })
            .collect();

        debug!(
            "Matching {} against {} records with callsigns ({} total), variations {:?}",
            flight_number,
            callsigns.len(),
            records.len(),
            exact_forms
        );

        for tier in self.tiers.enabled() {
            let hit = callsigns.iter().find(|(_, callsign)| match tier {
                MatchTier::Exact => exact_forms.iter().any(|form| form == callsign),
                MatchTier::ContainsBoth => {
                    callsign.contains(digits)
                        && candidates.iter().any(|prefix| callsign.contains(prefix))
                }
                MatchTier::NumericOnly => callsign.contains(digits),
            });

            if let Some((record, callsign)) = hit {
                if tier == MatchTier::NumericOnly {
                    info!(
                        "Weak numeric-only match for {}: callsign {} shares digits {}",
                        flight_number, callsign, digits
                    );
                } else {
                    debug!("Matched {} to callsign {} ({})", flight_number, callsign, tier);
                }
                return Some(Match {
                    record: *record,
                    tier,
                });
            }
        }

        debug!("No callsign match for {}", flight_number);
        None
    }
}
