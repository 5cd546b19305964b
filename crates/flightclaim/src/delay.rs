//! Delay computation and EU 261 eligibility.

use chrono::{DateTime, Utc};

use crate::random::RandomSource;

/// Minimum arrival delay, in hours, that may qualify for EU 261 compensation.
pub const ELIGIBILITY_THRESHOLD_HOURS: f64 = 3.0;

/// Smallest synthetic delay, in whole hours.
pub const MIN_SYNTHETIC_DELAY_HOURS: u32 = 1;

/// Largest synthetic delay, in whole hours.
pub const MAX_SYNTHETIC_DELAY_HOURS: u32 = 6;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Guidance shown alongside an eligible result.
const NEXT_STEPS: &[&str] = &[
    "Contact your airline directly via their customer service",
    "Reference EU Regulation 261/2004 in your communication",
    "Provide your booking reference and flight details",
    "Keep all relevant documentation (boarding passes, receipts)",
];

/// Caveat printed with every result.
pub const DISCLAIMER: &str = "This is a preliminary check only. Airlines may apply additional \
     criteria or exceptions based on the specific circumstances of your flight.";

/// Hours between scheduled and actual arrival, rounded to one decimal.
///
/// Rounding is half-up on the tenths digit, so 15 minutes is `0.3`. Early
/// arrivals give a negative value.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn delay_hours(scheduled: DateTime<Utc>, actual: DateTime<Utc>) -> f64 {
    let hours = (actual - scheduled).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    (hours * 10.0 + 0.5).floor() / 10.0
}

/// Whether a delay meets the compensation threshold.
#[must_use]
pub fn is_eligible(delay_hours: f64) -> bool {
    delay_hours >= ELIGIBILITY_THRESHOLD_HOURS
}

/// A uniformly random whole-hour delay between the synthetic bounds.
///
/// Stands in for a real delay when no tracking record matched, or when the
/// user gave no scheduled arrival to compare against.
#[must_use]
pub fn synthetic_delay_hours(random: &dyn RandomSource) -> u32 {
    random.next_in_range(MIN_SYNTHETIC_DELAY_HOURS, MAX_SYNTHETIC_DELAY_HOURS)
}

/// Steps to pursue a claim; empty when the flight is not eligible.
#[must_use]
pub fn next_steps(is_eligible: bool) -> &'static [&'static str] {
    if is_eligible {
        NEXT_STEPS
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_three_and_a_half_hours_is_eligible() {
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T13:30:00Z"));
        assert!((hours - 3.5).abs() < f64::EPSILON);
        assert!(is_eligible(hours));
    }

    #[test]
    fn test_two_hours_is_not_eligible() {
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T12:00:00Z"));
        assert!((hours - 2.0).abs() < f64::EPSILON);
        assert!(!is_eligible(hours));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T13:00:00Z"));
        assert!(is_eligible(hours));
        assert!(!is_eligible(2.9));
    }

    #[test]
    fn test_rounds_half_up_on_tenths() {
        // 15 minutes = 0.25h
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T10:15:00Z"));
        assert!((hours - 0.3).abs() < 1e-9);

        // 2h 56m = 2.933h
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T12:56:00Z"));
        assert!((hours - 2.9).abs() < 1e-9);
    }

    #[test]
    fn test_early_arrival_is_negative() {
        let hours = delay_hours(at("2025-03-08T10:00:00Z"), at("2025-03-08T09:00:00Z"));
        assert!((hours + 1.0).abs() < f64::EPSILON);
        assert!(!is_eligible(hours));
    }

    #[test]
    fn test_synthetic_delay_bounds() {
        let random = SeededRandom::from_seed(2025);
        for _ in 0..200 {
            let hours = synthetic_delay_hours(&random);
            assert!((MIN_SYNTHETIC_DELAY_HOURS..=MAX_SYNTHETIC_DELAY_HOURS).contains(&hours));
        }
    }

    #[test]
    fn test_next_steps() {
        assert_eq!(next_steps(true).len(), 4);
        assert!(next_steps(true)[1].contains("261/2004"));
        assert!(next_steps(false).is_empty());
    }

    #[test]
    fn test_disclaimer_text() {
        assert!(DISCLAIMER.starts_with("This is a preliminary check only. Airlines may apply"));
        assert!(DISCLAIMER.ends_with("circumstances of your flight."));
        assert!(!DISCLAIMER.contains("  "));
    }
}
