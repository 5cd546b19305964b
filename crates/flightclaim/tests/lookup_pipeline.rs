//! End-to-end lookup behavior against a scripted flight data source.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use flightclaim::config::LookupConfig;
use flightclaim::flight::{DayWindow, Direction, FlightRecord, LookupQuery};
use flightclaim::matcher::{MatchTier, MatchTiers};
use flightclaim::random::RandomSource;
use flightclaim::source::{FlightDataSource, SourceError};
use flightclaim::{LookupError, LookupOrchestrator, Provenance};

/// 2025-03-08T10:00:00Z
const TEN_AM: i64 = 1_741_428_000;

#[derive(Debug)]
struct FixedRandom(u32);

impl RandomSource for FixedRandom {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        self.0.clamp(low, high)
    }
}

#[derive(Default)]
struct ScriptedSource {
    records: HashMap<(String, Direction), Vec<FlightRecord>>,
    failing: HashSet<String>,
    stall: Option<Duration>,
    hanging: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, Direction)>>,
    windows: Mutex<Vec<DayWindow>>,
}

impl ScriptedSource {
    fn with(mut self, airport: &str, direction: Direction, records: Vec<FlightRecord>) -> Self {
        self.records.insert((airport.to_string(), direction), records);
        self
    }

    fn failing(mut self, airport: &str) -> Self {
        self.failing.insert(airport.to_string());
        self
    }

    /// The airport stalls for `delay`, then answers 504.
    fn hanging(mut self, airport: &str, delay: Duration) -> Self {
        self.hanging.insert(airport.to_string(), delay);
        self
    }

    fn calls(&self) -> Vec<(String, Direction)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlightDataSource for ScriptedSource {
    async fn fetch_records(
        &self,
        airport: &str,
        direction: Direction,
        window: DayWindow,
    ) -> flightclaim::source::Result<Vec<FlightRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push((airport.to_string(), direction));
        self.windows.lock().unwrap().push(window);

        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if let Some(delay) = self.hanging.get(airport) {
            tokio::time::sleep(*delay).await;
            return Err(SourceError::Unavailable {
                airport: airport.to_string(),
                status: 504,
            });
        }
        if self.failing.contains(airport) {
            return Err(SourceError::Unavailable {
                airport: airport.to_string(),
                status: 503,
            });
        }
        self.records
            .get(&(airport.to_string(), direction))
            .cloned()
            .ok_or_else(|| SourceError::NoData {
                airport: airport.to_string(),
                direction,
            })
    }
}

fn record(callsign: Option<&str>, last_seen: i64) -> FlightRecord {
    FlightRecord {
        icao24: Some("4ca7b4".to_string()),
        callsign: callsign.map(ToString::to_string),
        first_seen: last_seen - 7_200,
        last_seen,
        departure_airport: Some("LEMD".to_string()),
        arrival_airport: Some("EGLL".to_string()),
    }
}

fn config(airports: &[&str]) -> LookupConfig {
    LookupConfig {
        airports: airports.iter().map(ToString::to_string).collect(),
        utc_offset_minutes: Some(0),
        ..LookupConfig::default()
    }
}

fn orchestrator(source: &Arc<ScriptedSource>, config: LookupConfig) -> LookupOrchestrator {
    LookupOrchestrator::new(
        source.clone(),
        Arc::new(FixedRandom(5)),
        config,
        MatchTiers::default(),
    )
    .unwrap()
}

fn query(flight: &str) -> LookupQuery {
    LookupQuery::new(flight, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap())
        .with_scheduled_arrival("10:00")
}

#[tokio::test]
async fn invalid_flight_number_fetches_nothing() {
    let source = Arc::new(ScriptedSource::default());
    let lookup = orchestrator(&source, config(&["EGLL", "EHAM"]));

    for input in ["123", "HELLO", "", "BA 12 34X"] {
        let result = lookup.lookup(&query(input)).await;
        assert_eq!(result.unwrap_err(), LookupError::InvalidFormat, "{input:?}");
    }
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn exact_match_at_first_airport_stops_the_search() {
    let source = Arc::new(ScriptedSource::default().with(
        "EGLL",
        Direction::Arrival,
        vec![
            record(Some("DLH456"), TEN_AM),
            record(Some("BAW123  "), TEN_AM + 12_600),
        ],
    ));
    let lookup = orchestrator(&source, config(&["EGLL", "EHAM"]));

    let delay = lookup.lookup(&query("BA123")).await.unwrap();

    assert!((delay.delay_hours - 3.5).abs() < 1e-9);
    assert!(delay.is_eligible);
    assert_eq!(
        delay.actual_arrival.unwrap().timestamp(),
        TEN_AM + 12_600
    );
    assert_eq!(
        delay.provenance,
        Provenance::Tracked {
            callsign: "BAW123  ".to_string(),
            tier: MatchTier::Exact,
            airport: Some("EGLL".to_string()),
            direction: Some(Direction::Arrival),
            delay_estimated: false,
        }
    );
    assert_eq!(source.calls(), vec![("EGLL".to_string(), Direction::Arrival)]);
}

#[tokio::test]
async fn arrivals_are_searched_before_departures() {
    let source = Arc::new(ScriptedSource::default().with(
        "EHAM",
        Direction::Departure,
        vec![record(Some("KLM1234"), TEN_AM + 7_200)],
    ));
    let lookup = orchestrator(&source, config(&["EGLL", "EHAM", "LFPG"]));

    let delay = lookup.lookup(&query("KL1234")).await.unwrap();

    assert!((delay.delay_hours - 2.0).abs() < 1e-9);
    assert!(!delay.is_eligible);
    assert_eq!(
        source.calls(),
        vec![
            ("EGLL".to_string(), Direction::Arrival),
            ("EHAM".to_string(), Direction::Arrival),
            ("LFPG".to_string(), Direction::Arrival),
            ("EGLL".to_string(), Direction::Departure),
            ("EHAM".to_string(), Direction::Departure),
        ]
    );
}

#[tokio::test]
async fn failing_airports_are_skipped() {
    let source = Arc::new(
        ScriptedSource::default()
            .failing("EGLL")
            .with("EDDF", Direction::Arrival, vec![record(Some("DLH400"), TEN_AM + 14_400)]),
    );
    let lookup = orchestrator(&source, config(&["EGLL", "EDDF"]));

    let delay = lookup.lookup(&query("LH400")).await.unwrap();

    assert!(delay.is_tracked());
    assert!((delay.delay_hours - 4.0).abs() < 1e-9);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn all_failing_with_fallback_is_synthetic() {
    let source = Arc::new(ScriptedSource::default().failing("EGLL").failing("EHAM"));
    let lookup = orchestrator(&source, config(&["EGLL", "EHAM"]));

    let delay = lookup.lookup(&query("BA123")).await.unwrap();

    assert_eq!(delay.provenance, Provenance::Synthetic);
    assert!((1.0..=6.0).contains(&delay.delay_hours));
    assert!((delay.delay_hours - 5.0).abs() < f64::EPSILON);
    assert!(delay.is_eligible);
    assert_eq!(delay.actual_arrival.unwrap().timestamp(), TEN_AM + 5 * 3_600);
    assert_eq!(source.calls().len(), 4);
}

#[tokio::test]
async fn all_failing_without_fallback_is_not_found() {
    let source = Arc::new(ScriptedSource::default().failing("EGLL"));
    let lookup = orchestrator(
        &source,
        LookupConfig {
            fallback_enabled: false,
            ..config(&["EGLL"])
        },
    );

    let result = lookup.lookup(&query("BA123")).await;
    assert_eq!(result.unwrap_err(), LookupError::NotFound);
}

#[tokio::test]
async fn records_without_callsigns_never_match() {
    let source = Arc::new(ScriptedSource::default().with(
        "EGLL",
        Direction::Arrival,
        vec![record(None, TEN_AM), record(Some("   "), TEN_AM)],
    ));
    let lookup = orchestrator(
        &source,
        LookupConfig {
            fallback_enabled: false,
            ..config(&["EGLL"])
        },
    );

    let result = lookup.lookup(&query("BA123")).await;
    assert_eq!(result.unwrap_err(), LookupError::NotFound);
}

#[tokio::test]
async fn numeric_only_match_at_earlier_airport_wins() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("EGLL", Direction::Arrival, vec![record(Some("DLH123"), TEN_AM + 3_600)])
            .with("EHAM", Direction::Arrival, vec![record(Some("BAW123"), TEN_AM + 14_400)]),
    );
    let lookup = orchestrator(&source, config(&["EGLL", "EHAM"]));

    let delay = lookup.lookup(&query("BA123")).await.unwrap();

    match delay.provenance {
        Provenance::Tracked { callsign, tier, .. } => {
            assert_eq!(callsign, "DLH123");
            assert_eq!(tier, MatchTier::NumericOnly);
        }
        Provenance::Synthetic => panic!("expected a tracked match"),
    }
}

#[tokio::test]
async fn disabling_numeric_tier_avoids_false_positive() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("EGLL", Direction::Arrival, vec![record(Some("DLH123"), TEN_AM + 3_600)])
            .with("EHAM", Direction::Arrival, vec![record(Some("BAW123"), TEN_AM + 14_400)]),
    );
    let lookup = LookupOrchestrator::new(
        source.clone(),
        Arc::new(FixedRandom(1)),
        config(&["EGLL", "EHAM"]),
        MatchTiers {
            numeric_only: false,
            ..MatchTiers::default()
        },
    )
    .unwrap();

    let delay = lookup.lookup(&query("BA123")).await.unwrap();
    assert!((delay.delay_hours - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn missing_scheduled_arrival_estimates_delay() {
    let source = Arc::new(ScriptedSource::default().with(
        "EGLL",
        Direction::Arrival,
        vec![record(Some("BAW123"), TEN_AM)],
    ));
    let lookup = orchestrator(&source, config(&["EGLL"]));
    let query = LookupQuery::new("BA123", NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());

    let delay = lookup.lookup(&query).await.unwrap();

    assert_eq!(delay.actual_arrival.unwrap().timestamp(), TEN_AM);
    assert!((delay.delay_hours - 5.0).abs() < f64::EPSILON);
    assert!(matches!(
        delay.provenance,
        Provenance::Tracked {
            delay_estimated: true,
            ..
        }
    ));
}

#[tokio::test]
async fn queries_cover_the_utc_day() {
    let source = Arc::new(ScriptedSource::default());
    let lookup = orchestrator(&source, config(&["EGLL"]));

    let _ = lookup.lookup(&query("BA123")).await;

    let windows = source.windows.lock().unwrap().clone();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].begin, 1_741_392_000);
    assert_eq!(windows[0].end - windows[0].begin, 86_400);
}

#[tokio::test(start_paused = true)]
async fn search_deadline_falls_back() {
    let source = Arc::new(ScriptedSource {
        stall: Some(Duration::from_secs(60)),
        ..ScriptedSource::default()
    });
    let lookup = orchestrator(
        &source,
        LookupConfig {
            search_deadline_secs: 90,
            ..config(&["EGLL", "EHAM", "LFPG"])
        },
    );

    let delay = lookup.lookup(&query("BA123")).await.unwrap();

    assert_eq!(delay.provenance, Provenance::Synthetic);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn search_deadline_without_fallback_fails() {
    let source = Arc::new(ScriptedSource {
        stall: Some(Duration::from_secs(60)),
        ..ScriptedSource::default()
    });
    let lookup = orchestrator(
        &source,
        LookupConfig {
            search_deadline_secs: 30,
            fallback_enabled: false,
            ..config(&["EGLL"])
        },
    );

    let result = lookup.lookup(&query("BA123")).await;
    assert_eq!(result.unwrap_err(), LookupError::LookupFailed);
}

#[tokio::test(start_paused = true)]
async fn slow_airports_do_not_cut_the_default_search_short() {
    // Each hung airport burns a full retry budget before answering 504.
    let source = Arc::new(
        ScriptedSource::default()
            .hanging("EGLL", Duration::from_secs(93))
            .hanging("EHAM", Duration::from_secs(93))
            .with(
                "LFPG",
                Direction::Arrival,
                vec![record(Some("BAW123"), TEN_AM + 4 * 3_600)],
            ),
    );
    let lookup = orchestrator(
        &source,
        LookupConfig {
            utc_offset_minutes: Some(0),
            ..LookupConfig::default()
        },
    );

    let delay = lookup.lookup(&query("BA123")).await.unwrap();

    assert!(
        matches!(
            delay.provenance,
            Provenance::Tracked { ref airport, .. } if airport.as_deref() == Some("LFPG")
        ),
        "{:?}",
        delay.provenance
    );
    assert!((delay.delay_hours - 4.0).abs() < f64::EPSILON);
    assert!(delay.is_eligible);
    assert!(source
        .calls()
        .contains(&("LFPG".to_string(), Direction::Arrival)));
}
