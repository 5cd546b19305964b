//! Flight tracking data source.
//!
//! This module defines the [`FlightDataSource`] abstraction the lookup
//! pipeline queries, and [`OpenSkyClient`], its implementation over the
//! OpenSky Network REST API:
//!
//! ```text
//! GET {base}/flights/{arrival|departure}?airport={ICAO}&begin={epoch}&end={epoch}
//! ```
//!
//! Requests are retried with exponential backoff. A 429 adds a linear
//! penalty on top; a 404 means the airport has no data for the window and is
//! never retried.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::flight::{DayWindow, Direction, FlightRecord};

/// Errors returned by a flight data source for one airport query.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has no flights for this airport and window (HTTP 404).
    #[error("no {direction} data for {airport} in the requested window")]
    NoData {
        /// ICAO code of the queried airport.
        airport: String,
        /// Queried direction.
        direction: Direction,
    },

    /// The source kept answering HTTP 429.
    #[error("rate limited by the flight data source while querying {airport}")]
    RateLimited {
        /// ICAO code of the queried airport.
        airport: String,
    },

    /// The source answered with another non-success status.
    #[error("flight data source unavailable for {airport}: HTTP {status}")]
    Unavailable {
        /// ICAO code of the queried airport.
        airport: String,
        /// HTTP status code of the last response.
        status: u16,
    },

    /// The request could not be sent or the body could not be read.
    #[error("request for {airport} failed: {source}")]
    Transport {
        /// ICAO code of the queried airport.
        airport: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The body was not a JSON array of flight records.
    #[error("malformed response for {airport}: {message}")]
    Decode {
        /// ICAO code of the queried airport.
        airport: String,
        /// Parser message.
        message: String,
    },
}

/// Result type for data source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

impl SourceError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable { .. } | Self::Transport { .. }
        )
    }

    /// Whether this is a rate-limit rejection.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// A queryable source of flight tracking records.
#[async_trait::async_trait]
pub trait FlightDataSource: Send + Sync {
    /// Fetch the flights seen at `airport` in `direction` during `window`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] once the implementation has given up on the
    /// query. Callers treat every error as "skip this airport".
    async fn fetch_records(
        &self,
        airport: &str,
        direction: Direction,
        window: DayWindow,
    ) -> Result<Vec<FlightRecord>>;
}

/// Backoff schedule for failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff.
    pub backoff_base: Duration,
    /// Extra linear delay applied after a 429.
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
            rate_limit_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before retry number `attempt + 1`:
    /// `backoff_base * 2^attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Additional wait after a 429 on `attempt`:
    /// `rate_limit_backoff * (attempt + 1)`.
    #[must_use]
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff
            .saturating_mul(attempt.saturating_add(1))
    }

    /// Total wait before retrying after `error` on `attempt`.
    #[must_use]
    pub fn delay_after(&self, error: &SourceError, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        if error.is_rate_limited() {
            delay.saturating_add(self.rate_limit_delay(attempt))
        } else {
            delay
        }
    }

    /// Longest one query can take when every attempt runs into
    /// `request_timeout` and each retry waits out the rate-limit backoff.
    #[must_use]
    pub fn worst_case(&self, request_timeout: Duration) -> Duration {
        (0..self.max_retries).fold(
            request_timeout.saturating_mul(self.max_retries.saturating_add(1)),
            |total, attempt| {
                total
                    .saturating_add(self.backoff(attempt))
                    .saturating_add(self.rate_limit_delay(attempt))
            },
        )
    }
}

/// HTTP client for the OpenSky Network flights API.
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    credentials: Option<(String, String)>,
}

impl OpenSkyClient {
    /// Build a client from source configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("flightclaim/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            retry: config.retry_policy(),
            credentials,
        })
    }

    /// The retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// URL for one airport/direction/window query.
    #[must_use]
    pub fn flights_url(&self, airport: &str, direction: Direction, window: DayWindow) -> String {
        format!(
            "{}/flights/{}?airport={}&begin={}&end={}",
            self.base_url, direction, airport, window.begin, window.end
        )
    }

    async fn fetch_once(
        &self,
        url: &str,
        airport: &str,
        direction: Direction,
    ) -> Result<Vec<FlightRecord>> {
        let mut request = self.http.get(url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                airport: airport.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NoData {
                airport: airport.to_string(),
                direction,
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited {
                airport: airport.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                airport: airport.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<FlightRecord>>()
            .await
            .map_err(|source| {
                if source.is_decode() {
                    SourceError::Decode {
                        airport: airport.to_string(),
                        message: source.to_string(),
                    }
                } else {
                    SourceError::Transport {
                        airport: airport.to_string(),
                        source,
                    }
                }
            })
    }
}

#[async_trait::async_trait]
impl FlightDataSource for OpenSkyClient {
    async fn fetch_records(
        &self,
        airport: &str,
        direction: Direction,
        window: DayWindow,
    ) -> Result<Vec<FlightRecord>> {
        let url = self.flights_url(airport, direction, window);
        let mut attempt = 0;

        loop {
            debug!("Fetching {} flights for {} (attempt {})", direction, airport, attempt + 1);
            match self.fetch_once(&url, airport, direction).await {
                Ok(records) => {
                    debug!("Received {} {} flights for {}", records.len(), direction, airport);
                    return Ok(records);
                }
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_after(&err, attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt + 1,
                        self.retry.max_retries + 1,
                        airport,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DayWindow {
        DayWindow {
            begin: 1_741_392_000,
            end: 1_741_478_400,
        }
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(64) >= policy.backoff(10));
    }

    #[test]
    fn test_rate_limit_adds_linear_delay() {
        let policy = RetryPolicy::default();
        let limited = SourceError::RateLimited {
            airport: "EGLL".to_string(),
        };
        let unavailable = SourceError::Unavailable {
            airport: "EGLL".to_string(),
            status: 503,
        };
        assert_eq!(policy.delay_after(&limited, 0), Duration::from_secs(2));
        assert_eq!(policy.delay_after(&limited, 1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(&unavailable, 1), Duration::from_secs(2));
    }

    #[test]
    fn test_worst_case_budget() {
        let policy = RetryPolicy::default();
        // 3 x 30s timeouts, backoff 1s + 2s, rate-limit extra 1s + 2s
        assert_eq!(
            policy.worst_case(Duration::from_secs(30)),
            Duration::from_secs(96)
        );

        let no_retries = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(
            no_retries.worst_case(Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(SourceError::RateLimited {
            airport: "EHAM".to_string()
        }
        .is_retryable());
        assert!(SourceError::Unavailable {
            airport: "EHAM".to_string(),
            status: 500
        }
        .is_retryable());
        assert!(!SourceError::NoData {
            airport: "EHAM".to_string(),
            direction: Direction::Arrival
        }
        .is_retryable());
        assert!(!SourceError::Decode {
            airport: "EHAM".to_string(),
            message: "expected array".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::NoData {
            airport: "LFPG".to_string(),
            direction: Direction::Departure,
        };
        assert_eq!(
            err.to_string(),
            "no departure data for LFPG in the requested window"
        );
        let err = SourceError::Unavailable {
            airport: "LFPG".to_string(),
            status: 502,
        };
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_flights_url() {
        let config = SourceConfig {
            base_url: "https://opensky.example/api/".to_string(),
            ..SourceConfig::default()
        };
        let client = OpenSkyClient::new(&config).unwrap();
        assert_eq!(
            client.flights_url("EGLL", Direction::Arrival, window()),
            "https://opensky.example/api/flights/arrival?airport=EGLL&begin=1741392000&end=1741478400"
        );
    }

    #[test]
    fn test_client_uses_configured_retry_policy() {
        let config = SourceConfig {
            max_retries: 5,
            backoff_base_ms: 10,
            ..SourceConfig::default()
        };
        let client = OpenSkyClient::new(&config).unwrap();
        assert_eq!(client.retry_policy().max_retries, 5);
        assert_eq!(client.retry_policy().backoff_base, Duration::from_millis(10));
    }
}
