//! Configuration management for flightclaim.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flight::ClockZone;
use crate::matcher::MatchTiers;
use crate::source::RetryPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightclaim";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "claims.db";

/// Upper bound on configured retries.
const MAX_RETRIES_LIMIT: u32 = 10;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTCLAIM_`, sections split
///    by `__`, e.g. `FLIGHTCLAIM_LOOKUP__FALLBACK_ENABLED=false`)
/// 2. TOML config file at `~/.config/flightclaim/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lookup pipeline configuration.
    pub lookup: LookupConfig,
    /// Flight data source configuration.
    pub source: SourceConfig,
    /// Enabled callsign matching tiers.
    pub matching: MatchTiers,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Lookup pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Return a synthetic result when no tracked flight matches.
    pub fallback_enabled: bool,
    /// Skip the tracking source entirely and always return synthetic data.
    pub mock_mode: bool,
    /// ICAO codes of the airports to search, in priority order.
    pub airports: Vec<String>,
    /// Wall-clock budget for the whole search in seconds.
    /// Set to 0 (the default) for unlimited. A non-zero value must cover
    /// at least one airport query with all of its retries.
    pub search_deadline_secs: u64,
    /// Offset from UTC, in minutes, used to interpret dates and times.
    /// Defaults to the system time zone.
    pub utc_offset_minutes: Option<i32>,
    /// Seed for synthetic delays. Unset means OS entropy.
    pub random_seed: Option<u64>,
}

/// Flight data source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the OpenSky REST API.
    pub base_url: String,
    /// OpenSky account name (optional, raises rate limits).
    pub username: Option<String>,
    /// OpenSky account password. Never written out by `config show`.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Retries per airport query after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff in milliseconds.
    pub backoff_base_ms: u64,
    /// Extra linear backoff after a 429, in milliseconds.
    pub rate_limit_backoff_ms: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the claims database.
    /// Defaults to `~/.local/share/flightclaim/claims.db`
    pub database_path: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            mock_mode: false,
            airports: default_airports(),
            search_deadline_secs: 0,
            utc_offset_minutes: None,
            random_seed: None,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opensky-network.org/api".to_string(),
            username: None,
            password: None,
            max_retries: 2,
            backoff_base_ms: 1000,
            rate_limit_backoff_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// Major European airports, busiest first.
fn default_airports() -> Vec<String> {
    [
        // London: Heathrow, Gatwick, City, Stansted
        "EGLL", "EGKK", "EGLC", "EGSS",
        // Amsterdam
        "EHAM",
        // Paris: Charles de Gaulle, Orly
        "LFPG", "LFPO",
        // Frankfurt, Munich
        "EDDF", "EDDM",
        // Madrid, Barcelona
        "LEMD", "LEBL",
        // Rome, Milan
        "LIRF", "LIML",
        // Hamburg, Berlin
        "EDDH", "EDDB",
        // Vienna, Zurich
        "LOWW", "LSZH",
        // Copenhagen, Stockholm
        "EKCH", "ESSA",
        // Oslo, Helsinki
        "ENGM", "EFHK",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl SourceConfig {
    /// The per-request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
        }
    }

    /// Longest a single airport query can take, retries included.
    #[must_use]
    pub fn worst_case_query_time(&self) -> Duration {
        self.retry_policy().worst_case(self.request_timeout())
    }
}

impl LookupConfig {
    /// The search deadline, or `None` when unlimited.
    #[must_use]
    pub fn search_deadline(&self) -> Option<Duration> {
        (self.search_deadline_secs > 0).then(|| Duration::from_secs(self.search_deadline_secs))
    }

    /// The clock used to interpret query dates and times.
    ///
    /// # Errors
    ///
    /// Returns an error if `utc_offset_minutes` is out of range.
    pub fn clock_zone(&self) -> Result<ClockZone> {
        ClockZone::from_offset_minutes(self.utc_offset_minutes)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLIGHTCLAIM_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.lookup.airports.is_empty() && !self.lookup.mock_mode {
            return Err(Error::ConfigValidation {
                message: "lookup.airports must list at least one airport".to_string(),
            });
        }

        let icao = regex::Regex::new(r"^[A-Z]{4}$").map_err(|e| Error::internal(e.to_string()))?;
        for airport in &self.lookup.airports {
            if !icao.is_match(airport) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid ICAO airport code: {airport}"),
                });
            }
        }

        self.lookup.clock_zone()?;

        if self.source.base_url.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "source.base_url must not be empty".to_string(),
            });
        }

        if self.source.request_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.source.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::ConfigValidation {
                message: format!(
                    "max_retries ({}) cannot exceed {MAX_RETRIES_LIMIT}",
                    self.source.max_retries
                ),
            });
        }

        if let Some(deadline) = self.lookup.search_deadline() {
            let budget = self.source.worst_case_query_time();
            if deadline < budget {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "lookup.search_deadline_secs ({}) is shorter than one airport query \
                         can take ({}s); raise it or use 0 for no limit",
                        self.lookup.search_deadline_secs,
                        budget.as_secs_f64().ceil()
                    ),
                });
            }
        }

        if !self.matching.any_enabled() {
            return Err(Error::ConfigValidation {
                message: "at least one matching tier must be enabled".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
