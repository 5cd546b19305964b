//! `flightclaim` - Flight delay compensation eligibility checker
//!
//! Resolves a commercial flight number to the callsign it broadcasts, finds
//! the flight in OpenSky Network tracking data, and decides whether its
//! arrival delay qualifies under EU Regulation 261/2004.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod airline;
pub mod claim;
pub mod cli;
pub mod config;
pub mod delay;
pub mod error;
pub mod flight;
pub mod logging;
pub mod lookup;
pub mod matcher;
pub mod random;
pub mod source;
pub mod storage;
pub mod suggest;

pub use claim::Claim;
pub use config::Config;
pub use error::{Error, Result};
pub use flight::{FlightNumber, FlightRecord, LookupQuery};
pub use logging::init_logging;
pub use lookup::{FlightDelay, LookupError, LookupOrchestrator, LookupResult, Provenance};
pub use source::{FlightDataSource, OpenSkyClient, SourceError};
pub use storage::{ClaimStore, Storage, StorageStats};
