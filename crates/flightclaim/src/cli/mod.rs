//! Command-line interface for flightclaim.
//!
//! This module provides the CLI structure for the `flightclaim` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{CheckCommand, ClaimsCommand, ConfigCommand, SuggestCommand};

/// flightclaim - Check whether a delayed flight qualifies for EU261 compensation
///
/// Looks the flight up in public ADS-B tracking data, computes the arrival
/// delay and tells you whether it meets the three-hour threshold.
#[derive(Debug, Parser)]
#[command(name = "flightclaim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a flight and check its compensation eligibility
    Check(CheckCommand),

    /// Manage saved claims
    #[command(subcommand)]
    Claims(ClaimsCommand),

    /// Suggest flight numbers for partial input
    Suggest(SuggestCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
