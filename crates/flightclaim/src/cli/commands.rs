//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Flight number, airline code followed by digits (e.g., BA123)
    pub flight: String,

    /// Date of the flight, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Scheduled arrival time, HH:MM in the configured clock zone
    #[arg(short, long, value_name = "HH:MM")]
    pub arrival: Option<String>,

    /// Report "not found" instead of estimating a delay
    #[arg(long)]
    pub no_fallback: bool,

    /// Skip the tracking source and return estimated data
    #[arg(long)]
    pub mock: bool,

    /// Save the result to the claims database
    #[arg(short, long)]
    pub save: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Saved claim commands.
#[derive(Debug, Subcommand)]
pub enum ClaimsCommand {
    /// List saved claims, newest first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a saved claim
    Delete {
        /// Claim identifier as shown by `claims list`
        id: String,
    },

    /// Print the shareable summary of a saved claim
    Share {
        /// Claim identifier as shown by `claims list`
        id: String,
    },
}

/// Suggest command arguments.
#[derive(Debug, Args)]
pub struct SuggestCommand {
    /// Partially typed flight number (e.g., LH4)
    pub input: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
