//! `flightclaim` - CLI for the flight delay compensation checker
//!
//! This binary looks up flights, manages saved claims and inspects the
//! configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;

use flightclaim::cli::{CheckCommand, ClaimsCommand, Cli, Command, ConfigCommand};
use flightclaim::delay::{next_steps, DISCLAIMER};
use flightclaim::lookup::{FlightDelay, Provenance};
use flightclaim::random::SeededRandom;
use flightclaim::suggest::flight_suggestions;
use flightclaim::{
    init_logging, Claim, ClaimStore, Config, LookupOrchestrator, LookupQuery, Storage,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return Ok(handle_validate(file.clone().or_else(|| cli.config.clone())));
    }

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Check(check_cmd) => handle_check(config, check_cmd).await,
        Command::Claims(claims_cmd) => handle_claims(&config, claims_cmd).map(|()| ExitCode::SUCCESS),
        Command::Suggest(suggest_cmd) => {
            let random = SeededRandom::new(config.lookup.random_seed);
            for suggestion in flight_suggestions(&suggest_cmd.input, &random) {
                println!("{suggestion}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config(config_cmd) => handle_config(&config, &config_cmd).map(|()| ExitCode::SUCCESS),
    }
}

async fn handle_check(mut config: Config, cmd: CheckCommand) -> CliResult<ExitCode> {
    if cmd.no_fallback {
        config.lookup.fallback_enabled = false;
    }
    if cmd.mock {
        config.lookup.mock_mode = true;
    }

    let date = cmd
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut query = LookupQuery::new(cmd.flight.clone(), date);
    if let Some(arrival) = &cmd.arrival {
        query = query.with_scheduled_arrival(arrival.clone());
    }

    let orchestrator = LookupOrchestrator::from_config(&config)?;
    let result = orchestrator.lookup(&query).await;

    if cmd.save {
        let storage = Storage::open(config.database_path())?;
        let claim = Claim::from_result(&query, &result);
        storage.save(&claim)?;
        if !cmd.json {
            println!("Saved claim {}", claim.id);
        }
    }

    if cmd.json {
        let output = match &result {
            Ok(delay) => serde_json::json!({
                "flight_number": query.flight_number,
                "date": query.date,
                "scheduled_arrival": query.scheduled_arrival,
                "result": delay,
                "next_steps": next_steps(delay.is_eligible),
                "disclaimer": DISCLAIMER,
            }),
            Err(e) => serde_json::json!({
                "flight_number": query.flight_number,
                "date": query.date,
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(delay) => print_delay(&query, delay),
            Err(e) => eprintln!("{e}"),
        }
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_delay(query: &LookupQuery, delay: &FlightDelay) {
    println!("Flight {} on {}", query.flight_number.trim().to_uppercase(), query.date);
    println!("--------------------------");
    if let Some(scheduled) = &query.scheduled_arrival {
        println!("Scheduled arrival: {scheduled}");
    }
    if let Some(actual) = delay.actual_arrival {
        println!("Actual arrival:    {}", actual.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("Delay:             {} hours", delay.delay_hours);

    match &delay.provenance {
        Provenance::Tracked {
            callsign,
            tier,
            airport,
            direction,
            delay_estimated,
        } => {
            let seen_at = match (airport, direction) {
                (Some(airport), Some(direction)) => format!(" at {airport} ({direction})"),
                _ => String::new(),
            };
            println!("Source:            tracked as {callsign}{seen_at}, {tier} match");
            if *delay_estimated {
                println!("                   delay estimated; pass --arrival for an exact figure");
            }
        }
        Provenance::Synthetic => {
            println!("Source:            estimated (no tracking data matched)");
        }
    }

    println!();
    if delay.is_eligible {
        println!("This flight may be eligible for EU261 compensation.");
        println!();
        println!("Next steps:");
        for (i, step) in next_steps(true).iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    } else {
        println!("Delays under 3 hours are not eligible for EU261 compensation.");
    }
    println!();
    println!("Disclaimer: {DISCLAIMER}");
}

fn handle_claims(config: &Config, cmd: ClaimsCommand) -> CliResult<()> {
    let storage = Storage::open(config.database_path())?;

    match cmd {
        ClaimsCommand::List { json } => {
            let claims = storage.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&claims)?);
            } else if claims.is_empty() {
                println!("No saved claims.");
            } else {
                for claim in &claims {
                    let status = match (&claim.error, claim.is_eligible) {
                        (Some(_), _) => "failed".to_string(),
                        (None, true) => format!("{}h, eligible", claim.delay_hours),
                        (None, false) => format!("{}h", claim.delay_hours),
                    };
                    println!(
                        "{:<24} {:<8} {}  {}",
                        claim.id, claim.flight_number, claim.date, status
                    );
                }
                println!();
                println!("{}", storage.stats()?);
            }
        }
        ClaimsCommand::Delete { id } => {
            storage.remove(&id)?;
            println!("Deleted claim {id}");
        }
        ClaimsCommand::Share { id } => {
            let claim = storage
                .get(&id)?
                .ok_or_else(|| flightclaim::Error::ClaimNotFound { id: id.clone() })?;
            println!("{}", claim.share_text());
        }
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) -> ExitCode {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Configuration error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Lookup]");
                println!("  Fallback:           {}", config.lookup.fallback_enabled);
                println!("  Mock mode:          {}", config.lookup.mock_mode);
                println!("  Airports:           {}", config.lookup.airports.join(", "));
                println!("  Search deadline:    {}s", config.lookup.search_deadline_secs);
                match config.lookup.utc_offset_minutes {
                    Some(offset) => println!("  UTC offset (min):   {offset}"),
                    None => println!("  UTC offset (min):   system"),
                }
                println!();
                println!("[Source]");
                println!("  Base URL:           {}", config.source.base_url);
                println!(
                    "  Authenticated:      {}",
                    config.source.username.is_some() && config.source.password.is_some()
                );
                println!("  Max retries:        {}", config.source.max_retries);
                println!("  Request timeout:    {}s", config.source.request_timeout_secs);
                println!();
                println!("[Matching]");
                println!("  Exact:              {}", config.matching.exact);
                println!("  Contains:           {}", config.matching.contains);
                println!("  Numeric only:       {}", config.matching.numeric_only);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}
