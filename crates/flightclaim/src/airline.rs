//! Airline code to ATC callsign prefix resolution.
//!
//! Commercial flight numbers carry the IATA airline designator (`BA123`),
//! while tracking data carries the ICAO radiotelephony prefix (`BAW123`).
//! This module bridges the two with a static table of common carriers.

use tracing::debug;

use crate::error::{Error, Result};

/// Maximum length of an airline code prefix.
const MAX_AIRLINE_CODE_LEN: usize = 3;

/// Known airline codes and the callsign prefixes their flights broadcast.
///
/// Carriers operating several air operator certificates list every prefix,
/// most common first. Designators containing a digit (`U2`, `W6`) have no
/// entry: a number such as `U2123` is read as airline `U`, so only the
/// numeric-only matching tier can find it.
const AIRLINE_CALLSIGNS: &[(&str, &[&str])] = &[
    ("AA", &["AAL"]),
    ("AC", &["ACA"]),
    ("AF", &["AFR"]),
    ("AY", &["FIN"]),
    ("AZ", &["ITY"]),
    ("BA", &["BAW", "SHT"]),
    ("BT", &["BTI"]),
    ("CX", &["CPA"]),
    ("DE", &["CFG"]),
    ("DL", &["DAL"]),
    ("DY", &["NOZ", "NSZ", "NAX"]),
    ("EI", &["EIN"]),
    ("EK", &["UAE"]),
    ("EW", &["EWG"]),
    ("EY", &["ETD"]),
    ("EZY", &["EZY", "EJU", "EZS"]),
    ("FR", &["RYR", "RUK"]),
    ("GF", &["GFA"]),
    ("HV", &["TRA"]),
    ("IB", &["IBE"]),
    ("JU", &["ASL"]),
    ("KL", &["KLM"]),
    ("LG", &["LGL"]),
    ("LH", &["DLH"]),
    ("LO", &["LOT"]),
    ("LS", &["EXS"]),
    ("LX", &["SWR"]),
    ("MS", &["MSR"]),
    ("OK", &["CSA"]),
    ("OS", &["AUA"]),
    ("PC", &["PGT"]),
    ("QF", &["QFA"]),
    ("QR", &["QTR"]),
    ("RO", &["ROT"]),
    ("SK", &["SAS"]),
    ("SN", &["BEL"]),
    ("SQ", &["SIA"]),
    ("TK", &["THY"]),
    ("TO", &["TVF"]),
    ("TP", &["TAP"]),
    ("UA", &["UAL"]),
    ("UX", &["AEA"]),
    ("VS", &["VIR"]),
    ("VY", &["VLG"]),
    ("WF", &["WIF"]),
];

/// The airline code of a flight number and the callsign prefixes to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallsignPrefixes {
    /// Code as typed by the user (`BA`).
    pub airline_code: String,
    /// ATC prefixes for that code (`BAW`, `SHT`), or the code itself when
    /// the carrier is unknown.
    pub mapped_prefixes: Vec<String>,
}

impl CallsignPrefixes {
    /// All candidate prefixes: mapped prefixes first, then the raw airline
    /// code when it is not already among them.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let raw = (!self.mapped_prefixes.contains(&self.airline_code))
            .then_some(self.airline_code.as_str());
        self.mapped_prefixes
            .iter()
            .map(String::as_str)
            .chain(raw)
    }
}

/// Look up the callsign prefixes registered for an airline code.
#[must_use]
pub fn known_prefixes(airline_code: &str) -> Option<&'static [&'static str]> {
    AIRLINE_CALLSIGNS
        .iter()
        .find(|(code, _)| *code == airline_code)
        .map(|(_, prefixes)| *prefixes)
}

/// Check whether an airline code is in the callsign table.
#[must_use]
pub fn is_known_airline(airline_code: &str) -> bool {
    known_prefixes(airline_code).is_some()
}

/// Extract the airline code from `flight_number` and map it to callsign
/// prefixes.
///
/// The code is the run of non-digit characters at the start of the
/// uppercased flight number and must be one to three letters long.
///
/// # Errors
///
/// Returns [`Error::MalformedFlightNumber`] when no such prefix exists.
pub fn resolve_callsign_prefixes(flight_number: &str) -> Result<CallsignPrefixes> {
    let upper = flight_number.trim().to_uppercase();
    let airline_code: String = upper.chars().take_while(|c| !c.is_ascii_digit()).collect();

    if airline_code.is_empty()
        || airline_code.chars().count() > MAX_AIRLINE_CODE_LEN
        || !airline_code.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(Error::malformed_flight_number(flight_number));
    }

    let mapped_prefixes = match known_prefixes(&airline_code) {
        Some(prefixes) => prefixes.iter().map(|p| (*p).to_string()).collect(),
        None => vec![airline_code.clone()],
    };
    debug!(
        "Resolved airline code {} to callsign prefixes {:?}",
        airline_code, mapped_prefixes
    );

    Ok(CallsignPrefixes {
        airline_code,
        mapped_prefixes,
    })
}
