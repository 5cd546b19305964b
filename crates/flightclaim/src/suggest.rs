//! Flight number completion.

use crate::airline::is_known_airline;
use crate::random::RandomSource;

/// Minimum input length before suggestions are offered.
pub const MIN_INPUT_LEN: usize = 2;

/// Suggestions generated for known airlines without a popular list.
const RANDOM_SUGGESTIONS: usize = 5;

const RANDOM_LOW: u32 = 100;
const RANDOM_HIGH: u32 = 1098;

/// Frequently searched flight numbers per airline code.
const POPULAR_FLIGHTS: &[(&str, &[&str])] = &[
    ("BA", &["123", "456", "789", "234", "567", "890", "213"]),
    ("LH", &["400", "401", "456", "789", "900", "901", "800"]),
    ("AF", &["123", "234", "345", "456", "567", "678", "789"]),
    ("KL", &["758", "759", "760", "761", "642", "643", "644"]),
    ("FR", &["1234", "5678", "9012", "3456", "7890"]),
    ("EZY", &["2001", "2002", "2003", "2004", "2005"]),
];

fn popular_flights(airline_code: &str) -> Option<&'static [&'static str]> {
    POPULAR_FLIGHTS
        .iter()
        .find(|(code, _)| *code == airline_code)
        .map(|(_, numbers)| *numbers)
}

/// Split partial input into an airline code and the digits typed so far.
///
/// Returns `None` unless the input is 1 to 3 letters followed only by
/// digits.
fn split_partial(input: &str) -> Option<(&str, &str)> {
    let split = input
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    let (code, digits) = input.split_at(split);
    let valid = (1..=3).contains(&code.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some((code, digits))
}

/// Complete a partially typed flight number.
///
/// Known airlines with a popular-flights list get that list; other known
/// airlines get a handful of random numbers. Either way only completions
/// starting with the digits already typed are kept. Unknown airlines and
/// inputs shorter than [`MIN_INPUT_LEN`] yield nothing.
#[must_use]
pub fn flight_suggestions(input: &str, random: &dyn RandomSource) -> Vec<String> {
    let input = input.trim().to_uppercase();
    if input.len() < MIN_INPUT_LEN {
        return Vec::new();
    }
    let Some((code, typed)) = split_partial(&input) else {
        return Vec::new();
    };

    let numbers: Vec<String> = if let Some(popular) = popular_flights(code) {
        popular.iter().map(ToString::to_string).collect()
    } else if is_known_airline(code) {
        (0..RANDOM_SUGGESTIONS)
            .map(|_| random.next_in_range(RANDOM_LOW, RANDOM_HIGH).to_string())
            .collect()
    } else {
        return Vec::new();
    };

    let mut suggestions: Vec<String> = Vec::new();
    for number in numbers.iter().filter(|n| n.starts_with(typed)) {
        let suggestion = format!("{code}{number}");
        if !suggestions.contains(&suggestion) {
            suggestions.push(suggestion);
        }
    }
    suggestions
}
