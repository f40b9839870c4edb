//! Parsing of typed item entries such as `2 iron ore` or `0.5x coal`

use regex::Regex;

use crate::error::{RecipeError, Result};
use crate::models::{ItemRates, is_valid_rate, normalize_name};

const ENTRY_PATTERN: &str =
    r"^\s*(?:(?P<count>[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)\s*[xX]?\s+)?(?P<name>.+?)\s*$";

/// Parse one entry into a normalized item name and rate.
///
/// A leading number (optionally followed by `x`) is the rate; without one
/// the rate is 1.
pub fn parse_item(entry: &str) -> Result<(String, f64)> {
    let re = Regex::new(ENTRY_PATTERN)?;
    parse_with(&re, entry)
}

/// Parse a comma separated list of entries, skipping empty segments
pub fn parse_items(entries: &str) -> Result<ItemRates> {
    let re = Regex::new(ENTRY_PATTERN)?;
    let mut rates = ItemRates::new();
    for entry in entries.split(',').filter(|e| !e.trim().is_empty()) {
        let (name, rate) = parse_with(&re, entry)?;
        rates.insert(name, rate);
    }
    Ok(rates)
}

fn parse_with(re: &Regex, entry: &str) -> Result<(String, f64)> {
    let invalid = || RecipeError::InvalidEntry {
        entry: entry.to_string(),
    };

    let caps = re.captures(entry).ok_or_else(invalid)?;
    let name = normalize_name(&caps["name"]);
    if name.is_empty() {
        return Err(invalid());
    }

    let rate = match caps.name("count") {
        Some(count) => count.as_str().parse::<f64>().map_err(|_| invalid())?,
        None => 1.0,
    };
    if !is_valid_rate(rate) {
        return Err(RecipeError::InvalidRate { item: name, rate });
    }

    Ok((name, rate))
}
