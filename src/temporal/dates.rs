//! Stylized corpus dates.
//!
//! A date is a roman-numeral year fragment with an optional suffix:
//!
//! - `MMXXIV`    → 2024-01-01
//! - `MMXXIV.Q2` → 2024-04-01 (quarter `q` starts in month `q*3 - 2`)
//! - `MMXXIV.07` → 2024-07-01
//! - `XXIV`      → 2024-01-01 (two-digit fragments are read as `20xx`)
//!
//! Everything resolves to midnight UTC on the first of the month.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Matches an in-content modification marker followed by a stylized date.
pub static MODIFICATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?i:updated|revised|modified|amended)\s*[:\-]?\s*([MDCLXVI]+(?:\.(?:Q\d+|\d{2}))?)\b",
    )
    .expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateParseError {
    Empty,
    InvalidRoman(String),
    /// Decoded year fragment is neither two-digit nor four-digit.
    YearOutOfRange(u32),
    InvalidQuarter(String),
    InvalidMonth(String),
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DateParseError::Empty => write!(f, "empty date"),
            DateParseError::InvalidRoman(s) => write!(f, "invalid roman numeral '{s}'"),
            DateParseError::YearOutOfRange(y) => write!(f, "year fragment {y} out of range"),
            DateParseError::InvalidQuarter(s) => write!(f, "invalid quarter '{s}'"),
            DateParseError::InvalidMonth(s) => write!(f, "invalid month '{s}'"),
        }
    }
}

fn roman_value(c: char) -> Option<u32> {
    match c {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Standard subtractive-notation decoding. Accepts any sequence of roman letters; it does not
/// reject non-canonical forms such as `IIII`.
pub fn roman_to_int(roman: &str) -> Result<u32, DateParseError> {
    if roman.is_empty() {
        return Err(DateParseError::Empty);
    }
    let values = roman
        .chars()
        .map(roman_value)
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| DateParseError::InvalidRoman(roman.to_string()))?;

    let mut total: i64 = 0;
    for (idx, value) in values.iter().enumerate() {
        match values.get(idx + 1) {
            Some(next) if next > value => total -= i64::from(*value),
            _ => total += i64::from(*value),
        }
    }
    u32::try_from(total).map_err(|_| DateParseError::InvalidRoman(roman.to_string()))
}

/// Parse a stylized date into a UTC timestamp.
pub fn parse_stylized_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DateParseError::Empty);
    }
    let (fragment, suffix) = match raw.split_once('.') {
        Some((fragment, suffix)) => (fragment, Some(suffix)),
        None => (raw, None),
    };

    let decoded = roman_to_int(fragment)?;
    let year = match decoded {
        0..=99 => 2000 + decoded,
        1000..=9999 => decoded,
        other => return Err(DateParseError::YearOutOfRange(other)),
    };

    let month = match suffix {
        None => 1,
        Some(s) => {
            if let Some(quarter) = s.strip_prefix('Q') {
                match quarter.parse::<u32>() {
                    Ok(q @ 1..=4) => q * 3 - 2,
                    _ => return Err(DateParseError::InvalidQuarter(s.to_string())),
                }
            } else if s.len() == 2 && s.chars().all(|c| c.is_ascii_digit()) {
                match s.parse::<u32>() {
                    Ok(m @ 1..=12) => m,
                    _ => return Err(DateParseError::InvalidMonth(s.to_string())),
                }
            } else {
                return Err(DateParseError::InvalidMonth(s.to_string()));
            }
        }
    };

    // `year` is bounded above and month is validated, so this is always a single instant.
    Utc.with_ymd_and_hms(year as i32, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| DateParseError::InvalidMonth(format!("{month}")))
}

/// All modification dates mentioned in `content`, in order of appearance, as raw strings.
pub fn modification_markers(content: &str) -> Vec<&str> {
    MODIFICATION_MARKER
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
