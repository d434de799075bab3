//! Human-readable size thresholds.
//!
//! Sizes are a number followed by an optional unit. Units are binary
//! multiples: `KB` is 1024 bytes, `MB` is 1024 KB, and so on.

use thiserror::Error;

/// Errors from parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("size is empty")]
    Empty,

    #[error("invalid size number: {0}")]
    InvalidNumber(String),

    #[error("unknown size unit: {0}")]
    UnknownUnit(String),

    #[error("size too large: {0}")]
    TooLarge(String),
}

const KIB: u64 = 1024;

/// Multiplier for a unit suffix, case-insensitive.
fn unit_multiplier(unit: &str) -> Option<u64> {
    match unit.to_ascii_uppercase().as_str() {
        "" | "B" => Some(1),
        "K" | "KB" | "KIB" => Some(KIB),
        "M" | "MB" | "MIB" => Some(KIB.pow(2)),
        "G" | "GB" | "GIB" => Some(KIB.pow(3)),
        "T" | "TB" | "TIB" => Some(KIB.pow(4)),
        _ => None,
    }
}

/// Parse a size like `25KB`, `1.5 MB` or `4096` into bytes.
///
/// Fractional byte counts are floored.
pub fn parse_size(input: &str) -> Result<u64, SizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SizeError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let unit = unit.trim();

    if number.is_empty() {
        return Err(SizeError::InvalidNumber(input.to_string()));
    }

    let multiplier =
        unit_multiplier(unit).ok_or_else(|| SizeError::UnknownUnit(unit.to_string()))?;

    if number.contains('.') {
        let value: f64 = number
            .parse()
            .map_err(|_| SizeError::InvalidNumber(input.to_string()))?;
        let bytes = (value * multiplier as f64).floor();
        if !bytes.is_finite() || bytes > u64::MAX as f64 {
            return Err(SizeError::TooLarge(input.to_string()));
        }
        return Ok(bytes as u64);
    }

    let value: u64 = number
        .parse()
        .map_err(|_| SizeError::InvalidNumber(input.to_string()))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| SizeError::TooLarge(input.to_string()))
}
