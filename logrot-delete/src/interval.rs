//! Relative intervals and absolute cutoffs for age-based deletion.
//!
//! Intervals are written in natural language (`1 month`, `7 days`,
//! `1 year, 2 weeks`), as ISO-8601 durations (`P7D`, `P1Y2M`, `PT12H`) or in
//! compact form (`7d`, `1h30m`). Years and months are calendar units; every
//! other unit is an exact length of time.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Errors from parsing or applying an interval.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval is empty")]
    Empty,

    #[error("invalid interval: {0}")]
    Invalid(String),

    #[error("unknown interval unit: {0}")]
    UnknownUnit(String),

    #[error("interval out of range: {0}")]
    OutOfRange(String),
}

/// A span of time made of calendar months plus an exact duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    months: u32,
    exact: Duration,
}

impl Interval {
    pub fn new(months: u32, exact: Duration) -> Self {
        Self { months, exact }
    }

    pub fn months(months: u32) -> Self {
        Self::new(months, Duration::ZERO)
    }

    pub fn days(days: u64) -> Self {
        Self::new(0, Duration::from_secs(days * 86_400))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(0, Duration::from_secs(secs))
    }

    /// Calendar months in the interval.
    pub fn calendar_months(&self) -> u32 {
        self.months
    }

    /// Exact part of the interval.
    pub fn exact(&self) -> Duration {
        self.exact
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.exact.is_zero()
    }

    /// The instant `self` before `instant`.
    ///
    /// Months are subtracted first, clamping to the last day of a shorter
    /// month, then the exact duration.
    pub fn before(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, IntervalError> {
        let out_of_range = || IntervalError::OutOfRange(format!("{:?} before {}", self, instant));
        let shifted = instant
            .checked_sub_months(Months::new(self.months))
            .ok_or_else(out_of_range)?;
        let exact = chrono::Duration::from_std(self.exact).map_err(|_| out_of_range())?;
        shifted.checked_sub_signed(exact).ok_or_else(out_of_range)
    }

    fn add_months(&mut self, n: u64, input: &str) -> Result<(), IntervalError> {
        let n = u32::try_from(n).map_err(|_| IntervalError::OutOfRange(input.to_string()))?;
        self.months = self
            .months
            .checked_add(n)
            .ok_or_else(|| IntervalError::OutOfRange(input.to_string()))?;
        Ok(())
    }

    fn add_exact(&mut self, d: Duration, input: &str) -> Result<(), IntervalError> {
        self.exact = self
            .exact
            .checked_add(d)
            .ok_or_else(|| IntervalError::OutOfRange(input.to_string()))?;
        Ok(())
    }
}

/// Months per calendar unit, if `unit` names one.
fn calendar_unit(unit: &str) -> Option<u64> {
    match unit {
        "y" | "yr" | "yrs" | "year" | "years" => Some(12),
        "M" | "mo" | "mon" | "mons" | "month" | "months" => Some(1),
        _ => None,
    }
}

/// Parse the natural-language and compact forms: `<n> <unit>` pairs,
/// optionally separated by whitespace, commas or `and`.
fn parse_natural(input: &str) -> Result<Interval, IntervalError> {
    let mut interval = Interval::default();
    let mut rest = input.trim();
    let mut pairs = 0;

    while !rest.is_empty() {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if let Some(after) = rest.strip_prefix("and ") {
            rest = after;
            continue;
        }
        if rest.is_empty() {
            break;
        }

        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(IntervalError::Invalid(input.to_string()));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| IntervalError::OutOfRange(input.to_string()))?;
        rest = rest[digits..].trim_start();

        let letters = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if letters == 0 {
            return Err(IntervalError::Invalid(input.to_string()));
        }
        let unit = &rest[..letters];
        rest = &rest[letters..];

        // Calendar units keep their case for the `M` (month) / `m` (minute) split
        let calendar = calendar_unit(unit).or_else(|| {
            let lower = unit.to_ascii_lowercase();
            (lower != "m").then(|| calendar_unit(&lower)).flatten()
        });
        match calendar {
            Some(months) => {
                let total = value
                    .checked_mul(months)
                    .ok_or_else(|| IntervalError::OutOfRange(input.to_string()))?;
                interval.add_months(total, input)?;
            }
            None => {
                let compact = format!("{}{}", value, unit.to_ascii_lowercase());
                let exact = humantime::parse_duration(&compact)
                    .map_err(|_| IntervalError::UnknownUnit(unit.to_string()))?;
                interval.add_exact(exact, input)?;
            }
        }
        pairs += 1;
    }

    if pairs == 0 {
        return Err(IntervalError::Empty);
    }
    Ok(interval)
}

/// Parse an ISO-8601 duration such as `P1Y2M10DT2H30M` or `P2W`.
fn parse_iso8601(input: &str) -> Result<Interval, IntervalError> {
    let invalid = || IntervalError::Invalid(input.to_string());
    let body = input
        .strip_prefix('P')
        .or_else(|| input.strip_prefix('p'))
        .ok_or_else(invalid)?
        .to_ascii_uppercase();

    let mut interval = Interval::default();
    let mut in_time = false;
    let mut number = String::new();
    let mut components = 0;

    for c in body.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c == 'T' {
            if in_time || !number.is_empty() {
                return Err(invalid());
            }
            in_time = true;
            continue;
        }
        if number.is_empty() {
            return Err(invalid());
        }
        let value: u64 = number
            .parse()
            .map_err(|_| IntervalError::OutOfRange(input.to_string()))?;
        number.clear();

        let secs_per = |unit: u64| {
            value
                .checked_mul(unit)
                .map(Duration::from_secs)
                .ok_or_else(|| IntervalError::OutOfRange(input.to_string()))
        };
        match (in_time, c) {
            (false, 'Y') => {
                let months = value
                    .checked_mul(12)
                    .ok_or_else(|| IntervalError::OutOfRange(input.to_string()))?;
                interval.add_months(months, input)?;
            }
            (false, 'M') => interval.add_months(value, input)?,
            (false, 'W') => interval.add_exact(secs_per(7 * 86_400)?, input)?,
            (false, 'D') => interval.add_exact(secs_per(86_400)?, input)?,
            (true, 'H') => interval.add_exact(secs_per(3_600)?, input)?,
            (true, 'M') => interval.add_exact(secs_per(60)?, input)?,
            (true, 'S') => interval.add_exact(secs_per(1)?, input)?,
            _ => return Err(invalid()),
        }
        components += 1;
    }

    if !number.is_empty() || components == 0 {
        return Err(invalid());
    }
    Ok(interval)
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IntervalError::Empty);
        }
        let iso = trimmed
            .strip_prefix(['P', 'p'])
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit() || c == 'T' || c == 't'));
        if iso {
            return parse_iso8601(trimmed);
        }
        parse_natural(trimmed)
    }
}

/// Parse an absolute instant: RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`. Times without an offset are UTC.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// When an entry becomes eligible for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Older than `now` minus the interval.
    OlderThan(Interval),
    /// Older than a fixed instant.
    Before(DateTime<Utc>),
}

impl Threshold {
    /// The cutoff instant for a given `now`. Entries strictly older are eligible.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, IntervalError> {
        match self {
            Threshold::OlderThan(interval) => interval.before(now),
            Threshold::Before(instant) => Ok(*instant),
        }
    }
}

impl From<Interval> for Threshold {
    fn from(interval: Interval) -> Self {
        Threshold::OlderThan(interval)
    }
}

impl From<DateTime<Utc>> for Threshold {
    fn from(instant: DateTime<Utc>) -> Self {
        Threshold::Before(instant)
    }
}

impl FromStr for Threshold {
    type Err = IntervalError;

    /// Intervals take precedence; anything that is not an interval is tried
    /// as an absolute instant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Interval>() {
            Ok(interval) => Ok(Threshold::OlderThan(interval)),
            Err(IntervalError::Empty) => Err(IntervalError::Empty),
            Err(err) => parse_instant(s).map(Threshold::Before).ok_or(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    // --- Natural language ---

    #[test]
    fn test_parse_one_month() {
        assert_eq!("1 month".parse::<Interval>(), Ok(Interval::months(1)));
        assert_eq!("2 months".parse::<Interval>(), Ok(Interval::months(2)));
    }

    #[test]
    fn test_parse_days() {
        assert_eq!("7 days".parse::<Interval>(), Ok(Interval::days(7)));
        assert_eq!("1 day".parse::<Interval>(), Ok(Interval::days(1)));
    }

    #[test]
    fn test_parse_years_are_months() {
        assert_eq!("1 year".parse::<Interval>(), Ok(Interval::months(12)));
    }

    #[test]
    fn test_parse_combined() {
        let interval: Interval = "1 year, 2 months and 3 days".parse().unwrap();
        assert_eq!(interval.calendar_months(), 14);
        assert_eq!(interval.exact(), Duration::from_secs(3 * 86_400));

        let interval: Interval = "2 weeks 3 hours".parse().unwrap();
        assert_eq!(interval.exact(), Duration::from_secs(14 * 86_400 + 3 * 3_600));
    }

    #[test]
    fn test_parse_compact() {
        assert_eq!("7d".parse::<Interval>(), Ok(Interval::days(7)));
        assert_eq!("1h30m".parse::<Interval>(), Ok(Interval::seconds(5_400)));
        assert_eq!("30s".parse::<Interval>(), Ok(Interval::seconds(30)));
    }

    #[test]
    fn test_parse_month_minute_case() {
        assert_eq!("3M".parse::<Interval>(), Ok(Interval::months(3)));
        assert_eq!("3m".parse::<Interval>(), Ok(Interval::seconds(180)));
    }

    #[test]
    fn test_parse_case_insensitive_words() {
        assert_eq!("1 Month".parse::<Interval>(), Ok(Interval::months(1)));
        assert_eq!("7 DAYS".parse::<Interval>(), Ok(Interval::days(7)));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!("".parse::<Interval>(), Err(IntervalError::Empty));
        assert_eq!("  ".parse::<Interval>(), Err(IntervalError::Empty));
    }

    #[test]
    fn test_parse_unknown_unit() {
        assert_eq!(
            "3 fortnights".parse::<Interval>(),
            Err(IntervalError::UnknownUnit("fortnights".into()))
        );
    }

    #[test]
    fn test_parse_missing_unit_or_number() {
        assert!(matches!("7".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("days".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("-1 day".parse::<Interval>(), Err(IntervalError::Invalid(_))));
    }

    // --- ISO-8601 ---

    #[test]
    fn test_parse_iso_days() {
        assert_eq!("P7D".parse::<Interval>(), Ok(Interval::days(7)));
    }

    #[test]
    fn test_parse_iso_months_vs_minutes() {
        assert_eq!("P1M".parse::<Interval>(), Ok(Interval::months(1)));
        assert_eq!("PT1M".parse::<Interval>(), Ok(Interval::seconds(60)));
    }

    #[test]
    fn test_parse_iso_full() {
        let interval: Interval = "P1Y2M3DT4H5M6S".parse().unwrap();
        assert_eq!(interval.calendar_months(), 14);
        assert_eq!(
            interval.exact(),
            Duration::from_secs(3 * 86_400 + 4 * 3_600 + 5 * 60 + 6)
        );
    }

    #[test]
    fn test_parse_iso_weeks() {
        assert_eq!("P2W".parse::<Interval>(), Ok(Interval::days(14)));
    }

    #[test]
    fn test_parse_iso_invalid() {
        assert!(matches!("P".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("PT".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("P7".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("P1H".parse::<Interval>(), Err(IntervalError::Invalid(_))));
        assert!(matches!("PT1D".parse::<Interval>(), Err(IntervalError::Invalid(_))));
    }

    // --- Applying intervals ---

    #[test]
    fn test_one_month_before() {
        let cutoff = Interval::months(1).before(at(2016, 4, 26, 0, 0, 0)).unwrap();
        assert_eq!(cutoff, at(2016, 3, 26, 0, 0, 0));
    }

    #[test]
    fn test_month_before_clamps_to_month_end() {
        let cutoff = Interval::months(1).before(at(2016, 3, 31, 0, 0, 0)).unwrap();
        assert_eq!(cutoff, at(2016, 2, 29, 0, 0, 0));
    }

    #[test]
    fn test_seven_days_before() {
        let cutoff = Interval::days(7).before(at(2016, 3, 9, 0, 0, 0)).unwrap();
        assert_eq!(cutoff, at(2016, 3, 2, 0, 0, 0));
    }

    #[test]
    fn test_months_then_exact() {
        let interval = Interval::new(1, Duration::from_secs(86_400));
        let cutoff = interval.before(at(2016, 4, 1, 0, 0, 0)).unwrap();
        assert_eq!(cutoff, at(2016, 2, 29, 0, 0, 0));
    }

    #[test]
    fn test_before_out_of_range() {
        let interval = Interval::months(u32::MAX);
        assert!(matches!(
            interval.before(at(2016, 4, 1, 0, 0, 0)),
            Err(IntervalError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_zero_interval() {
        assert!(Interval::default().is_zero());
        assert!(!Interval::days(1).is_zero());
    }

    // --- Threshold ---

    #[test]
    fn test_threshold_parses_interval_first() {
        assert_eq!(
            "7 days".parse::<Threshold>(),
            Ok(Threshold::OlderThan(Interval::days(7)))
        );
    }

    #[test]
    fn test_threshold_parses_instants() {
        assert_eq!(
            "2016-03-26".parse::<Threshold>(),
            Ok(Threshold::Before(at(2016, 3, 26, 0, 0, 0)))
        );
        assert_eq!(
            "2016-03-26 12:30:00".parse::<Threshold>(),
            Ok(Threshold::Before(at(2016, 3, 26, 12, 30, 0)))
        );
        assert_eq!(
            "2016-03-26T12:30:00+02:00".parse::<Threshold>(),
            Ok(Threshold::Before(at(2016, 3, 26, 10, 30, 0)))
        );
    }

    #[test]
    fn test_threshold_invalid_keeps_interval_error() {
        assert_eq!(
            "3 fortnights".parse::<Threshold>(),
            Err(IntervalError::UnknownUnit("fortnights".into()))
        );
        assert_eq!("".parse::<Threshold>(), Err(IntervalError::Empty));
    }

    #[test]
    fn test_threshold_cutoff() {
        let now = at(2016, 4, 26, 0, 0, 0);
        assert_eq!(
            Threshold::from(Interval::months(1)).cutoff(now),
            Ok(at(2016, 3, 26, 0, 0, 0))
        );
        assert_eq!(
            Threshold::from(at(2016, 1, 1, 0, 0, 0)).cutoff(now),
            Ok(at(2016, 1, 1, 0, 0, 0))
        );
    }
}
