//! Glob patterns with an optional embedded time token.
//!
//! A pattern such as `logs/payment.{Ymd}.log` matches `payment.20160324.log`
//! inside `logs/` and parses `20160324` back into a timestamp. The token
//! holds either PHP-style date letters (`Ymd`, `Y-m-d_His`) or a strftime
//! string (`%Y%m%d`).

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use glob::Pattern;
use logrot_fs::{EntryMetadata, Filesystem, FsError};
use regex::Regex;
use thiserror::Error;

/// Errors from building a pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern has no file name part: {0}")]
    MissingFileName(String),

    #[error("unterminated time token in pattern: {0}")]
    UnterminatedToken(String),

    #[error("empty time token in pattern: {0}")]
    EmptyToken(String),

    #[error("only one time token is allowed: {0}")]
    MultipleTokens(String),

    #[error("unsupported time format character '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),
}

/// A directory entry that matched a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEntry {
    /// Path as resolved against the base directory.
    pub path: PathBuf,
    pub metadata: EntryMetadata,
    /// Timestamp parsed from the time token, if the pattern has one.
    pub filename_time: Option<DateTime<Utc>>,
}

impl MatchedEntry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.metadata.modified
    }

    pub fn len(&self) -> u64 {
        self.metadata.len
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.len == 0
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub fn file_stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|n| n.to_str())
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|n| n.to_str())
    }
}

/// A date format extracted from a `{...}` token.
#[derive(Debug, Clone)]
struct TimeFormat {
    /// chrono format string.
    chrono: String,
    /// Regex fragment matching a formatted value.
    regex: String,
    has_month: bool,
    has_day: bool,
    has_time: bool,
}

impl TimeFormat {
    fn parse(token: &str) -> Result<Self, PatternError> {
        if token.contains('%') {
            Self::from_strftime(token)
        } else {
            Self::from_letters(token)
        }
    }

    fn empty() -> Self {
        Self {
            chrono: String::new(),
            regex: String::new(),
            has_month: false,
            has_day: false,
            has_time: false,
        }
    }

    fn push_literal(&mut self, c: char) {
        if c == '%' {
            self.chrono.push_str("%%");
        } else {
            self.chrono.push(c);
        }
        self.regex.push_str(&regex::escape(&c.to_string()));
    }

    /// PHP `date()` letters, e.g. `Ymd` or `Y-m-d H:i:s`.
    fn from_letters(token: &str) -> Result<Self, PatternError> {
        let mut format = Self::empty();
        let mut chars = token.chars();
        while let Some(c) = chars.next() {
            let (directive_fmt, re) = match c {
                'Y' => ("%Y", r"\d{4}"),
                'y' => ("%y", r"\d{2}"),
                'm' => ("%m", r"\d{2}"),
                'n' => ("%m", r"\d{1,2}"),
                'd' => ("%d", r"\d{2}"),
                'j' => ("%d", r"\d{1,2}"),
                'H' => ("%H", r"\d{2}"),
                'G' => ("%H", r"\d{1,2}"),
                'i' => ("%M", r"\d{2}"),
                's' => ("%S", r"\d{2}"),
                'U' => ("%s", r"\d+"),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        format.push_literal(escaped);
                    }
                    continue;
                }
                c if c.is_ascii_alphanumeric() => {
                    return Err(PatternError::UnsupportedFormat(c.to_string()))
                }
                c => {
                    format.push_literal(c);
                    continue;
                }
            };
            format.mark(directive_fmt);
            format.chrono.push_str(directive_fmt);
            format.regex.push_str(re);
        }
        Ok(format)
    }

    /// strftime directives, e.g. `%Y%m%d`.
    fn from_strftime(token: &str) -> Result<Self, PatternError> {
        let mut format = Self::empty();
        let mut chars = token.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                format.push_literal(c);
                continue;
            }
            let directive = chars
                .next()
                .ok_or_else(|| PatternError::UnsupportedFormat("%".to_string()))?;
            let re = match directive {
                'Y' => r"\d{4}",
                'y' | 'm' | 'd' | 'H' | 'M' | 'S' => r"\d{2}",
                'e' => r"[ \d]\d",
                'j' => r"\d{3}",
                's' => r"\d+",
                '%' => {
                    format.push_literal('%');
                    continue;
                }
                other => return Err(PatternError::UnsupportedFormat(format!("%{}", other))),
            };
            let directive_fmt = format!("%{}", directive);
            format.mark(&directive_fmt);
            format.chrono.push_str(&directive_fmt);
            format.regex.push_str(re);
        }
        Ok(format)
    }

    fn mark(&mut self, directive_fmt: &str) {
        match directive_fmt {
            "%m" => self.has_month = true,
            "%d" | "%e" => self.has_day = true,
            "%j" => {
                self.has_month = true;
                self.has_day = true;
            }
            "%H" | "%M" | "%S" => self.has_time = true,
            "%s" => {
                self.has_month = true;
                self.has_day = true;
                self.has_time = true;
            }
            _ => {}
        }
    }

    /// Parse a captured value. Missing month or day default to 1, a missing
    /// time of day to midnight. All times are UTC.
    fn parse_value(&self, value: &str) -> Option<DateTime<Utc>> {
        let mut value = value.to_string();
        let mut format = self.chrono.clone();
        if !self.has_month {
            value.push_str("|01");
            format.push_str("|%m");
        }
        if !self.has_day {
            value.push_str("|01");
            format.push_str("|%d");
        }

        let naive = if self.has_time {
            NaiveDateTime::parse_from_str(&value, &format).ok()?
        } else {
            NaiveDate::parse_from_str(&value, &format)
                .ok()?
                .and_hms_opt(0, 0, 0)?
        };
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// Translate a glob fragment into an equivalent regex fragment.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::new();
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('!')) {
                    chars.next();
                    out.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if matches!(inner, '\\' | '[' | '^' | '&' | '~') {
                        out.push('\\');
                    }
                    out.push(inner);
                }
                out.push(']');
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

#[derive(Debug, Clone)]
struct TimeToken {
    format: TimeFormat,
    capture: Regex,
}

/// Resolves a pattern against one directory.
///
/// The matcher holds no listing; every call to [`PathMatcher::matches`]
/// reads the directory afresh.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    dir: PathBuf,
    glob: Pattern,
    token: Option<TimeToken>,
}

impl PathMatcher {
    /// Build a matcher for `pattern`, resolving a relative directory part
    /// against `base_dir`.
    pub fn new(pattern: &str, base_dir: &Path) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let (dir, name) = match pattern.rfind('/') {
            Some(0) => (PathBuf::from("/"), &pattern[1..]),
            Some(idx) => {
                let dir_part = Path::new(&pattern[..idx]);
                let dir = if dir_part.is_absolute() {
                    dir_part.to_path_buf()
                } else {
                    base_dir.join(dir_part)
                };
                (dir, &pattern[idx + 1..])
            }
            None => (base_dir.to_path_buf(), pattern),
        };
        if name.is_empty() {
            return Err(PatternError::MissingFileName(pattern.to_string()));
        }

        let (glob_source, token) = match name.find('{') {
            None => {
                if name.contains('}') {
                    return Err(PatternError::UnterminatedToken(pattern.to_string()));
                }
                (name.to_string(), None)
            }
            Some(open) => {
                let close = name[open..]
                    .find('}')
                    .map(|offset| open + offset)
                    .ok_or_else(|| PatternError::UnterminatedToken(pattern.to_string()))?;
                let prefix = &name[..open];
                let token = &name[open + 1..close];
                let suffix = &name[close + 1..];

                if token.is_empty() {
                    return Err(PatternError::EmptyToken(pattern.to_string()));
                }
                if token.contains('{') || suffix.contains('{') || suffix.contains('}') {
                    return Err(PatternError::MultipleTokens(pattern.to_string()));
                }

                let format = TimeFormat::parse(token)?;
                let source = format!(
                    "^{}(?P<time>{}){}$",
                    glob_to_regex(prefix),
                    format.regex,
                    glob_to_regex(suffix)
                );
                let capture = Regex::new(&source)
                    .map_err(|_| PatternError::InvalidGlob(pattern.to_string()))?;

                (format!("{}*{}", prefix, suffix), Some(TimeToken { format, capture }))
            }
        };

        let glob = Pattern::new(&glob_source)
            .map_err(|_| PatternError::InvalidGlob(pattern.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            dir,
            glob,
            token,
        })
    }

    /// The pattern as given.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Directory the pattern is matched in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the pattern carries a time token.
    pub fn has_time_token(&self) -> bool {
        self.token.is_some()
    }

    /// Match a bare file name.
    ///
    /// Returns `None` if the name does not match, `Some(None)` if it matches a
    /// pattern without a time token, and `Some(Some(t))` with the parsed time
    /// otherwise. Names whose token does not parse as a date do not match.
    pub fn match_name(&self, name: &str) -> Option<Option<DateTime<Utc>>> {
        if !self.glob.matches(name) {
            return None;
        }
        match &self.token {
            None => Some(None),
            Some(token) => {
                let captures = token.capture.captures(name)?;
                let parsed = token.format.parse_value(captures.name("time")?.as_str())?;
                Some(Some(parsed))
            }
        }
    }

    /// Lazily match the entries of the directory.
    pub fn matches<'a, F: Filesystem>(&'a self, fs: &'a F) -> Result<Matches<'a, F>, FsError> {
        let listing = fs.list_dir(&self.dir)?;
        Ok(Matches {
            fs,
            matcher: self,
            listing: listing.into_iter(),
        })
    }
}

/// Iterator over the entries of one directory listing that match a pattern.
///
/// Metadata is read as each entry is produced. Entries that vanish between
/// listing and stat are skipped.
pub struct Matches<'a, F: Filesystem> {
    fs: &'a F,
    matcher: &'a PathMatcher,
    listing: std::vec::IntoIter<PathBuf>,
}

impl<F: Filesystem> Iterator for Matches<'_, F> {
    type Item = Result<MatchedEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.listing.by_ref() {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(filename_time) = self.matcher.match_name(name) else {
                continue;
            };
            match self.fs.metadata(&path) {
                Ok(Some(metadata)) => {
                    return Some(Ok(MatchedEntry {
                        path,
                        metadata,
                        filename_time,
                    }))
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
