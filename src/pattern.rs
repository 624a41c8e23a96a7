//! Validated line grammars.
//!
//! A [`Pattern`] is a regular expression describing one message header line
//! with three named groups: `timestamp`, `user` and `message`. Built-in and
//! inferred grammars go through the same validation, so nothing downstream
//! ever runs a pattern that lacks one of the groups.

use regex::Regex;
use serde::Serialize;

use crate::error::{ChatlensError, Result};
use crate::parsing::DateOrder;

/// Named groups every pattern must define.
pub const REQUIRED_GROUPS: [&str; 3] = ["timestamp", "user", "message"];

/// A compiled and validated header grammar.
///
/// # Example
///
/// ```rust
/// use chatlens::parsing::DateOrder;
/// use chatlens::pattern::Pattern;
///
/// let pattern = Pattern::new(
///     "irc",
///     r"^(?<timestamp>\d{2}:\d{2}) <(?<user>[^>]+)> (?<message>.*)$",
///     DateOrder::Auto,
/// )?;
///
/// let header = pattern.match_header("12:00 <alice> hi").unwrap();
/// assert_eq!(header.user, "alice");
/// assert!(Pattern::new("broken", r"^(?<user>\w+): (.*)$", DateOrder::Auto).is_err());
/// # Ok::<(), chatlens::ChatlensError>(())
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    name: String,
    #[serde(rename = "pattern")]
    source: String,
    date_order: DateOrder,
    #[serde(skip)]
    regex: Regex,
}

/// The three fields of a matched header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch<'t> {
    /// Raw timestamp text
    pub timestamp: &'t str,
    /// Speaker, trimmed
    pub user: &'t str,
    /// Text following the header on the same line
    pub message: &'t str,
}

impl Pattern {
    /// Compiles and validates a caller-supplied pattern.
    pub fn new(name: impl Into<String>, source: &str, date_order: DateOrder) -> Result<Self> {
        let regex =
            compile(source).map_err(|reason| ChatlensError::invalid_pattern(source, reason))?;
        Ok(Self {
            name: name.into(),
            source: source.to_string(),
            date_order,
            regex,
        })
    }

    /// Validates a pattern returned by the labeling service.
    ///
    /// JavaScript literal delimiters (`/.../gm`) are removed first; both
    /// `(?<name>...)` and `(?P<name>...)` group syntaxes are accepted.
    pub fn inferred(source: &str) -> Result<Self> {
        let body = strip_delimiters(source);
        let regex =
            compile(body).map_err(|reason| ChatlensError::invalid_inferred(source, reason))?;
        Ok(Self {
            name: "inferred".to_string(),
            source: body.to_string(),
            date_order: DateOrder::Auto,
            regex,
        })
    }

    /// Grammar name, `inferred` for service-supplied patterns.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regular expression source.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Date field order hint for this grammar.
    pub fn date_order(&self) -> DateOrder {
        self.date_order
    }

    /// The compiled expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Matches one line against the grammar.
    ///
    /// Returns `None` when the line is not a header, including when the
    /// `timestamp` or `user` group did not participate or `user` is blank.
    pub fn match_header<'t>(&self, line: &'t str) -> Option<HeaderMatch<'t>> {
        let caps = self.regex.captures(line)?;
        let timestamp = caps.name("timestamp")?.as_str().trim();
        let user = caps.name("user")?.as_str().trim();
        if timestamp.is_empty() || user.is_empty() {
            return None;
        }
        let message = caps.name("message").map_or("", |m| m.as_str());
        Some(HeaderMatch {
            timestamp,
            user,
            message,
        })
    }

    /// Returns true if the line is a header line.
    pub fn is_header(&self, line: &str) -> bool {
        self.match_header(line).is_some()
    }

    /// Returns true if at least one line of `text` is a header.
    pub fn matches_any_line(&self, text: &str) -> bool {
        text.lines().any(|line| self.is_header(line))
    }

    /// Counts header lines in `text`.
    pub fn header_count(&self, text: &str) -> usize {
        text.lines().filter(|line| self.is_header(line)).count()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source && self.date_order == other.date_order
    }
}

fn compile(source: &str) -> std::result::Result<Regex, String> {
    if source.trim().is_empty() {
        return Err("pattern is empty".to_string());
    }
    let regex = Regex::new(source).map_err(|e| e.to_string())?;

    let names: Vec<&str> = regex.capture_names().flatten().collect();
    let missing: Vec<&str> = REQUIRED_GROUPS
        .iter()
        .copied()
        .filter(|group| !names.contains(group))
        .collect();

    if missing.is_empty() {
        Ok(regex)
    } else {
        Err(format!("missing named group(s): {}", missing.join(", ")))
    }
}

fn strip_delimiters(source: &str) -> &str {
    let trimmed = source.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| "dgimsuy".contains(c)) {
                return &rest[..end];
            }
        }
    }
    trimmed
}
