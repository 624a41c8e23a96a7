//! Locale-tolerant timestamp resolution.
//!
//! Chat exports write dates the way the exporting phone was configured:
//! `1/2/24, 10:00:00 AM`, `02.01.24, 10:00`, `2024-01-02, 7:07 p.m.`,
//! `Tuesday, January 2, 2024 at 10:00`. [`parse_timestamp`] accepts all of
//! these, guided by a [`DateOrder`] for the ambiguous numeric forms.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{ChatlensError, Result};

/// Field order of a numeric date such as `01/02/24`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `M/D/Y`, as in US exports
    MonthFirst,
    /// `D/M/Y`, as in most European exports
    DayFirst,
    /// `Y-M-D`, ISO style
    YearFirst,
    /// Decide from the document
    #[default]
    Auto,
}

impl DateOrder {
    /// Infers the order from every timestamp of a document.
    ///
    /// A single first field above 12 makes the whole document day-first;
    /// otherwise month-first is assumed. A four-digit first field means ISO
    /// order.
    ///
    /// ```
    /// use chatlens::parsing::DateOrder;
    ///
    /// let order = DateOrder::infer_from(["03/01/24, 10:00", "13/01/24, 09:00"]);
    /// assert_eq!(order, DateOrder::DayFirst);
    /// ```
    pub fn infer_from<'a>(stamps: impl IntoIterator<Item = &'a str>) -> DateOrder {
        let mut day_first = false;
        for stamp in stamps {
            let Some(caps) = LEADING_TRIPLE.captures(stamp) else {
                continue;
            };
            if caps[1].len() == 4 {
                return DateOrder::YearFirst;
            }
            if caps[1].parse::<u32>().is_ok_and(|a| a > 12) {
                day_first = true;
            }
        }
        if day_first {
            DateOrder::DayFirst
        } else {
            DateOrder::MonthFirst
        }
    }

    /// Replaces `Auto` with the order inferred from `stamps`.
    pub fn resolve<'a>(self, stamps: impl IntoIterator<Item = &'a str>) -> DateOrder {
        match self {
            DateOrder::Auto => DateOrder::infer_from(stamps),
            fixed => fixed,
        }
    }
}

const TIME: &str = r"(?<h>\d{1,2})[:.](?<mi>\d{2})(?:[:.](?<s>\d{2}))?(?:\.\d+)?\s*(?<mer>[AaPp][Mm])?";

static LEADING_TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*?(\d{1,4})[./-](\d{1,2})[./-](\d{1,4})").unwrap());

static MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([ap])\.\s?m\.?").unwrap());

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?<a>\d{{1,4}})[./-](?<b>\d{{1,2}})[./-](?<c>\d{{1,4}})\.?(?:(?:,\s*|\s+|T)(?:at\s+)?{TIME})?\s*(?:Z|UTC)?$"
    ))
    .unwrap()
});

static MONTH_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:[a-z]+,?\s+)?(?<mon>[a-z]{{3,9}})\.?\s+(?<d>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?<y>\d{{4}})(?:,?\s+(?:at\s+)?{TIME})?$"
    ))
    .unwrap()
});

static DAY_FIRST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:[a-z]+,?\s+)?(?<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?<mon>[a-z]{{3,9}})\.?,?\s+(?<y>\d{{4}})(?:,?\s+(?:at\s+)?{TIME})?$"
    ))
    .unwrap()
});

/// Normalizes export noise: brackets, invisible marks, Unicode spaces and
/// dotted meridiems.
pub fn normalize_timestamp(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '\u{200E}' | '\u{200F}' | '\u{FEFF}'))
        .map(|c| match c {
            '\u{202F}' | '\u{00A0}' | '\u{2009}' | '\u{2007}' => ' ',
            other => other,
        })
        .collect();

    let trimmed = cleaned
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();

    MERIDIEM
        .replace_all(trimmed, |caps: &Captures<'_>| format!("{}M", caps[1].to_uppercase()))
        .into_owned()
}

/// Resolves a textual timestamp to an absolute time.
///
/// Accepted shapes:
/// - RFC 3339 (`2024-01-02T10:00:00+02:00`)
/// - numeric dates with `/`, `.` or `-` separators and 2- or 4-digit years,
///   optionally followed by `H:MM[:SS]` and `AM`/`PM`
/// - month names (`Jan 2, 2024`, `2 January 2024, 10:00`)
///
/// Two-digit years are read as 20xx. A date without a time is midnight.
///
/// ```
/// use chatlens::parsing::{DateOrder, parse_timestamp};
///
/// let ts = parse_timestamp("[1/2/24, 10:00:05\u{202F}PM]", DateOrder::MonthFirst).unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-01-02T22:00:05+00:00");
/// ```
pub fn parse_timestamp(input: &str, order: DateOrder) -> Result<DateTime<Utc>> {
    let normalized = normalize_timestamp(input);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    let parsed = if let Some(caps) = NUMERIC.captures(&normalized) {
        numeric_date(&caps, order).and_then(|date| with_time(date, &caps))
    } else if let Some(caps) = MONTH_NAME_FIRST
        .captures(&normalized)
        .or_else(|| DAY_FIRST_NAME.captures(&normalized))
    {
        named_date(&caps).and_then(|date| with_time(date, &caps))
    } else {
        None
    };

    parsed
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ChatlensError::timestamp(input))
}

fn numeric_date(caps: &Captures<'_>, order: DateOrder) -> Option<NaiveDate> {
    let a_text = &caps["a"];
    let a: u32 = a_text.parse().ok()?;
    let b: u32 = caps["b"].parse().ok()?;
    let c_text = &caps["c"];
    let c: u32 = c_text.parse().ok()?;

    if a_text.len() == 4 {
        return NaiveDate::from_ymd_opt(a as i32, b, c);
    }

    let year = expand_year(c, c_text.len());
    let effective = match order {
        DateOrder::Auto if a > 12 => DateOrder::DayFirst,
        DateOrder::Auto => DateOrder::MonthFirst,
        other => other,
    };

    match effective {
        DateOrder::YearFirst => NaiveDate::from_ymd_opt(expand_year(a, a_text.len()), b, c),
        DateOrder::DayFirst => NaiveDate::from_ymd_opt(year, b, a)
            .or_else(|| NaiveDate::from_ymd_opt(year, a, b)),
        DateOrder::MonthFirst | DateOrder::Auto => NaiveDate::from_ymd_opt(year, a, b)
            .or_else(|| NaiveDate::from_ymd_opt(year, b, a)),
    }
}

fn named_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = month_from_name(&caps["mon"])?;
    let day: u32 = caps["d"].parse().ok()?;
    let year: i32 = caps["y"].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn with_time(date: NaiveDate, caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let Some(hour) = caps.name("h") else {
        return Some(date.and_time(NaiveTime::MIN));
    };
    let mut hour: u32 = hour.as_str().parse().ok()?;
    let minute: u32 = caps["mi"].parse().ok()?;
    let second: u32 = match caps.name("s") {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };

    if let Some(mer) = caps.name("mer") {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = mer.as_str().eq_ignore_ascii_case("pm");
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }

    date.and_hms_opt(hour, minute, second)
}

fn expand_year(value: u32, digits: usize) -> i32 {
    if digits <= 2 {
        2000 + value as i32
    } else {
        value as i32
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}
