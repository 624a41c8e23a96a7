//! Whole-conversation counters.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::participants;
use super::words::tokenize;
use crate::message::ChatMessage;

static DURATION_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(hr|hour|min|sec)").unwrap());

/// Per-speaker totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Speaker
    pub user: String,
    /// Number of messages
    pub messages: usize,
    /// Whitespace-separated words
    pub words: usize,
    /// Distinct lower-cased word tokens
    pub unique_words: usize,
}

/// Counters over a whole conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetrics {
    /// Most frequent message text, lower-cased and trimmed
    pub most_common_message: Option<String>,
    /// How often it occurs
    pub most_common_count: usize,
    /// Sum of video call durations in seconds
    pub video_call_seconds: u64,
    /// Messages mentioning a missed call
    pub missed_calls: usize,
    /// Totals per speaker, in order of first appearance
    pub users: Vec<UserStats>,
}

impl ChatMetrics {
    /// Computes every counter in one pass per concern.
    ///
    /// Empty messages never count as the most common one; among equally
    /// frequent texts the first to appear wins.
    pub fn compute(messages: &[ChatMessage]) -> Self {
        let mut texts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut video_call_seconds: u64 = 0;
        let mut missed_calls = 0;

        for (position, msg) in messages.iter().enumerate() {
            let normalized = msg.message.trim().to_lowercase();
            if normalized.contains("missed") {
                missed_calls += 1;
            }
            if normalized.contains("video call") && normalized.contains("min") {
                let seconds = parse_call_duration(&normalized).unwrap_or(0);
                video_call_seconds = video_call_seconds.saturating_add(seconds);
            }
            if !normalized.is_empty() {
                texts.entry(normalized).or_insert((0, position)).0 += 1;
            }
        }

        let most_common = texts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            });

        let users = participants(messages)
            .into_iter()
            .map(|user| {
                let mut stats = UserStats {
                    user: user.to_string(),
                    messages: 0,
                    words: 0,
                    unique_words: 0,
                };
                let mut vocabulary: BTreeSet<String> = BTreeSet::new();
                for msg in messages.iter().filter(|m| m.user == user) {
                    stats.messages += 1;
                    stats.words += msg.word_count();
                    vocabulary.extend(tokenize(&msg.message, false));
                }
                stats.unique_words = vocabulary.len();
                stats
            })
            .collect();

        let (most_common_message, most_common_count) = match most_common {
            Some((text, (count, _))) => (Some(text), count),
            None => (None, 0),
        };

        Self {
            most_common_message,
            most_common_count,
            video_call_seconds,
            missed_calls,
            users,
        }
    }

    /// Total video call time as `HH:MM:SS`.
    ///
    /// ```
    /// use chatlens::analytics::ChatMetrics;
    ///
    /// let metrics = ChatMetrics { video_call_seconds: 3725, ..Default::default() };
    /// assert_eq!(metrics.video_call_time(), "01:02:05");
    /// ```
    pub fn video_call_time(&self) -> String {
        let s = self.video_call_seconds;
        format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }

    /// Stats of one speaker.
    pub fn user(&self, name: &str) -> Option<&UserStats> {
        self.users.iter().find(|u| u.user == name)
    }
}

/// Reads a duration like `1 hr 5 min 12 sec` from call notices.
///
/// Returns `None` if no `N unit` pair is present. A part whose seconds do
/// not fit in a `u64` is skipped, and the sum saturates.
///
/// ```
/// use chatlens::analytics::parse_call_duration;
///
/// assert_eq!(parse_call_duration("Video call, 1 hr 2 min"), Some(3720));
/// assert_eq!(parse_call_duration("Video call 45 sec"), Some(45));
/// assert_eq!(parse_call_duration("Missed video call"), None);
/// ```
pub fn parse_call_duration(text: &str) -> Option<u64> {
    let mut total = None;
    for caps in DURATION_PART.captures_iter(text) {
        let Ok(value) = caps[1].parse::<u64>() else {
            continue;
        };
        let unit = caps[2].to_lowercase();
        let factor = match unit.as_str() {
            "hr" | "hour" => 3600,
            "min" => 60,
            _ => 1,
        };
        let Some(seconds) = value.checked_mul(factor) else {
            continue;
        };
        let sum: &mut u64 = total.get_or_insert(0);
        *sum = sum.saturating_add(seconds);
    }
    total
}
