//! Analytics over reconstructed messages.
//!
//! - [`words`] - per-participant word frequencies and exclusivity ranking
//! - [`temporal`] - weekly or monthly buckets per participant
//! - [`metrics`] - whole-conversation counters and per-user statistics
//! - [`sentiment`] - per-message scores from the labeling service
//! - [`personality`] - chunked personality-type voting with significance
//!
//! Every function here is pure over its input slice except the two
//! service-backed modules, which only add scores or votes.

pub mod metrics;
pub mod personality;
pub mod sentiment;
pub mod temporal;
pub mod words;

use crate::message::ChatMessage;

pub use metrics::{ChatMetrics, UserStats, parse_call_duration};
pub use personality::{
    AxisSplit, PersonalityProfile, PersonalityReport, adaptive_chunks, binomial_two_sided_p,
    infer_personalities,
};
pub use sentiment::{SentimentLabel, SentimentRun, score_sentiment};
pub use temporal::{Measure, PeriodBucket, PeriodSeries, PeriodUnit, aggregate_by_period};
pub use words::{WordComparison, WordEntry, analyze_words, tokenize};

/// Distinct speakers in order of first appearance.
///
/// ```
/// use chatlens::ChatMessage;
/// use chatlens::analytics::participants;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let messages = vec![
///     ChatMessage::new("Bob", "a", now),
///     ChatMessage::new("Alice", "b", now),
///     ChatMessage::new("Bob", "c", now),
/// ];
/// assert_eq!(participants(&messages), vec!["Bob", "Alice"]);
/// ```
pub fn participants(messages: &[ChatMessage]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for msg in messages {
        if !seen.contains(&msg.user.as_str()) {
            seen.push(&msg.user);
        }
    }
    seen
}
