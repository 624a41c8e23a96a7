//! Period buckets for engagement and sentiment trends.
//!
//! Messages are grouped by calendar week (ISO, starting Monday) or month.
//! Any number of speakers is tracked.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::participants;
use crate::message::ChatMessage;

/// Bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    /// Calendar week keyed by its Monday, `YYYY-MM-DD`
    Week,
    /// Calendar month, `YYYY-MM`
    Month,
}

impl PeriodUnit {
    /// Canonical key of the period containing `ts`.
    ///
    /// ```
    /// use chatlens::analytics::PeriodUnit;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 23, 0, 0).unwrap();
    /// assert_eq!(PeriodUnit::Week.key(sunday), "2024-01-01");
    /// assert_eq!(PeriodUnit::Month.key(sunday), "2024-01");
    /// ```
    pub fn key(self, ts: DateTime<Utc>) -> String {
        match self {
            PeriodUnit::Week => ts
                .date_naive()
                .week(Weekday::Mon)
                .first_day()
                .format("%Y-%m-%d")
                .to_string(),
            PeriodUnit::Month => ts.format("%Y-%m").to_string(),
        }
    }
}

/// What is measured per user and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measure {
    /// Sum of whitespace-separated tokens
    WordCount,
    /// Number of messages
    MessageCount,
    /// Mean of attached sentiment scores
    Sentiment {
        /// Scored messages a bucket needs to be emitted
        min_samples: usize,
    },
}

const PERIOD_KEY_FIELD: &str = "periodKey";

/// One period and its per-user values.
///
/// Serializes flat as `{ "periodKey": key, <user>: value, .. }`. The key
/// field always comes first; a speaker literally named `periodKey` would
/// shadow it, so that speaker is left out of the serialized object and
/// stays readable through [`values`](Self::values).
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    /// Period key, see [`PeriodUnit::key`]
    pub period_key: String,
    /// Value per user
    pub values: BTreeMap<String, f64>,
}

impl Serialize for PeriodBucket {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(PERIOD_KEY_FIELD, &self.period_key)?;
        for (user, value) in &self.values {
            if user == PERIOD_KEY_FIELD {
                warn!(period = %self.period_key, "speaker name collides with the period key field");
                continue;
            }
            map.serialize_entry(user, value)?;
        }
        map.end()
    }
}

impl PeriodBucket {
    /// Value for `user`, if present in this bucket.
    pub fn get(&self, user: &str) -> Option<f64> {
        self.values.get(user).copied()
    }
}

/// Buckets in ascending key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSeries {
    /// Bucket width
    pub unit: PeriodUnit,
    /// What the values measure
    pub measure: Measure,
    /// Speakers in order of first appearance
    pub users: Vec<String>,
    /// Non-empty periods, oldest first
    pub buckets: Vec<PeriodBucket>,
}

impl PeriodSeries {
    /// Returns the bucket for `key`.
    pub fn bucket(&self, key: &str) -> Option<&PeriodBucket> {
        self.buckets.iter().find(|b| b.period_key == key)
    }

    /// Returns true if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[derive(Default)]
struct Tally {
    sum: f64,
    samples: usize,
}

/// Groups messages into periods and measures each user per period.
///
/// Count measures give every known user a value in every emitted bucket,
/// zero when they were silent. Sentiment only averages messages that carry
/// a score, emits a bucket once it holds `min_samples` scored messages, and
/// leaves out users with no scored message in that bucket.
pub fn aggregate_by_period(messages: &[ChatMessage], unit: PeriodUnit, measure: Measure) -> PeriodSeries {
    let users: Vec<String> = participants(messages).into_iter().map(String::from).collect();
    let mut periods: BTreeMap<String, HashMap<&str, Tally>> = BTreeMap::new();

    for msg in messages {
        let sample = match measure {
            Measure::WordCount => Some(msg.word_count() as f64),
            Measure::MessageCount => Some(1.0),
            Measure::Sentiment { .. } => msg.sentiment_score,
        };
        let Some(value) = sample else {
            continue;
        };
        let tally = periods
            .entry(unit.key(msg.timestamp))
            .or_default()
            .entry(msg.user.as_str())
            .or_default();
        tally.sum += value;
        tally.samples += 1;
    }

    let buckets = periods
        .into_iter()
        .filter_map(|(period_key, tallies)| {
            let values: BTreeMap<String, f64> = match measure {
                Measure::WordCount | Measure::MessageCount => users
                    .iter()
                    .map(|user| {
                        let total = tallies.get(user.as_str()).map_or(0.0, |t| t.sum);
                        (user.clone(), total)
                    })
                    .collect(),
                Measure::Sentiment { min_samples } => {
                    let scored: usize = tallies.values().map(|t| t.samples).sum();
                    if scored < min_samples {
                        return None;
                    }
                    tallies
                        .iter()
                        .map(|(user, t)| ((*user).to_string(), t.sum / t.samples as f64))
                        .collect()
                }
            };
            Some(PeriodBucket { period_key, values })
        })
        .collect();

    PeriodSeries {
        unit,
        measure,
        users,
        buckets,
    }
}
