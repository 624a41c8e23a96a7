//! Personality-type voting over conversation chunks.
//!
//! The conversation is cut into chunks in which every speaker has a few
//! messages. Each chunk is labeled independently; the four-letter types the
//! service answers with are tallied letter by letter, and each axis is
//! checked with an exact two-sided binomial test so that a near tie is
//! reported as undecided instead of as a confident letter.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, InferenceConfig};
use crate::inference::{
    ChunkFailure, LabelCache, LabelRequest, LabelTask, LabelingService, fan_out,
    parse_labeled_lines,
};
use crate::message::ChatMessage;

static TYPE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[EI][NS][TF][JP]\b").unwrap());

/// The four axes, first letter wins only on a strict majority.
const AXES: [(char, char); 4] = [('E', 'I'), ('N', 'S'), ('T', 'F'), ('J', 'P')];

// ============================================================================
// Result types
// ============================================================================

/// Vote split on one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSplit {
    /// First letter of the axis, e.g. `E`
    pub first: char,
    /// Second letter of the axis, e.g. `I`
    pub second: char,
    /// Votes for `first`
    pub first_count: usize,
    /// Votes for `second`
    pub second_count: usize,
    /// Two-sided exact binomial p-value against an even split
    pub p_value: f64,
    /// `p_value < alpha`
    pub significant: bool,
}

impl AxisSplit {
    /// The letter that won the vote.
    pub fn winner(&self) -> char {
        if self.first_count > self.second_count {
            self.first
        } else {
            self.second
        }
    }

    /// `"E/I"` style label.
    pub fn label(&self) -> String {
        format!("{}/{}", self.first, self.second)
    }
}

/// Aggregated prediction for one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityProfile {
    /// Participant name as answered by the service
    pub participant: String,
    /// Majority type, e.g. `INTJ`
    pub predicted_type: String,
    /// Every per-chunk answer, in chunk order
    pub votes: Vec<String>,
    /// Per-axis tallies
    pub axes: Vec<AxisSplit>,
}

impl PersonalityProfile {
    /// Axes whose split is not significant.
    pub fn undecided_axes(&self) -> Vec<String> {
        self.axes
            .iter()
            .filter(|axis| !axis.significant)
            .map(AxisSplit::label)
            .collect()
    }
}

/// Outcome of a personality run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityReport {
    /// One profile per participant, in order of first mention
    pub profiles: Vec<PersonalityProfile>,
    /// Number of chunks sent
    pub chunks: usize,
    /// Chunks whose request failed and were skipped
    pub failed_chunks: usize,
    /// The failed requests
    pub failures: Vec<ChunkFailure>,
}

impl PersonalityReport {
    /// Profile of `participant`.
    pub fn profile(&self, participant: &str) -> Option<&PersonalityProfile> {
        self.profiles.iter().find(|p| p.participant == participant)
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Splits `messages` into consecutive index ranges.
///
/// The base chunk size is `max(ceil(len / target_chunks), 2 * min_per_participant)`.
/// A chunk is then extended one message at a time, by at most one base size,
/// until every speaker present in it has `min_per_participant` messages.
/// The ranges cover the whole slice without overlap.
///
/// ```
/// use chatlens::analytics::adaptive_chunks;
/// use chatlens::ChatMessage;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let messages: Vec<ChatMessage> = (0..10)
///     .map(|i| ChatMessage::new(if i % 2 == 0 { "A" } else { "B" }, "x", now))
///     .collect();
/// assert_eq!(adaptive_chunks(&messages, 5, 1), vec![0..2, 2..4, 4..6, 6..8, 8..10]);
/// ```
pub fn adaptive_chunks(
    messages: &[ChatMessage],
    target_chunks: usize,
    min_per_participant: usize,
) -> Vec<Range<usize>> {
    let total = messages.len();
    let size = total
        .div_ceil(target_chunks.max(1))
        .max(min_per_participant.saturating_mul(2))
        .max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let mut end = start.saturating_add(size).min(total);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for msg in &messages[start..end] {
            *counts.entry(msg.user.as_str()).or_insert(0) += 1;
        }

        let limit = end + size.min(total - end);
        while end < limit && counts.values().any(|&c| c < min_per_participant) {
            *counts.entry(messages[end].user.as_str()).or_insert(0) += 1;
            end += 1;
        }

        chunks.push(start..end);
        start = end;
    }

    debug!(messages = total, chunks = chunks.len(), size, "built personality chunks");
    chunks
}

// ============================================================================
// Statistics
// ============================================================================

/// Two-sided exact binomial test of `k` successes in `n` trials at p = 0.5.
///
/// Returns 1.0 when `n` is zero. A `k` above `n` is read as `n`.
///
/// ```
/// use chatlens::analytics::binomial_two_sided_p;
///
/// assert!((binomial_two_sided_p(3, 3) - 0.25).abs() < 1e-12);
/// assert!((binomial_two_sided_p(1, 2) - 1.0).abs() < 1e-12);
/// ```
pub fn binomial_two_sided_p(k: usize, n: usize) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let k = k.min(n);
    let tail = k.min(n - k);
    let ln_half_pow = n as f64 * std::f64::consts::LN_2;

    // ln C(n, i), built up incrementally
    let mut ln_choose = 0.0_f64;
    let mut cumulative = 0.0_f64;
    for i in 0..=tail {
        if i > 0 {
            ln_choose += ((n - i + 1) as f64).ln() - (i as f64).ln();
        }
        cumulative += (ln_choose - ln_half_pow).exp();
    }
    (2.0 * cumulative).min(1.0)
}

fn split_axes(votes: &[String], alpha: f64) -> Vec<AxisSplit> {
    let mut letters: HashMap<char, usize> = HashMap::new();
    for vote in votes {
        for letter in vote.chars() {
            *letters.entry(letter).or_insert(0) += 1;
        }
    }

    AXES.iter()
        .map(|&(first, second)| {
            let first_count = letters.get(&first).copied().unwrap_or(0);
            let second_count = letters.get(&second).copied().unwrap_or(0);
            let n = first_count + second_count;
            let p_value = binomial_two_sided_p(first_count, n);
            AxisSplit {
                first,
                second,
                first_count,
                second_count,
                p_value,
                significant: n > 0 && p_value < alpha,
            }
        })
        .collect()
}

// ============================================================================
// Service round
// ============================================================================

fn chunk_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::from(
        "Analyze the following conversation excerpt and predict the MBTI personality type \
         of each participant.\n\n",
    );
    for msg in messages {
        prompt.push_str(&msg.user);
        prompt.push_str(": ");
        prompt.push_str(&msg.message.replace('\n', " "));
        prompt.push('\n');
    }
    prompt.push_str(
        "\nAnswer with one line per participant in the form `name: TYPE` and nothing else.",
    );
    prompt
}

/// Extracts `(participant, TYPE)` votes from a free-text answer.
///
/// Names matching a known speaker case-insensitively are mapped to that
/// speaker's spelling. Lines without a four-letter type are ignored.
fn parse_votes(answer: &str, speakers: &[&str]) -> Vec<(String, String)> {
    parse_labeled_lines(answer)
        .into_iter()
        .filter_map(|(name, value)| {
            let code = TYPE_CODE.find(&value.to_uppercase())?.as_str().to_string();
            let name = speakers
                .iter()
                .find(|s| s.to_lowercase() == name.to_lowercase())
                .map_or(name, |s| (*s).to_string());
            Some((name, code))
        })
        .collect()
}

/// Predicts a personality type per participant.
///
/// Failed chunks are skipped and counted; the prediction rests on the
/// chunks that succeeded. An empty conversation makes no service calls.
pub async fn infer_personalities(
    service: &dyn LabelingService,
    cache: &dyn LabelCache,
    messages: &[ChatMessage],
    analysis: &AnalysisConfig,
    inference: &InferenceConfig,
) -> PersonalityReport {
    let ranges = adaptive_chunks(
        messages,
        analysis.personality_chunks,
        analysis.min_messages_per_participant,
    );
    if ranges.is_empty() {
        return PersonalityReport::default();
    }

    let speakers = super::participants(messages);
    let requests: Vec<LabelRequest> = ranges
        .iter()
        .map(|range| LabelRequest::text(LabelTask::Personality, chunk_prompt(&messages[range.clone()])))
        .collect();

    let outcome = fan_out(service, cache, &requests, inference, |response| {
        Ok(parse_votes(&response.into_text(), &speakers))
    })
    .await;

    let mut order: Vec<String> = Vec::new();
    let mut votes: HashMap<String, Vec<String>> = HashMap::new();
    for (name, code) in outcome.results.into_iter().flatten().flatten() {
        if !votes.contains_key(&name) {
            order.push(name.clone());
        }
        votes.entry(name).or_default().push(code);
    }

    let profiles: Vec<PersonalityProfile> = order
        .into_iter()
        .map(|participant| {
            let participant_votes = votes.remove(&participant).unwrap_or_default();
            let axes = split_axes(&participant_votes, analysis.significance_alpha);
            let predicted_type = axes.iter().map(AxisSplit::winner).collect();
            PersonalityProfile {
                participant,
                predicted_type,
                votes: participant_votes,
                axes,
            }
        })
        .collect();

    let report = PersonalityReport {
        profiles,
        chunks: ranges.len(),
        failed_chunks: outcome.failures.len(),
        failures: outcome.failures,
    };
    info!(
        service = service.name(),
        chunks = report.chunks,
        failed = report.failed_chunks,
        participants = report.profiles.len(),
        "personality inference finished"
    );
    report
}
