//! Grammar inference for unrecognized exports.
//!
//! When no built-in grammar matches, a prefix of the document is sent to the
//! labeling service, which answers with the two participant names and a
//! header regex. The regex is only used after it passes [`Pattern`]
//! validation and matches at least one line of the sample.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::fanout::call_service;
use super::{LabelCache, LabelRequest, LabelTask, LabelingService, ResponseSchema};
use crate::config::InferenceConfig;
use crate::error::{ChatlensError, Result, ServiceError};
use crate::pattern::Pattern;

/// A grammar supplied by the labeling service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredGrammar {
    /// First participant named by the service
    pub speaker_a: String,
    /// Second participant named by the service
    pub speaker_b: String,
    /// The validated header grammar
    pub pattern: Pattern,
}

#[derive(Deserialize)]
struct GrammarAnswer {
    user1: String,
    user2: String,
    regex_pattern: String,
}

/// Schema of a grammar answer: `{ user1, user2, regex_pattern }`.
pub fn grammar_schema() -> ResponseSchema {
    ResponseSchema::new("chat_grammar")
        .string("user1")
        .string("user2")
        .non_empty_string("regex_pattern")
}

/// Returns the first `max_chars` characters of `text`.
///
/// ```
/// use chatlens::inference::sample_prefix;
///
/// assert_eq!(sample_prefix("héllo", 2), "hé");
/// assert_eq!(sample_prefix("hi", 10), "hi");
/// ```
pub fn sample_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn grammar_prompt(sample: &str) -> String {
    format!(
        "The text below is the beginning of an exported chat between two people.\n\
         Identify the two participants and write one regular expression that matches a \
         single message header line. The expression must define the named groups \
         `timestamp`, `user` and `message` using (?<name>...) syntax and must not use \
         look-around.\n\
         Answer with a JSON object: {{\"user1\": string, \"user2\": string, \"regex_pattern\": string}}.\n\n\
         {sample}"
    )
}

/// Asks the labeling service for a grammar describing `sample`.
///
/// # Errors
///
/// - [`ChatlensError::NoPatternMatched`] if the call fails or the answer does
///   not fit the grammar schema
/// - [`ChatlensError::InvalidInferredPattern`] if the returned regex fails
///   validation or matches no line of the sample
pub async fn infer_pattern(
    service: &dyn LabelingService,
    cache: &dyn LabelCache,
    sample: &str,
    config: &InferenceConfig,
) -> Result<InferredGrammar> {
    let schema = grammar_schema();
    let request = LabelRequest::structured(LabelTask::Grammar, grammar_prompt(sample), schema.clone());

    let answer: GrammarAnswer = call_service(service, cache, &request, config)
        .await
        .and_then(|response| response.into_json())
        .and_then(|value| schema.decode(value))
        .map_err(|err: ServiceError| {
            warn!(service = service.name(), error = %err, "grammar inference failed");
            ChatlensError::no_pattern(err)
        })?;

    let pattern = Pattern::inferred(&answer.regex_pattern)?;
    if !pattern.matches_any_line(sample) {
        return Err(ChatlensError::invalid_inferred(
            answer.regex_pattern,
            "matches no line of the sample",
        ));
    }

    info!(
        service = service.name(),
        pattern = pattern.as_str(),
        "using inferred grammar"
    );

    Ok(InferredGrammar {
        speaker_a: answer.user1.trim().to_string(),
        speaker_b: answer.user2.trim().to_string(),
        pattern,
    })
}
