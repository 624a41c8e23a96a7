//! Labeling-service plumbing.
//!
//! Grammar inference, sentiment scoring and personality guessing all send
//! text to an external classification service. This module defines that
//! seam and the machinery around it:
//!
//! - [`LabelingService`] - the async trait a host application implements
//! - [`schema`] - validation of structured answers before use
//! - [`cache`] - run-scoped memoization keyed by request signature
//! - [`fanout`] - ordered concurrent dispatch with per-chunk failure isolation
//! - [`grammar`] - inferring a header grammar from a document sample
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chatlens::error::ServiceError;
//! use chatlens::inference::{LabelRequest, LabelResponse, LabelingService};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl LabelingService for Canned {
//!     fn name(&self) -> &str {
//!         "canned"
//!     }
//!
//!     async fn label(&self, _request: &LabelRequest) -> Result<LabelResponse, ServiceError> {
//!         Ok(LabelResponse::Text("Alice: INTJ".into()))
//!     }
//! }
//! ```

pub mod cache;
pub mod fanout;
pub mod grammar;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

pub use cache::{LabelCache, MemoryLabelCache, NoCache, request_signature};
pub use fanout::{ChunkFailure, FanOut, fan_out};
pub use grammar::{InferredGrammar, infer_pattern, sample_prefix};
pub use schema::{FieldKind, FieldSpec, ResponseSchema};

/// What a request is for, so one service can route several tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelTask {
    /// Derive a header grammar from a document sample
    Grammar,
    /// Score the sentiment of one message
    Sentiment,
    /// Guess personality types from a conversation excerpt
    Personality,
    /// Anything else a caller wants labeled
    Custom(String),
}

impl LabelTask {
    /// Short stable label used in logs and cache keys.
    pub fn as_str(&self) -> &str {
        match self {
            LabelTask::Grammar => "grammar",
            LabelTask::Sentiment => "sentiment",
            LabelTask::Personality => "personality",
            LabelTask::Custom(name) => name,
        }
    }
}

/// A prompt for the labeling service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRequest {
    /// What the request is for
    pub task: LabelTask,
    /// Prompt text
    pub prompt: String,
    /// Expected shape of a structured answer, if one is wanted
    pub schema: Option<ResponseSchema>,
}

impl LabelRequest {
    /// Creates a free-text request.
    pub fn text(task: LabelTask, prompt: impl Into<String>) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            schema: None,
        }
    }

    /// Creates a request for a structured answer.
    pub fn structured(task: LabelTask, prompt: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            schema: Some(schema),
        }
    }
}

/// An answer from the labeling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum LabelResponse {
    /// Free text, usually `name: VALUE` lines
    Text(String),
    /// A JSON object, to be checked against the request schema
    Structured(Value),
}

impl LabelResponse {
    /// Returns the answer as JSON.
    ///
    /// Text answers are parsed as JSON; if that fails, the outermost `{...}`
    /// span is tried, which covers answers wrapped in prose or code fences.
    pub fn into_json(self) -> Result<Value, ServiceError> {
        match self {
            LabelResponse::Structured(value) => Ok(value),
            LabelResponse::Text(text) => {
                let trimmed = text.trim();
                if let Ok(value) = serde_json::from_str(trimmed) {
                    return Ok(value);
                }
                let start = trimmed.find('{');
                let end = trimmed.rfind('}');
                match (start, end) {
                    (Some(s), Some(e)) if s < e => serde_json::from_str(&trimmed[s..=e])
                        .map_err(|err| ServiceError::malformed(err.to_string())),
                    _ => Err(ServiceError::malformed("response contains no JSON object")),
                }
            }
        }
    }

    /// Returns the answer as text.
    pub fn into_text(self) -> String {
        match self {
            LabelResponse::Text(text) => text,
            LabelResponse::Structured(Value::String(text)) => text,
            LabelResponse::Structured(value) => value.to_string(),
        }
    }
}

/// A text-classification capability supplied by the host application.
///
/// Implementations typically wrap an LLM API. They should return
/// [`ServiceError`] rather than panic; the caller decides whether a failure
/// aborts a document or only loses one chunk.
#[async_trait]
pub trait LabelingService: Send + Sync {
    /// Returns the name of the service, for logs.
    fn name(&self) -> &str;

    /// Labels one request.
    async fn label(&self, request: &LabelRequest) -> Result<LabelResponse, ServiceError>;
}

/// Parses line-delimited `name: VALUE` answers.
///
/// List markers and markdown emphasis are ignored. Lines without a colon, or
/// with an empty name or value, are skipped.
///
/// ```
/// use chatlens::inference::parse_labeled_lines;
///
/// let pairs = parse_labeled_lines("- **Alice**: INTJ\nnoise\n2. Bob: ENFP");
/// assert_eq!(pairs, vec![
///     ("Alice".to_string(), "INTJ".to_string()),
///     ("Bob".to_string(), "ENFP".to_string()),
/// ]);
/// ```
pub fn parse_labeled_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = strip_list_marker(line.trim()).replace("**", "");
            let (name, value) = line.rsplit_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return rest;
        }
    }
    line
}
