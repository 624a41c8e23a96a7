//! Unified error types for chatlens.
//!
//! [`ChatlensError`] covers every failure a caller can observe. Each variant
//! knows which [`PipelineStage`] produced it, so a UI can say *where* a
//! document went wrong and not only *what* went wrong.
//!
//! Failures of the external labeling service are described separately by
//! [`ServiceError`]. They are usually absorbed at chunk granularity (a
//! missing sentiment score, a skipped personality chunk) and only surface as
//! a [`ChatlensError`] when the document cannot be parsed at all.
//!
//! # Error Handling Philosophy
//!
//! - **Document-level** failures (no grammar, bad inferred grammar) abort the
//!   pipeline for that document
//! - **Message-level** failures (unparseable timestamp) drop one message and
//!   are reported as counts
//! - **Chunk-level** service failures degrade the affected result only

use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// A specialized [`Result`] type for chatlens operations.
///
/// # Example
///
/// ```rust
/// use chatlens::error::Result;
/// use chatlens::ChatMessage;
///
/// fn my_function() -> Result<Vec<ChatMessage>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatlensError>;

/// The step of the pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the raw document.
    Input,
    /// Matching the document against the built-in grammars.
    Detection,
    /// Asking the labeling service for a grammar.
    Inference,
    /// Turning matched lines into messages.
    Reconstruction,
    /// Word, temporal or conversation analytics.
    Analysis,
    /// A call to the labeling service outside grammar inference.
    Service,
    /// Writing results out.
    Output,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Input => "input",
            PipelineStage::Detection => "format detection",
            PipelineStage::Inference => "grammar inference",
            PipelineStage::Reconstruction => "message reconstruction",
            PipelineStage::Analysis => "analysis",
            PipelineStage::Service => "labeling service",
            PipelineStage::Output => "output",
        };
        f.write_str(name)
    }
}

/// The error type for all chatlens operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatlensError {
    /// An I/O error occurred while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No built-in grammar matched and grammar inference failed.
    ///
    /// The document produced no messages.
    #[error("No known chat format matched and grammar inference failed: {source}")]
    NoPatternMatched {
        /// Why the labeling service could not supply a grammar
        #[source]
        source: ServiceError,
    },

    /// The labeling service returned a grammar that cannot be used.
    ///
    /// Treated exactly like a failed inference: no default grammar is tried.
    #[error("Inferred pattern '{pattern}' is invalid: {reason}")]
    InvalidInferredPattern {
        /// The pattern as returned by the service
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A caller-supplied pattern is invalid.
    #[error("Pattern '{pattern}' is invalid: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A timestamp could not be resolved to a point in time.
    ///
    /// Recoverable: the reconstructor drops the message and counts it.
    #[error("Unparseable timestamp '{input}'")]
    TimestampUnparseable {
        /// The raw timestamp text
        input: String,
    },

    /// Participant comparison needs two distinct speakers.
    #[error("Need two distinct participants for comparison, found {found}")]
    InsufficientParticipants {
        /// Number of distinct speakers found
        found: usize,
    },

    /// A labeling service call failed.
    #[error("Labeling service error: {0}")]
    Service(#[from] ServiceError),

    /// The requested output format is unknown or not compiled in.
    #[error("Unsupported output: {message}")]
    UnsupportedOutput {
        /// What was requested and what is available
        message: String,
    },
}

/// Failure modes of a single labeling-service call.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// No service is configured or it refused to serve requests.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// No call was made, e.g. the document was empty.
    #[error("not attempted: {0}")]
    NotAttempted(String),

    /// The request did not reach the service or the reply was lost.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call exceeded its deadline.
    #[error("request timed out after {after:?}")]
    Timeout {
        /// The deadline that was exceeded
        after: Duration,
    },

    /// The reply could not be decoded at all.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A field is missing or has the wrong type.
    #[error("field '{field}' violates schema: expected {expected}")]
    SchemaViolation {
        /// Name of the field
        field: String,
        /// Expected shape of the field
        expected: String,
    },

    /// A numeric field lies outside its declared range.
    #[error("field '{field}' out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        /// Name of the field
        field: String,
        /// Value received
        value: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatlensError {
    /// Creates an invalid inferred pattern error.
    pub fn invalid_inferred(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatlensError::InvalidInferredPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatlensError::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unparseable timestamp error.
    pub fn timestamp(input: impl Into<String>) -> Self {
        ChatlensError::TimestampUnparseable {
            input: input.into(),
        }
    }

    /// Creates an unsupported output error.
    pub fn unsupported_output(message: impl Into<String>) -> Self {
        ChatlensError::UnsupportedOutput {
            message: message.into(),
        }
    }

    /// Creates an error for a document that no grammar could describe.
    pub fn no_pattern(source: ServiceError) -> Self {
        ChatlensError::NoPatternMatched { source }
    }

    /// Returns the pipeline stage that produced this error.
    pub fn stage(&self) -> PipelineStage {
        match self {
            ChatlensError::Io(_) => PipelineStage::Input,
            ChatlensError::Json(_) => PipelineStage::Output,
            #[cfg(feature = "csv-output")]
            ChatlensError::Csv(_) => PipelineStage::Output,
            ChatlensError::NoPatternMatched { .. } | ChatlensError::InvalidInferredPattern { .. } => {
                PipelineStage::Inference
            }
            ChatlensError::InvalidPattern { .. } => PipelineStage::Detection,
            ChatlensError::TimestampUnparseable { .. } => PipelineStage::Reconstruction,
            ChatlensError::InsufficientParticipants { .. } => PipelineStage::Analysis,
            ChatlensError::Service(_) => PipelineStage::Service,
            ChatlensError::UnsupportedOutput { .. } => PipelineStage::Output,
        }
    }

    /// Returns true if this error means the document could not be parsed.
    pub fn is_unparsable(&self) -> bool {
        matches!(
            self,
            ChatlensError::NoPatternMatched { .. } | ChatlensError::InvalidInferredPattern { .. }
        )
    }

    /// Returns true if the error only affects one message or one chunk.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChatlensError::TimestampUnparseable { .. } | ChatlensError::Service(_)
        )
    }

    /// Returns true if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatlensError::Io(_))
    }

    /// Returns true if comparison failed for lack of participants.
    pub fn is_insufficient_participants(&self) -> bool {
        matches!(self, ChatlensError::InsufficientParticipants { .. })
    }
}

impl ServiceError {
    /// Creates a schema violation error.
    pub fn schema(field: impl Into<String>, expected: impl Into<String>) -> Self {
        ServiceError::SchemaViolation {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ServiceError::MalformedResponse(message.into())
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport(message.into())
    }

    /// Returns true if the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Timeout { .. })
    }

    /// Returns true if the service answered but the answer was unusable.
    pub fn is_invalid_response(&self) -> bool {
        matches!(
            self,
            ServiceError::MalformedResponse(_)
                | ServiceError::SchemaViolation { .. }
                | ServiceError::OutOfRange { .. }
        )
    }
}
