//! # Chatlens
//!
//! A Rust library for turning exported chat transcripts into structured
//! messages and conversation analytics.
//!
//! ## Overview
//!
//! Chat exports are plain text whose header layout depends on the app,
//! platform and phone locale. Chatlens:
//! - **detects** the layout among its built-in grammars (WhatsApp iOS and
//!   Android, dotted European dates, ISO dates with dotted meridiem,
//!   angle-bracket chat logs)
//! - **infers** a grammar through a caller-supplied labeling service when
//!   none of them fits
//! - **reconstructs** multi-line messages with resolved timestamps
//! - **analyzes** the result: word exclusivity between the two main
//!   speakers, weekly or monthly engagement, sentiment trends, personality
//!   votes and conversation counters
//!
//! ## Quick Start
//!
//! ```rust
//! use chatlens::prelude::*;
//!
//! let text = "[1/2/24, 10:00:00 AM] Alice: hello there\n\
//!             [1/2/24, 10:01:00 AM] Bob: hi Alice\n\
//!             [1/8/24, 9:00:00 AM] Alice: how are you";
//!
//! let pipeline = ChatPipeline::new();
//! let parsed = pipeline.parse_builtin(text)?;
//!
//! let words = pipeline.analyze_words(&parsed.messages)?;
//! assert_eq!(words.top_words1.len(), 5);
//!
//! let weekly = aggregate_by_period(&parsed.messages, PeriodUnit::Week, Measure::WordCount);
//! assert_eq!(weekly.buckets.len(), 2);
//! # Ok::<(), chatlens::ChatlensError>(())
//! ```
//!
//! ## Grammar inference
//!
//! [`ChatPipeline::parse`](pipeline::ChatPipeline::parse) falls back to a
//! [`LabelingService`](inference::LabelingService) when no built-in grammar
//! matches. The service is a trait the host implements, typically around an
//! LLM API; the library never talks to the network itself.
//!
//! ## Module Structure
//!
//! - [`pipeline`] - [`ChatPipeline`](pipeline::ChatPipeline), the end-to-end entry point
//! - [`parsing`] - built-in grammars, detection, timestamps, text cleaning
//! - [`pattern`] - the validated header grammar type
//! - [`reconstruct`] - header and continuation line assembly
//! - [`inference`] - labeling-service seam, schemas, cache, fan-out
//! - [`analytics`] - words, temporal buckets, sentiment, personality, metrics
//! - [`audit`] - write-once records of inferred grammars and failures
//! - [`output`] - JSON, JSONL and CSV writers
//! - [`config`] - configuration types
//! - [`error`] - [`ChatlensError`] and [`Result`]
//! - [`prelude`] - convenient re-exports

pub mod analytics;
pub mod audit;
pub mod config;
pub mod error;
pub mod inference;
pub mod message;
pub mod output;
pub mod parsing;
pub mod pattern;
pub mod pipeline;
pub mod reconstruct;

pub use error::{ChatlensError, Result};
pub use message::ChatMessage;

/// Import everything you need with a single line:
///
/// ```rust
/// use chatlens::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::ChatMessage;
    pub use crate::error::{ChatlensError, PipelineStage, Result, ServiceError};

    // Configuration
    pub use crate::config::{AnalysisConfig, ChatlensConfig, InferenceConfig, ParseConfig};

    // Parsing
    pub use crate::parsing::{BuiltinGrammar, DateOrder, detect_pattern};
    pub use crate::pattern::Pattern;
    pub use crate::pipeline::{ChatPipeline, GrammarOrigin, ParsedChat};
    pub use crate::reconstruct::{Reconstruction, reconstruct};

    // Labeling service
    pub use crate::inference::{
        LabelCache, LabelRequest, LabelResponse, LabelTask, LabelingService, MemoryLabelCache,
    };

    // Analytics
    pub use crate::analytics::{
        ChatMetrics, Measure, PeriodSeries, PeriodUnit, PersonalityReport, SentimentRun,
        WordComparison, aggregate_by_period, analyze_words,
    };

    // Audit
    pub use crate::audit::{AuditStore, DirAuditStore, MemoryAuditStore};

    // Output
    pub use crate::output::{OutputFormat, to_json, write_json};
    #[cfg(feature = "csv-output")]
    pub use crate::output::{to_csv, write_csv};
}
