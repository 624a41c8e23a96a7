//! Configuration types for parsing, inference and analytics.
//!
//! One struct per concern, all with builder methods and serde support so a
//! host application can load them from its own settings file:
//!
//! - [`ParseConfig`] - line grammars, cleaning, timestamp resolution
//! - [`InferenceConfig`] - labeling-service fan-out and grammar inference
//! - [`AnalysisConfig`] - word ranking, sentiment bucketing, personality
//!
//! [`ChatlensConfig`] bundles the three for [`ChatPipeline`](crate::pipeline::ChatPipeline).
//!
//! # Example
//!
//! ```rust
//! use chatlens::config::{AnalysisConfig, ChatlensConfig, ParseConfig};
//!
//! let config = ChatlensConfig::new()
//!     .with_parse(ParseConfig::new().with_skip_system_messages(true))
//!     .with_analysis(AnalysisConfig::new().with_top_n(50).with_exclude_numeric_tokens(true));
//!
//! assert_eq!(config.analysis.top_n, 50);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parsing::DateOrder;

/// Configuration for turning raw text into messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Drop WhatsApp system notices (encryption banner, group events) (default: false)
    pub skip_system_messages: bool,

    /// Strip URLs from message text (default: true)
    pub strip_urls: bool,

    /// Strip emoji glyphs from message text (default: true)
    pub strip_emoji: bool,

    /// Force a day/month order instead of the grammar's hint (default: None)
    pub date_order: Option<DateOrder>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            skip_system_messages: false,
            strip_urls: true,
            strip_emoji: true,
            date_order: None,
        }
    }
}

impl ParseConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to skip system notices.
    #[must_use]
    pub fn with_skip_system_messages(mut self, skip: bool) -> Self {
        self.skip_system_messages = skip;
        self
    }

    /// Sets whether URLs are stripped.
    #[must_use]
    pub fn with_strip_urls(mut self, strip: bool) -> Self {
        self.strip_urls = strip;
        self
    }

    /// Sets whether emoji are stripped.
    #[must_use]
    pub fn with_strip_emoji(mut self, strip: bool) -> Self {
        self.strip_emoji = strip;
        self
    }

    /// Forces the order of numeric date fields.
    #[must_use]
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = Some(order);
        self
    }
}

/// Configuration for labeling-service calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Characters of the document sent for grammar inference (default: 3000)
    pub sample_chars: usize,

    /// Maximum number of in-flight requests per run (default: 8)
    pub max_concurrency: usize,

    /// Deadline for a single request (default: 30s)
    pub request_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_chars: 3000,
            max_concurrency: 8,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl InferenceConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inference sample length in characters.
    #[must_use]
    pub fn with_sample_chars(mut self, chars: usize) -> Self {
        self.sample_chars = chars;
        self
    }

    /// Sets the maximum number of concurrent requests (at least 1).
    #[must_use]
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for analytics.
///
/// # Example
///
/// ```rust
/// use chatlens::config::AnalysisConfig;
///
/// let config = AnalysisConfig::new()
///     .with_min_sentiment_samples(10)
///     .with_exclude_numeric_tokens(true);
///
/// assert_eq!(config.min_sentiment_samples, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Entries kept per participant in the word ranking (default: 100)
    pub top_n: usize,

    /// Ignore tokens containing digits when counting words (default: false)
    pub exclude_numeric_tokens: bool,

    /// Scored messages a bucket needs before its sentiment is emitted (default: 5)
    pub min_sentiment_samples: usize,

    /// Number of chunks personality inference aims for (default: 100)
    pub personality_chunks: usize,

    /// Messages each participant must have in a personality chunk (default: 3)
    pub min_messages_per_participant: usize,

    /// Significance level for personality letter splits (default: 0.3)
    pub significance_alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 100,
            exclude_numeric_tokens: false,
            min_sentiment_samples: 5,
            personality_chunks: 100,
            min_messages_per_participant: 3,
            significance_alpha: 0.3,
        }
    }
}

impl AnalysisConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the word ranking cutoff.
    #[must_use]
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Sets whether tokens with digits are excluded.
    #[must_use]
    pub fn with_exclude_numeric_tokens(mut self, exclude: bool) -> Self {
        self.exclude_numeric_tokens = exclude;
        self
    }

    /// Sets the minimum number of scored messages per sentiment bucket.
    #[must_use]
    pub fn with_min_sentiment_samples(mut self, n: usize) -> Self {
        self.min_sentiment_samples = n;
        self
    }

    /// Sets the target number of personality chunks.
    #[must_use]
    pub fn with_personality_chunks(mut self, n: usize) -> Self {
        self.personality_chunks = n.max(1);
        self
    }

    /// Sets the per-participant minimum inside a personality chunk.
    #[must_use]
    pub fn with_min_messages_per_participant(mut self, n: usize) -> Self {
        self.min_messages_per_participant = n;
        self
    }

    /// Sets the significance level for personality letter splits.
    #[must_use]
    pub fn with_significance_alpha(mut self, alpha: f64) -> Self {
        self.significance_alpha = alpha;
        self
    }
}

/// Complete configuration of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatlensConfig {
    /// Parsing options
    pub parse: ParseConfig,
    /// Labeling-service options
    pub inference: InferenceConfig,
    /// Analytics options
    pub analysis: AnalysisConfig,
}

impl ChatlensConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the parsing options.
    #[must_use]
    pub fn with_parse(mut self, parse: ParseConfig) -> Self {
        self.parse = parse;
        self
    }

    /// Replaces the labeling-service options.
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Replaces the analytics options.
    #[must_use]
    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }
}
