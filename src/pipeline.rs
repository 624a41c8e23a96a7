//! End-to-end entry point.
//!
//! [`ChatPipeline`] ties detection, grammar inference, reconstruction and
//! the analytics together behind one configured value. It holds the
//! collaborators a run needs: an optional labeling service and an optional
//! audit store. Each run starts with its own empty label cache unless the
//! caller injects a shared one with [`ChatPipeline::with_cache`].
//!
//! # Example
//!
//! ```rust
//! use chatlens::pipeline::ChatPipeline;
//!
//! let text = "[1/2/24, 10:00:00 AM] Alice: hello there\n\
//!             [1/2/24, 10:01:00 AM] Bob: hi Alice\n\
//!             [1/2/24, 10:02:00 AM] Alice: how are you";
//!
//! let pipeline = ChatPipeline::new();
//! let parsed = pipeline.parse_builtin(text)?;
//! assert_eq!(parsed.messages.len(), 3);
//!
//! let words = pipeline.analyze_words(&parsed.messages)?;
//! assert_eq!(words.person1, "Alice");
//! # Ok::<(), chatlens::ChatlensError>(())
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{
    self, Measure, PeriodSeries, PeriodUnit, PersonalityReport, SentimentRun, WordComparison,
};
use crate::audit::{self, AuditStore, PatternRecord, UnparsableRecord, document_id};
use crate::config::ChatlensConfig;
use crate::error::{ChatlensError, Result, ServiceError};
use crate::inference::{LabelCache, LabelingService, MemoryLabelCache, infer_pattern, sample_prefix};
use crate::message::ChatMessage;
use crate::parsing::{BuiltinGrammar, DateOrder, detect_grammar, strip_bom};
use crate::pattern::Pattern;
use crate::reconstruct::{Reconstruction, reconstruct_with};

/// Where the grammar of a parsed document came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrammarOrigin {
    /// A built-in layout
    BuiltIn {
        /// Which one
        grammar: BuiltinGrammar,
    },
    /// Supplied by the labeling service
    #[serde(rename_all = "camelCase")]
    Inferred {
        /// First participant named by the service
        speaker_a: String,
        /// Second participant named by the service
        speaker_b: String,
    },
    /// Supplied by the caller
    Custom,
}

/// A parsed document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChat {
    /// Content hash of the input
    pub document_id: String,
    /// Messages in source order
    pub messages: Vec<ChatMessage>,
    /// Grammar that produced them
    pub pattern: Pattern,
    /// Where the grammar came from
    pub origin: GrammarOrigin,
    /// Header lines matched
    pub headers: usize,
    /// Messages dropped for an unparseable timestamp
    pub dropped: usize,
    /// System notices skipped
    pub skipped_system: usize,
    /// Lines before the first header
    pub orphan_lines: usize,
    /// Date order used for numeric dates
    pub date_order: DateOrder,
}

impl ParsedChat {
    fn assemble(document_id: String, pattern: Pattern, origin: GrammarOrigin, rebuilt: Reconstruction) -> Self {
        Self {
            document_id,
            messages: rebuilt.messages,
            pattern,
            origin,
            headers: rebuilt.headers,
            dropped: rebuilt.dropped,
            skipped_system: rebuilt.skipped_system,
            orphan_lines: rebuilt.orphan_lines,
            date_order: rebuilt.date_order,
        }
    }

    /// Returns true if no message was reconstructed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Configured parser and analyzer.
#[derive(Clone)]
pub struct ChatPipeline {
    config: ChatlensConfig,
    service: Option<Arc<dyn LabelingService>>,
    cache: Option<Arc<dyn LabelCache>>,
    audit: Option<Arc<dyn AuditStore>>,
}

impl Default for ChatPipeline {
    fn default() -> Self {
        Self {
            config: ChatlensConfig::default(),
            service: None,
            cache: None,
            audit: None,
        }
    }
}

impl std::fmt::Debug for ChatPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatPipeline")
            .field("config", &self.config)
            .field("service", &self.service.as_ref().map(|s| s.name().to_string()))
            .field("shared_cache", &self.cache.is_some())
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl ChatPipeline {
    /// Creates a pipeline with default configuration and no labeling service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ChatlensConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the labeling service used for inference and labeling.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn LabelingService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Shares `cache` across every run of this pipeline.
    ///
    /// Without it each `parse`, `score_sentiment` and `infer_personalities`
    /// call gets a fresh [`MemoryLabelCache`] that is dropped when it returns.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn LabelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the audit store for inferred grammars and unparsable documents.
    #[must_use]
    pub fn with_audit(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(store);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ChatlensConfig {
        &self.config
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parses `text` with the built-in grammars only.
    ///
    /// # Errors
    ///
    /// [`ChatlensError::NoPatternMatched`] if no built-in grammar matches.
    pub fn parse_builtin(&self, text: &str) -> Result<ParsedChat> {
        let Some(grammar) = detect_grammar(text) else {
            return Err(ChatlensError::no_pattern(ServiceError::NotAttempted(
                "no built-in grammar matched and inference was not requested".into(),
            )));
        };
        Ok(self.reconstruct_builtin(text, document_id(text), grammar))
    }

    /// Parses `text` with a caller-supplied grammar.
    pub fn parse_with_pattern(&self, text: &str, pattern: &Pattern) -> ParsedChat {
        let rebuilt = reconstruct_with(text, pattern, &self.config.parse);
        ParsedChat::assemble(document_id(text), pattern.clone(), GrammarOrigin::Custom, rebuilt)
    }

    /// Parses `text`, falling back to grammar inference when no built-in
    /// grammar matches.
    ///
    /// An inferred grammar is recorded in the audit store; a document that
    /// cannot be parsed, or that yields no messages, is flagged there. Audit
    /// failures are logged and never change the result.
    ///
    /// # Errors
    ///
    /// - [`ChatlensError::NoPatternMatched`] if the text is empty, no
    ///   service is configured, or inference fails
    /// - [`ChatlensError::InvalidInferredPattern`] if the inferred grammar
    ///   is unusable
    pub async fn parse(&self, text: &str) -> Result<ParsedChat> {
        if strip_bom(text).trim().is_empty() {
            return Err(ChatlensError::no_pattern(ServiceError::NotAttempted(
                "document is empty".into(),
            )));
        }

        let id = document_id(text);
        let parsed = match detect_grammar(text) {
            Some(grammar) => self.reconstruct_builtin(text, id, grammar),
            None => self.parse_inferred(text, id).await?,
        };

        if parsed.is_empty() {
            warn!(document = %parsed.document_id, "grammar matched but no message survived");
            self.flag_unparsable(&parsed.document_id, "no messages reconstructed").await;
        }
        Ok(parsed)
    }

    /// Reads a file (lossy UTF-8) and [`parse`](Self::parse)s it.
    pub async fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedChat> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let text = String::from_utf8_lossy(&bytes);
        self.parse(&text).await
    }

    fn reconstruct_builtin(&self, text: &str, id: String, grammar: BuiltinGrammar) -> ParsedChat {
        let pattern = grammar.compiled();
        let rebuilt = reconstruct_with(text, pattern, &self.config.parse);
        ParsedChat::assemble(
            id,
            pattern.clone(),
            GrammarOrigin::BuiltIn { grammar },
            rebuilt,
        )
    }

    async fn parse_inferred(&self, text: &str, id: String) -> Result<ParsedChat> {
        let Some(service) = self.service.as_deref() else {
            let err = ChatlensError::no_pattern(ServiceError::NotAttempted(
                "no labeling service configured".into(),
            ));
            self.flag_unparsable(&id, &err.to_string()).await;
            return Err(err);
        };

        let sample = sample_prefix(text, self.config.inference.sample_chars);
        let cache = self.run_cache();
        let inferred = match infer_pattern(service, cache.as_ref(), sample, &self.config.inference).await {
            Ok(inferred) => inferred,
            Err(err) => {
                self.flag_unparsable(&id, &err.to_string()).await;
                return Err(err);
            }
        };

        if let Some(store) = &self.audit {
            let record = PatternRecord {
                document_id: id.clone(),
                pattern: inferred.pattern.as_str().to_string(),
                sample: sample.to_string(),
                recorded_at: Utc::now(),
            };
            audit::record_pattern(store.as_ref(), &record).await;
        }

        let rebuilt = reconstruct_with(text, &inferred.pattern, &self.config.parse);
        info!(document = %id, messages = rebuilt.messages.len(), "parsed with inferred grammar");
        Ok(ParsedChat::assemble(
            id,
            inferred.pattern,
            GrammarOrigin::Inferred {
                speaker_a: inferred.speaker_a,
                speaker_b: inferred.speaker_b,
            },
            rebuilt,
        ))
    }

    async fn flag_unparsable(&self, id: &str, reason: &str) {
        if let Some(store) = &self.audit {
            let record = UnparsableRecord {
                document_id: id.to_string(),
                reason: reason.to_string(),
                recorded_at: Utc::now(),
            };
            audit::mark_unparsable(store.as_ref(), &record).await;
        }
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Word exclusivity ranking of the first two speakers.
    pub fn analyze_words(&self, messages: &[ChatMessage]) -> Result<WordComparison> {
        analytics::analyze_words(messages, &self.config.analysis)
    }

    /// Mean sentiment per period, gated by the configured sample minimum.
    pub fn sentiment_trend(&self, messages: &[ChatMessage], unit: PeriodUnit) -> PeriodSeries {
        let measure = Measure::Sentiment {
            min_samples: self.config.analysis.min_sentiment_samples,
        };
        analytics::aggregate_by_period(messages, unit, measure)
    }

    /// Scores every message through the labeling service.
    ///
    /// # Errors
    ///
    /// [`ChatlensError::Service`] if no service is configured. Failures of
    /// single requests are reported in the run instead.
    pub async fn score_sentiment(&self, messages: &mut [ChatMessage]) -> Result<SentimentRun> {
        let service = self.require_service()?;
        let cache = self.run_cache();
        Ok(analytics::score_sentiment(service, cache.as_ref(), messages, &self.config.inference).await)
    }

    /// Predicts a personality type per speaker.
    ///
    /// # Errors
    ///
    /// [`ChatlensError::Service`] if no service is configured.
    pub async fn infer_personalities(&self, messages: &[ChatMessage]) -> Result<PersonalityReport> {
        let service = self.require_service()?;
        let cache = self.run_cache();
        Ok(analytics::infer_personalities(
            service,
            cache.as_ref(),
            messages,
            &self.config.analysis,
            &self.config.inference,
        )
        .await)
    }

    fn run_cache(&self) -> Arc<dyn LabelCache> {
        match &self.cache {
            Some(shared) => Arc::clone(shared),
            None => Arc::new(MemoryLabelCache::new()),
        }
    }

    fn require_service(&self) -> Result<&dyn LabelingService> {
        self.service
            .as_deref()
            .ok_or_else(|| ServiceError::NotAttempted("no labeling service configured".into()).into())
    }
}
