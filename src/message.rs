//! The normalized chat message.
//!
//! Every grammar, built-in or inferred, reconstructs its matches into
//! [`ChatMessage`]. All analytics consume slices of it.
//!
//! # Examples
//!
//! ```
//! use chatlens::ChatMessage;
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
//! let msg = ChatMessage::new("Alice", "hello there", ts);
//!
//! assert_eq!(msg.user(), "Alice");
//! assert_eq!(msg.word_count(), 2);
//! assert!(msg.sentiment_score().is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message of a reconstructed conversation.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `user` | `String` | Speaker exactly as written in the transcript, trimmed |
/// | `message` | `String` | Cleaned text, continuation lines joined with `\n` |
/// | `timestamp` | `DateTime<Utc>` | Resolved send time |
/// | `sentiment_score` | `Option<f64>` | Score attached by sentiment scoring |
///
/// Serialized with camelCase keys; `sentimentScore` is omitted while unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Speaker of the message.
    pub user: String,

    /// Message text.
    ///
    /// May span several lines. URLs and emoji glyphs are already stripped.
    pub message: String,

    /// When the message was sent.
    ///
    /// Transcripts carry no zone information, so wall-clock times are read
    /// as UTC.
    pub timestamp: DateTime<Utc>,

    /// Sentiment score in `[-10, 10]`, attached after parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

impl ChatMessage {
    /// Creates a message without a sentiment score.
    pub fn new(user: impl Into<String>, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
            timestamp,
            sentiment_score: None,
        }
    }

    /// Builder method to attach a sentiment score.
    #[must_use]
    pub fn with_sentiment_score(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }

    // =========================================================================
    // Accessor methods
    // =========================================================================

    /// Returns the speaker.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the send time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the sentiment score, if one was attached.
    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment_score
    }

    // =========================================================================
    // Utility methods
    // =========================================================================

    /// Number of whitespace-separated tokens in the message.
    pub fn word_count(&self) -> usize {
        self.message.split_whitespace().count()
    }

    /// Returns `true` if the message text is empty or whitespace-only.
    ///
    /// Media-only messages end up empty once emoji and links are stripped.
    pub fn is_empty(&self) -> bool {
        self.message.trim().is_empty()
    }

    /// Returns `true` if the message spans more than one source line.
    pub fn is_multiline(&self) -> bool {
        self.message.contains('\n')
    }
}
