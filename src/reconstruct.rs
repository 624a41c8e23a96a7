//! Message reconstruction.
//!
//! Turns raw export text into [`ChatMessage`]s under a chosen [`Pattern`]:
//! header lines open a message, every other line continues the open one,
//! and lines before the first header are dropped.
//!
//! Timestamps are resolved after the scan so that a `D/M` versus `M/D`
//! decision can use every header of the document at once.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ParseConfig;
use crate::message::ChatMessage;
use crate::parsing::{DateOrder, clean_message, is_system_message, parse_timestamp, strip_bom};
use crate::pattern::Pattern;

/// Messages rebuilt from one document, with diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconstruction {
    /// Messages in source order.
    pub messages: Vec<ChatMessage>,
    /// Header lines matched.
    pub headers: usize,
    /// Messages dropped because their timestamp could not be resolved.
    pub dropped: usize,
    /// Messages skipped as system notices.
    pub skipped_system: usize,
    /// Non-header lines seen before the first header.
    pub orphan_lines: usize,
    /// Date order used to resolve numeric dates.
    pub date_order: DateOrder,
}

impl Reconstruction {
    /// Returns true if no message survived.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A message whose header has been seen and whose body is still growing.
struct PendingMessage<'t> {
    timestamp: &'t str,
    user: &'t str,
    first_line: &'t str,
    body: String,
}

impl PendingMessage<'_> {
    fn push_line(&mut self, line: &str) {
        self.body.push('\n');
        self.body.push_str(line);
    }
}

/// Rebuilds messages with the default [`ParseConfig`].
///
/// ```
/// use chatlens::parsing::BuiltinGrammar;
/// use chatlens::reconstruct::reconstruct;
///
/// let text = "[1/2/24, 10:00:00 AM] Alice: hello\nthere\n[1/2/24, 10:00:05 AM] Bob: hi";
/// let out = reconstruct(text, BuiltinGrammar::WhatsAppBracketed.compiled());
///
/// assert_eq!(out.messages.len(), 2);
/// assert_eq!(out.messages[0].message, "hello\nthere");
/// ```
pub fn reconstruct(text: &str, pattern: &Pattern) -> Reconstruction {
    reconstruct_with(text, pattern, &ParseConfig::default())
}

/// Rebuilds messages from `text` using `pattern`.
///
/// Never fails: a message whose timestamp cannot be resolved is dropped with
/// a warning and counted in [`Reconstruction::dropped`].
pub fn reconstruct_with(text: &str, pattern: &Pattern, config: &ParseConfig) -> Reconstruction {
    let mut pending: Vec<PendingMessage<'_>> = Vec::new();
    let mut orphan_lines = 0usize;

    for line in strip_bom(text).lines() {
        if let Some(header) = pattern.match_header(line) {
            pending.push(PendingMessage {
                timestamp: header.timestamp,
                user: header.user,
                first_line: header.message,
                body: header.message.to_string(),
            });
        } else if let Some(current) = pending.last_mut() {
            current.push_line(line);
        } else {
            orphan_lines += 1;
        }
    }

    let headers = pending.len();
    let date_order = config
        .date_order
        .unwrap_or(pattern.date_order())
        .resolve(pending.iter().map(|p| p.timestamp));

    let mut out = Reconstruction {
        messages: Vec::with_capacity(headers),
        headers,
        orphan_lines,
        date_order,
        ..Reconstruction::default()
    };

    for item in pending {
        if config.skip_system_messages && is_system_message(item.user, item.first_line) {
            out.skipped_system += 1;
            continue;
        }

        let timestamp = match parse_timestamp(item.timestamp, date_order) {
            Ok(ts) => ts,
            Err(err) => {
                warn!(user = item.user, error = %err, "dropping message with unparseable timestamp");
                out.dropped += 1;
                continue;
            }
        };

        let message = clean_message(&item.body, config.strip_urls, config.strip_emoji);
        out.messages.push(ChatMessage::new(item.user, message, timestamp));
    }

    debug!(
        grammar = pattern.name(),
        headers = out.headers,
        messages = out.messages.len(),
        dropped = out.dropped,
        skipped_system = out.skipped_system,
        "reconstructed messages"
    );

    out
}
