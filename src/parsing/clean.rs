//! Message text cleaning.

use std::sync::LazyLock;

use regex::Regex;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());

// Pictographs plus the joiners, selectors, skin tones and flag letters that
// glue multi-codepoint emoji together.
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{FE0F}\x{FE0E}\x{200D}\x{20E3}\x{1F1E6}-\x{1F1FF}\x{E0020}-\x{E007F}]",
    )
    .unwrap()
});

static INVISIBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{200E}\x{200F}\x{FEFF}]").unwrap());

/// Removes `http://`, `https://` and `www.` links.
pub fn strip_urls(text: &str) -> String {
    URL.replace_all(text, "").into_owned()
}

/// Removes emoji glyphs, including ZWJ sequences and flags.
pub fn strip_emoji(text: &str) -> String {
    EMOJI.replace_all(text, "").into_owned()
}

/// Drops a leading byte-order mark, as written by some desktop exports.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Cleans a reconstructed message body.
///
/// Directional marks are always removed; URLs and emoji are removed as
/// requested. The result is trimmed at both ends, inner newlines are kept.
pub fn clean_message(text: &str, urls: bool, emoji: bool) -> String {
    let mut out = INVISIBLE.replace_all(text, "").into_owned();
    if urls {
        out = strip_urls(&out);
    }
    if emoji {
        out = strip_emoji(&out);
    }
    out.trim().to_string()
}
