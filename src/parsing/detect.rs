//! Format detection over the built-in grammars.

use tracing::debug;

use super::clean::strip_bom;
use super::grammars::{BUILTIN_PATTERNS, BuiltinGrammar};
use crate::pattern::Pattern;

/// Picks the first built-in grammar that matches at least one line.
///
/// Grammars are tried in [`BuiltinGrammar::all`] order over the whole text
/// and the search stops at the first hit. `None` means the document needs
/// grammar inference.
///
/// ```
/// use chatlens::parsing::detect_pattern;
///
/// let text = "noise\n[1/2/24, 10:00:00 AM] Alice: hello there";
/// assert_eq!(detect_pattern(text).unwrap().name(), "whatsapp-bracketed");
/// assert!(detect_pattern("just prose").is_none());
/// ```
pub fn detect_pattern(text: &str) -> Option<&'static Pattern> {
    let text = strip_bom(text);
    let found = BUILTIN_PATTERNS
        .iter()
        .find(|pattern| pattern.matches_any_line(text));

    match found {
        Some(pattern) => debug!(grammar = pattern.name(), "detected built-in grammar"),
        None => debug!("no built-in grammar matched"),
    }
    found
}

/// Like [`detect_pattern`], returning the grammar identifier.
pub fn detect_grammar(text: &str) -> Option<BuiltinGrammar> {
    detect_pattern(text).and_then(|pattern| BuiltinGrammar::from_name(pattern.name()))
}
