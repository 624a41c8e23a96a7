//! Line grammars and the helpers the reconstructor builds on.
//!
//! - [`grammars`] - built-in header layouts in priority order
//! - [`detect`] - first-match format detection
//! - [`timestamp`] - permissive date resolution
//! - [`clean`] - URL and emoji stripping
//! - [`system`] - WhatsApp system notice recognition

pub mod clean;
pub mod detect;
pub mod grammars;
pub mod system;
pub mod timestamp;

pub use clean::{clean_message, strip_bom, strip_emoji, strip_urls};
pub use detect::{detect_grammar, detect_pattern};
pub use grammars::{BUILTIN_PATTERNS, BuiltinGrammar};
pub use system::is_system_message;
pub use timestamp::{DateOrder, normalize_timestamp, parse_timestamp};
