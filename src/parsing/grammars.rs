//! Built-in header grammars.
//!
//! Exports differ by app, platform and phone locale. Each supported layout
//! is one [`BuiltinGrammar`] variant; [`BuiltinGrammar::all`] lists them in
//! detection priority order.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::DateOrder;
use crate::pattern::Pattern;

/// Header layouts recognized without grammar inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinGrammar {
    /// iOS export: `[1/2/24, 10:00:00 AM] Alice: text`
    WhatsAppBracketed,
    /// Chat log with angle-bracketed nicks: `2020-01-06 13:24:32 <Alice> text`
    AngleBracket,
    /// ISO date, dotted meridiem: `2024-01-02, 7:07 p.m. - Alice: text`
    IsoDashMeridiem,
    /// Android export: `15/01/2024, 10:30 - Alice: text`
    WhatsAppDash,
    /// Dotted date in brackets: `[15.01.24, 10:30:45] Alice: text`
    EuDotBracketed,
    /// Dotted date with dash: `26.10.2025, 20:40 - Alice: text`
    EuDotDash,
}

impl BuiltinGrammar {
    /// Returns the regex source for this grammar.
    pub fn pattern(self) -> &'static str {
        match self {
            // [1/2/24, 10:00:00 AM] Alice: text
            BuiltinGrammar::WhatsAppBracketed => {
                r"^\x{200E}?\[(?<timestamp>\d{1,2}/\d{1,2}/\d{2,4},\s\d{1,2}:\d{2}(?::\d{2})?(?:\s?[AaPp]\.?\s?[Mm]\.?)?)\]\s(?<user>[^:]+):\s?(?<message>.*)$"
            }
            // 2020-01-06 13:24:32 <Alice> text
            BuiltinGrammar::AngleBracket => {
                r"^(?<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s<(?<user>[^>]+)>\s(?<message>.*)$"
            }
            // 2024-01-02, 7:07 p.m. - Alice: text
            BuiltinGrammar::IsoDashMeridiem => {
                r"^(?<timestamp>\d{4}-\d{2}-\d{2},\s\d{1,2}:\d{2}\s[AaPp]\.?\s?[Mm]\.?)\s-\s(?<user>[^:]+):\s(?<message>.*)$"
            }
            // 15/01/2024, 10:30 - Alice: text
            BuiltinGrammar::WhatsAppDash => {
                r"^\x{200E}?(?<timestamp>\d{1,2}/\d{1,2}/\d{2,4},?\s\d{1,2}:\d{2}(?::\d{2})?(?:\s?[AaPp]\.?\s?[Mm]\.?)?)\s-\s(?<user>[^:]+):\s?(?<message>.*)$"
            }
            // [15.01.24, 10:30:45] Alice: text
            BuiltinGrammar::EuDotBracketed => {
                r"^\x{200E}?\[(?<timestamp>\d{1,2}\.\d{1,2}\.\d{2,4},\s\d{1,2}:\d{2}(?::\d{2})?)\]\s(?<user>[^:]+):\s?(?<message>.*)$"
            }
            // 26.10.2025, 20:40 - Alice: text
            BuiltinGrammar::EuDotDash => {
                r"^(?<timestamp>\d{1,2}\.\d{1,2}\.\d{2,4},\s\d{1,2}:\d{2}(?::\d{2})?)\s-\s(?<user>[^:]+):\s?(?<message>.*)$"
            }
        }
    }

    /// Stable grammar name.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinGrammar::WhatsAppBracketed => "whatsapp-bracketed",
            BuiltinGrammar::AngleBracket => "angle-bracket",
            BuiltinGrammar::IsoDashMeridiem => "iso-dash-meridiem",
            BuiltinGrammar::WhatsAppDash => "whatsapp-dash",
            BuiltinGrammar::EuDotBracketed => "eu-dot-bracketed",
            BuiltinGrammar::EuDotDash => "eu-dot-dash",
        }
    }

    /// Date field order of this layout.
    ///
    /// Slash dates are written both ways, so those layouts decide per document.
    pub fn date_order(self) -> DateOrder {
        match self {
            BuiltinGrammar::WhatsAppBracketed | BuiltinGrammar::WhatsAppDash => DateOrder::Auto,
            BuiltinGrammar::AngleBracket | BuiltinGrammar::IsoDashMeridiem => DateOrder::YearFirst,
            BuiltinGrammar::EuDotBracketed | BuiltinGrammar::EuDotDash => DateOrder::DayFirst,
        }
    }

    /// All grammars in detection priority order.
    pub fn all() -> &'static [BuiltinGrammar] {
        &[
            BuiltinGrammar::WhatsAppBracketed,
            BuiltinGrammar::AngleBracket,
            BuiltinGrammar::IsoDashMeridiem,
            BuiltinGrammar::WhatsAppDash,
            BuiltinGrammar::EuDotBracketed,
            BuiltinGrammar::EuDotDash,
        ]
    }

    /// Looks a grammar up by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<BuiltinGrammar> {
        Self::all().iter().copied().find(|g| g.name() == name)
    }

    /// Returns the compiled pattern for this grammar.
    pub fn compiled(self) -> &'static Pattern {
        let index = Self::all()
            .iter()
            .position(|g| *g == self)
            .unwrap_or_default();
        &BUILTIN_PATTERNS[index]
    }
}

/// Compiled built-in grammars, same order as [`BuiltinGrammar::all`].
pub static BUILTIN_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    BuiltinGrammar::all()
        .iter()
        .map(|g| {
            Pattern::new(g.name(), g.pattern(), g.date_order())
                .expect("built-in grammar must compile")
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_compile() {
        assert_eq!(BUILTIN_PATTERNS.len(), BuiltinGrammar::all().len());
        for grammar in BuiltinGrammar::all() {
            assert_eq!(grammar.compiled().name(), grammar.name());
        }
    }

    #[test]
    fn test_whatsapp_bracketed_variants() {
        let p = BuiltinGrammar::WhatsAppBracketed.compiled();
        assert!(p.is_header("[1/2/24, 10:00:00 AM] Alice: hello there"));
        assert!(p.is_header("[1/15/24, 10:30 PM] Bob: hi"));
        assert!(p.is_header("[15/01/2024, 10:30:45] Bob: hi"));
        assert!(p.is_header("\u{200E}[3/4/24, 9:05:00\u{202F}PM] Alice: \u{200E}image omitted"));
        assert!(!p.is_header("15/01/2024, 10:30 - Bob: hi"));
    }

    #[test]
    fn test_angle_bracket() {
        let p = BuiltinGrammar::AngleBracket.compiled();
        let h = p.match_header("2020-01-06 13:24:32 <Alice> hey: you").unwrap();
        assert_eq!(h.user, "Alice");
        assert_eq!(h.message, "hey: you");
    }

    #[test]
    fn test_iso_dash_meridiem() {
        let p = BuiltinGrammar::IsoDashMeridiem.compiled();
        let h = p.match_header("2024-01-02, 7:07 p.m. - Alice: text").unwrap();
        assert_eq!(h.timestamp, "2024-01-02, 7:07 p.m.");
        assert_eq!(h.user, "Alice");
        assert!(p.is_header("2024-01-02, 11:59 AM - Bob: text"));
    }

    #[test]
    fn test_whatsapp_dash() {
        let p = BuiltinGrammar::WhatsAppDash.compiled();
        let h = p.match_header("15/01/2024, 10:30 - Alice: Hello").unwrap();
        assert_eq!(h.timestamp, "15/01/2024, 10:30");
        assert!(p.is_header("1/15/24, 10:30\u{202F}AM - Bob: morning"));
        assert!(!p.is_header("15/01/2024, 10:30 - Messages and calls are end-to-end encrypted."));
    }

    #[test]
    fn test_eu_dot_grammars() {
        assert!(BuiltinGrammar::EuDotBracketed.compiled().is_header("[15.01.24, 10:30:45] Alice: Hello"));
        let h = BuiltinGrammar::EuDotDash
            .compiled()
            .match_header("26.10.2025, 20:40 - Муха: Добрый вечер")
            .unwrap();
        assert_eq!(h.user, "Муха");
        assert_eq!(h.message, "Добрый вечер");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            BuiltinGrammar::from_name("eu-dot-dash"),
            Some(BuiltinGrammar::EuDotDash)
        );
        assert_eq!(BuiltinGrammar::from_name("telegram"), None);
    }
}
