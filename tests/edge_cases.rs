//! Edge case tests for chatlens
//!
//! These tests cover export quirks and boundary conditions that the unit
//! tests of each module do not reach end to end.

use chatlens::ChatMessage;
use chatlens::analytics::{ChatMetrics, Measure, PeriodUnit, aggregate_by_period, analyze_words};
use chatlens::config::{AnalysisConfig, ChatlensConfig, ParseConfig};
use chatlens::error::ChatlensError;
use chatlens::parsing::{BuiltinGrammar, DateOrder, detect_grammar};
use chatlens::pattern::Pattern;
use chatlens::pipeline::ChatPipeline;
use chrono::{TimeZone, Utc};

fn parse(text: &str) -> Vec<ChatMessage> {
    ChatPipeline::new().parse_builtin(text).unwrap().messages
}

// =========================================================================
// Export encoding quirks
// =========================================================================

#[test]
fn test_byte_order_mark() {
    let text = "\u{FEFF}[1/2/24, 10:00:00 AM] Alice: first\n[1/2/24, 10:01:00 AM] Bob: second";
    let parsed = ChatPipeline::new().parse_builtin(text).unwrap();
    assert_eq!(parsed.messages.len(), 2);
    assert_eq!(parsed.orphan_lines, 0);
    assert_eq!(parsed.messages[0].user, "Alice");
}

#[test]
fn test_crlf_line_endings() {
    let text = "[1/2/24, 10:00:00 AM] Alice: hello\r\nworld\r\n[1/2/24, 10:01:00 AM] Bob: hi\r\n";
    let messages = parse(text);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message, "hello\nworld");
    assert!(!messages[1].message.contains('\r'));
}

#[test]
fn test_directional_marks_and_narrow_spaces() {
    let text = "\u{200E}[1/2/24, 10:00:05\u{202F}PM] Alice: \u{200E}image omitted";
    let messages = parse(text);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "image omitted");
    assert_eq!(
        messages[0].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 2, 22, 0, 5).unwrap()
    );
}

// =========================================================================
// Header shapes
// =========================================================================

#[test]
fn test_colon_inside_message() {
    let messages = parse("[1/2/24, 10:00:00 AM] Alice: meet at 10:30: room B");
    assert_eq!(messages[0].user, "Alice");
    assert_eq!(messages[0].message, "meet at 10:30: room B");
}

#[test]
fn test_unicode_speaker_names() {
    let text = "26.10.2025, 20:40 - Иван Петров: Привет!\n26.10.2025, 20:41 - 田中太郎: こんにちは";
    let messages = parse(text);
    assert_eq!(messages[0].user, "Иван Петров");
    assert_eq!(messages[1].user, "田中太郎");
    assert_eq!(messages[1].timestamp, Utc.with_ymd_and_hms(2025, 10, 26, 20, 41, 0).unwrap());
}

#[test]
fn test_empty_message_body() {
    let messages = parse("[1/2/24, 10:00:00 AM] Alice:\n[1/2/24, 10:01:00 AM] Bob: ok");
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_empty());
}

#[test]
fn test_midnight_dotted_meridiem() {
    let messages = parse("2024-01-02, 12:30 a.m. - Alice: late night");
    assert_eq!(
        messages[0].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 30, 0).unwrap()
    );
}

#[test]
fn test_day_first_decided_by_whole_document() {
    // The first line alone reads as 3 May; the second proves day-first
    let text = "05/03/24, 10:00 - Alice: early\n25/03/24, 10:00 - Bob: late";
    let parsed = ChatPipeline::new().parse_builtin(text).unwrap();
    assert_eq!(parsed.date_order, DateOrder::DayFirst);
    assert_eq!(
        parsed.messages[0].timestamp,
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    );
}

#[test]
fn test_forced_date_order() {
    let config = ChatlensConfig::new().with_parse(ParseConfig::new().with_date_order(DateOrder::DayFirst));
    let parsed = ChatPipeline::new()
        .with_config(config)
        .parse_builtin("[05/03/24, 10:00:00] Alice: hi")
        .unwrap();
    assert_eq!(parsed.messages[0].timestamp.format("%Y-%m-%d").to_string(), "2024-03-05");
}

#[test]
fn test_prose_only_document() {
    assert_eq!(detect_grammar("Dear diary,\ntoday was fine.\n"), None);
    let err = ChatPipeline::new().parse_builtin("Dear diary").unwrap_err();
    assert!(err.is_unparsable());
}

#[test]
fn test_very_long_message() {
    let body = "x".repeat(100 * 1024);
    let text = format!("[1/2/24, 10:00:00 AM] Alice: {body}\n[1/2/24, 10:01:00 AM] Bob: short");
    let messages = parse(&text);
    assert_eq!(messages[0].message.len(), 100 * 1024);
    assert_eq!(messages[1].message, "short");
}

// =========================================================================
// Cleaning and system notices
// =========================================================================

#[test]
fn test_system_notices_kept_by_default() {
    let text = "[1/2/24, 10:00:00 AM] Alice: Messages and calls are end-to-end encrypted.\n\
                [1/2/24, 10:01:00 AM] Alice: hi";
    assert_eq!(parse(text).len(), 2);

    let config = ChatlensConfig::new().with_parse(ParseConfig::new().with_skip_system_messages(true));
    let parsed = ChatPipeline::new().with_config(config).parse_builtin(text).unwrap();
    assert_eq!(parsed.messages.len(), 1);
    assert_eq!(parsed.skipped_system, 1);
}

#[test]
fn test_url_and_emoji_stripping_is_configurable() {
    let text = "[1/2/24, 10:00:00 AM] Alice: look https://example.com 🎉 nice";
    assert_eq!(parse(text)[0].message, "look   nice");

    let config = ChatlensConfig::new().with_parse(
        ParseConfig::new()
            .with_strip_urls(false)
            .with_strip_emoji(false),
    );
    let parsed = ChatPipeline::new().with_config(config).parse_builtin(text).unwrap();
    assert_eq!(parsed.messages[0].message, "look https://example.com 🎉 nice");
}

// =========================================================================
// Custom patterns
// =========================================================================

#[test]
fn test_pattern_missing_group_rejected() {
    let err = Pattern::new("bad", r"^(?<user>\w+): (?<message>.*)$", DateOrder::Auto).unwrap_err();
    assert!(matches!(err, ChatlensError::InvalidPattern { .. }));
}

#[test]
fn test_custom_pattern_continuations() {
    let pattern = Pattern::new(
        "irc",
        r"^\[(?<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2})\] (?<user>\w+)> (?<message>.*)$",
        DateOrder::YearFirst,
    )
    .unwrap();
    let text = "[2024-05-01 09:00] alice> morning\n  still here\n[2024-05-01 09:05] bob> hey";
    let parsed = ChatPipeline::new().parse_with_pattern(text, &pattern);
    assert_eq!(parsed.messages.len(), 2);
    assert_eq!(parsed.messages[0].message, "morning\n  still here");
}

#[test]
fn test_builtin_grammar_names_are_unique() {
    let mut names: Vec<&str> = BuiltinGrammar::all().iter().map(|g| g.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), BuiltinGrammar::all().len());
}

// =========================================================================
// Analytics boundaries
// =========================================================================

#[test]
fn test_empty_input_analytics() {
    let err = analyze_words(&[], &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, ChatlensError::InsufficientParticipants { found: 0 }));

    let series = aggregate_by_period(&[], PeriodUnit::Week, Measure::WordCount);
    assert!(series.is_empty());

    let metrics = ChatMetrics::compute(&[]);
    assert_eq!(metrics.most_common_message, None);
    assert_eq!(metrics.video_call_time(), "00:00:00");
}

#[test]
fn test_sunday_belongs_to_previous_week() {
    let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 0).unwrap();
    let monday = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
    let messages = vec![
        ChatMessage::new("Alice", "one", sunday),
        ChatMessage::new("Alice", "two", monday),
    ];
    let series = aggregate_by_period(&messages, PeriodUnit::Week, Measure::MessageCount);
    let keys: Vec<&str> = series.buckets.iter().map(|b| b.period_key.as_str()).collect();
    assert_eq!(keys, vec!["2024-01-01", "2024-01-08"]);
}

#[test]
fn test_months_across_year_boundary() {
    let messages = vec![
        ChatMessage::new("Alice", "new year", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap()),
        ChatMessage::new("Bob", "old year", Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap()),
    ];
    let series = aggregate_by_period(&messages, PeriodUnit::Month, Measure::WordCount);
    let keys: Vec<&str> = series.buckets.iter().map(|b| b.period_key.as_str()).collect();
    assert_eq!(keys, vec!["2023-12", "2024-01"]);
    assert_eq!(series.bucket("2023-12").unwrap().get("Alice"), Some(0.0));
}

#[test]
fn test_sparse_sentiment_bucket_is_omitted() {
    let ts = |day| Utc.with_ymd_and_hms(2024, 2, day, 12, 0, 0).unwrap();
    let messages = vec![
        ChatMessage::new("Alice", "a", ts(5)).with_sentiment_score(4.0),
        ChatMessage::new("Bob", "b", ts(6)).with_sentiment_score(-2.0),
        ChatMessage::new("Alice", "c", ts(13)).with_sentiment_score(9.0),
    ];
    let series = aggregate_by_period(&messages, PeriodUnit::Week, Measure::Sentiment { min_samples: 2 });
    assert_eq!(series.buckets.len(), 1);
    assert_eq!(series.buckets[0].period_key, "2024-02-05");
    assert_eq!(series.buckets[0].get("Bob"), Some(-2.0));
}

#[test]
fn test_third_speaker_does_not_shift_ranking() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let messages = vec![
        ChatMessage::new("Alice", "apple", ts),
        ChatMessage::new("Bob", "banana", ts),
        ChatMessage::new("Carol", "apple apple apple", ts),
    ];
    let words = analyze_words(&messages, &AnalysisConfig::default()).unwrap();
    assert_eq!(words.top_words1[0].text, "apple");
    assert!((words.top_words1[0].value - 2.0).abs() < f64::EPSILON);
}
