//! End-to-end tests: raw transcript text through parsing and analytics.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatlens::audit::{DirAuditStore, document_id};
use chatlens::output::{OutputFormat, write_to_format};
use chatlens::prelude::*;
use serde_json::json;

const THREE_MESSAGES: &str = "[1/2/24, 10:00:00 AM] Alice: hello there\n\
                              [1/2/24, 10:00:05 AM] Bob: hi Alice\n\
                              [1/2/24, 10:00:10 AM] Alice: how are you";

const PIPE_LOG: &str = "chat export v2\n\
                        Alice | 2024/03/04 09:15 | good morning\n\
                        Bob | 2024/03/04 09:16 | morning!\n\
                        still waking up\n\
                        Alice | 2024/03/11 20:00 | love this song\n\
                        Bob | 2024/03/11 20:05 | hate it honestly";

const PIPE_GRAMMAR: &str = r"^(?<user>[^|]+?) \| (?<timestamp>\d{4}/\d{2}/\d{2} \d{2}:\d{2}) \| (?<message>.*)$";

// =========================================================================
// Scripted labeling service
// =========================================================================

/// Answers every task the way a well-behaved model would.
///
/// Grammar requests get [`PIPE_GRAMMAR`]; sentiment is keyword based;
/// personality always votes Alice INTJ and Bob ENFP. Any prompt containing
/// `unreachable` fails with a transport error.
struct Scripted {
    calls: AtomicUsize,
    grammar: Option<&'static str>,
}

impl Scripted {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            grammar: Some(PIPE_GRAMMAR),
        }
    }

    fn without_grammar() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            grammar: None,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelingService for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn label(&self, request: &LabelRequest) -> std::result::Result<LabelResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.prompt.contains("unreachable") {
            return Err(ServiceError::transport("connection refused"));
        }
        match request.task {
            LabelTask::Grammar => match self.grammar {
                Some(pattern) => Ok(LabelResponse::Structured(json!({
                    "user1": "Alice",
                    "user2": "Bob",
                    "regex_pattern": pattern,
                }))),
                None => Err(ServiceError::transport("model overloaded")),
            },
            LabelTask::Sentiment => {
                let score = if request.prompt.contains("love") {
                    8.0
                } else if request.prompt.contains("hate") {
                    -7.0
                } else {
                    1.0
                };
                Ok(LabelResponse::Text(format!(
                    "```json\n{{\"score\": {score}, \"sentiment\": \"scored\"}}\n```"
                )))
            }
            LabelTask::Personality => Ok(LabelResponse::Text("1. Alice: INTJ\n2. **bob**: enfp".into())),
            LabelTask::Custom(_) => Err(ServiceError::malformed("unexpected task")),
        }
    }
}

// =========================================================================
// Parsing
// =========================================================================

#[test]
fn test_three_message_example() {
    let pipeline = ChatPipeline::new();
    let parsed = pipeline.parse_builtin(THREE_MESSAGES).unwrap();

    assert_eq!(parsed.messages.len(), 3);
    assert_eq!(parsed.headers, 3);
    assert_eq!(parsed.messages[1].user, "Bob");
    assert_eq!(parsed.messages[2].timestamp.to_rfc3339(), "2024-01-02T10:00:10+00:00");

    let words = pipeline.analyze_words(&parsed.messages).unwrap();
    assert_eq!(words.person1, "Alice");
    assert_eq!(words.person2, "Bob");
    for word in ["hello", "there", "how", "are", "you"] {
        assert!((words.ratio(word) - 2.0).abs() < f64::EPSILON, "{word}");
    }
    assert!((words.ratio("hi") - 0.5).abs() < f64::EPSILON);
    assert!(words.top_words1.iter().all(|w| w.value >= 1.0));
    assert!(words.top_words2.iter().all(|w| w.value >= 1.0));
}

#[tokio::test]
async fn test_builtin_grammar_needs_no_service() {
    let service = Arc::new(Scripted::new());
    let pipeline = ChatPipeline::new().with_service(service.clone());

    let parsed = pipeline.parse(THREE_MESSAGES).await.unwrap();
    assert!(matches!(
        parsed.origin,
        GrammarOrigin::BuiltIn {
            grammar: BuiltinGrammar::WhatsAppBracketed
        }
    ));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_fallback_inference_end_to_end() {
    let service = Arc::new(Scripted::new());
    let audit = Arc::new(MemoryAuditStore::new());
    let pipeline = ChatPipeline::new()
        .with_service(service.clone())
        .with_audit(audit.clone());

    let parsed = pipeline.parse(PIPE_LOG).await.unwrap();

    assert_eq!(
        parsed.origin,
        GrammarOrigin::Inferred {
            speaker_a: "Alice".into(),
            speaker_b: "Bob".into()
        }
    );
    assert_eq!(parsed.messages.len(), 4);
    assert_eq!(parsed.orphan_lines, 1);
    assert_eq!(parsed.messages[1].message, "morning!\nstill waking up");
    assert_eq!(parsed.date_order, DateOrder::YearFirst);

    let key = format!("patterns/{}.json", document_id(PIPE_LOG));
    let record: serde_json::Value = serde_json::from_slice(&audit.get(&key).unwrap()).unwrap();
    assert_eq!(record["pattern"], PIPE_GRAMMAR);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_inference_failure_yields_no_messages() {
    let audit = Arc::new(MemoryAuditStore::new());
    let pipeline = ChatPipeline::new()
        .with_service(Arc::new(Scripted::without_grammar()))
        .with_audit(audit.clone());

    let err = pipeline.parse(PIPE_LOG).await.unwrap_err();

    assert!(matches!(err, ChatlensError::NoPatternMatched { .. }));
    assert!(err.is_unparsable());
    assert_eq!(err.stage(), PipelineStage::Inference);
    assert_eq!(audit.keys(), vec![format!("unparsable/{}.json", document_id(PIPE_LOG))]);
}

#[tokio::test]
async fn test_dir_audit_store_is_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirAuditStore::new(dir.path()));
    let pipeline = ChatPipeline::new()
        .with_service(Arc::new(Scripted::new()))
        .with_audit(store);

    pipeline.parse(PIPE_LOG).await.unwrap();
    let path = dir
        .path()
        .join("patterns")
        .join(format!("{}.json", document_id(PIPE_LOG)));
    let first = std::fs::read_to_string(&path).unwrap();

    // A fresh pipeline re-infers, but the stored record is kept
    let again = ChatPipeline::new()
        .with_service(Arc::new(Scripted::new()))
        .with_audit(Arc::new(DirAuditStore::new(dir.path())));
    again.parse(PIPE_LOG).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
}

#[tokio::test]
async fn test_documents_do_not_share_inferred_grammar() {
    // Both documents share a prefix longer than the inference sample
    let mut shared = format!("{PIPE_LOG}\n");
    for i in 0..100 {
        shared.push_str(&format!("Alice | 2024/03/18 10:{:02} | filler line {i}\n", i % 60));
    }
    assert!(shared.chars().count() > InferenceConfig::default().sample_chars);
    let first = format!("{shared}Bob | 2024/03/25 10:00 | ending one");
    let second = format!("{shared}Bob | 2024/03/25 11:00 | ending two");

    let service = Arc::new(Scripted::new());
    let audit = Arc::new(MemoryAuditStore::new());
    let pipeline = ChatPipeline::new()
        .with_service(service.clone())
        .with_audit(audit.clone());

    let a = pipeline.parse(&first).await.unwrap();
    let b = pipeline.parse(&second).await.unwrap();

    assert_eq!(service.calls(), 2);
    assert_ne!(a.document_id, b.document_id);
    assert_eq!(b.messages.last().unwrap().message, "ending two");
    assert_eq!(audit.keys().len(), 2);
}

#[tokio::test]
async fn test_parse_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.txt");
    std::fs::write(&path, THREE_MESSAGES).unwrap();

    let parsed = ChatPipeline::new().parse_file(&path).await.unwrap();
    assert_eq!(parsed.messages.len(), 3);
    assert_eq!(parsed.document_id, document_id(THREE_MESSAGES));
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let err = ChatPipeline::new()
        .parse_file("/nonexistent/chat.txt")
        .await
        .unwrap_err();
    assert!(err.is_io());
}

// =========================================================================
// Analytics
// =========================================================================

#[test]
fn test_single_speaker() {
    let text = "[1/2/24, 10:00:00 AM] Alice: note to self\n\
                [1/9/24, 10:00:00 AM] Alice: another note";
    let pipeline = ChatPipeline::new();
    let parsed = pipeline.parse_builtin(text).unwrap();

    let err = pipeline.analyze_words(&parsed.messages).unwrap_err();
    assert!(err.is_insufficient_participants());

    let weekly = aggregate_by_period(&parsed.messages, PeriodUnit::Week, Measure::MessageCount);
    assert_eq!(weekly.users, vec!["Alice"]);
    assert_eq!(weekly.buckets.len(), 2);
    assert_eq!(weekly.bucket("2024-01-08").unwrap().get("Alice"), Some(1.0));
}

#[tokio::test]
async fn test_sentiment_trend() {
    let service = Arc::new(Scripted::new());
    let config = ChatlensConfig::new().with_analysis(AnalysisConfig::new().with_min_sentiment_samples(2));
    let pipeline = ChatPipeline::new()
        .with_config(config)
        .with_service(service.clone());

    let mut messages = pipeline.parse(PIPE_LOG).await.unwrap().messages;
    let run = pipeline.score_sentiment(&mut messages).await.unwrap();

    assert_eq!(run.scored, 4);
    assert_eq!(run.failed, 0);
    assert_eq!(messages[2].sentiment_score, Some(8.0));
    assert_eq!(messages[3].sentiment_score, Some(-7.0));

    let trend = pipeline.sentiment_trend(&messages, PeriodUnit::Week);
    assert_eq!(trend.buckets.len(), 2);
    let second = trend.bucket("2024-03-11").unwrap();
    assert_eq!(second.get("Alice"), Some(8.0));
    assert_eq!(second.get("Bob"), Some(-7.0));

    // 1 grammar call + 4 sentiment calls
    assert_eq!(service.calls(), 5);
}

#[tokio::test]
async fn test_sentiment_failures_are_isolated() {
    let text = "[1/2/24, 10:00:00 AM] Alice: love it\n\
                [1/2/24, 10:01:00 AM] Bob: unreachable\n\
                [1/2/24, 10:02:00 AM] Alice: hate mondays";
    let pipeline = ChatPipeline::new().with_service(Arc::new(Scripted::new()));
    let mut messages = pipeline.parse_builtin(text).unwrap().messages;

    let run = pipeline.score_sentiment(&mut messages).await.unwrap();

    assert_eq!(run.scored, 2);
    assert_eq!(run.failed, 1);
    assert_eq!(run.failures[0].index, 1);
    assert_eq!(messages[1].sentiment_score, None);
    assert_eq!(messages[2].sentiment_score, Some(-7.0));
}

#[tokio::test]
async fn test_personality_votes() {
    let lines: Vec<String> = (0..40)
        .map(|i| {
            let user = if i % 2 == 0 { "Alice" } else { "Bob" };
            format!("[1/2/24, 10:{:02}:00 AM] {user}: message number {i}", i)
        })
        .collect();
    let text = lines.join("\n");

    let config = ChatlensConfig::new().with_analysis(
        AnalysisConfig::new()
            .with_personality_chunks(10)
            .with_min_messages_per_participant(2),
    );
    let pipeline = ChatPipeline::new()
        .with_config(config)
        .with_service(Arc::new(Scripted::new()));
    let messages = pipeline.parse_builtin(&text).unwrap().messages;

    let report = pipeline.infer_personalities(&messages).await.unwrap();

    assert_eq!(report.chunks, 10);
    assert_eq!(report.failed_chunks, 0);
    let alice = report.profile("Alice").unwrap();
    assert_eq!(alice.predicted_type, "INTJ");
    assert_eq!(alice.votes.len(), 10);
    assert!(alice.axes.iter().all(|axis| axis.significant));
    assert_eq!(report.profile("Bob").unwrap().predicted_type, "ENFP");
}

#[tokio::test]
async fn test_slow_service_times_out() {
    struct Slow;

    #[async_trait]
    impl LabelingService for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn label(&self, _request: &LabelRequest) -> std::result::Result<LabelResponse, ServiceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(LabelResponse::Text("{}".into()))
        }
    }

    let config = ChatlensConfig::new()
        .with_inference(InferenceConfig::new().with_request_timeout(Duration::from_millis(20)));
    let pipeline = ChatPipeline::new().with_config(config).with_service(Arc::new(Slow));

    let err = pipeline.parse(PIPE_LOG).await.unwrap_err();
    assert!(matches!(
        err,
        ChatlensError::NoPatternMatched { ref source } if source.is_timeout()
    ));
}

#[test]
fn test_metrics_over_parsed_chat() {
    let text = "[1/2/24, 10:00:00 AM] Alice: Missed video call\n\
                [1/2/24, 10:05:00 AM] Bob: Video call, 12 min\n\
                [1/2/24, 10:30:00 AM] Alice: ok\n\
                [1/2/24, 10:31:00 AM] Bob: ok";
    let parsed = ChatPipeline::new().parse_builtin(text).unwrap();
    let metrics = ChatMetrics::compute(&parsed.messages);

    assert_eq!(metrics.missed_calls, 1);
    assert_eq!(metrics.video_call_time(), "00:12:00");
    assert_eq!(metrics.most_common_message.as_deref(), Some("ok"));
    assert_eq!(metrics.most_common_count, 2);
}

// =========================================================================
// Output
// =========================================================================

#[test]
fn test_export_formats() {
    let parsed = ChatPipeline::new().parse_builtin(THREE_MESSAGES).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for format in OutputFormat::all() {
        let path = dir.path().join(format!("chat.{}", format.extension()));
        write_to_format(&parsed.messages, &path, *format).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("how are you"), "{format}");
    }
}
