//! Per-message sentiment scores from the labeling service.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::InferenceConfig;
use crate::inference::{
    ChunkFailure, LabelCache, LabelRequest, LabelTask, LabelingService, ResponseSchema, fan_out,
};
use crate::message::ChatMessage;

/// Lowest score a service may return.
pub const MIN_SCORE: f64 = -10.0;
/// Highest score a service may return.
pub const MAX_SCORE: f64 = 10.0;

const INSTRUCTIONS: &str = "You are a sentiment analysis expert. Analyze the sentiment of the given \
text and respond with a JSON object containing a 'score' (number between -10 and 10, where -10 is \
extremely negative, 0 is neutral, and 10 is extremely positive) and a 'sentiment' (string describing \
the sentiment).";

/// One validated sentiment answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentLabel {
    /// Score in `[-10, 10]`
    pub score: f64,
    /// Short description, never blank
    pub sentiment: String,
}

/// Schema every sentiment answer must satisfy.
pub fn sentiment_schema() -> ResponseSchema {
    ResponseSchema::new("sentiment")
        .number("score", MIN_SCORE, MAX_SCORE)
        .non_empty_string("sentiment")
}

/// Outcome of a scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentRun {
    /// Messages that received a score
    pub scored: usize,
    /// Messages whose request failed
    pub failed: usize,
    /// Messages not sent because they had no text
    pub skipped: usize,
    /// One slot per input message, in input order
    pub labels: Vec<Option<SentimentLabel>>,
    /// Failed requests; `index` is the position in the message slice
    pub failures: Vec<ChunkFailure>,
}

/// Scores every non-empty message and attaches the score to it.
///
/// Requests are independent: a failure leaves that message's
/// `sentiment_score` untouched and is recorded in the returned run.
pub async fn score_sentiment(
    service: &dyn LabelingService,
    cache: &dyn LabelCache,
    messages: &mut [ChatMessage],
    config: &InferenceConfig,
) -> SentimentRun {
    let schema = sentiment_schema();
    let targets: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, msg)| !msg.is_empty())
        .map(|(i, _)| i)
        .collect();
    let requests: Vec<LabelRequest> = targets
        .iter()
        .map(|&i| {
            LabelRequest::structured(
                LabelTask::Sentiment,
                format!("{INSTRUCTIONS}\n\n{}", messages[i].message),
                schema.clone(),
            )
        })
        .collect();

    let outcome = fan_out(service, cache, &requests, config, |response| {
        schema.decode::<SentimentLabel>(response.into_json()?)
    })
    .await;

    let mut labels: Vec<Option<SentimentLabel>> = vec![None; messages.len()];
    for (&target, label) in targets.iter().zip(outcome.results) {
        if let Some(label) = label {
            messages[target].sentiment_score = Some(label.score);
            labels[target] = Some(label);
        }
    }
    let failures: Vec<ChunkFailure> = outcome
        .failures
        .into_iter()
        .map(|f| ChunkFailure {
            index: targets[f.index],
            error: f.error,
        })
        .collect();

    let scored = labels.iter().filter(|l| l.is_some()).count();
    let run = SentimentRun {
        scored,
        failed: failures.len(),
        skipped: messages.len() - targets.len(),
        labels,
        failures,
    };
    info!(
        service = service.name(),
        scored = run.scored,
        failed = run.failed,
        skipped = run.skipped,
        "sentiment scoring finished"
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::inference::{LabelResponse, NoCache};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    /// Scores by keyword: "good" is 7, "bad" is -6, "weird" is out of range,
    /// "down" fails.
    struct Keywords;

    #[async_trait]
    impl LabelingService for Keywords {
        fn name(&self) -> &str {
            "keywords"
        }

        async fn label(&self, request: &LabelRequest) -> Result<LabelResponse, ServiceError> {
            assert_eq!(request.task, LabelTask::Sentiment);
            let text = request.prompt.rsplit("\n\n").next().unwrap_or_default();
            let body = if text.contains("down") {
                return Err(ServiceError::Unavailable("offline".into()));
            } else if text.contains("weird") {
                json!({"score": 42, "sentiment": "confused"})
            } else if text.contains("good") {
                json!({"score": 7, "sentiment": "positive"})
            } else if text.contains("bad") {
                json!({"score": -6, "sentiment": "negative"})
            } else {
                json!({"score": 0, "sentiment": "neutral"})
            };
            Ok(LabelResponse::Structured(body))
        }
    }

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::new("Alice", text, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_scores_attach_in_order() {
        let mut messages = vec![msg("good day"), msg("bad day"), msg("meh")];
        let run = score_sentiment(&Keywords, &NoCache, &mut messages, &InferenceConfig::new()).await;

        assert_eq!(run.scored, 3);
        assert_eq!(messages[0].sentiment_score, Some(7.0));
        assert_eq!(messages[1].sentiment_score, Some(-6.0));
        assert_eq!(messages[2].sentiment_score, Some(0.0));
        assert_eq!(run.labels[1].as_ref().map(|l| l.sentiment.as_str()), Some("negative"));
    }

    #[tokio::test]
    async fn test_failures_leave_score_unset() {
        let mut messages = vec![msg("good"), msg("weird"), msg("down"), msg("bad")];
        let run = score_sentiment(&Keywords, &NoCache, &mut messages, &InferenceConfig::new()).await;

        assert_eq!(run.scored, 2);
        assert_eq!(run.failed, 2);
        assert!(messages[1].sentiment_score.is_none());
        assert!(messages[2].sentiment_score.is_none());
        let indices: Vec<usize> = run.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(matches!(run.failures[0].error, ServiceError::OutOfRange { .. }));
    }

    #[tokio::test]
    async fn test_empty_messages_are_skipped() {
        let mut messages = vec![msg(""), msg("down"), msg("good")];
        let run = score_sentiment(&Keywords, &NoCache, &mut messages, &InferenceConfig::new()).await;

        assert_eq!(run.skipped, 1);
        assert_eq!(run.failures[0].index, 1);
        assert_eq!(messages[2].sentiment_score, Some(7.0));
        assert_eq!(run.labels.len(), 3);
    }

    #[test]
    fn test_schema_bounds() {
        let schema = sentiment_schema();
        assert!(schema.validate(&json!({"score": -10, "sentiment": "x"})).is_ok());
        assert!(schema.validate(&json!({"score": 10.5, "sentiment": "x"})).is_err());
        assert!(schema.validate(&json!({"score": 1, "sentiment": "  "})).is_err());
    }
}
