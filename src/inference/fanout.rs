//! Ordered concurrent dispatch.
//!
//! [`fan_out`] sends a batch of independent requests with bounded
//! concurrency and hands back one slot per request, in request order. A
//! failed or timed-out request leaves its slot empty and is listed in
//! [`FanOut::failures`]; the other requests are unaffected.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::cache::{LabelCache, request_signature};
use super::{LabelRequest, LabelResponse, LabelingService};
use crate::config::InferenceConfig;
use crate::error::ServiceError;

/// A request that produced no result.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    /// Position of the request in the batch
    pub index: usize,
    /// Why it failed
    pub error: ServiceError,
}

impl Serialize for ChunkFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ChunkFailure", 2)?;
        s.serialize_field("index", &self.index)?;
        s.serialize_field("error", &self.error.to_string())?;
        s.end()
    }
}

/// Results of a batch, one slot per request.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOut<T> {
    /// Decoded results in request order; `None` where the request failed
    pub results: Vec<Option<T>>,
    /// Failed requests, ascending by index
    pub failures: Vec<ChunkFailure>,
}

impl<T> FanOut<T> {
    /// Number of requests that succeeded.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    /// Returns true if every request failed.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.succeeded() == 0
    }
}

/// Sends one request through the cache and the deadline.
pub async fn call_service(
    service: &dyn LabelingService,
    cache: &dyn LabelCache,
    request: &LabelRequest,
    config: &InferenceConfig,
) -> Result<LabelResponse, ServiceError> {
    let key = request_signature(request);
    if let Some(hit) = cache.get(&key) {
        debug!(task = request.task.as_str(), "label cache hit");
        return Ok(hit);
    }

    let response = match timeout(config.request_timeout, service.label(request)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ServiceError::Timeout {
                after: config.request_timeout,
            });
        }
    };

    cache.insert(key, response.clone());
    Ok(response)
}

/// Dispatches `requests` concurrently and decodes each answer.
///
/// At most `config.max_concurrency` requests are in flight. Answers are
/// cached before decoding, so a later identical request in the same run
/// reuses them.
pub async fn fan_out<T, F>(
    service: &dyn LabelingService,
    cache: &dyn LabelCache,
    requests: &[LabelRequest],
    config: &InferenceConfig,
    decode: F,
) -> FanOut<T>
where
    F: Fn(LabelResponse) -> Result<T, ServiceError>,
{
    let decode = &decode;
    let outcomes: Vec<Result<T, ServiceError>> = stream::iter(requests.iter().map(|request| async move {
        let response = call_service(service, cache, request, config).await?;
        decode(response)
    }))
    .buffered(config.max_concurrency.max(1))
    .collect()
    .await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => results.push(Some(value)),
            Err(error) => {
                warn!(
                    service = service.name(),
                    index,
                    error = %error,
                    "labeling request failed, continuing without it"
                );
                failures.push(ChunkFailure { index, error });
                results.push(None);
            }
        }
    }

    debug!(
        service = service.name(),
        requests = requests.len(),
        failed = failures.len(),
        "fan-out complete"
    );

    FanOut { results, failures }
}
