//! Batch upload and the drain cycle.
//!
//! One drain cycle runs per `Flushing` transition of the scheduler: read the
//! oldest batch, POST it, acknowledge on success, repeat until the queue is
//! empty or an upload fails. A failure stops the cycle immediately and leaves
//! everything unacknowledged — retry cadence is driven entirely by future
//! flush triggers, there is no internal backoff loop.

use serde_json::{json, Value};

use crate::error::PipelineError;
use crate::queue::{EventQueue, QueuedEvent};

/// Ingest endpoint path appended to the configured API host.
pub(crate) const ENDPOINT_PATH: &str = "v1/humio";

/// Maximum number of events in one upload batch.
pub const MAX_BATCH: i64 = 50;

/// Serializes batches into the wire format and submits them.
#[derive(Clone)]
pub struct Uploader {
    http: reqwest::Client,
    endpoint: String,
}

impl Uploader {
    /// Creates an uploader posting to the given full endpoint URL.
    pub fn new(endpoint: String) -> Self {
        Self {
            http: build_http_client(),
            endpoint,
        }
    }

    /// Submits one batch to the ingest endpoint.
    ///
    /// Wire format: an outer array holding one object whose `events` array
    /// carries the batch's envelopes in queue order. A queued row whose JSON
    /// no longer parses is skipped with a warning; it is still covered by the
    /// batch's acknowledgement so one corrupt row cannot wedge the queue.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Network` on transport failure and
    /// `PipelineError::HttpStatus` on a non-2xx response.
    pub async fn post_batch(&self, batch: &[QueuedEvent]) -> Result<(), PipelineError> {
        let mut events = Vec::with_capacity(batch.len());
        for record in batch {
            match serde_json::from_str::<Value>(&record.json) {
                Ok(envelope) => events.push(envelope),
                Err(error) => {
                    tracing::warn!(id = record.id, %error, "skipping unparseable queued event");
                }
            }
        }

        let payload = json!([{ "events": events }]);

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PipelineError::HttpStatus(status))
        }
    }
}

/// Build the shared reqwest client. No request timeout is imposed beyond the
/// transport's own defaults; a hang stalls the single flush worker, which is
/// the documented tradeoff.
fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("Beacon/", env!("CARGO_PKG_VERSION"), " rust-sdk"))
        .build()
        .unwrap_or_default()
}

/// Runs one full drain cycle: read → upload → acknowledge, looping while the
/// backlog lasts, stopping on the first failure of any step.
///
/// Acknowledgement always uses the batch's highest id and only happens after
/// a full-batch success response, so a batch is never partially acknowledged.
pub(crate) async fn drain(queue: &EventQueue, uploader: &Uploader) {
    loop {
        let reader = queue.clone();
        let batch = match tokio::task::spawn_blocking(move || reader.read_batch(MAX_BATCH)).await {
            Ok(Ok(batch)) => batch,
            Ok(Err(error)) => {
                tracing::error!(%error, "failed to read event batch, stopping flush cycle");
                return;
            }
            Err(error) => {
                tracing::error!(%error, "batch read task failed, stopping flush cycle");
                return;
            }
        };

        let Some(last) = batch.last() else {
            // Queue drained; cycle complete.
            return;
        };
        let up_to_id = last.id;

        if let Err(error) = uploader.post_batch(&batch).await {
            tracing::warn!(%error, count = batch.len(), "upload failed, leaving batch queued for retry");
            return;
        }

        let acker = queue.clone();
        match tokio::task::spawn_blocking(move || acker.acknowledge(up_to_id)).await {
            Ok(Ok(deleted)) => {
                tracing::debug!(deleted, up_to_id, "batch delivered and acknowledged");
            }
            Ok(Err(error)) => {
                tracing::error!(%error, up_to_id, "failed to acknowledge delivered batch, stopping flush cycle");
                return;
            }
            Err(error) => {
                tracing::error!(%error, "acknowledge task failed, stopping flush cycle");
                return;
            }
        }
    }
}
