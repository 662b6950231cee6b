//! Resolution of completed human-review results.
//!
//! Review results land as JSON objects in storage; a notification batch
//! points at them. Each result resolves its suspended workflow step
//! exactly once - with the reviewed fields on success, or with a
//! structured failure. Duplicate deliveries are an upstream concern:
//! resume calls against an already-completed token are rejected there.

use std::sync::Arc;

use thiserror::Error;

use crate::clients::{ClientError, ObjectStore, WorkflowOrchestrator};
use crate::models::{ReviewTaskResult, ReviewedFields, StorageEventBatch, StorageEventRecord};

/// Ways a completed review can fail to produce usable fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("no human responses")]
    NoAnswers,

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

impl ReviewError {
    /// Error kind name reported to the orchestrator.
    pub fn kind(&self) -> &'static str {
        match self {
            ReviewError::NoAnswers => "ReviewFailed",
            ReviewError::MissingField(_) => "MalformedReviewResponse",
        }
    }
}

/// What happened to one record of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Resumed,
    Failed,
    Skipped,
}

/// Tallies for one processed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStats {
    pub resumed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Resolves review results back into the workflow.
pub struct ReviewResolver {
    store: Arc<dyn ObjectStore>,
    orchestrator: Arc<dyn WorkflowOrchestrator>,
}

impl ReviewResolver {
    pub fn new(store: Arc<dyn ObjectStore>, orchestrator: Arc<dyn WorkflowOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Process a storage-notification batch. One bad record never aborts
    /// the rest of the batch.
    pub async fn process_batch(&self, batch: &StorageEventBatch) -> ReviewStats {
        let mut stats = ReviewStats::default();
        for record in &batch.records {
            if !record.key.ends_with(".json") {
                tracing::debug!(
                    bucket = %record.bucket,
                    key = %record.key,
                    "skipping non-json object"
                );
                stats.skipped += 1;
                continue;
            }
            tracing::info!(
                event_time = %record.event_time,
                bucket = %record.bucket,
                key = %record.key,
                "processing review result"
            );
            match self.process_record(record).await {
                Ok(Resolution::Resumed) => stats.resumed += 1,
                Ok(Resolution::Failed) => stats.failed += 1,
                Ok(Resolution::Skipped) => stats.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        bucket = %record.bucket,
                        key = %record.key,
                        error = %e,
                        "error processing review result, moving to next record"
                    );
                    stats.skipped += 1;
                }
            }
        }
        stats
    }

    async fn process_record(&self, record: &StorageEventRecord) -> Result<Resolution, ClientError> {
        let raw = self.store.get_json(&record.bucket, &record.key).await?;
        let result: ReviewTaskResult = serde_json::from_value(raw)
            .map_err(|e| ClientError::Malformed(format!("{}/{}: {e}", record.bucket, record.key)))?;

        let Some(token) = result.input_content.task_token.clone() else {
            tracing::warn!(
                bucket = %record.bucket,
                key = %record.key,
                "missing resume token, ignoring result"
            );
            return Ok(Resolution::Skipped);
        };

        match extract_reviewed_fields(&result) {
            Ok(fields) => {
                let output = serde_json::to_value(&fields)
                    .map_err(|e| ClientError::Malformed(e.to_string()))?;
                self.orchestrator.resume(&token, &output).await?;
                tracing::info!("notified task complete");
                Ok(Resolution::Resumed)
            }
            Err(err) => {
                self.orchestrator
                    .fail(&token, err.kind(), &err.to_string())
                    .await?;
                tracing::info!(kind = err.kind(), "notified task failed");
                Ok(Resolution::Failed)
            }
        }
    }
}

/// Pull the reviewed fields out of the first human answer.
///
/// Single-fold review is assumed, so only the first answer is consulted.
fn extract_reviewed_fields(result: &ReviewTaskResult) -> Result<ReviewedFields, ReviewError> {
    let answer = result.human_answers.first().ok_or(ReviewError::NoAnswers)?;
    let content = &answer.answer_content;
    Ok(ReviewedFields {
        date: content.date.clone().ok_or(ReviewError::MissingField("date"))?,
        total: content
            .total
            .clone()
            .ok_or(ReviewError::MissingField("total"))?,
        vendor: content
            .vendor
            .clone()
            .ok_or(ReviewError::MissingField("vendor"))?,
        worker_id: answer
            .worker_id
            .clone()
            .ok_or(ReviewError::MissingField("workerId"))?,
    })
}
