//! The end-to-end digitization pass.
//!
//! Loads a stored document-analysis result, extracts field candidates,
//! falls back to entity extraction when no date was found, aggregates
//! confidences, and either auto-accepts or dispatches a human-review
//! task carrying the resume token of the suspended workflow step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clients::{
    object_uri, ClientError, EntityRecognizer, ObjectStore, ReviewDispatcher,
};
use crate::models::{AnalysisResult, ExtractionOutcome, ReviewInputContent, Route};

use super::entities::date_candidates_from_text;
use super::extraction::extract_candidates;
use super::routing::{aggregate, RoutedOutcome};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing field {0}, please check your input payload")]
    MalformedRequest(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PipelineError {
    /// Error kind name reported to the orchestrator.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedRequest(_) => "MalformedRequest",
            PipelineError::Client(_) => "ModelError",
        }
    }
}

/// Request for one extraction pass over a stored analysis result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DigitizeRequest {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    /// Resume token of the suspended workflow step, forwarded to the
    /// review task when routing there.
    #[serde(default)]
    pub task_token: Option<String>,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DigitizeResponse {
    #[serde(flatten)]
    pub outcome: ExtractionOutcome,
    pub routing: Route,
}

/// Pipeline configuration supplied by the caller.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Composite confidence at or above which results auto-accept.
    pub confidence_threshold: f64,
    /// Language code for the entity-recognition collaborator.
    pub language: String,
}

/// One receipt digitization pass, wired to its collaborators.
pub struct ReceiptPipeline {
    store: Arc<dyn ObjectStore>,
    recognizer: Arc<dyn EntityRecognizer>,
    dispatcher: Arc<dyn ReviewDispatcher>,
    options: PipelineOptions,
}

impl ReceiptPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        recognizer: Arc<dyn EntityRecognizer>,
        dispatcher: Arc<dyn ReviewDispatcher>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            recognizer,
            dispatcher,
            options,
        }
    }

    pub async fn digitize(
        &self,
        request: &DigitizeRequest,
    ) -> Result<DigitizeResponse, PipelineError> {
        let bucket = request
            .bucket
            .as_deref()
            .ok_or(PipelineError::MalformedRequest("Bucket"))?;
        let key = request
            .key
            .as_deref()
            .ok_or(PipelineError::MalformedRequest("Key"))?;

        let raw = self.store.get_json(bucket, key).await?;
        let analysis: AnalysisResult = serde_json::from_value(raw)
            .map_err(|e| ClientError::Malformed(format!("analysis result {bucket}/{key}: {e}")))?;

        let mut set = extract_candidates(&analysis);

        if set.dates.is_empty() {
            tracing::info!(
                bucket,
                key,
                "no date in key/value fields, falling back to entity extraction"
            );
            set.dates = date_candidates_from_text(
                self.recognizer.as_ref(),
                &set.free_text,
                &self.options.language,
            )
            .await?;
        }

        let RoutedOutcome { outcome, route } =
            aggregate(set, self.options.confidence_threshold);

        tracing::info!(
            bucket,
            key,
            confidence = outcome.confidence,
            route = ?route,
            "extraction pass complete"
        );

        if route == Route::HumanReview {
            self.dispatch_review(bucket, key, &outcome, request.task_token.as_deref())
                .await?;
        }

        Ok(DigitizeResponse { outcome, routing: route })
    }

    async fn dispatch_review(
        &self,
        bucket: &str,
        key: &str,
        outcome: &ExtractionOutcome,
        task_token: Option<&str>,
    ) -> Result<(), PipelineError> {
        let Some(token) = task_token else {
            tracing::warn!(
                bucket,
                key,
                "review routing decided but request carries no resume token, not dispatching"
            );
            return Ok(());
        };

        let task_name = Uuid::new_v4().to_string();
        let input = ReviewInputContent {
            task_token: Some(token.to_string()),
            task_object: Some(object_uri(bucket, key)),
            vendor: Some(outcome.vendor.value.clone()),
            date: Some(outcome.date.value.clone()),
            total: Some(outcome.total.value.clone()),
        };
        self.dispatcher.start_review(&task_name, &input).await?;
        tracing::info!(task_name, "human review task dispatched");
        Ok(())
    }
}
