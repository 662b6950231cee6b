//! Collaborator interfaces for external services.
//!
//! Every external touchpoint is a trait, constructed once and passed into
//! each component as an `Arc<dyn ...>` handle so tests can substitute
//! fakes. No collaborator call is retried here; retry policy belongs to
//! the invoking orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AnalysisResult, OwnershipRecord, ReviewInputContent};

pub mod local;
pub mod regex_entities;

pub use local::{
    FsObjectStore, FsOwnershipTable, FsReviewDispatcher, LogNotificationChannel,
    OutboxOrchestrator, SidecarAnalyzer, SidecarClassifier,
};
pub use regex_entities::RegexEntityRecognizer;

/// Errors surfaced by collaborator calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("collaborator error: {0}")]
    Model(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Locator for an object held by the storage collaborator.
pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

/// A class label returned by the image quality classifier, with a 0-100
/// confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QualityLabel {
    pub name: String,
    pub confidence: f64,
}

/// Kind of entity detected in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Date,
    Organization,
    Quantity,
    #[serde(other)]
    Other,
}

/// An entity detected in free text. Scores are on the recognizer's native
/// 0-1 scale; callers normalize at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedEntity {
    #[serde(rename = "Type")]
    pub entity_type: EntityType,
    pub text: String,
    pub score: f64,
}

/// Object storage: JSON records by (bucket, key).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_json(&self, bucket: &str, key: &str) -> Result<serde_json::Value, ClientError>;

    async fn put_json(
        &self,
        bucket: &str,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<(), ClientError>;
}

/// Black-box image quality classifier.
#[async_trait]
pub trait QualityClassifier: Send + Sync {
    /// Label an image by (bucket, key), most confident label first.
    async fn classify(&self, bucket: &str, key: &str) -> Result<Vec<QualityLabel>, ClientError>;
}

/// Black-box document-analysis (OCR) service.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, bucket: &str, key: &str) -> Result<AnalysisResult, ClientError>;
}

/// Entity recognition over free text.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn detect_entities(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Vec<DetectedEntity>, ClientError>;
}

/// Human-review task dispatch. Completion is delivered asynchronously as
/// a result object written to storage, not through this interface.
#[async_trait]
pub trait ReviewDispatcher: Send + Sync {
    /// Start a review task. `task_name` must be unique per dispatch.
    async fn start_review(
        &self,
        task_name: &str,
        input: &ReviewInputContent,
    ) -> Result<(), ClientError>;
}

/// The workflow orchestrator's resume/fail surface for suspended steps.
#[async_trait]
pub trait WorkflowOrchestrator: Send + Sync {
    async fn resume(&self, token: &str, output: &serde_json::Value) -> Result<(), ClientError>;

    async fn fail(&self, token: &str, error: &str, cause: &str) -> Result<(), ClientError>;
}

/// Fire-and-forget notification publish; no delivery confirmation is
/// awaited.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, channel: &str, payload: &serde_json::Value)
        -> Result<(), ClientError>;
}

/// Durable key-value store for ownership records. Entries carry their own
/// expiry timestamp, interpreted by the store's reaping.
#[async_trait]
pub trait OwnershipTable: Send + Sync {
    async fn get(&self, execution_id: &str) -> Result<Option<OwnershipRecord>, ClientError>;

    async fn put(&self, record: &OwnershipRecord) -> Result<(), ClientError>;
}
