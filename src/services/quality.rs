//! Quality-gate consumer for the image classification collaborator.
//!
//! The classifier itself is a black box returning class labels; this
//! service only judges the verdict. An acceptable image comes back with
//! its source fields preserved for the rest of the workflow, so the
//! interface stays compatible with gates that also enhance the image.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::{object_uri, ClientError, QualityClassifier, QualityLabel};
use crate::models::PreservedInput;

/// Label classes the gate understands; anything else is a model fault.
const LABEL_CLASSES: [&str; 2] = ["bad", "good"];

/// Classes that pass the gate.
const ACCEPTABLE_CLASSES: [&str; 1] = ["good"];

#[derive(Debug, Error)]
pub enum GateError {
    #[error("missing field {0}, please check your input payload")]
    MalformedRequest(&'static str),

    #[error("classifier error: {0}")]
    Model(String),

    #[error("poor quality image: {0}")]
    PoorQuality(String),
}

impl GateError {
    /// Error kind name reported to the orchestrator.
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::MalformedRequest(_) => "MalformedRequest",
            GateError::Model(_) => "ModelError",
            GateError::PoorQuality(_) => "PoorQualityImage",
        }
    }
}

/// Request to gate one uploaded image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GateRequest {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// A passed gate, with the source fields preserved for later steps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GateOutcome {
    pub bucket: String,
    pub key: String,
    pub uri: String,
    pub top_label: QualityLabel,
    /// Initial inputs carried through the workflow state; later lifecycle
    /// events derive source locators from this.
    pub input: PreservedInput,
}

/// Judges classifier verdicts for uploaded images.
pub struct QualityGate {
    classifier: Arc<dyn QualityClassifier>,
}

impl QualityGate {
    pub fn new(classifier: Arc<dyn QualityClassifier>) -> Self {
        Self { classifier }
    }

    pub async fn check(&self, request: &GateRequest) -> Result<GateOutcome, GateError> {
        let bucket = request
            .bucket
            .as_deref()
            .ok_or(GateError::MalformedRequest("Bucket"))?;
        let key = request
            .key
            .as_deref()
            .ok_or(GateError::MalformedRequest("Key"))?;

        tracing::info!(bucket, key, "gating image quality");

        let labels = self
            .classifier
            .classify(bucket, key)
            .await
            .map_err(|e| GateError::Model(e.to_string()))?;

        if labels.is_empty() {
            return Err(GateError::PoorQuality("classifier returned no labels".into()));
        }

        // Labels arrive sorted by descending confidence, so the first
        // recognized class is the most confident one.
        let top = labels
            .iter()
            .find(|label| LABEL_CLASSES.contains(&label.name.as_str()))
            .ok_or_else(|| {
                GateError::Model(format!(
                    "classifier returned {} labels, none in expected classes {:?}",
                    labels.len(),
                    LABEL_CLASSES
                ))
            })?;

        if !ACCEPTABLE_CLASSES.contains(&top.name.as_str()) {
            return Err(GateError::PoorQuality(format!(
                "image labelled as '{}'",
                top.name
            )));
        }

        let uri = object_uri(bucket, key);
        Ok(GateOutcome {
            bucket: bucket.to_string(),
            key: key.to_string(),
            uri: uri.clone(),
            top_label: top.clone(),
            input: PreservedInput {
                bucket: bucket.to_string(),
                key: key.to_string(),
                uri: Some(uri),
            },
        })
    }
}
