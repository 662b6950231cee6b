//! Document-analysis invocation and result delivery.
//!
//! Runs the black-box analysis collaborator for a stored image and
//! delivers the result either inline or written back to object storage
//! for the next workflow step to pick up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::{object_uri, ClientError, DocumentAnalyzer, ObjectStore};
use crate::models::AnalysisResult;

/// Suffix appended to the source key for stored analysis results.
const ANALYSIS_SUFFIX: &str = ".analysis.json";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("missing field {0}, please check your input payload")]
    MalformedRequest(&'static str),

    #[error("unknown output type '{0}': expected 'Inline' or 'Store'")]
    UnknownOutputType(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AnalyzeError {
    /// Error kind name reported to the orchestrator.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzeError::MalformedRequest(_) | AnalyzeError::UnknownOutputType(_) => {
                "MalformedRequest"
            }
            AnalyzeError::Client(_) => "ModelError",
        }
    }
}

/// Source object reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRef {
    pub bucket: String,
    pub key: String,
}

/// Where to deliver the analysis result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputSpec {
    /// "Inline" or "Store"; defaults to storing next to the source.
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Request to analyze one stored document image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub input: Option<SourceRef>,
    #[serde(default)]
    pub output: OutputSpec,
}

/// Delivered analysis: the result itself, or the locator it was stored
/// under.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Inline(AnalysisResult),
    #[serde(rename_all = "PascalCase")]
    Stored {
        bucket: String,
        key: String,
        uri: String,
    },
}

/// Runs document analysis and delivers the result.
pub struct AnalyzeService {
    analyzer: Arc<dyn DocumentAnalyzer>,
    store: Arc<dyn ObjectStore>,
}

impl AnalyzeService {
    pub fn new(analyzer: Arc<dyn DocumentAnalyzer>, store: Arc<dyn ObjectStore>) -> Self {
        Self { analyzer, store }
    }

    pub async fn run(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, AnalyzeError> {
        let source = request
            .input
            .as_ref()
            .ok_or(AnalyzeError::MalformedRequest("Input"))?;

        let output_type = request.output.r#type.as_deref().unwrap_or("Store");

        // Validate delivery mode before spending an analysis call on it
        let inline = match output_type.to_lowercase().as_str() {
            "inline" => true,
            "store" => false,
            other => return Err(AnalyzeError::UnknownOutputType(other.to_string())),
        };

        tracing::info!(
            bucket = %source.bucket,
            key = %source.key,
            output_type,
            "running document analysis"
        );
        let result = self.analyzer.analyze(&source.bucket, &source.key).await?;

        if inline {
            return Ok(AnalyzeResponse::Inline(result));
        }

        let dest_bucket = request
            .output
            .bucket
            .clone()
            .unwrap_or_else(|| source.bucket.clone());
        let dest_key = match &request.output.key {
            Some(key) => key.clone(),
            None => {
                let prefix = match &request.output.prefix {
                    Some(prefix) => format!("{prefix}/"),
                    None => String::new(),
                };
                format!("{prefix}{}{ANALYSIS_SUFFIX}", source.key)
            }
        };

        let body = serde_json::to_value(&result)
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        self.store.put_json(&dest_bucket, &dest_key, &body).await?;

        Ok(AnalyzeResponse::Stored {
            uri: object_uri(&dest_bucket, &dest_key),
            bucket: dest_bucket,
            key: dest_key,
        })
    }
}
