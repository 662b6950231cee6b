//! Extracted business fields and their confidence scoring.

use serde::{Deserialize, Serialize};

/// Where a candidate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOrigin {
    /// A key/value pair recognized in a form region.
    StructuredForm,
    /// An entity detected in the document's free text.
    FreeTextEntity,
    /// A layout assumption, e.g. "vendor is the first line".
    PositionalHeuristic,
}

/// One possible value for a field, with a 0-100 confidence score and a
/// provenance tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldCandidate {
    pub value: String,
    pub confidence: f64,
    pub origin: CandidateOrigin,
}

impl FieldCandidate {
    pub fn new(value: impl Into<String>, confidence: f64, origin: CandidateOrigin) -> Self {
        Self {
            value: value.into(),
            confidence,
            origin,
        }
    }
}

/// Chosen best candidate for a field plus the full ranked list of
/// runner-ups, retained for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldResult {
    pub value: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<FieldCandidate>,
}

impl FieldResult {
    /// Result for a field with no candidates at all.
    pub fn empty() -> Self {
        Self {
            value: String::new(),
            confidence: 0.0,
            alternatives: Vec::new(),
        }
    }
}

/// The three field results of one extraction pass.
///
/// The composite confidence is the minimum across fields: a human review
/// should be triggered by the weakest field, not the average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtractionOutcome {
    pub vendor: FieldResult,
    pub date: FieldResult,
    pub total: FieldResult,
    pub confidence: f64,
}

impl ExtractionOutcome {
    pub fn new(vendor: FieldResult, date: FieldResult, total: FieldResult) -> Self {
        let confidence = vendor
            .confidence
            .min(date.confidence)
            .min(total.confidence);
        Self {
            vendor,
            date,
            total,
            confidence,
        }
    }
}

/// Routing decision for one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    AutoAccept,
    HumanReview,
}
