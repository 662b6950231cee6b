//! Human-review task shapes.
//!
//! A review task is started with an input content payload (which echoes
//! back in the result) and completes asynchronously as a result object
//! written to storage.

use serde::{Deserialize, Serialize};

/// Content a review task is started with, echoed back in its result.
///
/// Carries the extracted field guesses for the reviewer to correct, the
/// locator of the object under review, and the resume token of the
/// suspended workflow step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInputContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

/// The fields a reviewer filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerContent {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// One human's answer within a review task result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanAnswer {
    #[serde(default)]
    pub answer_content: AnswerContent,
    #[serde(default)]
    pub worker_id: Option<String>,
}

/// Result object written to storage when a review task completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTaskResult {
    #[serde(default)]
    pub input_content: ReviewInputContent,
    #[serde(default)]
    pub human_answers: Vec<HumanAnswer>,
}

/// Fields handed back to the suspended workflow step after a successful
/// review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReviewedFields {
    pub date: String,
    pub total: String,
    pub vendor: String,
    pub worker_id: String,
}
