//! Parsed document-analysis result shapes.
//!
//! The document-analysis collaborator returns a flat list of recognized
//! blocks plus page-grouped key/value form fields. These types are the
//! JSON boundary shape; all confidences are on a 0-100 scale.

use serde::{Deserialize, Serialize};

/// Kind of recognized region in a document-analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Line,
    KeyValue,
    #[serde(other)]
    Other,
}

/// A labeled span of recognized text with its raw OCR confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentBlock {
    pub kind: BlockKind,
    pub text: String,
    pub confidence: f64,
}

/// One leg (key or value) of a recognized form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextSpan {
    pub text: String,
    pub confidence: f64,
}

/// A key/value pair recognized in a form region. The value leg may be
/// absent when the analysis found a key with nothing next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormField {
    pub key: TextSpan,
    #[serde(default)]
    pub value: Option<TextSpan>,
}

/// Form fields recognized on a single page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageForm {
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Complete result of one document-analysis call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub blocks: Vec<DocumentBlock>,
    #[serde(default)]
    pub pages: Vec<PageForm>,
}
