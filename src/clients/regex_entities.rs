//! Regex-based date entity recognizer for local runs.
//!
//! Stands in for the hosted entity-recognition service with deterministic
//! pattern matching. Pattern scores reflect specificity: an ISO date is a
//! safer bet than a two-digit-year form.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{ClientError, DetectedEntity, EntityRecognizer, EntityType};

/// Date-looking patterns with the score assigned to each match.
static DATE_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        // ISO format: 2024-01-15, 2024/01/15
        (Regex::new(r"\d{4}[-/]\d{2}[-/]\d{2}").unwrap(), 0.95),
        // Day-first or month-first with 4-digit year: 15/01/2024, 01-15-2024
        (Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{4}").unwrap(), 0.9),
        // Two-digit year: 15/01/24
        (Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{2}").unwrap(), 0.7),
    ]
});

/// Entity recognizer backed by the pattern table above.
pub struct RegexEntityRecognizer;

impl RegexEntityRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegexEntityRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityRecognizer for RegexEntityRecognizer {
    async fn detect_entities(
        &self,
        text: &str,
        _language: &str,
    ) -> Result<Vec<DetectedEntity>, ClientError> {
        let mut entities = Vec::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        // Patterns are ordered most-specific first; a span claimed by an
        // earlier pattern is skipped by later ones.
        for (pattern, score) in DATE_PATTERNS.iter() {
            for found in pattern.find_iter(text) {
                let overlaps = claimed
                    .iter()
                    .any(|&(start, end)| found.start() < end && start < found.end());
                if overlaps {
                    continue;
                }
                claimed.push((found.start(), found.end()));
                entities.push(DetectedEntity {
                    entity_type: EntityType::Date,
                    text: found.as_str().to_string(),
                    score: *score,
                });
            }
        }

        Ok(entities)
    }
}
