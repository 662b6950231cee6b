//! Entity-extraction fallback for the date field.
//!
//! Invoked only when structured extraction found no date candidates.
//! Free text goes to the entity-recognition collaborator; DATE entities
//! survive a date-shape filter and are normalized from the recognizer's
//! 0-1 scale onto the 0-100 scale used everywhere else.

use crate::clients::{ClientError, EntityRecognizer, EntityType};
use crate::models::{CandidateOrigin, FieldCandidate};

/// Characters a detected date must contain to be believed. Filters false
/// positives like bare year mentions.
const DATE_HINT_CHARS: [char; 3] = ['/', ':', '-'];

/// Turn free text into date field candidates via entity recognition.
pub async fn date_candidates_from_text(
    recognizer: &dyn EntityRecognizer,
    text: &str,
    language: &str,
) -> Result<Vec<FieldCandidate>, ClientError> {
    let entities = recognizer.detect_entities(text, language).await?;

    let candidates: Vec<FieldCandidate> = entities
        .into_iter()
        .filter(|entity| entity.entity_type == EntityType::Date)
        .filter_map(|entity| {
            let value = entity
                .text
                .trim_matches(|c| matches!(c, '\t' | '\n' | '\r'))
                .to_string();
            if !value.contains(&DATE_HINT_CHARS[..]) {
                tracing::debug!(%value, "date entity has no date-like separator, dropping");
                return None;
            }
            Some(FieldCandidate::new(
                value,
                entity.score * 100.0,
                CandidateOrigin::FreeTextEntity,
            ))
        })
        .collect();

    tracing::debug!(count = candidates.len(), "date candidates from free text");
    Ok(candidates)
}
