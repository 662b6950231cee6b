//! Field candidate extraction from a document-analysis result.
//!
//! Receipts rarely spell out "Vendor: XYZ" - the business name is just
//! the first thing printed. So vendor is fixed to the first recognized
//! line, while date and total are searched among the key/value form
//! fields. The remaining line text is collected for the entity-extraction
//! fallback.

use crate::models::{AnalysisResult, BlockKind, CandidateOrigin, FieldCandidate, FormField};

/// Key substrings that mark a total-amount form field.
const TOTAL_KEY_HINTS: [&str; 2] = ["total", "amount"];

/// Key substring that marks a date form field.
const DATE_KEY_HINT: &str = "date";

/// Currency symbols stripped before parsing a total value.
const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Candidates produced by one extraction pass, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    /// At most one candidate: the first-line heuristic needs no ranking.
    pub vendor: Vec<FieldCandidate>,
    pub dates: Vec<FieldCandidate>,
    pub totals: Vec<FieldCandidate>,
    /// Concatenated text of all non-vendor lines.
    pub free_text: String,
}

/// Extract field candidates from a document-analysis result.
///
/// Pure function of its input: re-running it on the same analysis yields
/// the same candidates in the same order.
pub fn extract_candidates(analysis: &AnalysisResult) -> CandidateSet {
    let mut set = CandidateSet::default();
    let mut free_lines: Vec<&str> = Vec::new();

    for block in &analysis.blocks {
        if block.kind != BlockKind::Line {
            continue;
        }
        if set.vendor.is_empty() {
            set.vendor.push(FieldCandidate::new(
                block.text.clone(),
                block.confidence,
                CandidateOrigin::PositionalHeuristic,
            ));
        } else {
            free_lines.push(&block.text);
        }
    }
    set.free_text = free_lines.join(" ");

    for page in &analysis.pages {
        for field in &page.fields {
            if let Some(candidate) = total_candidate(field) {
                set.totals.push(candidate);
            }
            if let Some(candidate) = date_candidate(field) {
                set.dates.push(candidate);
            }
        }
    }

    set
}

/// The weaker leg of a key/value pair gates trust in the whole pair.
fn pair_confidence(field: &FormField) -> Option<f64> {
    field
        .value
        .as_ref()
        .map(|value| field.key.confidence.min(value.confidence))
}

fn total_candidate(field: &FormField) -> Option<FieldCandidate> {
    let key = field.key.text.to_lowercase();
    if !TOTAL_KEY_HINTS.iter().any(|hint| key.contains(hint)) {
        return None;
    }
    let value = field.value.as_ref()?;
    if parse_amount(&value.text).is_none() {
        tracing::debug!(
            value = %value.text,
            "total value is not parseable as a number, dropping candidate"
        );
        return None;
    }
    Some(FieldCandidate::new(
        value.text.clone(),
        pair_confidence(field)?,
        CandidateOrigin::StructuredForm,
    ))
}

fn date_candidate(field: &FormField) -> Option<FieldCandidate> {
    if !field.key.text.to_lowercase().contains(DATE_KEY_HINT) {
        return None;
    }
    let value = field.value.as_ref()?;
    Some(FieldCandidate::new(
        value.text.clone(),
        pair_confidence(field)?,
        CandidateOrigin::StructuredForm,
    ))
}

/// Parse a monetary value, tolerating one leading currency symbol.
fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix(&CURRENCY_SYMBOLS[..])
        .unwrap_or(trimmed);
    stripped.trim_start().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentBlock, PageForm, TextSpan};

    fn line(text: &str, confidence: f64) -> DocumentBlock {
        DocumentBlock {
            kind: BlockKind::Line,
            text: text.into(),
            confidence,
        }
    }

    fn field(key: &str, key_conf: f64, value: &str, value_conf: f64) -> FormField {
        FormField {
            key: TextSpan {
                text: key.into(),
                confidence: key_conf,
            },
            value: Some(TextSpan {
                text: value.into(),
                confidence: value_conf,
            }),
        }
    }

    fn receipt() -> AnalysisResult {
        AnalysisResult {
            blocks: vec![
                line("Acme Store", 98.0),
                line("123 Main St", 96.0),
                line("Thank you", 97.0),
            ],
            pages: vec![PageForm {
                fields: vec![
                    field("Total Due", 95.0, "$42.50", 90.0),
                    field("Invoice Date", 80.0, "03/14/2024", 85.0),
                ],
            }],
        }
    }

    #[test]
    fn test_vendor_is_first_line() {
        let set = extract_candidates(&receipt());
        assert_eq!(set.vendor.len(), 1);
        assert_eq!(set.vendor[0].value, "Acme Store");
        assert_eq!(set.vendor[0].confidence, 98.0);
        assert_eq!(set.vendor[0].origin, CandidateOrigin::PositionalHeuristic);
    }

    #[test]
    fn test_free_text_excludes_vendor_line() {
        let set = extract_candidates(&receipt());
        assert_eq!(set.free_text, "123 Main St Thank you");
    }

    #[test]
    fn test_total_confidence_is_weaker_leg() {
        let set = extract_candidates(&receipt());
        assert_eq!(set.totals.len(), 1);
        assert_eq!(set.totals[0].value, "$42.50");
        assert_eq!(set.totals[0].confidence, 90.0);
    }

    #[test]
    fn test_date_confidence_is_weaker_leg() {
        let set = extract_candidates(&receipt());
        assert_eq!(set.dates.len(), 1);
        assert_eq!(set.dates[0].value, "03/14/2024");
        assert_eq!(set.dates[0].confidence, 80.0);
    }

    #[test]
    fn test_unparsable_total_is_dropped() {
        let mut analysis = receipt();
        analysis.pages[0].fields[0] = field("Total Due", 95.0, "N/A", 90.0);
        let set = extract_candidates(&analysis);
        assert!(set.totals.is_empty());
    }

    #[test]
    fn test_key_matching_is_case_insensitive() {
        let analysis = AnalysisResult {
            blocks: vec![],
            pages: vec![PageForm {
                fields: vec![
                    field("TOTAL AMOUNT", 90.0, "12.00", 88.0),
                    field("Purchase DATE", 82.0, "01-02-2024", 84.0),
                ],
            }],
        };
        let set = extract_candidates(&analysis);
        assert_eq!(set.totals.len(), 1);
        assert_eq!(set.dates.len(), 1);
    }

    #[test]
    fn test_keyless_value_absent_is_skipped() {
        let analysis = AnalysisResult {
            blocks: vec![],
            pages: vec![PageForm {
                fields: vec![FormField {
                    key: TextSpan {
                        text: "Total".into(),
                        confidence: 95.0,
                    },
                    value: None,
                }],
            }],
        };
        let set = extract_candidates(&analysis);
        assert!(set.totals.is_empty());
    }

    #[test]
    fn test_parse_amount_strips_currency_symbols() {
        assert_eq!(parse_amount("$42.50"), Some(42.5));
        assert_eq!(parse_amount("€9.99"), Some(9.99));
        assert_eq!(parse_amount(" 17.00 "), Some(17.0));
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount("$12,345.00"), None);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let analysis = receipt();
        let first = extract_candidates(&analysis);
        let second = extract_candidates(&analysis);
        assert_eq!(first.vendor, second.vendor);
        assert_eq!(first.dates, second.dates);
        assert_eq!(first.totals, second.totals);
        assert_eq!(first.free_text, second.free_text);
    }
}
