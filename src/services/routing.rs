//! Candidate ranking, confidence aggregation, and review routing.

use std::cmp::Ordering;

use crate::models::{ExtractionOutcome, FieldCandidate, FieldResult, Route};

use super::extraction::CandidateSet;

/// An aggregated extraction pass with its routing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedOutcome {
    pub outcome: ExtractionOutcome,
    pub route: Route,
}

/// Rank candidates by descending confidence and pick the best.
///
/// The sort is stable, so ties keep candidate-discovery order: the
/// first-seen candidate wins. Runner-ups are retained in full as
/// alternatives.
pub fn rank(mut candidates: Vec<FieldCandidate>) -> FieldResult {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    let mut ranked = candidates.into_iter();
    match ranked.next() {
        Some(best) => FieldResult {
            value: best.value,
            confidence: best.confidence,
            alternatives: ranked.collect(),
        },
        None => FieldResult::empty(),
    }
}

/// Aggregate a candidate set into field results and decide routing.
///
/// Review is triggered by either of two independent conditions: the
/// composite confidence falling below the threshold, or any field having
/// no candidates at all. A composite exactly equal to the threshold
/// auto-accepts.
pub fn aggregate(set: CandidateSet, threshold: f64) -> RoutedOutcome {
    let any_field_empty =
        set.vendor.is_empty() || set.dates.is_empty() || set.totals.is_empty();

    let outcome = ExtractionOutcome::new(rank(set.vendor), rank(set.dates), rank(set.totals));

    let below_threshold = outcome.confidence < threshold;
    let route = if below_threshold || any_field_empty {
        Route::HumanReview
    } else {
        Route::AutoAccept
    };

    RoutedOutcome { outcome, route }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateOrigin;

    fn candidate(value: &str, confidence: f64) -> FieldCandidate {
        FieldCandidate::new(value, confidence, CandidateOrigin::StructuredForm)
    }

    fn full_set(vendor: f64, date: f64, total: f64) -> CandidateSet {
        CandidateSet {
            vendor: vec![FieldCandidate::new(
                "Acme Store",
                vendor,
                CandidateOrigin::PositionalHeuristic,
            )],
            dates: vec![candidate("03/14/2024", date)],
            totals: vec![candidate("$42.50", total)],
            free_text: String::new(),
        }
    }

    #[test]
    fn test_best_candidate_outranks_all_alternatives() {
        let result = rank(vec![
            candidate("a", 70.0),
            candidate("b", 90.0),
            candidate("c", 80.0),
        ]);
        assert_eq!(result.value, "b");
        assert_eq!(result.alternatives.len(), 2);
        for alt in &result.alternatives {
            assert!(result.confidence >= alt.confidence);
        }
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let result = rank(vec![
            candidate("first", 85.0),
            candidate("second", 85.0),
            candidate("third", 85.0),
        ]);
        assert_eq!(result.value, "first");
        assert_eq!(result.alternatives[0].value, "second");
        assert_eq!(result.alternatives[1].value, "third");
    }

    #[test]
    fn test_no_candidates_yields_empty_result() {
        let result = rank(vec![]);
        assert_eq!(result.value, "");
        assert_eq!(result.confidence, 0.0);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_composite_is_weakest_field() {
        let routed = aggregate(full_set(98.0, 80.0, 90.0), 50.0);
        assert_eq!(routed.outcome.confidence, 80.0);
        assert_eq!(routed.route, Route::AutoAccept);
    }

    #[test]
    fn test_composite_at_threshold_auto_accepts() {
        let routed = aggregate(full_set(98.0, 80.0, 90.0), 80.0);
        assert_eq!(routed.route, Route::AutoAccept);
    }

    #[test]
    fn test_composite_below_threshold_routes_to_review() {
        let routed = aggregate(full_set(98.0, 79.0, 90.0), 80.0);
        assert_eq!(routed.route, Route::HumanReview);
    }

    #[test]
    fn test_empty_field_routes_to_review_independently_of_threshold() {
        // Threshold zero: the composite (0) is not below it, so only the
        // zero-candidate condition can route this to review.
        let mut set = full_set(98.0, 80.0, 90.0);
        set.totals.clear();
        let routed = aggregate(set, 0.0);
        assert_eq!(routed.outcome.total, FieldResult::empty());
        assert_eq!(routed.outcome.confidence, 0.0);
        assert_eq!(routed.route, Route::HumanReview);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let first = aggregate(full_set(98.0, 80.0, 90.0), 80.0);
        let second = aggregate(full_set(98.0, 80.0, 90.0), 80.0);
        assert_eq!(first, second);
    }
}
