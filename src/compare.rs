//! Gold-vs-test annotation matching.
//!
//! [`compare`] turns two annotation collections into a [`PrfResult`] under a
//! span match policy and a mention match policy. A test annotation is a
//! candidate for a gold annotation iff the span policy accepts the pair's
//! aggregate spans *and* the mention policy accepts their mention graphs.
//!
//! Matching is one-to-one and first-fit: each gold annotation takes the
//! earliest unmatched candidate in the test collection, with no global
//! assignment optimization. Candidates that tie are mention-equal and
//! therefore scoring-indistinguishable, so first-fit is cheap without being
//! lossy.

use crate::mention::MentionGraph;
use crate::policy::{MentionMatchPolicy, SpanMatchPolicy};
use crate::{PrfResult, Result, Span, TextAnnotation};

/// Index-level outcome of matching two annotation collections.
///
/// Indices refer to positions in the gold and test slices handed to
/// [`match_annotations`]. [`compare`] folds this into a [`PrfResult`];
/// callers that need to tag or cross-reference the original annotations can
/// use the indices directly.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Matched `(gold index, test index)` pairs.
    pub matched: Vec<(usize, usize)>,
    /// Gold indices with no test counterpart.
    pub unmatched_gold: Vec<usize>,
    /// Test indices with no gold counterpart.
    pub unmatched_test: Vec<usize>,
}

/// Match gold against test annotations, first-fit, one-to-one.
///
/// # Errors
///
/// Returns [`crate::Error::EmptyAnnotation`] when any annotation on either
/// side has no spans (its aggregate span is undefined).
pub fn match_annotations(
    gold: &[TextAnnotation],
    gold_graph: &MentionGraph,
    test: &[TextAnnotation],
    test_graph: &MentionGraph,
    span_policy: SpanMatchPolicy,
    mention_policy: MentionMatchPolicy,
) -> Result<MatchResult> {
    let gold_spans: Vec<Span> = gold
        .iter()
        .map(TextAnnotation::aggregate_span)
        .collect::<Result<_>>()?;
    let test_spans: Vec<Span> = test
        .iter()
        .map(TextAnnotation::aggregate_span)
        .collect::<Result<_>>()?;

    let gold_signatures: Vec<String> = gold
        .iter()
        .map(|ta| gold_graph.signature(ta.root))
        .collect();
    let test_signatures: Vec<String> = test
        .iter()
        .map(|ta| test_graph.signature(ta.root))
        .collect();

    let mut result = MatchResult::default();
    let mut test_taken = vec![false; test.len()];

    for (gold_idx, gold_span) in gold_spans.iter().enumerate() {
        let candidate = (0..test.len()).find(|&test_idx| {
            if test_taken[test_idx] || !span_policy.matches(gold_span, &test_spans[test_idx]) {
                return false;
            }
            match mention_policy {
                MentionMatchPolicy::Identical => {
                    gold_signatures[gold_idx] == test_signatures[test_idx]
                }
            }
        });

        match candidate {
            Some(test_idx) => {
                test_taken[test_idx] = true;
                result.matched.push((gold_idx, test_idx));
            }
            None => result.unmatched_gold.push(gold_idx),
        }
    }

    result.unmatched_test = test_taken
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(test_idx, _)| test_idx)
        .collect();

    Ok(result)
}

/// Compare gold against test annotations, producing a [`PrfResult`].
///
/// Matched pairs contribute the *gold* annotation to the TP bucket;
/// unmatched gold annotations become FN, unmatched test annotations FP.
///
/// # Errors
///
/// Returns [`crate::Error::EmptyAnnotation`] when any annotation on either
/// side has no spans.
pub fn compare(
    gold: &[TextAnnotation],
    gold_graph: &MentionGraph,
    test: &[TextAnnotation],
    test_graph: &MentionGraph,
    span_policy: SpanMatchPolicy,
    mention_policy: MentionMatchPolicy,
    title: impl Into<String>,
) -> Result<PrfResult> {
    let matches = match_annotations(gold, gold_graph, test, test_graph, span_policy, mention_policy)?;

    let mut result = PrfResult::new(title);
    result.true_positives = matches
        .matched
        .iter()
        .map(|&(gold_idx, _)| gold[gold_idx].clone())
        .collect();
    result.false_negatives = matches
        .unmatched_gold
        .iter()
        .map(|&gold_idx| gold[gold_idx].clone())
        .collect();
    result.false_positives = matches
        .unmatched_test
        .iter()
        .map(|&test_idx| test[test_idx].clone())
        .collect();
    Ok(result)
}
