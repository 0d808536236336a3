//! Text annotations, provenance, and duplicate removal.

use crate::mention::{MentionGraph, MentionId};
use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Who produced an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotator {
    /// Stable annotator id, referenced by [`crate::AnnotationGroup`].
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Affiliation, if any.
    pub affiliation: String,
}

impl Annotator {
    /// Create a new annotator.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, affiliation: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            affiliation: affiliation.into(),
        }
    }
}

/// TP/FP/FN classification of a single annotation, for optional in-place
/// tagging after a comparison (see [`crate::EvalConfig::tag_outcomes`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Matched a counterpart in the other collection.
    TruePositive,
    /// Test annotation with no gold counterpart.
    FalsePositive,
    /// Gold annotation with no test counterpart.
    FalseNegative,
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchOutcome::TruePositive => "TP",
            MatchOutcome::FalsePositive => "FP",
            MatchOutcome::FalseNegative => "FN",
        };
        f.write_str(label)
    }
}

/// One annotation over a document: spans, provenance, and a root mention.
///
/// Produced per document by an upstream source; the engine reads it and, at
/// most, tags its [`outcome`](Self::outcome).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    /// Annotation id, unique within its document.
    pub id: i64,
    /// Covered spans, in the order the producer emitted them.
    pub spans: Vec<Span>,
    /// Surface text covered by the spans.
    pub covered_text: String,
    /// Producing annotator.
    pub annotator: Annotator,
    /// Annotation sets this annotation belongs to.
    pub set_ids: BTreeSet<i64>,
    /// Source document id.
    pub document_id: String,
    /// Source document collection id.
    pub document_collection_id: i64,
    /// Section of the document the annotation sits in.
    pub document_section_id: i64,
    /// Root of the annotation's mention graph.
    pub root: MentionId,
    /// Scoring outcome, written only when outcome tagging is enabled.
    pub outcome: Option<MatchOutcome>,
}

impl TextAnnotation {
    /// Create an annotation with empty set membership and default
    /// collection/section ids.
    #[must_use]
    pub fn new(
        id: i64,
        spans: Vec<Span>,
        covered_text: impl Into<String>,
        annotator: Annotator,
        document_id: impl Into<String>,
        root: MentionId,
    ) -> Self {
        Self {
            id,
            spans,
            covered_text: covered_text.into(),
            annotator,
            set_ids: BTreeSet::new(),
            document_id: document_id.into(),
            document_collection_id: -1,
            document_section_id: -1,
            root,
            outcome: None,
        }
    }

    /// Replace the annotation-set membership.
    #[must_use]
    pub fn with_set_ids(mut self, set_ids: impl IntoIterator<Item = i64>) -> Self {
        self.set_ids = set_ids.into_iter().collect();
        self
    }

    /// Set the document collection id.
    #[must_use]
    pub fn with_collection_id(mut self, collection_id: i64) -> Self {
        self.document_collection_id = collection_id;
        self
    }

    /// Set the document section id.
    #[must_use]
    pub fn with_section_id(mut self, section_id: i64) -> Self {
        self.document_section_id = section_id;
        self
    }

    /// Aggregate span: `[min(start), max(end)]` over all spans.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyAnnotation`] when the annotation has no spans.
    pub fn aggregate_span(&self) -> Result<Span> {
        let first = self.spans.first().ok_or(Error::EmptyAnnotation(self.id))?;
        let mut start = first.start();
        let mut end = first.end();
        for span in &self.spans[1..] {
            start = start.min(span.start());
            end = end.max(span.end());
        }
        // start <= end holds because every member span is valid
        Span::new(start, end)
    }

    /// Spans sorted ascending, the order-insensitive form used as a
    /// duplicate-detection key.
    #[must_use]
    pub fn sorted_spans(&self) -> Vec<Span> {
        let mut spans = self.spans.clone();
        spans.sort();
        spans
    }
}

/// The annotations of one document plus the mention graph they point into.
///
/// This is the per-document input record of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentAnnotations {
    /// Flat ordered annotation collection.
    pub annotations: Vec<TextAnnotation>,
    /// Arena holding every mention the annotations reference.
    pub mentions: MentionGraph,
}

impl DocumentAnnotations {
    /// Create an empty document record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Duplicate-equivalence key: same document, same span set, same mention
/// structure.
fn duplicate_key(annotation: &TextAnnotation, graph: &MentionGraph) -> (String, i64, Vec<Span>, String) {
    (
        annotation.document_id.clone(),
        annotation.document_collection_id,
        annotation.sorted_spans(),
        graph.signature(annotation.root),
    )
}

fn partition_duplicates(
    annotations: &[TextAnnotation],
    graph: &MentionGraph,
) -> (Vec<TextAnnotation>, Vec<TextAnnotation>) {
    let mut seen = HashSet::new();
    let mut survivors = Vec::new();
    let mut redundant = Vec::new();
    for annotation in annotations {
        if seen.insert(duplicate_key(annotation, graph)) {
            survivors.push(annotation.clone());
        } else {
            redundant.push(annotation.clone());
        }
    }
    (survivors, redundant)
}

/// Collapse duplicate annotations to one representative each.
///
/// Annotations are duplicates when they agree on document id, document
/// collection id, span set, and mention signature; annotator and id are
/// free to differ. The first member of each group survives; relative order
/// is preserved.
#[must_use]
pub fn remove_duplicates(
    annotations: &[TextAnnotation],
    graph: &MentionGraph,
) -> Vec<TextAnnotation> {
    partition_duplicates(annotations, graph).0
}

/// The annotations [`remove_duplicates`] would discard.
#[must_use]
pub fn redundant_annotations(
    annotations: &[TextAnnotation],
    graph: &MentionGraph,
) -> Vec<TextAnnotation> {
    partition_duplicates(annotations, graph).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::PrimitiveSlot;

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    fn annotator(id: i64) -> Annotator {
        Annotator::new(id, format!("annotator-{id}"), "test lab")
    }

    #[test]
    fn test_aggregate_span() {
        let mut graph = MentionGraph::new();
        let root = graph.add_mention("protein");
        let ta = TextAnnotation::new(
            1,
            vec![span(10, 14), span(3, 5), span(20, 25)],
            "a b c",
            annotator(1),
            "doc-1",
            root,
        );
        assert_eq!(ta.aggregate_span().unwrap(), span(3, 25));
    }

    #[test]
    fn test_aggregate_span_empty_fails() {
        let mut graph = MentionGraph::new();
        let root = graph.add_mention("protein");
        let ta = TextAnnotation::new(7, vec![], "", annotator(1), "doc-1", root);
        assert!(matches!(
            ta.aggregate_span().unwrap_err(),
            Error::EmptyAnnotation(7)
        ));
    }

    #[test]
    fn test_remove_duplicates_collapses_group() {
        let mut graph = MentionGraph::new();
        let mut annotations = Vec::new();
        // Three duplicates of the same protein mention, differing only in
        // annotator and id, plus one distinct annotation
        for id in 0..3 {
            let root = graph.add_mention("protein");
            graph.add_primitive_slot(root, PrimitiveSlot::strings("name", ["p53"]));
            annotations.push(TextAnnotation::new(
                id,
                vec![span(5, 8)],
                "p53",
                annotator(id),
                "doc-1",
                root,
            ));
        }
        let other = graph.add_mention("gene");
        annotations.push(TextAnnotation::new(
            3,
            vec![span(5, 8)],
            "p53",
            annotator(0),
            "doc-1",
            other,
        ));

        let survivors = remove_duplicates(&annotations, &graph);
        // N - M + 1 = 4 - 3 + 1
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].id, 0);
        assert_eq!(survivors[1].id, 3);

        let redundant = redundant_annotations(&annotations, &graph);
        assert_eq!(redundant.len(), 2);
        assert_eq!(redundant[0].id, 1);
        assert_eq!(redundant[1].id, 2);
    }

    #[test]
    fn test_span_order_irrelevant_to_duplicates() {
        let mut graph = MentionGraph::new();
        let a = graph.add_mention("protein");
        let b = graph.add_mention("protein");
        let first = TextAnnotation::new(
            1,
            vec![span(3, 5), span(9, 12)],
            "x y",
            annotator(1),
            "doc-1",
            a,
        );
        let second = TextAnnotation::new(
            2,
            vec![span(9, 12), span(3, 5)],
            "x y",
            annotator(2),
            "doc-1",
            b,
        );

        let survivors = remove_duplicates(&[first, second], &graph);
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn test_different_documents_not_duplicates() {
        let mut graph = MentionGraph::new();
        let a = graph.add_mention("protein");
        let b = graph.add_mention("protein");
        let first = TextAnnotation::new(1, vec![span(3, 5)], "x", annotator(1), "doc-1", a);
        let second = TextAnnotation::new(2, vec![span(3, 5)], "x", annotator(1), "doc-2", b);

        let survivors = remove_duplicates(&[first, second], &graph);
        assert_eq!(survivors.len(), 2);
    }
}
