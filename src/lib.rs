//! # annoscore
//!
//! Scores machine-produced text annotations against gold-standard reference
//! annotations.
//!
//! - **Spans**: validated offset intervals, interval normalization, seven
//!   configurable span match policies
//! - **Mention graphs**: typed nodes with primitive and relational slots,
//!   cycle-safe structural equivalence
//! - **Matching**: first-fit one-to-one gold/test matching into TP/FP/FN
//!   buckets with precision, recall, and F1
//! - **Orchestration**: declarative annotation groups pooled into comparison
//!   cohorts, one of which is the gold standard, with cumulative totals over
//!   a document collection
//!
//! # Quick Start
//!
//! ```rust
//! use annoscore::{
//!     AnnotationGroup, Annotator, ComparisonGroup, DocumentAnnotations, EvalConfig,
//!     ScoringRun, Span, TextAnnotation,
//! };
//!
//! # fn main() -> annoscore::Result<()> {
//! // One document: a gold annotator (id 100) and a tagger (id 200)
//! let mut doc = DocumentAnnotations::new();
//! for (id, annotator_id) in [(1, 100), (2, 200)] {
//!     let root = doc.mentions.add_mention("protein");
//!     let ta = TextAnnotation::new(
//!         id,
//!         vec![Span::new(12, 15)?],
//!         "p53",
//!         Annotator::new(annotator_id, "annotator", "lab"),
//!         "doc-1",
//!         root,
//!     )
//!     .with_set_ids([0]);
//!     doc.annotations.push(ta);
//! }
//!
//! let config = EvalConfig::new(
//!     vec![
//!         AnnotationGroup::new(1, 100, 0).with_type_names(["protein"]),
//!         AnnotationGroup::new(2, 200, 0).with_type_names(["protein"]),
//!     ],
//!     vec![
//!         ComparisonGroup::new(1, "gold").gold_standard().with_members([1]),
//!         ComparisonGroup::new(2, "tagger").with_members([2]),
//!     ],
//! );
//!
//! let mut run = ScoringRun::new(config)?;
//! run.score_document(&mut doc)?;
//! let report = run.finish()?;
//! assert_eq!(report.results[&2].tp(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`span`] | Offset spans, overlap/containment, interval normalization |
//! | [`policy`] | Span and mention match policies |
//! | [`mention`] | Mention graph arena and structural equivalence |
//! | [`annotation`] | Text annotations, provenance, duplicate removal |
//! | [`prf`] | TP/FP/FN buckets and derived precision/recall/F1 |
//! | [`compare`] | Gold-vs-test matching |
//! | [`group`] | Group configuration and multi-document orchestration |
//!
//! # Concurrency
//!
//! The engine is synchronous and pure per document. The only cross-document
//! state is the per-group cumulative [`PrfResult`], whose merge is
//! associative and commutative, so callers may score documents in parallel
//! and fold the results in any order.

#![warn(missing_docs)]

pub mod annotation;
pub mod compare;
pub mod error;
pub mod group;
pub mod mention;
pub mod policy;
pub mod prf;
pub mod span;

pub use annotation::{
    redundant_annotations, remove_duplicates, Annotator, DocumentAnnotations, MatchOutcome,
    TextAnnotation,
};
pub use compare::{compare, match_annotations, MatchResult};
pub use error::{Error, Result};
pub use group::{
    AnnotationGroup, ComparisonGroup, EvalConfig, GroupFilter, Profile, RunReport, ScoringRun,
};
pub use mention::{
    mentions_equal, ClassMention, ComplexSlot, MentionGraph, MentionId, PrimitiveSlot, Slot,
    SlotValues,
};
pub use policy::{MentionMatchPolicy, SpanMatchPolicy};
pub use prf::{PrfResult, PrfSummary};
pub use span::{normalize_spans, reduce_spans, Span};
