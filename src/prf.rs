//! Precision/recall/F-measure results.

use crate::TextAnnotation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TP/FP/FN buckets of one comparison, with derived precision, recall, and
/// F1.
///
/// Buckets hold the classified annotations themselves (gold annotations for
/// TP and FN, test annotations for FP), so downstream tooling can inspect
/// exactly which annotations landed where.
///
/// `merge` concatenates buckets and is associative and commutative, so
/// per-document results may be folded in any order, including from
/// parallel workers, without changing the totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrfResult {
    /// Label for reports, typically the comparison-group description.
    pub title: String,
    /// Gold annotations that matched a test annotation.
    pub true_positives: Vec<TextAnnotation>,
    /// Test annotations with no gold counterpart.
    pub false_positives: Vec<TextAnnotation>,
    /// Gold annotations with no test counterpart.
    pub false_negatives: Vec<TextAnnotation>,
}

impl PrfResult {
    /// Create an empty result.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// True-positive count.
    #[must_use]
    pub fn tp(&self) -> usize {
        self.true_positives.len()
    }

    /// False-positive count.
    #[must_use]
    pub fn fp(&self) -> usize {
        self.false_positives.len()
    }

    /// False-negative count.
    #[must_use]
    pub fn fn_(&self) -> usize {
        self.false_negatives.len()
    }

    /// Precision: TP / (TP + FP), 0 when the denominator is 0.
    #[must_use]
    pub fn precision(&self) -> f64 {
        let denominator = self.tp() + self.fp();
        if denominator == 0 {
            return 0.0;
        }
        self.tp() as f64 / denominator as f64
    }

    /// Recall: TP / (TP + FN), 0 when the denominator is 0.
    #[must_use]
    pub fn recall(&self) -> f64 {
        let denominator = self.tp() + self.fn_();
        if denominator == 0 {
            return 0.0;
        }
        self.tp() as f64 / denominator as f64
    }

    /// F1: 2PR / (P + R), 0 when P + R is 0.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }

    /// Fold another result into this one by concatenating buckets.
    ///
    /// The title is kept from `self`.
    pub fn merge(&mut self, other: &PrfResult) {
        self.true_positives.extend(other.true_positives.iter().cloned());
        self.false_positives
            .extend(other.false_positives.iter().cloned());
        self.false_negatives
            .extend(other.false_negatives.iter().cloned());
    }

    /// Serializable snapshot of counts and derived metrics.
    #[must_use]
    pub fn summary(&self) -> PrfSummary {
        PrfSummary {
            title: self.title.clone(),
            true_positives: self.tp(),
            false_positives: self.fp(),
            false_negatives: self.fn_(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }

    /// Stable one-line report:
    /// `<title>\t<TP>\t<FP>\t<FN>\tP=<p>\tR=<r>\tF=<f>`.
    ///
    /// Downstream tooling parses this line; keep the format verbatim.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\tP={}\tR={}\tF={}",
            self.title,
            self.tp(),
            self.fp(),
            self.fn_(),
            self.precision(),
            self.recall(),
            self.f1()
        )
    }
}

impl fmt::Display for PrfResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line())
    }
}

/// Counts and derived metrics of one [`PrfResult`], detached from the
/// annotation buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrfSummary {
    /// Result title.
    pub title: String,
    /// True-positive count.
    pub true_positives: usize,
    /// False-positive count.
    pub false_positives: usize,
    /// False-negative count.
    pub false_negatives: usize,
    /// Derived precision.
    pub precision: f64,
    /// Derived recall.
    pub recall: f64,
    /// Derived F1.
    pub f1: f64,
}
