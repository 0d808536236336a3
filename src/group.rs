//! Annotation grouping and multi-group scoring orchestration.
//!
//! An [`AnnotationGroup`] is a membership predicate over annotations
//! (annotator, annotation set, mention type). A [`ComparisonGroup`] pools
//! one or more annotation groups into a cohort; exactly one comparison
//! group per configuration is the gold standard, and every other group is
//! scored against it.
//!
//! [`ScoringRun`] drives the whole evaluation: per document it classifies
//! annotations into groups, projects them into comparison-group pools,
//! deduplicates each pool, compares every non-gold pool against the gold
//! pool, and folds the per-document [`PrfResult`]s into cumulative
//! per-group totals. [`ScoringRun::finish`] produces the final report plus
//! a list of which (annotator, annotation set, type) profiles no group
//! claimed; an unclaimed profile is the usual symptom of a configuration
//! typo.
//!
//! Under the [`SpanMatchPolicy::Strict`] policy every non-gold group is
//! scored against the same gold pool, so cumulative TP+FN must agree across
//! groups. A mismatch means the gold pools diverged between comparisons and
//! is fatal: the run aborts rather than produce a misleading report.

use crate::annotation::remove_duplicates;
use crate::compare::match_annotations;
use crate::mention::MentionGraph;
use crate::policy::{MentionMatchPolicy, SpanMatchPolicy};
use crate::{DocumentAnnotations, Error, MatchOutcome, PrfResult, Result, TextAnnotation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Membership predicate selecting annotations by annotator, annotation
/// set, and mention type.
///
/// Type filtering: a non-empty [`type_names`](Self::type_names) list is
/// authoritative and the regexes are not consulted; otherwise the type name
/// must match one of [`type_regexes`](Self::type_regexes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationGroup {
    /// Group id, referenced by [`ComparisonGroup::member_group_ids`].
    pub id: i64,
    /// Required annotator id.
    pub annotator_id: i64,
    /// Required annotation-set membership.
    pub annotation_set_id: i64,
    /// Exact mention type names. Non-empty shadows the regexes.
    pub type_names: BTreeSet<String>,
    /// Mention type patterns, consulted only when `type_names` is empty.
    pub type_regexes: Vec<String>,
}

impl AnnotationGroup {
    /// Create a group with no type filter (matches no annotation until
    /// type names or regexes are added).
    #[must_use]
    pub fn new(id: i64, annotator_id: i64, annotation_set_id: i64) -> Self {
        Self {
            id,
            annotator_id,
            annotation_set_id,
            ..Self::default()
        }
    }

    /// Replace the exact type-name filter.
    #[must_use]
    pub fn with_type_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the type-regex filter.
    #[must_use]
    pub fn with_type_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_regexes = patterns.into_iter().map(Into::into).collect();
        self
    }
}

/// An [`AnnotationGroup`] with its type regexes compiled, ready to test
/// membership.
#[derive(Debug, Clone)]
pub struct GroupFilter {
    group: AnnotationGroup,
    regexes: Vec<Regex>,
}

impl GroupFilter {
    /// Compile a group's regexes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a pattern does not compile.
    pub fn compile(group: AnnotationGroup) -> Result<Self> {
        let regexes = group
            .type_regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::config(format!(
                        "annotation group {}: bad type regex {pattern:?}: {e}",
                        group.id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { group, regexes })
    }

    /// The underlying group definition.
    #[must_use]
    pub fn group(&self) -> &AnnotationGroup {
        &self.group
    }

    /// Test whether an annotation belongs to this group.
    #[must_use]
    pub fn has_member(&self, annotation: &TextAnnotation, graph: &MentionGraph) -> bool {
        if annotation.annotator.id != self.group.annotator_id {
            return false;
        }
        if !annotation.set_ids.contains(&self.group.annotation_set_id) {
            return false;
        }
        let Some(mention) = graph.mention(annotation.root) else {
            return false;
        };
        if !self.group.type_names.is_empty() {
            return self.group.type_names.contains(&mention.type_name);
        }
        self.regexes.iter().any(|re| re.is_match(&mention.type_name))
    }
}

/// A named pool of annotation groups; one per configuration is the gold
/// standard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonGroup {
    /// Comparison-group id, the key of per-group results.
    pub id: i64,
    /// Whether this group is the gold standard.
    pub is_gold_standard: bool,
    /// Human-readable description, used as the result title.
    pub description: String,
    /// Ids of the member [`AnnotationGroup`]s.
    pub member_group_ids: BTreeSet<i64>,
}

impl ComparisonGroup {
    /// Create a non-gold comparison group.
    #[must_use]
    pub fn new(id: i64, description: impl Into<String>) -> Self {
        Self {
            id,
            is_gold_standard: false,
            description: description.into(),
            member_group_ids: BTreeSet::new(),
        }
    }

    /// Flag this group as the gold standard.
    #[must_use]
    pub fn gold_standard(mut self) -> Self {
        self.is_gold_standard = true;
        self
    }

    /// Replace the member annotation-group ids.
    #[must_use]
    pub fn with_members(mut self, member_ids: impl IntoIterator<Item = i64>) -> Self {
        self.member_group_ids = member_ids.into_iter().collect();
        self
    }
}

/// Full configuration of an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Annotation-group membership predicates.
    pub annotation_groups: Vec<AnnotationGroup>,
    /// Comparison-group pools; exactly one flagged gold standard.
    pub comparison_groups: Vec<ComparisonGroup>,
    /// Span match policy applied uniformly to every comparison.
    pub span_policy: SpanMatchPolicy,
    /// Mention match policy applied uniformly to every comparison.
    pub mention_policy: MentionMatchPolicy,
    /// Tag each annotation in place with its TP/FP/FN outcome.
    pub tag_outcomes: bool,
}

impl EvalConfig {
    /// Create a config with the given groups, Strict span matching,
    /// Identical mention matching, and outcome tagging off.
    #[must_use]
    pub fn new(
        annotation_groups: Vec<AnnotationGroup>,
        comparison_groups: Vec<ComparisonGroup>,
    ) -> Self {
        Self {
            annotation_groups,
            comparison_groups,
            span_policy: SpanMatchPolicy::Strict,
            mention_policy: MentionMatchPolicy::Identical,
            tag_outcomes: false,
        }
    }

    /// Set the span match policy.
    #[must_use]
    pub fn with_span_policy(mut self, policy: SpanMatchPolicy) -> Self {
        self.span_policy = policy;
        self
    }

    /// Set the mention match policy.
    #[must_use]
    pub fn with_mention_policy(mut self, policy: MentionMatchPolicy) -> Self {
        self.mention_policy = policy;
        self
    }

    /// Enable in-place TP/FP/FN outcome tagging.
    #[must_use]
    pub fn with_outcome_tagging(mut self) -> Self {
        self.tag_outcomes = true;
        self
    }
}

/// An (annotator id, annotation set id, mention type) combination observed
/// during a run.
///
/// The final report splits these into profiles some [`AnnotationGroup`]
/// claimed and profiles none did, which is the first place to look when a
/// group configuration silently drops annotations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Profile {
    /// Annotator id.
    pub annotator_id: i64,
    /// Annotation-set id.
    pub annotation_set_id: i64,
    /// Root mention type name.
    pub type_name: String,
}

/// Final output of a [`ScoringRun`].
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Cumulative result per non-gold comparison-group id.
    pub results: BTreeMap<i64, PrfResult>,
    /// Profiles claimed by at least one annotation group.
    pub matched_profiles: Vec<Profile>,
    /// Profiles no annotation group claimed.
    pub unmatched_profiles: Vec<Profile>,
    /// Number of documents scored.
    pub documents_scored: usize,
}

impl RunReport {
    /// One stable summary line per comparison group, in id order.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.results.values().map(PrfResult::summary_line).collect()
    }

    /// Look up a cumulative result by comparison-group description.
    #[must_use]
    pub fn result_by_description(&self, description: &str) -> Option<&PrfResult> {
        self.results.values().find(|r| r.title == description)
    }
}

/// Multi-group scoring over a document collection.
///
/// Create one per evaluation, feed it documents with
/// [`score_document`](Self::score_document), and finish with
/// [`finish`](Self::finish). The engine itself is synchronous and pure per
/// document; callers that want document-level parallelism can run one
/// comparison per worker and fold the per-document [`PrfResult`]s
/// themselves, since [`PrfResult::merge`] is associative and commutative.
#[derive(Debug)]
pub struct ScoringRun {
    span_policy: SpanMatchPolicy,
    mention_policy: MentionMatchPolicy,
    tag_outcomes: bool,
    filters: Vec<GroupFilter>,
    gold_group: ComparisonGroup,
    non_gold_groups: Vec<ComparisonGroup>,
    cumulative: BTreeMap<i64, PrfResult>,
    profiles_seen: BTreeSet<Profile>,
    profiles_matched: BTreeSet<Profile>,
    documents_scored: usize,
}

impl ScoringRun {
    /// Validate a configuration and set up a run.
    ///
    /// Recoverable oddities are logged, not fatal: no gold flag (defaults
    /// to the first declared comparison group), an annotation group shared
    /// between the gold pool and a non-gold pool (risks bias).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when there are no comparison groups, more
    /// than one gold flag, a member id references an unknown annotation
    /// group, or a type regex does not compile.
    pub fn new(config: EvalConfig) -> Result<Self> {
        if config.comparison_groups.is_empty() {
            return Err(Error::config("no comparison groups declared"));
        }

        let known_group_ids: HashSet<i64> =
            config.annotation_groups.iter().map(|g| g.id).collect();
        for comparison in &config.comparison_groups {
            for member_id in &comparison.member_group_ids {
                if !known_group_ids.contains(member_id) {
                    return Err(Error::config(format!(
                        "comparison group {} references unknown annotation group {member_id}",
                        comparison.id
                    )));
                }
            }
        }

        let gold_count = config
            .comparison_groups
            .iter()
            .filter(|g| g.is_gold_standard)
            .count();
        if gold_count > 1 {
            return Err(Error::config(format!(
                "{gold_count} comparison groups flagged gold standard, expected exactly one"
            )));
        }

        let gold_index = config
            .comparison_groups
            .iter()
            .position(|g| g.is_gold_standard)
            .unwrap_or_else(|| {
                log::warn!(
                    "no comparison group flagged gold standard; defaulting to first declared \
                     group {}",
                    config.comparison_groups[0].id
                );
                0
            });

        let gold_group = config.comparison_groups[gold_index].clone();
        let non_gold_groups: Vec<ComparisonGroup> = config
            .comparison_groups
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != gold_index)
            .map(|(_, group)| group.clone())
            .collect();

        for group in &non_gold_groups {
            for shared in gold_group.member_group_ids.intersection(&group.member_group_ids) {
                log::warn!(
                    "annotation group {shared} belongs to both the gold comparison group {} \
                     and comparison group {}; results may be biased",
                    gold_group.id,
                    group.id
                );
            }
        }

        let filters = config
            .annotation_groups
            .into_iter()
            .map(GroupFilter::compile)
            .collect::<Result<Vec<_>>>()?;

        let cumulative = non_gold_groups
            .iter()
            .map(|group| (group.id, PrfResult::new(group.description.clone())))
            .collect();

        Ok(Self {
            span_policy: config.span_policy,
            mention_policy: config.mention_policy,
            tag_outcomes: config.tag_outcomes,
            filters,
            gold_group,
            non_gold_groups,
            cumulative,
            profiles_seen: BTreeSet::new(),
            profiles_matched: BTreeSet::new(),
            documents_scored: 0,
        })
    }

    /// Score one document, returning its per-comparison-group results and
    /// folding them into the cumulative totals.
    ///
    /// When outcome tagging is enabled the document's annotations are
    /// tagged in place; an annotation that scores `TruePositive` in any
    /// comparison keeps that outcome even when another comparison misses it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyAnnotation`] for annotations without spans and
    /// [`Error::Evaluation`] when the Strict cross-group TP+FN invariant
    /// breaks (fatal; the run should be abandoned).
    pub fn score_document(
        &mut self,
        document: &mut DocumentAnnotations,
    ) -> Result<BTreeMap<i64, PrfResult>> {
        self.record_profiles(document);

        // Annotation-group id -> member annotation indices, document order
        let mut membership: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (index, annotation) in document.annotations.iter().enumerate() {
            for filter in &self.filters {
                if filter.has_member(annotation, &document.mentions) {
                    membership.entry(filter.group().id).or_default().push(index);
                }
            }
        }

        let gold_pool = pooled_annotations(&self.gold_group, &membership, document);

        let mut per_document = BTreeMap::new();
        for group in self.non_gold_groups.clone() {
            let test_pool = pooled_annotations(&group, &membership, document);
            let matches = match_annotations(
                &gold_pool,
                &document.mentions,
                &test_pool,
                &document.mentions,
                self.span_policy,
                self.mention_policy,
            )?;

            let mut result = PrfResult::new(group.description.clone());
            result.true_positives = matches
                .matched
                .iter()
                .map(|&(gold_idx, _)| gold_pool[gold_idx].clone())
                .collect();
            result.false_negatives = matches
                .unmatched_gold
                .iter()
                .map(|&gold_idx| gold_pool[gold_idx].clone())
                .collect();
            result.false_positives = matches
                .unmatched_test
                .iter()
                .map(|&test_idx| test_pool[test_idx].clone())
                .collect();

            if self.tag_outcomes {
                tag_document(document, &gold_pool, &test_pool, &matches);
            }

            if let Some(total) = self.cumulative.get_mut(&group.id) {
                total.merge(&result);
            }
            per_document.insert(group.id, result);
        }

        self.documents_scored += 1;
        self.check_strict_invariant()?;
        Ok(per_document)
    }

    /// Cumulative results so far, keyed by comparison-group id.
    #[must_use]
    pub fn cumulative(&self) -> &BTreeMap<i64, PrfResult> {
        &self.cumulative
    }

    /// Fold an externally computed result into a group's cumulative total.
    ///
    /// This is the serializing-accumulator half of document-level
    /// parallelism: workers run [`crate::compare`] on their own documents
    /// and feed the per-document results here in any order. Because folds
    /// for the same document may arrive one group at a time, the Strict
    /// cross-group invariant is not checked here; [`finish`](Self::finish)
    /// verifies it once every fold is in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown comparison-group id.
    pub fn fold_result(&mut self, group_id: i64, result: &PrfResult) -> Result<()> {
        let total = self
            .cumulative
            .get_mut(&group_id)
            .ok_or_else(|| Error::config(format!("unknown comparison group {group_id}")))?;
        total.merge(result);
        Ok(())
    }

    /// Finish the run: final invariant check, then the report.
    ///
    /// Unmatched profiles are logged at warn level in addition to being
    /// reported, since they usually mean a group configuration typo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Evaluation`] when the Strict cross-group TP+FN
    /// invariant does not hold over the cumulative totals.
    pub fn finish(self) -> Result<RunReport> {
        self.check_strict_invariant()?;

        let unmatched_profiles: Vec<Profile> = self
            .profiles_seen
            .difference(&self.profiles_matched)
            .cloned()
            .collect();
        for profile in &unmatched_profiles {
            log::warn!(
                "no annotation group matched profile (annotator {}, set {}, type {:?})",
                profile.annotator_id,
                profile.annotation_set_id,
                profile.type_name
            );
        }

        Ok(RunReport {
            results: self.cumulative,
            matched_profiles: self.profiles_matched.into_iter().collect(),
            unmatched_profiles,
            documents_scored: self.documents_scored,
        })
    }

    fn record_profiles(&mut self, document: &DocumentAnnotations) {
        for annotation in &document.annotations {
            let Some(mention) = document.mentions.mention(annotation.root) else {
                continue;
            };
            for &set_id in &annotation.set_ids {
                self.profiles_seen.insert(Profile {
                    annotator_id: annotation.annotator.id,
                    annotation_set_id: set_id,
                    type_name: mention.type_name.clone(),
                });
            }
            for filter in &self.filters {
                if filter.has_member(annotation, &document.mentions) {
                    self.profiles_matched.insert(Profile {
                        annotator_id: annotation.annotator.id,
                        annotation_set_id: filter.group().annotation_set_id,
                        type_name: mention.type_name.clone(),
                    });
                }
            }
        }
    }

    /// Under Strict span matching every non-gold group is scored against
    /// the same gold pool, so cumulative TP+FN must agree across groups.
    fn check_strict_invariant(&self) -> Result<()> {
        if self.span_policy != SpanMatchPolicy::Strict {
            return Ok(());
        }
        let mut totals = self
            .cumulative
            .iter()
            .map(|(id, result)| (*id, result.tp() + result.fn_()));
        let Some((first_id, first_total)) = totals.next() else {
            return Ok(());
        };
        for (id, total) in totals {
            if total != first_total {
                return Err(Error::evaluation(format!(
                    "gold pool mismatch: comparison group {first_id} has TP+FN={first_total} \
                     but group {id} has TP+FN={total}; the gold standard differed between \
                     comparisons"
                )));
            }
        }
        Ok(())
    }
}

/// Pool a comparison group's member annotations, deduplicated, in document
/// order. An annotation claimed by several member groups appears once.
fn pooled_annotations(
    comparison: &ComparisonGroup,
    membership: &BTreeMap<i64, Vec<usize>>,
    document: &DocumentAnnotations,
) -> Vec<TextAnnotation> {
    let mut indices: BTreeSet<usize> = BTreeSet::new();
    for member_id in &comparison.member_group_ids {
        if let Some(members) = membership.get(member_id) {
            indices.extend(members.iter().copied());
        }
    }
    let pooled: Vec<TextAnnotation> = indices
        .into_iter()
        .map(|index| document.annotations[index].clone())
        .collect();
    remove_duplicates(&pooled, &document.mentions)
}

/// Write TP/FP/FN outcomes back onto the document's annotations.
///
/// Runs once per non-gold comparison. A gold annotation matched by an
/// earlier comparison keeps its `TruePositive` even when a later comparison
/// misses it, so the written tags reflect the best outcome across the run.
fn tag_document(
    document: &mut DocumentAnnotations,
    gold_pool: &[TextAnnotation],
    test_pool: &[TextAnnotation],
    matches: &crate::compare::MatchResult,
) {
    let mut outcome_by_id: BTreeMap<i64, MatchOutcome> = BTreeMap::new();
    for &(gold_idx, test_idx) in &matches.matched {
        outcome_by_id.insert(gold_pool[gold_idx].id, MatchOutcome::TruePositive);
        outcome_by_id.insert(test_pool[test_idx].id, MatchOutcome::TruePositive);
    }
    for &gold_idx in &matches.unmatched_gold {
        outcome_by_id.insert(gold_pool[gold_idx].id, MatchOutcome::FalseNegative);
    }
    for &test_idx in &matches.unmatched_test {
        outcome_by_id.insert(test_pool[test_idx].id, MatchOutcome::FalsePositive);
    }

    for annotation in &mut document.annotations {
        if let Some(&outcome) = outcome_by_id.get(&annotation.id) {
            // TruePositive is sticky across comparisons
            if annotation.outcome != Some(MatchOutcome::TruePositive) {
                annotation.outcome = Some(outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotator, Span};

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    fn annotation(
        document: &mut DocumentAnnotations,
        id: i64,
        annotator_id: i64,
        set_id: i64,
        start: usize,
        end: usize,
        type_name: &str,
    ) {
        let root = document.mentions.add_mention(type_name);
        document.mentions.set_annotation(root, id);
        let ta = TextAnnotation::new(
            id,
            vec![span(start, end)],
            "text",
            Annotator::new(annotator_id, format!("annotator-{annotator_id}"), ""),
            "doc-1",
            root,
        )
        .with_set_ids([set_id]);
        document.annotations.push(ta);
    }

    fn three_group_config() -> EvalConfig {
        let gold = AnnotationGroup::new(1, 100, 0).with_type_names(["protein"]);
        let tagger_a = AnnotationGroup::new(2, 200, 0).with_type_names(["protein"]);
        let tagger_b = AnnotationGroup::new(3, 201, 0).with_type_names(["protein"]);
        EvalConfig::new(
            vec![gold, tagger_a, tagger_b],
            vec![
                ComparisonGroup::new(1, "gold").gold_standard().with_members([1]),
                ComparisonGroup::new(2, "tagger-a").with_members([2]),
                ComparisonGroup::new(3, "tagger-b").with_members([3]),
            ],
        )
    }

    fn two_group_config() -> EvalConfig {
        let gold_members = AnnotationGroup::new(1, 100, 0).with_type_names(["protein"]);
        let test_members = AnnotationGroup::new(2, 200, 0).with_type_names(["protein"]);
        EvalConfig::new(
            vec![gold_members, test_members],
            vec![
                ComparisonGroup::new(1, "gold").gold_standard().with_members([1]),
                ComparisonGroup::new(2, "tagger").with_members([2]),
            ],
        )
    }

    #[test]
    fn test_group_filter_membership() {
        let filter = GroupFilter::compile(
            AnnotationGroup::new(1, 100, 5).with_type_names(["protein"]),
        )
        .unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 5, 0, 4, "protein");
        annotation(&mut document, 2, 100, 5, 0, 4, "gene"); // wrong type
        annotation(&mut document, 3, 100, 9, 0, 4, "protein"); // wrong set
        annotation(&mut document, 4, 999, 5, 0, 4, "protein"); // wrong annotator

        let members: Vec<i64> = document
            .annotations
            .iter()
            .filter(|ta| filter.has_member(ta, &document.mentions))
            .map(|ta| ta.id)
            .collect();
        assert_eq!(members, vec![1]);
    }

    #[test]
    fn test_type_names_shadow_regexes() {
        // Regex would match "gene", but the explicit name list wins
        let filter = GroupFilter::compile(
            AnnotationGroup::new(1, 100, 5)
                .with_type_names(["protein"])
                .with_type_regexes(["^g.*"]),
        )
        .unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 5, 0, 4, "gene");
        assert!(!filter.has_member(&document.annotations[0], &document.mentions));
    }

    #[test]
    fn test_regex_membership() {
        let filter = GroupFilter::compile(
            AnnotationGroup::new(1, 100, 5).with_type_regexes(["^prot", "gene$"]),
        )
        .unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 5, 0, 4, "protein");
        annotation(&mut document, 2, 100, 5, 0, 4, "oncogene");
        annotation(&mut document, 3, 100, 5, 0, 4, "cell");

        let members: Vec<i64> = document
            .annotations
            .iter()
            .filter(|ta| filter.has_member(ta, &document.mentions))
            .map(|ta| ta.id)
            .collect();
        assert_eq!(members, vec![1, 2]);
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        let result = GroupFilter::compile(
            AnnotationGroup::new(1, 100, 5).with_type_regexes(["(unclosed"]),
        );
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_missing_gold_defaults_to_first() {
        let config = EvalConfig::new(
            vec![AnnotationGroup::new(1, 100, 0).with_type_names(["protein"])],
            vec![
                ComparisonGroup::new(1, "first").with_members([1]),
                ComparisonGroup::new(2, "second").with_members([1]),
            ],
        );
        let run = ScoringRun::new(config).unwrap();
        assert_eq!(run.gold_group.id, 1);
        assert_eq!(run.non_gold_groups.len(), 1);
    }

    #[test]
    fn test_two_gold_groups_rejected() {
        let config = EvalConfig::new(
            vec![AnnotationGroup::new(1, 100, 0)],
            vec![
                ComparisonGroup::new(1, "a").gold_standard().with_members([1]),
                ComparisonGroup::new(2, "b").gold_standard().with_members([1]),
            ],
        );
        assert!(matches!(
            ScoringRun::new(config).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_unknown_member_rejected() {
        let config = EvalConfig::new(
            vec![AnnotationGroup::new(1, 100, 0)],
            vec![ComparisonGroup::new(1, "a").gold_standard().with_members([99])],
        );
        assert!(matches!(
            ScoringRun::new(config).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_score_document_end_to_end() {
        let mut run = ScoringRun::new(two_group_config()).unwrap();

        let mut document = DocumentAnnotations::new();
        // Gold annotator 100: two proteins
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 100, 0, 10, 15, "protein");
        // Test annotator 200: one hit, one miss
        annotation(&mut document, 3, 200, 0, 0, 5, "protein");
        annotation(&mut document, 4, 200, 0, 40, 45, "protein");

        let results = run.score_document(&mut document).unwrap();
        let tagger = &results[&2];
        assert_eq!(tagger.tp(), 1);
        assert_eq!(tagger.fn_(), 1);
        assert_eq!(tagger.fp(), 1);

        let report = run.finish().unwrap();
        let total = &report.results[&2];
        assert_eq!(total.tp(), 1);
        assert_eq!(report.documents_scored, 1);
        assert_eq!(total.summary_line(), "tagger\t1\t1\t1\tP=0.5\tR=0.5\tF=0.5");
    }

    #[test]
    fn test_cumulative_merging_across_documents() {
        let mut run = ScoringRun::new(two_group_config()).unwrap();

        for doc_index in 0..3 {
            let mut document = DocumentAnnotations::new();
            let base = doc_index * 10;
            annotation(&mut document, base + 1, 100, 0, 0, 5, "protein");
            annotation(&mut document, base + 2, 200, 0, 0, 5, "protein");
            run.score_document(&mut document).unwrap();
        }

        let report = run.finish().unwrap();
        assert_eq!(report.results[&2].tp(), 3);
        assert_eq!(report.documents_scored, 3);
    }

    #[test]
    fn test_pool_deduplication() {
        // Two gold annotators produce the same annotation; the pooled gold
        // set keeps one
        let gold_a = AnnotationGroup::new(1, 100, 0).with_type_names(["protein"]);
        let gold_b = AnnotationGroup::new(2, 101, 0).with_type_names(["protein"]);
        let tagger = AnnotationGroup::new(3, 200, 0).with_type_names(["protein"]);
        let config = EvalConfig::new(
            vec![gold_a, gold_b, tagger],
            vec![
                ComparisonGroup::new(1, "gold").gold_standard().with_members([1, 2]),
                ComparisonGroup::new(2, "tagger").with_members([3]),
            ],
        );
        let mut run = ScoringRun::new(config).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 101, 0, 0, 5, "protein"); // duplicate of 1
        annotation(&mut document, 3, 200, 0, 0, 5, "protein");

        let results = run.score_document(&mut document).unwrap();
        // Without dedup the tagger would owe two matches and score FN=1
        assert_eq!(results[&2].tp(), 1);
        assert_eq!(results[&2].fn_(), 0);
        assert_eq!(results[&2].fp(), 0);
    }

    #[test]
    fn test_outcome_tagging() {
        let config = two_group_config().with_outcome_tagging();
        let mut run = ScoringRun::new(config).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein"); // matched gold
        annotation(&mut document, 2, 100, 0, 10, 15, "protein"); // missed gold
        annotation(&mut document, 3, 200, 0, 0, 5, "protein"); // matched test
        annotation(&mut document, 4, 200, 0, 40, 45, "protein"); // spurious test

        run.score_document(&mut document).unwrap();
        let outcome = |id: i64| {
            document
                .annotations
                .iter()
                .find(|ta| ta.id == id)
                .and_then(|ta| ta.outcome)
        };
        assert_eq!(outcome(1), Some(MatchOutcome::TruePositive));
        assert_eq!(outcome(2), Some(MatchOutcome::FalseNegative));
        assert_eq!(outcome(3), Some(MatchOutcome::TruePositive));
        assert_eq!(outcome(4), Some(MatchOutcome::FalsePositive));
    }

    #[test]
    fn test_profile_report() {
        let mut run = ScoringRun::new(two_group_config()).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 200, 0, 0, 5, "protein");
        // Annotator 300 is configured nowhere
        annotation(&mut document, 3, 300, 0, 0, 5, "protein");
        run.score_document(&mut document).unwrap();

        let report = run.finish().unwrap();
        assert_eq!(report.unmatched_profiles.len(), 1);
        assert_eq!(report.unmatched_profiles[0].annotator_id, 300);
        assert_eq!(report.matched_profiles.len(), 2);
    }

    #[test]
    fn test_strict_invariant_violation_is_fatal() {
        // Two non-gold groups whose filters disagree on the gold pool
        // cannot happen through the normal path (one gold pool per
        // document), so force the mismatch through the cumulative totals.
        let mut run = ScoringRun::new(three_group_config()).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 200, 0, 0, 5, "protein");
        annotation(&mut document, 3, 201, 0, 0, 5, "protein");
        run.score_document(&mut document).unwrap();

        // Artificially shrink tagger-b's gold pool
        run.cumulative
            .get_mut(&3)
            .unwrap()
            .true_positives
            .clear();
        assert!(matches!(
            run.finish().unwrap_err(),
            Error::Evaluation(_)
        ));
    }

    #[test]
    fn test_strict_invariant_holds_across_groups() {
        let mut run = ScoringRun::new(three_group_config()).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 100, 0, 10, 15, "protein");
        annotation(&mut document, 3, 200, 0, 0, 5, "protein");
        annotation(&mut document, 4, 201, 0, 40, 45, "protein");
        run.score_document(&mut document).unwrap();

        let report = run.finish().unwrap();
        let a = &report.results[&2];
        let b = &report.results[&3];
        assert_eq!(a.tp() + a.fn_(), b.tp() + b.fn_());
    }

    #[test]
    fn test_folds_arrive_one_group_at_a_time() {
        let mut run = ScoringRun::new(three_group_config()).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        let gold = document.annotations[0].clone();

        // Workers report per document and per group, so group 2's fold can
        // land before group 3's: a legal transient state under Strict
        let mut hit = PrfResult::new("tagger-a");
        hit.true_positives.push(gold.clone());
        run.fold_result(2, &hit).unwrap();

        let mut miss = PrfResult::new("tagger-b");
        miss.false_negatives.push(gold);
        run.fold_result(3, &miss).unwrap();

        let report = run.finish().unwrap();
        assert_eq!(report.results[&2].tp(), 1);
        assert_eq!(report.results[&3].fn_(), 1);
    }

    #[test]
    fn test_matched_gold_outcome_survives_later_comparisons() {
        // Gold matched by tagger-a must not be re-tagged FalseNegative
        // when tagger-b, scored afterwards, misses it
        let config = three_group_config().with_outcome_tagging();
        let mut run = ScoringRun::new(config).unwrap();

        let mut document = DocumentAnnotations::new();
        annotation(&mut document, 1, 100, 0, 0, 5, "protein");
        annotation(&mut document, 2, 200, 0, 0, 5, "protein");
        run.score_document(&mut document).unwrap();

        assert_eq!(
            document.annotations[0].outcome,
            Some(MatchOutcome::TruePositive)
        );
        assert_eq!(
            document.annotations[1].outcome,
            Some(MatchOutcome::TruePositive)
        );
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = two_group_config().with_outcome_tagging();
        let json = serde_json::to_string(&config).unwrap();
        let back: EvalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.annotation_groups, config.annotation_groups);
        assert_eq!(back.comparison_groups, config.comparison_groups);
        assert_eq!(back.span_policy, config.span_policy);
        assert!(back.tag_outcomes);
    }
}
