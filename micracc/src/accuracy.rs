//! Accuracy classification engine
//!
//! Compares one recognition outcome per check against its (raw or
//! corrected) ground truth, files the check id into the review bucket
//! the human workflow expects, and keeps running match statistics for
//! the batch. Knows nothing about scheduling; `classify` is called from
//! whatever order the in-flight jobs complete in.

use crate::ledger::EvaluationLedger;
use crate::report::Reporter;
use micracc_common::micr::{decode_override, GroundTruthRecord, RecognitionOutcome};
use micracc_common::{CheckId, Result};
use std::collections::BTreeSet;

/// Review bucket assigned to a check after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// The recorded ground truth was wrong (a correction override
    /// exists); the check was still scored against the corrected value
    WrongGroundTruth,
    /// Fresh mismatch, nobody has triaged it yet
    NeedsEvaluation,
    /// A previously triaged failure now passes; the triage reason may
    /// no longer apply, or the fix regressed something else
    NeedsReevaluation,
}

/// Decide the review bucket for one classified check.
///
/// Precedence is deliberate and must be kept: a correction override
/// claims the check outright, even when the check independently
/// mismatches its corrected expectation. Such a check produces no
/// evaluation signal at all; that gap is known and accepted because it
/// reflects how the review workflow has always behaved.
pub fn bucket_for(matched: bool, has_override: bool, already_evaluated: bool) -> Option<Bucket> {
    if has_override {
        Some(Bucket::WrongGroundTruth)
    } else if !matched && !already_evaluated {
        Some(Bucket::NeedsEvaluation)
    } else if matched && already_evaluated {
        Some(Bucket::NeedsReevaluation)
    } else {
        // Fresh match, or a mismatch already filed under some reason
        None
    }
}

/// Running accuracy state for one batch run.
///
/// Owns the accumulated id sets for the lifetime of the run; the ledger
/// is read-only after construction. Mutated only from `classify`.
pub struct AccuracyTally {
    ledger: EvaluationLedger,
    show_matches: bool,
    reporter: Box<dyn Reporter>,
    matches: BTreeSet<CheckId>,
    mismatches: BTreeSet<CheckId>,
    wrong_in_ground_truth: BTreeSet<CheckId>,
    to_evaluate: BTreeSet<CheckId>,
    to_reevaluate: BTreeSet<CheckId>,
}

impl AccuracyTally {
    pub fn new(ledger: EvaluationLedger, show_matches: bool, reporter: Box<dyn Reporter>) -> Self {
        Self {
            ledger,
            show_matches,
            reporter,
            matches: BTreeSet::new(),
            mismatches: BTreeSet::new(),
            wrong_in_ground_truth: BTreeSet::new(),
            to_evaluate: BTreeSet::new(),
            to_reevaluate: BTreeSet::new(),
        }
    }

    /// Classify one check: resolve the expected triple, test the outcome
    /// against it, file the review bucket, and record the match.
    ///
    /// Returns whether the check matched. A resolution failure (missing
    /// ground-truth fields, malformed override) aborts this comparison
    /// before any set is touched; the caller decides whether that kills
    /// the batch.
    pub fn classify(
        &mut self,
        id: CheckId,
        ground_truth: &GroundTruthRecord,
        outcome: &RecognitionOutcome,
    ) -> Result<bool> {
        let has_override = self.ledger.override_for(id).is_some();
        let expected = match self.ledger.override_for(id) {
            Some(raw) => decode_override(raw)?,
            None => ground_truth.expected_fields()?,
        };

        // Matched as soon as any single engine reproduces the triple
        let matched = outcome.values().any(|fields| fields.matches(&expected));

        match bucket_for(matched, has_override, self.ledger.is_evaluated(id)) {
            Some(Bucket::WrongGroundTruth) => {
                self.wrong_in_ground_truth.insert(id);
            }
            Some(Bucket::NeedsEvaluation) => {
                self.to_evaluate.insert(id);
            }
            Some(Bucket::NeedsReevaluation) => {
                self.to_reevaluate.insert(id);
            }
            None => {}
        }

        if matched {
            self.matches.insert(id);
        } else {
            self.mismatches.insert(id);
        }

        if let Some(percentage) = self.match_percentage() {
            // Completion order, not id order; only report() is sorted
            tracing::debug!(check = id, matched, running = %percentage, "classified check");
        }

        Ok(matched)
    }

    /// Running match percentage, formatted to two decimals with a
    /// trailing `%`. `None` until the first comparison completes.
    pub fn match_percentage(&self) -> Option<String> {
        let total = self.matches.len() + self.mismatches.len();
        if total == 0 {
            return None;
        }
        Some(format!(
            "{:.2}%",
            self.matches.len() as f64 / total as f64 * 100.0
        ))
    }

    /// Number of comparisons recorded so far
    pub fn total_compared(&self) -> usize {
        self.matches.len() + self.mismatches.len()
    }

    pub fn matches(&self) -> &BTreeSet<CheckId> {
        &self.matches
    }

    pub fn mismatches(&self) -> &BTreeSet<CheckId> {
        &self.mismatches
    }

    pub fn wrong_in_ground_truth(&self) -> &BTreeSet<CheckId> {
        &self.wrong_in_ground_truth
    }

    pub fn to_evaluate(&self) -> &BTreeSet<CheckId> {
        &self.to_evaluate
    }

    pub fn to_reevaluate(&self) -> &BTreeSet<CheckId> {
        &self.to_reevaluate
    }

    /// Emit the end-of-run report through the injected reporter.
    ///
    /// Ids print ascending. No output at all when zero comparisons
    /// completed.
    pub fn report(&self) {
        let total = self.total_compared();
        if total == 0 {
            return;
        }

        if self.show_matches {
            self.reporter
                .line(&format!("Matched checks: {:?}", ids_of(&self.matches)));
        }
        self.reporter
            .line(&format!("Mismatched checks: {:?}", ids_of(&self.mismatches)));
        self.reporter.line(&format!(
            "Checks needing evaluation: {:?}",
            ids_of(&self.to_evaluate)
        ));
        self.reporter.line(&format!(
            "Checks needing reevaluation: {:?}",
            ids_of(&self.to_reevaluate)
        ));

        self.reporter.line(&format!(
            "Matched {} of {} checks",
            self.matches.len(),
            total
        ));
        self.reporter.line(&format!(
            "Wrong ground truth: {}",
            self.wrong_in_ground_truth.len()
        ));
        if let Some(percentage) = self.match_percentage() {
            self.reporter.line(&format!("Match rate: {}", percentage));
        }
        self.reporter.line(&format!(
            "Wrong ground truth rate: {:.2}%",
            self.wrong_in_ground_truth.len() as f64 / total as f64 * 100.0
        ));
    }
}

fn ids_of(set: &BTreeSet<CheckId>) -> Vec<CheckId> {
    set.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EvaluationLedger;
    use micracc_common::micr::EngineFields;
    use micracc_common::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Reporter capturing lines for assertions
    #[derive(Default)]
    struct CollectingReporter {
        lines: Rc<RefCell<Vec<String>>>,
    }

    impl Reporter for CollectingReporter {
        fn line(&self, text: &str) {
            self.lines.borrow_mut().push(text.to_string());
        }
    }

    fn collecting_reporter() -> (Box<dyn Reporter>, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let reporter = CollectingReporter {
            lines: Rc::clone(&lines),
        };
        (Box::new(reporter), lines)
    }

    fn ground_truth() -> GroundTruthRecord {
        GroundTruthRecord {
            payor_bank_routing_number: Some("1234567".to_string()),
            payor_bank_check_digit: Some("8".to_string()),
            on_us: Some("1234567890/".to_string()),
            auxiliary_on_us: Some("1234567".to_string()),
        }
    }

    fn matching_fields() -> EngineFields {
        EngineFields {
            routing_number: Some("12345678".to_string()),
            account_number: Some("1234567890U".to_string()),
            check_number: Some("1234567".to_string()),
        }
    }

    fn mismatching_fields() -> EngineFields {
        EngineFields {
            routing_number: Some("99999999".to_string()),
            account_number: Some("1234567890U".to_string()),
            check_number: Some("1234567".to_string()),
        }
    }

    fn outcome_of(engines: Vec<(&str, EngineFields)>) -> RecognitionOutcome {
        engines
            .into_iter()
            .map(|(name, fields)| (name.to_string(), fields))
            .collect()
    }

    fn ledger_with(evaluated: &[CheckId], overrides: &[(CheckId, &str)]) -> EvaluationLedger {
        let json = serde_json::json!({
            "mismatchesByReason": { "prior triage": evaluated },
            "correctX9": overrides
                .iter()
                .map(|(id, raw)| (id.to_string(), serde_json::Value::from(*raw)))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        });
        serde_json::from_value(json).unwrap()
    }

    fn tally(ledger: EvaluationLedger) -> AccuracyTally {
        let (reporter, _) = collecting_reporter();
        AccuracyTally::new(ledger, false, reporter)
    }

    #[test]
    fn bucket_precedence_table() {
        use Bucket::*;
        // (matched, has_override, already_evaluated) -> bucket
        assert_eq!(bucket_for(false, true, false), Some(WrongGroundTruth));
        assert_eq!(bucket_for(false, true, true), Some(WrongGroundTruth));
        assert_eq!(bucket_for(true, true, false), Some(WrongGroundTruth));
        assert_eq!(bucket_for(true, true, true), Some(WrongGroundTruth));
        assert_eq!(bucket_for(false, false, false), Some(NeedsEvaluation));
        assert_eq!(bucket_for(true, false, true), Some(NeedsReevaluation));
        // Fresh match and already-triaged mismatch need no action
        assert_eq!(bucket_for(true, false, false), None);
        assert_eq!(bucket_for(false, false, true), None);
    }

    #[test]
    fn any_single_engine_match_counts() {
        let mut tally = tally(EvaluationLedger::default());
        let outcome = outcome_of(vec![
            ("alpha", mismatching_fields()),
            ("beta", matching_fields()),
        ]);

        let matched = tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(matched);
        assert!(tally.matches().contains(&7));
        assert!(tally.mismatches().is_empty());
        assert!(tally.to_evaluate().is_empty());
    }

    #[test]
    fn fresh_mismatch_needs_evaluation() {
        let mut tally = tally(EvaluationLedger::default());
        let outcome = outcome_of(vec![("alpha", mismatching_fields())]);

        let matched = tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(!matched);
        assert!(tally.mismatches().contains(&7));
        assert!(tally.to_evaluate().contains(&7));
        assert!(tally.to_reevaluate().is_empty());
    }

    #[test]
    fn triaged_mismatch_needs_no_action() {
        let mut tally = tally(ledger_with(&[7], &[]));
        let outcome = outcome_of(vec![("alpha", mismatching_fields())]);

        tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(tally.mismatches().contains(&7));
        assert!(tally.to_evaluate().is_empty());
        assert!(tally.to_reevaluate().is_empty());
    }

    #[test]
    fn triaged_check_that_now_matches_needs_reevaluation() {
        let mut tally = tally(ledger_with(&[7], &[]));
        let outcome = outcome_of(vec![("alpha", matching_fields())]);

        tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(tally.matches().contains(&7));
        assert!(!tally.mismatches().contains(&7));
        assert!(tally.to_reevaluate().contains(&7));
        assert!(tally.to_evaluate().is_empty());
    }

    #[test]
    fn override_scores_against_corrected_expectation() {
        let mut tally = tally(ledger_with(&[], &[(7, "T123456789T123456789012U124")]));
        let corrected = EngineFields {
            routing_number: Some("123456789".to_string()),
            account_number: Some("123456789012".to_string()),
            check_number: Some("124".to_string()),
        };
        let outcome = outcome_of(vec![("alpha", corrected)]);

        // The raw record disagrees with the override; the override wins
        let matched = tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(matched);
        assert!(tally.matches().contains(&7));
        assert!(tally.wrong_in_ground_truth().contains(&7));
        assert!(tally.to_evaluate().is_empty());
        assert!(tally.to_reevaluate().is_empty());
    }

    #[test]
    fn overridden_mismatch_generates_no_evaluation_signal() {
        let mut tally = tally(ledger_with(&[], &[(7, "T123456789T123456789012U124")]));
        let outcome = outcome_of(vec![("alpha", mismatching_fields())]);

        let matched = tally.classify(7, &ground_truth(), &outcome).unwrap();

        assert!(!matched);
        assert!(tally.mismatches().contains(&7));
        assert!(tally.wrong_in_ground_truth().contains(&7));
        // Known precedence gap: no review signal despite the mismatch
        assert!(tally.to_evaluate().is_empty());
        assert!(tally.to_reevaluate().is_empty());
    }

    #[test]
    fn resolution_failure_leaves_sets_untouched() {
        let mut tally = tally(EvaluationLedger::default());
        let outcome = outcome_of(vec![("alpha", matching_fields())]);

        let err = tally
            .classify(7, &GroundTruthRecord::default(), &outcome)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
        assert_eq!(tally.total_compared(), 0);
        assert!(tally.to_evaluate().is_empty());
        assert!(tally.wrong_in_ground_truth().is_empty());
    }

    #[test]
    fn match_and_mismatch_sets_are_disjoint() {
        let mut tally = tally(EvaluationLedger::default());
        for id in 1..=6u32 {
            let fields = if id % 2 == 0 {
                matching_fields()
            } else {
                mismatching_fields()
            };
            tally
                .classify(id, &ground_truth(), &outcome_of(vec![("alpha", fields)]))
                .unwrap();
        }

        assert_eq!(tally.total_compared(), 6);
        assert!(tally.matches().is_disjoint(tally.mismatches()));
        assert!(tally.to_evaluate().is_disjoint(tally.to_reevaluate()));
        assert!(tally.to_evaluate().is_disjoint(tally.wrong_in_ground_truth()));
        assert!(tally
            .to_reevaluate()
            .is_disjoint(tally.wrong_in_ground_truth()));
    }

    #[test]
    fn percentage_formats_to_two_decimals() {
        let mut tally = tally(EvaluationLedger::default());
        for id in 1..=100u32 {
            let fields = if id <= 98 {
                matching_fields()
            } else {
                mismatching_fields()
            };
            tally
                .classify(id, &ground_truth(), &outcome_of(vec![("alpha", fields)]))
                .unwrap();
        }
        assert_eq!(tally.match_percentage().as_deref(), Some("98.00%"));
    }

    #[test]
    fn percentage_undefined_before_first_comparison() {
        let tally = tally(EvaluationLedger::default());
        assert_eq!(tally.match_percentage(), None);
    }

    #[test]
    fn report_with_zero_comparisons_emits_nothing() {
        let (reporter, lines) = collecting_reporter();
        let tally = AccuracyTally::new(EvaluationLedger::default(), true, reporter);

        tally.report();

        assert!(lines.borrow().is_empty());
    }

    #[test]
    fn report_hides_matches_unless_requested() {
        let (reporter, lines) = collecting_reporter();
        let mut tally = AccuracyTally::new(EvaluationLedger::default(), false, reporter);
        tally
            .classify(
                3,
                &ground_truth(),
                &outcome_of(vec![("alpha", matching_fields())]),
            )
            .unwrap();

        tally.report();

        let lines = lines.borrow();
        assert!(!lines.iter().any(|l| l.starts_with("Matched checks:")));
        assert!(lines.iter().any(|l| l == "Matched 1 of 1 checks"));
        assert!(lines.iter().any(|l| l == "Match rate: 100.00%"));
    }

    #[test]
    fn report_lists_ids_ascending() {
        let (reporter, lines) = collecting_reporter();
        let mut tally = AccuracyTally::new(EvaluationLedger::default(), true, reporter);
        // Classified out of id order, as concurrent completion would
        for id in [9u32, 2, 5] {
            tally
                .classify(
                    id,
                    &ground_truth(),
                    &outcome_of(vec![("alpha", mismatching_fields())]),
                )
                .unwrap();
        }

        tally.report();

        let lines = lines.borrow();
        assert!(lines.iter().any(|l| l == "Mismatched checks: [2, 5, 9]"));
        assert!(lines
            .iter()
            .any(|l| l == "Checks needing evaluation: [2, 5, 9]"));
        assert!(lines.iter().any(|l| l == "Match rate: 0.00%"));
        assert!(lines
            .iter()
            .any(|l| l == "Wrong ground truth rate: 0.00%"));
    }
}
