//! Evaluation ledger
//!
//! Process-scoped record of the human review workflow, loaded once per
//! run: which mismatching check ids have already been triaged (and under
//! what reason), and which checks have operator-corrected ground truth.

use micracc_common::{CheckId, Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Ledger document, read-only after construction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationLedger {
    /// Triaged mismatches: free-form reason to the set of check ids
    /// filed under it. The union across reasons is the
    /// "already evaluated" set.
    #[serde(default)]
    pub mismatches_by_reason: BTreeMap<String, BTreeSet<CheckId>>,

    /// Operator corrections: check id to an override ground-truth string
    /// in the X9 symbolic alphabet. Presence also flags that the
    /// recorded ground truth was wrong.
    #[serde(default)]
    pub correct_x9: BTreeMap<CheckId, String>,
}

impl EvaluationLedger {
    /// Load the ledger from a JSON document.
    ///
    /// An absent file is an empty ledger; an unparseable one is a fatal
    /// configuration error, raised before any classification begins.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No evaluation ledger at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read evaluation ledger {}: {}",
                path.display(),
                e
            ))
        })?;
        let ledger: EvaluationLedger = serde_json::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "Failed to parse evaluation ledger {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            reasons = ledger.mismatches_by_reason.len(),
            corrections = ledger.correct_x9.len(),
            "Loaded evaluation ledger from {}",
            path.display()
        );
        Ok(ledger)
    }

    /// Whether `id` has already been triaged under any reason
    pub fn is_evaluated(&self, id: CheckId) -> bool {
        self.mismatches_by_reason
            .values()
            .any(|ids| ids.contains(&id))
    }

    /// Correction override for `id`, when one exists
    pub fn override_for(&self, id: CheckId) -> Option<&str> {
        self.correct_x9.get(&id).map(String::as_str)
    }
}
