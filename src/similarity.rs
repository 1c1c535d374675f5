//! Structural similarity between two merge sequences.
//!
//! Both metrics are fail-soft: a sequence containing any malformed entry is treated
//! as unusable and the metric collapses to its "no similarity" value instead of
//! returning an error.

use log::debug;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metrics::SimilarityReport;
use crate::rules::{normalize_all, MergeRule};

/// Number of positions at which two merge sequences hold the same rule.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderAgreement {
    /// Positions holding identical rules.
    pub matches: usize,
    /// Positions compared, i.e. the length of the shorter sequence.
    pub compared: usize,
}

impl OrderAgreement {
    /// Fraction of compared positions that match, or `None` when nothing was compared.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        (self.compared > 0).then(|| self.matches as f64 / self.compared as f64)
    }
}

fn canonical(entries: &[Value]) -> Option<Vec<MergeRule>> {
    match normalize_all(entries) {
        Ok(rules) => Some(rules),
        Err(err) => {
            debug!("discarding merge sequence of {} entries: {err}", entries.len());
            None
        }
    }
}

/// Jaccard index of the two sequences' rule sets.
///
/// Returns `1.0` when both are empty, `0.0` when exactly one is empty or either holds a
/// malformed entry.
#[must_use]
pub fn jaccard_similarity(first: &[Value], second: &[Value]) -> f64 {
    let (Some(first), Some(second)) = (canonical(first), canonical(second)) else {
        return 0.0;
    };
    let first: FxHashSet<MergeRule> = first.into_iter().collect();
    let second: FxHashSet<MergeRule> = second.into_iter().collect();
    match (first.is_empty(), second.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let intersection = first.intersection(&second).count();
            let union = first.len() + second.len() - intersection;
            intersection as f64 / union as f64
        }
    }
}

/// Counts positions where both sequences hold the same rule, up to the shorter length.
///
/// Returns `(0, 0)` when either sequence holds a malformed entry.  No ratio is computed
/// here; see [`OrderAgreement::ratio`].
#[must_use]
pub fn order_agreement(first: &[Value], second: &[Value]) -> OrderAgreement {
    let (Some(first), Some(second)) = (canonical(first), canonical(second)) else {
        return OrderAgreement::default();
    };
    let compared = first.len().min(second.len());
    let matches = first
        .iter()
        .zip(second.iter())
        .filter(|(left, right)| left == right)
        .count();
    OrderAgreement { matches, compared }
}

/// Computes both metrics for a pair of merge sequences.
pub fn compare(first: &[Value], second: &[Value]) -> SimilarityReport {
    SimilarityReport {
        first_len: first.len(),
        second_len: second.len(),
        jaccard: jaccard_similarity(first, second),
        order: order_agreement(first, second),
    }
}
