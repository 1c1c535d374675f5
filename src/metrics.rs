//! Summaries describing merge and comparison runs.

use serde::{Deserialize, Serialize};

use crate::rules::MergeFormat;
use crate::similarity::OrderAgreement;

/// Counts captured while merging two documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeSummary {
    /// Tokens in the primary vocabulary.
    pub primary_vocab: usize,
    /// Tokens in the secondary vocabulary.
    pub secondary_vocab: usize,
    /// Tokens in the merged vocabulary.
    pub merged_vocab: usize,
    /// Secondary tokens that received a fresh id.
    pub tokens_added: usize,
    /// Secondary tokens already present in the primary vocabulary.
    pub shared_tokens: usize,
    /// Merge rules contributed by the primary document.
    pub primary_rules: usize,
    /// Merge rules contributed by the secondary document.
    pub secondary_rules: usize,
    /// Merge rules in the merged document.
    pub merged_rules: usize,
    /// Secondary rules whose pair already occurs in the primary; they are kept regardless.
    pub duplicate_rules: usize,
    /// Merge encoding of the merged document.
    pub format: MergeFormat,
}

/// Similarity statistics between two merge sequences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityReport {
    /// Entries in the first sequence.
    pub first_len: usize,
    /// Entries in the second sequence.
    pub second_len: usize,
    /// Jaccard index of the two rule sets.
    pub jaccard: f64,
    /// Positional agreement over the shorter sequence.
    pub order: OrderAgreement,
}

impl SimilarityReport {
    /// Returns `true` when both sequences were empty, in which case the Jaccard value of
    /// `1.0` carries no information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_len == 0 && self.second_len == 0
    }
}
