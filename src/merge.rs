//! Combining two tokenizer documents into one.
//!
//! The primary document wins every conflict: its ids, its merge encoding, and its
//! metadata carry over unchanged.  Tokens only known to the secondary document are
//! appended with fresh ids above the primary's maximum, and the secondary merges are
//! appended after the primary's in the primary's encoding.

use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::document::{TokenId, TokenizerDocument, Vocabulary};
use crate::error::{Result, TokmergeError};
use crate::metrics::MergeSummary;
use crate::rules::{normalize, normalize_to};

/// Result of merging two documents.
#[must_use]
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Combined document carrying the primary's metadata.
    pub document: TokenizerDocument,
    /// Counts describing what the merge did.
    pub summary: MergeSummary,
}

/// Unions two vocabularies, keeping the primary's ids and numbering new tokens after its maximum.
///
/// Returns the merged vocabulary and the number of tokens taken from `secondary`.  The
/// secondary's own ids are discarded; merge rules reference tokens by string, so renumbering
/// does not change their meaning.
pub fn merge_vocabularies(
    primary: &Vocabulary,
    secondary: &Vocabulary,
) -> Result<(Vocabulary, usize)> {
    let mut merged = primary.clone();
    let first_new = match primary.max_id() {
        Some(max) => u64::from(max) + 1,
        None => 0,
    };
    let mut added = 0usize;
    for token in secondary.tokens() {
        if merged.contains(token) {
            continue;
        }
        let id = TokenId::try_from(first_new + added as u64).map_err(|_| {
            TokmergeError::Validation(format!(
                "merged vocabulary exceeds the id range while adding {token:?}"
            ))
        })?;
        merged.insert(token, id);
        added += 1;
    }
    Ok((merged, added))
}

/// Appends the secondary document's merges, re-encoded in the primary's format, to the
/// primary's merges.
///
/// Primary entries are copied verbatim.  Rules present in both documents appear twice;
/// no deduplication or reordering takes place.
pub fn merge_rules(
    primary: &TokenizerDocument,
    secondary: &TokenizerDocument,
) -> Result<Vec<Value>> {
    let target = primary.format();
    let mut merged = Vec::with_capacity(primary.merges().len() + secondary.merges().len());
    merged.extend_from_slice(primary.merges());
    for (idx, entry) in secondary.merges().iter().enumerate() {
        let converted = normalize_to(entry, target).map_err(|err| match err {
            TokmergeError::Format(message) => {
                TokmergeError::Format(format!("secondary merge {idx}: {message}"))
            }
            other => other,
        })?;
        merged.push(converted);
    }
    Ok(merged)
}

/// Merges `secondary` into a copy of `primary`.
///
/// Fails without producing a document when any secondary merge entry is malformed.
pub fn merge_documents(
    primary: &TokenizerDocument,
    secondary: &TokenizerDocument,
) -> Result<MergeOutcome> {
    let (vocabulary, tokens_added) =
        merge_vocabularies(primary.vocabulary(), secondary.vocabulary())?;
    let merges = merge_rules(primary, secondary)?;

    let summary = MergeSummary {
        primary_vocab: primary.vocabulary().len(),
        secondary_vocab: secondary.vocabulary().len(),
        merged_vocab: vocabulary.len(),
        tokens_added,
        shared_tokens: secondary.vocabulary().len() - tokens_added,
        primary_rules: primary.merges().len(),
        secondary_rules: secondary.merges().len(),
        merged_rules: merges.len(),
        duplicate_rules: count_shared_rules(primary.merges(), secondary.merges()),
        format: primary.format(),
    };
    let document = primary.with_tables(vocabulary, merges);
    Ok(MergeOutcome { document, summary })
}

/// Counts secondary rules whose canonical pair already occurs among the primary rules.
///
/// Primary entries that fail to normalise are ignored here; the count only informs
/// diagnostics.
fn count_shared_rules(primary: &[Value], secondary: &[Value]) -> usize {
    let known: FxHashSet<_> = primary.iter().filter_map(|e| normalize(e).ok()).collect();
    secondary
        .iter()
        .filter_map(|e| normalize(e).ok())
        .filter(|rule| known.contains(rule))
        .count()
}
