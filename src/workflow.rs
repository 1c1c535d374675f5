//! File-level merge and comparison workflows.
//!
//! The merge workflow is fail-fast: both inputs are fully validated and merged in
//! memory before anything is written.  The comparison workflow never fails; unusable
//! inputs degrade to empty merge sequences.

use std::path::Path;

use log::{info, warn};

use crate::config::{DocumentConfig, OutputConfig};
use crate::error::Result;
use crate::merge::merge_documents;
use crate::metrics::{MergeSummary, SimilarityReport};
use crate::serialization::{load_document, load_merges_lenient, save_document};
use crate::similarity::compare;

/// Merges `secondary` into `primary` and writes the result to `output`.
///
/// Nothing is written when either input fails validation or holds a malformed merge.
pub fn merge_files<P, S, O>(
    primary: P,
    secondary: S,
    output: O,
    config: &DocumentConfig,
    output_cfg: &OutputConfig,
) -> Result<MergeSummary>
where
    P: AsRef<Path>,
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    let primary_doc = load_document(primary.as_ref(), config)?;
    let secondary_doc = load_document(secondary.as_ref(), config)?;
    let outcome = merge_documents(&primary_doc, &secondary_doc)?;
    let summary = outcome.summary;

    info!(
        "vocab: {} + {} new = {} tokens ({} shared)",
        summary.primary_vocab, summary.tokens_added, summary.merged_vocab, summary.shared_tokens
    );
    info!(
        "merges: {} + {} = {} ({} format)",
        summary.primary_rules, summary.secondary_rules, summary.merged_rules, summary.format
    );
    if summary.duplicate_rules > 0 {
        warn!(
            "{} secondary merge rules already exist in the primary and were appended again",
            summary.duplicate_rules
        );
    }

    save_document(&outcome.document, output.as_ref(), output_cfg)?;
    info!("wrote merged tokenizer to {}", output.as_ref().display());
    Ok(summary)
}

/// Compares the merge tables of two documents without ever failing.
#[must_use]
pub fn compare_files<F, S>(first: F, second: S, config: &DocumentConfig) -> SimilarityReport
where
    F: AsRef<Path>,
    S: AsRef<Path>,
{
    let first_merges = load_merges_lenient(first.as_ref(), config);
    let second_merges = load_merges_lenient(second.as_ref(), config);
    info!(
        "comparing {} ({} merges) with {} ({} merges)",
        first.as_ref().display(),
        first_merges.len(),
        second.as_ref().display(),
        second_merges.len()
    );
    compare(&first_merges, &second_merges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokmergeError;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::tempdir;

    fn write_json(path: &Path, value: &Value) {
        fs::write(path, serde_json::to_string(value).expect("serialise")).expect("write json");
    }

    #[test]
    fn merge_files_writes_combined_document() {
        let dir = tempdir().expect("tempdir");
        let primary = dir.path().join("a.json");
        let secondary = dir.path().join("b.json");
        let output = dir.path().join("merged.json");
        write_json(
            &primary,
            &json!({"model": {"type": "BPE", "vocab": {"a": 0, "b": 1}, "merges": [["a", "b"]]}}),
        );
        write_json(
            &secondary,
            &json!({"model": {"vocab": {"b": 5, "c": 6}, "merges": ["b c"]}}),
        );

        let summary = merge_files(
            &primary,
            &secondary,
            &output,
            &DocumentConfig::default(),
            &OutputConfig::default(),
        )
        .expect("merge");
        assert_eq!(summary.merged_vocab, 3);

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&output).expect("read")).expect("parse");
        assert_eq!(written["model"]["vocab"], json!({"a": 0, "b": 1, "c": 2}));
        assert_eq!(written["model"]["merges"], json!([["a", "b"], ["b", "c"]]));
        assert_eq!(written["model"]["type"], "BPE");
    }

    #[test]
    fn merge_files_writes_nothing_on_invalid_input() {
        let dir = tempdir().expect("tempdir");
        let primary = dir.path().join("a.json");
        let secondary = dir.path().join("b.json");
        let output = dir.path().join("merged.json");
        write_json(&primary, &json!({"model": {"vocab": {"a": 0}, "merges": []}}));
        write_json(&secondary, &json!({"model": {"merges": []}}));

        let err = merge_files(
            &primary,
            &secondary,
            &output,
            &DocumentConfig::default(),
            &OutputConfig::default(),
        )
        .expect_err("secondary lacks a vocabulary");
        assert!(matches!(err, TokmergeError::Validation(_)));
        assert!(!output.exists());
    }

    #[test]
    fn merge_files_writes_nothing_on_malformed_merge() {
        let dir = tempdir().expect("tempdir");
        let primary = dir.path().join("a.json");
        let secondary = dir.path().join("b.json");
        let output = dir.path().join("merged.json");
        write_json(&primary, &json!({"model": {"vocab": {}, "merges": []}}));
        write_json(&secondary, &json!({"model": {"vocab": {}, "merges": ["lonely"]}}));

        let err = merge_files(
            &primary,
            &secondary,
            &output,
            &DocumentConfig::default(),
            &OutputConfig::default(),
        )
        .expect_err("malformed merge");
        assert!(matches!(err, TokmergeError::Format(_)));
        assert!(!output.exists());
    }

    #[test]
    fn compare_files_tolerates_missing_inputs() {
        let dir = tempdir().expect("tempdir");
        let present = dir.path().join("a.json");
        write_json(&present, &json!({"model": {"merges": ["a b"]}}));
        let report = compare_files(
            &present,
            dir.path().join("absent.json"),
            &DocumentConfig::default(),
        );
        assert_eq!(report.first_len, 1);
        assert_eq!(report.second_len, 0);
        assert_eq!(report.jaccard, 0.0);
        assert_eq!(report.order.compared, 0);

        let report = compare_files(
            dir.path().join("x.json"),
            dir.path().join("y.json"),
            &DocumentConfig::default(),
        );
        assert!(report.is_empty());
    }

    #[test]
    fn compare_files_reports_similarity() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        write_json(&first, &json!({"model": {"merges": [["a", "b"], ["c", "d"]]}}));
        write_json(&second, &json!({"model": {"merges": ["a b", "x y"]}}));
        let report = compare_files(&first, &second, &DocumentConfig::default());
        assert!((report.jaccard - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.order.matches, 1);
        assert_eq!(report.order.compared, 2);
    }
}
