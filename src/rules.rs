//! Merge rule representation and conversion between the two on-disk encodings.
//!
//! Hugging Face `tokenizer.json` files store merges either as two-element arrays
//! (`["Ġ", "t"]`, written by `tokenizers` >= 0.20) or as a single space separated
//! string (`"Ġ t"`, the older layout).  A document always uses one encoding for
//! every entry, so the encoding is detected once from the first entry and carried
//! around as a [`MergeFormat`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TokmergeError};

/// On-disk encoding of a document's merge entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeFormat {
    /// Two-element array: `["left", "right"]`.
    Paired,
    /// Single string with the tokens separated by one space: `"left right"`.
    #[default]
    Spaced,
}

impl fmt::Display for MergeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MergeFormat::Paired => "paired",
            MergeFormat::Spaced => "spaced",
        };
        f.write_str(label)
    }
}

/// Canonical form of a merge rule, independent of its on-disk encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MergeRule {
    /// Token on the left side of the merge.
    pub left: String,
    /// Token on the right side of the merge.
    pub right: String,
}

impl MergeRule {
    /// Creates a rule from its two tokens.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Encodes the rule using the requested on-disk format.
    #[must_use]
    pub fn encode(&self, format: MergeFormat) -> Value {
        match format {
            MergeFormat::Paired => Value::Array(vec![
                Value::String(self.left.clone()),
                Value::String(self.right.clone()),
            ]),
            MergeFormat::Spaced => Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for MergeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.left, self.right)
    }
}

impl From<(String, String)> for MergeRule {
    fn from((left, right): (String, String)) -> Self {
        Self { left, right }
    }
}

/// Detects the encoding of a merge sequence by inspecting its first entry.
///
/// A two-element array selects [`MergeFormat::Paired`]; a string, an empty
/// sequence, or any other shape falls back to [`MergeFormat::Spaced`].
#[must_use]
pub fn detect_format(entries: &[Value]) -> MergeFormat {
    match entries.first() {
        Some(Value::Array(items)) if items.len() == 2 => MergeFormat::Paired,
        _ => MergeFormat::Spaced,
    }
}

/// Converts a raw merge entry in either encoding into its canonical [`MergeRule`].
pub fn normalize(entry: &Value) -> Result<MergeRule> {
    match entry {
        Value::Array(items) => match items.as_slice() {
            [Value::String(left), Value::String(right)] => Ok(MergeRule::new(left, right)),
            _ => Err(TokmergeError::Format(format!(
                "expected two string tokens, found {entry}"
            ))),
        },
        Value::String(raw) => {
            let mut parts = raw.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(left), Some(right)) => Ok(MergeRule::new(left, right)),
                _ => Err(TokmergeError::Format(format!(
                    "expected two whitespace separated tokens in {raw:?}"
                ))),
            }
        }
        other => Err(TokmergeError::Format(format!(
            "expected an array or string, found {other}"
        ))),
    }
}

/// Normalises a raw merge entry and re-encodes it in `target` format.
///
/// Both encodings are accepted as input regardless of `target`, so the
/// conversion is idempotent.
pub fn normalize_to(entry: &Value, target: MergeFormat) -> Result<Value> {
    normalize(entry).map(|rule| rule.encode(target))
}

/// Normalises every entry of a merge sequence, failing on the first malformed one.
pub fn normalize_all(entries: &[Value]) -> Result<Vec<MergeRule>> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            normalize(entry).map_err(|err| match err {
                TokmergeError::Format(message) => {
                    TokmergeError::Format(format!("entry {idx}: {message}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detect_format_inspects_first_entry() {
        assert_eq!(detect_format(&[json!(["a", "b"])]), MergeFormat::Paired);
        assert_eq!(detect_format(&[json!("a b")]), MergeFormat::Spaced);
        assert_eq!(detect_format(&[]), MergeFormat::Spaced);
        // Later entries are never consulted.
        assert_eq!(
            detect_format(&[json!("a b"), json!(["c", "d"])]),
            MergeFormat::Spaced
        );
    }

    #[test]
    fn detect_format_defaults_to_spaced_for_odd_shapes() {
        assert_eq!(detect_format(&[json!(["a"])]), MergeFormat::Spaced);
        assert_eq!(detect_format(&[json!(42)]), MergeFormat::Spaced);
    }

    #[test]
    fn normalize_accepts_both_encodings() {
        let expected = MergeRule::new("Ġ", "t");
        assert_eq!(normalize(&json!(["Ġ", "t"])).expect("paired"), expected);
        assert_eq!(normalize(&json!("Ġ t")).expect("spaced"), expected);
    }

    #[test]
    fn normalize_to_converts_between_formats() {
        let spaced = normalize_to(&json!(["a", "b"]), MergeFormat::Spaced).expect("convert");
        assert_eq!(spaced, json!("a b"));
        let paired = normalize_to(&json!("a b"), MergeFormat::Paired).expect("convert");
        assert_eq!(paired, json!(["a", "b"]));
    }

    #[test]
    fn normalize_to_is_idempotent() {
        let once = normalize_to(&json!("a b"), MergeFormat::Paired).expect("first pass");
        let twice = normalize_to(&once, MergeFormat::Paired).expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_collapses_extra_whitespace() {
        let rule = normalize(&json!("a   b")).expect("spaced with padding");
        assert_eq!(rule, MergeRule::new("a", "b"));
        assert_eq!(rule.encode(MergeFormat::Spaced), json!("a b"));
    }

    #[test]
    fn normalize_rejects_malformed_entries() {
        for entry in [
            json!([123]),
            json!(["a"]),
            json!(["a", "b", "c"]),
            json!(["a", 1]),
            json!("single"),
            json!(""),
            json!(null),
            json!({"left": "a", "right": "b"}),
        ] {
            let err = normalize(&entry).expect_err("entry should be rejected");
            assert!(matches!(err, TokmergeError::Format(_)), "{entry}: {err}");
        }
    }

    #[test]
    fn normalize_all_reports_failing_index() {
        let entries = vec![json!("a b"), json!(["c", "d"]), json!([1])];
        let err = normalize_all(&entries).expect_err("third entry is malformed");
        assert!(matches!(
            err,
            TokmergeError::Format(message) if message.starts_with("entry 2:")
        ));
    }

    #[test]
    fn rule_from_tuple_matches_normalized_entry() {
        let rule = MergeRule::from(("Ġ".to_string(), "t".to_string()));
        assert_eq!(rule, normalize(&json!("Ġ t")).expect("spaced"));
    }

    #[test]
    fn display_uses_spaced_encoding() {
        assert_eq!(MergeRule::new("x", "y").to_string(), "x y");
        assert_eq!(MergeFormat::Paired.to_string(), "paired");
    }
}
