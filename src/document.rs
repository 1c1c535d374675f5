//! In-memory model of a tokenizer document: vocabulary, merge table, and opaque metadata.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use crate::config::DocumentConfig;
use crate::error::{Result, TokmergeError};
use crate::rules::{detect_format, MergeFormat};

/// Token identifier used throughout the crate.
pub type TokenId = u32;

/// Token → identifier mapping that remembers insertion order.
///
/// Iteration follows the order tokens were inserted, which for loaded documents is
/// the order they appear on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<(String, TokenId)>,
    index: FxHashMap<String, usize>,
}

impl Vocabulary {
    /// Creates an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from `(token, id)` pairs; a repeated token keeps its first position
    /// and takes the last id supplied.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, TokenId)>,
        S: Into<String>,
    {
        let mut vocab = Self::new();
        for (token, id) in entries {
            vocab.insert(token, id);
        }
        vocab
    }

    /// Parses a JSON object of `token → id`, rejecting ids that are not unique `u32` values.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self> {
        let mut vocab = Self::new();
        vocab.entries.reserve(map.len());
        let mut seen_ids = FxHashSet::default();
        for (token, raw_id) in map {
            let id = raw_id
                .as_u64()
                .and_then(|id| TokenId::try_from(id).ok())
                .ok_or_else(|| {
                    TokmergeError::Validation(format!(
                        "token {token:?} has non-integer or out of range id {raw_id}"
                    ))
                })?;
            if !seen_ids.insert(id) {
                return Err(TokmergeError::Validation(format!(
                    "id {id} is assigned to more than one token (second: {token:?})"
                )));
            }
            vocab.insert(token.clone(), id);
        }
        Ok(vocab)
    }

    /// Serialises the vocabulary to a JSON object in insertion order.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(token, id)| (token.clone(), Value::from(*id)))
            .collect()
    }

    /// Inserts or updates a token, returning its previous id.
    pub fn insert(&mut self, token: impl Into<String>, id: TokenId) -> Option<TokenId> {
        let token = token.into();
        if let Some(&pos) = self.index.get(&token) {
            let previous = self.entries[pos].1;
            self.entries[pos].1 = id;
            return Some(previous);
        }
        self.index.insert(token.clone(), self.entries.len());
        self.entries.push((token, id));
        None
    }

    /// Returns the id of `token`, if present.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<TokenId> {
        self.index.get(token).map(|&pos| self.entries[pos].1)
    }

    /// Returns `true` when `token` is part of the vocabulary.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the vocabulary holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest identifier in use, or `None` for an empty vocabulary.
    #[must_use]
    pub fn max_id(&self) -> Option<TokenId> {
        self.entries.iter().map(|(_, id)| *id).max()
    }

    /// Iterates `(token, id)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TokenId)> + '_ {
        self.entries.iter().map(|(token, id)| (token.as_str(), *id))
    }

    /// Iterates tokens in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(token, _)| token.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, TokenId)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (S, TokenId)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// Tokenizer document with its vocabulary and merge table lifted out of the JSON tree.
///
/// Everything outside the vocabulary and merges (normalizers, added tokens, the BPE
/// model's other options, ...) is kept verbatim and written back by [`Self::to_value`].
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerDocument {
    root: Map<String, Value>,
    config: DocumentConfig,
    vocabulary: Vocabulary,
    merges: Vec<Value>,
    format: MergeFormat,
}

impl TokenizerDocument {
    /// Validates and splits a parsed JSON document.
    ///
    /// Fails with [`TokmergeError::Validation`] when the configured section, vocabulary,
    /// or merge table is absent or has the wrong shape.
    pub fn from_value(value: Value, config: &DocumentConfig) -> Result<Self> {
        config.validate()?;
        let mut root = match value {
            Value::Object(map) => map,
            other => {
                return Err(TokmergeError::Validation(format!(
                    "expected tokenizer document to be an object, found {}",
                    json_kind(&other)
                )))
            }
        };
        let section = root
            .get_mut(&config.section)
            .ok_or_else(|| {
                TokmergeError::Validation(format!("missing `{}` section", config.section))
            })?
            .as_object_mut()
            .ok_or_else(|| {
                TokmergeError::Validation(format!("`{}` section is not an object", config.section))
            })?;

        let vocab_value = section
            .remove(&config.vocab_key)
            .ok_or_else(|| {
                TokmergeError::Validation(format!(
                    "missing `{}.{}` field",
                    config.section, config.vocab_key
                ))
            })?;
        let merges_value = section
            .remove(&config.merges_key)
            .ok_or_else(|| {
                TokmergeError::Validation(format!(
                    "missing `{}.{}` field",
                    config.section, config.merges_key
                ))
            })?;

        let vocabulary = match &vocab_value {
            Value::Object(map) => Vocabulary::from_json_map(map)?,
            other => {
                return Err(TokmergeError::Validation(format!(
                    "`{}.{}` must be an object, found {}",
                    config.section,
                    config.vocab_key,
                    json_kind(other)
                )))
            }
        };
        let merges = match merges_value {
            Value::Array(items) => items,
            other => {
                return Err(TokmergeError::Validation(format!(
                    "`{}.{}` must be an array, found {}",
                    config.section,
                    config.merges_key,
                    json_kind(&other)
                )))
            }
        };
        let format = detect_format(&merges);

        Ok(Self {
            root,
            config: config.clone(),
            vocabulary,
            merges,
            format,
        })
    }

    /// Parses and validates a document from JSON text.
    pub fn from_json_str(data: &str, config: &DocumentConfig) -> Result<Self> {
        let value: Value = serde_json::from_str(data)?;
        Self::from_value(value, config)
    }

    /// Rebuilds the full JSON document with the current vocabulary and merges.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = self.root.clone();
        if let Some(Value::Object(section)) = root.get_mut(&self.config.section) {
            section.insert(
                self.config.vocab_key.clone(),
                Value::Object(self.vocabulary.to_json_map()),
            );
            section.insert(
                self.config.merges_key.clone(),
                Value::Array(self.merges.clone()),
            );
        }
        Value::Object(root)
    }

    /// Returns a new document sharing this document's metadata but holding the supplied tables.
    pub fn with_tables(&self, vocabulary: Vocabulary, merges: Vec<Value>) -> Self {
        let format = detect_format(&merges);
        Self {
            root: self.root.clone(),
            config: self.config.clone(),
            vocabulary,
            merges,
            format,
        }
    }

    /// Returns the vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Returns the raw merge entries in document order.
    #[must_use]
    pub fn merges(&self) -> &[Value] {
        &self.merges
    }

    /// Returns the merge encoding detected when the document was built.
    #[must_use]
    pub fn format(&self) -> MergeFormat {
        self.format
    }

    /// Returns a top-level metadata field.
    ///
    /// The vocabulary and merge keys are absent from the nested section; they are only
    /// written back by [`Self::to_value`].
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_value() -> Value {
        json!({
            "version": "1.0",
            "added_tokens": [{"id": 0, "content": "<unk>", "special": true}],
            "model": {
                "type": "BPE",
                "dropout": null,
                "vocab": {"<unk>": 0, "a": 1, "b": 2, "ab": 3},
                "merges": [["a", "b"]]
            }
        })
    }

    #[test]
    fn from_value_extracts_tables() {
        let doc = TokenizerDocument::from_value(sample_value(), &DocumentConfig::default())
            .expect("valid document");
        assert_eq!(doc.vocabulary().len(), 4);
        assert_eq!(doc.vocabulary().get("ab"), Some(3));
        assert_eq!(doc.merges(), &[json!(["a", "b"])]);
        assert_eq!(doc.format(), MergeFormat::Paired);
    }

    #[test]
    fn to_value_round_trips_metadata() {
        let original = sample_value();
        let doc = TokenizerDocument::from_value(original.clone(), &DocumentConfig::default())
            .expect("valid document");
        assert_eq!(doc.to_value(), original);
        assert_eq!(doc.metadata("version"), Some(&json!("1.0")));
    }

    #[test]
    fn metadata_omits_lifted_tables() {
        let doc = TokenizerDocument::from_value(sample_value(), &DocumentConfig::default())
            .expect("valid document");
        let section = doc
            .metadata("model")
            .and_then(Value::as_object)
            .expect("model section");
        assert!(!section.contains_key("vocab"));
        assert!(!section.contains_key("merges"));
        assert_eq!(section.get("type"), Some(&json!("BPE")));
        assert_eq!(section.get("dropout"), Some(&Value::Null));
    }

    #[test]
    fn vocabulary_keeps_file_order() {
        let doc = TokenizerDocument::from_json_str(
            r#"{"model": {"vocab": {"z": 7, "a": 3, "m": 5}, "merges": []}}"#,
            &DocumentConfig::default(),
        )
        .expect("valid document");
        let tokens: Vec<&str> = doc.vocabulary().tokens().collect();
        assert_eq!(tokens, vec!["z", "a", "m"]);
        assert_eq!(doc.vocabulary().max_id(), Some(7));
        assert_eq!(doc.format(), MergeFormat::Spaced);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let cfg = DocumentConfig::default();
        for value in [
            json!([]),
            json!({"vocab": {}, "merges": []}),
            json!({"model": "BPE"}),
            json!({"model": {"merges": []}}),
            json!({"model": {"vocab": {}}}),
            json!({"model": {"vocab": [], "merges": []}}),
            json!({"model": {"vocab": {}, "merges": "a b"}}),
        ] {
            let err = TokenizerDocument::from_value(value.clone(), &cfg)
                .expect_err("document should be rejected");
            assert!(matches!(err, TokmergeError::Validation(_)), "{value}: {err}");
        }
    }

    #[test]
    fn invalid_ids_are_rejected() {
        let cfg = DocumentConfig::default();
        for vocab in [
            json!({"a": -1}),
            json!({"a": "0"}),
            json!({"a": 1.5}),
            json!({"a": 4_294_967_296u64}),
            json!({"a": 0, "b": 0}),
        ] {
            let value = json!({"model": {"vocab": vocab, "merges": []}});
            let err = TokenizerDocument::from_value(value, &cfg).expect_err("bad ids");
            assert!(matches!(err, TokmergeError::Validation(_)), "{err}");
        }
    }

    #[test]
    fn custom_section_is_honoured() {
        let cfg = DocumentConfig::builder()
            .section("bpe")
            .build()
            .expect("config");
        let doc = TokenizerDocument::from_value(
            json!({"bpe": {"vocab": {"a": 0}, "merges": ["a a"]}}),
            &cfg,
        )
        .expect("valid document");
        assert_eq!(doc.vocabulary().len(), 1);
        assert_eq!(doc.format(), MergeFormat::Spaced);
    }

    #[test]
    fn with_tables_replaces_only_tables() {
        let doc = TokenizerDocument::from_value(sample_value(), &DocumentConfig::default())
            .expect("valid document");
        let replaced = doc.with_tables(Vocabulary::from_entries([("x", 9)]), vec![json!("x x")]);
        let value = replaced.to_value();
        assert_eq!(value["model"]["vocab"], json!({"x": 9}));
        assert_eq!(value["model"]["merges"], json!(["x x"]));
        assert_eq!(value["model"]["type"], "BPE");
        assert_eq!(value["added_tokens"], sample_value()["added_tokens"]);
        assert_eq!(replaced.format(), MergeFormat::Spaced);
    }

    #[test]
    fn vocabulary_insert_updates_in_place() {
        let mut vocab = Vocabulary::from_entries([("a", 0), ("b", 1)]);
        assert_eq!(vocab.insert("a", 5), Some(0));
        assert_eq!(vocab.insert("c", 2), None);
        let entries: Vec<(&str, TokenId)> = vocab.iter().collect();
        assert_eq!(entries, vec![("a", 5), ("b", 1), ("c", 2)]);
        assert!(vocab.contains("c"));
        assert!(!vocab.contains("d"));
    }

    #[test]
    fn empty_vocabulary_has_no_max_id() {
        assert_eq!(Vocabulary::new().max_id(), None);
        assert!(Vocabulary::new().is_empty());
    }
}
