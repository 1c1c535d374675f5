//! Reading and writing Hugging Face style `tokenizer.json` documents.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, warn};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::{DocumentConfig, OutputConfig};
use crate::document::TokenizerDocument;
use crate::error::{Result, TokmergeError};

/// Loads and validates a tokenizer document.
///
/// Any missing section, vocabulary, or merge table is reported as
/// [`TokmergeError::Validation`].
pub fn load_document<P: AsRef<Path>>(
    path: P,
    config: &DocumentConfig,
) -> Result<TokenizerDocument> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .map_err(|err| TokmergeError::io(err, Some(path.to_path_buf())))?;
    let value: Value = serde_json::from_str(&data).map_err(|err| {
        TokmergeError::Serialization(format!("failed to parse {}: {err}", path.display()))
    })?;
    let document = TokenizerDocument::from_value(value, config).map_err(|err| match err {
        TokmergeError::Validation(message) => {
            TokmergeError::Validation(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    debug!(
        "loaded {}: vocab={} merges={} format={}",
        path.display(),
        document.vocabulary().len(),
        document.merges().len(),
        document.format()
    );
    Ok(document)
}

/// Loads only the raw merge entries of a document, returning an empty sequence when the
/// file cannot be read, parsed, or lacks the merge table.
///
/// Meant for exploratory comparisons over partial or experimental artefacts; the reason
/// for an empty result is logged at `warn` level.
#[must_use]
pub fn load_merges_lenient<P: AsRef<Path>>(path: P, config: &DocumentConfig) -> Vec<Value> {
    let path = path.as_ref();
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("unable to read {}: {err}", path.display());
            return Vec::new();
        }
    };
    let mut value: Value = match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => {
            warn!("unable to parse {}: {err}", path.display());
            return Vec::new();
        }
    };
    let merges = value
        .get_mut(&config.section)
        .and_then(|section| section.get_mut(&config.merges_key))
        .map(Value::take);
    match merges {
        Some(Value::Array(entries)) => entries,
        _ => {
            warn!(
                "{} has no `{}.{}` array",
                path.display(),
                config.section,
                config.merges_key
            );
            Vec::new()
        }
    }
}

/// Serialises the document to a JSON string.
pub fn document_json(document: &TokenizerDocument, pretty: bool) -> Result<String> {
    let value = document.to_value();
    if pretty {
        serde_json::to_string_pretty(&value).map_err(TokmergeError::from)
    } else {
        serde_json::to_string(&value).map_err(TokmergeError::from)
    }
}

/// Writes the document to `path`.
///
/// With [`OutputConfig::atomic`] the JSON is written to a temporary file next to `path`
/// and renamed into place, so an interrupted write never leaves a truncated document.
pub fn save_document<P: AsRef<Path>>(
    document: &TokenizerDocument,
    path: P,
    output: &OutputConfig,
) -> Result<()> {
    let path = path.as_ref();
    let json = document_json(document, output.pretty)?;
    if !output.atomic {
        return fs::write(path, json)
            .map_err(|err| TokmergeError::io(err, Some(path.to_path_buf())));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Dropping the temporary file on an error path removes it.
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|err| TokmergeError::io(err, Some(dir.to_path_buf())))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| TokmergeError::io(err, Some(tmp.path().to_path_buf())))?;
    tmp.persist(path)
        .map_err(|err| TokmergeError::io(err.error, Some(path.to_path_buf())))?;
    Ok(())
}
