//! Configuration builders controlling document layout and output.

use crate::error::{Result, TokmergeError};
use serde::{Deserialize, Serialize};

/// Default key of the nested object holding the vocabulary and merge table.
pub const DEFAULT_SECTION: &str = "model";
/// Default key of the vocabulary inside the nested section.
pub const DEFAULT_VOCAB_KEY: &str = "vocab";
/// Default key of the merge table inside the nested section.
pub const DEFAULT_MERGES_KEY: &str = "merges";

/// Describes where the vocabulary and merge table live inside a tokenizer document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Top-level key of the nested object (Hugging Face uses `model`).
    pub section: String,
    /// Key of the token → id object inside the section.
    pub vocab_key: String,
    /// Key of the merge array inside the section.
    pub merges_key: String,
}

impl DocumentConfig {
    /// Returns a builder initialised with [`DocumentConfig::default`].
    #[must_use]
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Validates that the configured keys can address distinct fields.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("section", &self.section),
            ("vocab_key", &self.vocab_key),
            ("merges_key", &self.merges_key),
        ] {
            if value.is_empty() {
                return Err(TokmergeError::InvalidConfig(format!(
                    "{name} must not be empty"
                )));
            }
        }
        if self.vocab_key == self.merges_key {
            return Err(TokmergeError::InvalidConfig(format!(
                "vocab_key and merges_key must differ (both are `{}`)",
                self.vocab_key
            )));
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            section: DEFAULT_SECTION.into(),
            vocab_key: DEFAULT_VOCAB_KEY.into(),
            merges_key: DEFAULT_MERGES_KEY.into(),
        }
    }
}

/// Builder for [`DocumentConfig`].
#[derive(Debug, Default, Clone)]
pub struct DocumentBuilder {
    cfg: DocumentConfig,
}

impl DocumentBuilder {
    /// Creates a builder with [`DocumentConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key of the nested section.
    #[must_use]
    pub fn section(mut self, value: impl Into<String>) -> Self {
        self.cfg.section = value.into();
        self
    }

    /// Sets the key of the vocabulary object.
    #[must_use]
    pub fn vocab_key(mut self, value: impl Into<String>) -> Self {
        self.cfg.vocab_key = value.into();
        self
    }

    /// Sets the key of the merge array.
    #[must_use]
    pub fn merges_key(mut self, value: impl Into<String>) -> Self {
        self.cfg.merges_key = value.into();
        self
    }

    /// Finalises the builder, returning a validated [`DocumentConfig`].
    pub fn build(self) -> Result<DocumentConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Controls how merged documents are written to disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Emit indented JSON.
    pub pretty: bool,
    /// Write through a temporary file and rename it into place.
    pub atomic: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            atomic: true,
        }
    }
}
