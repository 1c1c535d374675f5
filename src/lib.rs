//! Merging and comparing byte pair encoding (BPE) tokenizer documents.
//!
//! The crate exposes both a library API and a `tokmerge` command line interface
//! for combining the vocabulary and merge table of two Hugging Face style
//! `tokenizer.json` files, and for measuring how similar two merge tables are.
//!
//! ```no_run
//! use tokmerge::serialization::{load_document, save_document};
//! use tokmerge::{merge_documents, DocumentConfig, OutputConfig};
//!
//! # fn main() -> tokmerge::Result<()> {
//! let cfg = DocumentConfig::default();
//! let primary = load_document("base/tokenizer.json", &cfg)?;
//! let secondary = load_document("domain/tokenizer.json", &cfg)?;
//! let outcome = merge_documents(&primary, &secondary)?;
//! save_document(&outcome.document, "merged.json", &OutputConfig::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `tokmerge = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod document;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod rules;
pub mod serialization;
pub mod similarity;
pub mod workflow;

pub use config::{DocumentBuilder, DocumentConfig, OutputConfig};
pub use document::{TokenId, TokenizerDocument, Vocabulary};
pub use error::{Result, TokmergeError};
pub use merge::{merge_documents, merge_rules, merge_vocabularies, MergeOutcome};
pub use metrics::{MergeSummary, SimilarityReport};
pub use rules::{detect_format, normalize, normalize_to, MergeFormat, MergeRule};
pub use similarity::{compare, jaccard_similarity, order_agreement, OrderAgreement};
