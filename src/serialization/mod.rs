//! Helpers for (de)serialising tokenizer documents.

pub mod huggingface;

pub use huggingface::{document_json, load_document, load_merges_lenient, save_document};
