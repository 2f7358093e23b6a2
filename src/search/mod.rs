//! # Search Module
//!
//! Fuzzy full-text search over Markdown documents and extracted code
//! comments, built on the Tantivy search engine.
//!
//! ## Key Components
//!
//! - [`indexer`] - Turns documents into indexed entries and builds the in-memory index
//! - [`fuzzy`] - Typo-tolerant querying with a bounded edit-distance ratio
//! - [`config`] - Configuration constants for search functionality

pub mod config;
pub mod fuzzy;
pub mod indexer;

pub use fuzzy::{SearchOptions, SearchResult};
pub use indexer::{IndexedEntry, SearchIndex, build_entries};
