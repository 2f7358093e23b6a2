//! # Search Configuration Module
//!
//! Provides configuration constants for search indexing and querying.

/// Buffer size for the Tantivy index writer (50MB)
pub const DEFAULT_BUFFER_SIZE: usize = 50_000_000;

/// Default limit for search results
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Maximum allowed query length in characters
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Worst accepted match score, as a ratio of edits to term length
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Maximum edit distance supported by the fuzzy term automaton
pub const MAX_FUZZY_DISTANCE: u8 = 2;
