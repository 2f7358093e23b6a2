//! Messages exchanged with the query dispatcher

use serde::{Deserialize, Serialize};

use crate::search::SearchResult;
use crate::types::Document;

/// Work posted to the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Request {
    /// Replace the current index with one built from `documents`
    BuildIndex { documents: Vec<Document> },
    /// Search the current index; dropped when no index has been built yet
    Query { id: u64, text: String },
}

/// Replies produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Response {
    /// A new index is in place
    IndexBuilt { documents: usize, entries: usize },
    /// Building failed; the previous index, if any, is still in use
    IndexFailed { error: String },
    /// Results for query `id`, best match first
    Results {
        id: u64,
        query: String,
        results: Vec<SearchResult>,
    },
}
