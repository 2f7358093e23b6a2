//! Core data types shared by the fetcher, the cache and the search index

use serde::{Deserialize, Serialize};

/// A text file pulled from the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Repo-relative path, as reported by the hosting API listing
    pub path: String,
    /// Full decoded text
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Markdown documents are indexed with their full body
    pub fn is_markdown(&self) -> bool {
        self.path.ends_with(".md")
    }
}
