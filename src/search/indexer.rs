use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, doc,
    schema::{Field, STORED, Schema, TEXT},
};

use crate::comments::{extract_comments, file_type_of};
use crate::search::config::DEFAULT_BUFFER_SIZE;
use crate::search::fuzzy::SearchOptions;
use crate::types::Document;

/// Searchable text derived from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEntry {
    /// Document path, carried as metadata and never searched
    pub path: String,
    /// Markdown body, or the comments extracted from a source file
    pub text: String,
}

/// Derive index entries from documents.
///
/// Markdown files contribute their full body, other files their comments.
/// Documents that yield no text are left out.
pub fn build_entries(documents: &[Document]) -> Vec<IndexedEntry> {
    documents
        .iter()
        .filter_map(|document| {
            let text = if document.is_markdown() {
                document.content.clone()
            } else {
                extract_comments(&document.content, file_type_of(&document.path))
            };

            if text.trim().is_empty() {
                return None;
            }

            Some(IndexedEntry {
                path: document.path.clone(),
                text,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexFields {
    /// Position of the entry in [`SearchIndex::entries`]
    pub(crate) ordinal: Field,
    pub(crate) text: Field,
}

/// Immutable in-memory index over a fixed set of entries
pub struct SearchIndex {
    pub(crate) index: Index,
    pub(crate) reader: IndexReader,
    pub(crate) fields: IndexFields,
    pub(crate) entries: Vec<IndexedEntry>,
    pub(crate) options: SearchOptions,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("entries", &self.entries.len())
            .field("options", &self.options)
            .finish()
    }
}

impl SearchIndex {
    /// Build an index over `entries`
    pub fn build(entries: Vec<IndexedEntry>, options: SearchOptions) -> Result<Self> {
        let mut schema_builder = Schema::builder();
        let ordinal = schema_builder.add_u64_field("ordinal", STORED);
        let text = schema_builder.add_text_field("text", TEXT);
        let schema = schema_builder.build();
        let fields = IndexFields { ordinal, text };

        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, DEFAULT_BUFFER_SIZE)
            .context("Failed to create index writer")?;
        for (position, entry) in entries.iter().enumerate() {
            writer
                .add_document(doc!(
                    fields.ordinal => position as u64,
                    fields.text => entry.text.clone(),
                ))
                .with_context(|| format!("Failed to index {}", entry.path))?;
        }
        writer.commit().context("Failed to commit search index")?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to open search index reader")?;

        tracing::debug!("Built search index with {} entries", entries.len());

        Ok(Self {
            index,
            reader,
            fields,
            entries,
            options,
        })
    }

    /// Build an index straight from documents
    pub fn from_documents(documents: &[Document], options: SearchOptions) -> Result<Self> {
        Self::build(build_entries(documents), options)
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Number of documents visible to searches
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
