use anyhow::{Result, bail};

use crate::cache::{KeyValueStore, SnapshotCache};
use crate::repo::client::{ContentEntry, EntryKind, HostingApi};
use crate::repo::filter::FileFilter;
use crate::types::Document;

/// Pulls the repository's relevant files, reusing the cached snapshot while
/// the latest commit has not moved
#[derive(Debug)]
pub struct RepoFetcher<A, S> {
    api: A,
    cache: SnapshotCache<S>,
    filter: FileFilter,
}

impl<A: HostingApi, S: KeyValueStore> RepoFetcher<A, S> {
    pub fn new(api: A, cache: SnapshotCache<S>) -> Self {
        Self {
            api,
            cache,
            filter: FileFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &SnapshotCache<S> {
        &self.cache
    }

    /// Drop the cached snapshot so the next fetch goes to the network
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    /// Fetch every relevant top-level document.
    ///
    /// Individual failures are logged and skipped; an error is returned only
    /// when no document could be produced at all.
    pub async fn fetch_all(&self) -> Result<Vec<Document>> {
        let latest_commit = self.fetch_latest_commit().await;

        if let Some(documents) = self.cached_documents(latest_commit.as_deref()) {
            tracing::info!(
                "Using cached repository data ({} documents)",
                documents.len()
            );
            return Ok(documents);
        }

        let files = self.fetch_file_list().await;
        tracing::info!("Fetching {} files", files.len());

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            match self.fetch_document(file).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {
                    tracing::warn!("Content for {} is empty, skipping", file.path);
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {:#}", file.path, e);
                }
            }
        }

        if documents.is_empty() {
            bail!("No documents could be fetched from the repository");
        }

        if let Err(e) = self.cache.write(&documents, latest_commit.as_deref()) {
            tracing::warn!("Failed to cache repository data: {:#}", e);
        }

        Ok(documents)
    }

    /// Latest commit id, or `None` if the lookup failed
    async fn fetch_latest_commit(&self) -> Option<String> {
        match self.api.latest_commit().await {
            Ok(sha) => {
                tracing::debug!("Latest commit: {}", sha);
                Some(sha)
            }
            Err(e) => {
                tracing::error!("Error fetching the latest commit: {:#}", e);
                None
            }
        }
    }

    /// Cached documents, if the snapshot is fresh and was taken at `latest_commit`
    fn cached_documents(&self, latest_commit: Option<&str>) -> Option<Vec<Document>> {
        let latest_commit = latest_commit?;

        let snapshot = match self.cache.read() {
            Ok(snapshot) => snapshot?,
            Err(e) => {
                tracing::warn!("Failed to read snapshot cache: {:#}", e);
                return None;
            }
        };

        if snapshot.commit_id.as_deref() == Some(latest_commit) {
            Some(snapshot.documents)
        } else {
            tracing::info!(
                "Repository moved from {:?} to {}, refetching",
                snapshot.commit_id,
                latest_commit
            );
            None
        }
    }

    /// Top-level files that pass the filter, in listing order
    async fn fetch_file_list(&self) -> Vec<ContentEntry> {
        let entries = match self.api.list_contents().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Error fetching list of files: {:#}", e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter(|entry| match entry.kind {
                EntryKind::File => self.filter.is_relevant_file(&entry.name),
                EntryKind::Dir => {
                    if !self.filter.is_excluded_dir(&entry.name) {
                        tracing::info!("Skipping directory: {}", entry.path);
                    }
                    false
                }
                _ => false,
            })
            .collect()
    }

    async fn fetch_document(&self, file: &ContentEntry) -> Result<Option<Document>> {
        tracing::debug!("Fetching content for file: {}", file.path);

        let content = self.api.file_content(&file.path).await?.decode()?;
        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(Document::new(file.path.clone(), content)))
    }
}
