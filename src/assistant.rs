//! The caller-facing side of the pipeline.
//!
//! [`DocsAssistant`] fetches documents, hands them to the query dispatcher
//! and turns dispatcher responses into chat replies. It never touches the
//! search index directly.

use anyhow::{Context, Result, bail};

use crate::cache::{FileStore, KeyValueStore, SnapshotCache};
use crate::config::AssistantConfig;
use crate::dispatcher::{DispatcherHandle, Request, Response, spawn_dispatcher};
use crate::repo::{GitHubClient, HostingApi, RepoFetcher};
use crate::search::{SearchOptions, SearchResult};
use crate::types::Document;

/// Reply when nothing in the index matches a question
pub const NO_MATCH_REPLY: &str = "I couldn't find relevant information.";

/// Outcome of loading a document set into the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Documents handed to the dispatcher
    pub documents: usize,
    /// Documents that produced searchable text
    pub entries: usize,
}

/// Chat-style assistant over one repository's documentation
#[derive(Debug)]
pub struct DocsAssistant<A, S> {
    fetcher: RepoFetcher<A, S>,
    dispatcher: DispatcherHandle,
    next_query_id: u64,
    stats: Option<IndexStats>,
}

impl DocsAssistant<GitHubClient, FileStore> {
    /// Assistant backed by the GitHub API and an on-disk snapshot cache
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let api = GitHubClient::new(config)?;
        let store = FileStore::new(config.cache_dir()?)?;
        let options = SearchOptions {
            limit: config.limit,
            ..SearchOptions::default()
        };
        Self::new(RepoFetcher::new(api, SnapshotCache::new(store)), options)
    }
}

impl<A: HostingApi, S: KeyValueStore> DocsAssistant<A, S> {
    /// Wrap `fetcher` and start a dispatcher thread
    pub fn new(fetcher: RepoFetcher<A, S>, options: SearchOptions) -> Result<Self> {
        Ok(Self {
            fetcher,
            dispatcher: spawn_dispatcher(options)?,
            next_query_id: 0,
            stats: None,
        })
    }

    pub fn fetcher(&self) -> &RepoFetcher<A, S> {
        &self.fetcher
    }

    /// Whether an index has been built
    pub fn is_ready(&self) -> bool {
        self.stats.is_some()
    }

    /// Statistics of the current index
    pub fn stats(&self) -> Option<IndexStats> {
        self.stats
    }

    /// Fetch (or reuse cached) documents and build the index
    pub async fn initialize(&mut self) -> Result<IndexStats> {
        let documents = self
            .fetcher
            .fetch_all()
            .await
            .context("Failed to load the documentation")?;

        self.load(documents).await
    }

    /// Discard the cache, fetch everything again and rebuild the index.
    ///
    /// Takes `&mut self`, so a refresh can never overlap another one or an
    /// in-flight question.
    pub async fn refresh(&mut self) -> Result<IndexStats> {
        self.fetcher.clear_cache()?;
        let stats = self.initialize().await?;
        tracing::info!("Data refreshed: {} documents", stats.documents);
        Ok(stats)
    }

    /// Hand a document set to the dispatcher and wait until it is indexed
    async fn load(&mut self, documents: Vec<Document>) -> Result<IndexStats> {
        self.dispatcher.post(Request::BuildIndex { documents })?;

        loop {
            match self.dispatcher.recv().await {
                Some(Response::IndexBuilt { documents, entries }) => {
                    let stats = IndexStats { documents, entries };
                    self.stats = Some(stats);
                    return Ok(stats);
                }
                Some(Response::IndexFailed { error }) => {
                    bail!("Failed to build search index: {error}");
                }
                Some(Response::Results { id, .. }) => {
                    tracing::debug!("Discarding stale results for query {}", id);
                }
                None => bail!("Query dispatcher has stopped"),
            }
        }
    }

    /// All matches for `text`, best first. Empty when no index is built yet.
    pub async fn search(&mut self, text: &str) -> Result<Vec<SearchResult>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        if !self.is_ready() {
            tracing::warn!("No documents loaded yet, ignoring query");
            return Ok(Vec::new());
        }

        self.next_query_id += 1;
        let id = self.next_query_id;
        self.dispatcher.post(Request::Query {
            id,
            text: text.to_string(),
        })?;

        loop {
            match self.dispatcher.recv().await {
                Some(Response::Results {
                    id: reply_id,
                    results,
                    ..
                }) if reply_id == id => return Ok(results),
                Some(other) => {
                    tracing::debug!("Ignoring unexpected dispatcher response: {:?}", other);
                }
                None => bail!("Query dispatcher has stopped"),
            }
        }
    }

    /// Best match for `text`
    pub async fn ask(&mut self, text: &str) -> Result<Option<SearchResult>> {
        Ok(self.search(text).await?.into_iter().next())
    }

    /// Chat reply for `text`: the best matching snippet, or a fallback message
    pub async fn answer(&mut self, text: &str) -> Result<String> {
        Ok(match self.ask(text).await? {
            Some(result) => result.entry.text,
            None => NO_MATCH_REPLY.to_string(),
        })
    }

    /// Stop the dispatcher thread
    pub fn shutdown(self) -> Result<()> {
        self.dispatcher.shutdown()
    }
}
