//! End-to-end tests for the assistant pipeline
//!
//! These drive a [`DocsAssistant`] from fetching through indexing to
//! answering, once against an in-memory hosting double and once against a
//! mock GitHub API with an on-disk cache.

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mockito::{Matcher, Server};
use repo_docs_assistant::cache::{MemoryStore, SnapshotCache};
use repo_docs_assistant::repo::{ContentEntry, FileContent, HostingApi, RepoFetcher};
use repo_docs_assistant::search::SearchOptions;
use repo_docs_assistant::{AssistantConfig, DocsAssistant, NO_MATCH_REPLY};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const README: &str = "## Install\nRun npm install.";

/// Hosting double serving a fixed set of top-level files
#[derive(Default)]
struct StaticRepo {
    entries: Vec<ContentEntry>,
    files: HashMap<String, String>,
    content_calls: AtomicUsize,
}

impl StaticRepo {
    fn with_file(mut self, path: &str, text: &str) -> Self {
        self.entries.push(ContentEntry::file(path));
        self.files.insert(path.to_string(), text.to_string());
        self
    }
}

impl HostingApi for StaticRepo {
    async fn latest_commit(&self) -> Result<String> {
        Ok("c0ffee".to_string())
    }

    async fn list_contents(&self) -> Result<Vec<ContentEntry>> {
        Ok(self.entries.clone())
    }

    async fn file_content(&self, path: &str) -> Result<FileContent> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .map(|text| FileContent::from_text(text))
            .ok_or_else(|| anyhow!("no such file: {path}"))
    }
}

fn assistant_for(repo: StaticRepo) -> Result<DocsAssistant<StaticRepo, MemoryStore>> {
    let fetcher = RepoFetcher::new(repo, SnapshotCache::new(MemoryStore::new()));
    DocsAssistant::new(fetcher, SearchOptions::default())
}

fn sample_repo() -> StaticRepo {
    StaticRepo::default()
        .with_file("README.md", README)
        .with_file("logo.png", "binary")
        .with_file("server.py", "def serve():\n    \"\"\"Start the HTTP server.\"\"\"\n")
        .with_file("index.js", "console.log('no comments here');")
}

#[tokio::test]
async fn test_initialize_and_answer() -> Result<()> {
    let mut assistant = assistant_for(sample_repo())?;
    assert!(!assistant.is_ready());

    let stats = assistant.initialize().await?;
    assert!(assistant.is_ready());
    assert_eq!(stats.documents, 3);
    // index.js has no comments and produces no entry
    assert_eq!(stats.entries, 2);

    let best = assistant.ask("install").await?.expect("README should match");
    assert_eq!(best.entry.path, "README.md");
    assert_eq!(assistant.answer("install").await?, README);

    let reply = assistant.answer("sever").await?;
    assert!(reply.contains("Start the HTTP server."));

    assert_eq!(assistant.answer("kubernetes").await?, NO_MATCH_REPLY);
    assert_eq!(assistant.answer("   ").await?, NO_MATCH_REPLY);

    assistant.shutdown()
}

#[tokio::test]
async fn test_questions_before_initialize_get_no_answer() -> Result<()> {
    let mut assistant = assistant_for(sample_repo())?;

    assert!(assistant.ask("install").await?.is_none());
    assert_eq!(assistant.answer("install").await?, NO_MATCH_REPLY);

    // The dispatcher still works once an index arrives
    assistant.initialize().await?;
    assert_eq!(assistant.answer("install").await?, README);
    assistant.shutdown()
}

#[tokio::test]
async fn test_refresh_refetches_everything() -> Result<()> {
    let mut assistant = assistant_for(sample_repo())?;

    assistant.initialize().await?;
    let calls = |a: &DocsAssistant<StaticRepo, MemoryStore>| {
        a.fetcher().api().content_calls.load(Ordering::SeqCst)
    };
    assert_eq!(calls(&assistant), 3);

    // Same commit: served from the cache
    assistant.initialize().await?;
    assert_eq!(calls(&assistant), 3);

    let stats = assistant.refresh().await?;
    assert_eq!(stats.documents, 3);
    assert_eq!(calls(&assistant), 6);
    assert_eq!(assistant.answer("install").await?, README);

    assistant.shutdown()
}

#[tokio::test]
async fn test_initialize_fails_without_documents() -> Result<()> {
    let repo = StaticRepo::default().with_file("logo.png", "binary");
    let mut assistant = assistant_for(repo)?;

    let err = assistant
        .initialize()
        .await
        .expect_err("nothing to index");
    assert!(format!("{err:#}").contains("Failed to load the documentation"));
    assert!(!assistant.is_ready());

    assistant.shutdown()
}

#[tokio::test]
async fn test_github_flow_with_disk_cache() -> Result<()> {
    let mut server = Server::new_async().await;
    let cache_dir = TempDir::new()?;

    let commits = server
        .mock("GET", "/repos/acme/widgets/commits")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"sha": "abc123"}]"#)
        .expect(2)
        .create_async()
        .await;
    let listing = server
        .mock("GET", "/repos/acme/widgets/contents")
        .with_status(200)
        .with_body(
            r#"[
                {"name": "README.md", "path": "README.md", "type": "file"},
                {"name": "logo.png", "path": "logo.png", "type": "file"},
                {"name": "docs", "path": "docs", "type": "dir"}
            ]"#,
        )
        .expect(1)
        .create_async()
        .await;
    let readme = server
        .mock("GET", "/repos/acme/widgets/contents/README.md")
        .with_status(200)
        .with_body(format!(
            r#"{{"content": "{}", "encoding": "base64"}}"#,
            STANDARD.encode(README)
        ))
        .expect(1)
        .create_async()
        .await;

    let config = AssistantConfig::new("acme/widgets".parse()?)
        .with_api_url(server.url())
        .with_cache_dir(Some(cache_dir.path().to_path_buf()));

    let mut first = DocsAssistant::from_config(&config)?;
    let stats = first.initialize().await?;
    assert_eq!(stats.documents, 1);
    assert_eq!(first.answer("instll").await?, README);
    first.shutdown()?;

    // A new process at the same commit reuses the snapshot on disk
    let mut second = DocsAssistant::from_config(&config)?;
    second.initialize().await?;
    assert_eq!(second.answer("install").await?, README);
    second.shutdown()?;

    commits.assert_async().await;
    listing.assert_async().await;
    readme.assert_async().await;
    Ok(())
}
