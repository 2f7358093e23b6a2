//! Hosting API access
//!
//! [`HostingApi`] is the seam between the fetch pipeline and the remote
//! service; [`GitHubClient`] implements it against the GitHub REST v3 API.

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::{AssistantConfig, RepoSlug};

/// Versioned JSON media type requested from the API
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Kind of a repository listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a repository directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl ContentEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::File)
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Dir)
    }

    fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { name, path, kind }
    }
}

/// A single file as returned by the contents endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Wrap plain text the way the API would deliver it
    pub fn from_text(text: &str) -> Self {
        Self {
            content: Some(STANDARD.encode(text.as_bytes())),
            encoding: Some("base64".to_string()),
        }
    }

    /// Decode the base64 payload into UTF-8 text.
    ///
    /// The API wraps encoded content at 60 columns, so embedded whitespace is
    /// ignored.
    pub fn decode(&self) -> Result<String> {
        let content = match self.content.as_deref() {
            Some(content) if !content.trim().is_empty() => content,
            _ => bail!("Response has no content field"),
        };

        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                bail!("Unsupported content encoding '{encoding}'");
            }
        }

        let compact: String = content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .context("Content is not valid base64")?;
        String::from_utf8(bytes).context("Content is not valid UTF-8 text")
    }
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

/// Read-only access to a hosted repository
pub trait HostingApi: Send + Sync {
    /// Identifier of the most recent commit on the default branch
    fn latest_commit(&self) -> impl Future<Output = Result<String>> + Send;

    /// Entries at the top level of the repository
    fn list_contents(&self) -> impl Future<Output = Result<Vec<ContentEntry>>> + Send;

    /// A single file by repo-relative path
    fn file_content(&self, path: &str) -> impl Future<Output = Result<FileContent>> + Send;
}

/// GitHub REST v3 client scoped to one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: Url,
    repo: RepoSlug,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid API URL: {}", config.api_url))?;
        if api_url.cannot_be_a_base() {
            bail!("API URL cannot be used as a base: {}", config.api_url);
        }

        Ok(Self {
            client: Self::build_http_client()?,
            api_url,
            repo: config.repo.clone(),
            token: config.token.clone(),
        })
    }

    /// Build the HTTP client; the API rejects requests without a user agent
    fn build_http_client() -> Result<reqwest::Client> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

        tracing::debug!("Creating HTTP client with User-Agent: {}", user_agent);

        reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")
    }

    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    /// `{api}/repos/{owner}/{repo}/{tail...}`, each segment percent-encoded
    fn endpoint<'a>(&self, tail: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL cannot be used as a base: {}", self.api_url))?
            .pop_if_empty()
            .extend(["repos", self.repo.owner(), self.repo.name()])
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url.clone()).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Request to {} failed: HTTP {}", url, status);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }
}

impl HostingApi for GitHubClient {
    async fn latest_commit(&self) -> Result<String> {
        let mut url = self.endpoint(["commits"])?;
        url.query_pairs_mut().append_pair("per_page", "1");

        let commits: Vec<CommitInfo> = self.get_json(url).await?;
        commits
            .into_iter()
            .next()
            .map(|c| c.sha)
            .ok_or_else(|| anyhow!("Repository {} has no commits", self.repo))
    }

    async fn list_contents(&self) -> Result<Vec<ContentEntry>> {
        let url = self.endpoint(["contents"])?;
        self.get_json(url).await
    }

    async fn file_content(&self, path: &str) -> Result<FileContent> {
        let url = self.endpoint(std::iter::once("contents").chain(path.split('/')))?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server_url: &str, token: Option<&str>) -> Result<GitHubClient> {
        let config = AssistantConfig::new("acme/widgets".parse()?)
            .with_api_url(server_url)
            .with_token(token.map(String::from));
        GitHubClient::new(&config)
    }

    #[test]
    fn test_decode_wrapped_base64() -> Result<()> {
        let encoded = STANDARD.encode("## Install\nRun npm install.");
        let (head, tail) = encoded.split_at(10);
        let content = FileContent {
            content: Some(format!("{head}\n{tail}\n")),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(content.decode()?, "## Install\nRun npm install.");
        Ok(())
    }

    #[test]
    fn test_decode_failures() {
        assert!(FileContent::default().decode().is_err());
        assert!(
            FileContent {
                content: Some("!!!not base64!!!".to_string()),
                encoding: Some("base64".to_string()),
            }
            .decode()
            .is_err()
        );
        assert!(
            FileContent {
                content: Some(STANDARD.encode([0xffu8, 0xfe, 0xfd])),
                encoding: Some("base64".to_string()),
            }
            .decode()
            .is_err()
        );
        assert!(
            FileContent {
                content: Some("plain".to_string()),
                encoding: Some("none".to_string()),
            }
            .decode()
            .is_err()
        );
    }

    #[test]
    fn test_entry_kind_parsing() -> Result<()> {
        let entries: Vec<ContentEntry> = serde_json::from_str(
            r#"[
                {"name": "README.md", "path": "README.md", "type": "file", "size": 10},
                {"name": "src", "path": "src", "type": "dir"},
                {"name": "odd", "path": "odd", "type": "something-new"}
            ]"#,
        )?;
        assert_eq!(entries[0], ContentEntry::file("README.md"));
        assert_eq!(entries[1], ContentEntry::dir("src"));
        assert_eq!(entries[2].kind, EntryKind::Other);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_commit_sends_expected_headers() -> Result<()> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widgets/commits")
            .match_query(Matcher::UrlEncoded("per_page".into(), "1".into()))
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"sha": "deadbeef"}, {"sha": "older"}]"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("s3cret"))?;
        assert_eq!(client.latest_commit().await?, "deadbeef");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_fetch_file() -> Result<()> {
        let mut server = Server::new_async().await;
        let listing = server
            .mock("GET", "/repos/acme/widgets/contents")
            .with_status(200)
            .with_body(r#"[{"name": "README.md", "path": "README.md", "type": "file"}]"#)
            .create_async()
            .await;
        let body = serde_json::to_string(&FileContent::from_text("# Widgets"))?;
        let file = server
            .mock("GET", "/repos/acme/widgets/contents/README.md")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = client_for(&server.url(), None)?;
        let entries = client.list_contents().await?;
        assert_eq!(entries, vec![ContentEntry::file("README.md")]);
        assert_eq!(client.file_content("README.md").await?.decode()?, "# Widgets");

        listing.assert_async().await;
        file.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_http_error_is_reported() -> Result<()> {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widgets/contents")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), None)?;
        let err = client.list_contents().await.unwrap_err();
        assert!(err.to_string().contains("404"));
        Ok(())
    }
}
