//! Runtime configuration: which repository to read and how to reach it

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::constants::{CACHE_DIR, CACHE_ROOT_DIR};
use crate::search::config::DEFAULT_SEARCH_LIMIT;

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Validate one half of an `owner/repo` identifier
fn validate_segment(kind: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        bail!("Repository {kind} cannot be empty");
    }

    if segment == "." || segment.contains("..") {
        bail!("Invalid repository {kind} '{segment}': contains traversal sequences");
    }

    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        bail!(
            "Invalid repository {kind} '{segment}': only alphanumeric, dash, underscore and dot are allowed"
        );
    }

    Ok(())
}

/// A validated `owner/repo` repository identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();

        validate_segment("owner", &owner)?;
        validate_segment("name", &name)?;

        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((owner, name)) = s.trim().split_once('/') else {
            bail!("Invalid repository '{s}'. Expected 'owner/repo'");
        };
        Self::new(owner, name)
    }
}

/// Everything needed to build a [`crate::DocsAssistant`]
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub repo: RepoSlug,
    /// Access credential sent as a bearer token
    pub token: Option<String>,
    pub api_url: String,
    /// Snapshot cache directory; `None` means [`default_cache_dir`]
    pub cache_dir: Option<PathBuf>,
    /// Maximum number of results returned per query
    pub limit: usize,
}

impl AssistantConfig {
    /// Configuration with defaults for everything but the repository
    pub fn new(repo: RepoSlug) -> Self {
        Self {
            repo,
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        if cache_dir.is_some() {
            self.cache_dir = cache_dir;
        }
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The configured cache directory, falling back to the home-relative default
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }
}

/// `~/.repo-docs-assistant/cache`
pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to get home directory")?
        .join(CACHE_ROOT_DIR)
        .join(CACHE_DIR))
}
