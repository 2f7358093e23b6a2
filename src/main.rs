use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use repo_docs_assistant::cache::{FileStore, SnapshotCache};
use repo_docs_assistant::config::DEFAULT_API_URL;
use repo_docs_assistant::repo::GitHubClient;
use repo_docs_assistant::search::config::DEFAULT_SEARCH_LIMIT;
use repo_docs_assistant::{AssistantConfig, DocsAssistant, RepoSlug};

/// Chat with the documentation of a GitHub repository
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository to read, as owner/repo
    #[arg(long, env = "REPO_DOCS_REPO")]
    repo: RepoSlug,

    /// Access token for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "REPO_DOCS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Custom cache directory path (defaults to ~/.repo-docs-assistant/cache)
    #[arg(long, env = "REPO_DOCS_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Maximum number of matches considered per question
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    limit: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask questions interactively (default)
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question to search the documentation for
        query: String,
    },
    /// Discard the cached snapshot and fetch everything again
    Refresh,
    /// Remove the cached snapshot
    ClearCache,
}

impl Args {
    fn config(&self) -> AssistantConfig {
        AssistantConfig::new(self.repo.clone())
            .with_token(self.token.clone())
            .with_api_url(self.api_url.clone())
            .with_cache_dir(self.cache_dir.clone())
            .with_limit(self.limit)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = args.config();
    tracing::info!("Using repository {}", config.repo);
    if let Some(ref cache_dir) = config.cache_dir {
        tracing::info!("Using custom cache directory: {}", cache_dir.display());
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&config).await,
        Commands::Ask { query } => ask(&config, &query).await,
        Commands::Refresh => refresh(&config).await,
        Commands::ClearCache => clear_cache(&config),
    }
}

/// Build an assistant and load its index, exiting with a message on failure
async fn start(config: &AssistantConfig) -> Result<DocsAssistant<GitHubClient, FileStore>> {
    let mut assistant = DocsAssistant::from_config(config)?;

    match assistant.initialize().await {
        Ok(stats) => {
            tracing::info!(
                "Loaded {} documents ({} searchable)",
                stats.documents,
                stats.entries
            );
            Ok(assistant)
        }
        Err(e) => {
            tracing::error!("Initialization failed: {:#}", e);
            eprintln!(
                "Error: could not load documentation for {}: {:#}",
                config.repo, e
            );
            process::exit(1);
        }
    }
}

async fn chat(config: &AssistantConfig) -> Result<()> {
    let mut assistant = start(config).await?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(
            format!(
                "Ask about {}. Type /refresh to reload or /quit to exit.\n",
                config.repo
            )
            .as_bytes(),
        )
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/refresh" => match assistant.refresh().await {
                Ok(stats) => format!("Reloaded {} documents.", stats.documents),
                Err(e) => {
                    tracing::error!("Refresh failed: {:#}", e);
                    format!("Refresh failed: {e:#}")
                }
            },
            question => assistant.answer(question).await?,
        };

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    assistant.shutdown()
}

async fn ask(config: &AssistantConfig, query: &str) -> Result<()> {
    let mut assistant = start(config).await?;
    println!("{}", assistant.answer(query).await?);
    assistant.shutdown()
}

async fn refresh(config: &AssistantConfig) -> Result<()> {
    let mut assistant = DocsAssistant::from_config(config)?;
    let stats = assistant.refresh().await?;
    println!(
        "Refreshed {}: {} documents, {} searchable",
        config.repo, stats.documents, stats.entries
    );
    assistant.shutdown()
}

fn clear_cache(config: &AssistantConfig) -> Result<()> {
    let cache_dir = config.cache_dir()?;
    let cache = SnapshotCache::new(FileStore::new(&cache_dir)?);
    cache.clear()?;
    println!("Cleared cached snapshot in {}", cache_dir.display());
    Ok(())
}
