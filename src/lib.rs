pub mod assistant;
pub mod cache;
pub mod comments;
pub mod config;
pub mod dispatcher;
pub mod repo;
pub mod search;
pub mod types;

pub use assistant::{DocsAssistant, IndexStats, NO_MATCH_REPLY};
pub use config::{AssistantConfig, RepoSlug};
pub use types::Document;
