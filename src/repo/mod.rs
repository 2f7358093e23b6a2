//! # Repository Module
//!
//! Fetches a hosted repository's top-level documentation and source files.
//!
//! ## Key Components
//!
//! - [`client`] - Hosting API seam and the GitHub REST implementation
//! - [`filter`] - Extension allow/deny lists
//! - [`fetcher`] - Commit-validated, cache-backed fetch pipeline

pub mod client;
pub mod fetcher;
pub mod filter;

pub use client::{ContentEntry, EntryKind, FileContent, GitHubClient, HostingApi};
pub use fetcher::RepoFetcher;
pub use filter::FileFilter;
