//! # Cache Module
//!
//! Persists the last fetched document set so that a repository whose latest
//! commit has not moved can be served without downloading every file again.
//!
//! ## Key Components
//!
//! - [`kv`] - Synchronous string key-value stores (file-backed and in-memory)
//! - [`storage`] - Versioned snapshot record with a fixed time-to-live
//! - [`constants`] - Key names, schema version and TTL

pub mod constants;
pub mod kv;
pub mod storage;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use storage::{Snapshot, SnapshotCache};
