//! Constants for the snapshot cache

/// Directory names
pub const CACHE_ROOT_DIR: &str = ".repo-docs-assistant";
pub const CACHE_DIR: &str = "cache";

/// Key holding the serialized snapshot record
pub const SNAPSHOT_KEY: &str = "repoDataCache";

/// Bumped whenever the record layout changes; older records are discarded
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Snapshot lifetime in hours
pub const SNAPSHOT_TTL_HOURS: i64 = 48;
