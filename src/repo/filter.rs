//! Which repository entries are worth fetching

/// Documentation and source extensions that carry searchable text
pub const RELEVANT_EXTENSIONS: &[&str] = &[
    ".md", ".js", ".ts", ".py", ".java", ".cpp", ".c", ".rb", ".go", ".rs",
];

/// Binary and media extensions that are never fetched
pub const EXCLUDED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".gif", ".svg", ".zip", ".pdf"];

/// Build output and dependency directories
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build"];

/// Extension allow/deny lists applied to top-level file names
#[derive(Debug, Clone)]
pub struct FileFilter {
    relevant: Vec<String>,
    excluded: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            relevant: RELEVANT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded: EXCLUDED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FileFilter {
    /// A file is relevant when it ends with an allowed extension and not
    /// with an excluded one
    pub fn is_relevant_file(&self, file_name: &str) -> bool {
        self.relevant.iter().any(|ext| file_name.ends_with(ext.as_str()))
            && !self.excluded.iter().any(|ext| file_name.ends_with(ext.as_str()))
    }

    pub fn is_excluded_dir(&self, dir_name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == dir_name)
    }
}
