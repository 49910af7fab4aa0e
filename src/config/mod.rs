use std::path::PathBuf;

/// Application configuration and constants
pub struct Config {
    pub content_dir: PathBuf,
    pub database: PathBuf,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            database: PathBuf::from("folio.db"),
        }
    }

    /// Create configuration with custom values
    pub fn with_custom(content_dir: PathBuf, database: Option<PathBuf>) -> Self {
        Self {
            content_dir,
            database: database.unwrap_or_else(|| PathBuf::from("folio.db")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
