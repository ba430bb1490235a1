//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all RepForge data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Catalog database directory (`data/catalog/`).
    pub catalog: PathBuf,
    /// Embedding provider configuration (`data/embedding-config.json`).
    pub embedding_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            catalog: root.join("catalog"),
            embedding_config_file: root.join("embedding-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.catalog)?;
        Ok(paths)
    }
}

/// Top-level RepForge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepForgeConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Capacity of the query embedding cache.
    pub query_cache_size: usize,
    /// Time-to-live of cached query embeddings, in seconds.
    pub query_cache_ttl_secs: u64,
}

impl RepForgeConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let query_cache_size = std::env::var("REPFORGE_QUERY_CACHE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let query_cache_ttl_secs = std::env::var("REPFORGE_QUERY_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            data_paths: DataPaths::new(data_dir)?,
            query_cache_size,
            query_cache_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.catalog.is_dir());
        assert_eq!(
            paths.embedding_config_file,
            dir.path().join("embedding-config.json")
        );
    }
}
