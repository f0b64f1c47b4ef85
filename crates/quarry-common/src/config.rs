//! Configuration structures for the Quarry index.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for opening a primary-key index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Filesystem path of the index file.
    pub path: PathBuf,
    /// Branching factor; a node holds at most `degree - 1` keys.
    ///
    /// Fixed at tree-creation time. Reopening an existing file with a
    /// different degree is rejected.
    pub degree: usize,
    /// Enable fsync after page writes.
    pub fsync_enabled: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./quarry.idx"),
            degree: 128,
            fsync_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.path, PathBuf::from("./quarry.idx"));
        assert_eq!(config.degree, 128);
        assert!(config.fsync_enabled);
    }

    #[test]
    fn test_index_config_custom() {
        let config = IndexConfig {
            path: PathBuf::from("/var/lib/quarry/users_pk.idx"),
            degree: 4,
            fsync_enabled: false,
        };

        assert_eq!(config.path, PathBuf::from("/var/lib/quarry/users_pk.idx"));
        assert_eq!(config.degree, 4);
        assert!(!config.fsync_enabled);
    }

    #[test]
    fn test_index_config_clone() {
        let config1 = IndexConfig::default();
        let config2 = config1.clone();
        assert_eq!(config1.path, config2.path);
        assert_eq!(config1.degree, config2.degree);
    }

    #[test]
    fn test_index_config_serde_roundtrip() {
        let original = IndexConfig::default();
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: IndexConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.path, deserialized.path);
        assert_eq!(original.degree, deserialized.degree);
        assert_eq!(original.fsync_enabled, deserialized.fsync_enabled);
    }
}
