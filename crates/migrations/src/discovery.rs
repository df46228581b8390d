//! Discovery of prepared migration versions on the filesystem

use std::collections::BTreeSet;
use std::fs;

use tracing::debug;

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};

/// Scans the migrations directory for prepared migration files.
///
/// Each call reads the directory fresh; results are deliberately not cached
/// because a generation step may write new files between two scans.
pub struct MigrationDiscovery<'a> {
    config: &'a MigrationConfig,
}

impl<'a> MigrationDiscovery<'a> {
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self { config }
    }

    /// Versions of all migration files in the configured directory,
    /// ascending lexicographic order. Files not matching the
    /// `{prefix}{version}.rs` convention are silently ignored.
    pub fn prepared_versions(&self) -> MigrationResult<BTreeSet<String>> {
        let dir = self.config.migrations_dir();
        let prefix = self.config.migration_prefix();

        let entries = fs::read_dir(dir).map_err(|e| {
            MigrationError::Discovery(format!(
                "Cannot read migrations directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut versions = BTreeSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::Discovery(e.to_string()))?;
            let path = entry.path();

            if !path.is_file() || path.extension().map_or(true, |ext| ext != "rs") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if let Some(version) = stem.strip_prefix(prefix) {
                if !version.is_empty() {
                    versions.insert(version.to_string());
                }
            }
        }

        debug!(count = versions.len(), dir = %dir.display(), "Scanned prepared migrations");
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> MigrationConfig {
        MigrationConfig::new(dir.path()).unwrap()
    }

    #[test]
    fn extracts_versions_in_ascending_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Migration20240102000000.rs"), "").unwrap();
        fs::write(temp_dir.path().join("Migration20240101000000.rs"), "").unwrap();

        let config = config_for(&temp_dir);
        let versions = MigrationDiscovery::new(&config).prepared_versions().unwrap();

        let versions: Vec<_> = versions.into_iter().collect();
        assert_eq!(versions, vec!["20240101000000", "20240102000000"]);
    }

    #[test]
    fn ignores_non_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Migration20240101000000.rs"), "").unwrap();
        fs::write(temp_dir.path().join("README.md"), "").unwrap();
        fs::write(temp_dir.path().join("helpers.rs"), "").unwrap();
        fs::write(temp_dir.path().join("Migration.rs"), "").unwrap();
        fs::create_dir(temp_dir.path().join("Migration20240102000000.rs")).unwrap();

        let config = config_for(&temp_dir);
        let versions = MigrationDiscovery::new(&config).prepared_versions().unwrap();

        let versions: Vec<_> = versions.into_iter().collect();
        assert_eq!(versions, vec!["20240101000000"]);
    }

    #[test]
    fn rescans_the_directory_each_call() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir);
        let discovery = MigrationDiscovery::new(&config);

        assert!(discovery.prepared_versions().unwrap().is_empty());

        fs::write(temp_dir.path().join("Migration20240101000000.rs"), "").unwrap();
        assert_eq!(discovery.prepared_versions().unwrap().len(), 1);
    }
}
