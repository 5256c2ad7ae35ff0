//! [`TestRulesDir`] scratch directory for rule-file tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary rules directory with assertion helpers.
pub struct TestRulesDir {
    temp_dir: TempDir,
}

impl Default for TestRulesDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRulesDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Directory rule files are generated into.
    pub fn rules(&self) -> PathBuf {
        self.temp_dir.path().join("rules")
    }

    /// Directory backups are written to.
    pub fn backups(&self) -> PathBuf {
        self.temp_dir.path().join("backups")
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Names of all entries in the rules directory, sorted.
    pub fn rule_file_names(&self) -> Vec<String> {
        list_names(&self.rules())
    }

    /// Names of all entries in the backup directory, sorted.
    pub fn backup_file_names(&self) -> Vec<String> {
        list_names(&self.backups())
    }

    /// Read a file from the rules directory.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, name: &str) -> String {
        let path = self.rules().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read rule file: {}", path.display()))
    }

    /// Assert that no in-flight temp file is left in the rules directory.
    ///
    /// # Panics
    /// Panics listing the offending files.
    pub fn assert_no_temp_files(&self) {
        let leftovers: Vec<_> = self
            .rule_file_names()
            .into_iter()
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(
            leftovers.is_empty(),
            "Expected no temp files in {}, found: {:?}",
            self.rules().display(),
            leftovers
        );
    }

    pub fn assert_file_exists(&self, name: &str) {
        let path = self.rules().join(name);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn assert_file_not_exists(&self, name: &str) {
        let path = self.rules().join(name);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }
}

fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
