//! Result file discovery.
//!
//! This module finds the per-run result files in a results directory and
//! pulls the run index out of their names.

use crate::error::{AggregateError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for result file discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Extension (without dot) a candidate must carry, matched exactly.
    pub extension: String,
    /// Separator between the filename prefix and the run index.
    pub index_separator: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            index_separator: "-".to_string(),
        }
    }
}

impl From<&crate::config::LoaderConfig> for ScanConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            extension: config.extension.clone(),
            index_separator: config.index_separator.clone(),
        }
    }
}

/// A result file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without directory.
    pub name: String,
}

/// Finds result files directly inside a directory.
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// List candidate files, sorted by file name.
    ///
    /// Subdirectories are not entered and files with another extension are
    /// skipped without complaint. Symlinks are resolved, so a linked result
    /// file counts like a regular one.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            return Err(AggregateError::DirectoryNotFound(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.matches(entry.path()) {
                debug!("Skipping non-result file {}", entry.path().display());
                continue;
            }

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                name: entry.file_name().to_string_lossy().to_string(),
            });
        }

        debug!(
            "Found {} candidate files in {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Check if a path has the result extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == self.config.extension)
    }

    /// Parse the run index out of a file name such as `sim-12.json`.
    ///
    /// The stem is split on the separator and the component right after the
    /// prefix must be an integer; anything after it is ignored.
    pub fn parse_index(&self, name: &str) -> Result<i64> {
        let malformed = || AggregateError::MalformedFilename {
            name: name.to_string(),
            separator: self.config.index_separator.clone(),
        };

        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(malformed)?;

        stem.split(self.config.index_separator.as_str())
            .nth(1)
            .and_then(|token| token.parse::<i64>().ok())
            .ok_or_else(malformed)
    }
}
