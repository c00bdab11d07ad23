//! Input file expansion.
//!
//! Each positional argument is either a literal path or a glob pattern such
//! as `dumps/*.sql.gz`; shells that do not expand globs hand them to us as-is.

use ahash::AHashSet;
use std::path::{Path, PathBuf};

/// Check if a path string contains glob pattern characters.
pub fn is_glob_pattern(path: &str) -> bool {
    path.contains('*') || path.contains('?') || path.contains('[')
}

/// Expand one literal path or glob pattern, sorted.
pub fn expand_file_pattern(pattern: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern_str = pattern.to_string_lossy();

    if !is_glob_pattern(&pattern_str) {
        if !pattern.exists() {
            anyhow::bail!("file does not exist: {}", pattern.display());
        }
        return Ok(vec![pattern.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in glob::glob(&pattern_str)
        .map_err(|e| anyhow::anyhow!("invalid glob pattern '{}': {}", pattern_str, e))?
    {
        let path = entry
            .map_err(|e| anyhow::anyhow!("error reading path for pattern '{}': {}", pattern_str, e))?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        anyhow::bail!("no files match pattern: {}", pattern_str);
    }

    files.sort();
    Ok(files)
}

/// Expand every argument in order, dropping files already listed.
pub fn expand_file_patterns(patterns: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = AHashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        for file in expand_file_pattern(pattern)? {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

/// Tally of a run over several files.
#[derive(Debug, Default)]
pub struct MultiFileResult {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl MultiFileResult {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, path: PathBuf, error: String) {
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
