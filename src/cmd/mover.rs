//! Moving processed inputs into `--completed` / `--failed` directories.

use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Move `file` into `dir`, creating the directory if needed. Returns the new
/// location.
pub fn move_into(file: &Path, dir: &Path) -> anyhow::Result<PathBuf> {
    let dir = expand_tilde(dir);
    fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("cannot create directory {}: {}", dir.display(), e))?;

    let name = file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("not a file path: {}", file.display()))?;
    let target = dir.join(name);

    if fs::rename(file, &target).is_err() {
        // Different filesystem
        fs::copy(file, &target).map_err(|e| {
            anyhow::anyhow!("cannot move {} to {}: {}", file.display(), dir.display(), e)
        })?;
        fs::remove_file(file)?;
    }

    Ok(target)
}
