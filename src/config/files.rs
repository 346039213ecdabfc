use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the per-project and per-user configuration directory
pub const TASKIN_DIR: &str = ".taskin";

/// Get the taskin directory - checks for local .taskin first, then falls back to global ~/.taskin
pub fn get_taskin_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local_dir) = find_local_taskin(&current_dir) {
        return Ok(local_dir);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(TASKIN_DIR))
}

/// Find local .taskin directory by walking up the directory tree
pub fn find_local_taskin(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let candidate = current.join(TASKIN_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Initialize a local .taskin directory under `base`
pub fn init_local_taskin(base: &Path) -> Result<PathBuf> {
    let taskin_dir = base.join(TASKIN_DIR);

    if taskin_dir.exists() {
        anyhow::bail!("Taskin directory already exists: {}", taskin_dir.display());
    }

    fs::create_dir_all(&taskin_dir)
        .with_context(|| format!("Failed to create directory: {}", taskin_dir.display()))?;

    Ok(taskin_dir)
}

/// Path of config.toml inside a taskin directory
pub fn config_file(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().context("File path has no parent directory")?;

    let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temporary file")?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}
