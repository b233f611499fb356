use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

pub async fn file_exists(path: &Path) -> bool {
    async_fs::metadata(path).await.is_ok()
}

/// Writes `contents` to a sibling temp file and renames it over `path`,
/// so readers never observe a half-written file.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = temp_sibling(path);
    async_fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;

    if let Err(e) = async_fs::rename(&tmp_path, path).await {
        let _ = async_fs::remove_file(&tmp_path).await;
        return Err(e).with_context(|| format!("Failed to move file into place: {}", path.display()));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}
