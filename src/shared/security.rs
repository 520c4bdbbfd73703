use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum graph snapshot size (512 MB)
/// Snapshots are read fully into memory before parsing
pub const MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Maximum configuration file size (1 MB)
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Rejects symbolic links before `operation` touches `path`.
///
/// Uses `symlink_metadata()` so the link itself is inspected, not its target.
///
/// # Errors
/// Returns an error if the path is a symbolic link or its metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Reads a regular, size-bounded file into memory.
///
/// # Arguments
/// * `path` - File to read
/// * `file_description` - Used in error messages (e.g. "graph snapshot")
/// * `max_size` - Upper bound in bytes
///
/// # Errors
/// Returns an error if the path is missing, is a symlink or a directory,
/// exceeds `max_size`, or is not valid UTF-8
pub fn read_bounded_file(path: &Path, file_description: &str, max_size: u64) -> Result<String> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} {} is a symbolic link, which is not allowed.",
            file_description,
            path.display()
        );
    }
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }
    if metadata.len() > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            metadata.len(),
            max_size
        );
    }

    fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file_description, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_not_symlink_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("graph.json");
        fs::write(&file_path, "{}").unwrap();

        assert!(validate_not_symlink(&file_path, "write").is_ok());
    }

    #[test]
    fn test_validate_not_symlink_nonexistent() {
        let path = PathBuf::from("/nonexistent/graph.json");
        assert!(validate_not_symlink(&path, "write").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.json");
        let link = temp_dir.path().join("link.json");
        fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(validate_not_symlink(&link, "write").is_err());
        let error = read_bounded_file(&link, "graph snapshot", MAX_FILE_SIZE).unwrap_err();
        assert!(error.to_string().contains("symbolic link"));
    }

    #[test]
    fn test_read_bounded_file_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("config.yml");
        fs::write(&file_path, "concurrency: 4").unwrap();

        let content = read_bounded_file(&file_path, "config file", MAX_CONFIG_SIZE).unwrap();
        assert_eq!(content, "concurrency: 4");
    }

    #[test]
    fn test_read_bounded_file_rejects_directory() {
        let temp_dir = TempDir::new().unwrap();
        let error = read_bounded_file(temp_dir.path(), "config file", MAX_CONFIG_SIZE).unwrap_err();
        assert!(error.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_read_bounded_file_rejects_oversized() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("big.json");
        fs::write(&file_path, "0123456789").unwrap();

        let error = read_bounded_file(&file_path, "graph snapshot", 4).unwrap_err();
        assert!(error.to_string().contains("too large"));
    }
}
