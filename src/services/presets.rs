//! Preset file I/O service.
//!
//! This module centralizes reading input documents and writing converted
//! output, so every command reports file problems the same way.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Service for reading and writing conversion inputs and outputs.
pub struct PresetService;

impl PresetService {
    /// Reads an input file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error when the path does not exist, is not a regular file,
    /// or cannot be read.
    pub fn read(path: &Path) -> Result<String> {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        if !path.is_file() {
            bail!("Path is not a file: {}", path.display());
        }

        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    /// Writes `content` to `path`.
    ///
    /// This performs an atomic write using a temp file + rename pattern so a
    /// failed run never leaves a half-written output behind.
    ///
    /// # Errors
    ///
    /// Returns errors for file I/O failures, permission issues and rename
    /// failures.
    pub fn write(path: &Path, content: &str) -> Result<()> {
        atomic_write(path, content)
            .with_context(|| format!("Failed to write output to {}", path.display()))
    }
}

/// Writes content to a file atomically using temp file + rename.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write to temporary file: {}", temp_path.display()))?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("preset.json");

        PresetService::write(&path, "{}").unwrap();
        assert_eq!(PresetService::read(&path).unwrap(), "{}");
        assert!(!temp_dir.path().join("preset.json.tmp").exists());
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = PresetService::read(&temp_dir.path().join("missing.md")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_read_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = PresetService::read(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("out.json");
        assert!(PresetService::write(&path, "{}").is_err());
    }
}
