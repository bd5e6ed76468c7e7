// workspace.rs - Per-worker scratch directory for external tool artifacts

use crate::error::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory owned by one worker.
///
/// Every FASTA handed to an external tool, and every report it writes, lives
/// here. The directory is removed when the workspace is dropped unless it was
/// created in debug mode, in which case it is kept for inspection.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    kept: Option<PathBuf>,
    counter: usize,
    files: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(keep: bool) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("trecall.").tempdir()?;
        if keep {
            let path = dir.keep();
            info!("Keeping temporary files in {}", path.display());
            Ok(Self {
                dir: None,
                kept: Some(path),
                counter: 0,
                files: Vec::new(),
            })
        } else {
            Ok(Self {
                dir: Some(dir),
                kept: None,
                counter: 0,
                files: Vec::new(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        match (&self.dir, &self.kept) {
            (Some(dir), _) => dir.path(),
            (None, Some(path)) => path.as_path(),
            (None, None) => unreachable!("workspace always holds a directory"),
        }
    }

    /// Reserve a fresh file name inside the workspace
    pub fn file_name(&mut self, stem: &str, extension: &str) -> PathBuf {
        self.counter += 1;
        let path = self
            .path()
            .join(format!("{}.{}.{}", stem, self.counter, extension));
        self.files.push(path.clone());
        path
    }

    /// Write content to a fresh file inside the workspace
    pub fn write_file(&mut self, stem: &str, extension: &str, content: &str) -> Result<PathBuf> {
        let path = self.file_name(stem, extension);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Record a file produced by a tool so it is accounted for on cleanup
    pub fn track(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    pub fn tracked_files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_kept(&self) -> bool {
        self.kept.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let path;
        {
            let mut ws = Workspace::new(false).unwrap();
            path = ws.path().to_path_buf();
            let file = ws.write_file("trf", "fa", ">a\nACGT\n").unwrap();
            assert!(file.exists());
            assert_eq!(ws.tracked_files().len(), 1);
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_kept_in_debug() {
        let path;
        {
            let ws = Workspace::new(true).unwrap();
            assert!(ws.is_kept());
            path = ws.path().to_path_buf();
        }
        assert!(path.exists());
        std::fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_unique_file_names() {
        let mut ws = Workspace::new(false).unwrap();
        let a = ws.file_name("query", "fa");
        let b = ws.file_name("query", "fa");
        assert_ne!(a, b);
    }
}
