//! Files on disk: discovery, async I/O and output naming.
//!
//! Inputs named explicitly on the command line are taken as they are.
//! Directories are walked recursively; hidden entries are skipped and only
//! files the current mode can work on are kept (plain files for encryption,
//! `.enc` files for decryption).

use std::path::{Path, PathBuf};

use anyhow::{Result, ensure};
use walkdir::{DirEntry, WalkDir};

use crate::config::FILE_EXTENSION;
use crate::error::FileError;
use crate::types::ProcessorMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, lossily converted.
    pub fn name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.path.as_os_str().to_string_lossy().ends_with(FILE_EXTENSION)
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.path.file_name().is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }

    /// Whether a directory walk in `mode` should pick this file up.
    pub fn is_eligible(&self, mode: ProcessorMode) -> bool {
        if self.is_hidden() {
            return false;
        }

        match mode {
            ProcessorMode::Encrypt => !self.is_encrypted(),
            ProcessorMode::Decrypt => self.is_encrypted(),
        }
    }

    /// Where the result of processing this file in `mode` goes.
    ///
    /// Next to the input unless `output_dir` is given.
    pub fn output_path(&self, mode: ProcessorMode, output_dir: Option<&Path>) -> PathBuf {
        let name = mode.output_name(&self.name());
        match (output_dir, self.path.parent()) {
            (Some(dir), _) => dir.join(name),
            (None, Some(parent)) => parent.join(name),
            (None, None) => PathBuf::from(name),
        }
    }

    /// Whether something is already at this path. Unreadable metadata counts as absent.
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Whether both paths name the same file, after resolving links and `.` components.
    pub async fn is_same_file(&self, other: &Self) -> bool {
        if self.path == other.path {
            return true;
        }

        match (tokio::fs::canonicalize(&self.path).await, tokio::fs::canonicalize(&other.path).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>, FileError> {
        tokio::fs::read(&self.path).await.map_err(|source| FileError::Read { path: self.path.clone(), source })
    }

    /// Writes `data`, creating missing parent directories and truncating an existing file.
    pub async fn write(&self, data: &[u8]) -> Result<(), FileError> {
        let map_err = |source| FileError::Write { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(map_err)?;
        }

        tokio::fs::write(&self.path, data).await.map_err(map_err)
    }

    /// Expands `inputs` into the files to process, in a stable order.
    ///
    /// # Errors
    ///
    /// Fails when an input does not exist.
    pub fn discover(inputs: &[PathBuf], mode: ProcessorMode) -> Result<Vec<Self>> {
        let mut files = Vec::new();

        for input in inputs {
            ensure!(input.exists(), "file not found: {}", input.display());

            if !input.is_dir() {
                files.push(Self::new(input));
                continue;
            }

            WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden_entry(entry))
                .filter_map(|entry| entry.ok()) // Skip entries with permission errors
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| Self::new(entry.into_path()))
                .filter(|file| file.is_eligible(mode))
                .for_each(|file| files.push(file));
        }

        Ok(files)
    }
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let file = File::new("docs/report.pdf");
        assert_eq!(file.output_path(ProcessorMode::Encrypt, None), PathBuf::from("docs/report.pdf.enc"));
        assert_eq!(file.output_path(ProcessorMode::Encrypt, Some(Path::new("out"))), PathBuf::from("out/report.pdf.enc"));

        let encrypted = File::new("docs/report.pdf.enc");
        assert_eq!(encrypted.output_path(ProcessorMode::Decrypt, None), PathBuf::from("docs/report.pdf"));
        assert_eq!(File::new("notes.txt").output_path(ProcessorMode::Decrypt, None), PathBuf::from("notes.txt"));
    }

    #[test]
    fn test_eligibility() {
        assert!(File::new("a.txt").is_eligible(ProcessorMode::Encrypt));
        assert!(!File::new("a.txt.enc").is_eligible(ProcessorMode::Encrypt));
        assert!(File::new("a.txt.enc").is_eligible(ProcessorMode::Decrypt));
        assert!(!File::new(".secret").is_eligible(ProcessorMode::Encrypt));
    }

    #[test]
    fn test_discover_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("done.txt.enc"), b"x").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"h").unwrap();
        std::fs::write(dir.path().join(".git/config"), b"c").unwrap();
        std::fs::write(dir.path().join("nested/c.txt"), b"c").unwrap();

        let names: Vec<String> = File::discover(&[dir.path().to_path_buf()], ProcessorMode::Encrypt).unwrap().iter().map(File::name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

        let encrypted = File::discover(&[dir.path().to_path_buf()], ProcessorMode::Decrypt).unwrap();
        assert_eq!(encrypted.len(), 1);
        assert_eq!(encrypted[0].name(), "done.txt.enc");
    }

    #[test]
    fn test_discover_keeps_explicit_files_and_rejects_missing() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join(".env");
        std::fs::write(&explicit, b"x").unwrap();

        assert_eq!(File::discover(&[explicit.clone()], ProcessorMode::Encrypt).unwrap(), vec![File::new(&explicit)]);
        assert!(File::discover(&[dir.path().join("missing")], ProcessorMode::Encrypt).is_err());
    }

    #[tokio::test]
    async fn test_is_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"a").unwrap();

        assert!(File::new(&path).is_same_file(&File::new(&path)).await);
        assert!(File::new(dir.path().join(".").join("a.txt")).is_same_file(&File::new(&path)).await);
        assert!(!File::new(dir.path().join("b.txt")).is_same_file(&File::new(&path)).await);
    }

    #[tokio::test]
    async fn test_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::new(dir.path().join("deep/inside/out.bin"));
        file.write(b"payload").await.unwrap();
        assert_eq!(file.read().await.unwrap(), b"payload");

        assert!(file.exists().await);

        let missing = File::new(dir.path().join("nope"));
        assert!(!missing.exists().await);
        assert!(matches!(missing.read().await, Err(FileError::Read { .. })));
    }
}
