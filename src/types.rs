//! Common type definitions for stepcrypt.
//!
//! - [`ProcessorMode`]: encrypt or decrypt, used for file naming and filtering
//! - [`Processing`]: the operation in progress, with display labels
//! - [`FileBlob`]: an in-memory file handed to the worker
//! - [`FileOutcome`] and [`BatchReport`]: per-file results of a batch

use std::fmt::{Display, Formatter, Result};

use crate::config::FILE_EXTENSION;
use crate::error::FileError;

/// Represents the type of file operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorMode {
    /// Encrypt the file, producing a `.enc` output.
    Encrypt,

    /// Decrypt the file, removing the `.enc` extension.
    Decrypt,
}

impl ProcessorMode {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt",
            Self::Decrypt => "Decrypt",
        }
    }

    /// Name of the file this mode produces from `name`.
    ///
    /// Encryption appends `.enc`. Decryption strips it when present and
    /// otherwise leaves the name untouched.
    pub fn output_name(self, name: &str) -> String {
        match self {
            Self::Encrypt => format!("{name}{FILE_EXTENSION}"),
            Self::Decrypt => name.strip_suffix(FILE_EXTENSION).filter(|stem| !stem.is_empty()).unwrap_or(name).to_owned(),
        }
    }
}

impl Display for ProcessorMode {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// Represents a processing operation in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processing {
    /// An encryption operation is in progress.
    Encryption,

    /// A decryption operation is in progress.
    Decryption,
}

impl Processing {
    /// Progress label for the operation.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting...",
            Self::Decryption => "Decrypting...",
        }
    }

    #[inline]
    pub fn mode(self) -> ProcessorMode {
        match self {
            Self::Encryption => ProcessorMode::Encrypt,
            Self::Decryption => ProcessorMode::Decrypt,
        }
    }
}

impl Display for Processing {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// A named buffer: the unit the worker encrypts or decrypts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub data: Vec<u8>,
}

impl FileBlob {
    #[inline]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { name: name.into(), data }
    }
}

/// Result of processing one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Name of the input file.
    pub name: String,

    /// The output blob, or why this file failed.
    pub result: std::result::Result<FileBlob, FileError>,
}

impl FileOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    #[inline]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn outputs(&self) -> impl Iterator<Item = &FileBlob> {
        self.outcomes.iter().filter_map(|outcome| outcome.result.as_ref().ok())
    }
}
