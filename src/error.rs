//! Error types for the recipe engine.
//!
//! Algorithm and pipeline failures are [`CipherError`]; they abort the current
//! buffer and are reported against the file being processed. Recipe document
//! problems are [`RecipeError`] and per-file I/O problems are [`FileError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::recipe::StepType;

/// Which piece of key material an operation was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum KeyRole {
    /// The shared secret of a symmetric cipher.
    #[strum(to_string = "key")]
    Secret,

    /// The public half of a key pair.
    #[strum(to_string = "public key")]
    Public,

    /// The private half of a key pair.
    #[strum(to_string = "private key")]
    Private,
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("{0} not set")]
    KeyNotSet(KeyRole),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext too short: need at least {min} bytes, got {actual}")]
    CiphertextTooShort { min: usize, actual: usize },

    #[error("authentication failed: wrong key or tampered data")]
    AuthenticationFailed,

    #[error("malformed PEM: {0}")]
    MalformedPem(String),

    #[error("unsupported algorithm '{id}' for {kind} step")]
    UnsupportedAlgorithm { kind: StepType, id: String },

    #[error("unsupported RSA key size: {0} bits")]
    UnsupportedKeySize(usize),

    #[error("message too long: at most {max} bytes fit, got {actual}")]
    MessageTooLong { max: usize, actual: usize },

    #[error("ciphertext length {actual} does not match key size {expected}")]
    InvalidCiphertextLength { expected: usize, actual: usize },

    #[error("{0} encryption failed")]
    EncryptionFailed(&'static str),

    #[error("rsa-oaep decryption failed")]
    DecryptionFailed,

    #[error("key encoding failed: {0}")]
    KeyEncoding(String),
}

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("invalid recipe document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key in recipe: {0}")]
    Key(#[from] CipherError),

    #[error("invalid key file content in step {step}: {source}")]
    KeyFile { step: usize, source: base64::DecodeError },
}

/// Failure of a single file in a batch.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("output would overwrite its input: {}", path.display())]
    OutputIsInput { path: PathBuf },

    #[error("output already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
