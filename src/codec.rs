//! Text encodings for binary buffers.
//!
//! Hex and base64 helpers used for display and recipe export, and the PEM
//! framing used to read RSA keys and to write passphrase-protected ones.
//! Reading is lenient about whitespace and surrounding text. Everything here
//! is pure.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::PEM_LINE_WIDTH;
use crate::error::CipherError;

/// Label of a PEM block, `-----BEGIN {label} KEY-----`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum PemLabel {
    #[strum(serialize = "PUBLIC")]
    Public,

    #[strum(serialize = "PRIVATE")]
    Private,

    #[strum(serialize = "ENCRYPTED PRIVATE")]
    EncryptedPrivate,
}

#[inline]
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

#[inline]
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

#[inline]
pub fn from_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

/// Wraps DER bytes into a PEM block.
///
/// The body is base64 split into 64-character lines; the block has no trailing newline.
pub fn to_pem(der: &[u8], label: PemLabel) -> String {
    let encoded = to_base64(der);
    let body = encoded
        .as_bytes()
        .chunks(PEM_LINE_WIDTH)
        // base64 output is ASCII, so every chunk is valid UTF-8.
        .map(|line| std::str::from_utf8(line).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    format!("-----BEGIN {label} KEY-----\n{body}\n-----END {label} KEY-----")
}

/// Unwraps a PEM block, returning its label and the decoded DER bytes.
///
/// Text around the block is ignored; whitespace inside the body is stripped.
pub fn from_pem(pem: &str) -> Result<(PemLabel, Vec<u8>), CipherError> {
    const BEGIN: &str = "-----BEGIN ";
    const DASHES: &str = "-----";

    let start = pem.find(BEGIN).ok_or_else(|| CipherError::MalformedPem("missing BEGIN marker".into()))?;
    let after_begin = &pem[start + BEGIN.len()..];
    let label_end = after_begin.find(DASHES).ok_or_else(|| CipherError::MalformedPem("unterminated BEGIN marker".into()))?;
    let header = &after_begin[..label_end];

    let label = header
        .strip_suffix(" KEY")
        .and_then(|role| role.parse::<PemLabel>().ok())
        .ok_or_else(|| CipherError::MalformedPem(format!("unsupported label '{header}'")))?;

    let body_and_rest = &after_begin[label_end + DASHES.len()..];
    let end_marker = format!("-----END {header}-----");
    let body_end = body_and_rest.find(&end_marker).ok_or_else(|| CipherError::MalformedPem(format!("missing END marker for '{header}'")))?;

    let body: String = body_and_rest[..body_end].chars().filter(|c| !c.is_whitespace()).collect();
    if body.is_empty() {
        return Err(CipherError::MalformedPem("empty body".into()));
    }

    let der = from_base64(&body).map_err(|e| CipherError::MalformedPem(format!("invalid base64 body: {e}")))?;

    Ok((label, der))
}

/// Like [`from_pem`], but fails unless the block carries `expected`.
pub fn from_pem_labeled(pem: &str, expected: PemLabel) -> Result<Vec<u8>, CipherError> {
    let (label, der) = from_pem(pem)?;
    if label != expected {
        return Err(CipherError::MalformedPem(format!("expected {expected} KEY block, found {label} KEY")));
    }

    Ok(der)
}
