//! AES-256-GCM step cipher.
//!
//! Ciphertext format: `[Nonce (12B)] || [Ciphertext] || [Auth Tag (16B)]`.
//!
//! Key material is fitted to 32 bytes by zero-filling or truncating it. This
//! is not a key derivation function: a passphrase keeps exactly the entropy
//! of its first 32 bytes.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use super::{Cipher, KeySource, KeySources, Symmetric};
use crate::config::{AES_KEY_SIZE, AES_MIN_CIPHERTEXT_SIZE, AES_NONCE_SIZE};
use crate::error::{CipherError, KeyRole};
use crate::secret::SecretBytes;

pub struct AesGcm {
    key: Option<SecretBytes>,
    inner: Option<Aes256Gcm>,
}

impl AesGcm {
    pub const LABEL: &'static str = "AES-256-GCM";

    pub const KEY_SOURCES: KeySources = KeySources::two(KeySource::Passphrase, KeySource::Keyfile);

    /// Creates an unkeyed instance; bind a key with [`Symmetric::set_key`].
    #[inline]
    pub fn new() -> Self {
        Self { key: None, inner: None }
    }

    /// Creates an instance keyed with `key`.
    pub fn with_key(key: &[u8]) -> Result<Self, CipherError> {
        let mut cipher = Self::new();
        cipher.set_key(key)?;
        Ok(cipher)
    }

    fn fit_key(key: &[u8]) -> [u8; AES_KEY_SIZE] {
        let mut fitted = [0u8; AES_KEY_SIZE];
        let len = key.len().min(AES_KEY_SIZE);
        fitted[..len].copy_from_slice(&key[..len]);
        fitted
    }

    fn inner(&self) -> Result<&Aes256Gcm, CipherError> {
        self.inner.as_ref().ok_or(CipherError::KeyNotSet(KeyRole::Secret))
    }
}

impl Default for AesGcm {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for AesGcm {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn key_sources(&self) -> KeySources {
        Self::KEY_SOURCES
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let inner = self.inner()?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut result = inner.encrypt(&nonce, plaintext).map_err(|_| CipherError::EncryptionFailed(Self::LABEL))?;

        result.splice(0..0, nonce.iter().copied());
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let inner = self.inner()?;

        if ciphertext.len() < AES_MIN_CIPHERTEXT_SIZE {
            return Err(CipherError::CiphertextTooShort { min: AES_MIN_CIPHERTEXT_SIZE, actual: ciphertext.len() });
        }

        let (nonce, data) = ciphertext.split_at(AES_NONCE_SIZE);
        inner.decrypt(Nonce::from_slice(nonce), data).map_err(|_| CipherError::AuthenticationFailed)
    }
}

impl Symmetric for AesGcm {
    fn set_key(&mut self, key: &[u8]) -> Result<(), CipherError> {
        if key.is_empty() {
            return Err(CipherError::InvalidKeyLength { expected: AES_KEY_SIZE, actual: 0 });
        }

        let fitted = Self::fit_key(key);
        let inner = Aes256Gcm::new_from_slice(&fitted).map_err(|_| CipherError::InvalidKeyLength { expected: AES_KEY_SIZE, actual: fitted.len() })?;

        self.key = Some(SecretBytes::new(&fitted));
        self.inner = Some(inner);
        Ok(())
    }

    fn key(&self) -> Option<&[u8]> {
        self.key.as_ref().map(SecretBytes::expose_secret)
    }
}
