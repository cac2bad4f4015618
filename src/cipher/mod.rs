//! # Cipher Capabilities
//!
//! Every algorithm a recipe step can name implements [`Cipher`]: a label, the
//! key sources it accepts, and a pair of buffer transforms. How key material
//! reaches the cipher depends on its family:
//!
//! - [`Symmetric`] ciphers take one shared secret (a passphrase's UTF-8 bytes
//!   or the raw bytes of a key file).
//! - [`Asymmetric`] ciphers take a key pair; encryption needs the public half
//!   and decryption the private half.
//!
//! Instances are never shared. The [`registry`] maps `(StepType, id)` to a
//! factory and the pipeline builds a freshly keyed instance for every step it
//! runs, so two recipes processed at the same time cannot observe each
//! other's keys.

use std::fmt;

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::CipherError;

mod aes_gcm;
pub mod registry;
mod rsa_oaep;

pub use self::aes_gcm::AesGcm;
pub use registry::AlgorithmEntry;
pub use rsa_oaep::RsaOaep;

/// Where the key material of a step comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString, strum::IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeySource {
    /// A passphrase typed by the user.
    Passphrase,

    /// Key material loaded from a file.
    Keyfile,
}

/// Ordered set of at most two distinct key sources.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeySources {
    first: KeySource,
    second: Option<KeySource>,
}

impl KeySources {
    #[inline]
    pub const fn one(source: KeySource) -> Self {
        Self { first: source, second: None }
    }

    /// Both sources, `preferred` first.
    ///
    /// # Panics
    ///
    /// At compile time in const contexts when both sources are equal.
    pub const fn two(preferred: KeySource, other: KeySource) -> Self {
        assert!(preferred as u8 != other as u8, "key sources must be distinct");
        Self { first: preferred, second: Some(other) }
    }

    #[inline]
    pub fn contains(self, source: KeySource) -> bool {
        self.first == source || self.second == Some(source)
    }

    pub fn iter(self) -> impl Iterator<Item = KeySource> {
        std::iter::once(self.first).chain(self.second)
    }

    #[inline]
    pub fn len(self) -> usize {
        1 + usize::from(self.second.is_some())
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        false
    }
}

impl fmt::Debug for KeySources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for KeySources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.iter().map(Into::into).collect();
        f.write_str(&names.join(", "))
    }
}

/// Key material handed to a factory when a step runs.
#[derive(Clone, Copy)]
pub enum KeyMaterial<'a> {
    /// Raw secret bytes for a symmetric cipher.
    SharedSecret(&'a [u8]),

    /// Whatever halves of a key pair the step carries.
    KeyPair { public: Option<&'a RsaPublicKey>, private: Option<&'a RsaPrivateKey> },
}

impl fmt::Debug for KeyMaterial<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedSecret(secret) => write!(f, "SharedSecret([... {} bytes ...])", secret.len()),
            Self::KeyPair { public, private } => f.debug_struct("KeyPair").field("public", &public.is_some()).field("private", &private.is_some()).finish(),
        }
    }
}

/// Capability every recipe algorithm provides.
pub trait Cipher: Send + Sync {
    /// Human-readable algorithm name.
    fn label(&self) -> &'static str;

    /// Key sources this algorithm accepts, preferred first.
    fn key_sources(&self) -> KeySources;

    /// Encrypts `plaintext`. Output framing is fixed; only nonces are random.
    ///
    /// # Errors
    ///
    /// Fails with [`CipherError::KeyNotSet`] when no key has been bound.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypts a buffer produced by [`Cipher::encrypt`] of the same algorithm.
    ///
    /// # Errors
    ///
    /// Fails when no key is bound, when the input is shorter than the
    /// smallest valid ciphertext, or when authentication fails.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// Shared-secret key binding.
pub trait Symmetric: Cipher {
    /// Binds key material, adapting it to the cipher's key length.
    ///
    /// # Errors
    ///
    /// Fails with [`CipherError::InvalidKeyLength`] for unusable material.
    fn set_key(&mut self, key: &[u8]) -> Result<(), CipherError>;

    /// The bound key, after length adaptation.
    fn key(&self) -> Option<&[u8]>;
}

/// Key-pair binding.
pub trait Asymmetric: Cipher {
    type PublicKey;
    type PrivateKey;

    fn set_public_key(&mut self, key: Self::PublicKey);

    fn public_key(&self) -> Option<&Self::PublicKey>;

    fn set_private_key(&mut self, key: Self::PrivateKey);

    fn private_key(&self) -> Option<&Self::PrivateKey>;
}
