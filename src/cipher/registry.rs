//! Table of the algorithms a recipe step can name.
//!
//! Entries hold factories rather than instances: [`AlgorithmEntry::instantiate`]
//! returns a new cipher bound to the step's key material every time.

use tracing::warn;

use super::{AesGcm, Asymmetric, Cipher, KeyMaterial, KeySource, KeySources, RsaOaep, Symmetric};
use crate::error::{CipherError, KeyRole};
use crate::recipe::StepType;

type Factory = fn(KeyMaterial<'_>) -> Result<Box<dyn Cipher>, CipherError>;

pub struct AlgorithmEntry {
    pub kind: StepType,
    pub id: &'static str,
    pub label: &'static str,
    pub key_sources: KeySources,
    factory: Factory,
}

impl AlgorithmEntry {
    /// Builds a fresh cipher keyed with `material`.
    pub fn instantiate(&self, material: KeyMaterial<'_>) -> Result<Box<dyn Cipher>, CipherError> {
        (self.factory)(material)
    }

    #[inline]
    pub fn accepts(&self, source: KeySource) -> bool {
        self.key_sources.contains(source)
    }
}

impl std::fmt::Debug for AlgorithmEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmEntry").field("kind", &self.kind).field("id", &self.id).field("label", &self.label).field("key_sources", &self.key_sources).finish()
    }
}

fn build_aes_gcm(material: KeyMaterial<'_>) -> Result<Box<dyn Cipher>, CipherError> {
    let KeyMaterial::SharedSecret(secret) = material else {
        return Err(CipherError::KeyNotSet(KeyRole::Secret));
    };

    let mut cipher = AesGcm::new();
    cipher.set_key(secret)?;

    let bound = cipher.key().map_or(0, <[u8]>::len);
    if secret.len() > bound {
        warn!(material = secret.len(), used = bound, "key material truncated; trailing bytes are ignored");
    }

    Ok(Box::new(cipher))
}

fn build_rsa_oaep(material: KeyMaterial<'_>) -> Result<Box<dyn Cipher>, CipherError> {
    let KeyMaterial::KeyPair { public, private } = material else {
        return Err(CipherError::KeyNotSet(KeyRole::Public));
    };

    let mut cipher = RsaOaep::new();
    if let Some(key) = public {
        cipher.set_public_key(key.clone());
    }
    if let Some(key) = private {
        cipher.set_private_key(key.clone());
    }

    Ok(Box::new(cipher))
}

static ALGORITHMS: &[AlgorithmEntry] = &[
    AlgorithmEntry { kind: StepType::Symmetric, id: "aes256gcm", label: AesGcm::LABEL, key_sources: AesGcm::KEY_SOURCES, factory: build_aes_gcm },
    AlgorithmEntry { kind: StepType::Asymmetric, id: "rsa", label: RsaOaep::LABEL, key_sources: RsaOaep::KEY_SOURCES, factory: build_rsa_oaep },
];

/// All registered algorithms, in display order.
#[inline]
pub fn entries() -> &'static [AlgorithmEntry] {
    ALGORITHMS
}

/// Algorithms offered for steps of `kind`.
pub fn for_kind(kind: StepType) -> impl Iterator<Item = &'static AlgorithmEntry> {
    ALGORITHMS.iter().filter(move |entry| entry.kind == kind)
}

/// Resolves the algorithm a step names.
///
/// # Errors
///
/// [`CipherError::UnsupportedAlgorithm`] when `(kind, id)` is not registered.
pub fn lookup(kind: StepType, id: &str) -> Result<&'static AlgorithmEntry, CipherError> {
    ALGORITHMS.iter().find(|entry| entry.kind == kind && entry.id == id).ok_or_else(|| CipherError::UnsupportedAlgorithm { kind, id: id.to_owned() })
}

/// Finds an algorithm by id alone, whatever its step type.
pub fn find_by_id(id: &str) -> Option<&'static AlgorithmEntry> {
    ALGORITHMS.iter().find(|entry| entry.id == id)
}
