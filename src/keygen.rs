//! Key generation for the registered algorithms.
//!
//! Keys come back both as usable values and in the text form recipes and key
//! files store them in: PEM for RSA pairs, base64 for symmetric keys.

use std::fmt;

use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{KeyInit, OsRng};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::cipher::{RsaOaep, registry};
use crate::codec::to_base64;
use crate::config::RSA_DEFAULT_BITS;
use crate::error::CipherError;
use crate::recipe::StepType;
use crate::secret::{Secret, SecretBytes};

/// Parameters for [`generate`]. Ignored by algorithms they do not apply to.
#[derive(Debug, Clone, Copy)]
pub struct KeyParams<'a> {
    /// RSA modulus size.
    pub bits: usize,

    /// Seals the RSA private key PEM when set to a non-blank passphrase.
    pub passphrase: Option<&'a Secret>,
}

impl Default for KeyParams<'_> {
    fn default() -> Self {
        Self { bits: RSA_DEFAULT_BITS, passphrase: None }
    }
}

pub enum GeneratedKey {
    /// `private_pem` is an `ENCRYPTED PRIVATE KEY` block when `encrypted` is set.
    RsaPair { public: RsaPublicKey, private: RsaPrivateKey, public_pem: String, private_pem: String, encrypted: bool },
    Symmetric { key: SecretBytes, base64: String },
}

impl fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsaPair { public_pem, encrypted, .. } => f.debug_struct("RsaPair").field("public_pem", public_pem).field("encrypted", encrypted).finish_non_exhaustive(),
            Self::Symmetric { key, .. } => f.debug_struct("Symmetric").field("key", key).finish_non_exhaustive(),
        }
    }
}

/// Generates a fresh key for the algorithm registered as `algorithm_id`.
///
/// # Errors
///
/// [`CipherError::UnsupportedAlgorithm`] for unknown ids and
/// [`CipherError::UnsupportedKeySize`] for RSA sizes other than 1024, 2048 or 4096.
pub fn generate(algorithm_id: &str, params: KeyParams<'_>) -> Result<GeneratedKey, CipherError> {
    let entry = registry::find_by_id(algorithm_id).ok_or_else(|| CipherError::UnsupportedAlgorithm { kind: StepType::Unset, id: algorithm_id.to_owned() })?;

    match entry.kind {
        StepType::Asymmetric => generate_pair(params),
        StepType::Symmetric => Ok(generate_symmetric()),
        StepType::Unset => Err(CipherError::UnsupportedAlgorithm { kind: entry.kind, id: algorithm_id.to_owned() }),
    }
}

fn generate_pair(params: KeyParams<'_>) -> Result<GeneratedKey, CipherError> {
    let (public, private) = RsaOaep::generate(params.bits)?;
    let public_pem = RsaOaep::public_key_to_pem(&public)?;

    let passphrase = params.passphrase.filter(|passphrase| !passphrase.expose_secret().trim().is_empty());
    let private_pem = match passphrase {
        Some(passphrase) => RsaOaep::private_key_to_encrypted_pem(&private, passphrase)?,
        None => RsaOaep::private_key_to_pem(&private)?,
    };

    Ok(GeneratedKey::RsaPair { public, private, public_pem, private_pem, encrypted: passphrase.is_some() })
}

fn generate_symmetric() -> GeneratedKey {
    let key = Aes256Gcm::generate_key(&mut OsRng);
    let base64 = to_base64(&key);
    GeneratedKey::Symmetric { key: SecretBytes::new(&key), base64 }
}
