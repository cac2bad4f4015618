//! Global Configuration Constants
//!
//! Every tunable of the recipe engine lives here: file naming, the AES-256-GCM
//! framing sizes, RSA key generation parameters, PEM layout and the defaults
//! used when a recipe document leaves a field out.

/// Application name used in user interfaces.
pub const APP_NAME: &str = "stepcrypt";

/// Suffix appended to a file name on encryption and stripped on decryption.
pub const FILE_EXTENSION: &str = ".enc";

// === AES-256-GCM ===

/// Size of an AES-256 key in bytes.
///
/// Key material shorter than this is zero-filled, longer material is truncated.
pub const AES_KEY_SIZE: usize = 32;

/// Size of the random AES-GCM nonce prepended to every ciphertext.
pub const AES_NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended by the AEAD.
pub const AES_TAG_SIZE: usize = 16;

/// Smallest buffer `AesGcm::decrypt` will look at: an empty message still
/// carries a nonce and a tag.
pub const AES_MIN_CIPHERTEXT_SIZE: usize = AES_NONCE_SIZE + AES_TAG_SIZE;

// === RSA-OAEP ===

/// Public exponent used for every generated RSA key pair (F4).
pub const RSA_PUBLIC_EXPONENT: u64 = 65_537;

/// Modulus length used when the caller does not ask for one.
pub const RSA_DEFAULT_BITS: usize = 2048;

/// Modulus lengths offered by key generation.
pub const RSA_KEY_SIZES: &[usize] = &[1024, 2048, 4096];

/// Output size of SHA-256, the OAEP hash.
pub const OAEP_HASH_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA256 rounds for a passphrase-protected private key.
pub const KEY_WRAP_ITERATIONS: u32 = 100_000;

/// Size of the random PBKDF2 salt stored in front of an encrypted private key.
pub const KEY_WRAP_SALT_SIZE: usize = 16;

// === PEM ===

/// Width of a base64 body line inside a PEM block.
pub const PEM_LINE_WIDTH: usize = 64;

// === Recipe documents ===

/// Name given to a recipe created from scratch.
pub const DEFAULT_RECIPE_NAME: &str = "My Recipe";

/// Name given to an imported recipe whose document has no `recipeName`.
pub const IMPORTED_RECIPE_NAME: &str = "Imported Recipe";

/// Version recorded by newly created recipes.
pub const RECIPE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version given to an imported recipe whose document has no `version`.
pub const FALLBACK_RECIPE_VERSION: &str = "1.0.0";

// === Logging ===

/// Filter applied when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter applied with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "stepcrypt=debug";

// === Key generation output ===

/// File name used by `keygen rsa` for the public half.
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// File name used by `keygen rsa` for the private half.
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// File name used by `keygen aes` when no output is given.
pub const SYMMETRIC_KEY_FILE: &str = "aes256gcm.key";
