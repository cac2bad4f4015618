//! stepcrypt - layered file encryption driven by recipes.
//!
//! A recipe is an ordered list of steps, each naming an algorithm and the key
//! material it runs with:
//! - AES-256-GCM keyed by a passphrase or a key file
//! - RSA-OAEP (SHA-256) keyed by a PEM key pair
//!
//! Encryption applies the steps first to last and decryption undoes them last
//! to first. Recipes are exported to and imported from JSON, optionally with
//! their secrets.

pub mod cipher;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod keygen;
pub mod recipe;
pub mod secret;
pub mod types;
pub mod ui;
pub mod worker;
