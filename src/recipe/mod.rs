//! Recipes: ordered chains of encryption steps.
//!
//! Order matters. Encryption applies the steps first to last, decryption
//! peels them off last to first. A step that is not [complete](Step::is_complete)
//! is skipped in both directions.

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cipher::{KeyMaterial, KeySource, registry};
use crate::config::{DEFAULT_RECIPE_NAME, RECIPE_VERSION};
use crate::error::CipherError;
use crate::secret::{Secret, SecretBytes};
use crate::types::Processing;
use crate::worker::pipeline::Pipeline;

pub mod document;

pub use document::ExportOptions;

/// Family of a step, which decides how key material is bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum StepType {
    #[serde(rename = "symmetric")]
    #[strum(to_string = "symmetric")]
    Symmetric,

    #[serde(rename = "asymmetric")]
    #[strum(to_string = "asymmetric")]
    Asymmetric,

    /// Freshly added step whose type has not been chosen yet.
    #[default]
    #[serde(rename = "")]
    #[strum(to_string = "unset")]
    Unset,
}

/// Symmetric key material loaded from a file.
#[derive(Debug)]
pub struct KeyFile {
    name: Option<String>,
    content: SecretBytes,
}

impl KeyFile {
    pub fn new(name: Option<String>, content: Vec<u8>) -> Self {
        Self { name, content: SecretBytes::from_vec(content) }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn content(&self) -> &[u8] {
        self.content.expose_secret()
    }
}

/// One link of a recipe.
#[derive(Debug)]
pub struct Step {
    id: Uuid,
    kind: StepType,
    algorithm: Option<String>,
    key_type: Option<KeySource>,
    passphrase: Option<Secret>,
    key_file: Option<KeyFile>,
    public_key: Option<RsaPublicKey>,
    private_key: Option<RsaPrivateKey>,
}

impl Step {
    /// An empty step with nothing chosen yet.
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), kind: StepType::Unset, algorithm: None, key_type: None, passphrase: None, key_file: None, public_key: None, private_key: None }
    }

    /// A symmetric step keyed by a passphrase.
    pub fn with_passphrase(algorithm: &str, passphrase: &str) -> Self {
        let mut step = Self::new();
        step.set_kind(StepType::Symmetric);
        step.set_algorithm(algorithm);
        step.set_key_type(KeySource::Passphrase);
        step.set_passphrase(passphrase);
        step
    }

    /// A symmetric step keyed by the bytes of a key file.
    pub fn with_key_file(algorithm: &str, name: Option<String>, content: Vec<u8>) -> Self {
        let mut step = Self::new();
        step.set_kind(StepType::Symmetric);
        step.set_algorithm(algorithm);
        step.set_key_type(KeySource::Keyfile);
        step.set_key_file(KeyFile::new(name, content));
        step
    }

    /// An asymmetric step carrying whichever halves of a key pair are known.
    pub fn with_key_pair(algorithm: &str, public_key: Option<RsaPublicKey>, private_key: Option<RsaPrivateKey>) -> Self {
        let mut step = Self::new();
        step.set_kind(StepType::Asymmetric);
        step.set_algorithm(algorithm);
        step.set_key_type(KeySource::Keyfile);
        step.public_key = public_key;
        step.private_key = private_key;
        step
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> StepType {
        self.kind
    }

    #[inline]
    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    #[inline]
    pub fn key_type(&self) -> Option<KeySource> {
        self.key_type
    }

    #[inline]
    pub fn passphrase(&self) -> Option<&Secret> {
        self.passphrase.as_ref()
    }

    #[inline]
    pub fn key_file(&self) -> Option<&KeyFile> {
        self.key_file.as_ref()
    }

    #[inline]
    pub fn public_key(&self) -> Option<&RsaPublicKey> {
        self.public_key.as_ref()
    }

    #[inline]
    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    /// Changes the step type. Everything chosen for the old type is dropped.
    pub fn set_kind(&mut self, kind: StepType) {
        self.kind = kind;
        self.algorithm = None;
        self.key_type = None;
        self.passphrase = None;
        self.key_file = None;
        self.public_key = None;
        self.private_key = None;
    }

    pub fn set_algorithm(&mut self, algorithm: &str) {
        self.algorithm = Some(algorithm.to_owned());
    }

    /// Changes the key source, dropping the passphrase and symmetric key file.
    pub fn set_key_type(&mut self, key_type: KeySource) {
        self.key_type = Some(key_type);
        self.passphrase = None;
        self.key_file = None;
    }

    pub fn set_passphrase(&mut self, passphrase: &str) {
        self.passphrase = Some(Secret::new(passphrase));
    }

    pub fn set_key_file(&mut self, key_file: KeyFile) {
        self.key_file = Some(key_file);
    }

    pub fn set_public_key(&mut self, key: RsaPublicKey) {
        self.public_key = Some(key);
    }

    pub fn set_private_key(&mut self, key: RsaPrivateKey) {
        self.private_key = Some(key);
    }

    /// Whether the pipeline will run this step.
    ///
    /// A step is complete once its type, algorithm and key type are chosen,
    /// the key type is one the algorithm accepts, and the key material for
    /// that key type is present. An asymmetric step needs at least one half
    /// of its key pair.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.key_material().is_some()
    }

    /// Key material to bind when this step runs, or `None` if the step is incomplete.
    pub fn key_material(&self) -> Option<KeyMaterial<'_>> {
        let algorithm = self.algorithm.as_deref().filter(|id| !id.is_empty())?;
        let key_type = self.key_type?;

        // Unknown algorithms stay complete so the pipeline can report them.
        if registry::lookup(self.kind, algorithm).is_ok_and(|entry| !entry.accepts(key_type)) {
            return None;
        }

        match (self.kind, key_type) {
            (StepType::Symmetric, KeySource::Passphrase) => self.passphrase.as_ref().filter(|p| !p.is_empty()).map(|p| KeyMaterial::SharedSecret(p.expose_secret().as_bytes())),
            (StepType::Symmetric, KeySource::Keyfile) => self.key_file.as_ref().filter(|f| !f.content().is_empty()).map(|f| KeyMaterial::SharedSecret(f.content())),
            (StepType::Asymmetric, KeySource::Keyfile) if self.public_key.is_some() || self.private_key.is_some() => Some(KeyMaterial::KeyPair { public: self.public_key.as_ref(), private: self.private_key.as_ref() }),
            _ => None,
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, ordered list of steps.
#[derive(Debug)]
pub struct Recipe {
    name: String,
    version: String,
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: RECIPE_VERSION.to_owned(), steps: Vec::new() }
    }

    pub fn with_steps(name: impl Into<String>, version: impl Into<String>, steps: Vec<Step>) -> Self {
        Self { name: name.into(), version: version.into(), steps }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends `step` and returns its id.
    pub fn push(&mut self, step: Step) -> Uuid {
        let id = step.id();
        self.steps.push(step);
        id
    }

    /// Appends an empty step and returns its id.
    pub fn add_step(&mut self) -> Uuid {
        self.push(Step::new())
    }

    pub fn remove(&mut self, index: usize) -> Option<Step> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    pub fn remove_by_id(&mut self, id: Uuid) -> Option<Step> {
        let index = self.position(id)?;
        self.remove(index)
    }

    /// Moves the step at `from` so it ends up at `to`, shifting the ones in between.
    ///
    /// Returns `false` without touching the list when either index is out of range.
    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        if from >= self.steps.len() || to >= self.steps.len() {
            return false;
        }

        if from != to {
            let step = self.steps.remove(from);
            self.steps.insert(to, step);
        }

        true
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.steps.iter().position(|step| step.id() == id)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    /// Number of steps the pipeline will actually run.
    pub fn complete_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.is_complete()).count()
    }

    /// Runs `data` through every complete step, first to last.
    pub fn encrypt(&self, data: Vec<u8>) -> Result<Vec<u8>, CipherError> {
        Pipeline::new(&self.steps, Processing::Encryption).process(data)
    }

    /// Peels every complete step off `data`, last to first.
    pub fn decrypt(&self, data: Vec<u8>) -> Result<Vec<u8>, CipherError> {
        Pipeline::new(&self.steps, Processing::Decryption).process(data)
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new(DEFAULT_RECIPE_NAME)
    }
}
