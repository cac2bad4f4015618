//! Recipe export and import as JSON.
//!
//! ```json
//! { "recipeName": "My Recipe", "version": "1.0.0",
//!   "steps": [{ "type": "symmetric", "algorithm": "aes256gcm", "keyType": "passphrase" }] }
//! ```
//!
//! Secrets are written only on request: [`ExportOptions::include_passphrases`]
//! adds passphrases, [`ExportOptions::include_keyfiles`] adds key pairs as PEM
//! and symmetric key files as base64.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{KeyFile, Recipe, Step, StepType};
use crate::cipher::{KeySource, RsaOaep};
use crate::codec::{from_base64, to_base64};
use crate::config::{FALLBACK_RECIPE_VERSION, IMPORTED_RECIPE_NAME};
use crate::error::RecipeError;

/// Which secrets to write into an exported recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_passphrases: bool,
    pub include_keyfiles: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeDocument {
    #[serde(default)]
    recipe_name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    steps: Vec<StepDocument>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepDocument {
    #[serde(rename = "type", default)]
    kind: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_type: Option<KeySource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    passphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
}

impl StepDocument {
    fn export(step: &Step, options: ExportOptions) -> Result<Self, RecipeError> {
        let mut doc = Self { kind: step.kind(), algorithm: step.algorithm().map(str::to_owned), key_type: step.key_type(), ..Self::default() };

        if options.include_passphrases && step.key_type() == Some(KeySource::Passphrase) {
            doc.passphrase = step.passphrase().map(|p| p.expose_secret().to_owned());
        }

        if options.include_keyfiles && step.key_type() == Some(KeySource::Keyfile) {
            match step.kind() {
                StepType::Symmetric => {
                    if let Some(file) = step.key_file() {
                        doc.key_file_name = file.name().map(str::to_owned);
                        doc.key_file = Some(to_base64(file.content()));
                    }
                }
                StepType::Asymmetric => {
                    doc.public_key = step.public_key().map(RsaOaep::public_key_to_pem).transpose()?;
                    doc.private_key = step.private_key().map(RsaOaep::private_key_to_pem).transpose()?;
                }
                StepType::Unset => {}
            }
        }

        Ok(doc)
    }

    fn import(self, index: usize) -> Result<Step, RecipeError> {
        let mut step = Step::new();
        step.set_kind(self.kind);
        if let Some(algorithm) = self.algorithm {
            step.set_algorithm(&algorithm);
        }

        let Some(key_type) = self.key_type else {
            return Ok(step);
        };
        step.set_key_type(key_type);

        match (self.kind, key_type) {
            (_, KeySource::Passphrase) => {
                if let Some(passphrase) = self.passphrase {
                    step.set_passphrase(&passphrase);
                }
            }
            (StepType::Symmetric, KeySource::Keyfile) => {
                if let Some(encoded) = self.key_file {
                    let content = from_base64(&encoded).map_err(|source| RecipeError::KeyFile { step: index, source })?;
                    step.set_key_file(KeyFile::new(self.key_file_name, content));
                }
            }
            (StepType::Asymmetric, KeySource::Keyfile) => {
                if let Some(pem) = self.public_key {
                    step.set_public_key(RsaOaep::public_key_from_pem(&pem)?);
                }
                if let Some(pem) = self.private_key {
                    step.set_private_key(RsaOaep::private_key_from_pem(&pem)?);
                }
            }
            (StepType::Unset, KeySource::Keyfile) => {}
        }

        Ok(step)
    }
}

impl Recipe {
    /// Serializes the recipe as pretty-printed JSON.
    pub fn to_json(&self, options: ExportOptions) -> Result<String, RecipeError> {
        let steps = self.steps.iter().map(|step| StepDocument::export(step, options)).collect::<Result<Vec<_>, _>>()?;
        let document = RecipeDocument { recipe_name: Some(self.name.clone()), version: Some(self.version.clone()), steps };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Rebuilds a recipe from JSON. Step ids are regenerated.
    pub fn from_json(json: &str) -> Result<Self, RecipeError> {
        let document: RecipeDocument = serde_json::from_str(json)?;
        let steps = document.steps.into_iter().enumerate().map(|(index, step)| step.import(index)).collect::<Result<Vec<_>, _>>()?;

        let name = document.recipe_name.filter(|name| !name.is_empty()).unwrap_or_else(|| IMPORTED_RECIPE_NAME.to_owned());
        let version = document.version.filter(|version| !version.is_empty()).unwrap_or_else(|| FALLBACK_RECIPE_VERSION.to_owned());
        debug!(name = %name, steps = steps.len(), "imported recipe");

        Ok(Self::with_steps(name, version, steps))
    }

    /// File name suggested for an export: whitespace runs become `_`.
    pub fn export_file_name(&self) -> String {
        let stem = self.name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{stem}_export.json")
    }
}
