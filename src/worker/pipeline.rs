use tracing::{debug, warn};

use crate::cipher::registry;
use crate::error::CipherError;
use crate::recipe::Step;
use crate::types::Processing;

/// Applies a recipe's steps to one buffer.
///
/// Encryption walks the steps first to last, decryption last to first, so a
/// buffer encrypted by a recipe is restored by the same recipe. Incomplete
/// steps are skipped in both directions.
pub struct Pipeline<'a> {
    steps: &'a [Step],
    mode: Processing,
}

impl<'a> Pipeline<'a> {
    #[inline]
    pub fn new(steps: &'a [Step], mode: Processing) -> Self {
        Self { steps, mode }
    }

    /// Runs every complete step over `data`.
    ///
    /// # Errors
    ///
    /// The first failing step aborts the buffer with its [`CipherError`].
    pub fn process(&self, data: Vec<u8>) -> Result<Vec<u8>, CipherError> {
        match self.mode {
            Processing::Encryption => self.steps.iter().enumerate().try_fold(data, |buffer, (index, step)| self.apply(index, step, buffer)),
            Processing::Decryption => self.steps.iter().enumerate().rev().try_fold(data, |buffer, (index, step)| self.apply(index, step, buffer)),
        }
    }

    fn apply(&self, index: usize, step: &Step, buffer: Vec<u8>) -> Result<Vec<u8>, CipherError> {
        let (Some(material), Some(algorithm)) = (step.key_material(), step.algorithm()) else {
            warn!(step = index, kind = %step.kind(), "skipping incomplete step");
            return Ok(buffer);
        };

        let entry = registry::lookup(step.kind(), algorithm)?;
        let cipher = entry.instantiate(material)?;
        debug!(step = index, algorithm = entry.label, input = buffer.len(), "{}", self.mode);

        match self.mode {
            Processing::Encryption => cipher.encrypt(&buffer),
            Processing::Decryption => cipher.decrypt(&buffer),
        }
    }
}
