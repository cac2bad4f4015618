use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::FileError;
use crate::file::File;
use crate::recipe::Recipe;
use crate::types::{BatchReport, FileBlob, FileOutcome, Processing};
use crate::ui::progress::Bar;
use crate::worker::pipeline::Pipeline;

pub mod pipeline;

/// Runs a recipe over a batch of files.
///
/// Files are processed strictly one after another: each one goes through the
/// whole pipeline before the next is started. A failing file is recorded in
/// the report and never stops the rest of the batch.
///
/// The pipeline itself runs on tokio's blocking pool so RSA and AES work
/// never stalls the async workers.
pub struct Worker {
    recipe: Arc<Recipe>,
    mode: Processing,
    overwrite: bool,
}

impl Worker {
    #[inline]
    pub fn new(recipe: impl Into<Arc<Recipe>>, mode: Processing) -> Self {
        Self { recipe: recipe.into(), mode, overwrite: false }
    }

    /// Lets file outputs replace existing files. An output that would replace
    /// its own input is refused either way.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Transforms in-memory files and renames them for the current mode.
    pub async fn process_blobs(&self, blobs: Vec<FileBlob>) -> BatchReport {
        let mut report = BatchReport::default();

        for FileBlob { name, data } in blobs {
            let result = self.transform(data).await.map(|data| FileBlob::new(self.mode.mode().output_name(&name), data));
            self.log_outcome(&name, result.as_ref().map(|_| ()));
            report.push(FileOutcome { name, result });
        }

        report
    }

    /// Reads, transforms and writes each file in turn.
    ///
    /// Outputs land next to their inputs unless `output_dir` is given. On
    /// success the outcome's blob carries the output path as its name and
    /// an empty buffer, since the bytes are already on disk.
    pub async fn process_files(&self, files: &[File], output_dir: Option<&Path>, progress: Option<&Bar>) -> BatchReport {
        let mut report = BatchReport::default();

        for file in files {
            if let Some(bar) = progress {
                bar.set_message(&file.name());
            }

            let name = file.path().display().to_string();
            let result = self.process_file(file, output_dir).await;
            self.log_outcome(&name, result.as_ref().map(|_| ()));
            report.push(FileOutcome { name, result });

            if let Some(bar) = progress {
                bar.add(1);
            }
        }

        report
    }

    async fn process_file(&self, file: &File, output_dir: Option<&Path>) -> Result<FileBlob, FileError> {
        let output = File::new(file.output_path(self.mode.mode(), output_dir));
        if output.is_same_file(file).await {
            return Err(FileError::OutputIsInput { path: output.path().to_path_buf() });
        }
        if !self.overwrite && output.exists().await {
            return Err(FileError::OutputExists { path: output.path().to_path_buf() });
        }

        let data = file.read().await?;
        let processed = self.transform(data).await?;
        output.write(&processed).await?;

        Ok(FileBlob::new(output.path().display().to_string(), Vec::new()))
    }

    /// Runs the pipeline over one buffer on the blocking pool.
    async fn transform(&self, data: Vec<u8>) -> Result<Vec<u8>, FileError> {
        let recipe = Arc::clone(&self.recipe);
        let mode = self.mode;

        let processed = tokio::task::spawn_blocking(move || Pipeline::new(recipe.steps(), mode).process(data)).await??;
        Ok(processed)
    }

    fn log_outcome(&self, name: &str, result: Result<(), &FileError>) {
        match result {
            Ok(()) => info!(file = name, mode = %self.mode.mode(), "file processed"),
            Err(e) => error!(file = name, mode = %self.mode.mode(), error = %e, "file failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CipherError;
    use crate::recipe::Step;

    fn recipe(passphrase: &str) -> Arc<Recipe> {
        let mut recipe = Recipe::default();
        recipe.push(Step::with_passphrase("aes256gcm", passphrase));
        Arc::new(recipe)
    }

    async fn encrypt_one(recipe: &Arc<Recipe>, name: &str, data: &[u8]) -> FileBlob {
        let mut report = Worker::new(Arc::clone(recipe), Processing::Encryption).process_blobs(vec![FileBlob::new(name, data.to_vec())]).await;
        report.outcomes.remove(0).result.unwrap()
    }

    #[tokio::test]
    async fn test_blob_batch_roundtrip_and_naming() {
        let recipe = recipe("correct-horse");
        let blobs = vec![FileBlob::new("a.txt", b"first".to_vec()), FileBlob::new("b.bin", Vec::new())];

        let encrypted = Worker::new(Arc::clone(&recipe), Processing::Encryption).process_blobs(blobs).await;
        assert_eq!(encrypted.succeeded(), 2);
        let names: Vec<_> = encrypted.outputs().map(|blob| blob.name.clone()).collect();
        assert_eq!(names, vec!["a.txt.enc", "b.bin.enc"]);

        let decrypted = Worker::new(recipe, Processing::Decryption).process_blobs(encrypted.outputs().cloned().collect()).await;
        let restored: Vec<_> = decrypted.outputs().cloned().collect();
        assert_eq!(restored, vec![FileBlob::new("a.txt", b"first".to_vec()), FileBlob::new("b.bin", Vec::new())]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let good = recipe("correct-horse");
        let ciphertext = encrypt_one(&good, "ok.txt", b"hello").await;

        let blobs = vec![FileBlob::new("short.enc", vec![0; 4]), ciphertext];
        let report = Worker::new(good, Processing::Decryption).process_blobs(blobs).await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].name, "short.enc");
        assert!(matches!(report.outcomes[0].result, Err(FileError::Cipher(CipherError::CiphertextTooShort { .. }))));
        assert_eq!(report.outcomes[1].result.as_ref().unwrap().data, b"hello");
    }

    #[tokio::test]
    async fn test_wrong_recipe_reports_authentication_failure() {
        let encrypted = encrypt_one(&recipe("correct-horse"), "m.txt", b"hello").await;
        let report = Worker::new(recipe("wrong-horse"), Processing::Decryption).process_blobs(vec![encrypted]).await;
        assert!(matches!(report.outcomes[0].result, Err(FileError::Cipher(CipherError::AuthenticationFailed))));
    }

    #[tokio::test]
    async fn test_process_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let input = dir.path().join("note.txt");
        std::fs::write(&input, b"on disk").unwrap();

        let recipe = recipe("pw");
        let files = [File::new(&input), File::new(dir.path().join("missing.txt"))];
        let report = Worker::new(Arc::clone(&recipe), Processing::Encryption).process_files(&files, Some(&out), None).await;

        assert_eq!(report.succeeded(), 1);
        assert!(matches!(report.outcomes[1].result, Err(FileError::Read { .. })));

        let encrypted = out.join("note.txt.enc");
        assert!(encrypted.exists());

        let report = Worker::new(recipe, Processing::Decryption).process_files(&[File::new(&encrypted)], None, None).await;
        assert!(!report.has_failures());
        assert_eq!(std::fs::read(out.join("note.txt")).unwrap(), b"on disk");
    }

    #[tokio::test]
    async fn test_decrypt_without_suffix_keeps_input() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = recipe("pw");
        let ciphertext = encrypt_one(&recipe, "secret.bin", b"payload").await;

        let input = dir.path().join("secret.bin");
        std::fs::write(&input, &ciphertext.data).unwrap();

        let report = Worker::new(Arc::clone(&recipe), Processing::Decryption).overwrite(true).process_files(&[File::new(&input)], None, None).await;
        assert!(matches!(report.outcomes[0].result, Err(FileError::OutputIsInput { .. })));
        assert_eq!(std::fs::read(&input).unwrap(), ciphertext.data);

        let report = Worker::new(recipe, Processing::Decryption).process_files(&[File::new(&input)], Some(dir.path()), None).await;
        assert!(matches!(report.outcomes[0].result, Err(FileError::OutputIsInput { .. })));
        assert_eq!(std::fs::read(&input).unwrap(), ciphertext.data);
    }

    #[tokio::test]
    async fn test_existing_output_is_kept_unless_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        let output = dir.path().join("a.txt.enc");
        std::fs::write(&input, b"new").unwrap();
        std::fs::write(&output, b"old").unwrap();

        let recipe = recipe("pw");
        let files = [File::new(&input)];

        let report = Worker::new(Arc::clone(&recipe), Processing::Encryption).process_files(&files, None, None).await;
        assert!(matches!(report.outcomes[0].result, Err(FileError::OutputExists { .. })));
        assert_eq!(std::fs::read(&output).unwrap(), b"old");

        let report = Worker::new(Arc::clone(&recipe), Processing::Encryption).overwrite(true).process_files(&files, None, None).await;
        assert!(!report.has_failures());

        std::fs::remove_file(&input).unwrap();
        let report = Worker::new(recipe, Processing::Decryption).process_files(&[File::new(&output)], None, None).await;
        assert!(!report.has_failures());
        assert_eq!(std::fs::read(&input).unwrap(), b"new");
    }
}
