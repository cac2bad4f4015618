use std::sync::{Arc, LazyLock};

use stepcrypt::cipher::RsaOaep;
use stepcrypt::error::{CipherError, FileError};
use stepcrypt::file::File;
use stepcrypt::keygen::{self, GeneratedKey, KeyParams};
use stepcrypt::recipe::{ExportOptions, Recipe, Step};
use stepcrypt::secret::Secret;
use stepcrypt::types::{FileBlob, Processing, ProcessorMode};
use stepcrypt::worker::Worker;

struct Pair {
    public_pem: String,
    private_pem: String,
}

static PAIR: LazyLock<Pair> = LazyLock::new(|| match keygen::generate("rsa", KeyParams { bits: 1024, passphrase: None }).unwrap() {
    GeneratedKey::RsaPair { public_pem, private_pem, .. } => Pair { public_pem, private_pem },
    GeneratedKey::Symmetric { .. } => unreachable!(),
});

fn layered_recipe() -> Recipe {
    let public = RsaOaep::public_key_from_pem(&PAIR.public_pem).unwrap();
    let private = RsaOaep::private_key_from_pem(&PAIR.private_pem).unwrap();

    let mut recipe = Recipe::new("Layered");
    recipe.push(Step::with_passphrase("aes256gcm", "correct-horse"));
    recipe.push(Step::with_key_pair("rsa", Some(public), Some(private)));
    recipe.push(Step::with_key_file("aes256gcm", Some("session.key".into()), b"0123456789abcdef0123456789abcdef".to_vec()));
    recipe
}

#[test]
fn correct_horse_scenario() {
    let mut recipe = Recipe::default();
    recipe.push(Step::with_passphrase("aes256gcm", "correct-horse"));

    let ciphertext = recipe.encrypt(b"hello".to_vec()).unwrap();
    assert_eq!(ciphertext.len(), 5 + 12 + 16);
    assert_eq!(recipe.decrypt(ciphertext.clone()).unwrap(), b"hello");

    let mut wrong = Recipe::default();
    wrong.push(Step::with_passphrase("aes256gcm", "wrong-horse"));
    assert!(matches!(wrong.decrypt(ciphertext), Err(CipherError::AuthenticationFailed)));
}

#[test]
fn layered_recipe_survives_export_and_import() {
    let recipe = layered_recipe();
    let ciphertext = recipe.encrypt(b"hello".to_vec()).unwrap();

    let json = recipe.to_json(ExportOptions { include_passphrases: true, include_keyfiles: true }).unwrap();
    let imported = Recipe::from_json(&json).unwrap();
    assert_eq!(imported.complete_steps(), 3);
    assert_eq!(imported.decrypt(ciphertext).unwrap(), b"hello");
}

#[test]
fn public_only_recipe_encrypts_for_private_holder() {
    let sender = Recipe::from_json(&format!(r#"{{ "recipeName": "Sender", "steps": [{{ "type": "asymmetric", "algorithm": "rsa", "keyType": "keyfile", "publicKey": {:?} }}] }}"#, PAIR.public_pem)).unwrap();
    let receiver = Recipe::from_json(&format!(r#"{{ "steps": [{{ "type": "asymmetric", "algorithm": "rsa", "keyType": "keyfile", "privateKey": {:?} }}] }}"#, PAIR.private_pem)).unwrap();

    let ciphertext = sender.encrypt(b"for your eyes".to_vec()).unwrap();
    assert!(matches!(sender.decrypt(ciphertext.clone()), Err(CipherError::KeyNotSet(_))));
    assert_eq!(receiver.decrypt(ciphertext).unwrap(), b"for your eyes");
}

#[test]
fn stripped_export_skips_every_step() {
    let recipe = layered_recipe();
    let imported = Recipe::from_json(&recipe.to_json(ExportOptions::default()).unwrap()).unwrap();
    assert_eq!(imported.complete_steps(), 0);
    assert_eq!(imported.encrypt(b"as is".to_vec()).unwrap(), b"as is");
}

#[tokio::test]
async fn batch_on_disk_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    std::fs::create_dir_all(inputs.join("nested")).unwrap();
    std::fs::write(inputs.join("a.txt"), b"alpha").unwrap();
    std::fs::write(inputs.join("nested/b.txt"), b"beta").unwrap();

    let recipe = Arc::new(layered_recipe());

    let plain = File::discover(&[inputs.clone()], ProcessorMode::Encrypt).unwrap();
    assert_eq!(plain.len(), 2);
    let report = Worker::new(Arc::clone(&recipe), Processing::Encryption).process_files(&plain, None, None).await;
    assert_eq!(report.succeeded(), 2);

    std::fs::remove_file(inputs.join("a.txt")).unwrap();
    std::fs::remove_file(inputs.join("nested/b.txt")).unwrap();

    let encrypted = File::discover(&[inputs.clone()], ProcessorMode::Decrypt).unwrap();
    assert_eq!(encrypted.len(), 2);
    let report = Worker::new(recipe, Processing::Decryption).process_files(&encrypted, None, None).await;
    assert!(!report.has_failures());

    assert_eq!(std::fs::read(inputs.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(inputs.join("nested/b.txt")).unwrap(), b"beta");
}

#[tokio::test]
async fn batch_reports_each_failure() {
    let recipe = layered_recipe();
    let blobs = vec![FileBlob::new("too-long.bin", vec![0; 200]), FileBlob::new("ok.txt", b"fine".to_vec())];

    let report = Worker::new(recipe, Processing::Encryption).process_blobs(blobs).await;
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[0].result, Err(FileError::Cipher(CipherError::MessageTooLong { max: 62, .. }))));
    assert_eq!(report.outputs().next().map(|blob| blob.name.as_str()), Some("ok.txt.enc"));
}

#[tokio::test]
async fn decrypting_unsuffixed_file_leaves_it_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = Arc::new(layered_recipe());

    let plain = dir.path().join("report.pdf");
    std::fs::write(&plain, b"quarterly").unwrap();
    let report = Worker::new(Arc::clone(&recipe), Processing::Encryption).process_files(&[File::new(&plain)], None, None).await;
    assert!(!report.has_failures());

    let renamed = dir.path().join("report.bin");
    std::fs::rename(dir.path().join("report.pdf.enc"), &renamed).unwrap();
    let ciphertext = std::fs::read(&renamed).unwrap();

    let report = Worker::new(Arc::clone(&recipe), Processing::Decryption).overwrite(true).process_files(&[File::new(&renamed)], None, None).await;
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.outcomes[0].result, Err(FileError::OutputIsInput { .. })));
    assert_eq!(std::fs::read(&renamed).unwrap(), ciphertext);

    let out = dir.path().join("out");
    let report = Worker::new(recipe, Processing::Decryption).process_files(&[File::new(&renamed)], Some(&out), None).await;
    assert!(!report.has_failures());
    assert_eq!(std::fs::read(out.join("report.bin")).unwrap(), b"quarterly");
    assert_eq!(std::fs::read(&renamed).unwrap(), ciphertext);
}

#[test]
fn passphrase_protected_key_decrypts_layered_output() {
    let passphrase = Secret::new("hunter2");
    let GeneratedKey::RsaPair { public, private_pem, encrypted: true, .. } = keygen::generate("rsa", KeyParams { bits: 1024, passphrase: Some(&passphrase) }).unwrap() else {
        panic!("expected an encrypted key pair");
    };

    let mut sender = Recipe::new("Sender");
    sender.push(Step::with_passphrase("aes256gcm", "shared"));
    sender.push(Step::with_key_pair("rsa", Some(public), None));
    let ciphertext = sender.encrypt(b"layered".to_vec()).unwrap();

    let mut receiver = Recipe::new("Receiver");
    receiver.push(Step::with_passphrase("aes256gcm", "shared"));
    receiver.push(Step::with_key_pair("rsa", None, Some(RsaOaep::private_key_from_encrypted_pem(&private_pem, &passphrase).unwrap())));
    assert_eq!(receiver.decrypt(ciphertext).unwrap(), b"layered");
}
