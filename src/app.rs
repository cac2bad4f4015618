use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail, ensure};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stepcrypt::cipher::{KeySource, RsaOaep, registry};
use stepcrypt::config::{APP_NAME, DEFAULT_LOG_FILTER, DEFAULT_RECIPE_NAME, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE, RSA_DEFAULT_BITS, SYMMETRIC_KEY_FILE, VERBOSE_LOG_FILTER};
use stepcrypt::file::File;
use stepcrypt::keygen::{self, GeneratedKey, KeyParams};
use stepcrypt::recipe::{ExportOptions, Recipe, Step, StepType};
use stepcrypt::secret::Secret;
use stepcrypt::types::Processing;
use stepcrypt::ui::display;
use stepcrypt::ui::progress::Bar;
use stepcrypt::worker::Worker;

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt files with a recipe, applying its steps first to last.
    Encrypt(ProcessArgs),

    /// Decrypt files with the recipe that encrypted them.
    Decrypt(ProcessArgs),

    /// Generate key material.
    #[command(subcommand)]
    Keygen(KeygenCommand),

    /// Create or inspect recipe files.
    #[command(subcommand)]
    Recipe(RecipeCommand),

    /// List the algorithms a step can use.
    Algorithms,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Recipe file to apply.
    #[arg(short, long)]
    recipe: PathBuf,

    /// Write outputs here instead of next to each input.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Replace outputs that already exist. An input is never replaced by its own output.
    #[arg(short, long)]
    force: bool,

    /// Files or directories to process.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum KeygenCommand {
    /// RSA key pair as PEM files.
    Rsa {
        #[arg(short, long, default_value_t = RSA_DEFAULT_BITS)]
        bits: usize,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Write the private key as a passphrase-protected `ENCRYPTED PRIVATE KEY` block.
        #[arg(short, long)]
        passphrase: Option<String>,
    },

    /// Random 256-bit AES key file.
    Aes {
        #[arg(short, long, default_value = SYMMETRIC_KEY_FILE)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum RecipeCommand {
    /// Build a recipe from step descriptions and export it.
    New {
        /// Defaults to `<name>_export.json`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = DEFAULT_RECIPE_NAME)]
        name: String,

        #[arg(long = "version")]
        recipe_version: Option<String>,

        /// `ALG:passphrase=TEXT`, `ALG:keyfile=PATH` or `rsa:public=PATH,private=PATH[,passphrase=TEXT]`.
        #[arg(short, long = "step", required = true)]
        steps: Vec<StepArg>,

        #[arg(long)]
        include_passphrases: bool,

        #[arg(long)]
        include_keyfiles: bool,
    },

    /// Print a recipe's steps.
    Show { file: PathBuf },
}

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Build a recipe of encryption steps and apply it to files, layer by layer.")]
pub struct App {
    /// Log at debug level, ignoring RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let filter = if app.verbose { EnvFilter::new(VERBOSE_LOG_FILTER) } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)) };
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Encrypt(args) => Self::run_mode(args, Processing::Encryption).await,
            Commands::Decrypt(args) => Self::run_mode(args, Processing::Decryption).await,
            Commands::Keygen(command) => Self::run_keygen(command).await,
            Commands::Recipe(RecipeCommand::New { output, name, recipe_version, steps, include_passphrases, include_keyfiles }) => {
                let options = ExportOptions { include_passphrases, include_keyfiles };
                Self::run_recipe_new(output, name, recipe_version, steps, options).await
            }
            Commands::Recipe(RecipeCommand::Show { file }) => {
                let recipe = Self::load_recipe(&file).await?;
                display::show_recipe(&recipe);
                Ok(())
            }
            Commands::Algorithms => {
                display::show_algorithms();
                Ok(())
            }
        }
    }

    async fn run_mode(args: ProcessArgs, processing: Processing) -> Result<()> {
        let recipe = Self::load_recipe(&args.recipe).await?;
        if recipe.complete_steps() == 0 {
            display::show_warning("recipe has no complete steps; files will be copied unchanged");
        }

        let mode = processing.mode();
        let files = File::discover(&args.inputs, mode)?;
        ensure!(!files.is_empty(), "no eligible files found");
        debug!(files = files.len(), steps = recipe.complete_steps(), "starting batch");

        let progress = Bar::new(files.len() as u64, processing.label())?;
        let report = Worker::new(recipe, processing).overwrite(args.force).process_files(&files, args.output_dir.as_deref(), Some(&progress)).await;
        progress.finish();

        display::show_report(mode, &report);

        if report.has_failures() {
            bail!("{} of {} files failed", report.failed(), report.outcomes.len());
        }

        Ok(())
    }

    async fn run_keygen(command: KeygenCommand) -> Result<()> {
        match command {
            KeygenCommand::Rsa { bits, out_dir, passphrase } => {
                let passphrase = passphrase.map(Secret::from_string);
                let GeneratedKey::RsaPair { public, public_pem, private_pem, encrypted, .. } = keygen::generate("rsa", KeyParams { bits, passphrase: passphrase.as_ref() })? else {
                    bail!("rsa key generation returned a symmetric key");
                };
                if passphrase.is_some() && !encrypted {
                    display::show_warning("passphrase is blank; private key written unprotected");
                }

                tokio::fs::create_dir_all(&out_dir).await.with_context(|| format!("failed to create directory: {}", out_dir.display()))?;
                Self::write_output("Public key", &out_dir.join(PUBLIC_KEY_FILE), public_pem.as_bytes()).await?;
                let what = if encrypted { "Encrypted private key" } else { "Private key" };
                Self::write_output(what, &out_dir.join(PRIVATE_KEY_FILE), private_pem.as_bytes()).await?;
                display::show_fingerprint(&RsaOaep::fingerprint(&public)?);
                Ok(())
            }
            KeygenCommand::Aes { out } => {
                let GeneratedKey::Symmetric { key, .. } = keygen::generate("aes256gcm", KeyParams::default())? else {
                    bail!("aes key generation returned a key pair");
                };

                Self::write_output("Key file", &out, key.expose_secret()).await
            }
        }
    }

    async fn run_recipe_new(output: Option<PathBuf>, name: String, version: Option<String>, steps: Vec<StepArg>, options: ExportOptions) -> Result<()> {
        let mut recipe = Recipe::new(name);
        if let Some(version) = version {
            recipe.set_version(version);
        }

        for step in steps {
            recipe.push(step.build().await?);
        }

        if !options.include_passphrases && !options.include_keyfiles {
            display::show_warning("no secrets exported; keys must be supplied again before this recipe can run");
        }

        let json = recipe.to_json(options).context("failed to export recipe")?;
        let output = output.unwrap_or_else(|| PathBuf::from(recipe.export_file_name()));
        Self::write_output("Recipe", &output, json.as_bytes()).await
    }

    async fn load_recipe(path: &Path) -> Result<Recipe> {
        let json = tokio::fs::read_to_string(path).await.with_context(|| format!("failed to read recipe: {}", path.display()))?;
        Recipe::from_json(&json).with_context(|| format!("failed to load recipe: {}", path.display()))
    }

    async fn write_output(what: &str, path: &Path, data: &[u8]) -> Result<()> {
        File::new(path).write(data).await?;
        display::show_written(what, path, data.len() as u64);
        Ok(())
    }
}

/// One `--step` argument of `recipe new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    Passphrase { algorithm: String, passphrase: String },
    KeyFile { algorithm: String, path: PathBuf },
    KeyPair { algorithm: String, public: Option<PathBuf>, private: Option<PathBuf>, passphrase: Option<String> },
}

impl FromStr for StepArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, key) = s.split_once(':').ok_or_else(|| format!("expected ALG:KEY, got '{s}'"))?;
        let entry = registry::find_by_id(algorithm).ok_or_else(|| format!("unknown algorithm '{algorithm}'"))?;
        let algorithm = algorithm.to_owned();

        match entry.kind {
            StepType::Asymmetric => {
                let (mut public, mut private, mut passphrase) = (None, None, None);
                for part in key.split(',').filter(|part| !part.is_empty()) {
                    match part.split_once('=') {
                        Some(("public", path)) => public = Some(PathBuf::from(path)),
                        Some(("private", path)) => private = Some(PathBuf::from(path)),
                        Some(("passphrase", text)) => passphrase = Some(text.to_owned()),
                        _ => return Err(format!("expected public=PATH, private=PATH or passphrase=TEXT, got '{part}'")),
                    }
                }

                if public.is_none() && private.is_none() {
                    return Err(format!("{algorithm} needs public=PATH and/or private=PATH"));
                }
                if passphrase.is_some() && private.is_none() {
                    return Err(format!("{algorithm} passphrase only unlocks a private=PATH key"));
                }

                Ok(Self::KeyPair { algorithm, public, private, passphrase })
            }
            StepType::Symmetric | StepType::Unset => {
                let (source, value) = key.split_once('=').ok_or_else(|| format!("expected passphrase=TEXT or keyfile=PATH, got '{key}'"))?;
                let source = KeySource::from_str(source).map_err(|_| format!("unknown key type '{source}'"))?;
                if !entry.accepts(source) {
                    return Err(format!("{algorithm} does not accept a {source}"));
                }

                match source {
                    KeySource::Passphrase => Ok(Self::Passphrase { algorithm, passphrase: value.to_owned() }),
                    KeySource::Keyfile => Ok(Self::KeyFile { algorithm, path: PathBuf::from(value) }),
                }
            }
        }
    }
}

impl StepArg {
    /// Loads any key files and builds the step.
    async fn build(self) -> Result<Step> {
        match self {
            Self::Passphrase { algorithm, passphrase } => Ok(Step::with_passphrase(&algorithm, &passphrase)),
            Self::KeyFile { algorithm, path } => {
                let content = tokio::fs::read(&path).await.with_context(|| format!("failed to read key file: {}", path.display()))?;
                let name = path.file_name().map(|name| name.to_string_lossy().into_owned());

                Ok(Step::with_key_file(&algorithm, name, content))
            }
            Self::KeyPair { algorithm, public, private, passphrase } => {
                let public = match public {
                    Some(path) => Some(RsaOaep::public_key_from_pem(&Self::read_pem(&path).await?).with_context(|| format!("invalid public key: {}", path.display()))?),
                    None => None,
                };
                let private = match private {
                    Some(path) => {
                        let pem = Self::read_pem(&path).await?;
                        let key = match passphrase {
                            Some(passphrase) => RsaOaep::private_key_from_encrypted_pem(&pem, &Secret::from_string(passphrase)),
                            None => RsaOaep::private_key_from_pem(&pem),
                        };
                        Some(key.with_context(|| format!("invalid private key: {}", path.display()))?)
                    }
                    None => None,
                };

                Ok(Step::with_key_pair(&algorithm, public, private))
            }
        }
    }

    async fn read_pem(path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.with_context(|| format!("failed to read key: {}", path.display()))
    }
}
