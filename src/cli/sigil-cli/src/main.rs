//! Sigil CLI - encrypt and decrypt files with a key or a password.

mod errors;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sigil_crypto::SymmetricKey;
use sigil_envelope::{
    compare_files, decrypt_file, default_output_path, encrypt_file, fs, Comparison, Credential,
    Envelope, Mode,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zeroize::Zeroizing;

use crate::errors::{exit_code, exit_codes};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "sigil")]
#[command(about = "Sigil - encrypt files into portable, tamper-evident text envelopes")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. warn, info, sigil_envelope=debug)
    #[arg(long, global = true, default_value = "warn", env = "SIGIL_LOG")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random key and print it (or save it to a file)
    GenerateKey {
        /// Write the key to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Encrypt a file into an envelope
    Encrypt(CryptArgs),
    /// Decrypt an envelope back to the original bytes
    Decrypt(CryptArgs),
    /// Check whether two files have identical content
    Compare {
        /// First file
        file_a: PathBuf,
        /// Second file
        file_b: PathBuf,
    },
    /// Show envelope metadata without decrypting
    Inspect {
        /// Envelope file
        #[arg(long = "in", value_name = "PATH")]
        input: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct CryptArgs {
    /// Input file
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Output file (default: <in>.enc when encrypting, <in>.dec when decrypting)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    #[command(flatten)]
    credential: CredentialArgs,
}

/// At most one credential source; with none, the password is prompted for.
#[derive(Args)]
#[group(multiple = false)]
struct CredentialArgs {
    /// Key text, a file containing the key, or a passphrase
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    key: Option<String>,

    /// File containing the key
    #[arg(long, value_name = "PATH")]
    key_file: Option<PathBuf>,

    /// Password, or a file containing it (always derived with PBKDF2, never read as a key)
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    password: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

// ============================================================================
// Credentials
// ============================================================================

impl CredentialArgs {
    fn into_credential(self, mode: Mode) -> Result<Credential> {
        let credential = match (self.key, self.key_file, self.password) {
            (Some(key), _, _) => Credential::classify(&Zeroizing::new(key))?,
            (_, Some(path), _) => Credential::from_key_file(&path)?,
            (_, _, Some(password)) => Credential::password(&Zeroizing::new(password))?,
            (None, None, None) => Credential::passphrase(&prompt_password(mode)?)?,
        };

        tracing::debug!(credential = credential.kind_name(), "credential resolved");
        Ok(credential)
    }
}

fn prompt_password(mode: Mode) -> Result<Zeroizing<String>> {
    let password = Zeroizing::new(
        rpassword::prompt_password("Password: ")
            .context("No --key, --key-file or --password given and no terminal to prompt on")?,
    );

    if mode == Mode::Encrypt {
        let confirm = Zeroizing::new(
            rpassword::prompt_password("Confirm password: ")
                .context("Failed to read password confirmation")?,
        );
        if *password != *confirm {
            bail!("Passwords do not match");
        }
    }

    Ok(password)
}

// ============================================================================
// Command Handlers
// ============================================================================

fn cmd_generate_key(out: Option<&Path>) -> Result<()> {
    let key = SymmetricKey::generate();
    let encoded = key.to_encoded();

    match out {
        Some(path) => {
            let line = Zeroizing::new(format!("{}\n", encoded.as_str()));
            fs::write_secret_atomic(path, line.as_bytes())
                .with_context(|| format!("Failed to write key to {}", path.display()))?;
            tracing::info!(path = %path.display(), "key written");
            eprintln!("Key written to {}", path.display());
        },
        None => println!("{}", encoded.as_str()),
    }

    Ok(())
}

fn cmd_encrypt(args: CryptArgs) -> Result<()> {
    let output = args
        .out
        .unwrap_or_else(|| default_output_path(&args.input, Mode::Encrypt));
    let credential = args.credential.into_credential(Mode::Encrypt)?;

    encrypt_file(&args.input, &output, &credential)
        .with_context(|| format!("Failed to encrypt {}", args.input.display()))?;

    println!("Encrypted {} -> {}", args.input.display(), output.display());
    Ok(())
}

fn cmd_decrypt(args: CryptArgs) -> Result<()> {
    let output = args
        .out
        .unwrap_or_else(|| default_output_path(&args.input, Mode::Decrypt));
    let credential = args.credential.into_credential(Mode::Decrypt)?;

    decrypt_file(&args.input, &output, &credential)
        .with_context(|| format!("Failed to decrypt {}", args.input.display()))?;

    println!("Decrypted {} -> {}", args.input.display(), output.display());
    Ok(())
}

fn cmd_compare(file_a: &Path, file_b: &Path) -> Result<u8> {
    let result = compare_files(file_a, file_b)?;

    println!("{}", result);

    Ok(match result {
        Comparison::Same => exit_codes::SUCCESS,
        Comparison::Diff => exit_codes::DIFF,
    })
}

fn cmd_inspect(input: &Path, format: OutputFormat) -> Result<()> {
    let data = fs::read_file(input)?;
    let envelope = Envelope::from_bytes(&data)
        .with_context(|| format!("Failed to read envelope {}", input.display()))?;
    let summary = envelope.summary();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        },
        OutputFormat::Text => {
            println!("Envelope {}:", input.display());
            println!("  Format:     {}", summary.format);
            println!("  KDF:        {}", summary.kdf);
            if let Some(salt) = &summary.salt {
                println!("  Salt:       {}", salt);
            }
            if let Some(iterations) = summary.iterations {
                println!("  Iterations: {}", iterations);
            }
            match (summary.token_bytes, summary.ciphertext_bytes) {
                (Some(token), Some(ciphertext)) => {
                    println!("  Token:      {} bytes", token);
                    println!("  Ciphertext: {} bytes", ciphertext);
                },
                _ => println!("  Token:      not valid base64 (damaged)"),
            }
        },
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::GenerateKey { out } => cmd_generate_key(out.as_deref())?,
        Commands::Encrypt(args) => cmd_encrypt(args)?,
        Commands::Decrypt(args) => cmd_decrypt(args)?,
        Commands::Compare { file_a, file_b } => return cmd_compare(&file_a, &file_b),
        Commands::Inspect { input, format } => cmd_inspect(&input, format)?,
    }

    Ok(exit_codes::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        },
    }
}
