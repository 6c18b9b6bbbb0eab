//! `tokctl` — operator CLI for the tokengate envelope store.
//!
//! Usage:
//!   tokctl generate     - Mint new plaintext tokens locally
//!   tokctl upload       - Encrypt tokens and upload their envelopes
//!   tokctl rotate       - Generate, encrypt, and persist a fresh batch
//!   tokctl verify       - Check one candidate token against the store
//!   tokctl encrypt      - Print the envelope for a single token
//!
//! Collaborator failures (store, secret facility, bad key input) abort with a
//! nonzero exit; a `verify` mismatch is an ordinary outcome reported through
//! the exit code, not an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use common::lifecycle::{self, TokenPolicy};
use common::{EncryptionKey, Envelope, RotationReport, RotationStatus, TokenStore};

mod store;

use store::S3TokenStore;

#[derive(Parser)]
#[command(name = "tokctl")]
#[command(about = "Manage encrypted API tokens for the tokengate gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint new plaintext tokens locally; nothing is uploaded
    Generate {
        /// Number of tokens to generate
        #[arg(long, default_value_t = 1)]
        count: usize,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Also mint a fresh encryption key, printed as the final line
        #[arg(long)]
        with_key: bool,
    },

    /// Encrypt existing tokens and upload their envelopes to the store
    Upload {
        /// Encryption key as hex, or @path to a file containing it
        #[arg(long, value_name = "HEX|@FILE")]
        key: String,

        /// File with one token per line
        #[arg(long, conflicts_with = "tokens")]
        tokens_file: Option<PathBuf>,

        /// Tokens given directly on the command line
        #[arg(value_name = "TOKEN")]
        tokens: Vec<String>,

        /// Also persist the key to Secrets Manager
        #[arg(long)]
        store_key: bool,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Generate a fresh batch of tokens and persist their envelopes
    ///
    /// Existing envelopes are left untouched; the new tokens become valid
    /// alongside the old ones. The encryption key is read from Secrets
    /// Manager.
    Rotate {
        /// Number of new tokens to introduce
        #[arg(long)]
        count: usize,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Do not print the new plaintext tokens
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Check one candidate token against the stored envelope set
    ///
    /// Exits 0 on a match, 1 on no match.
    Verify {
        #[arg(value_name = "TOKEN")]
        token: String,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Encrypt a single token and print its envelope
    Encrypt {
        #[arg(value_name = "TOKEN")]
        token: String,

        /// Encryption key as hex, or @path to a file containing it
        #[arg(long, value_name = "HEX|@FILE")]
        key: String,
    },
}

/// Token generation policy flags shared by `generate` and `rotate`.
#[derive(Args)]
struct PolicyArgs {
    /// Number of random characters per token
    #[arg(long, default_value_t = 32)]
    length: usize,

    /// Fixed token prefix; without it each token gets a positional key{i}- prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Draw token characters from a wider alphabet than hexadecimal
    #[arg(long)]
    special_chars: bool,

    /// Insert a separator every 8 characters for readability
    #[arg(long)]
    formatted: bool,
}

impl PolicyArgs {
    fn to_policy(&self) -> TokenPolicy {
        TokenPolicy {
            length: self.length,
            prefix: self.prefix.clone(),
            special_chars: self.special_chars,
            formatted: self.formatted,
        }
    }
}

/// Location of the envelope store.
#[derive(Args)]
struct StoreArgs {
    /// S3 bucket holding the envelope objects
    #[arg(long, env = "TOKEN_BUCKET")]
    bucket: String,

    /// S3 key prefix under which envelope objects live
    #[arg(long, env = "TOKEN_PREFIX", default_value = "tokens/")]
    token_prefix: String,
}

/// Location of the encryption key in Secrets Manager.
#[derive(Args)]
struct SecretArgs {
    /// Secrets Manager identifier of the encryption key
    #[arg(long, env = "KEY_SECRET_ID", default_value = "tokengate/encryption-key")]
    secret_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            count,
            policy,
            with_key,
        } => cmd_generate(count, &policy, with_key),
        Command::Upload {
            key,
            tokens_file,
            tokens,
            store_key,
            store,
            secret,
        } => cmd_upload(&key, tokens_file.as_deref(), tokens, store_key, &store, &secret).await,
        Command::Rotate {
            count,
            policy,
            quiet,
            store,
            secret,
        } => cmd_rotate(count, &policy, quiet, &store, &secret).await,
        Command::Verify {
            token,
            store,
            secret,
        } => cmd_verify(&token, &store, &secret).await,
        Command::Encrypt { token, key } => cmd_encrypt(&token, &key),
    }
}

fn cmd_generate(count: usize, policy: &PolicyArgs, with_key: bool) -> Result<()> {
    for token in lifecycle::generate_tokens(count, &policy.to_policy()) {
        println!("{token}");
    }
    if with_key {
        println!("{}", EncryptionKey::generate().format());
    }
    Ok(())
}

async fn cmd_upload(
    key_arg: &str,
    tokens_file: Option<&Path>,
    tokens: Vec<String>,
    store_key: bool,
    store_args: &StoreArgs,
    secret: &SecretArgs,
) -> Result<()> {
    let key = resolve_key(key_arg)?;
    let tokens = match tokens_file {
        Some(path) => read_tokens_file(path)?,
        None => tokens,
    };
    anyhow::ensure!(
        !tokens.is_empty(),
        "no tokens supplied: pass TOKEN arguments or --tokens-file"
    );

    let (s3, secretsmanager) = store::aws_clients().await;

    if store_key {
        store::store_key(&secretsmanager, &secret.secret_id, &key).await?;
        println!("encryption key stored under {}", secret.secret_id);
    }

    let envelope_store = S3TokenStore::new(
        s3,
        store_args.bucket.clone(),
        store_args.token_prefix.clone(),
    );
    let uploads = lifecycle::encrypt_and_persist(&tokens, &key, &envelope_store).await;
    let report = RotationReport { uploads };
    print_report(&report);
    finish(report.status())
}

async fn cmd_rotate(
    count: usize,
    policy: &PolicyArgs,
    quiet: bool,
    store_args: &StoreArgs,
    secret: &SecretArgs,
) -> Result<()> {
    let (s3, secretsmanager) = store::aws_clients().await;
    let key = store::fetch_key(&secretsmanager, &secret.secret_id).await?;
    let envelope_store = S3TokenStore::new(
        s3,
        store_args.bucket.clone(),
        store_args.token_prefix.clone(),
    );

    let report = lifecycle::rotate(count, &policy.to_policy(), &key, &envelope_store).await;
    print_report(&report);
    if !quiet {
        // The new plaintext tokens, for out-of-band distribution. Only the
        // ones whose envelope actually reached the store are valid.
        for upload in report.succeeded() {
            println!("{}", upload.token);
        }
    }
    finish(report.status())
}

async fn cmd_verify(token: &str, store_args: &StoreArgs, secret: &SecretArgs) -> Result<()> {
    let (s3, secretsmanager) = store::aws_clients().await;
    let key = store::fetch_key(&secretsmanager, &secret.secret_id).await?;
    let envelope_store = S3TokenStore::new(
        s3,
        store_args.bucket.clone(),
        store_args.token_prefix.clone(),
    );

    let stored = envelope_store.list().await?;
    if common::validate::validate(token, &stored, &key) {
        println!("match");
        Ok(())
    } else {
        println!("no match");
        std::process::exit(1);
    }
}

fn cmd_encrypt(token: &str, key_arg: &str) -> Result<()> {
    let key = resolve_key(key_arg)?;
    let envelope = Envelope::encrypt(token, &key)?;
    println!("{}", envelope.to_hex());
    Ok(())
}

/// Print per-item upload outcomes followed by the aggregate status line.
fn print_report(report: &RotationReport) {
    for upload in &report.uploads {
        match &upload.outcome {
            Ok(envelope) => println!("stored {envelope}"),
            Err(e) => println!("failed {}: {e}", upload.token),
        }
    }
    println!(
        "status: {} ({} stored, {} failed)",
        report.status(),
        report.succeeded().len(),
        report.failed().len(),
    );
}

/// Map the batch status to process outcome: only total failure is an error.
fn finish(status: RotationStatus) -> Result<()> {
    match status {
        RotationStatus::Completed => Ok(()),
        RotationStatus::PartiallyFailed => {
            warn!("some envelopes did not reach the store; the listed tokens are not valid");
            Ok(())
        }
        RotationStatus::Failed => anyhow::bail!("no envelope reached the store"),
    }
}

/// Resolve a `--key` argument: a literal hex string, or `@path` to a file
/// holding one.
fn resolve_key(arg: &str) -> Result<EncryptionKey> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {path}"))?,
        None => arg.to_owned(),
    };
    EncryptionKey::parse(raw.trim()).context("invalid encryption key")
}

/// One token per non-empty line; surrounding whitespace is ignored.
fn read_tokens_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tokens file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_key_accepts_literal_hex() {
        let raw = "ab12cd34".repeat(8);
        let key = resolve_key(&raw).unwrap();
        assert_eq!(key, EncryptionKey::parse(&raw).unwrap());
    }

    #[test]
    fn resolve_key_accepts_formatted_hex() {
        let key = EncryptionKey::generate();
        assert_eq!(resolve_key(&key.format()).unwrap(), key);
    }

    #[test]
    fn resolve_key_reads_at_file() {
        let key = EncryptionKey::generate();
        let path = std::env::temp_dir().join("tokctl-test-key");
        std::fs::write(&path, format!("{}\n", key.format())).unwrap();
        let resolved = resolve_key(&format!("@{}", path.display())).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(resolved, key);
    }

    #[test]
    fn resolve_key_rejects_garbage() {
        assert!(resolve_key("not-a-key").is_err());
        assert!(resolve_key("@/nonexistent/key/file").is_err());
    }

    #[test]
    fn tokens_file_skips_blank_lines() {
        let path = std::env::temp_dir().join("tokctl-test-tokens");
        std::fs::write(&path, "alpha\n\n  beta  \n\n").unwrap();
        let tokens = read_tokens_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(tokens, vec!["alpha", "beta"]);
    }

    #[test]
    fn cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "tokctl",
            "generate",
            "--count",
            "3",
            "--length",
            "16",
            "--prefix",
            "media-api-",
            "--formatted",
        ])
        .unwrap();
        match cli.command {
            Command::Generate {
                count,
                policy,
                with_key,
            } => {
                assert_eq!(count, 3);
                assert_eq!(policy.length, 16);
                assert_eq!(policy.prefix.as_deref(), Some("media-api-"));
                assert!(policy.formatted);
                assert!(!policy.special_chars);
                assert!(!with_key);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn cli_parses_verify_with_store_flags() {
        let cli = Cli::try_parse_from([
            "tokctl",
            "verify",
            "some-token",
            "--bucket",
            "my-bucket",
            "--secret-id",
            "my/secret",
        ])
        .unwrap();
        match cli.command {
            Command::Verify {
                token,
                store,
                secret,
            } => {
                assert_eq!(token, "some-token");
                assert_eq!(store.bucket, "my-bucket");
                assert_eq!(store.token_prefix, "tokens/");
                assert_eq!(secret.secret_id, "my/secret");
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn cli_rejects_tokens_file_with_positional_tokens() {
        let result = Cli::try_parse_from([
            "tokctl",
            "upload",
            "--key",
            "abc",
            "--tokens-file",
            "tokens.txt",
            "extra-token",
            "--bucket",
            "b",
        ]);
        assert!(result.is_err());
    }
}
