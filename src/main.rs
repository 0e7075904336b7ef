//! certmint CLI - issue a self-signed certificate into a PKCS#12 keystore.
//!
//! Quiet on success; diagnostics go to stderr and are enabled through
//! `RUST_LOG`. On failure the error chain is printed and the process exits
//! non-zero.

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;

use certmint::configs::AppConfig;
use certmint::issuance::{issue_with_fields, issue_with_subject};

#[derive(Parser, Debug)]
#[command(
    name = "certmint",
    version,
    about = "Issue a self-signed certificate into a PKCS#12 keystore"
)]
struct Args {
    /// Alias under which the private key and certificate are stored
    #[arg(long)]
    alias: String,

    /// Certificate subject as a distinguished name,
    /// e.g. "CN=git.example.com,O=ExampleCo,OU=Git"
    #[arg(long, required_unless_present = "common_name", conflicts_with = "common_name")]
    subject: Option<String>,

    /// Common name for a subject built from the configured organization
    /// fields instead of a full distinguished name
    #[arg(long)]
    common_name: Option<String>,

    /// Keystore passphrase; falls back to the configured default when omitted
    #[arg(long)]
    store_password: Option<String>,

    /// Prompt for the keystore passphrase instead of passing it on the
    /// command line
    #[arg(long, conflicts_with = "store_password")]
    ask_password: bool,

    /// Keystore file to create or update
    #[arg(long)]
    keystore: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let passphrase = if args.ask_password {
        SecretString::from(
            rpassword::prompt_password("Keystore passphrase: ")
                .context("Failed to read passphrase")?,
        )
    } else if let Some(password) = args.store_password {
        SecretString::from(password)
    } else {
        config.store_password()
    };

    let store_path = args
        .keystore
        .unwrap_or_else(|| config.keystore.path.clone());

    if let Some(subject) = args.subject.as_deref() {
        issue_with_subject(&args.alias, &store_path, passphrase.expose_secret(), subject)
    } else {
        // clap guarantees exactly one of --subject / --common-name is set
        let common_name = args.common_name.as_deref().unwrap_or_default();
        issue_with_fields(
            &args.alias,
            &store_path,
            passphrase.expose_secret(),
            &config.identity.organizational_unit,
            &config.identity.organization,
            common_name,
        )
    }
    .context("Failed to generate self-signed certificate")?;

    Ok(())
}
