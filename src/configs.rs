//! Application configuration.
//!
//! Optional TOML file (`certmint.toml` in the working directory) supplying
//! defaults the CLI falls back to when flags are omitted: the store path,
//! the store passphrase, and the organization fields used for structured
//! subjects. A missing file yields pure defaults, mirroring a settings
//! source that returns a default for an absent key.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_DEFAULT: &str = "certmint.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub keystore: KeystoreConfig,
    #[serde(default)]
    pub identity: IdentityDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeystoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Default store passphrase used when the caller supplies none. Empty
    /// is permitted but leaves the store protected by an empty passphrase.
    #[serde(default)]
    pub store_password: String,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            store_password: String::new(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("keystore")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityDefaults {
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_organizational_unit")]
    pub organizational_unit: String,
}

impl Default for IdentityDefaults {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            organizational_unit: default_organizational_unit(),
        }
    }
}

fn default_organization() -> String {
    "certmint".to_string()
}

fn default_organizational_unit() -> String {
    "certmint".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keystore: KeystoreConfig::default(),
            identity: IdentityDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;

        let config: AppConfig =
            toml::from_str(&config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from the default path (certmint.toml), falling
    /// back to built-in defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE_DEFAULT).exists() {
            Self::from_file(CONFIG_FILE_DEFAULT)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured default store passphrase, wrapped so it stays out of
    /// debug output.
    pub fn store_password(&self) -> SecretString {
        SecretString::from(self.keystore.store_password.clone())
    }
}
