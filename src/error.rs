//! Error taxonomy for certificate issuance and keystore persistence.
//!
//! Every failure is classified by the stage it occurred in, so callers can
//! tell a bad passphrase apart from a signing failure without parsing
//! message strings. None of the operations retry internally; each error
//! terminates the issuance call that produced it.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while issuing a certificate or touching the keystore.
#[derive(Debug, Error)]
pub enum IssuerError {
    /// Caller-supplied alias or subject information was missing or
    /// malformed. Raised before any key material is generated or any file
    /// is touched.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// Key generation, certificate assembly, signing, or the post-build
    /// self check failed. The keystore file has not been modified.
    #[error("certificate construction failed: {0}")]
    Construction(String),

    /// The keystore file exists but could not be read or decrypted (wrong
    /// passphrase or corrupt contents). The on-disk file is left as found.
    #[error("failed to load keystore {}: {detail}", .path.display())]
    StoreLoad { path: PathBuf, detail: String },

    /// The keystore could not be serialized or written back. A failure
    /// during the write itself can leave the file in an indeterminate
    /// state; callers should keep a backup before re-issuing.
    #[error("failed to write keystore {}: {detail}", .path.display())]
    StoreWrite { path: PathBuf, detail: String },
}

impl IssuerError {
    pub(crate) fn store_load(path: &Path, detail: impl Into<String>) -> Self {
        Self::StoreLoad {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    pub(crate) fn store_write(path: &Path, detail: impl Into<String>) -> Self {
        Self::StoreWrite {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IssuerError>;
