//! certmint - Self-Signed Certificates into PKCS#12 Keystores
//!
//! Issues a self-signed X.509 certificate for a given subject name and
//! stores the private key and certificate chain under an alias in a
//! passphrase-protected, multi-entry PKCS#12 keystore. The store is created
//! when absent and loaded and augmented when present, so one store file can
//! accumulate credentials for many hostnames.
//!
//! ```text
//! subject name ──► RSA key pair ──► self-signed X.509 ──► self check
//!                                                             │
//!                          keystore (load or init) ◄──────────┘
//!                                │ insert/overwrite at alias
//!                                ▼
//!                          keystore written back
//! ```
//!
//! # Certificate Shape
//!
//! - Issuer equals subject (self-signed), signed SHA-256 with RSA
//! - Serial number: current time in milliseconds since the Unix epoch
//! - Validity: one day in the past (clock-skew margin) to ten years ahead
//! - RSA 2048-bit by default
//!
//! # Example
//!
//! ```no_run
//! use certmint::issuance::{issue_with_fields, issue_with_subject};
//!
//! fn main() -> certmint::Result<()> {
//!     // Structured organizational fields...
//!     issue_with_fields(
//!         "git.example.com",
//!         "keystore",
//!         "changeit",
//!         "Git",
//!         "ExampleCo",
//!         "git.example.com",
//!     )?;
//!
//!     // ...or a literal distinguished-name string, into the same store.
//!     issue_with_subject(
//!         "admin.example.com",
//!         "keystore",
//!         "changeit",
//!         "CN=admin.example.com,O=ExampleCo",
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`subject_name`]: distinguished-name model, structured or parsed
//! - [`generate_certificate`]: RSA key generation and certificate building
//! - [`credential_store`]: alias-keyed PKCS#12 load/insert/save
//! - [`issuance`]: the public entry points tying the steps together
//! - [`configs`]: optional TOML defaults for the CLI
//! - [`error`]: stage-tagged error taxonomy
//!
//! # Caveats
//!
//! The store write is a plain overwrite: a crash mid-write can corrupt the
//! file, and concurrent issuance against the same store path loses updates.
//! Serialize access per store file and keep a backup before re-issuing.
//! Serial numbers derive from the clock and are not checked for uniqueness
//! within a store.

pub mod configs;
pub mod credential_store;
pub mod error;
pub mod generate_certificate;
pub mod issuance;
pub mod subject_name;

pub use credential_store::CredentialStore;
pub use error::{IssuerError, Result};
pub use issuance::{issue_with_fields, issue_with_subject};
pub use subject_name::DistinguishedName;
