//! Credential Store Module
//!
//! Persistent, passphrase-protected container mapping aliases to private-key
//! and certificate-chain entries, backed by a PKCS#12 file. The in-memory
//! store only exists inside a load→mutate→save sequence:
//!
//! ```text
//! CredentialStore::open(path, passphrase)   // load if present, else empty
//!     .set_key_entry(alias, key, cert)      // insert or overwrite
//!     .save(passphrase)                     // re-encrypt and write back
//! ```
//!
//! Writing is a plain overwrite of the store file. A crash mid-write can
//! leave the file corrupt, and concurrent writers against the same path can
//! lose updates; callers needing either guarantee must serialize access and
//! keep a backup before re-issuing.

use std::fs;
use std::path::{Path, PathBuf};

use openssl::pkey::{PKeyRef, Private};
use openssl::x509::{X509Ref, X509};
use p12_keystore::{Certificate as StoredCertificate, KeyStore, KeyStoreEntry, PrivateKeyChain};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{IssuerError, Result};

/// Alias-keyed PKCS#12 credential store.
///
/// Each alias maps to at most one entry; storing under an existing alias
/// replaces it. Private keys are held in PKCS#8 form inside the encrypted
/// container and are never written to disk unprotected.
pub struct CredentialStore {
    path: PathBuf,
    entries: KeyStore,
}

impl CredentialStore {
    /// Open the store at `path`, decrypting it with `passphrase` when the
    /// file exists, or initializing an empty store when it does not.
    ///
    /// # Errors
    /// Returns [`IssuerError::StoreLoad`] when the file exists but cannot
    /// be read or decrypted (wrong passphrase or corrupt contents). The
    /// on-disk file is left untouched in that case.
    pub fn open(path: impl AsRef<Path>, passphrase: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read(&path)
                .map_err(|e| IssuerError::store_load(&path, format!("Failed to read keystore: {e}")))?;
            let store = KeyStore::from_pkcs12(&raw, passphrase).map_err(|e| {
                IssuerError::store_load(&path, format!("Failed to decrypt keystore: {e}"))
            })?;
            debug!(path = %path.display(), "loaded existing keystore");
            store
        } else {
            debug!(path = %path.display(), "initializing new keystore");
            KeyStore::new()
        };
        Ok(Self { path, entries })
    }

    /// Insert or overwrite the entry at `alias` with the given private key
    /// and its certificate as a single-element chain.
    ///
    /// The key is stored in PKCS#8 form; the entry's local key id is the
    /// SHA-256 digest of the certificate DER.
    pub fn set_key_entry(
        &mut self,
        alias: &str,
        private_key: &PKeyRef<Private>,
        certificate: &X509Ref,
    ) -> Result<()> {
        let key_der = private_key.private_key_to_pkcs8().map_err(|e| {
            IssuerError::Construction(format!("Failed to encode private key as PKCS#8: {e}"))
        })?;
        let certificate_der = certificate.to_der().map_err(|e| {
            IssuerError::Construction(format!("Failed to encode certificate as DER: {e}"))
        })?;
        let stored_certificate = StoredCertificate::from_der(&certificate_der).map_err(|e| {
            IssuerError::Construction(format!("Failed to re-encode certificate for storage: {e}"))
        })?;

        let local_key_id = Sha256::digest(&certificate_der);
        let chain = PrivateKeyChain::new(key_der, local_key_id.to_vec(), vec![stored_certificate]);
        self.entries
            .add_entry(alias, KeyStoreEntry::PrivateKeyChain(chain));
        Ok(())
    }

    /// Look up the private-key entry stored under `alias`.
    pub fn key_entry(&self, alias: &str) -> Option<&PrivateKeyChain> {
        self.entries.entries().find_map(|(name, entry)| match entry {
            KeyStoreEntry::PrivateKeyChain(chain) if *name == *alias => Some(chain),
            _ => None,
        })
    }

    /// Decode the leaf certificate stored under `alias`.
    pub fn certificate(&self, alias: &str) -> Result<Option<X509>> {
        let Some(chain) = self.key_entry(alias) else {
            return Ok(None);
        };
        let leaf = chain.chain().first().ok_or_else(|| {
            IssuerError::store_load(
                &self.path,
                format!("entry '{alias}' has an empty certificate chain"),
            )
        })?;
        let certificate = X509::from_der(leaf.as_der()).map_err(|e| {
            IssuerError::store_load(
                &self.path,
                format!("Failed to decode certificate for '{alias}': {e}"),
            )
        })?;
        Ok(Some(certificate))
    }

    /// All aliases in the store, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .entries
            .entries()
            .map(|(name, _)| name.to_string())
            .collect();
        aliases.sort();
        aliases
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.entries().count()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The file this store is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-encrypt the whole store with `passphrase` and write it back.
    ///
    /// # Errors
    /// Returns [`IssuerError::StoreWrite`] when serialization or the file
    /// write fails. A failed write can leave the file in an indeterminate
    /// state.
    pub fn save(&self, passphrase: &str) -> Result<()> {
        let raw = self.entries.writer(passphrase).write().map_err(|e| {
            IssuerError::store_write(&self.path, format!("Failed to serialize keystore: {e}"))
        })?;
        fs::write(&self.path, raw).map_err(|e| {
            IssuerError::store_write(&self.path, format!("Failed to write keystore: {e}"))
        })?;
        debug!(path = %self.path.display(), entries = self.len(), "wrote keystore");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_certificate::SelfSignedCertificateBuilder;
    use crate::subject_name::DistinguishedName;
    use openssl::pkey::PKey;

    fn issue_pair(common_name: &str) -> (PKey<Private>, X509) {
        let subject = DistinguishedName::from_org_fields("Git", "ExampleCo", common_name).unwrap();
        SelfSignedCertificateBuilder::new(subject).build().unwrap()
    }

    #[test]
    fn creates_store_with_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let (key, certificate) = issue_pair("git.example.com");
        let mut store = CredentialStore::open(&path, "changeit").unwrap();
        assert!(store.is_empty());
        store.set_key_entry("git.example.com", &key, &certificate).unwrap();
        store.save("changeit").unwrap();

        let reloaded = CredentialStore::open(&path, "changeit").unwrap();
        assert_eq!(reloaded.aliases(), vec!["git.example.com".to_string()]);
        let stored = reloaded.certificate("git.example.com").unwrap().unwrap();
        assert_eq!(stored.to_der().unwrap(), certificate.to_der().unwrap());
    }

    #[test]
    fn reissue_overwrites_only_its_own_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let (first_key, first_certificate) = issue_pair("git.example.com");
        let (other_key, other_certificate) = issue_pair("admin.example.com");
        let mut store = CredentialStore::open(&path, "changeit").unwrap();
        store
            .set_key_entry("git.example.com", &first_key, &first_certificate)
            .unwrap();
        store
            .set_key_entry("admin.example.com", &other_key, &other_certificate)
            .unwrap();
        store.save("changeit").unwrap();

        let (second_key, second_certificate) = issue_pair("git.example.com");
        let mut store = CredentialStore::open(&path, "changeit").unwrap();
        store
            .set_key_entry("git.example.com", &second_key, &second_certificate)
            .unwrap();
        store.save("changeit").unwrap();

        let reloaded = CredentialStore::open(&path, "changeit").unwrap();
        assert_eq!(reloaded.len(), 2);
        let replaced = reloaded.certificate("git.example.com").unwrap().unwrap();
        assert_eq!(replaced.to_der().unwrap(), second_certificate.to_der().unwrap());
        let untouched = reloaded.certificate("admin.example.com").unwrap().unwrap();
        assert_eq!(untouched.to_der().unwrap(), other_certificate.to_der().unwrap());
    }

    #[test]
    fn wrong_passphrase_fails_and_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let (key, certificate) = issue_pair("git.example.com");
        let mut store = CredentialStore::open(&path, "correct horse").unwrap();
        store.set_key_entry("git.example.com", &key, &certificate).unwrap();
        store.save("correct horse").unwrap();

        let before = fs::read(&path).unwrap();
        let err = CredentialStore::open(&path, "battery staple").unwrap_err();
        assert!(matches!(err, IssuerError::StoreLoad { .. }));
        let after = fs::read(&path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_alias_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");
        let store = CredentialStore::open(&path, "changeit").unwrap();
        assert!(store.key_entry("absent").is_none());
        assert!(store.certificate("absent").unwrap().is_none());
    }
}
