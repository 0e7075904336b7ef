//! Issuance Workflow Module
//!
//! Ties the pieces together: build a subject name, generate a key pair and
//! self-signed certificate, then persist both into the credential store
//! under the given alias. Two public entry points differ only in how the
//! subject name is supplied; both delegate to the same internal operation.
//!
//! The store file is not touched until certificate construction has
//! succeeded, so a crypto failure never leaves a half-written store. The
//! workflow is synchronous and performs no internal locking; concurrent
//! calls against the same store path must be serialized by the caller.

use std::path::Path;

use openssl::x509::X509;
use tracing::{info, warn};

use crate::credential_store::CredentialStore;
use crate::error::{IssuerError, Result};
use crate::generate_certificate::SelfSignedCertificateBuilder;
use crate::subject_name::DistinguishedName;

/// Issue a self-signed certificate for a subject built from organizational
/// fields and store it under `alias`.
///
/// The subject is assembled as `CN=common_name,O=org,OU=org_unit`; empty
/// organization fields are omitted.
///
/// # Arguments
/// * `alias` - Store key for the new entry, must not be empty
/// * `store_path` - Credential store file, created when absent
/// * `passphrase` - Store passphrase, also protects the private key
/// * `org_unit` - Organizational unit (OU)
/// * `org` - Organization (O)
/// * `common_name` - Common name (CN), typically the hostname
///
/// # Returns
/// The issued certificate. Its private key lives only in the store.
pub fn issue_with_fields(
    alias: &str,
    store_path: impl AsRef<Path>,
    passphrase: &str,
    org_unit: &str,
    org: &str,
    common_name: &str,
) -> Result<X509> {
    let subject = DistinguishedName::from_org_fields(org_unit, org, common_name)?;
    issue(alias, store_path.as_ref(), passphrase, subject)
}

/// Issue a self-signed certificate for a literal distinguished-name string
/// (e.g. `"CN=git.example.com,O=ExampleCo,OU=Git"`) and store it under
/// `alias`.
pub fn issue_with_subject(
    alias: &str,
    store_path: impl AsRef<Path>,
    passphrase: &str,
    subject: &str,
) -> Result<X509> {
    let subject = DistinguishedName::parse(subject)?;
    issue(alias, store_path.as_ref(), passphrase, subject)
}

fn issue(
    alias: &str,
    store_path: &Path,
    passphrase: &str,
    subject: DistinguishedName,
) -> Result<X509> {
    if alias.trim().is_empty() {
        return Err(IssuerError::Parameter("alias must not be empty".to_string()));
    }
    if passphrase.is_empty() {
        warn!(
            path = %store_path.display(),
            "issuing into a keystore with an empty passphrase"
        );
    }

    let (private_key, certificate) = SelfSignedCertificateBuilder::new(subject).build()?;

    let mut store = CredentialStore::open(store_path, passphrase)?;
    store.set_key_entry(alias, &private_key, &certificate)?;
    store.save(passphrase)?;

    info!(
        alias,
        path = %store_path.display(),
        "issued self-signed certificate"
    );
    Ok(certificate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::nid::Nid;
    use std::fs;

    fn common_name(certificate: &X509) -> String {
        certificate
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap()
            .data()
            .as_utf8()
            .unwrap()
            .to_string()
    }

    #[test]
    fn fresh_store_receives_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let certificate = issue_with_fields(
            "git.example.com",
            &path,
            "changeit",
            "Git",
            "ExampleCo",
            "git.example.com",
        )
        .unwrap();

        assert_eq!(common_name(&certificate), "git.example.com");
        let window = certificate
            .not_before()
            .diff(certificate.not_after())
            .unwrap();
        assert_eq!(window.days, 3651);

        let store = CredentialStore::open(&path, "changeit").unwrap();
        assert_eq!(store.aliases(), vec!["git.example.com".to_string()]);
    }

    #[test]
    fn second_alias_is_added_without_touching_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let first = issue_with_fields(
            "git.example.com",
            &path,
            "changeit",
            "Git",
            "ExampleCo",
            "git.example.com",
        )
        .unwrap();

        issue_with_subject(
            "admin.example.com",
            &path,
            "changeit",
            "CN=admin.example.com,O=ExampleCo",
        )
        .unwrap();

        let store = CredentialStore::open(&path, "changeit").unwrap();
        assert_eq!(
            store.aliases(),
            vec![
                "admin.example.com".to_string(),
                "git.example.com".to_string()
            ]
        );
        let untouched = store.certificate("git.example.com").unwrap().unwrap();
        assert_eq!(untouched.to_der().unwrap(), first.to_der().unwrap());
    }

    #[test]
    fn reissue_replaces_the_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let first =
            issue_with_subject("git.example.com", &path, "changeit", "CN=git.example.com")
                .unwrap();
        let second =
            issue_with_subject("git.example.com", &path, "changeit", "CN=git.example.com")
                .unwrap();

        let store = CredentialStore::open(&path, "changeit").unwrap();
        assert_eq!(store.len(), 1);
        let stored = store.certificate("git.example.com").unwrap().unwrap();
        assert_eq!(stored.to_der().unwrap(), second.to_der().unwrap());
        assert_ne!(stored.to_der().unwrap(), first.to_der().unwrap());
    }

    #[test]
    fn empty_alias_is_rejected_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let err = issue_with_subject(" ", &path, "changeit", "CN=git.example.com").unwrap_err();
        assert!(matches!(err, IssuerError::Parameter(_)));
        assert!(!path.exists());
    }

    #[test]
    fn malformed_subject_is_rejected_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        let err = issue_with_subject("git.example.com", &path, "changeit", "CN").unwrap_err();
        assert!(matches!(err, IssuerError::Parameter(_)));
        assert!(!path.exists());
    }

    #[test]
    fn wrong_passphrase_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore");

        issue_with_subject("git.example.com", &path, "correct horse", "CN=git.example.com")
            .unwrap();
        let before = fs::read(&path).unwrap();

        let err = issue_with_subject(
            "admin.example.com",
            &path,
            "battery staple",
            "CN=admin.example.com",
        )
        .unwrap_err();
        assert!(matches!(err, IssuerError::StoreLoad { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
