//! Self-Signed Certificate Generation Module
//!
//! Generates an RSA key pair and a self-signed X.509v3 certificate binding
//! the public key to a caller-supplied distinguished name. The same name is
//! used as issuer and subject, and the certificate is signed with the paired
//! private key using SHA-256 with RSA.
//!
//! # Certificate Properties
//! - **Self-signed**: issuer and subject are identical
//! - **Serial Number**: current time in milliseconds since the Unix epoch
//! - **Validity**: backdated one day against clock skew, ten years forward
//! - **Default Key Size**: RSA 2048-bit
//! - **Version**: X.509v3, no extensions
//!
//! Serial numbers are taken from a nondecreasing clock but uniqueness across
//! a keystore is not checked here; callers that need it must enforce it.
//!
//! # Example
//! ```rust,no_run
//! use certmint::generate_certificate::SelfSignedCertificateBuilder;
//! use certmint::subject_name::DistinguishedName;
//! # fn example() -> certmint::Result<()> {
//! let subject = DistinguishedName::parse("CN=git.example.com,O=ExampleCo,OU=Git")?;
//! let (private_key, certificate) = SelfSignedCertificateBuilder::new(subject).build()?;
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509};
use tracing::debug;

use crate::error::{IssuerError, Result};
use crate::subject_name::DistinguishedName;

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2
const RSA_KEY_SIZE_DEFAULT: u32 = 2048;
const VALIDITY_DAYS_DEFAULT: u32 = 3650;
const NOT_BEFORE_BACKDATE_DAYS: i64 = 1;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Builder for generating RSA key pairs and self-signed certificates
///
/// The subject name doubles as the issuer name. Key size and validity are
/// configurable; the one-day backdating of `not_before` is fixed, as is the
/// SHA-256-with-RSA signature algorithm.
///
/// The private key is returned alongside the certificate and is never
/// written anywhere by this module.
pub struct SelfSignedCertificateBuilder {
    subject: DistinguishedName,
    key_bits: u32,
    validity_days: u32,
}

impl SelfSignedCertificateBuilder {
    /// Create a builder for the given subject with default key size and
    /// validity.
    pub fn new(subject: DistinguishedName) -> Self {
        Self {
            subject,
            key_bits: RSA_KEY_SIZE_DEFAULT,
            validity_days: VALIDITY_DAYS_DEFAULT,
        }
    }

    /// Set the RSA modulus size in bits.
    ///
    /// Defaults to 2048. Smaller legacy sizes are accepted for
    /// compatibility with stores produced by older tooling.
    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    /// Set the forward validity period in days (default 3650).
    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Build the RSA key pair and self-signed certificate.
    ///
    /// After signing, the certificate is checked against its own contents:
    /// the validity window must contain the current time and the signature
    /// must verify with the embedded public key. Either check failing means
    /// a defect in this code or the crypto backend, and is surfaced as a
    /// construction error rather than silently returned.
    ///
    /// # Returns
    /// * `Ok((PKey<Private>, X509))` - Tuple of (private key, certificate)
    /// * `Err(IssuerError::Construction)` - If any generation step fails
    pub fn build(self) -> Result<(PKey<Private>, X509)> {
        // Generate RSA key pair
        let rsa = openssl::rsa::Rsa::generate(self.key_bits)
            .map_err(|e| IssuerError::Construction(format!("Failed to generate RSA keypair: {e}")))?;
        let private_key = PKey::from_rsa(rsa)
            .map_err(|e| IssuerError::Construction(format!("Failed to create private key: {e}")))?;
        debug!(bits = self.key_bits, "generated RSA key pair");

        // Build X509 certificate
        let mut builder = X509::builder()
            .map_err(|e| IssuerError::Construction(format!("Failed to create X509 builder: {e}")))?;

        builder
            .set_version(X509_VERSION_3)
            .map_err(|e| IssuerError::Construction(format!("Failed to set version: {e}")))?;

        // Serial number and validity window both derive from the same clock
        // reading so the certificate is internally consistent.
        let clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| IssuerError::Construction(format!("System clock before Unix epoch: {e}")))?;

        let serial = BigNum::from_dec_str(&clock.as_millis().to_string())
            .map_err(|e| IssuerError::Construction(format!("Failed to create serial number: {e}")))?;
        let asn1_serial = serial
            .to_asn1_integer()
            .map_err(|e| IssuerError::Construction(format!("Failed to encode serial number: {e}")))?;
        builder
            .set_serial_number(&asn1_serial)
            .map_err(|e| IssuerError::Construction(format!("Failed to set serial number: {e}")))?;

        let now = clock.as_secs() as i64;
        let not_before = Asn1Time::from_unix(now - NOT_BEFORE_BACKDATE_DAYS * SECONDS_PER_DAY)
            .map_err(|e| IssuerError::Construction(format!("Failed to create not_before: {e}")))?;
        builder
            .set_not_before(&not_before)
            .map_err(|e| IssuerError::Construction(format!("Failed to set not_before: {e}")))?;

        let not_after = Asn1Time::from_unix(now + i64::from(self.validity_days) * SECONDS_PER_DAY)
            .map_err(|e| IssuerError::Construction(format!("Failed to create not_after: {e}")))?;
        builder
            .set_not_after(&not_after)
            .map_err(|e| IssuerError::Construction(format!("Failed to set not_after: {e}")))?;

        // Self-signed: subject and issuer are the same name
        let name = self.subject.to_x509_name()?;
        builder
            .set_subject_name(&name)
            .map_err(|e| IssuerError::Construction(format!("Failed to set subject: {e}")))?;
        builder
            .set_issuer_name(&name)
            .map_err(|e| IssuerError::Construction(format!("Failed to set issuer: {e}")))?;

        builder
            .set_pubkey(&private_key)
            .map_err(|e| IssuerError::Construction(format!("Failed to set public key: {e}")))?;

        builder
            .sign(&private_key, MessageDigest::sha256())
            .map_err(|e| IssuerError::Construction(format!("Failed to sign certificate: {e}")))?;

        let certificate = builder.build();
        check_freshly_built(&certificate, &private_key)?;
        debug!(subject = %self.subject, "built self-signed certificate");

        Ok((private_key, certificate))
    }
}

/// Verify the internal consistency of a certificate that was just built.
///
/// The validity window must contain the current time and the embedded
/// signature must verify against the embedded public key.
fn check_freshly_built(certificate: &X509Ref, private_key: &PKeyRef<Private>) -> Result<()> {
    let now = Asn1Time::days_from_now(0)
        .map_err(|e| IssuerError::Construction(format!("Failed to read current time: {e}")))?;

    let before_now = certificate
        .not_before()
        .compare(&now)
        .map_err(|e| IssuerError::Construction(format!("Failed to compare not_before: {e}")))?;
    if before_now == Ordering::Greater {
        return Err(IssuerError::Construction(
            "certificate is not yet valid directly after generation".to_string(),
        ));
    }

    let after_now = certificate
        .not_after()
        .compare(&now)
        .map_err(|e| IssuerError::Construction(format!("Failed to compare not_after: {e}")))?;
    if after_now == Ordering::Less {
        return Err(IssuerError::Construction(
            "certificate is already expired directly after generation".to_string(),
        ));
    }

    let verified = certificate
        .verify(private_key)
        .map_err(|e| IssuerError::Construction(format!("Failed to verify signature: {e}")))?;
    if !verified {
        return Err(IssuerError::Construction(
            "self-signature does not verify against the embedded public key".to_string(),
        ));
    }

    Ok(())
}
