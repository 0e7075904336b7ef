//! Distinguished-name model for certificate subjects.
//!
//! A [`DistinguishedName`] is an ordered list of attribute/value pairs that
//! ends up as both the subject and the issuer of a self-signed certificate.
//! It can be built two ways:
//!
//! - from structured organizational fields (`OU`, `O`, `CN`), emitted in the
//!   canonical order CN, O, OU
//! - parsed from a literal string such as `"CN=git.example.com,O=ExampleCo,OU=Git"`,
//!   preserving the order given
//!
//! Both paths resolve to the same canonical value, so the rest of the crate
//! never cares which entry point produced it.

use std::fmt;

use openssl::nid::Nid;
use openssl::x509::X509Name;

use crate::error::{IssuerError, Result};

/// Subject attributes accepted in a distinguished name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAttribute {
    CommonName,
    Organization,
    OrganizationalUnit,
    Locality,
    State,
    Country,
}

impl NameAttribute {
    /// The OpenSSL NID used when building an `X509Name` entry.
    pub(crate) fn nid(self) -> Nid {
        match self {
            Self::CommonName => Nid::COMMONNAME,
            Self::Organization => Nid::ORGANIZATIONNAME,
            Self::OrganizationalUnit => Nid::ORGANIZATIONALUNITNAME,
            Self::Locality => Nid::LOCALITYNAME,
            Self::State => Nid::STATEORPROVINCENAME,
            Self::Country => Nid::COUNTRYNAME,
        }
    }

    /// Short attribute key as it appears in a distinguished-name string.
    pub fn key(self) -> &'static str {
        match self {
            Self::CommonName => "CN",
            Self::Organization => "O",
            Self::OrganizationalUnit => "OU",
            Self::Locality => "L",
            Self::State => "ST",
            Self::Country => "C",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_uppercase().as_str() {
            "CN" => Some(Self::CommonName),
            "O" => Some(Self::Organization),
            "OU" => Some(Self::OrganizationalUnit),
            "L" => Some(Self::Locality),
            "ST" => Some(Self::State),
            "C" => Some(Self::Country),
            _ => None,
        }
    }
}

/// Ordered distinguished name used as both subject and issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    entries: Vec<(NameAttribute, String)>,
}

impl DistinguishedName {
    /// Build a structured name from organizational fields.
    ///
    /// The common name is required; empty organization or organizational
    /// unit fields are skipped rather than stored as blank attributes.
    /// Entries are emitted in the order CN, O, OU.
    ///
    /// # Arguments
    /// * `org_unit` - Organizational unit (OU), may be empty
    /// * `org` - Organization (O), may be empty
    /// * `common_name` - Common name (CN), required
    pub fn from_org_fields(org_unit: &str, org: &str, common_name: &str) -> Result<Self> {
        if common_name.trim().is_empty() {
            return Err(IssuerError::Parameter(
                "common name must not be empty".to_string(),
            ));
        }

        let mut entries = vec![(NameAttribute::CommonName, common_name.trim().to_string())];
        if !org.trim().is_empty() {
            entries.push((NameAttribute::Organization, org.trim().to_string()));
        }
        if !org_unit.trim().is_empty() {
            entries.push((NameAttribute::OrganizationalUnit, org_unit.trim().to_string()));
        }

        Ok(Self { entries })
    }

    /// Parse a distinguished-name string such as `"CN=host,O=org,OU=unit"`.
    ///
    /// Tokens are separated by commas, each token is a `KEY=VALUE` pair,
    /// keys are case-insensitive, and whitespace around keys and values is
    /// trimmed. The attribute order of the input is preserved.
    ///
    /// # Errors
    /// Returns [`IssuerError::Parameter`] for an empty string, a token
    /// without `=`, an unknown attribute key, or a blank value.
    // TODO: support RFC 4514 escaped commas in attribute values
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(IssuerError::Parameter(format!(
                    "empty attribute in subject '{text}'"
                )));
            }
            let (key, value) = token.split_once('=').ok_or_else(|| {
                IssuerError::Parameter(format!("attribute '{token}' is not a KEY=VALUE pair"))
            })?;
            let attribute = NameAttribute::from_key(key.trim()).ok_or_else(|| {
                IssuerError::Parameter(format!("unsupported attribute '{}'", key.trim()))
            })?;
            let value = value.trim();
            if value.is_empty() {
                return Err(IssuerError::Parameter(format!(
                    "attribute '{}' has an empty value",
                    key.trim()
                )));
            }
            entries.push((attribute, value.to_string()));
        }

        Ok(Self { entries })
    }

    /// The first common-name value, if the name carries one.
    pub fn common_name(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(attribute, _)| *attribute == NameAttribute::CommonName)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute/value pairs in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = (NameAttribute, &str)> {
        self.entries
            .iter()
            .map(|(attribute, value)| (*attribute, value.as_str()))
    }

    /// Render the name as an OpenSSL `X509Name`.
    pub(crate) fn to_x509_name(&self) -> Result<X509Name> {
        let mut name_builder = X509Name::builder().map_err(|e| {
            IssuerError::Construction(format!("Failed to create name builder: {e}"))
        })?;
        for (attribute, value) in &self.entries {
            name_builder
                .append_entry_by_nid(attribute.nid(), value)
                .map_err(|e| {
                    IssuerError::Construction(format!(
                        "Failed to set {}: {e}",
                        attribute.key()
                    ))
                })?;
        }
        Ok(name_builder.build())
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (attribute, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", attribute.key(), value)?;
        }
        Ok(())
    }
}
