use const_oid::AssociatedOid;
pub use der::flagset::FlagSet;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::PkiError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use devpki::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Every entry is emitted as a `dNSName`. Names are not checked for hostname
/// syntax, but they must be ASCII to fit an IA5String.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::new(name)
                        .map(GeneralName::DnsName)
                        .map_err(|e| {
                            PkiError::InvalidInput(format!(
                                "subjectAltName {name:?} is not ASCII and cannot be stored \
                                 as a dNSName (IA5String), it is rejected rather than \
                                 written unchecked: {e}"
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(PkiError::InvalidInput(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, PkiError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    pub fn contains(&self, usage: KeyUsages) -> bool {
        self.0.contains(usage)
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` form is modeled, which is what the root emits
/// (OpenSSL's `keyid:always`). An issuer name or serial present in a decoded
/// extension is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
}

impl AuthorityKeyIdentifier {
    pub fn from_key_identifier(key_identifier: Vec<u8>) -> Self {
        Self {
            key_identifier: Some(key_identifier),
        }
    }
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: self
                .key_identifier
                .as_deref()
                .map(OctetString::new)
                .transpose()?,
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: aki.key_identifier.map(|id| id.as_bytes().to_vec()),
        })
    }
}
