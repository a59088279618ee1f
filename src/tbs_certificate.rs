use der::Encode;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{ExtensionParam, Validity};
use crate::error::Result;
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial number bytes.
/// * `signature_algorithm` - The algorithm the issuer signs with.
/// * `issuer` - The issuer's name, exactly as it appears as the subject of the
///   issuing certificate.
/// * `validity` - The `notBefore`/`notAfter` window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509v3 extensions, in emission order.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a version 3 `TbsCertificateInner`.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial_number)?,
            signature: self.signature_algorithm.algorithm_identifier()?,
            issuer: self.issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Creates a `TbsCertificate` from a `TbsCertificateInner`.
    pub fn from_tbs_certificate_inner(inner: &TbsCertificateInner) -> Result<Self> {
        let extensions = inner
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509_extension)
            .collect();

        Ok(Self {
            serial_number: inner.serial_number.as_bytes().to_vec(),
            signature_algorithm: SignatureAlgorithm::from_algorithm_identifier(&inner.signature)?,
            issuer: inner.issuer.clone(),
            validity: Validity::from_x509_validity(&inner.validity),
            subject: inner.subject.clone(),
            subject_public_key: PublicKey::from_spki(&inner.subject_public_key_info)?,
            extensions,
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}
