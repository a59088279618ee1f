pub mod extensions;
pub mod params;

use der::asn1::{Any, BitString};
use der::{Decode, Encode, EncodePem, Tag};
use extensions::{BasicConstraints, ToAndFromX509Extension};
use params::{DistinguishedName, ExtensionParam, Validity};
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{PkiError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// PEM label of an X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Signature algorithms this crate signs with.
///
/// Every key is RSA, so the only algorithm is `sha256WithRSAEncryption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRsa,
}

impl SignatureAlgorithm {
    /// The AlgorithmIdentifier carried both inside the TBS body and next to
    /// the signature. RFC 4055 requires explicit NULL parameters.
    pub fn algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        match self {
            SignatureAlgorithm::Sha256WithRsa => Ok(AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::new(Tag::Null, Vec::new())?),
            }),
        }
    }

    pub fn from_algorithm_identifier(id: &AlgorithmIdentifierOwned) -> Result<Self> {
        match id.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            other => Err(PkiError::DecodingError(format!(
                "Unsupported signature algorithm {other}"
            ))),
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to inspect and verify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let block = pem::parse(pem_str)?;
        if block.tag() != CERTIFICATE_LABEL {
            return Err(PkiError::DecodingError(format!(
                "expected a {CERTIFICATE_LABEL} PEM block, found {:?}",
                block.tag()
            )));
        }
        Self::from_der(block.contents())
    }

    /// Decodes the signed body into its parameter form.
    pub fn tbs(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// The `CN` of the subject.
    pub fn common_name(&self) -> Result<String> {
        DistinguishedName::from_x509_name(self.subject()).map(|dn| dn.common_name)
    }

    pub fn validity(&self) -> Validity {
        Validity::from_x509_validity(&self.inner.tbs_certificate.validity)
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// All extensions, in encoded order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509_extension)
            .collect()
    }

    /// The raw extension of type `E`, if present.
    pub fn find_extension<E: ToAndFromX509Extension>(&self) -> Option<ExtensionParam> {
        self.extensions().into_iter().find(|ext| ext.oid == E::OID)
    }

    /// The decoded extension of type `E`, if present.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.find_extension::<E>()
            .map(|ext| ext.to_extension::<E>())
            .transpose()
    }

    /// True when the certificate carries `basicConstraints` with `CA:TRUE`.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn is_self_issued(&self) -> bool {
        self.inner.tbs_certificate.subject == self.inner.tbs_certificate.issuer
    }

    /// Checks the certificate signature against `public_key`.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm != self.inner.tbs_certificate.signature {
            return Err(PkiError::CertificateError(
                "outer and inner signature algorithms differ".to_string(),
            ));
        }
        SignatureAlgorithm::from_algorithm_identifier(&self.inner.signature_algorithm)?;

        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            PkiError::DecodingError("signature bit string has unused bits".to_string())
        })?;
        let tbs_der = self.inner.tbs_certificate.to_der()?;
        public_key.verify(&tbs_der, signature)
    }

    /// Checks that `issuer` is a CA whose subject names this certificate's
    /// issuer and whose key produced this certificate's signature.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<()> {
        if self.inner.tbs_certificate.issuer != issuer.inner.tbs_certificate.subject {
            return Err(PkiError::CertificateError(format!(
                "issuer {} does not match {}",
                self.inner.tbs_certificate.issuer, issuer.inner.tbs_certificate.subject
            )));
        }
        if !issuer.is_ca()? {
            return Err(PkiError::CertificateError(format!(
                "{} is not a certificate authority",
                issuer.inner.tbs_certificate.subject
            )));
        }
        self.verify_signature(&issuer.public_key()?)
    }

    /// Assembles a signed certificate from its body and raw signature.
    pub(crate) fn assemble(tbs_certificate: TbsCertificateInner, signature: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner {
                signature_algorithm: tbs_certificate.signature.clone(),
                tbs_certificate,
                signature: BitString::from_bytes(signature)?,
            },
        })
    }
}

/// A certificate together with the private key of its subject.
#[derive(Debug, Clone)]
pub struct CertifiedKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertifiedKey {
    pub fn cert_pem(&self) -> Result<String> {
        self.cert.to_pem()
    }

    pub fn key_pem(&self) -> Result<String> {
        self.key.to_pkcs1_pem()
    }

    /// Rebuilds a pair from PEM text, e.g. a root written by an earlier run.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let pair = Self {
            cert: Certificate::from_pem(cert_pem)?,
            key: KeyPair::from_pem(key_pem)?,
        };
        pair.ensure_key_matches()?;
        Ok(pair)
    }

    /// Fails unless the private key belongs to the certificate's public key.
    pub fn ensure_key_matches(&self) -> Result<()> {
        if self.cert.public_key()? != *self.key.public_key() {
            return Err(PkiError::InvalidInput(
                "private key does not match the certificate".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Certificate, KeyPair) {
        (self.cert, self.key)
    }
}
