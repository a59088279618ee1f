use der::Encode;
use der::flagset::FlagSet;
use tracing::{debug, info};
use x509_cert::name::Name;

use crate::cert::extensions::{KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier};
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, CertifiedKey, SignatureAlgorithm};
use crate::config::PkiConfig;
use crate::error::{PkiError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of signing certificates.
pub trait Issuer {
    /// Returns the name written into the `issuer` field of issued certificates.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Encodes `tbs`, signs the encoding with the issuer's key and returns
    /// the assembled certificate.
    fn sign(&self, tbs: &TbsCertificate) -> Result<Certificate> {
        let tbs_inner = tbs.to_tbs_certificate_inner()?;
        let tbs_der = tbs_inner.to_der()?;
        debug!(subject = %tbs_inner.subject, issuer = %tbs_inner.issuer, "signing certificate");
        let signature = self.signing_key().sign(&tbs_der)?;
        Certificate::assemble(tbs_inner, &signature)
    }
}

impl Issuer for CertifiedKey {
    fn issuer_name(&self) -> Name {
        // copied as encoded, so the leaf's issuer matches byte for byte
        self.cert.subject().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

/// Issues non-CA certificates signed by a root.
///
/// Issuance keeps no state between calls, so one issuer can be shared by
/// any number of threads.
#[derive(Debug, Clone, Default)]
pub struct LeafCertificateIssuer {
    config: PkiConfig,
}

impl LeafCertificateIssuer {
    pub fn new(config: PkiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PkiConfig {
        &self.config
    }

    /// Issues a certificate for `CN=<common_name>` signed by `root`.
    ///
    /// The leaf gets its own fresh key. Its extensions are, in order,
    /// `subjectAltName` (only when `sans` is non-empty), a critical
    /// `keyUsage` of `digitalSignature`, and `subjectKeyIdentifier`.
    pub fn issue_leaf<S: AsRef<str>>(
        &self,
        root: &CertifiedKey,
        common_name: &str,
        sans: &[S],
    ) -> Result<CertifiedKey> {
        if common_name.is_empty() {
            return Err(PkiError::InvalidInput(
                "leaf common name must not be empty".to_string(),
            ));
        }
        root.ensure_key_matches()?;
        if !root.cert.is_ca()? {
            return Err(PkiError::InvalidInput(
                "leaf certificates must be issued by a CA certificate".to_string(),
            ));
        }

        let key = KeyPair::generate_rsa(self.config.key_bits)?;
        let names: Vec<String> = sans.iter().map(|s| s.as_ref().to_owned()).collect();

        let mut extensions = Vec::with_capacity(3);
        if !names.is_empty() {
            let san = SubjectAltName {
                names: names.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }
        let key_usage = KeyUsage(FlagSet::from(KeyUsages::DigitalSignature));
        extensions.push(ExtensionParam::from_extension(&key_usage, true)?);
        let ski = SubjectKeyIdentifier(key.key_identifier()?);
        extensions.push(ExtensionParam::from_extension(&ski, false)?);

        let tbs = TbsCertificate {
            serial_number: self.config.serial_numbers.next_serial(),
            signature_algorithm: SignatureAlgorithm::Sha256WithRsa,
            issuer: root.issuer_name(),
            validity: Validity::starting_now(self.config.validity)?,
            subject: DistinguishedName::common_name(common_name).as_x509_name()?,
            subject_public_key: key.public_key().clone(),
            extensions,
        };

        // signed with the root's key, never the leaf's own
        let cert = root.sign(&tbs)?;
        info!(common_name, sans = ?names, "issued leaf certificate");
        Ok(CertifiedKey { cert, key })
    }
}

/// Issues a leaf with the default parameters. See
/// [`LeafCertificateIssuer::issue_leaf`].
pub fn issue_leaf<S: AsRef<str>>(
    root: &CertifiedKey,
    common_name: &str,
    sans: &[S],
) -> Result<CertifiedKey> {
    LeafCertificateIssuer::default().issue_leaf(root, common_name, sans)
}
