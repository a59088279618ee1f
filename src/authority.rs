//! Creation of the self-signed root certificate authority.

use tracing::info;
use x509_cert::name::Name;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, KeyUsages, SubjectKeyIdentifier,
};
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::{CertifiedKey, SignatureAlgorithm};
use crate::config::PkiConfig;
use crate::error::Result;
use crate::issuer::Issuer;
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

// Signs with the key of the certificate being built.
struct SelfIssuer<'a> {
    name: &'a Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// Builds the root CA every leaf chains to.
#[derive(Debug, Clone, Default)]
pub struct RootAuthorityFactory {
    config: PkiConfig,
}

impl RootAuthorityFactory {
    pub fn new(config: PkiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PkiConfig {
        &self.config
    }

    /// Generates a fresh key and a self-signed v3 CA certificate for it.
    ///
    /// Extensions, in order: `basicConstraints CA:TRUE` (critical),
    /// `keyUsage keyCertSign, cRLSign` (critical), `subjectKeyIdentifier`,
    /// and an `authorityKeyIdentifier` carrying that same key identifier.
    pub fn create_root(&self) -> Result<CertifiedKey> {
        let key = KeyPair::generate_rsa(self.config.key_bits)?;
        let subject =
            DistinguishedName::common_name(self.config.ca_common_name.as_str()).as_x509_name()?;
        let key_id = key.key_identifier()?;

        let basic_constraints = BasicConstraints {
            is_ca: true,
            max_path_length: None,
        };
        let key_usage = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
        let extensions = vec![
            ExtensionParam::from_extension(&basic_constraints, true)?,
            ExtensionParam::from_extension(&key_usage, true)?,
            ExtensionParam::from_extension(&SubjectKeyIdentifier(key_id.clone()), false)?,
            ExtensionParam::from_extension(
                &AuthorityKeyIdentifier::from_key_identifier(key_id),
                false,
            )?,
        ];

        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: &subject,
            key: &key,
        };
        let tbs = TbsCertificate {
            serial_number: self.config.serial_numbers.next_serial(),
            signature_algorithm: SignatureAlgorithm::Sha256WithRsa,
            issuer: self_issuer.issuer_name(),
            validity: Validity::starting_now(self.config.validity)?,
            subject: subject.clone(),
            subject_public_key: key.public_key().clone(),
            extensions,
        };
        let cert = self_issuer.sign(&tbs)?;

        info!(%subject, "created root certificate authority");
        Ok(CertifiedKey { cert, key })
    }
}

/// Creates a root with the default parameters. See
/// [`RootAuthorityFactory::create_root`].
pub fn create_root() -> Result<CertifiedKey> {
    RootAuthorityFactory::default().create_root()
}
