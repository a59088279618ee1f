use std::fmt;

use der::Encode;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{PkiError, Result};

/// PEM label of a PKCS#1 `RSAPrivateKey`.
pub const PKCS1_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label of a PKCS#8 `PrivateKeyInfo`.
pub const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// An RSA key pair. The private half signs certificates; the public half is
/// embedded in the certificate issued for it.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: PublicKey,
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        debug!(bits, "generating RSA key pair");
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| PkiError::KeyGenerationError(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = PublicKey(RsaPublicKey::from(&private));
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.bits()
    }

    /// SHA-1 of the subjectPublicKey bit string, the same value OpenSSL
    /// derives for `subjectKeyIdentifier=hash`.
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        self.public.key_identifier()
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(self.private.as_ref().clone());
        let signature = signing_key.try_sign(data)?;
        Ok(signature.to_vec())
    }

    /// Encodes the private key as a PKCS#1 PEM block (`RSA PRIVATE KEY`).
    pub fn to_pkcs1_pem(&self) -> Result<String> {
        let pem = self
            .private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| PkiError::EncodingError(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    /// Decodes a private key from either a PKCS#1 or a PKCS#8 PEM block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let block = pem::parse(pem_str)?;
        let private = match block.tag() {
            PKCS1_PRIVATE_KEY_LABEL => RsaPrivateKey::from_pkcs1_der(block.contents())?,
            PKCS8_PRIVATE_KEY_LABEL => RsaPrivateKey::from_pkcs8_der(block.contents())?,
            other => {
                return Err(PkiError::DecodingError(format!(
                    "unexpected PEM label {other:?} for an RSA private key"
                )));
            }
        };
        Ok(Self::from_private(private))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// The public half of an RSA key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Wraps the key in a SubjectPublicKeyInfo (rsaEncryption).
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.0.clone())?)
    }

    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let public = RsaPublicKey::from_public_key_der(&der)?;
        Ok(PublicKey(public))
    }

    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.to_spki()?;
        let bits = spki.subject_public_key.raw_bytes();
        Ok(Sha1::digest(bits).to_vec())
    }

    /// Checks an RSASSA-PKCS1-v1_5 / SHA-256 signature made by the matching private key.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)?;
        verifying_key.verify(data, &signature)?;
        Ok(())
    }
}
