//! # devpki - A Throwaway Local PKI
//!
//! devpki bootstraps the certificates a local or development deployment needs
//! for TLS between its services, without a real certificate authority. One run
//! creates a self-signed root CA and uses it to issue a fixed set of service
//! certificates, each written next to its private key as a PEM pair.
//!
//! Everything is built with the RustCrypto crates: RSA keys come from `rsa`,
//! certificates are assembled with `x509-cert` and `der`, and signatures are
//! RSASSA-PKCS1-v1_5 over SHA-256.
//!
//! ## Fixed Parameters
//!
//! - **Keys**: RSA, 2048 bits, fresh for every certificate
//! - **Validity**: 730 days from the instant each certificate is built
//! - **Root**: `CN=ManageIQ CA`, `basicConstraints CA:TRUE`, `keyUsage keyCertSign, cRLSign`
//! - **Leaves**: `keyUsage digitalSignature`, plus a `subjectAltName` when DNS names are given
//!
//! All of them live in [`config::PkiConfig`] and can be overridden.
//!
//! ## Quick Start
//!
//! ### Creating a Root and Issuing a Leaf
//!
//! ```rust,no_run
//! use devpki::authority::create_root;
//! use devpki::issuer::issue_leaf;
//!
//! # fn main() -> Result<(), devpki::error::PkiError> {
//! let root = create_root()?;
//! let api = issue_leaf(&root, "api", &["svc.example.com"])?;
//!
//! api.cert.verify_issued_by(&root.cert)?;
//! println!("{}", api.cert_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Generating and Writing the Whole Bundle
//!
//! ```rust,no_run
//! use devpki::bundle::generate_bundle;
//! use devpki::config::PkiConfig;
//!
//! # fn main() -> Result<(), devpki::error::PkiError> {
//! let bundle = generate_bundle(&PkiConfig::default(), "svc.example.com")?;
//! bundle.write_to(std::path::Path::new("certs"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`authority`]: Root CA creation
//! - [`issuer`]: The signing seam and leaf issuance
//! - [`bundle`]: The fixed service set, concurrent issuance and PEM output
//! - [`cert`]: Certificate encoding, inspection and verification
//! - [`key`]: RSA key generation, signing and PEM import/export
//! - [`config`]: Fixed parameters and their overrides
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate body construction

pub mod authority;
pub mod bundle;
pub mod cert;
pub mod config;
pub mod error;
pub mod issuer;
pub mod key;
pub mod tbs_certificate;
