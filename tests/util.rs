#![allow(dead_code)]

use devpki::authority::RootAuthorityFactory;
use devpki::cert::CertifiedKey;
use devpki::config::PkiConfig;
use openssl::stack::Stack;
use openssl::x509::X509;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509StoreContext;

pub const DOMAIN: &str = "svc.example.com";

pub fn generate_root() -> CertifiedKey {
    RootAuthorityFactory::new(PkiConfig::default())
        .unwrap()
        .create_root()
        .unwrap()
}

/// Parses a certificate with OpenSSL rather than this crate.
pub fn to_openssl(pair: &CertifiedKey) -> X509 {
    X509::from_pem(pair.cert_pem().unwrap().as_bytes()).expect("OpenSSL failed to parse PEM")
}

/// Runs OpenSSL's chain verification of `leaf` against the single trusted `root`.
pub fn openssl_chain_verifies(root: &X509, leaf: &X509) -> bool {
    let mut builder = X509StoreBuilder::new().unwrap();
    builder.add_cert(root.clone()).unwrap();
    let store = builder.build();

    let chain = Stack::new().unwrap();
    let mut context = X509StoreContext::new().unwrap();
    context
        .init(&store, leaf, &chain, |ctx| ctx.verify_cert())
        .unwrap()
}

pub fn openssl_text(cert: &X509) -> String {
    String::from_utf8(cert.to_text().unwrap()).unwrap()
}
