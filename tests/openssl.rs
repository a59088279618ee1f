mod util;

use devpki::cert::CertifiedKey;
use devpki::issuer::LeafCertificateIssuer;
use devpki::issuer::issue_leaf;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::rsa::Rsa;
use openssl::pkey::PKey;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509NameBuilder};
use regex::Regex;
use std::cmp::Ordering;

fn common_name(name: &openssl::x509::X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_root_is_self_signed_ca() {
    let root = util::generate_root();
    let x509 = util::to_openssl(&root);

    assert_eq!(common_name(x509.subject_name()), "ManageIQ CA");
    assert_eq!(
        x509.subject_name().try_cmp(x509.issuer_name()).unwrap(),
        Ordering::Equal
    );
    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
    assert!(x509.verify(&x509.public_key().unwrap()).unwrap());
    assert_eq!(x509.public_key().unwrap().bits(), 2048);

    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), "0", "Serial number should be 0");

    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    let text = util::openssl_text(&x509);
    let basic_constraints = Regex::new(r"X509v3 Basic Constraints: critical\s+CA:TRUE").unwrap();
    assert!(basic_constraints.is_match(&text), "{text}");
    let key_usage =
        Regex::new(r"X509v3 Key Usage: critical\s+Certificate Sign, CRL Sign").unwrap();
    assert!(key_usage.is_match(&text), "{text}");

    let ski = x509.subject_key_id().expect("root has a subject key identifier");
    let aki = x509.authority_key_id().expect("root has an authority key identifier");
    assert_eq!(ski.as_slice(), aki.as_slice());
    assert_eq!(ski.as_slice(), root.key.key_identifier().unwrap().as_slice());
}

#[test]
fn test_openssl_leaf_chains_to_root() {
    let root = util::generate_root();
    let leaf = issue_leaf(&root, "api", &[util::DOMAIN]).unwrap();

    let root_x509 = util::to_openssl(&root);
    let leaf_x509 = util::to_openssl(&leaf);

    assert_eq!(common_name(leaf_x509.subject_name()), "api");
    assert_eq!(
        leaf_x509
            .issuer_name()
            .try_cmp(root_x509.subject_name())
            .unwrap(),
        Ordering::Equal
    );
    assert!(leaf_x509.verify(&root_x509.public_key().unwrap()).unwrap());
    assert!(!leaf_x509.verify(&leaf_x509.public_key().unwrap()).unwrap());
    assert!(util::openssl_chain_verifies(&root_x509, &leaf_x509));

    let sans: Vec<String> = leaf_x509
        .subject_alt_names()
        .expect("leaf has a subjectAltName")
        .iter()
        .map(|name| name.dnsname().unwrap().to_string())
        .collect();
    assert_eq!(sans, vec![util::DOMAIN.to_string()]);

    let text = util::openssl_text(&leaf_x509);
    assert!(!text.contains("Basic Constraints"), "{text}");
    let key_usage = Regex::new(r"X509v3 Key Usage: critical\s+Digital Signature\s").unwrap();
    assert!(key_usage.is_match(&text), "{text}");
    assert!(!text.contains("X509v3 Subject Alternative Name: critical"));
}

#[test]
fn test_openssl_leaf_without_sans() {
    let root = util::generate_root();
    let leaf = issue_leaf::<&str>(&root, "postgresql", &[]).unwrap();
    let leaf_x509 = util::to_openssl(&leaf);

    assert!(leaf_x509.subject_alt_names().is_none());
    assert!(util::openssl_chain_verifies(&util::to_openssl(&root), &leaf_x509));
}

#[test]
fn test_openssl_rejects_leaf_against_foreign_root() {
    let root = util::generate_root();
    let other_root = util::generate_root();
    let leaf = issue_leaf::<&str>(&root, "kafka", &[]).unwrap();

    assert!(!util::openssl_chain_verifies(
        &util::to_openssl(&other_root),
        &util::to_openssl(&leaf)
    ));
}

#[test]
fn test_openssl_validity_is_730_days() {
    let root = util::generate_root();
    let leaf = LeafCertificateIssuer::default()
        .issue_leaf::<&str>(&root, "memcached", &[])
        .unwrap();

    for x509 in [util::to_openssl(&root), util::to_openssl(&leaf)] {
        let diff = x509.not_before().diff(x509.not_after()).unwrap();
        assert_eq!(diff.days, 730);
        assert_eq!(diff.secs, 0);
    }
}

#[test]
fn test_openssl_reads_private_key() {
    let root = util::generate_root();
    let leaf = issue_leaf(&root, "ui", &[util::DOMAIN]).unwrap();

    let rsa = Rsa::private_key_from_pem(leaf.key_pem().unwrap().as_bytes()).unwrap();
    assert!(rsa.check_key().unwrap());
    assert_eq!(rsa.size() * 8, 2048);

    let pkey = PKey::from_rsa(rsa).unwrap();
    assert!(pkey.public_eq(&util::to_openssl(&leaf).public_key().unwrap()));
}

#[test]
fn test_leaf_issued_from_openssl_built_root() {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "Foreign CA").unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(3650).unwrap()).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let root_x509 = builder.build();

    let cert_pem = String::from_utf8(root_x509.to_pem().unwrap()).unwrap();
    let key_pem = String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap();
    let root = CertifiedKey::from_pem(&cert_pem, &key_pem).unwrap();

    let leaf = issue_leaf(&root, "api", &[util::DOMAIN]).unwrap();
    assert_eq!(leaf.cert.issuer(), root.cert.subject());
    leaf.cert.verify_issued_by(&root.cert).unwrap();

    let leaf_x509 = util::to_openssl(&leaf);
    assert_eq!(
        leaf_x509.issuer_name().try_cmp(root_x509.subject_name()).unwrap(),
        Ordering::Equal
    );
    assert!(util::openssl_chain_verifies(&root_x509, &leaf_x509));
}
