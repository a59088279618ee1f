mod util;

use devpki::bundle::{Bundle, DOMAIN_SERVICES, INTERNAL_SERVICES, generate_bundle};
use devpki::cert::extensions::{BasicConstraints, SubjectAltName};
use devpki::cert::{Certificate, CertifiedKey};
use devpki::config::{PkiConfig, SerialNumberPolicy};
use devpki::error::PkiError;
use devpki::key::KeyPair;
use std::fs;
use tempfile::TempDir;
use time::Duration;

fn bundle() -> Bundle {
    generate_bundle(&PkiConfig::default(), util::DOMAIN).unwrap()
}

/// Every leaf chains to the root, carries a 2048-bit key and lives 730 days.
#[test]
fn generated_bundle_satisfies_chain_properties() {
    let bundle = bundle();
    let root = &bundle.root;

    assert_eq!(root.cert.subject(), root.cert.issuer());
    assert!(root.cert.verify_signature(&root.cert.public_key().unwrap()).is_ok());
    assert_eq!(root.cert.validity().duration(), Duration::days(730));
    assert_eq!(root.key.bits(), 2048);

    assert_eq!(bundle.leaves.len(), 7);
    for leaf in &bundle.leaves {
        let cert = &leaf.pair.cert;
        assert_eq!(cert.issuer(), root.cert.subject());
        assert!(cert.verify_signature(root.key.public_key()).is_ok());
        assert!(cert.verify_signature(leaf.pair.key.public_key()).is_err());
        assert!(cert.find_extension::<BasicConstraints>().is_none());
        assert_eq!(cert.validity().duration(), Duration::days(730));
        assert_eq!(leaf.pair.key.bits(), 2048);
        assert_eq!(cert.common_name().unwrap(), leaf.identity.name);
    }
}

#[test]
fn subject_alt_names_follow_the_plan() {
    let bundle = bundle();

    for name in INTERNAL_SERVICES {
        let leaf = bundle.leaf(name).unwrap();
        assert!(leaf.cert.extension::<SubjectAltName>().unwrap().is_none(), "{name}");
    }
    for name in DOMAIN_SERVICES {
        let leaf = bundle.leaf(name).unwrap();
        let san = leaf.cert.extension::<SubjectAltName>().unwrap().unwrap();
        assert_eq!(san.names, vec![util::DOMAIN.to_string()], "{name}");
    }
}

#[test]
fn two_runs_never_produce_identical_output() {
    let first = util::generate_root();
    let second = util::generate_root();
    assert_ne!(first.key.public_key(), second.key.public_key());
    assert_ne!(first.cert.to_der().unwrap(), second.cert.to_der().unwrap());
    assert_ne!(first.key_pem().unwrap(), second.key_pem().unwrap());
}

#[test]
fn written_bundle_reads_back_and_chains() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("certs");

    let bundle = bundle();
    let written = bundle.write_to(&out).unwrap();
    assert_eq!(written.len(), 16);

    let read = |stem: &str| {
        CertifiedKey::from_pem(
            &fs::read_to_string(out.join(format!("{stem}.crt"))).unwrap(),
            &fs::read_to_string(out.join(format!("{stem}.key"))).unwrap(),
        )
        .unwrap()
    };

    let root = read("root");
    assert_eq!(root.cert, bundle.root.cert);

    let api = read("api");
    api.cert.verify_issued_by(&root.cert).unwrap();
    let san = api.cert.extension::<SubjectAltName>().unwrap().unwrap();
    assert_eq!(san.names, vec![util::DOMAIN.to_string()]);
    assert_eq!(api.cert.issuer().to_string(), "CN=ManageIQ CA");

    for name in INTERNAL_SERVICES.into_iter().chain(DOMAIN_SERVICES) {
        read(name).cert.verify_issued_by(&root.cert).unwrap();
    }
}

#[cfg(unix)]
#[test]
fn private_keys_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    bundle().write_to(dir.path()).unwrap();

    let key_mode = fs::metadata(dir.path().join("root.key")).unwrap().permissions().mode();
    assert_eq!(key_mode & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn rewritten_private_keys_are_tightened_to_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let stale_key = dir.path().join("api.key");
    fs::write(&stale_key, b"stale").unwrap();
    fs::set_permissions(&stale_key, fs::Permissions::from_mode(0o644)).unwrap();

    let bundle = bundle();
    bundle.write_to(dir.path()).unwrap();

    let key_mode = fs::metadata(&stale_key).unwrap().permissions().mode();
    assert_eq!(key_mode & 0o777, 0o600);
    assert_eq!(
        fs::read_to_string(&stale_key).unwrap(),
        bundle.leaf("api").unwrap().key_pem().unwrap()
    );
}

#[test]
fn write_fails_when_target_is_a_file() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("certs");
    fs::write(&blocker, b"not a directory").unwrap();

    let err = bundle().write_to(&blocker).unwrap_err();
    assert!(matches!(err, PkiError::Io { .. }));
}

#[test]
fn empty_domain_generates_nothing() {
    let err = generate_bundle(&PkiConfig::default(), "").unwrap_err();
    assert!(matches!(err, PkiError::InvalidInput(_)));
}

#[test]
fn random_serials_are_unique_per_certificate() {
    let config = PkiConfig::builder()
        .serial_numbers(SerialNumberPolicy::Random)
        .build();
    let bundle = generate_bundle(&config, util::DOMAIN).unwrap();

    let mut serials: Vec<Vec<u8>> = bundle
        .leaves
        .iter()
        .map(|leaf| leaf.pair.cert.serial_number().to_vec())
        .collect();
    serials.push(bundle.root.cert.serial_number().to_vec());
    serials.sort();
    serials.dedup();
    assert_eq!(serials.len(), 8);
}

#[test]
fn tampered_certificate_fails_verification() {
    let bundle = bundle();
    let api = bundle.leaf("api").unwrap();

    let mut der = api.cert.to_der().unwrap();
    let last = der.len() - 1;
    der[last] ^= 0x01;
    let tampered = Certificate::from_der(&der).unwrap();
    assert!(matches!(
        tampered.verify_issued_by(&bundle.root.cert),
        Err(PkiError::SignatureError(_))
    ));
}

#[test]
fn mismatched_pem_pair_is_rejected() {
    let bundle = bundle();
    let api = bundle.leaf("api").unwrap();
    let stranger = KeyPair::generate_rsa(2048).unwrap();

    let err = CertifiedKey::from_pem(
        &api.cert_pem().unwrap(),
        &stranger.to_pkcs1_pem().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, PkiError::InvalidInput(_)));
}
