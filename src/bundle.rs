//! The fixed set of service identities, bundle generation, and PEM output.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info};

use crate::authority::RootAuthorityFactory;
use crate::cert::CertifiedKey;
use crate::config::{PkiConfig, ROOT_FILE_STEM};
use crate::error::{PkiError, Result};
use crate::issuer::LeafCertificateIssuer;

/// Services whose certificates carry no subjectAltName.
pub const INTERNAL_SERVICES: [&str; 4] = ["httpd", "kafka", "memcached", "postgresql"];

/// Services reachable under the application domain.
pub const DOMAIN_SERVICES: [&str; 3] = ["api", "remote-console", "ui"];

/// One leaf to issue: its common name doubles as its output file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub name: String,
    pub sans: Vec<String>,
}

/// The leaves issued for `domain`, in issuance order.
pub fn issuance_plan(domain: &str) -> Result<Vec<ServiceIdentity>> {
    if domain.is_empty() {
        return Err(PkiError::InvalidInput(
            "application domain must not be empty".to_string(),
        ));
    }

    let internal = INTERNAL_SERVICES.iter().map(|name| ServiceIdentity {
        name: name.to_string(),
        sans: Vec::new(),
    });
    let external = DOMAIN_SERVICES.iter().map(|name| ServiceIdentity {
        name: name.to_string(),
        sans: vec![domain.to_string()],
    });
    Ok(internal.chain(external).collect())
}

/// A leaf together with the identity it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedLeaf {
    pub identity: ServiceIdentity,
    pub pair: CertifiedKey,
}

/// The root and every leaf of one generation run.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub root: CertifiedKey,
    pub leaves: Vec<IssuedLeaf>,
}

/// Creates the root, then issues every leaf of [`issuance_plan`].
///
/// Leaves are issued on scoped threads sharing the root by reference; the
/// returned leaves keep plan order. The first failure aborts the run.
pub fn generate_bundle(config: &PkiConfig, domain: &str) -> Result<Bundle> {
    let plan = issuance_plan(domain)?;
    let root = RootAuthorityFactory::new(config.clone())?.create_root()?;
    let issuer = LeafCertificateIssuer::new(config.clone())?;

    let leaves = thread::scope(|scope| {
        let handles: Vec<_> = plan
            .into_iter()
            .map(|identity| {
                let (root, issuer) = (&root, &issuer);
                scope.spawn(move || -> Result<IssuedLeaf> {
                    let pair = issuer.issue_leaf(root, &identity.name, &identity.sans)?;
                    Ok(IssuedLeaf { identity, pair })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().map_err(|_| {
                    PkiError::CertificateError("leaf issuance thread panicked".to_string())
                })?
            })
            .collect::<Result<Vec<_>>>()
    })?;

    info!(leaves = leaves.len(), domain, "generated certificate bundle");
    Ok(Bundle { root, leaves })
}

impl Bundle {
    pub fn leaf(&self, name: &str) -> Option<&CertifiedKey> {
        self.leaves
            .iter()
            .find(|leaf| leaf.identity.name == name)
            .map(|leaf| &leaf.pair)
    }

    /// Checks the root signature and every leaf's chain to the root.
    pub fn verify(&self) -> Result<()> {
        self.root.cert.verify_issued_by(&self.root.cert)?;
        for leaf in &self.leaves {
            leaf.pair.cert.verify_issued_by(&self.root.cert)?;
        }
        Ok(())
    }

    /// Writes `root.{crt,key}` and `<name>.{crt,key}` for every leaf into
    /// `dir`, creating it if needed. Returns the written paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|source| PkiError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = write_pem_pair(dir, ROOT_FILE_STEM, &self.root)?;
        for leaf in &self.leaves {
            written.extend(write_pem_pair(dir, &leaf.identity.name, &leaf.pair)?);
        }
        info!(dir = %dir.display(), files = written.len(), "wrote certificate bundle");
        Ok(written)
    }
}

/// Writes `<stem>.crt` and `<stem>.key` into `dir`.
pub fn write_pem_pair(dir: &Path, stem: &str, pair: &CertifiedKey) -> Result<Vec<PathBuf>> {
    let cert_path = dir.join(format!("{stem}.crt"));
    let key_path = dir.join(format!("{stem}.key"));

    write_file(&cert_path, pair.cert_pem()?.as_bytes(), false)?;
    write_file(&key_path, pair.key_pem()?.as_bytes(), true)?;
    debug!(cert = %cert_path.display(), key = %key_path.display(), "wrote PEM pair");

    Ok(vec![cert_path, key_path])
}

fn write_file(path: &Path, contents: &[u8], private: bool) -> Result<()> {
    let io_err = |source: std::io::Error| PkiError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }

    let mut file = options.open(path).map_err(io_err)?;
    // the mode above only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    file.write_all(contents).map_err(io_err)
}
