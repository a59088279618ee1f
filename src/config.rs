//! Fixed cryptographic parameters and the knobs that override them.

use bon::Builder;
use rand_core::{OsRng, RngCore};
use time::{Duration, OffsetDateTime};

use crate::cert::params::validity_end;
use crate::error::{PkiError, Result};

/// Modulus size of every generated RSA key.
pub const RSA_KEY_BITS: usize = 2048;

/// Lifetime of every certificate, root and leaf alike.
pub const VALIDITY_DAYS: i64 = 2 * 365;

/// Largest validity override, in days, that still fits a `time::Duration`
/// with room to spare. Windows this long end past year 9999 and are rejected
/// by [`PkiConfig::validate`] anyway.
pub const MAX_VALIDITY_DAYS: i64 = 3_000_000;

/// Common name of the self-signed root.
pub const CA_COMMON_NAME: &str = "ManageIQ CA";

/// Directory the CLI writes into when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "certs";

/// File stem of the root pair in the output directory.
pub const ROOT_FILE_STEM: &str = "root";

/// How certificate serial numbers are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerialNumberPolicy {
    /// Every certificate carries serial `0`.
    #[default]
    Zero,
    /// A fresh positive 128-bit random serial per certificate.
    Random,
}

impl SerialNumberPolicy {
    /// Big-endian serial bytes for the next certificate.
    pub fn next_serial(&self) -> Vec<u8> {
        match self {
            SerialNumberPolicy::Zero => vec![0],
            SerialNumberPolicy::Random => {
                let mut serial = vec![0u8; 16];
                OsRng.fill_bytes(&mut serial);
                // positive, and no leading zero octet to strip
                serial[0] = (serial[0] & 0x7f) | 0x01;
                serial
            }
        }
    }
}

/// Parameters shared by root creation and leaf issuance.
///
/// `PkiConfig::default()` yields the hard-coded parameters above; tests
/// override `validity` rather than waiting on the clock.
#[derive(Debug, Clone, Builder)]
pub struct PkiConfig {
    #[builder(into, default = CA_COMMON_NAME.to_string())]
    pub ca_common_name: String,
    #[builder(default = RSA_KEY_BITS)]
    pub key_bits: usize,
    #[builder(default = Duration::days(VALIDITY_DAYS))]
    pub validity: Duration,
    #[builder(default)]
    pub serial_numbers: SerialNumberPolicy,
}

impl Default for PkiConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PkiConfig {
    /// Rejects parameters that would produce an unusable PKI.
    pub fn validate(&self) -> Result<()> {
        if self.ca_common_name.trim().is_empty() {
            return Err(PkiError::InvalidInput(
                "CA common name must not be empty".to_string(),
            ));
        }
        if self.key_bits < RSA_KEY_BITS {
            return Err(PkiError::InvalidInput(format!(
                "RSA keys must be at least {RSA_KEY_BITS} bits, got {}",
                self.key_bits
            )));
        }
        if !self.validity.is_positive() {
            return Err(PkiError::InvalidInput(format!(
                "validity must be positive, got {}",
                self.validity
            )));
        }
        validity_end(OffsetDateTime::now_utc(), self.validity)?;
        Ok(())
    }
}
