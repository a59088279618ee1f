use std::time::SystemTime;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::{Tag, Tagged};
use der::asn1::{Any, GeneralizedTime, OctetString, SetOfVec, UtcTime};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::time::Time;

use super::extensions::ToAndFromX509Extension;
use crate::error::{PkiError, Result};

/// Subject name of a certificate this crate creates: a single `CN` RDN.
///
/// Issuer names are not built from this type. They are copied verbatim from
/// the issuing certificate's subject, so names with other attributes still
/// chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
}

impl DistinguishedName {
    /// A name holding only `CN=<common_name>`.
    pub fn common_name(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
        }
    }

    /// Converts the distinguished name to an X.509 `Name`.
    pub fn as_x509_name(&self) -> Result<Name> {
        let atv = AttributeTypeAndValue {
            oid: rfc4519::CN,
            value: Any::new(Tag::Utf8String, self.common_name.as_bytes())?,
        };
        let rdn = RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?);
        Ok(RdnSequence(vec![rdn]))
    }

    /// Reads the first common name out of an X.509 `Name`.
    ///
    /// Other attributes are ignored. A name without a `CN` is an error.
    pub fn from_x509_name(x509dn: &Name) -> Result<Self> {
        let value = x509dn
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attr| attr.oid == rfc4519::CN)
            .ok_or_else(|| PkiError::DecodingError(format!("{x509dn} has no common name")))?;
        Ok(Self::common_name(directory_string(&value.value)?))
    }
}

fn directory_string(value: &Any) -> Result<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(value.value())
                .map(str::to_owned)
                .map_err(|e| PkiError::DecodingError(e.to_string()))
        }
        other => Err(PkiError::DecodingError(format!(
            "unsupported directory string tag {other}"
        ))),
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
/// Both instants are kept at whole-second precision, which is all X.509 time
/// encodings carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A window of `lifetime` starting at the current instant.
    ///
    /// Fails when the window would end past what X.509 time can encode.
    pub fn starting_now(lifetime: Duration) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));
        Ok(Self {
            not_before: now,
            not_after: validity_end(now, lifetime)?,
        })
    }

    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Result<Self> {
        let seconds = days.checked_mul(SECONDS_PER_DAY).ok_or_else(|| {
            PkiError::InvalidInput(format!("a validity of {days} days is out of range"))
        })?;
        Self::starting_now(Duration::seconds(seconds))
    }

    /// `not_after - not_before`.
    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub fn from_x509_validity(validity: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }
}

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Last calendar year a GeneralizedTime can carry.
pub const LAST_ENCODABLE_YEAR: i32 = 9999;

/// `start + lifetime`, or an error when that instant is not encodable.
pub fn validity_end(start: OffsetDateTime, lifetime: Duration) -> Result<OffsetDateTime> {
    start
        .checked_add(lifetime)
        .filter(|end| end.year() <= LAST_ENCODABLE_YEAR)
        .ok_or_else(|| {
            PkiError::InvalidInput(format!(
                "a validity of {lifetime} from {start} ends after year {LAST_ENCODABLE_YEAR}"
            ))
        })
}

// RFC 5280 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050 on.
fn to_x509_time(instant: OffsetDateTime) -> Result<Time> {
    let system_time: SystemTime = instant.into();
    if instant.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_system_time(system_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_system_time(
            system_time,
        )?))
    }
}

fn from_x509_time(time: &Time) -> OffsetDateTime {
    match time {
        Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes a typed extension with the given criticality.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        if self.oid != E::OID {
            return Err(PkiError::InvalidInput(format!(
                "extension {} is not {}",
                self.oid,
                E::OID
            )));
        }
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }

    pub fn from_x509_extension(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }
}
