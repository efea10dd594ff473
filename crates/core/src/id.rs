//! Strongly-typed identifiers used across the job queue.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Identifier of a persisted job. Stable across migrations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(JobId, "JobId");

/// Prefix marking a phone-number identity in string form.
const PNI_PREFIX: &str = "PNI:";

/// Leading byte marking a phone-number identity in binary form.
const PNI_TAG: u8 = 0x01;

/// Identity of an account on the messaging service.
///
/// An ACI is the account's primary identity; a PNI is the identity bound to
/// its phone number. Both wrap a UUID but encode differently:
///
/// | kind | string form     | binary form              |
/// |------|-----------------|--------------------------|
/// | ACI  | `<uuid>`        | 16 raw UUID bytes        |
/// | PNI  | `PNI:<uuid>`    | `0x01` + 16 raw bytes    |
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceId {
    Aci(Uuid),
    Pni(Uuid),
}

impl ServiceId {
    pub fn uuid(&self) -> Uuid {
        match self {
            ServiceId::Aci(uuid) | ServiceId::Pni(uuid) => *uuid,
        }
    }

    pub fn is_pni(&self) -> bool {
        matches!(self, ServiceId::Pni(_))
    }

    /// Fixed-length binary form (16 bytes for ACI, 17 for PNI).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ServiceId::Aci(uuid) => uuid.as_bytes().to_vec(),
            ServiceId::Pni(uuid) => {
                let mut out = Vec::with_capacity(17);
                out.push(PNI_TAG);
                out.extend_from_slice(uuid.as_bytes());
                out
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        match bytes {
            [PNI_TAG, rest @ ..] if rest.len() == 16 => Uuid::from_slice(rest)
                .map(ServiceId::Pni)
                .map_err(|e| DomainError::invalid_id(format!("ServiceId: {e}"))),
            _ if bytes.len() == 16 => Uuid::from_slice(bytes)
                .map(ServiceId::Aci)
                .map_err(|e| DomainError::invalid_id(format!("ServiceId: {e}"))),
            _ => Err(DomainError::invalid_id(format!(
                "ServiceId: unexpected length {}",
                bytes.len()
            ))),
        }
    }
}

impl ValueObject for ServiceId {}

impl core::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ServiceId::Aci(uuid) => core::fmt::Display::fmt(uuid, f),
            ServiceId::Pni(uuid) => write!(f, "{PNI_PREFIX}{uuid}"),
        }
    }
}

impl FromStr for ServiceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw, pni) = match s.strip_prefix(PNI_PREFIX) {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let uuid = Uuid::from_str(raw)
            .map_err(|e| DomainError::invalid_id(format!("ServiceId '{s}': {e}")))?;
        Ok(if pni {
            ServiceId::Pni(uuid)
        } else {
            ServiceId::Aci(uuid)
        })
    }
}

impl TryFrom<String> for ServiceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceId> for String {
    fn from(value: ServiceId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACI: &str = "9d0652a3-dcc3-4d11-975f-74d61598733f";

    #[test]
    fn bare_uuid_parses_as_aci() {
        let id: ServiceId = ACI.parse().unwrap();
        assert_eq!(id, ServiceId::Aci(Uuid::parse_str(ACI).unwrap()));
        assert_eq!(id.to_string(), ACI);
        assert_eq!(id.to_bytes().len(), 16);
    }

    #[test]
    fn prefixed_uuid_parses_as_pni() {
        let raw = format!("PNI:{ACI}");
        let id: ServiceId = raw.parse().unwrap();
        assert!(id.is_pni());
        assert_eq!(id.to_string(), raw);

        let bytes = id.to_bytes();
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(ServiceId::from_bytes(&bytes).unwrap(), id);
    }

    #[test]
    fn aci_bytes_round_trip() {
        let id: ServiceId = ACI.parse().unwrap();
        assert_eq!(ServiceId::from_bytes(&id.to_bytes()).unwrap(), id);
    }

    #[test]
    fn malformed_strings_are_rejected() {
        for bad in ["", "not-a-uuid", "PNI:", "PNI:xyz", "ACI:9d0652a3"] {
            let err = bad.parse::<ServiceId>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidId(_)), "{bad}");
        }
    }

    #[test]
    fn wrong_length_bytes_are_rejected() {
        assert!(ServiceId::from_bytes(&[0u8; 15]).is_err());
        assert!(ServiceId::from_bytes(&[0x02; 17]).is_err());
        assert!(ServiceId::from_bytes(&[]).is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let id: ServiceId = format!("PNI:{ACI}").parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"PNI:{ACI}\""));
        let back: ServiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn job_id_parse_error_names_the_type() {
        let err = "nope".parse::<JobId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("JobId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
