//! Deployment salts

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length in bytes of a [`Salt`].
pub const SALT_LEN: usize = 32;

/// A fixed-width digest keying one deterministic deployment.
///
/// Besides the factory's own identity, the salt is the sole input to
/// address prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub const fn new(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; SALT_LEN] {
        self.0
    }
}

impl From<[u8; SALT_LEN]> for Salt {
    fn from(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Failure to parse a [`Salt`] from its hex form.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseSaltError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {SALT_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Salt {
    type Err = ParseSaltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseSaltError::InvalidHex(e.to_string()))?;
        let bytes: [u8; SALT_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ParseSaltError::InvalidLength(b.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct SaltVisitor;

impl Visitor<'_> for SaltVisitor {
    type Value = Salt;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {SALT_LEN}-byte hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(SaltVisitor)
    }
}
