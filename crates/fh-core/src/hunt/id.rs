//! Hunt identifiers and their generation.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of random bytes in a generated identifier.
pub const HUNT_ID_RANDOM_BYTES: usize = 8;

/// Error returned when a string is not a valid hunt identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid hunt id '{0}': expected 'H.' followed by [A-Za-z0-9_-]")]
pub struct InvalidHuntId(pub String);

/// A globally unique hunt identifier such as `H.5d2f0c1e9ab34f70`.
///
/// The value is restricted to a path-safe alphabet because it becomes part of
/// the hunt's storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HuntId(String);

impl HuntId {
    /// Prefix shared by every hunt identifier.
    pub const PREFIX: &'static str = "H.";

    /// Builds an identifier from raw random bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HuntId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HuntId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for HuntId {
    type Err = InvalidHuntId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s
            .strip_prefix(Self::PREFIX)
            .is_some_and(|rest| {
                !rest.is_empty()
                    && rest
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            });
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidHuntId(s.to_string()))
        }
    }
}

impl TryFrom<String> for HuntId {
    type Error = InvalidHuntId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HuntId> for String {
    fn from(id: HuntId) -> Self {
        id.0
    }
}

/// Produces new hunt identifiers.
pub trait HuntIdGenerator: Send + Sync + 'static {
    /// Returns a fresh identifier.
    fn generate(&self) -> HuntId;
}

/// Generates identifiers from the operating system CSPRNG.
///
/// Identifiers carry 64 random bits and nothing derived from time, so they
/// neither collide at fleet scale nor reveal creation order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHuntIdGenerator;

impl HuntIdGenerator for RandomHuntIdGenerator {
    fn generate(&self) -> HuntId {
        let mut bytes = [0u8; HUNT_ID_RANDOM_BYTES];
        OsRng.fill_bytes(&mut bytes);
        HuntId::from_bytes(&bytes)
    }
}
