//! # Commitment Salts
//!
//! A `Salt` is 32 bytes from the operating system's CSPRNG. A new salt is
//! drawn for every commitment and never reused.
//!
//! Salts appear in hex only in secret-bearing artifacts (identity and
//! registry snapshots, user packages, registry proofs). Everywhere else the
//! salt is represented by its blinded form `H(salt)`. `Debug` output is
//! redacted so salts do not leak into logs.

use std::fmt;

use mid_core::{decode_hex_array, sha256_concat, DigestError, HashDigest};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Byte length of a salt.
pub const SALT_LEN: usize = 32;

/// A per-commitment random salt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the OS random number generator.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap known salt bytes (tests, fixtures).
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex salt.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        decode_hex_array(s).map(Self)
    }

    /// Raw salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// Lowercase hex rendering. Only for secret-bearing artifacts.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `H(salt)`: lets a verifier bind a disclosure to its origin without
    /// learning the salt.
    pub fn blinded(&self) -> HashDigest {
        sha256_concat(&[&self.0])
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(<redacted>)")
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
