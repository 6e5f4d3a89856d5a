//! # Hash Digests
//!
//! `HashDigest` is the single node type of both Merkle tiers: document
//! commitments, internal nodes, identity roots, outer commitments, and the
//! registry root are all 32-byte SHA-256 outputs.
//!
//! ## Wire Format
//!
//! Serialized as 64 lowercase hex characters. Deserialization accepts upper
//! case and surrounding whitespace, and rejects everything else with a
//! [`DigestError`]. Because it serializes as a string, a `HashDigest` can be
//! used directly as a JSON map key in snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::DigestError;

/// Byte length of every digest in the system.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashDigest([u8; DIGEST_LEN]);

impl HashDigest {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    ///
    /// # Errors
    ///
    /// [`DigestError::InvalidHex`] for non-hex input, [`DigestError::InvalidLength`]
    /// when the decoded value is not 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        decode_hex_array(s).map(Self)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for HashDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self.to_hex())
    }
}

impl FromStr for HashDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for HashDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Decode a hex string into a fixed-size byte array.
///
/// Shared by digests and salts; both are 32 bytes on the wire.
pub fn decode_hex_array<const N: usize>(s: &str) -> Result<[u8; N], DigestError> {
    let bytes = hex::decode(s.trim()).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| DigestError::InvalidLength {
        expected: N,
        actual,
    })
}

/// SHA-256 over the concatenation of `parts`.
///
/// This is the one hash of the protocol: `H(left ‖ right)` for Merkle nodes,
/// `H(canonical ‖ salt)` for document commitments, `H(root ‖ salt)` for
/// registry commitments, `H(salt)` for blinded salts.
pub fn sha256_concat(parts: &[&[u8]]) -> HashDigest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    HashDigest(out)
}
