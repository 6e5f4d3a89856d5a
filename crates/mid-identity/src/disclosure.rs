//! # Selective-Disclosure Proofs
//!
//! A [`DisclosureProof`] reveals a chosen subset of one document's attributes
//! together with the commitment they open and the Merkle path from that
//! commitment to the identity root.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "merkle_root": "<hex>",
//!   "disclosed_attributes": { "name": "Jane Smith" },
//!   "commitment": "<hex>",
//!   "path_elements": ["<hex>", ...],
//!   "path_indices": [1, 0, ...],
//!   "blinded_salt": "<hex>"
//! }
//! ```
//!
//! `path_indices[i]` is `1` when the sibling at step `i` sits on the right
//! and `0` when it sits on the left. `blinded_salt` is `H(salt)`; the salt
//! itself is never part of a disclosure.
//!
//! Proof fields are kept as received. Decoding happens at verification time
//! and any malformed field makes the proof invalid rather than erroring.

use mid_core::{DigestError, HashDigest};
use mid_crypto::merkle::{decode_path, fold_path, ProofStep, Side};
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A selective-disclosure proof for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureProof {
    /// Identity root the proof claims to reach.
    pub merkle_root: String,
    /// The revealed attributes, exactly as committed.
    pub disclosed_attributes: Document,
    /// The document commitment (Merkle leaf).
    pub commitment: String,
    /// Sibling digests from the leaf upward.
    pub path_elements: Vec<String>,
    /// Sibling sides: `1` right, `0` left.
    pub path_indices: Vec<u8>,
    /// `H(salt)` of the commitment's salt.
    pub blinded_salt: String,
}

/// Decoded digest fields of a [`DisclosureProof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedDisclosure {
    pub merkle_root: HashDigest,
    pub commitment: HashDigest,
    pub path: Vec<ProofStep>,
    pub blinded_salt: HashDigest,
}

impl DisclosureProof {
    /// Parse every digest field and the path.
    pub(crate) fn decode(&self) -> Result<DecodedDisclosure, DigestError> {
        let sides = self
            .path_indices
            .iter()
            .map(|&index| Side::from_index(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodedDisclosure {
            merkle_root: HashDigest::from_hex(&self.merkle_root)?,
            commitment: HashDigest::from_hex(&self.commitment)?,
            path: decode_path(&self.path_elements, &sides)?,
            blinded_salt: HashDigest::from_hex(&self.blinded_salt)?,
        })
    }
}

/// Path-only check of a disclosure proof against `expected_root`.
///
/// The proof's own `merkle_root` must equal `expected_root`, and folding the
/// path from `commitment` must reach it. This does not tie
/// `disclosed_attributes` to the commitment; use
/// [`IdentityMaterial::verify_disclosure`](crate::IdentityMaterial::verify_disclosure)
/// for that.
pub fn verify_inclusion(proof: &DisclosureProof, expected_root: &HashDigest) -> bool {
    match proof.decode() {
        Ok(decoded) => decoded_reaches(&decoded, expected_root),
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed disclosure proof");
            false
        }
    }
}

pub(crate) fn decoded_reaches(decoded: &DecodedDisclosure, expected_root: &HashDigest) -> bool {
    if decoded.merkle_root != *expected_root {
        tracing::debug!(
            claimed = %decoded.merkle_root,
            expected = %expected_root,
            "disclosure proof names a different root"
        );
        return false;
    }
    fold_path(decoded.commitment, &decoded.path) == *expected_root
}
