//! # Registry Membership Proofs
//!
//! A [`RegistryProof`] shows that an identity root is committed in the
//! registry tree. It carries the outer salt, so it is only handed to the
//! identity's holder.
//!
//! ```json
//! {
//!   "identity_root": "<hex>",
//!   "salt": "<hex>",
//!   "path_elements": ["<hex>", ...],
//!   "path_positions": ["left", "right", ...],
//!   "registry_root": "<hex>"
//! }
//! ```
//!
//! `registry_root` records the root the proof was generated against. It is
//! informational: verification always uses a root chosen by the verifier.

use mid_core::{DigestError, HashDigest};
use mid_crypto::merkle::{decode_path, fold_path, ProofStep, Side};
use mid_crypto::{root_commitment, Salt};
use serde::{Deserialize, Serialize};

/// Membership proof of one identity root in the registry tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryProof {
    /// Root of the identity tree.
    pub identity_root: String,
    /// Outer commitment salt.
    pub salt: String,
    /// Sibling digests from the outer leaf upward.
    pub path_elements: Vec<String>,
    /// Sibling sides, `"left"` or `"right"`.
    pub path_positions: Vec<String>,
    /// Registry root at generation time.
    pub registry_root: String,
}

impl RegistryProof {
    /// Wire-form proof from decoded parts.
    pub fn new(
        identity_root: &HashDigest,
        salt: &Salt,
        path: &[ProofStep],
        registry_root: &HashDigest,
    ) -> Self {
        Self {
            identity_root: identity_root.to_hex(),
            salt: salt.to_hex(),
            path_elements: path.iter().map(|s| s.sibling.to_hex()).collect(),
            path_positions: path.iter().map(|s| s.side.as_str().to_string()).collect(),
            registry_root: registry_root.to_hex(),
        }
    }

    fn decode_path(&self) -> Result<(Salt, Vec<ProofStep>), DigestError> {
        let sides = self
            .path_positions
            .iter()
            .map(|p| p.parse::<Side>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((
            Salt::from_hex(&self.salt)?,
            decode_path(&self.path_elements, &sides)?,
        ))
    }
}

/// Check that `identity_root_hex`, committed under the proof's salt and
/// folded along its path, reaches `registry_root`.
///
/// The proof's own `identity_root` and `registry_root` fields are not used.
/// Malformed input yields `false`.
pub fn verify_membership_against(
    identity_root_hex: &str,
    proof: &RegistryProof,
    registry_root: &HashDigest,
) -> bool {
    let decoded = HashDigest::from_hex(identity_root_hex)
        .and_then(|root| proof.decode_path().map(|(salt, path)| (root, salt, path)));
    match decoded {
        Ok((identity_root, salt, path)) => {
            fold_path(root_commitment(&identity_root, &salt), &path) == *registry_root
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed registry proof");
            false
        }
    }
}
