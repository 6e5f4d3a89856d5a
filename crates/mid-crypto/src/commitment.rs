//! # Salted Commitments
//!
//! Both tiers commit with the same construction, `H(payload ‖ salt)`:
//!
//! - **Attribute commitment**: payload is the canonical JSON of the
//!   committed attribute subset. These are the leaves of an identity tree.
//! - **Root commitment**: payload is a 32-byte identity root. These are the
//!   leaves of the registry tree, so the outer tree never exposes raw
//!   identity roots.
//!
//! A commitment opens only with its exact salt and exact payload.

use mid_core::{sha256_concat, CanonicalBytes, HashDigest};

use crate::salt::Salt;

/// `H(canonical(attributes) ‖ salt)`.
pub fn attribute_commitment(attributes: &CanonicalBytes, salt: &Salt) -> HashDigest {
    sha256_concat(&[attributes.as_bytes(), salt.as_bytes()])
}

/// `H(identity_root ‖ salt)`.
pub fn root_commitment(identity_root: &HashDigest, salt: &Salt) -> HashDigest {
    sha256_concat(&[identity_root.as_bytes(), salt.as_bytes()])
}
