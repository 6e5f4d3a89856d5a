//! # Identity Snapshots
//!
//! An identity is persisted as one JSON document:
//!
//! ```json
//! {
//!   "openings": { "<commitment hex>": { "salt": "<hex>", "attributes": [..], "document_id": ".." } },
//!   "tree": [["<leaf hex>", ..], .., ["<root hex>"]]
//! }
//! ```
//!
//! Loading rebuilds the tree from its leaves and compares every persisted
//! node. Unparseable JSON, any disagreement, or a leaf without an opening
//! is an integrity error; nothing is repaired. A missing or unreadable file
//! stays a storage error.

use std::collections::BTreeMap;
use std::path::Path;

use mid_core::{HashDigest, StorageError};
use mid_crypto::store::{read_json, write_json_atomic};
use mid_crypto::{MerkleError, MerkleTree};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::material::{IdentityMaterial, Opening};

#[derive(Debug, Serialize, Deserialize)]
struct IdentitySnapshot {
    openings: BTreeMap<HashDigest, Opening>,
    tree: Vec<Vec<HashDigest>>,
}

impl IdentityMaterial {
    /// Persist the identity atomically to `path`.
    pub fn save(&self, path: &Path) -> Result<(), IdentityError> {
        let snapshot = IdentitySnapshot {
            openings: self.openings().clone(),
            tree: self.tree().levels().to_vec(),
        };
        write_json_atomic(path, &snapshot)?;
        tracing::info!(path = %path.display(), root = %self.root(), "identity saved");
        Ok(())
    }

    /// Load and integrity-check an identity snapshot.
    pub fn load(path: &Path) -> Result<Self, IdentityError> {
        let snapshot: IdentitySnapshot = read_json(path).map_err(|e| match e {
            StorageError::Serialization(e) => {
                tracing::warn!(path = %path.display(), error = %e, "identity snapshot unreadable");
                IdentityError::Integrity(format!("unreadable identity snapshot: {e}"))
            }
            io => IdentityError::Storage(io),
        })?;
        let tree = MerkleTree::from_levels(snapshot.tree).map_err(|e| match e {
            MerkleError::EmptyInput
            | MerkleError::LevelCountMismatch { .. }
            | MerkleError::StructureMismatch { .. } => {
                tracing::warn!(path = %path.display(), error = %e, "identity snapshot rejected");
                IdentityError::Integrity(e.to_string())
            }
            other => IdentityError::Merkle(other),
        })?;
        let material = Self::from_parts(snapshot.openings, tree).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "identity snapshot rejected");
            e
        })?;
        tracing::debug!(path = %path.display(), root = %material.root(), "identity loaded");
        Ok(material)
    }
}
