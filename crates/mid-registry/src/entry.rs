//! Registry entries and the public listing view of them.

use std::path::PathBuf;

use mid_core::{HashDigest, IdentityId, Timestamp};
use mid_crypto::Salt;
use serde::{Deserialize, Serialize};

/// Free-form registration metadata (subject type, country, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One registered identity, keyed in the registry by its outer commitment
/// `H(identity_root ‖ salt)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Root of the registered identity tree.
    pub identity_root: HashDigest,
    /// Registry-level identifier.
    pub identity_id: IdentityId,
    /// Identity snapshot location, relative to the registry directory.
    pub storage_path: PathBuf,
    /// Registration metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// When the identity was registered.
    pub registered_at: Timestamp,
    /// Salt of the outer commitment.
    pub salt: Salt,
}

/// What `list_identities` reports for each entry. No salts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityListing {
    /// Registry-level identifier.
    pub id: IdentityId,
    /// When the identity was registered.
    pub registered_at: Timestamp,
    /// Registration metadata.
    pub metadata: Metadata,
    /// Root of the registered identity tree.
    pub identity_root: HashDigest,
}

impl From<&RegistryEntry> for IdentityListing {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            id: entry.identity_id.clone(),
            registered_at: entry.registered_at,
            metadata: entry.metadata.clone(),
            identity_root: entry.identity_root,
        }
    }
}
