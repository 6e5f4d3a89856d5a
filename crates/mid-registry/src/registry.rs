//! # Identity Registry
//!
//! Commits identity roots into an outer Merkle tree. Each leaf is
//! `H(identity_root ‖ salt)` with a fresh salt per registration, so the same
//! identity root registered twice produces two unrelated leaves and the tree
//! reveals nothing about the roots it contains.
//!
//! ## Layout on Disk
//!
//! ```text
//! <storage_dir>/
//!   registry.json           entries, outer salts, outer leaves
//!   identities/<id>.json    one snapshot per registered identity
//! ```
//!
//! ## Concurrency
//!
//! State sits behind a `parking_lot::RwLock`. Registration holds the write
//! lock while it saves the identity, builds the next state, persists it, and
//! swaps it in. A failed registry write removes the identity snapshot it
//! just saved and leaves the in-memory state untouched. Proofs,
//! verification, and listings share the read lock.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use mid_core::{HashDigest, IdentityId, StorageError, Timestamp};
use mid_crypto::{root_commitment, MerkleTree, Salt, SnapshotStore};
use mid_identity::IdentityMaterial;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use crate::entry::{IdentityListing, Metadata, RegistryEntry};
use crate::error::RegistryError;
use crate::proof::{verify_membership_against, RegistryProof};

/// File name of the registry snapshot inside the storage directory.
pub const REGISTRY_FILE: &str = "registry.json";

/// Directory of identity snapshots inside the storage directory.
pub const IDENTITIES_DIR: &str = "identities";

/// Persisted registry state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RegistrySnapshot {
    entries: BTreeMap<HashDigest, RegistryEntry>,
    outer_salts: BTreeMap<HashDigest, Salt>,
    outer_leaves: Vec<HashDigest>,
}

/// In-memory registry state: the snapshot plus what is derived from it.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    snapshot: RegistrySnapshot,
    tree: Option<MerkleTree>,
    by_identity: HashMap<IdentityId, HashDigest>,
}

impl RegistryState {
    /// Derive the outer tree and identity index, checking consistency.
    fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, RegistryError> {
        let leaves = &snapshot.outer_leaves;
        if snapshot.entries.len() != leaves.len() || snapshot.outer_salts.len() != leaves.len() {
            return Err(RegistryError::Integrity(format!(
                "{} leaves, {} entries, {} salts",
                leaves.len(),
                snapshot.entries.len(),
                snapshot.outer_salts.len()
            )));
        }

        let mut by_identity = HashMap::with_capacity(leaves.len());
        for leaf in leaves {
            let entry = snapshot.entries.get(leaf).ok_or_else(|| {
                RegistryError::Integrity(format!("outer leaf {leaf} has no entry"))
            })?;
            let salt = snapshot.outer_salts.get(leaf).ok_or_else(|| {
                RegistryError::Integrity(format!("outer leaf {leaf} has no salt"))
            })?;
            if entry.salt != *salt {
                return Err(RegistryError::Integrity(format!(
                    "entry {} disagrees with its outer salt",
                    entry.identity_id
                )));
            }
            if root_commitment(&entry.identity_root, salt) != *leaf {
                return Err(RegistryError::Integrity(format!(
                    "entry {} does not open outer leaf {leaf}",
                    entry.identity_id
                )));
            }
            if by_identity
                .insert(entry.identity_id.clone(), *leaf)
                .is_some()
            {
                return Err(RegistryError::Integrity(format!(
                    "identity {} is registered more than once",
                    entry.identity_id
                )));
            }
        }

        let tree = if leaves.is_empty() {
            None
        } else {
            Some(MerkleTree::build(leaves.clone())?)
        };
        Ok(Self {
            snapshot,
            tree,
            by_identity,
        })
    }

    pub(crate) fn root(&self) -> Option<HashDigest> {
        self.tree.as_ref().map(MerkleTree::root)
    }

    pub(crate) fn entry(&self, identity_id: &str) -> Option<(HashDigest, &RegistryEntry)> {
        let outer = self.by_identity.get(identity_id)?;
        self.snapshot
            .entries
            .get(outer)
            .map(|entry| (*outer, entry))
    }

    /// Entries in registration order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&HashDigest, &RegistryEntry)> + '_ {
        self.snapshot
            .outer_leaves
            .iter()
            .filter_map(move |leaf| self.snapshot.entries.get_key_value(leaf))
    }

    pub(crate) fn proof_for(&self, identity_id: &str) -> Result<RegistryProof, RegistryError> {
        let (outer, entry) = self
            .entry(identity_id)
            .ok_or_else(|| RegistryError::IdentityNotFound(identity_id.to_string()))?;
        self.proof_for_leaf(&outer, entry)
    }

    pub(crate) fn proof_for_leaf(
        &self,
        outer: &HashDigest,
        entry: &RegistryEntry,
    ) -> Result<RegistryProof, RegistryError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| RegistryError::IdentityNotFound(entry.identity_id.to_string()))?;
        let path = tree.prove(outer)?;
        Ok(RegistryProof::new(
            &entry.identity_root,
            &entry.salt,
            &path,
            &tree.root(),
        ))
    }

    pub(crate) fn verify(&self, identity_root_hex: &str, proof: &RegistryProof) -> bool {
        match self.root() {
            Some(root) => verify_membership_against(identity_root_hex, proof, &root),
            None => {
                tracing::debug!("membership check against an empty registry");
                false
            }
        }
    }

    pub(crate) fn load_identity(
        &self,
        store: &SnapshotStore,
        identity_id: &str,
    ) -> Result<IdentityMaterial, RegistryError> {
        let (_, entry) = self
            .entry(identity_id)
            .ok_or_else(|| RegistryError::IdentityNotFound(identity_id.to_string()))?;
        Ok(IdentityMaterial::load(&store.path_of(&entry.storage_path))?)
    }
}

/// A registry of identity roots persisted under one directory.
#[derive(Debug)]
pub struct IdentityRegistry {
    store: SnapshotStore,
    state: RwLock<RegistryState>,
}

impl IdentityRegistry {
    /// Open the registry in `storage_dir`, creating the directory if needed
    /// and loading any existing snapshot.
    pub fn open(storage_dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let store = SnapshotStore::new(storage_dir);
        fs::create_dir_all(store.root()).map_err(StorageError::from)?;

        let persisted = store
            .read_optional::<RegistrySnapshot>(REGISTRY_FILE)
            .map_err(|e| match e {
                StorageError::Serialization(e) => {
                    tracing::warn!(dir = %store.root().display(), error = %e, "registry snapshot unreadable");
                    RegistryError::Integrity(format!("unreadable registry snapshot: {e}"))
                }
                io => RegistryError::Storage(io),
            })?;
        let state = match persisted {
            Some(snapshot) => RegistryState::from_snapshot(snapshot).map_err(|e| {
                tracing::warn!(dir = %store.root().display(), error = %e, "registry snapshot rejected");
                e
            })?,
            None => RegistryState::default(),
        };
        tracing::info!(
            dir = %store.root().display(),
            identities = state.snapshot.outer_leaves.len(),
            "registry opened"
        );
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    /// Directory the registry persists into.
    pub fn storage_dir(&self) -> &Path {
        self.store.root()
    }

    /// Register `identity` under `identity_id`.
    ///
    /// Saves the identity snapshot, commits its root under a fresh salt,
    /// rebuilds the outer tree, and persists the registry before the new
    /// state becomes visible.
    pub fn register_identity(
        &self,
        identity_id: &str,
        identity: &IdentityMaterial,
        metadata: Metadata,
    ) -> Result<RegistryEntry, RegistryError> {
        let identity_id = IdentityId::new(identity_id)?;
        let mut state = self.state.write();
        if state.by_identity.contains_key(&identity_id) {
            return Err(RegistryError::DuplicateIdentity(identity_id));
        }

        let storage_path = Path::new(IDENTITIES_DIR).join(format!("{identity_id}.json"));
        let identity_file = self.store.path_of(&storage_path);
        identity.save(&identity_file)?;

        let salt = Salt::generate();
        let identity_root = identity.root();
        let outer = root_commitment(&identity_root, &salt);
        let entry = RegistryEntry {
            identity_root,
            identity_id,
            storage_path,
            metadata,
            registered_at: Timestamp::now(),
            salt: salt.clone(),
        };

        let mut next = state.snapshot.clone();
        next.outer_leaves.push(outer);
        next.outer_salts.insert(outer, salt);
        next.entries.insert(outer, entry.clone());
        let committed = RegistryState::from_snapshot(next).and_then(|next| {
            self.store.write(REGISTRY_FILE, &next.snapshot)?;
            Ok(next)
        });
        let next = match committed {
            Ok(next) => next,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&identity_file) {
                    tracing::warn!(
                        path = %identity_file.display(),
                        error = %cleanup,
                        "failed to remove identity snapshot of aborted registration"
                    );
                }
                return Err(e);
            }
        };
        *state = next;

        tracing::info!(
            identity = %entry.identity_id,
            identity_root = %entry.identity_root,
            registry_root = ?state.root().map(|r| r.to_hex()),
            "identity registered"
        );
        Ok(entry)
    }

    /// The current registry root, `None` while nothing is registered.
    pub fn registry_root(&self) -> Option<HashDigest> {
        self.state.read().root()
    }

    /// Membership proof for a registered identity.
    pub fn prove_membership(&self, identity_id: &str) -> Result<RegistryProof, RegistryError> {
        self.state.read().proof_for(identity_id)
    }

    /// Check a membership proof against the live registry root.
    ///
    /// The proof's embedded `registry_root` is ignored. Use
    /// [`verify_membership_against`] to check against a pinned root.
    pub fn verify_membership(&self, identity_root_hex: &str, proof: &RegistryProof) -> bool {
        self.state.read().verify(identity_root_hex, proof)
    }

    /// Load a registered identity from its snapshot.
    pub fn get_identity(&self, identity_id: &str) -> Result<IdentityMaterial, RegistryError> {
        self.state.read().load_identity(&self.store, identity_id)
    }

    /// Entry of a registered identity.
    pub fn entry(&self, identity_id: &str) -> Option<RegistryEntry> {
        self.state
            .read()
            .entry(identity_id)
            .map(|(_, entry)| entry.clone())
    }

    /// All registered identities in registration order.
    pub fn list_identities(&self) -> Vec<IdentityListing> {
        self.state
            .read()
            .entries()
            .map(|(_, entry)| IdentityListing::from(entry))
            .collect()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.state.read().snapshot.outer_leaves.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mid_identity::{Document, SelectiveAttributes};
    use serde_json::{json, Value};

    fn identity(name: &str) -> IdentityMaterial {
        let doc = match json!({"id": "passport", "name": name, "nationality": "Canada"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let docs: Vec<Document> = vec![doc];
        IdentityMaterial::create(&docs, &SelectiveAttributes::new()).unwrap()
    }

    fn metadata(country: &str) -> Metadata {
        match json!({"type": "individual", "country": country}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_registry_has_no_root() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.registry_root(), None);
        assert!(registry.list_identities().is_empty());
    }

    #[test]
    fn register_persists_identity_and_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let jane = identity("Jane Smith");
        let entry = registry
            .register_identity("jane", &jane, metadata("CA"))
            .unwrap();

        assert_eq!(entry.identity_root, jane.root());
        assert_eq!(entry.storage_path, Path::new("identities/jane.json"));
        assert!(dir.path().join("identities/jane.json").is_file());
        assert!(dir.path().join(REGISTRY_FILE).is_file());
        assert_eq!(
            registry.registry_root(),
            Some(root_commitment(&jane.root(), &entry.salt))
        );
    }

    #[test]
    fn failed_registry_write_removes_identity_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join(format!("{REGISTRY_FILE}.tmp"))).unwrap();

        let result = registry.register_identity("jane", &identity("Jane Smith"), Metadata::new());
        assert!(matches!(result, Err(RegistryError::Storage(_))));
        assert!(!dir.path().join("identities/jane.json").exists());
        assert!(registry.is_empty());
        assert!(!dir.path().join(REGISTRY_FILE).exists());
    }

    #[test]
    fn invalid_and_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        assert!(matches!(
            registry.register_identity("../escape", &identity("A"), Metadata::new()),
            Err(RegistryError::InvalidId(_))
        ));
        registry
            .register_identity("alex", &identity("A"), Metadata::new())
            .unwrap();
        assert!(matches!(
            registry.register_identity("alex", &identity("B"), Metadata::new()),
            Err(RegistryError::DuplicateIdentity(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_identity_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        assert!(matches!(
            registry.prove_membership("nobody"),
            Err(RegistryError::IdentityNotFound(_))
        ));
        assert!(matches!(
            registry.get_identity("nobody"),
            Err(RegistryError::IdentityNotFound(_))
        ));
        assert!(registry.entry("nobody").is_none());
    }

    #[test]
    fn proof_verifies_against_live_root_only() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let jane = identity("Jane");
        registry
            .register_identity("jane", &jane, Metadata::new())
            .unwrap();
        let proof = registry.prove_membership("jane").unwrap();
        assert!(registry.verify_membership(&jane.root().to_hex(), &proof));

        registry
            .register_identity("alex", &identity("Alex"), Metadata::new())
            .unwrap();
        assert!(!registry.verify_membership(&jane.root().to_hex(), &proof));
        let fresh = registry.prove_membership("jane").unwrap();
        assert!(registry.verify_membership(&jane.root().to_hex(), &fresh));
    }

    #[test]
    fn empty_registry_rejects_every_proof() {
        let dir = tempfile::tempdir().unwrap();
        let populated = IdentityRegistry::open(dir.path().join("a")).unwrap();
        let jane = identity("Jane");
        populated
            .register_identity("jane", &jane, Metadata::new())
            .unwrap();
        let proof = populated.prove_membership("jane").unwrap();

        let empty = IdentityRegistry::open(dir.path().join("b")).unwrap();
        assert!(!empty.verify_membership(&jane.root().to_hex(), &proof));
    }

    #[test]
    fn listing_in_registration_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        for name in ["zed", "amy", "moe"] {
            registry
                .register_identity(name, &identity(name), metadata("ZM"))
                .unwrap();
        }
        let ids: Vec<String> = registry
            .list_identities()
            .into_iter()
            .map(|l| l.id.to_string())
            .collect();
        assert_eq!(ids, ["zed", "amy", "moe"]);
        assert_eq!(registry.list_identities()[0].metadata["country"], "ZM");
    }

    #[test]
    fn get_identity_reloads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let jane = identity("Jane");
        registry
            .register_identity("jane", &jane, Metadata::new())
            .unwrap();
        assert_eq!(registry.get_identity("jane").unwrap().root(), jane.root());
    }

    #[test]
    fn listing_contains_no_salt() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let entry = registry
            .register_identity("jane", &identity("Jane"), Metadata::new())
            .unwrap();
        let rendered = serde_json::to_string(&registry.list_identities()).unwrap();
        assert!(!rendered.contains(&entry.salt.to_hex()));
    }
}
