//! # Identity Material
//!
//! The issuer-side secret state of one identity: every document commitment,
//! the opening for each (salt, committed attribute names, document id), and
//! the identity Merkle tree over the commitments in document order.
//!
//! ## Issuance
//!
//! For document `i` with identifier `d`:
//!
//! 1. Select the committed subset: `selective[d]` when given and non-empty,
//!    else every attribute (including `id`).
//! 2. Draw a fresh 32-byte salt.
//! 3. `commitment = H(canonical(subset) ‖ salt)`.
//!
//! The identity root is the root of the tree over all commitments.
//!
//! ## Disclosure
//!
//! A disclosure names a subset of a document's attributes. It only succeeds
//! when that subset is exactly the committed subset of some document, since
//! the commitment is recomputed from the disclosed values.

use std::collections::{BTreeMap, HashMap, HashSet};

use mid_core::{CanonicalBytes, DocumentId, HashDigest};
use mid_crypto::{attribute_commitment, encode_path, MerkleTree, Salt};
use serde::{Deserialize, Serialize};

use crate::disclosure::{decoded_reaches, DisclosureProof};
use crate::document::{
    claimed_id, committed_subset, document_id, select_attributes, Document, SelectiveAttributes,
};
use crate::error::IdentityError;

/// Secret opening of one document commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    /// The commitment salt.
    pub salt: Salt,
    /// Names of the attributes actually committed, sorted.
    pub attributes: Vec<String>,
    /// The document this commitment was issued for.
    pub document_id: DocumentId,
}

/// Commitments, openings, and Merkle tree of one identity.
#[derive(Debug, Clone)]
pub struct IdentityMaterial {
    openings: BTreeMap<HashDigest, Opening>,
    documents: Vec<DocumentId>,
    by_document: HashMap<DocumentId, HashDigest>,
    tree: MerkleTree,
}

impl IdentityMaterial {
    /// Commit to `documents` and build the identity tree.
    pub fn create(
        documents: &[Document],
        selective: &SelectiveAttributes,
    ) -> Result<Self, IdentityError> {
        Self::create_with_salts(documents, selective, Salt::generate)
    }

    /// Issuance with a caller-supplied salt source.
    pub(crate) fn create_with_salts(
        documents: &[Document],
        selective: &SelectiveAttributes,
        mut next_salt: impl FnMut() -> Salt,
    ) -> Result<Self, IdentityError> {
        if documents.is_empty() {
            return Err(IdentityError::EmptyDocumentSet);
        }

        let mut seen = HashSet::with_capacity(documents.len());
        let mut openings = BTreeMap::new();
        let mut leaves = Vec::with_capacity(documents.len());

        for (index, document) in documents.iter().enumerate() {
            let doc_id = document_id(document, index);
            if !seen.insert(doc_id.clone()) {
                return Err(IdentityError::DuplicateDocument(doc_id));
            }

            let subset = committed_subset(document, selective.get(&doc_id).map(Vec::as_slice));
            let canonical = CanonicalBytes::new(&subset)?;
            let salt = next_salt();
            let commitment = attribute_commitment(&canonical, &salt);

            openings.insert(
                commitment,
                Opening {
                    salt,
                    attributes: subset.keys().cloned().collect(),
                    document_id: doc_id,
                },
            );
            leaves.push(commitment);
        }

        let tree = MerkleTree::build(leaves)?;
        let material = Self::from_parts(openings, tree)?;
        tracing::info!(
            root = %material.root(),
            documents = material.documents.len(),
            "identity created"
        );
        Ok(material)
    }

    /// Assemble an identity from openings and a tree over their commitments,
    /// checking that the two agree.
    pub(crate) fn from_parts(
        openings: BTreeMap<HashDigest, Opening>,
        tree: MerkleTree,
    ) -> Result<Self, IdentityError> {
        let mut documents = Vec::with_capacity(tree.leaf_count());
        let mut by_document = HashMap::with_capacity(tree.leaf_count());

        for leaf in tree.leaves() {
            let opening = openings.get(leaf).ok_or_else(|| {
                IdentityError::Integrity(format!("leaf {leaf} has no opening"))
            })?;
            if by_document
                .insert(opening.document_id.clone(), *leaf)
                .is_some()
            {
                return Err(IdentityError::Integrity(format!(
                    "document {} is committed more than once",
                    opening.document_id
                )));
            }
            documents.push(opening.document_id.clone());
        }
        if openings.len() != documents.len() {
            return Err(IdentityError::Integrity(format!(
                "{} openings for {} leaves",
                openings.len(),
                documents.len()
            )));
        }

        Ok(Self {
            openings,
            documents,
            by_document,
            tree,
        })
    }

    /// The identity root.
    pub fn root(&self) -> HashDigest {
        self.tree.root()
    }

    /// Document identifiers in leaf order.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// The identity Merkle tree.
    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Opening of a commitment, if it belongs to this identity.
    pub fn opening(&self, commitment: &HashDigest) -> Option<&Opening> {
        self.openings.get(commitment)
    }

    /// Commitment issued for a document.
    pub fn commitment_of(&self, document_id: &DocumentId) -> Option<HashDigest> {
        self.by_document.get(document_id).copied()
    }

    /// Every commitment with its opening, in leaf order.
    pub fn commitments(&self) -> impl Iterator<Item = (&HashDigest, &Opening)> + '_ {
        self.tree
            .leaves()
            .iter()
            .filter_map(move |leaf| self.openings.get_key_value(leaf))
    }

    pub(crate) fn openings(&self) -> &BTreeMap<HashDigest, Opening> {
        &self.openings
    }

    /// Prove that `attributes` of `document` are committed in this identity.
    ///
    /// The opening indexed by the document's own `id` is tried first, then
    /// every commitment in leaf order.
    pub fn disclosure_proof<S: AsRef<str>>(
        &self,
        document: &Document,
        attributes: &[S],
    ) -> Result<DisclosureProof, IdentityError> {
        let disclosed = select_attributes(document, attributes);
        let canonical = CanonicalBytes::new(&disclosed)?;
        let claimed = claimed_id(document);

        let preferred = claimed.as_ref().and_then(|id| self.commitment_of(id));
        let candidates = preferred
            .iter()
            .chain(self.tree.leaves().iter().filter(|c| Some(**c) != preferred));

        let mut found = None;
        for commitment in candidates {
            if let Some(opening) = self.openings.get(commitment) {
                if attribute_commitment(&canonical, &opening.salt) == *commitment {
                    found = Some((*commitment, opening));
                    break;
                }
            }
        }
        let (commitment, opening) = found.ok_or_else(|| {
            IdentityError::DocumentNotFound(
                claimed.unwrap_or_else(|| DocumentId::from("unknown")),
            )
        })?;

        let path = self.tree.prove(&commitment)?;
        let (path_elements, sides) = encode_path(&path);

        tracing::debug!(
            document = %opening.document_id,
            attributes = disclosed.len(),
            "disclosure proof generated"
        );
        Ok(DisclosureProof {
            merkle_root: self.root().to_hex(),
            disclosed_attributes: disclosed,
            commitment: commitment.to_hex(),
            path_elements,
            path_indices: sides.iter().map(|s| s.as_index()).collect(),
            blinded_salt: opening.salt.blinded().to_hex(),
        })
    }

    /// Full check of a disclosure proof issued by this identity.
    ///
    /// On top of the path check of
    /// [`verify_inclusion`](crate::verify_inclusion), the disclosed
    /// attributes must recompute the commitment under this identity's salt
    /// for it, and the blinded salt must match that salt.
    pub fn verify_disclosure(&self, proof: &DisclosureProof, expected_root: &HashDigest) -> bool {
        let decoded = match proof.decode() {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting malformed disclosure proof");
                return false;
            }
        };
        if !decoded_reaches(&decoded, expected_root) {
            return false;
        }

        let Some(opening) = self.openings.get(&decoded.commitment) else {
            tracing::debug!(commitment = %decoded.commitment, "commitment not issued by this identity");
            return false;
        };
        let recomputed = match CanonicalBytes::new(&proof.disclosed_attributes) {
            Ok(canonical) => attribute_commitment(&canonical, &opening.salt),
            Err(e) => {
                tracing::debug!(error = %e, "disclosed attributes cannot be canonicalized");
                return false;
            }
        };
        if recomputed != decoded.commitment {
            tracing::debug!(commitment = %decoded.commitment, "disclosed attributes do not open the commitment");
            return false;
        }
        if opening.salt.blinded() != decoded.blinded_salt {
            tracing::debug!(commitment = %decoded.commitment, "blinded salt mismatch");
            return false;
        }
        true
    }
}
