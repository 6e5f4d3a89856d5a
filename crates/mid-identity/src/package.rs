//! # User Packages and Summaries
//!
//! Two exports of an identity:
//!
//! - [`UserPackage`]: everything the holder needs to produce disclosures
//!   offline. It contains salts and must be treated as a secret; encrypting
//!   it for transport is the caller's concern.
//! - [`IdentitySummary`]: a human-readable projection listing each
//!   document's commitment and committed attribute names. It never contains
//!   salts.

use std::collections::BTreeMap;

use mid_core::{CanonicalBytes, DocumentId, HashDigest};
use mid_crypto::{attribute_commitment, encode_path, Salt};
use serde::{Deserialize, Serialize};

use crate::disclosure::DisclosureProof;
use crate::document::{claimed_id, select_attributes, Document};
use crate::error::IdentityError;
use crate::material::IdentityMaterial;

/// Format version written into every user package.
pub const PACKAGE_VERSION: &str = "1.0";

/// Merkle path of one document commitment in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// Sibling digests from the leaf upward.
    pub path_elements: Vec<HashDigest>,
    /// Sibling sides: `1` right, `0` left.
    pub path_indices: Vec<u8>,
}

/// Holder-side material for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedDocument {
    /// The document commitment.
    pub commitment: HashDigest,
    /// The commitment salt.
    pub salt: Salt,
    /// Names of the committed attributes.
    pub committed_attributes: Vec<String>,
    /// Path from the commitment to the identity root.
    pub merkle_proof: MerklePath,
}

/// Everything a holder needs to disclose attributes of their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPackage {
    /// Package format version, currently `"1.0"`.
    pub version: String,
    /// The identity root.
    pub merkle_root: HashDigest,
    /// Per-document material keyed by document id.
    pub documents: BTreeMap<DocumentId, PackagedDocument>,
}

impl UserPackage {
    /// Material for one document.
    pub fn document(&self, id: &DocumentId) -> Option<&PackagedDocument> {
        self.documents.get(id)
    }

    /// Produce a disclosure proof from the package alone.
    ///
    /// Gives the same proof the issuing engine would for the same document
    /// and attribute names.
    pub fn disclosure_proof<S: AsRef<str>>(
        &self,
        document: &Document,
        attributes: &[S],
    ) -> Result<DisclosureProof, IdentityError> {
        let disclosed = select_attributes(document, attributes);
        let canonical = CanonicalBytes::new(&disclosed)?;
        let claimed = claimed_id(document);

        let preferred = claimed.as_ref().and_then(|id| self.documents.get(id));
        let found = preferred
            .into_iter()
            .chain(self.documents.values())
            .find(|entry| attribute_commitment(&canonical, &entry.salt) == entry.commitment)
            .ok_or_else(|| {
                IdentityError::DocumentNotFound(
                    claimed.clone().unwrap_or_else(|| DocumentId::from("unknown")),
                )
            })?;

        Ok(DisclosureProof {
            merkle_root: self.merkle_root.to_hex(),
            disclosed_attributes: disclosed,
            commitment: found.commitment.to_hex(),
            path_elements: found
                .merkle_proof
                .path_elements
                .iter()
                .map(HashDigest::to_hex)
                .collect(),
            path_indices: found.merkle_proof.path_indices.clone(),
            blinded_salt: found.salt.blinded().to_hex(),
        })
    }
}

/// Summary line for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// The document commitment.
    pub commitment: HashDigest,
    /// Names of the committed attributes.
    pub attributes: Vec<String>,
    /// Whether the issuer holds the salt for this commitment.
    pub has_salt: bool,
}

/// Human-readable view of an identity. Contains no salts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    /// The identity root.
    pub merkle_root: HashDigest,
    /// Per-document summary keyed by document id.
    pub documents: BTreeMap<DocumentId, DocumentSummary>,
}

impl IdentityMaterial {
    /// Export the holder package.
    pub fn export_package(&self) -> Result<UserPackage, IdentityError> {
        let mut documents = BTreeMap::new();
        for (index, (commitment, opening)) in self.commitments().enumerate() {
            let path = self.tree().prove_index(index)?;
            let (_, sides) = encode_path(&path);
            documents.insert(
                opening.document_id.clone(),
                PackagedDocument {
                    commitment: *commitment,
                    salt: opening.salt.clone(),
                    committed_attributes: opening.attributes.clone(),
                    merkle_proof: MerklePath {
                        path_elements: path.iter().map(|step| step.sibling).collect(),
                        path_indices: sides.iter().map(|s| s.as_index()).collect(),
                    },
                },
            );
        }
        Ok(UserPackage {
            version: PACKAGE_VERSION.to_string(),
            merkle_root: self.root(),
            documents,
        })
    }

    /// Export the salt-free summary.
    pub fn summary(&self) -> IdentitySummary {
        let documents = self
            .openings()
            .iter()
            .map(|(commitment, opening)| {
                (
                    opening.document_id.clone(),
                    DocumentSummary {
                        commitment: *commitment,
                        attributes: opening.attributes.clone(),
                        has_salt: true,
                    },
                )
            })
            .collect();
        IdentitySummary {
            merkle_root: self.root(),
            documents,
        }
    }
}
