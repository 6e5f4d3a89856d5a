//! # mid-identity: Identity Engine
//!
//! Turns a set of identity documents into salted commitments, builds the
//! identity Merkle tree over them, and produces and checks selective
//! disclosures.
//!
//! - **Material** (`material.rs`): issuance, openings, disclosure proof
//!   generation, and the full disclosure check.
//! - **Disclosure** (`disclosure.rs`): the proof wire type and the path-only
//!   inclusion check.
//! - **Package** (`package.rs`): the holder's [`UserPackage`] (with offline
//!   disclosure) and the salt-free [`IdentitySummary`].
//! - **Snapshot** (`snapshot.rs`): atomic save and integrity-checked load.
//!
//! ## Security Invariant
//!
//! Salts leave an [`IdentityMaterial`] only inside a snapshot or a user
//! package. Disclosure proofs carry `H(salt)`, summaries carry nothing.

pub mod disclosure;
pub mod document;
pub mod error;
pub mod material;
pub mod package;
pub mod snapshot;

pub use disclosure::{verify_inclusion, DisclosureProof};
pub use document::{document_id, Document, SelectiveAttributes};
pub use error::IdentityError;
pub use material::{IdentityMaterial, Opening};
pub use package::{
    DocumentSummary, IdentitySummary, MerklePath, PackagedDocument, UserPackage, PACKAGE_VERSION,
};
