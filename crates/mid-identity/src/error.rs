//! Errors raised by the identity engine.

use mid_core::{CanonicalizationError, DigestError, DocumentId, StorageError};
use mid_crypto::MerkleError;
use thiserror::Error;

/// Identity engine failure.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// An identity needs at least one document.
    #[error("an identity requires at least one document")]
    EmptyDocumentSet,

    /// Two documents in one identity resolved to the same identifier.
    #[error("document identifier {0} appears more than once")]
    DuplicateDocument(DocumentId),

    /// No commitment of this identity opens to the requested disclosure.
    #[error("document {0} not found in the identity")]
    DocumentNotFound(DocumentId),

    /// The attribute subset could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Tree construction or proof derivation failed.
    #[error("merkle tree error: {0}")]
    Merkle(#[from] MerkleError),

    /// A persisted digest or salt was malformed.
    #[error("malformed digest: {0}")]
    Digest(#[from] DigestError),

    /// Reading or writing a snapshot failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A snapshot loaded but is internally inconsistent.
    #[error("identity snapshot integrity check failed: {0}")]
    Integrity(String),
}
