//! Errors raised by the registry engine.

use mid_core::{IdError, IdentityId, StorageError};
use mid_crypto::MerkleError;
use mid_identity::IdentityError;
use thiserror::Error;

/// Registry engine failure.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No identity is registered under this id.
    #[error("identity {0} not found in registry")]
    IdentityNotFound(String),

    /// An identity is already registered under this id.
    #[error("identity {0} is already registered")]
    DuplicateIdentity(IdentityId),

    /// The identity id cannot be used as a registry key.
    #[error("invalid identity id: {0}")]
    InvalidId(#[from] IdError),

    /// Saving or loading a registered identity failed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Registry tree construction or proof derivation failed.
    #[error("merkle tree error: {0}")]
    Merkle(#[from] MerkleError),

    /// Reading or writing the registry snapshot failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The registry snapshot loaded but is internally inconsistent.
    #[error("registry integrity check failed: {0}")]
    Integrity(String),
}
