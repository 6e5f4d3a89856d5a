//! # mid-core: Foundational Types for the Merkle Identity Registry
//!
//! Every other crate in the workspace depends on `mid-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every attribute commitment is computed
//!    over bytes produced by `CanonicalBytes::new()`. Two holders of the same
//!    attribute subset always hash the same byte sequence, regardless of map
//!    insertion order.
//!
//! 2. **`HashDigest` for every node.** Commitments, Merkle nodes, identity
//!    roots, and registry roots share one fixed-size type. On the wire it is
//!    always 64 lowercase hex characters.
//!
//! 3. **Validated identifiers.** `IdentityId` names a snapshot file on disk,
//!    so it is a newtype with a checked constructor. `DocumentId` is a plain
//!    newtype that keeps document and identity namespaces apart.
//!
//! 4. **UTC-only timestamps.** Registration times are `Timestamp`s with a
//!    `Z` suffix and seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mid-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{decode_hex_array, sha256_concat, HashDigest, DIGEST_LEN};
pub use error::{CanonicalizationError, DigestError, IdError, StorageError, TimestampError};
pub use identity::{DocumentId, IdentityId};
pub use temporal::Timestamp;
