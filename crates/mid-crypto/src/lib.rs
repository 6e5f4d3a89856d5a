//! # mid-crypto: Cryptographic Primitives
//!
//! Provides the building blocks both Merkle tiers share:
//!
//! - **Salts** drawn from the OS CSPRNG, one per commitment.
//! - **Commitments**: `H(canonical_attributes ‖ salt)` for documents and
//!   `H(identity_root ‖ salt)` for registry entries.
//! - **Merkle tree** with self-duplicating padding of odd levels, inclusion
//!   proof derivation, and proof folding.
//! - **Snapshot store**: JSON files replaced atomically (write temp, rename).
//!
//! ## Security Note
//!
//! The commitment scheme is a plain salted SHA-256 hash. It hides attribute
//! values from anyone without the salt and binds the issuer to one opening,
//! but it is not a formally analysed hiding/binding commitment and nothing
//! here is zero-knowledge: a disclosure reveals the disclosed values in the
//! clear.
//!
//! ## Crate Policy
//!
//! - Depends only on `mid-core` internally.
//! - No mocking of cryptographic operations in tests.

pub mod commitment;
pub mod merkle;
pub mod salt;
pub mod store;

pub use commitment::{attribute_commitment, root_commitment};
pub use merkle::{
    decode_path, encode_path, fold_path, hash_pair, verify, MerkleError, MerkleTree, ProofStep, Side,
};
pub use salt::{Salt, SALT_LEN};
pub use store::{read_json, write_json_atomic, SnapshotStore};
