//! # mid-registry: Registry Engine and Verifier
//!
//! The second tier of the scheme. Identity roots produced by
//! `mid-identity` are committed under fresh salts into an outer Merkle
//! tree, so a verifier can confirm that an identity root is registered
//! without learning which other identities exist.
//!
//! - **Registry** (`registry.rs`): registration, registry root, membership
//!   proofs, live-root membership checks, identity retrieval, listings.
//! - **Proof** (`proof.rs`): the registry proof wire type and the check
//!   against a caller-pinned root.
//! - **Verifier** (`verifier.rs`): composes registry membership with
//!   selective disclosure.
//!
//! ## Trust Anchor
//!
//! [`IdentityRegistry::verify_membership`] always checks against the live
//! registry root. Offline verifiers holding a published root use
//! [`verify_membership_against`].

pub mod entry;
pub mod error;
pub mod proof;
pub mod registry;
pub mod verifier;

pub use entry::{IdentityListing, Metadata, RegistryEntry};
pub use error::RegistryError;
pub use proof::{verify_membership_against, RegistryProof};
pub use registry::{IdentityRegistry, IDENTITIES_DIR, REGISTRY_FILE};
pub use verifier::{
    verify_document_disclosure, verify_user_package, DisclosureVerification, PackageClaim,
    PackageVerification, VerificationFailure,
};
