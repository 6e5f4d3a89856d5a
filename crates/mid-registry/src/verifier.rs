//! # Verifier
//!
//! Composes the two tiers:
//!
//! 1. **Package check**: is this identity root registered, and does the
//!    membership proof fold to the live registry root?
//! 2. **Disclosure check**: is the disclosure's identity root registered,
//!    and does the disclosure open a commitment of that registered identity?
//!
//! Each check runs under one read guard of the registry, so it observes a
//! single registry state.

use std::fmt;

use mid_core::{HashDigest, IdentityId};
use mid_identity::{DisclosureProof, Document, UserPackage};
use serde::{Deserialize, Serialize};

use crate::entry::Metadata;
use crate::error::RegistryError;
use crate::proof::RegistryProof;
use crate::registry::{IdentityRegistry, RegistryState};

/// Why a verification came back invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// No registered identity has this root.
    NotRegistered,
    /// The claimed root is not a digest.
    Malformed,
    /// The membership proof does not reach the registry root.
    MembershipInvalid,
    /// The disclosure does not open a commitment of the identity.
    DisclosureInvalid,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotRegistered => "identity not found in registry",
            Self::Malformed => "malformed identity root",
            Self::MembershipInvalid => "registry membership proof is invalid",
            Self::DisclosureInvalid => "document disclosure is invalid",
        })
    }
}

/// What a holder presents to have their identity root checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageClaim {
    /// Claimed identity root, hex.
    pub merkle_root: String,
    /// Membership proof. When absent the verifier builds one from the
    /// registry itself.
    #[serde(default)]
    pub proof: Option<RegistryProof>,
}

impl PackageClaim {
    /// Claim for a user package with a holder-supplied proof.
    pub fn new(package: &UserPackage, proof: Option<RegistryProof>) -> Self {
        Self {
            merkle_root: package.merkle_root.to_hex(),
            proof,
        }
    }
}

/// Outcome of [`verify_user_package`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVerification {
    /// Whether the identity root is a registry member.
    pub valid: bool,
    /// Failure reason when invalid.
    pub reason: Option<VerificationFailure>,
    /// Identity registered under the root, when one was found.
    pub identity_id: Option<IdentityId>,
    /// Registration metadata, when an identity was found.
    pub metadata: Option<Metadata>,
    /// The proof that verified, when valid.
    pub registry_proof: Option<RegistryProof>,
}

impl PackageVerification {
    fn rejected(reason: VerificationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            identity_id: None,
            metadata: None,
            registry_proof: None,
        }
    }
}

/// Outcome of [`verify_document_disclosure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureVerification {
    /// Whether the disclosure is valid and its identity registered.
    pub valid: bool,
    /// Failure reason when invalid.
    pub reason: Option<VerificationFailure>,
    /// Identity the disclosure belongs to, when one was found.
    pub identity_id: Option<IdentityId>,
    /// The attributes the disclosure reveals.
    pub disclosed_attributes: Document,
}

/// Check that a claimed identity root is registered.
pub fn verify_user_package(registry: &IdentityRegistry, claim: &PackageClaim) -> PackageVerification {
    let state = registry.read_state();
    check_package(&state, claim)
}

fn check_package(state: &RegistryState, claim: &PackageClaim) -> PackageVerification {
    let Ok(root) = HashDigest::from_hex(&claim.merkle_root) else {
        tracing::debug!(root = %claim.merkle_root, "claimed root is not a digest");
        return PackageVerification::rejected(VerificationFailure::Malformed);
    };
    let Some((outer, entry)) = state.entries().find(|(_, e)| e.identity_root == root) else {
        tracing::debug!(root = %root, "claimed root is not registered");
        return PackageVerification::rejected(VerificationFailure::NotRegistered);
    };

    let proof = match &claim.proof {
        Some(proof) => Some(proof.clone()),
        None => match state.proof_for_leaf(outer, entry) {
            Ok(proof) => Some(proof),
            Err(e) => {
                tracing::warn!(identity = %entry.identity_id, error = %e, "could not derive registry proof");
                None
            }
        },
    };
    let valid = proof
        .as_ref()
        .is_some_and(|p| state.verify(&claim.merkle_root, p));

    PackageVerification {
        valid,
        reason: (!valid).then_some(VerificationFailure::MembershipInvalid),
        identity_id: Some(entry.identity_id.clone()),
        metadata: Some(entry.metadata.clone()),
        registry_proof: if valid { proof } else { None },
    }
}

/// Check a disclosure proof against the registry.
///
/// The disclosure's root must be registered, then the registered identity
/// must accept the disclosure. Failing to load that identity's snapshot is
/// an error, not an invalid result.
pub fn verify_document_disclosure(
    registry: &IdentityRegistry,
    proof: &DisclosureProof,
) -> Result<DisclosureVerification, RegistryError> {
    let state = registry.read_state();
    let membership = check_package(
        &state,
        &PackageClaim {
            merkle_root: proof.merkle_root.clone(),
            proof: None,
        },
    );

    let identity_id = match (&membership.identity_id, membership.valid) {
        (Some(id), true) => id.clone(),
        _ => {
            return Ok(DisclosureVerification {
                valid: false,
                reason: membership.reason,
                identity_id: membership.identity_id,
                disclosed_attributes: proof.disclosed_attributes.clone(),
            })
        }
    };

    let identity = state.load_identity(registry.store(), identity_id.as_str())?;
    let valid = identity.verify_disclosure(proof, &identity.root());
    if !valid {
        tracing::debug!(identity = %identity_id, "disclosure rejected by registered identity");
    }
    Ok(DisclosureVerification {
        valid,
        reason: (!valid).then_some(VerificationFailure::DisclosureInvalid),
        identity_id: Some(identity_id),
        disclosed_attributes: proof.disclosed_attributes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mid_identity::{IdentityMaterial, SelectiveAttributes};
    use serde_json::{json, Value};

    fn passport() -> Document {
        match json!({"id": "passport", "name": "Jane", "dob": "1990-01-01"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn registered() -> (tempfile::TempDir, IdentityRegistry, IdentityMaterial) {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let identity = IdentityMaterial::create(&[passport()], &SelectiveAttributes::new()).unwrap();
        let mut metadata = Metadata::new();
        metadata.insert("country".into(), json!("ZM"));
        registry
            .register_identity("jane", &identity, metadata)
            .unwrap();
        (dir, registry, identity)
    }

    #[test]
    fn registered_package_verifies_without_proof() {
        let (_dir, registry, identity) = registered();
        let package = identity.export_package().unwrap();
        let result = verify_user_package(&registry, &PackageClaim::new(&package, None));
        assert!(result.valid);
        assert_eq!(result.reason, None);
        assert_eq!(result.identity_id.unwrap().as_str(), "jane");
        assert_eq!(result.metadata.unwrap()["country"], "ZM");
        assert!(result.registry_proof.is_some());
    }

    #[test]
    fn registered_package_with_holder_proof() {
        let (_dir, registry, identity) = registered();
        let proof = registry.prove_membership("jane").unwrap();
        let package = identity.export_package().unwrap();
        let result = verify_user_package(&registry, &PackageClaim::new(&package, Some(proof.clone())));
        assert!(result.valid);
        assert_eq!(result.registry_proof, Some(proof));
    }

    #[test]
    fn tampered_holder_proof_is_membership_invalid() {
        let (_dir, registry, identity) = registered();
        let mut proof = registry.prove_membership("jane").unwrap();
        proof.salt = "00".repeat(32);
        let package = identity.export_package().unwrap();
        let result = verify_user_package(&registry, &PackageClaim::new(&package, Some(proof)));
        assert!(!result.valid);
        assert_eq!(result.reason, Some(VerificationFailure::MembershipInvalid));
        assert!(result.identity_id.is_some());
        assert!(result.registry_proof.is_none());
    }

    #[test]
    fn unknown_and_malformed_roots() {
        let (_dir, registry, _) = registered();
        let unknown = PackageClaim {
            merkle_root: mid_core::sha256_concat(&[b"stranger"]).to_hex(),
            proof: None,
        };
        assert_eq!(
            verify_user_package(&registry, &unknown).reason,
            Some(VerificationFailure::NotRegistered)
        );
        let malformed = PackageClaim {
            merkle_root: "not-a-root".into(),
            proof: None,
        };
        assert_eq!(
            verify_user_package(&registry, &malformed).reason,
            Some(VerificationFailure::Malformed)
        );
    }

    #[test]
    fn disclosure_reasons_are_distinct() {
        let (_dir, registry, identity) = registered();
        let names: Vec<String> = passport().keys().cloned().collect();
        let proof = identity.disclosure_proof(&passport(), &names[..]).unwrap();

        let ok = verify_document_disclosure(&registry, &proof).unwrap();
        assert!(ok.valid);
        assert_eq!(ok.identity_id.unwrap().as_str(), "jane");

        let mut tampered = proof.clone();
        tampered
            .disclosed_attributes
            .insert("dob".into(), json!("1970-01-01"));
        let bad = verify_document_disclosure(&registry, &tampered).unwrap();
        assert_eq!(bad.reason, Some(VerificationFailure::DisclosureInvalid));

        let stranger = IdentityMaterial::create(&[passport()], &SelectiveAttributes::new()).unwrap();
        let foreign = stranger.disclosure_proof(&passport(), &names[..]).unwrap();
        let unregistered = verify_document_disclosure(&registry, &foreign).unwrap();
        assert_eq!(unregistered.reason, Some(VerificationFailure::NotRegistered));
        assert!(unregistered.identity_id.is_none());
    }

    #[test]
    fn missing_identity_snapshot_is_an_error() {
        let (dir, registry, identity) = registered();
        let names: Vec<String> = passport().keys().cloned().collect();
        let proof = identity.disclosure_proof(&passport(), &names[..]).unwrap();
        std::fs::remove_file(dir.path().join("identities/jane.json")).unwrap();
        assert!(matches!(
            verify_document_disclosure(&registry, &proof),
            Err(RegistryError::Identity(_))
        ));
    }

    #[test]
    fn failure_reasons_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&VerificationFailure::NotRegistered).unwrap(),
            "\"not_registered\""
        );
    }
}
