//! # Registry End-to-End Scenarios
//!
//! Issuance, registration, holder packages, disclosures, reloads, and
//! snapshot corruption, driven through the public APIs of `mid-identity`
//! and `mid-registry`.

use std::fs;
use std::path::Path;

use mid_core::DocumentId;
use mid_identity::{Document, IdentityMaterial, SelectiveAttributes};
use mid_registry::{
    verify_document_disclosure, verify_membership_against, verify_user_package, IdentityRegistry,
    Metadata, PackageClaim, RegistryError, VerificationFailure, REGISTRY_FILE,
};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("test documents are objects"),
    }
}

fn metadata(kind: &str, country: &str) -> Metadata {
    match json!({"type": kind, "country": country}) {
        Value::Object(map) => map,
        _ => panic!("metadata is an object"),
    }
}

fn jane_documents() -> Vec<Document> {
    vec![
        doc(json!({
            "id": "passport",
            "name": "Jane Smith",
            "passport_number": "AB123456",
            "dob": "1990-05-15",
            "nationality": "Canada",
            "issue_date": "2020-01-01",
            "expiry_date": "2030-01-01"
        })),
        doc(json!({
            "id": "drivers_license",
            "name": "Jane Smith",
            "license_number": "DL987654",
            "dob": "1990-05-15",
            "address": "123 Main St, Toronto"
        })),
    ]
}

fn alex_documents() -> Vec<Document> {
    vec![doc(json!({
        "id": "health_insurance",
        "name": "Alex Johnson",
        "policy_number": "HI-42",
        "plan_type": "Premium",
        "start_date": "2023-01-01"
    }))]
}

fn passport_selection() -> SelectiveAttributes {
    let mut selective = SelectiveAttributes::new();
    selective.insert(
        DocumentId::from("passport"),
        vec!["name".into(), "nationality".into(), "dob".into()],
    );
    selective
}

#[test]
fn two_identities_with_pinned_historical_roots() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IdentityRegistry::open(dir.path()).unwrap();

    let jane = IdentityMaterial::create(&jane_documents(), &passport_selection()).unwrap();
    registry
        .register_identity("jane_smith", &jane, metadata("individual", "CA"))
        .unwrap();
    let root_after_jane = registry.registry_root().unwrap();
    let jane_proof_v1 = registry.prove_membership("jane_smith").unwrap();

    let alex = IdentityMaterial::create(&alex_documents(), &SelectiveAttributes::new()).unwrap();
    registry
        .register_identity("alex_johnson", &alex, metadata("individual", "ZM"))
        .unwrap();
    let root_after_alex = registry.registry_root().unwrap();
    assert_ne!(root_after_jane, root_after_alex);

    let jane_hex = jane.root().to_hex();
    let alex_hex = alex.root().to_hex();

    // A proof stays valid against the root it was issued under.
    assert!(verify_membership_against(&jane_hex, &jane_proof_v1, &root_after_jane));
    assert!(!registry.verify_membership(&jane_hex, &jane_proof_v1));

    let jane_proof_v2 = registry.prove_membership("jane_smith").unwrap();
    let alex_proof = registry.prove_membership("alex_johnson").unwrap();
    assert!(registry.verify_membership(&jane_hex, &jane_proof_v2));
    assert!(registry.verify_membership(&alex_hex, &alex_proof));
    assert!(verify_membership_against(&alex_hex, &alex_proof, &root_after_alex));
    assert!(!registry.verify_membership(&alex_hex, &jane_proof_v2));

    // Proofs issued under the two-identity tree do not verify against the
    // one-identity root.
    assert!(!verify_membership_against(&jane_hex, &jane_proof_v2, &root_after_jane));
    assert!(!verify_membership_against(&alex_hex, &alex_proof, &root_after_jane));

    // Holder flow: package plus proof, then a selective disclosure.
    let package = jane.export_package().unwrap();
    let result = verify_user_package(&registry, &PackageClaim::new(&package, Some(jane_proof_v2)));
    assert!(result.valid);
    assert_eq!(result.identity_id.unwrap().as_str(), "jane_smith");

    let disclosure = package
        .disclosure_proof(&jane_documents()[0], &["name", "nationality", "dob"])
        .unwrap();
    let verdict = verify_document_disclosure(&registry, &disclosure).unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.disclosed_attributes.len(), 3);
    assert!(!verdict.disclosed_attributes.contains_key("passport_number"));

    let listing = registry.list_identities();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id.as_str(), "jane_smith");
    assert_eq!(listing[1].identity_root, alex.root());
}

#[test]
fn same_identity_root_registered_twice() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IdentityRegistry::open(dir.path()).unwrap();
    let jane = IdentityMaterial::create(&jane_documents(), &SelectiveAttributes::new()).unwrap();

    let first = registry
        .register_identity("jane_primary", &jane, Metadata::new())
        .unwrap();
    let second = registry
        .register_identity("jane_secondary", &jane, Metadata::new())
        .unwrap();
    assert_eq!(first.identity_root, second.identity_root);
    assert_ne!(first.salt, second.salt);

    let root_hex = jane.root().to_hex();
    let p1 = registry.prove_membership("jane_primary").unwrap();
    let p2 = registry.prove_membership("jane_secondary").unwrap();
    assert_ne!(p1.path_positions, p2.path_positions);
    assert!(registry.verify_membership(&root_hex, &p1));
    assert!(registry.verify_membership(&root_hex, &p2));

    // Lookup by root resolves to the first registration.
    let claim = PackageClaim {
        merkle_root: root_hex,
        proof: None,
    };
    let result = verify_user_package(&registry, &claim);
    assert!(result.valid);
    assert_eq!(result.identity_id.unwrap().as_str(), "jane_primary");
}

#[test]
fn reload_reproduces_root_and_listing() {
    let dir = tempfile::tempdir().unwrap();
    let (root, listing, proof, jane_root) = {
        let registry = IdentityRegistry::open(dir.path()).unwrap();
        let jane = IdentityMaterial::create(&jane_documents(), &passport_selection()).unwrap();
        let alex =
            IdentityMaterial::create(&alex_documents(), &SelectiveAttributes::new()).unwrap();
        registry
            .register_identity("jane", &jane, metadata("individual", "CA"))
            .unwrap();
        registry
            .register_identity("alex", &alex, metadata("individual", "ZM"))
            .unwrap();
        (
            registry.registry_root(),
            registry.list_identities(),
            registry.prove_membership("jane").unwrap(),
            jane.root(),
        )
    };

    let reopened = IdentityRegistry::open(dir.path()).unwrap();
    assert_eq!(reopened.registry_root(), root);
    assert_eq!(reopened.list_identities(), listing);
    assert!(reopened.verify_membership(&jane_root.to_hex(), &proof));
    assert_eq!(reopened.get_identity("jane").unwrap().root(), jane_root);
    assert_eq!(reopened.prove_membership("jane").unwrap(), proof);
}

fn corrupt_registry(dir: &Path, edit: impl FnOnce(&mut Value)) {
    let path = dir.join(REGISTRY_FILE);
    let mut value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    edit(&mut value);
    fs::write(&path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

fn registry_with_one(dir: &Path) {
    let registry = IdentityRegistry::open(dir).unwrap();
    let jane = IdentityMaterial::create(&jane_documents(), &SelectiveAttributes::new()).unwrap();
    registry
        .register_identity("jane", &jane, Metadata::new())
        .unwrap();
}

#[test]
fn swapped_identity_root_is_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    registry_with_one(dir.path());
    corrupt_registry(dir.path(), |value| {
        let entries = value["entries"].as_object_mut().unwrap();
        let entry = entries.values_mut().next().unwrap();
        entry["identity_root"] = json!(mid_core::sha256_concat(&[b"other"]).to_hex());
    });
    assert!(matches!(
        IdentityRegistry::open(dir.path()),
        Err(RegistryError::Integrity(_))
    ));
}

#[test]
fn missing_outer_salt_is_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    registry_with_one(dir.path());
    corrupt_registry(dir.path(), |value| {
        value["outer_salts"] = json!({});
    });
    assert!(matches!(
        IdentityRegistry::open(dir.path()),
        Err(RegistryError::Integrity(_))
    ));
}

#[test]
fn unparseable_registry_is_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    let bodies: [&[u8]; 3] = [b"[1, 2", b"[1,", b"{ garbage"];
    for body in bodies {
        fs::write(dir.path().join(REGISTRY_FILE), body).unwrap();
        assert!(matches!(
            IdentityRegistry::open(dir.path()),
            Err(RegistryError::Integrity(_))
        ));
    }
}

#[test]
fn non_utc_registration_time_is_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    registry_with_one(dir.path());
    corrupt_registry(dir.path(), |value| {
        let entries = value["entries"].as_object_mut().unwrap();
        let entry = entries.values_mut().next().unwrap();
        entry["registered_at"] = json!("2026-01-15T12:00:00+02:00");
    });
    assert!(matches!(
        IdentityRegistry::open(dir.path()),
        Err(RegistryError::Integrity(_))
    ));
}

#[test]
fn storage_dir_that_is_a_file_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"a file, not a directory").unwrap();
    assert!(matches!(
        IdentityRegistry::open(&blocked),
        Err(RegistryError::Storage(_))
    ));
}

#[test]
fn tampered_disclosure_fails_through_verifier() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IdentityRegistry::open(dir.path()).unwrap();
    let jane = IdentityMaterial::create(&jane_documents(), &passport_selection()).unwrap();
    registry
        .register_identity("jane", &jane, Metadata::new())
        .unwrap();

    let proof = jane
        .disclosure_proof(&jane_documents()[0], &["name", "nationality", "dob"])
        .unwrap();

    let mut forged_value = proof.clone();
    forged_value
        .disclosed_attributes
        .insert("nationality".into(), json!("Atlantis"));
    let verdict = verify_document_disclosure(&registry, &forged_value).unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, Some(VerificationFailure::DisclosureInvalid));

    let mut forged_path = proof.clone();
    forged_path.path_indices[0] ^= 1;
    assert!(!verify_document_disclosure(&registry, &forged_path).unwrap().valid);

    let mut forged_root = proof;
    forged_root.merkle_root = mid_core::sha256_concat(&[b"elsewhere"]).to_hex();
    let verdict = verify_document_disclosure(&registry, &forged_root).unwrap();
    assert_eq!(verdict.reason, Some(VerificationFailure::NotRegistered));
}
