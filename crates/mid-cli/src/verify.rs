//! # Verification Commands
//!
//! `mid verify-package` checks that an identity root is registered;
//! `mid verify-disclosure` checks a selective-disclosure proof end to end.
//! Both print the verification result and exit with [`EXIT_OK`] when valid
//! and [`EXIT_INVALID`] when not. Operational failures (unreadable input,
//! unreadable identity snapshot) exit with 1.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mid_identity::DisclosureProof;
use mid_registry::{
    verify_document_disclosure, verify_user_package, IdentityRegistry, PackageClaim, RegistryProof,
};

use crate::{read_json_file, write_json, EXIT_INVALID, EXIT_OK};

/// Arguments of `mid verify-package`.
#[derive(Args, Debug)]
pub struct VerifyPackageArgs {
    /// Claimed identity root, hex.
    #[arg(long)]
    pub root: String,

    /// JSON file holding the holder's registry proof. Without it the
    /// registry derives the proof itself.
    #[arg(long)]
    pub proof: Option<PathBuf>,
}

/// Arguments of `mid verify-disclosure`.
#[derive(Args, Debug)]
pub struct VerifyDisclosureArgs {
    /// JSON file holding the disclosure proof.
    #[arg(long)]
    pub proof: PathBuf,
}

fn exit_code(valid: bool) -> u8 {
    if valid {
        EXIT_OK
    } else {
        EXIT_INVALID
    }
}

/// Verify registry membership of an identity root.
pub fn run_verify_package(
    args: &VerifyPackageArgs,
    registry: &IdentityRegistry,
    out: &mut dyn Write,
) -> Result<u8> {
    let proof: Option<RegistryProof> = match &args.proof {
        Some(path) => Some(read_json_file(path)?),
        None => None,
    };
    let claim = PackageClaim {
        merkle_root: args.root.clone(),
        proof,
    };
    let result = verify_user_package(registry, &claim);
    if let Some(reason) = result.reason {
        tracing::info!(%reason, "package rejected");
    }
    write_json(out, &result)?;
    Ok(exit_code(result.valid))
}

/// Verify a disclosure proof against the registry.
pub fn run_verify_disclosure(
    args: &VerifyDisclosureArgs,
    registry: &IdentityRegistry,
    out: &mut dyn Write,
) -> Result<u8> {
    let proof: DisclosureProof = read_json_file(&args.proof)?;
    let result = verify_document_disclosure(registry, &proof)
        .context("failed to verify disclosure")?;
    if let Some(reason) = result.reason {
        tracing::info!(%reason, "disclosure rejected");
    }
    write_json(out, &result)?;
    Ok(exit_code(result.valid))
}
