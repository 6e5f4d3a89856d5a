//! Registry inspection commands: `mid root`, `mid list`, `mid prove`.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use mid_registry::IdentityRegistry;

use crate::{write_json, EXIT_OK};

/// Arguments of `mid prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Registry identifier of the identity.
    #[arg(long)]
    pub id: String,
}

/// Print the registry root, or `null` for an empty registry.
pub fn run_root(registry: &IdentityRegistry, out: &mut dyn Write) -> Result<u8> {
    write_json(out, &registry.registry_root())?;
    Ok(EXIT_OK)
}

/// Print every registered identity in registration order.
pub fn run_list(registry: &IdentityRegistry, out: &mut dyn Write) -> Result<u8> {
    write_json(out, &registry.list_identities())?;
    Ok(EXIT_OK)
}

/// Print the membership proof of one identity.
pub fn run_prove(args: &ProveArgs, registry: &IdentityRegistry, out: &mut dyn Write) -> Result<u8> {
    let proof = registry
        .prove_membership(&args.id)
        .with_context(|| format!("failed to prove membership of {}", args.id))?;
    write_json(out, &proof)?;
    Ok(EXIT_OK)
}
