//! # Identity Commands
//!
//! `mid create`, `mid disclose`, and `mid summary`.
//!
//! ## Input Files
//!
//! - documents: a JSON array of objects, one per document.
//! - selective: a JSON object mapping document id to the attribute names to
//!   commit to.
//! - metadata: a JSON object stored with the registration.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mid_identity::{Document, IdentityMaterial, SelectiveAttributes};
use mid_registry::{IdentityRegistry, Metadata};

use crate::{read_json_file, write_json, EXIT_OK};

/// Arguments of `mid create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Registry identifier of the new identity.
    #[arg(long)]
    pub id: String,

    /// JSON file holding the array of documents.
    #[arg(long)]
    pub documents: PathBuf,

    /// JSON file mapping document ids to the attribute names to commit to.
    #[arg(long)]
    pub selective: Option<PathBuf>,

    /// JSON file with registration metadata.
    #[arg(long)]
    pub metadata: Option<PathBuf>,
}

/// Arguments of `mid disclose`.
#[derive(Args, Debug)]
pub struct DiscloseArgs {
    /// Registry identifier of the identity.
    #[arg(long)]
    pub id: String,

    /// JSON file holding the document to disclose from.
    #[arg(long)]
    pub document: PathBuf,

    /// Attribute names to disclose, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub attributes: Vec<String>,
}

/// Arguments of `mid summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Registry identifier of the identity.
    #[arg(long)]
    pub id: String,
}

/// Issue an identity, register it, and print the holder package.
pub fn run_create(args: &CreateArgs, registry: &IdentityRegistry, out: &mut dyn Write) -> Result<u8> {
    let documents: Vec<Document> = read_json_file(&args.documents)?;
    let selective: SelectiveAttributes = match &args.selective {
        Some(path) => read_json_file(path)?,
        None => SelectiveAttributes::new(),
    };
    let metadata: Metadata = match &args.metadata {
        Some(path) => read_json_file(path)?,
        None => Metadata::new(),
    };

    let identity = IdentityMaterial::create(&documents, &selective)
        .context("failed to create identity")?;
    let entry = registry
        .register_identity(&args.id, &identity, metadata)
        .with_context(|| format!("failed to register identity {}", args.id))?;
    tracing::info!(identity = %entry.identity_id, root = %entry.identity_root, "registered");

    write_json(out, &identity.export_package()?)?;
    Ok(EXIT_OK)
}

/// Print a selective-disclosure proof from a registered identity.
pub fn run_disclose(
    args: &DiscloseArgs,
    registry: &IdentityRegistry,
    out: &mut dyn Write,
) -> Result<u8> {
    let document: Document = read_json_file(&args.document)?;
    let identity = registry
        .get_identity(&args.id)
        .with_context(|| format!("failed to load identity {}", args.id))?;
    let proof = identity
        .disclosure_proof(&document, args.attributes.as_slice())
        .context("failed to generate disclosure proof")?;
    write_json(out, &proof)?;
    Ok(EXIT_OK)
}

/// Print the salt-free summary of a registered identity.
pub fn run_summary(
    args: &SummaryArgs,
    registry: &IdentityRegistry,
    out: &mut dyn Write,
) -> Result<u8> {
    let identity = registry
        .get_identity(&args.id)
        .with_context(|| format!("failed to load identity {}", args.id))?;
    write_json(out, &identity.summary())?;
    Ok(EXIT_OK)
}
