//! # mid-cli: Command-Line Interface
//!
//! Provides the `mid` binary over the identity and registry engines. The
//! CLI holds no protocol logic; every subcommand parses its inputs, calls
//! one engine operation, and prints the result as JSON on stdout. Logs go to
//! stderr.
//!
//! ## Subcommands
//!
//! - `mid create`: issue an identity from a documents file and register it.
//! - `mid root`, `mid list`, `mid prove`: registry inspection.
//! - `mid disclose`, `mid summary`: per-identity outputs.
//! - `mid verify-package`, `mid verify-disclosure`: verification, with
//!   exit code 0 for valid and 2 for invalid.
//!
//! ```bash
//! mid --registry-dir ./identity_registry create --id jane_smith --documents docs.json
//! mid disclose --id jane_smith --document passport.json --attributes name,nationality > proof.json
//! mid verify-disclosure --proof proof.json
//! ```

pub mod identity;
pub mod registry;
pub mod verify;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Exit code for a successful command or a valid verification.
pub const EXIT_OK: u8 = 0;

/// Exit code for a verification that completed and found the input invalid.
pub const EXIT_INVALID: u8 = 2;

/// Default registry directory when neither flag nor environment sets one.
pub const DEFAULT_REGISTRY_DIR: &str = "./identity_registry";

/// Read and parse a JSON input file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
