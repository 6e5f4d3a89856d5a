//! # mid CLI entry point
//!
//! Parses command-line arguments, initialises tracing, opens the registry,
//! and dispatches to subcommand handlers.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mid_cli::identity::{run_create, run_disclose, run_summary, CreateArgs, DiscloseArgs, SummaryArgs};
use mid_cli::registry::{run_list, run_prove, run_root, ProveArgs};
use mid_cli::verify::{
    run_verify_disclosure, run_verify_package, VerifyDisclosureArgs, VerifyPackageArgs,
};
use mid_cli::DEFAULT_REGISTRY_DIR;
use mid_registry::IdentityRegistry;

/// Merkle identity registry
///
/// Issues salted-commitment identities, registers their roots in a
/// double-commitment registry tree, and produces and verifies selective
/// disclosures.
#[derive(Parser, Debug)]
#[command(name = "mid", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Registry storage directory.
    #[arg(long, global = true, env = "MID_REGISTRY_DIR", default_value = DEFAULT_REGISTRY_DIR)]
    registry_dir: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an identity from documents and register it.
    Create(CreateArgs),

    /// Print the current registry root.
    Root,

    /// List registered identities.
    List,

    /// Print the registry membership proof of an identity.
    Prove(ProveArgs),

    /// Print a selective-disclosure proof from a registered identity.
    Disclose(DiscloseArgs),

    /// Print the salt-free summary of a registered identity.
    Summary(SummaryArgs),

    /// Verify that an identity root is registered.
    VerifyPackage(VerifyPackageArgs),

    /// Verify a selective-disclosure proof against the registry.
    VerifyDisclosure(VerifyDisclosureArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<u8> {
    let registry = IdentityRegistry::open(&cli.registry_dir)
        .with_context(|| format!("failed to open registry at {}", cli.registry_dir.display()))?;

    match &cli.command {
        Commands::Create(args) => run_create(args, &registry, out),
        Commands::Root => run_root(&registry, out),
        Commands::List => run_list(&registry, out),
        Commands::Prove(args) => run_prove(args, &registry, out),
        Commands::Disclose(args) => run_disclose(args, &registry, out),
        Commands::Summary(args) => run_summary(args, &registry, out),
        Commands::VerifyPackage(args) => run_verify_package(args, &registry, out),
        Commands::VerifyDisclosure(args) => run_verify_disclosure(args, &registry, out),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);
    tracing::debug!(registry_dir = %cli.registry_dir.display(), "mid CLI starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_create() {
        let cli = Cli::try_parse_from([
            "mid",
            "create",
            "--id",
            "jane",
            "--documents",
            "docs.json",
            "--selective",
            "sel.json",
        ])
        .unwrap();
        if let Commands::Create(args) = cli.command {
            assert_eq!(args.id, "jane");
            assert_eq!(args.documents, PathBuf::from("docs.json"));
            assert_eq!(args.selective, Some(PathBuf::from("sel.json")));
            assert!(args.metadata.is_none());
        } else {
            panic!("expected create");
        }
    }

    #[test]
    fn cli_parse_disclose_splits_attributes() {
        let cli = Cli::try_parse_from([
            "mid",
            "disclose",
            "--id",
            "jane",
            "--document",
            "passport.json",
            "--attributes",
            "name,nationality",
        ])
        .unwrap();
        if let Commands::Disclose(args) = cli.command {
            assert_eq!(args.attributes, vec!["name", "nationality"]);
        } else {
            panic!("expected disclose");
        }
    }

    #[test]
    fn cli_parse_disclose_requires_attributes() {
        assert!(Cli::try_parse_from([
            "mid",
            "disclose",
            "--id",
            "jane",
            "--document",
            "passport.json"
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["mid", "root", "-vv", "--registry-dir", "/tmp/reg", "--json-logs"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Root));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.registry_dir, PathBuf::from("/tmp/reg"));
        assert!(cli.json_logs);
    }

    #[test]
    fn cli_parse_verify_package_optional_proof() {
        let cli = Cli::try_parse_from(["mid", "verify-package", "--root", "abcd"]).unwrap();
        if let Commands::VerifyPackage(args) = cli.command {
            assert_eq!(args.root, "abcd");
            assert!(args.proof.is_none());
        } else {
            panic!("expected verify-package");
        }
    }

    #[test]
    fn cli_parse_unknown_subcommand_fails() {
        assert!(Cli::try_parse_from(["mid", "revoke"]).is_err());
    }

    #[test]
    fn run_opens_registry_and_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let registry_dir = dir.path().join("reg");
        let cli = Cli::try_parse_from([
            "mid",
            "--registry-dir",
            registry_dir.to_str().unwrap(),
            "list",
        ])
        .unwrap();
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(run(&cli, &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
        assert!(registry_dir.is_dir());
    }
}
