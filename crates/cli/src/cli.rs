use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Compliance policy loader and tamper-evident lockfile tool.
///
/// Loads rule documents from registry aliases, URLs, directories and files,
/// signs audit attestations, and freezes / verifies compliance baselines.
#[derive(Parser, Debug)]
#[command(name = "nod", version, about = "Compliance policy loading and attestation")]
pub struct CliArgs {
    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, merge and print the rule policy
    Rules {
        /// Rule sources, lowest priority first: registry:<name>, URL, directory or file.
        /// Falls back to ./defaults, the bundled rules, then ./rules.yaml
        sources: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },

    /// Print the ignored rule ids and patterns
    Ignore {
        /// Ignore file (default: $NOD_IGNORE_FILE or .nodignore)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Sign an attestation with $NOD_SECRET_KEY
    Sign {
        /// Attestation JSON file, or - for stdin
        attestation: String,

        /// Write the signed attestation here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Freeze an attestation as the trusted baseline
    Freeze {
        /// Attestation JSON file, or - for stdin
        attestation: String,

        /// Policy version recorded in the lockfile
        #[arg(long, default_value = "combined")]
        policy_version: String,

        /// Lockfile path (default: $NOD_LOCKFILE or nod.lock)
        #[arg(long)]
        lockfile: Option<PathBuf>,
    },

    /// Verify an attestation against the frozen baseline
    Verify {
        /// Attestation JSON file, or - for stdin
        attestation: String,

        /// Lockfile path (default: $NOD_LOCKFILE or nod.lock)
        #[arg(long)]
        lockfile: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}
