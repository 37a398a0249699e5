use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::warn;

use nod_attest::{Attestation, AttestationSigner, LockManager, Verification};
use nod_core::Config;
use nod_rules::{resolve_default_sources, IgnoreList, LoadStatus, PolicyLoader};

use crate::cli::{Command, Format};

/// Dispatch one subcommand. Fatal errors come back as `Err`; a failed
/// verification is a normal `ExitCode::FAILURE`.
pub async fn run(command: Command, config: &Config) -> Result<ExitCode> {
    match command {
        Command::Rules { sources, format } => rules(&sources, format, config).await,
        Command::Ignore { file } => {
            ignore(file.as_deref().unwrap_or(config.ignore_file.as_path()))
        }
        Command::Sign {
            attestation,
            output,
        } => sign(&attestation, output.as_deref(), config),
        Command::Freeze {
            attestation,
            policy_version,
            lockfile,
        } => freeze(
            &attestation,
            &policy_version,
            lockfile.as_deref().unwrap_or(config.lockfile.as_path()),
            config,
        ),
        Command::Verify {
            attestation,
            lockfile,
        } => verify(
            &attestation,
            lockfile.as_deref().unwrap_or(config.lockfile.as_path()),
            config,
        ),
    }
}

async fn rules(explicit: &[String], format: Format, config: &Config) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let sources = resolve_default_sources(explicit, &cwd, config.bundled_rules_dir.as_deref());
    if sources.is_empty() {
        warn!("no rule sources found, policy is empty");
    }

    let loader = PolicyLoader::new().context("failed to build HTTP client")?;
    let report = loader.load(&sources).await.context("failed to load rules")?;

    for result in &report.results {
        if let LoadStatus::Skipped { reason } = &result.status {
            eprintln!("Warning: skipped {} ({reason})", result.origin);
        }
    }

    let rendered = match format {
        Format::Yaml => serde_yaml::to_string(&report.policy).context("failed to render policy")?,
        Format::Json => {
            serde_json::to_string_pretty(&report.policy).context("failed to render policy")?
        }
    };
    println!("{}", rendered.trim_end());
    Ok(ExitCode::SUCCESS)
}

fn ignore(path: &Path) -> Result<ExitCode> {
    for entry in IgnoreList::load(path).entries() {
        println!("{entry}");
    }
    Ok(ExitCode::SUCCESS)
}

fn sign(input: &str, output: Option<&Path>, config: &Config) -> Result<ExitCode> {
    let attestation = read_attestation(input)?;
    let signed = AttestationSigner::new(config.secret.clone())
        .sign(attestation)
        .context("failed to sign attestation")?;
    if !signed.signed {
        warn!("NOD_SECRET_KEY not set, attestation left unsigned");
    }

    let json = serde_json::to_string_pretty(&signed)?;
    match output {
        Some(path) => fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn freeze(input: &str, policy_version: &str, lockfile: &Path, config: &Config) -> Result<ExitCode> {
    let attestation = read_attestation(input)?;
    LockManager::new(config.secret.clone())
        .freeze(policy_version, &attestation, lockfile)
        .context("failed to freeze baseline")?;

    println!("Baseline frozen to {}", lockfile.display());
    Ok(ExitCode::SUCCESS)
}

fn verify(input: &str, lockfile: &Path, config: &Config) -> Result<ExitCode> {
    let attestation = read_attestation(input)?;

    match LockManager::new(config.secret.clone()).verify(&attestation, lockfile) {
        Verification::Passed { signature_checked } => {
            if signature_checked {
                println!("Lockfile signature verified.");
            }
            println!("Verification passed: no drift.");
            Ok(ExitCode::SUCCESS)
        }
        Verification::Failed(reason) => {
            println!("Verification failed: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Read an attestation from a file, or stdin for `-`.
fn read_attestation(input: &str) -> Result<Attestation> {
    let json = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read attestation from stdin")?;
        buf
    } else {
        let path = PathBuf::from(input);
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read attestation {}", path.display()))?
    };

    Attestation::from_json(&json).with_context(|| format!("invalid attestation {input}"))
}
