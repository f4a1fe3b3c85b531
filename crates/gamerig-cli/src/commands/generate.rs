//! Generate command implementation
//!
//! Expands a meta-skeleton into a rig and writes the rig JSON and the UI
//! script into an output directory.

use anyhow::{Context, Result};
use colored::Colorize;
use gamerig_generate::{GenerateConfig, GeneratedRig, Generator, Policy};
use gamerig_spec::ErrorCategory;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;

use crate::input::{load_config, load_metarig, load_previous, LoadResult};

/// Options for one `gamerig generate` invocation.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs<'a> {
    pub metarig: &'a str,
    pub out_dir: Option<&'a str>,
    pub config: Option<&'a str>,
    pub strict: bool,
    pub seed: Option<u64>,
    pub previous: Option<&'a str>,
    pub json: bool,
}

/// Files written by a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFiles {
    pub rig: PathBuf,
    pub script: PathBuf,
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    metarig_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a gamerig_generate::GenerationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<WrittenFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct ErrorOutput {
    code: String,
    message: String,
}

/// Loads the config file and overlays command-line flags.
pub fn resolve_config(args: &GenerateArgs<'_>) -> Result<GenerateConfig> {
    let mut config = load_config(args.config.map(Path::new))?;
    if args.strict {
        config.policy = Policy::Strict;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

/// Writes `<rig_name>.rig.json` and the UI script into `out_dir`.
pub fn write_outputs(rig: &GeneratedRig, out_dir: &Path) -> Result<WrittenFiles> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let rig_path = out_dir.join(format!("{}.rig.json", rig.report.rig_name));
    let json = serde_json::to_string_pretty(rig).context("Failed to serialize generated rig")?;
    std::fs::write(&rig_path, json)
        .with_context(|| format!("Failed to write rig: {}", rig_path.display()))?;

    let script_path = out_dir.join(format!("{}.txt", rig.ui.script_name));
    std::fs::write(&script_path, &rig.script)
        .with_context(|| format!("Failed to write UI script: {}", script_path.display()))?;
    debug!(rig = %rig_path.display(), script = %script_path.display(), "wrote outputs");

    Ok(WrittenFiles {
        rig: rig_path,
        script: script_path,
    })
}

fn default_out_dir(metarig_path: &str) -> PathBuf {
    Path::new(metarig_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Run the generate command
///
/// # Returns
/// Exit code: 0 on success, 1 if generation failed
pub fn run(args: &GenerateArgs<'_>) -> Result<ExitCode> {
    if args.json {
        run_json(args)
    } else {
        run_human(args)
    }
}

fn run_human(args: &GenerateArgs<'_>) -> Result<ExitCode> {
    let start = Instant::now();
    println!("{} {}", "Generating:".cyan().bold(), args.metarig);

    let config = resolve_config(args)?;
    let LoadResult { metarig, hash } = load_metarig(Path::new(args.metarig))?;
    let previous = args.previous.map(|p| load_previous(Path::new(p))).transpose()?;
    println!("{} {} ({})", "Metarig:".dimmed(), metarig.name, &hash[..16]);

    let rig = match Generator::new(config).generate(&metarig, previous.as_ref()) {
        Ok(rig) => rig,
        Err(err) => {
            println!("  {} [{}] {}", "x".red(), err.code(), err);
            println!(
                "\n{} Generation failed ({}ms)",
                "FAILED".red().bold(),
                start.elapsed().as_millis()
            );
            return Ok(ExitCode::from(1));
        }
    };

    for skipped in &rig.report.skipped {
        println!(
            "  {} [{}] skipped {} ({}): {}",
            "!".yellow(),
            skipped.code,
            skipped.bone,
            skipped.rig_type,
            skipped.reason
        );
    }
    for instance in &rig.report.instances {
        println!("  {} {} ({})", "+".green(), instance.bone, instance.rig_type);
    }

    let out_dir = args
        .out_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| default_out_dir(args.metarig));
    let files = write_outputs(&rig, &out_dir)?;

    println!("\n{} {}", "Rig written to:".dimmed(), files.rig.display());
    println!("{} {}", "UI script written to:".dimmed(), files.script.display());
    println!(
        "\n{} Generated rig '{}' ({}): {} bone(s) ({}ms)",
        "SUCCESS".green().bold(),
        rig.report.rig_name,
        rig.rig_id,
        rig.report.bone_count,
        start.elapsed().as_millis()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(args: &GenerateArgs<'_>) -> Result<ExitCode> {
    let start = Instant::now();
    let failure = |code: &str, message: String| GenerateOutput {
        ok: false,
        metarig_hash: None,
        fingerprint: None,
        report: None,
        files: None,
        error: Some(ErrorOutput {
            code: code.to_string(),
            message,
        }),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    let loaded = resolve_config(args).and_then(|config| {
        let loaded = load_metarig(Path::new(args.metarig))?;
        let previous = args.previous.map(|p| load_previous(Path::new(p))).transpose()?;
        Ok((config, loaded, previous))
    });
    let (config, LoadResult { metarig, hash }, previous) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            print_json(&failure("INPUT", format!("{:#}", err)))?;
            return Ok(ExitCode::from(1));
        }
    };

    let rig = match Generator::new(config).generate(&metarig, previous.as_ref()) {
        Ok(rig) => rig,
        Err(err) => {
            let mut output = failure(err.code(), err.to_string());
            output.metarig_hash = Some(hash);
            print_json(&output)?;
            return Ok(ExitCode::from(1));
        }
    };

    let out_dir = args
        .out_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| default_out_dir(args.metarig));
    let files = write_outputs(&rig, &out_dir)?;
    let output = GenerateOutput {
        ok: true,
        metarig_hash: Some(hash),
        fingerprint: rig.fingerprint().ok(),
        report: Some(&rig.report),
        files: Some(files),
        error: None,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

fn print_json(output: &GenerateOutput<'_>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
