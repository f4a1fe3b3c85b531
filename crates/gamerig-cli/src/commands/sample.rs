//! Sample command implementation
//!
//! Writes the sample meta-skeleton of a rig type.

use anyhow::{Context, Result};
use colored::Colorize;
use gamerig_generate::RigRegistry;
use std::path::Path;
use std::process::ExitCode;

/// Run the sample command
///
/// Prints the sample to stdout when no output path is given.
pub fn run(rig_type: &str, output: Option<&str>) -> Result<ExitCode> {
    let registry = RigRegistry::global();
    let Some(entry) = registry.get(rig_type) else {
        eprintln!(
            "{} unknown rig type '{}' (expected one of: {})",
            "error:".red().bold(),
            rig_type,
            registry.names().join(", ")
        );
        return Ok(ExitCode::from(1));
    };

    let json = (entry.sample)()
        .to_json_pretty()
        .context("Failed to serialize sample metarig")?;
    match output {
        Some(path) => {
            std::fs::write(Path::new(path), json)
                .with_context(|| format!("Failed to write sample: {}", path))?;
            println!("{} {}", "Sample written to:".dimmed(), path);
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}
