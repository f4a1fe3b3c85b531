//! Validate command implementation
//!
//! Checks a meta-skeleton's structure, rig-type tags and rig parameters
//! without generating anything.

use anyhow::Result;
use colored::Colorize;
use gamerig_generate::RigRegistry;
use gamerig_spec::validation::validate_metarig;
use gamerig_spec::{Metarig, ResolvedParams};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use crate::input::{load_metarig, LoadResult};

/// One finding in a validate run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Machine-readable output of `gamerig validate --json`.
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metarig_hash: Option<String>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

/// Structural validation plus rig-type and parameter checks against the registry.
pub fn check(metarig: &Metarig, registry: &RigRegistry) -> (Vec<Finding>, Vec<Finding>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let result = validate_metarig(metarig);
    errors.extend(result.errors.iter().map(|e| Finding {
        code: e.code.to_string(),
        message: e.message.clone(),
        path: e.path.clone(),
    }));
    warnings.extend(result.warnings.iter().map(|w| Finding {
        code: w.code.to_string(),
        message: w.message.clone(),
        path: w.path.clone(),
    }));

    for (i, bone) in metarig.bones.iter().enumerate() {
        let Some(tag) = bone.rig_type_tag() else {
            continue;
        };
        let path = Some(format!("bones[{}].rig_type", i));
        match registry.get(&tag) {
            None => warnings.push(Finding {
                code: "GAMERIG_202".to_string(),
                message: format!("bone '{}': rig type '{}' not found", bone.name, tag),
                path,
            }),
            Some(entry) => {
                if let Err(err) = ResolvedParams::resolve(&(entry.parameters)(), &bone.parameters) {
                    errors.push(Finding {
                        code: "GAMERIG_203".to_string(),
                        message: format!("bone '{}' ({}): {}", bone.name, tag, err),
                        path: Some(format!("bones[{}].parameters", i)),
                    });
                }
            }
        }
    }
    (errors, warnings)
}

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(metarig_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(metarig_path)
    } else {
        run_human(metarig_path)
    }
}

fn run_human(metarig_path: &str) -> Result<ExitCode> {
    let start = Instant::now();
    println!("{} {}", "Validating:".cyan().bold(), metarig_path);

    let LoadResult { metarig, hash } = load_metarig(Path::new(metarig_path))?;
    println!("{} {} ({})", "Metarig:".dimmed(), metarig.name, &hash[..16]);

    let (errors, warnings) = check(&metarig, RigRegistry::global());
    for error in &errors {
        print_finding("x".red(), error);
    }
    for warning in &warnings {
        print_finding("!".yellow(), warning);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    if errors.is_empty() {
        println!(
            "\n{} Metarig is valid: {} bone(s), {} rig(s) ({}ms)",
            "SUCCESS".green().bold(),
            metarig.bones.len(),
            metarig.rigged_bones().count(),
            duration_ms
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Metarig has {} error(s) ({}ms)",
            "FAILED".red().bold(),
            errors.len(),
            duration_ms
        );
        Ok(ExitCode::from(1))
    }
}

fn print_finding(marker: colored::ColoredString, finding: &Finding) {
    let location = finding
        .path
        .as_ref()
        .map(|p| format!(" at {}", p))
        .unwrap_or_default();
    println!(
        "  {} [{}]{}: {}",
        marker,
        finding.code,
        location.dimmed(),
        finding.message
    );
}

fn run_json(metarig_path: &str) -> Result<ExitCode> {
    let output = match load_metarig(Path::new(metarig_path)) {
        Ok(LoadResult { metarig, hash }) => {
            let (errors, warnings) = check(&metarig, RigRegistry::global());
            ValidateOutput {
                ok: errors.is_empty(),
                metarig_hash: Some(hash),
                errors,
                warnings,
            }
        }
        Err(err) => ValidateOutput {
            ok: false,
            metarig_hash: None,
            errors: vec![Finding {
                code: "INPUT".to_string(),
                message: format!("{:#}", err),
                path: None,
            }],
            warnings: Vec::new(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if output.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
