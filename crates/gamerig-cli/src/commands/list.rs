//! List command implementation
//!
//! Lists the registered rig types with their parameters and operators.

use anyhow::Result;
use colored::Colorize;
use gamerig_generate::{RigRegistry, RigTypeEntry};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Debug, Serialize)]
struct ParamInfo {
    name: &'static str,
    #[serde(rename = "type")]
    type_label: String,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct RigTypeInfo {
    name: &'static str,
    parameters: Vec<ParamInfo>,
    operators: Vec<&'static str>,
}

fn describe(entry: &RigTypeEntry) -> RigTypeInfo {
    RigTypeInfo {
        name: entry.name,
        parameters: (entry.parameters)()
            .into_iter()
            .map(|decl| ParamInfo {
                name: decl.name,
                type_label: decl.type_label(),
                description: decl.description,
            })
            .collect(),
        operators: (entry.operators)().into_iter().map(|op| op.name).collect(),
    }
}

/// Run the list command
pub fn run(json_output: bool) -> Result<ExitCode> {
    let infos: Vec<RigTypeInfo> = RigRegistry::global().entries().iter().map(describe).collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(ExitCode::SUCCESS);
    }

    for info in &infos {
        println!("{}", info.name.cyan().bold());
        for param in &info.parameters {
            println!(
                "  {:<26} {:<16} {}",
                param.name,
                param.type_label.dimmed(),
                param.description
            );
        }
        if !info.operators.is_empty() {
            println!("  {} {}", "operators:".dimmed(), info.operators.join(", "));
        }
    }
    Ok(ExitCode::SUCCESS)
}
