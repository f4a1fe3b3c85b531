//! GameRig CLI - Command-line interface for procedural rig generation
//!
//! This binary provides commands for validating meta-skeletons, generating
//! rigs from them, and inspecting the built-in rig types.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use gamerig_cli::commands;
use gamerig_cli::logging;

/// GameRig - Procedural Rig Generation
#[derive(Parser)]
#[command(name = "gamerig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); GAMERIG_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a rig from a meta-skeleton
    Generate {
        /// Path to the meta-skeleton JSON file
        metarig: String,

        /// Output directory (default: next to the meta-skeleton)
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Path to a generation config JSON file
        #[arg(long)]
        config: Option<String>,

        /// Abort on unknown rig types and rig configuration errors
        #[arg(long)]
        strict: bool,

        /// Seed for the rig identifier
        #[arg(long)]
        seed: Option<u64>,

        /// Previously generated rig whose identifier is reused
        #[arg(long)]
        previous: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate a meta-skeleton without generating a rig
    Validate {
        /// Path to the meta-skeleton JSON file
        metarig: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write the sample meta-skeleton of a rig type
    Sample {
        /// Rig type tag (e.g. limbs.arm)
        rig_type: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List the registered rig types
    List {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            metarig,
            out_dir,
            config,
            strict,
            seed,
            previous,
            json,
        } => commands::generate::run(&commands::generate::GenerateArgs {
            metarig: &metarig,
            out_dir: out_dir.as_deref(),
            config: config.as_deref(),
            strict,
            seed,
            previous: previous.as_deref(),
            json,
        }),
        Commands::Validate { metarig, json } => commands::validate::run(&metarig, json),
        Commands::Sample { rig_type, output } => commands::sample::run(&rig_type, output.as_deref()),
        Commands::List { json } => commands::list::run(json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
