//! # cmide CLI Entry Point
//!
//! Parses CLI arguments using clap and routes commands to the handlers in
//! [`cmide::commands`].

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use cmide::commands::{self, Workspace};
use cmide::setup::SetupRequest;

#[derive(Parser)]
#[command(name = "cmide")]
#[command(about = "Generate Eclipse CDT projects through CMake", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Eclipse project for the current architecture and build type
    Setup {
        /// Only print the command line and diagnostics
        #[arg(short, long)]
        quiet: bool,
    },
    /// Switch to another architecture and regenerate
    Arch {
        /// Architecture name (interactive if omitted)
        name: Option<String>,
        /// List available architectures instead
        #[arg(short, long, conflicts_with = "name")]
        list: bool,
    },
    /// Switch to another build type and regenerate
    BuildType {
        /// Build type (interactive if omitted)
        name: Option<String>,
    },
    /// List the Eclipse generators the installed CMake offers
    Generators,
    /// Diagnose CMake, configuration and toolchain issues
    Doctor,
    /// Generate shell completion scripts
    Completions { shell: Shell },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let open = || Workspace::open(&cli.project);
    match cli.command {
        Commands::Setup { quiet } => {
            commands::setup::run(&open()?, SetupRequest::Setup, quiet)?;
        }
        Commands::Arch { list: true, .. } => commands::arch::list(&open()?),
        Commands::Arch { name, .. } => {
            let ws = open()?;
            let request = commands::arch::choose_architecture(&ws, name)?;
            commands::setup::run(&ws, request, false)?;
        }
        Commands::BuildType { name } => {
            let ws = open()?;
            let request = commands::arch::choose_build_type(&ws, name)?;
            commands::setup::run(&ws, request, false)?;
        }
        Commands::Generators => {
            commands::generators::run(&open()?)?;
        }
        Commands::Doctor => commands::doctor::run_doctor(&open()?)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }
    Ok(())
}
