//! Build automation for the Ferrite workspace.
//!
//! Usage:
//!   cargo xtask build    - Build the workspace
//!   cargo xtask test     - Run tests (hosted + bare-metal check)
//!   cargo xtask check    - Type-check the workspace
//!   cargo xtask clippy   - Run clippy lints
//!   cargo xtask doc      - Generate documentation

mod cargo;
mod config;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cargo::CargoCommand;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for the Ferrite workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workspace
    Build {
        /// Build in release mode
        #[arg(short, long)]
        release: bool,

        /// Package to build (default: the whole workspace)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Run the workspace's tests, hosted and bare-metal
    Test {
        /// Build in release mode
        #[arg(short, long)]
        release: bool,

        /// Package to test (default: the whole workspace)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Type-check the workspace
    Check {
        /// Package to check (default: the whole workspace)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Run clippy lints on the workspace
    Clippy {
        /// Package to lint (default: the whole workspace)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Generate documentation for the workspace
    Doc {
        /// Open the generated docs in a browser
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Build { release, package } => CargoCommand {
            subcommand: "build".into(),
            package,
            release,
            extra_args: vec![],
        }
        .run(&config),

        Commands::Test { release, package } => {
            test::run_tests(&config, package.as_deref(), release)
        }

        Commands::Check { package } => CargoCommand {
            subcommand: "check".into(),
            package,
            release: false,
            extra_args: vec![],
        }
        .run(&config),

        Commands::Clippy { package } => CargoCommand {
            subcommand: "clippy".into(),
            package,
            release: false,
            extra_args: vec![],
        }
        .run(&config),

        Commands::Doc { open } => CargoCommand {
            subcommand: "doc".into(),
            package: None,
            release: false,
            extra_args: if open { vec!["--open".into()] } else { vec![] },
        }
        .run(&config),
    }
}
