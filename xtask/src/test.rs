//! Test execution across the workspace.
//!
//! Every crate here runs on the host under its `std` feature (the hosted
//! backend). The bare-metal build is covered by `cargo check`, not
//! `cargo test`, since that backend has no test harness to run it under.

use crate::cargo::CargoCommand;
use crate::config::Config;
use anyhow::Result;
use xshell::{Shell, cmd};

/// Run `cargo test --workspace` with default features, then again with
/// `--no-default-features` so the bare-metal code paths still compile and
/// their `#[cfg(test)]` modules (the ones that don't need `std`) still run.
pub fn run_tests(config: &Config, package: Option<&str>, release: bool) -> Result<()> {
    println!("Running tests (default features)...");
    CargoCommand {
        subcommand: "test".into(),
        package: package.map(String::from),
        release,
        extra_args: vec![],
    }
    .run(config)?;

    println!("Checking bare-metal build (--no-default-features)...");
    let sh = Shell::new()?;
    sh.change_dir(&config.workspace_root);
    cmd!(sh, "cargo check --workspace --no-default-features")
        .run()
        .map_err(|e| anyhow::anyhow!("cargo check --no-default-features failed: {e}"))?;

    Ok(())
}
