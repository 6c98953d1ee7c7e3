//! Common cargo invocation for workspace housekeeping commands.

use crate::config::Config;
use anyhow::{Context, Result};
use xshell::{Shell, cmd};

/// A `cargo` invocation against the host toolchain (no cross target, no
/// build-std — every crate here is a portable library that builds for the
/// host).
pub struct CargoCommand {
    /// Cargo subcommand: "build", "test", "clippy", "doc".
    pub subcommand: String,
    /// Package to operate on (-p flag). If `None`, runs across the workspace.
    pub package: Option<String>,
    /// Whether to pass --release.
    pub release: bool,
    /// Extra arguments appended after `--`.
    pub extra_args: Vec<String>,
}

impl CargoCommand {
    /// Execute the cargo command.
    pub fn run(&self, config: &Config) -> Result<()> {
        let sh = Shell::new()?;
        sh.change_dir(&config.workspace_root);

        let mut args: Vec<String> = vec![self.subcommand.clone()];

        if let Some(ref pkg) = self.package {
            args.push("-p".into());
            args.push(pkg.clone());
        } else {
            args.push("--workspace".into());
        }

        if self.release {
            args.push("--release".into());
        }

        if !self.extra_args.is_empty() {
            args.push("--".into());
            args.extend(self.extra_args.clone());
        }

        cmd!(sh, "cargo {args...}")
            .run()
            .with_context(|| format!("cargo {} failed", self.subcommand))?;

        Ok(())
    }
}
