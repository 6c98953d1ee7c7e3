//! Workspace root discovery.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Build configuration for xtask commands.
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    /// Target directory for build artifacts.
    pub target_dir: PathBuf,
}

impl Config {
    /// Load configuration from the workspace.
    pub fn load() -> Result<Self> {
        let workspace_root = find_workspace_root()?;
        let target_dir = workspace_root.join("target");

        Ok(Self {
            workspace_root,
            target_dir,
        })
    }
}

/// Find the workspace root by looking for a `Cargo.toml` with `[workspace]`.
fn find_workspace_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir().context("failed to get current directory")?;

    loop {
        let cargo_toml = dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml)?;
            if content.contains("[workspace]") {
                return Ok(dir);
            }
        }

        if !dir.pop() {
            anyhow::bail!("could not find workspace root (no Cargo.toml with [workspace] found)");
        }
    }
}
