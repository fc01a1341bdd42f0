use anyhow::Context;
use digest_core::config::Config;
use std::path::{Path, PathBuf};

/// Load settings.
///
/// Priority:
/// 1. `--config` flag / `WEEKLY_DIGEST_CONFIG` env var (must exist)
/// 2. `weekly-digest.yaml` in the working directory
/// 3. Built-in defaults
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Config::resolve(explicit, &cwd).context("failed to load settings")
}
