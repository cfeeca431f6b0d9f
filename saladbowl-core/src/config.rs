//! Configuration discovery and loading
//!
//! Resolution order for the manifest:
//! 1. Explicit `--manifest` file (used as-is)
//! 2. Built-in manifest, overlaid with `<config dir>/manifest.yaml` if present
//!
//! Accounts come from an explicit file or `<config dir>/accounts.yaml`.
//! The config dir is the `--config-dir` override or the platform directory:
//! - Linux: ~/.config/saladbowl/
//! - macOS: ~/Library/Application Support/io.salad.saladbowl/
//! - Windows: %APPDATA%\salad\saladbowl\config\

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::connection::Accounts;
use crate::manifest::PluginManifest;
use crate::requirements::HardwareCapabilities;

/// Paths inside the SaladBowl config directory
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub root: PathBuf,
    /// Manifest overlay (manifest.yaml)
    pub manifest: PathBuf,
    /// Pool accounts (accounts.yaml)
    pub accounts: PathBuf,
}

impl ConfigPaths {
    /// Discover the platform config directory. `None` if it does not exist.
    pub fn discover() -> Result<Option<Self>> {
        Self::discover_with_override(None)
    }

    /// Discover with an optional CLI override, which must be an existing directory
    pub fn discover_with_override(cli_override: Option<PathBuf>) -> Result<Option<Self>> {
        trace!("Discovering config paths");

        if let Some(override_path) = cli_override {
            if !override_path.is_dir() {
                return Err(anyhow!(
                    "Config directory does not exist: {}",
                    override_path.display()
                ));
            }
            debug!("Using --config-dir override: {}", override_path.display());
            return Ok(Some(Self::from_root(override_path)));
        }

        let root = directories::ProjectDirs::from("io", "salad", "saladbowl")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .context("Could not determine platform config directory")?;

        if !root.exists() {
            debug!("No config directory at {}", root.display());
            return Ok(None);
        }

        info!("Using config directory {}", root.display());
        Ok(Some(Self::from_root(root)))
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            manifest: root.join("manifest.yaml"),
            accounts: root.join("accounts.yaml"),
            root,
        }
    }
}

/// Load the manifest following the documented precedence
pub fn load_manifest(
    paths: Option<&ConfigPaths>,
    explicit: Option<&Path>,
) -> Result<PluginManifest> {
    if let Some(path) = explicit {
        return PluginManifest::from_file(path);
    }

    let mut manifest = PluginManifest::builtin()?;
    if let Some(overlay) = paths.map(|p| &p.manifest).filter(|p| p.exists()) {
        manifest.merge(PluginManifest::from_file(overlay)?);
    }
    Ok(manifest)
}

/// Load pool accounts from an explicit file or the config directory
pub fn load_accounts(paths: Option<&ConfigPaths>, explicit: Option<&Path>) -> Result<Accounts> {
    let path = match (explicit, paths) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(paths)) if paths.accounts.exists() => paths.accounts.clone(),
        _ => {
            return Err(anyhow!(
                "No accounts configured. Pass --accounts or create accounts.yaml in the config directory"
            ))
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read accounts: {}", path.display()))?;
    Accounts::from_yaml(&content)
        .with_context(|| format!("Failed to parse accounts: {}", path.display()))
}

/// Load a capability report; `.json` files are JSON, anything else YAML
pub fn load_capabilities(path: &Path) -> Result<HardwareCapabilities> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capability report: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse capability report: {}", path.display()))
    } else {
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse capability report: {}", path.display()))
    }
}
