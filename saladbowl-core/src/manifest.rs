//! Plugin manifest parsing (manifest.yaml)
//!
//! The manifest is the authored source of truth: download catalogs keyed
//! by executable family, and the ordered list of plugin templates that
//! draw from them.
//!
//! ```yaml
//! apiVersion: saladbowl.dev/v1
//! kind: PluginManifest
//! catalogs:
//!   xmrig:
//!     - version: "6.3.0"
//!       linuxUrl: https://...
//! plugins:
//!   - name: XMRig
//!     catalog: xmrig
//!     algorithm: KawPow
//!     minVersion: "6.0.0"
//!     ...
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::assembler::{PluginTemplate, Resolution, SkipReason};
use crate::catalog::{Download, Platform};
use crate::connection::Accounts;
use crate::definition::PluginDefinition;
use crate::error::DefinitionError;

pub const API_VERSION: &str = "saladbowl.dev/v1";
pub const KIND: &str = "PluginManifest";

const BUILTIN_MANIFEST: &str = include_str!("../manifests/default.yaml");

/// A plugin manifest (manifest.yaml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// API version (must be "saladbowl.dev/v1")
    pub api_version: String,

    /// Kind (must be "PluginManifest")
    pub kind: String,

    /// Download catalogs keyed by family name, each in publication order
    #[serde(default)]
    pub catalogs: BTreeMap<String, Vec<Download>>,

    /// Plugin templates in display order
    #[serde(default)]
    pub plugins: Vec<PluginTemplate>,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            catalogs: BTreeMap::new(),
            plugins: Vec::new(),
        }
    }
}

impl PluginManifest {
    /// Load manifest from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let manifest = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        info!(
            "Loaded manifest {} ({} plugins, {} catalogs)",
            path.display(),
            manifest.plugins.len(),
            manifest.catalogs.len()
        );
        Ok(manifest)
    }

    /// Parse manifest from YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid manifest YAML")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).context("Failed to serialize manifest")
    }

    /// The manifest compiled into the library
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_MANIFEST).context("Built-in manifest is invalid")
    }

    /// Validate the manifest contents
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.api_version != API_VERSION {
            return Err(DefinitionError::UnsupportedApiVersion {
                found: self.api_version.clone(),
                expected: API_VERSION,
            });
        }

        if self.kind != KIND {
            return Err(DefinitionError::InvalidKind {
                found: self.kind.clone(),
                expected: KIND,
            });
        }

        for (index, template) in self.plugins.iter().enumerate() {
            template.validate(index)?;

            if !self.catalogs.contains_key(&template.catalog) {
                return Err(DefinitionError::UnknownCatalog {
                    plugin: template.name.clone(),
                    catalog: template.catalog.clone(),
                });
            }
        }

        Ok(())
    }

    /// Downloads for a catalog family
    pub fn catalog(&self, name: &str) -> Option<&[Download]> {
        self.catalogs.get(name).map(Vec::as_slice)
    }

    /// Pools referenced by any template, deduplicated
    pub fn pools(&self) -> Vec<&str> {
        let mut pools: Vec<&str> = self
            .plugins
            .iter()
            .map(|p| p.connection.pool.as_str())
            .collect();
        pools.sort_unstable();
        pools.dedup();
        pools
    }

    pub fn download_count(&self) -> usize {
        self.catalogs.values().map(Vec::len).sum()
    }

    /// Overlay another manifest onto this one
    ///
    /// Downloads from `other` are appended to same-named catalogs, skipping
    /// versions already present. A template with the same name and
    /// algorithm replaces the existing one in place; new templates are
    /// appended.
    pub fn merge(&mut self, other: PluginManifest) {
        for (name, downloads) in other.catalogs {
            let existing = self.catalogs.entry(name).or_default();
            for download in downloads {
                if !existing.iter().any(|d| d.version == download.version) {
                    existing.push(download);
                }
            }
        }

        for template in other.plugins {
            match self
                .plugins
                .iter_mut()
                .find(|p| p.name == template.name && p.algorithm == template.algorithm)
            {
                Some(slot) => *slot = template,
                None => self.plugins.push(template),
            }
        }
    }

    /// Resolve every template for a platform
    ///
    /// Definitions come out in template order, then catalog order. A
    /// template whose pool has no account is skipped as a whole.
    pub fn resolve(&self, accounts: &Accounts, platform: Platform) -> Resolution {
        let mut resolution = Resolution::default();

        for template in &self.plugins {
            let Some(downloads) = self.catalog(&template.catalog) else {
                resolution.skip(
                    template,
                    None,
                    SkipReason::UnknownCatalog {
                        catalog: template.catalog.clone(),
                    },
                );
                continue;
            };

            let Some(account) = accounts.get(&template.connection.pool) else {
                warn!(
                    "No account for pool '{}', skipping {} ({})",
                    template.connection.pool, template.name, template.algorithm
                );
                resolution.skip(
                    template,
                    None,
                    SkipReason::MissingAccount {
                        pool: template.connection.pool.clone(),
                    },
                );
                continue;
            };

            template.resolve_into(downloads, account, platform, &mut resolution);
        }

        resolution
    }

    /// Resolve and keep only the definitions
    pub fn definitions(&self, accounts: &Accounts, platform: Platform) -> Vec<PluginDefinition> {
        self.resolve(accounts, platform).definitions
    }
}
