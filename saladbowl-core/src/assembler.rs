//! Plugin definition assembler
//!
//! Turns a [`PluginTemplate`] plus its download catalog into concrete
//! [`PluginDefinition`]s for one platform and account. Assembly is total:
//! catalog entries that cannot be used are skipped and reported, never
//! raised. Output follows catalog order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{coerce, Download, Platform, VersionGate};
use crate::connection::{Account, ConnectionSpec};
use crate::definition::{PluginDefinition, SupervisionPolicy};
use crate::detectors::{compile_pattern, ErrorPattern, ErrorPatternRegistry};
use crate::error::DefinitionError;
use crate::requirements::Requirement;

/// Authored description of one plugin (executable + algorithm)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginTemplate {
    /// Display name (e.g. "XMRig")
    pub name: String,

    /// Catalog family providing the downloads (e.g. "xmrig")
    pub catalog: String,

    pub algorithm: String,

    /// First catalog version supporting this algorithm
    #[serde(default)]
    pub min_version: Option<String>,

    /// Executable base name; `.exe` is appended on Windows
    pub executable: String,

    /// Static flags placed before the connection fragments
    #[serde(default)]
    pub args: String,

    pub connection: ConnectionSpec,

    pub running_check: String,

    #[serde(default)]
    pub supervision: SupervisionPolicy,

    /// Plugin-specific detectors, appended after the standard ones
    #[serde(default)]
    pub errors: Vec<ErrorPattern>,

    #[serde(default = "no_requirements")]
    pub requirements: Arc<[Requirement]>,
}

fn no_requirements() -> Arc<[Requirement]> {
    Arc::from(Vec::new())
}

impl PluginTemplate {
    /// Version gate for this template's minimum version
    pub fn gate(&self) -> Result<VersionGate, DefinitionError> {
        match self.min_version.as_deref() {
            None => Ok(VersionGate::open()),
            Some(min) => {
                VersionGate::parse(min).map_err(|source| DefinitionError::InvalidMinimumVersion {
                    plugin: self.name.clone(),
                    version: min.to_string(),
                    source,
                })
            }
        }
    }

    /// Check authored fields; `index` is the template's position for messages
    pub fn validate(&self, index: usize) -> Result<(), DefinitionError> {
        let required = [
            ("name", &self.name),
            ("catalog", &self.catalog),
            ("algorithm", &self.algorithm),
            ("executable", &self.executable),
            ("runningCheck", &self.running_check),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DefinitionError::EmptyField { index, field });
            }
        }

        self.gate()?;
        compile_pattern(&self.running_check)?;
        for pattern in &self.errors {
            pattern.compile()?;
        }

        self.connection.template.validate()?;
        if self.connection.locations.is_empty() {
            return Err(DefinitionError::NoLocations {
                plugin: self.name.clone(),
            });
        }

        Ok(())
    }

    /// Assemble definitions and report skipped catalog entries
    pub fn resolve(
        &self,
        downloads: &[Download],
        account: &Account,
        platform: Platform,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        self.resolve_into(downloads, account, platform, &mut resolution);
        resolution
    }

    pub(crate) fn resolve_into(
        &self,
        downloads: &[Download],
        account: &Account,
        platform: Platform,
        resolution: &mut Resolution,
    ) {
        let gate = match self.gate() {
            Ok(gate) => gate,
            Err(_) => {
                let minimum = self.min_version.clone().unwrap_or_default();
                resolution.skip(self, None, SkipReason::InvalidMinimumVersion { minimum });
                return;
            }
        };

        // Built once per template; identical for every catalog entry
        let args = self.launch_args(account);
        let errors = ErrorPatternRegistry::compose(&self.errors);
        let exe = platform.executable_name(&self.executable);

        for download in downloads {
            let Some(version) = coerce(&download.version) else {
                resolution.skip(
                    self,
                    Some(&download.version),
                    SkipReason::VersionParseFailure {
                        version: download.version.clone(),
                    },
                );
                continue;
            };

            if !gate.admits(&version) {
                resolution.skip(
                    self,
                    Some(&download.version),
                    SkipReason::VersionBelowMinimum {
                        version: download.version.clone(),
                        minimum: self.min_version.clone().unwrap_or_default(),
                    },
                );
                continue;
            }

            let Some(url) = download.url_for(platform) else {
                resolution.skip(
                    self,
                    Some(&download.version),
                    SkipReason::MissingPlatformArtifact {
                        version: download.version.clone(),
                        platform,
                    },
                );
                continue;
            };

            resolution.definitions.push(PluginDefinition {
                name: self.name.clone(),
                version: download.version.clone(),
                algorithm: self.algorithm.clone(),
                download_url: url.to_string(),
                exe: exe.clone(),
                args: args.clone(),
                running_check: self.running_check.clone(),
                supervision: self.supervision,
                errors: errors.clone(),
                requirements: Arc::clone(&self.requirements),
            });
        }
    }

    /// Static flags followed by one connection fragment per location
    pub fn launch_args(&self, account: &Account) -> String {
        std::iter::once(self.args.trim().to_string())
            .chain(self.connection.fragments(account))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Assemble the definitions for one template, dropping skip diagnostics
pub fn assemble(
    template: &PluginTemplate,
    downloads: &[Download],
    account: &Account,
    platform: Platform,
) -> Vec<PluginDefinition> {
    template.resolve(downloads, account, platform).definitions
}

/// Why a catalog entry (or a whole template) produced no definition
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    #[error("version '{version}' cannot be coerced to a semantic version")]
    VersionParseFailure { version: String },

    #[error("version '{version}' is below the minimum {minimum}")]
    VersionBelowMinimum { version: String, minimum: String },

    #[error("minimum version '{minimum}' is not a valid semantic version")]
    InvalidMinimumVersion { minimum: String },

    #[error("version '{version}' has no artifact for {platform}")]
    MissingPlatformArtifact { version: String, platform: Platform },

    #[error("no account configured for pool '{pool}'")]
    MissingAccount { pool: String },

    #[error("catalog '{catalog}' does not exist")]
    UnknownCatalog { catalog: String },
}

/// A template or catalog entry that was left out of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub plugin: String,
    pub algorithm: String,
    pub version: Option<String>,
    pub reason: SkipReason,
}

/// Output of a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub definitions: Vec<PluginDefinition>,
    pub skipped: Vec<SkippedEntry>,
}

impl Resolution {
    pub(crate) fn skip(
        &mut self,
        template: &PluginTemplate,
        version: Option<&str>,
        reason: SkipReason,
    ) {
        debug!(
            plugin = %template.name,
            algorithm = %template.algorithm,
            version = version.unwrap_or("-"),
            "Skipping: {reason}"
        );
        self.skipped.push(SkippedEntry {
            plugin: template.name.clone(),
            algorithm: template.algorithm.clone(),
            version: version.map(str::to_string),
            reason,
        });
    }
}
