//! Resolution, eligibility and lint commands

use anyhow::{anyhow, Context, Result};
use clap::Args;
use saladbowl_core::config::{self, ConfigPaths};
use saladbowl_core::{
    ErrorPatternRegistry, HardwareCapabilities, Platform, PluginDefinition, PluginManifest,
    Resolution,
};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;

/// Where the manifest and accounts come from, and which platform to resolve for
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Manifest file (defaults to the built-in manifest plus config overlay)
    #[clap(long)]
    pub manifest: Option<PathBuf>,

    /// Accounts file (defaults to accounts.yaml in the config directory)
    #[clap(long)]
    pub accounts: Option<PathBuf>,

    /// Target platform (linux, windows, macos); defaults to the host
    #[clap(long)]
    pub platform: Option<Platform>,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

/// Table row for resolved definitions
#[derive(Tabled)]
struct DefinitionRow {
    #[tabled(rename = "Plugin")]
    name: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Executable")]
    exe: String,
    #[tabled(rename = "Errors")]
    errors: usize,
}

/// Table row for skipped catalog entries
#[derive(Tabled)]
struct SkippedRow {
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Table row for eligibility checks
#[derive(Tabled)]
struct EligibilityRow {
    #[tabled(rename = "Plugin")]
    id: String,
    #[tabled(rename = "Eligible")]
    eligible: String,
    #[tabled(rename = "Unmet Requirements")]
    unmet: String,
}

/// Table row for standard error patterns
#[derive(Tabled)]
struct PatternRow {
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Classification")]
    classification: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

fn render_table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

fn resolve_platform(requested: Option<Platform>) -> Result<Platform> {
    requested
        .or_else(Platform::current)
        .ok_or_else(|| anyhow!("Unsupported host platform. Pass --platform explicitly"))
}

fn resolve_source(config_dir: Option<PathBuf>, source: &SourceArgs) -> Result<Resolution> {
    let paths = ConfigPaths::discover_with_override(config_dir)?;
    let platform = resolve_platform(source.platform)?;

    let manifest = config::load_manifest(paths.as_ref(), source.manifest.as_deref())?;
    manifest.validate().context("Manifest failed validation")?;
    let accounts = config::load_accounts(paths.as_ref(), source.accounts.as_deref())?;

    debug!(
        "Resolving {} plugins over {} downloads for {platform}",
        manifest.plugins.len(),
        manifest.download_count()
    );
    Ok(manifest.resolve(&accounts, platform))
}

/// Resolve the manifest and print definitions
pub fn resolve_command(
    config_dir: Option<PathBuf>,
    source: SourceArgs,
    output: OutputArgs,
    show_skipped: bool,
) -> Result<()> {
    let resolution = resolve_source(config_dir, &source)?;

    if output.json {
        let json = if show_skipped {
            serde_json::to_string_pretty(&resolution)?
        } else {
            serde_json::to_string_pretty(&resolution.definitions)?
        };
        println!("{json}");
        return Ok(());
    }

    if resolution.definitions.is_empty() {
        println!("No plugin definitions resolved.");
    } else {
        println!("\nResolved {} definition(s):\n", resolution.definitions.len());
        let rows: Vec<DefinitionRow> = resolution
            .definitions
            .iter()
            .map(|definition| DefinitionRow {
                name: definition.name.clone(),
                algorithm: definition.algorithm.clone(),
                version: definition.version.clone(),
                exe: definition.exe.clone(),
                errors: definition.errors.len(),
            })
            .collect();
        println!("{}", render_table(&rows));
    }

    if show_skipped && !resolution.skipped.is_empty() {
        println!("\nSkipped {} catalog entries:\n", resolution.skipped.len());
        let rows: Vec<SkippedRow> = resolution
            .skipped
            .iter()
            .map(|entry| SkippedRow {
                plugin: entry.plugin.clone(),
                algorithm: entry.algorithm.clone(),
                version: entry.version.clone().unwrap_or_else(|| "-".to_string()),
                reason: entry.reason.to_string(),
            })
            .collect();
        println!("{}", render_table(&rows));
    }

    Ok(())
}

fn eligibility_row(definition: &PluginDefinition, report: &HardwareCapabilities) -> EligibilityRow {
    let unmet: Vec<String> = definition
        .unsatisfied_requirements(report)
        .iter()
        .map(ToString::to_string)
        .collect();

    EligibilityRow {
        id: definition.id(),
        eligible: if unmet.is_empty() { "yes" } else { "no" }.to_string(),
        unmet: if unmet.is_empty() {
            "-".to_string()
        } else {
            unmet.join(", ")
        },
    }
}

/// Evaluate every resolved definition against a capability report
pub fn check_command(
    config_dir: Option<PathBuf>,
    source: SourceArgs,
    capabilities: PathBuf,
    output: OutputArgs,
) -> Result<()> {
    let report = config::load_capabilities(&capabilities)?;
    let resolution = resolve_source(config_dir, &source)?;
    let rows: Vec<EligibilityRow> = resolution
        .definitions
        .iter()
        .map(|definition| eligibility_row(definition, &report))
        .collect();

    if output.json {
        let json: Vec<serde_json::Value> = resolution
            .definitions
            .iter()
            .map(|definition| {
                serde_json::json!({
                    "id": definition.id(),
                    "eligible": definition.is_eligible(&report),
                    "unmet": definition.unsatisfied_requirements(&report),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let eligible = rows.iter().filter(|row| row.eligible == "yes").count();
    println!("\n{eligible} of {} definition(s) eligible:\n", rows.len());
    println!("{}", render_table(&rows));
    Ok(())
}

/// Validate a manifest and summarize it
pub fn lint_command(config_dir: Option<PathBuf>, manifest: Option<PathBuf>) -> Result<()> {
    let paths = ConfigPaths::discover_with_override(config_dir)?;
    let loaded = config::load_manifest(paths.as_ref(), manifest.as_deref())?;
    lint_manifest(&loaded)?;

    println!(
        "✅ Manifest is valid: {} plugin(s), {} catalog(s), {} download(s)",
        loaded.plugins.len(),
        loaded.catalogs.len(),
        loaded.download_count()
    );
    println!("   Pools referenced: {}", loaded.pools().join(", "));
    Ok(())
}

fn lint_manifest(manifest: &PluginManifest) -> Result<()> {
    manifest.validate().context("Manifest failed validation")?;

    for template in &manifest.plugins {
        let downloads = manifest.catalog(&template.catalog).unwrap_or_default();
        let gate = template.gate()?;
        if !downloads.iter().any(|download| gate.admits_raw(&download.version)) {
            println!(
                "⚠️  {} ({}) has no catalog version at or above its minimum",
                template.name, template.algorithm
            );
        }
    }
    Ok(())
}

/// List the standard error patterns
pub fn errors_command(output: OutputArgs) -> Result<()> {
    let patterns = ErrorPatternRegistry::standard();

    if output.json {
        println!("{}", serde_json::to_string_pretty(patterns)?);
        return Ok(());
    }

    let rows: Vec<PatternRow> = patterns
        .iter()
        .map(|pattern| PatternRow {
            pattern: pattern.pattern.clone(),
            classification: pattern.classification.to_string(),
            severity: format!("{:?}", pattern.classification.severity()),
        })
        .collect();

    println!("\n{} standard error pattern(s):\n", rows.len());
    println!("{}", render_table(&rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use saladbowl_core::requirements::{CpuInfo, GpuInfo};

    #[test]
    fn test_builtin_manifest_lints_clean() {
        let manifest = PluginManifest::builtin().unwrap();
        assert!(lint_manifest(&manifest).is_ok());
    }

    #[test]
    fn test_eligibility_row_lists_unmet_requirements() {
        let manifest = PluginManifest::builtin().unwrap();
        let accounts = saladbowl_core::Accounts::new()
            .with("nicehash", saladbowl_core::Account::new("3Addr", "rig1"));
        let definitions = manifest.definitions(&accounts, Platform::Linux);
        let kawpow = definitions
            .iter()
            .find(|d| d.algorithm == "KawPow")
            .unwrap();

        let weak = HardwareCapabilities {
            gpus: vec![GpuInfo {
                model: "GTX 1050".to_string(),
                vram_mb: 2048,
            }],
            cpu: Some(CpuInfo {
                model: "Ryzen 5".to_string(),
                cores: 6,
            }),
            ram_mb: Some(16384),
            disk_free_mb: None,
        };

        let row = eligibility_row(kawpow, &weak);
        assert_eq!(row.eligible, "no");
        assert_ne!(row.unmet, "-");
    }

    #[test]
    fn test_explicit_platform_wins() {
        assert_eq!(resolve_platform(Some(Platform::Macos)).unwrap(), Platform::Macos);
    }
}
