//! Integration tests for the `saladbowl` binary
//!
//! Each test runs against a scratch config directory so the host's
//! real configuration never leaks in.

use anyhow::Result;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const ACCOUNTS: &str = r#"
nicehash:
  address: 3FkaDMkGf1KxpmSLmgSy4hMbrpuXVYQd3Z
  rigId: RIG-1
"#;

fn config_dir() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("accounts.yaml"), ACCOUNTS)?;
    Ok(dir)
}

fn run(config: &TempDir, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_saladbowl"))
        .args(args)
        .arg("--config-dir")
        .arg(config.path())
        .output()?;
    Ok(output)
}

fn stdout_json(output: &Output) -> Result<serde_json::Value> {
    if !output.status.success() {
        anyhow::bail!(
            "saladbowl failed:\nstderr: {}\nstdout: {}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_resolve_json_for_linux() -> Result<()> {
    let config = config_dir()?;
    let output = run(&config, &["resolve", "--platform", "linux", "--json"])?;
    let definitions = stdout_json(&output)?;

    let definitions = definitions.as_array().expect("definitions array");
    assert_eq!(definitions.len(), 5);

    let kawpow = definitions
        .iter()
        .find(|d| d["algorithm"] == "KawPow")
        .expect("kawpow definition");
    let args = kawpow["args"].as_str().unwrap();
    assert!(args.starts_with("--no-cpu --cuda --opencl --donate-level=1 -o stratum+tcp://"));
    assert!(args.contains("3FkaDMkGf1KxpmSLmgSy4hMbrpuXVYQd3Z.RIG-1"));
    assert_eq!(kawpow["initialTimeout"], 600000);
    Ok(())
}

#[test]
fn test_resolve_with_skipped_entries() -> Result<()> {
    let config = config_dir()?;
    let output = run(
        &config,
        &["resolve", "--platform", "linux", "--json", "--show-skipped"],
    )?;
    let resolution = stdout_json(&output)?;

    let skipped = resolution["skipped"].as_array().unwrap();
    assert!(skipped
        .iter()
        .any(|entry| entry["reason"]["kind"] == "versionBelowMinimum"));
    Ok(())
}

#[test]
fn test_resolve_without_accounts_fails() -> Result<()> {
    let config = TempDir::new()?;
    let output = run(&config, &["resolve", "--platform", "linux"])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No accounts configured"));
    Ok(())
}

#[test]
fn test_check_against_capability_report() -> Result<()> {
    let config = config_dir()?;
    let report = config.path().join("caps.json");
    fs::write(
        &report,
        r#"{"gpus": [{"model": "RTX 3070", "vramMb": 8192}], "ramMb": 2048}"#,
    )?;

    let output = run(
        &config,
        &[
            "check",
            "--platform",
            "linux",
            "--capabilities",
            report.to_str().unwrap(),
            "--json",
        ],
    )?;
    let checks = stdout_json(&output)?;

    for check in checks.as_array().unwrap() {
        let id = check["id"].as_str().unwrap();
        let expected = id.contains("KawPow");
        assert_eq!(check["eligible"], expected, "eligibility of {id}");
    }
    Ok(())
}

#[test]
fn test_lint_rejects_unknown_placeholder() -> Result<()> {
    let config = config_dir()?;
    let manifest = config.path().join("broken.yaml");
    fs::write(
        &manifest,
        r#"
apiVersion: saladbowl.dev/v1
kind: PluginManifest
catalogs:
  xmrig: []
plugins:
  - name: Broken
    catalog: xmrig
    algorithm: kawpow
    executable: xmrig
    connection:
      pool: nicehash
      template: "-o {{location}} -u {{worker}}"
      locations: [usa]
    runningCheck: accepted
"#,
    )?;

    let output = run(&config, &["lint", "--manifest", manifest.to_str().unwrap()])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("worker"));
    Ok(())
}

#[test]
fn test_errors_lists_standard_patterns() -> Result<()> {
    let config = config_dir()?;
    let output = run(&config, &["errors", "--json"])?;
    let patterns = stdout_json(&output)?;

    let patterns = patterns.as_array().unwrap();
    assert_eq!(patterns.len(), 15);
    assert!(patterns.iter().any(|p| p["classification"] == "driver"));
    Ok(())
}
