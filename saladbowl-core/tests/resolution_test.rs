//! Integration tests for catalog resolution
//!
//! Covers version gating, platform filtering, determinism and the
//! append-only composition of error patterns.

mod common;

use common::{init_test_logging, kawpow_template, linux_download, nicehash_accounts};
use pretty_assertions::assert_eq;
use saladbowl_core::requirements::has_gpu;
use saladbowl_core::{
    assemble, Account, Download, ErrorClass, ErrorPattern, ErrorPatternRegistry, Platform,
    PluginManifest,
};

#[test]
fn test_kawpow_gated_at_six() {
    init_test_logging();

    let catalog = vec![linux_download("5.9.0", "a"), linux_download("6.0.0", "b")];
    let account = Account::new("ADDR", "RIG");

    let definitions = assemble(&kawpow_template(), &catalog, &account, Platform::Linux);

    assert_eq!(definitions.len(), 1);
    let definition = &definitions[0];
    assert_eq!(definition.version, "6.0.0");
    assert_eq!(definition.download_url, "b");
    assert_eq!(definition.algorithm, "KawPow");
    assert_eq!(definition.requirements.to_vec(), vec![has_gpu("*", 3072)]);
    assert_eq!(definition.supervision.initial_timeout, 600_000);
    assert_eq!(definition.supervision.initial_retries, 3);
    assert_eq!(definition.supervision.watchdog_timeout, 900_000);
}

#[test]
fn test_kawpow_launch_arguments() {
    let catalog = vec![linux_download("6.3.0", "b")];
    let definitions = assemble(
        &kawpow_template(),
        &catalog,
        &Account::new("ADDR", "RIG"),
        Platform::Linux,
    );

    let args = &definitions[0].args;
    assert!(args.starts_with("--no-cpu --cuda --opencl --donate-level=1 -o "));

    let usa = args.find("kawpow.usa.nicehash.com").unwrap();
    let eu = args.find("kawpow.eu.nicehash.com").unwrap();
    assert!(usa < eu, "fragments keep location order");
    assert_eq!(args.matches("-u ADDR.RIG").count(), 2);
    assert_eq!(definitions[0].exe, "xmrig");
}

#[test]
fn test_below_threshold_never_emitted() {
    let catalog: Vec<Download> = ["1.0.0", "5.99.99", "v5.11.1", "5.9.0-beta", "6.0.0-rc1"]
        .iter()
        .map(|v| linux_download(v, "url"))
        .collect();

    let definitions = assemble(
        &kawpow_template(),
        &catalog,
        &Account::new("A", "R"),
        Platform::Linux,
    );

    // "6.0.0-rc1" coerces to 6.0.0 and passes
    let versions: Vec<&str> = definitions.iter().map(|d| d.version.as_str()).collect();
    assert_eq!(versions, vec!["6.0.0-rc1"]);
}

#[test]
fn test_garbage_versions_are_omitted() {
    let catalog = vec![
        linux_download("", "a"),
        linux_download("latest", "b"),
        linux_download("6.1.0", "c"),
        linux_download("v?.?.?", "d"),
    ];

    let resolution = kawpow_template().resolve(&catalog, &Account::new("A", "R"), Platform::Linux);
    assert_eq!(resolution.definitions.len(), 1);
    assert_eq!(resolution.definitions[0].download_url, "c");
    assert_eq!(resolution.skipped.len(), 3);
}

#[test]
fn test_missing_platform_artifact_never_emitted() {
    let catalog = vec![
        Download::new("6.1.0").with_url(Platform::Windows, "win"),
        Download::new("6.2.0").with_url(Platform::Linux, ""),
        Download::new("6.3.0")
            .with_url(Platform::Linux, "linux")
            .with_url(Platform::Macos, "mac"),
    ];
    let account = Account::new("A", "R");
    let template = kawpow_template();

    for platform in Platform::ALL {
        let definitions = assemble(&template, &catalog, &account, platform);
        for definition in &definitions {
            let entry = catalog
                .iter()
                .find(|d| d.version == definition.version)
                .unwrap();
            assert_eq!(entry.url_for(platform), Some(definition.download_url.as_str()));
        }
    }

    let linux = assemble(&template, &catalog, &account, Platform::Linux);
    assert_eq!(linux.len(), 1);
    assert_eq!(linux[0].version, "6.3.0");
}

#[test]
fn test_output_mirrors_catalog_order() {
    let catalog = vec![
        linux_download("6.3.0", "c"),
        linux_download("6.0.1", "a"),
        linux_download("6.2.0", "b"),
    ];
    let definitions = assemble(
        &kawpow_template(),
        &catalog,
        &Account::new("A", "R"),
        Platform::Linux,
    );
    let urls: Vec<&str> = definitions.iter().map(|d| d.download_url.as_str()).collect();
    assert_eq!(urls, vec!["c", "a", "b"]);
}

#[test]
fn test_resolution_is_deterministic() {
    let manifest = PluginManifest::builtin().unwrap();
    let accounts = nicehash_accounts();

    let first = manifest.resolve(&accounts, Platform::Linux);
    let second = manifest.resolve(&accounts, Platform::Linux);
    assert_eq!(first, second);
    assert!(!first.definitions.is_empty());
}

#[test]
fn test_standard_errors_first_and_unchanged() {
    let snapshot = ErrorPatternRegistry::standard().to_vec();

    let mut template = kawpow_template();
    template.errors = vec![ErrorPattern::new("(?i)share rejected", ErrorClass::Unknown)];
    let catalog = vec![linux_download("6.2.0", "a"), linux_download("6.3.0", "b")];
    let account = Account::new("A", "R");

    for _ in 0..3 {
        let definitions = assemble(&template, &catalog, &account, Platform::Linux);
        for definition in &definitions {
            let (standard, extra) = definition.errors.split_at(snapshot.len());
            assert_eq!(standard, snapshot.as_slice());
            assert_eq!(extra, template.errors.as_slice());
        }
    }

    assert_eq!(ErrorPatternRegistry::standard(), snapshot.as_slice());
}

#[test]
fn test_requirements_shared_not_copied() {
    let template = kawpow_template();
    let catalog = vec![linux_download("6.2.0", "a"), linux_download("6.3.0", "b")];
    let definitions = assemble(&template, &catalog, &Account::new("A", "R"), Platform::Linux);

    assert!(std::sync::Arc::ptr_eq(
        &definitions[0].requirements,
        &definitions[1].requirements
    ));
    assert!(std::sync::Arc::ptr_eq(
        &definitions[0].requirements,
        &template.requirements
    ));
}

#[test]
fn test_builtin_manifest_resolution() {
    init_test_logging();

    let manifest = PluginManifest::builtin().unwrap();
    let resolution = manifest.resolve(&nicehash_accounts(), Platform::Linux);

    // KawPow: 6.2.2 and 6.3.0; RandomX: every release
    let ids: Vec<String> = resolution.definitions.iter().map(|d| d.id()).collect();
    assert_eq!(
        ids,
        vec![
            "XMRig/KawPow@6.2.2",
            "XMRig/KawPow@6.3.0",
            "XMRig/RandomX@5.11.1",
            "XMRig/RandomX@6.2.2",
            "XMRig/RandomX@6.3.0",
        ]
    );

    let randomx = resolution
        .definitions
        .iter()
        .find(|d| d.algorithm == "RandomX")
        .unwrap();
    assert_eq!(
        randomx.errors.last().unwrap().classification,
        ErrorClass::Memory
    );

    let macos = manifest.definitions(&nicehash_accounts(), Platform::Macos);
    assert_eq!(macos.len(), 2);
}

#[test]
fn test_concurrent_resolution() {
    let manifest = PluginManifest::builtin().unwrap();
    let accounts = nicehash_accounts();
    let expected = manifest.resolve(&accounts, Platform::Windows);

    let manifest = &manifest;
    let accounts = &accounts;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(move || manifest.resolve(accounts, Platform::Windows)))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
