//! Shared helpers for integration tests

use saladbowl_core::{Account, Accounts, Download, Platform, PluginManifest, PluginTemplate};
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

#[allow(dead_code)]
pub fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[allow(dead_code)]
pub fn nicehash_accounts() -> Accounts {
    Accounts::new().with("nicehash", Account::new("ADDR", "RIG"))
}

/// The built-in XMRig KawPow template
#[allow(dead_code)]
pub fn kawpow_template() -> PluginTemplate {
    PluginManifest::builtin()
        .expect("built-in manifest parses")
        .plugins
        .into_iter()
        .find(|p| p.algorithm == "KawPow")
        .expect("built-in manifest has a KawPow template")
}

#[allow(dead_code)]
pub fn linux_download(version: &str, url: &str) -> Download {
    Download::new(version).with_url(Platform::Linux, url)
}
