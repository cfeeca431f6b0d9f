//! Resolved plugin definitions
//!
//! A [`PluginDefinition`] is everything a supervisor needs to download,
//! launch and watch one workload: artifact URL, command line, the output
//! pattern that proves the process is working, the supervision policy and
//! the error detectors. It also carries the requirement list so the
//! consumer can check eligibility against a live capability report.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::detectors::ErrorPattern;
use crate::requirements::{self, HardwareCapabilities, Requirement};

/// Startup and watchdog parameters, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisionPolicy {
    /// Time allowed for the success signal to appear after each start
    #[serde(default = "default_initial_timeout")]
    pub initial_timeout: u64,

    /// Restarts allowed before the definition is declared failed
    #[serde(default = "default_initial_retries")]
    pub initial_retries: u32,

    /// Longest silence tolerated from a running process
    #[serde(default = "default_watchdog_timeout")]
    pub watchdog_timeout: u64,
}

impl Default for SupervisionPolicy {
    fn default() -> Self {
        Self {
            initial_timeout: default_initial_timeout(),
            initial_retries: default_initial_retries(),
            watchdog_timeout: default_watchdog_timeout(),
        }
    }
}

fn default_initial_timeout() -> u64 {
    600_000
}

fn default_initial_retries() -> u32 {
    3
}

fn default_watchdog_timeout() -> u64 {
    900_000
}

impl SupervisionPolicy {
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_timeout)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout)
    }
}

/// A fully resolved, launchable workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDefinition {
    pub name: String,

    /// Version string exactly as published in the catalog
    pub version: String,

    pub algorithm: String,

    pub download_url: String,

    /// Executable file name inside the extracted artifact
    pub exe: String,

    /// Complete argument string: static flags, then connection fragments
    pub args: String,

    /// Pattern that proves the process is doing useful work
    pub running_check: String,

    #[serde(flatten)]
    pub supervision: SupervisionPolicy,

    /// Standard detectors first, then plugin-specific ones
    pub errors: Vec<ErrorPattern>,

    /// Shared with the template and every sibling definition
    pub requirements: Arc<[Requirement]>,
}

impl PluginDefinition {
    /// Stable identifier: `name/algorithm@version`
    pub fn id(&self) -> String {
        format!("{}/{}@{}", self.name, self.algorithm, self.version)
    }

    pub fn is_eligible(&self, report: &HardwareCapabilities) -> bool {
        requirements::is_eligible(&self.requirements, report)
    }

    pub fn unsatisfied_requirements(&self, report: &HardwareCapabilities) -> Vec<&Requirement> {
        requirements::unsatisfied(&self.requirements, report)
    }
}
