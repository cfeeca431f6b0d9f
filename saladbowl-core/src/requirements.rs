//! Hardware requirements and their evaluation
//!
//! A [`Requirement`] is plain data: a capability kind, an optional model
//! matcher and a minimum threshold. Evaluation runs against a
//! caller-supplied [`HardwareCapabilities`] report; nothing here probes the
//! host. Definitions keep their requirement list so consumers can evaluate
//! it against a fresh report right before launch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model matcher for GPU/CPU requirements
///
/// Serialized as a plain string: `"*"` matches any detected model,
/// anything else must match the detected model exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelMatcher {
    #[default]
    Any,
    Exact(String),
}

impl ModelMatcher {
    pub const WILDCARD: &'static str = "*";

    pub fn matches(&self, model: &str) -> bool {
        match self {
            ModelMatcher::Any => true,
            ModelMatcher::Exact(expected) => expected == model,
        }
    }
}

impl From<String> for ModelMatcher {
    fn from(value: String) -> Self {
        if value == Self::WILDCARD {
            ModelMatcher::Any
        } else {
            ModelMatcher::Exact(value)
        }
    }
}

impl From<&str> for ModelMatcher {
    fn from(value: &str) -> Self {
        ModelMatcher::from(value.to_string())
    }
}

impl From<ModelMatcher> for String {
    fn from(value: ModelMatcher) -> Self {
        match value {
            ModelMatcher::Any => ModelMatcher::WILDCARD.to_string(),
            ModelMatcher::Exact(model) => model,
        }
    }
}

impl fmt::Display for ModelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelMatcher::Any => f.write_str(Self::WILDCARD),
            ModelMatcher::Exact(model) => f.write_str(model),
        }
    }
}

/// Capability kinds a requirement can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Gpu,
    Cpu,
    Ram,
    Disk,
}

/// A hardware predicate a host must satisfy before launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Requirement {
    /// Some GPU matching `model` with at least `min_vram_mb` of VRAM
    Gpu {
        #[serde(default)]
        model: ModelMatcher,
        min_vram_mb: u64,
    },
    /// A CPU matching `model` with at least `min_cores` logical cores
    Cpu {
        #[serde(default)]
        model: ModelMatcher,
        min_cores: u32,
    },
    /// At least `min_mb` of system memory
    Ram { min_mb: u64 },
    /// At least `min_free_mb` of free disk space
    Disk { min_free_mb: u64 },
}

/// Requirement for a GPU with at least `min_vram_mb` MB of VRAM
pub fn has_gpu(model: impl Into<ModelMatcher>, min_vram_mb: u64) -> Requirement {
    Requirement::Gpu {
        model: model.into(),
        min_vram_mb,
    }
}

pub fn has_cpu(model: impl Into<ModelMatcher>, min_cores: u32) -> Requirement {
    Requirement::Cpu {
        model: model.into(),
        min_cores,
    }
}

pub fn has_ram(min_mb: u64) -> Requirement {
    Requirement::Ram { min_mb }
}

pub fn has_disk(min_free_mb: u64) -> Requirement {
    Requirement::Disk { min_free_mb }
}

impl Requirement {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Requirement::Gpu { .. } => CapabilityKind::Gpu,
            Requirement::Cpu { .. } => CapabilityKind::Cpu,
            Requirement::Ram { .. } => CapabilityKind::Ram,
            Requirement::Disk { .. } => CapabilityKind::Disk,
        }
    }

    pub fn threshold(&self) -> u64 {
        match self {
            Requirement::Gpu { min_vram_mb, .. } => *min_vram_mb,
            Requirement::Cpu { min_cores, .. } => u64::from(*min_cores),
            Requirement::Ram { min_mb } => *min_mb,
            Requirement::Disk { min_free_mb } => *min_free_mb,
        }
    }

    /// Evaluate against a capability report. Missing capabilities fail.
    pub fn is_satisfied_by(&self, report: &HardwareCapabilities) -> bool {
        match self {
            Requirement::Gpu { model, min_vram_mb } => report
                .gpus
                .iter()
                .any(|gpu| model.matches(&gpu.model) && gpu.vram_mb >= *min_vram_mb),
            Requirement::Cpu { model, min_cores } => report
                .cpu
                .as_ref()
                .is_some_and(|cpu| model.matches(&cpu.model) && cpu.cores >= *min_cores),
            Requirement::Ram { min_mb } => report.ram_mb.is_some_and(|ram| ram >= *min_mb),
            Requirement::Disk { min_free_mb } => {
                report.disk_free_mb.is_some_and(|free| free >= *min_free_mb)
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Gpu { model, min_vram_mb } => {
                write!(f, "gpu {model} >= {min_vram_mb} MB VRAM")
            }
            Requirement::Cpu { model, min_cores } => write!(f, "cpu {model} >= {min_cores} cores"),
            Requirement::Ram { min_mb } => write!(f, "ram >= {min_mb} MB"),
            Requirement::Disk { min_free_mb } => write!(f, "disk >= {min_free_mb} MB free"),
        }
    }
}

/// True when every requirement holds for the report
pub fn is_eligible(requirements: &[Requirement], report: &HardwareCapabilities) -> bool {
    requirements.iter().all(|r| r.is_satisfied_by(report))
}

/// Requirements the report fails, in declared order
pub fn unsatisfied<'a>(
    requirements: &'a [Requirement],
    report: &HardwareCapabilities,
) -> Vec<&'a Requirement> {
    requirements
        .iter()
        .filter(|r| !r.is_satisfied_by(report))
        .collect()
}

/// Hardware capability report produced by an external detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareCapabilities {
    #[serde(default)]
    pub gpus: Vec<GpuInfo>,

    #[serde(default)]
    pub cpu: Option<CpuInfo>,

    #[serde(default)]
    pub ram_mb: Option<u64>,

    #[serde(default)]
    pub disk_free_mb: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub model: String,
    pub vram_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuInfo {
    pub model: String,
    pub cores: u32,
}
