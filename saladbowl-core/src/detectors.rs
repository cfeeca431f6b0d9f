//! Error pattern registry
//!
//! Every definition carries an ordered list of (pattern, classification)
//! detectors: the standard list first, then the plugin's own additions.
//! Order matters because supervisors apply first-match-wins.
//!
//! The standard list is a process-wide constant. Per-definition lists are
//! always fresh vectors built by concatenation; nothing hands out a
//! mutable view of the standard list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DefinitionError;

/// What kind of failure a matched output line indicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    /// Executable quarantined or blocked by security software
    AntiVirus,
    /// GPU driver / runtime missing or broken
    Driver,
    /// Device or host ran out of memory
    Memory,
    /// Pool unreachable or connection dropped
    Network,
    /// Hardware cannot run this algorithm
    Unsupported,
    Unknown,
}

/// Supervisor reaction to a classified error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// Kill and restart the process
    Restart,
    /// Stop supervising; the definition will not start on this host
    Fatal,
}

impl ErrorClass {
    /// Restarting cannot fix a broken driver, a quarantined binary or
    /// unsupported hardware; everything else gets another attempt.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorClass::AntiVirus | ErrorClass::Driver | ErrorClass::Unsupported => {
                Severity::Fatal
            }
            ErrorClass::Memory | ErrorClass::Network | ErrorClass::Unknown => Severity::Restart,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::AntiVirus => "anti-virus",
            ErrorClass::Driver => "driver",
            ErrorClass::Memory => "memory",
            ErrorClass::Network => "network",
            ErrorClass::Unsupported => "unsupported",
            ErrorClass::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A detector for scanning process output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPattern {
    /// Regular expression matched against single output lines
    pub pattern: String,

    pub classification: ErrorClass,
}

impl ErrorPattern {
    pub fn new(pattern: impl Into<String>, classification: ErrorClass) -> Self {
        Self {
            pattern: pattern.into(),
            classification,
        }
    }

    pub fn compile(&self) -> Result<Regex, DefinitionError> {
        compile_pattern(&self.pattern)
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, DefinitionError> {
    Regex::new(pattern).map_err(|source| DefinitionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

static STANDARD_ERRORS: Lazy<Vec<ErrorPattern>> = Lazy::new(|| {
    use ErrorClass::*;
    [
        (r"(?i)is not recognized as an internal or external command", AntiVirus),
        (r"(?i)the system cannot find the (?:file|path) specified", AntiVirus),
        (r"(?i)operation did not complete successfully because the file contains a virus", AntiVirus),
        (r"(?i)access is denied", AntiVirus),
        (r"(?i)cuda (?:driver version is insufficient|error 35)", Driver),
        (r"(?i)no cuda (?:capable )?devices? (?:were )?(?:found|detected)", Driver),
        (r"(?i)failed to (?:load|initialize) (?:cuda|opencl|nvml)", Driver),
        (r"(?i)clGetPlatformIDs|CL_PLATFORM_NOT_FOUND", Driver),
        (r"(?i)out of memory|CUDA_ERROR_OUT_OF_MEMORY|CL_MEM_OBJECT_ALLOCATION_FAILURE", Memory),
        (r"(?i)not enough (?:video |gpu )?memory", Memory),
        (r"(?i)connection (?:refused|reset|timed out)", Network),
        (r"(?i)(?:getaddrinfo|dns) (?:error|failed)|failed to resolve", Network),
        (r"(?i)no active pools", Network),
        (r"(?i)algorithm .* (?:is )?not supported", Unsupported),
        (r"(?i)illegal instruction", Unsupported),
    ]
    .into_iter()
    .map(|(pattern, class)| ErrorPattern::new(pattern, class))
    .collect()
});

/// Access to the standard detectors and per-definition composition
pub struct ErrorPatternRegistry;

impl ErrorPatternRegistry {
    /// Standard detectors applied to every definition
    pub fn standard() -> &'static [ErrorPattern] {
        &STANDARD_ERRORS
    }

    /// Standard detectors followed by `extra`, as a new list
    pub fn compose(extra: &[ErrorPattern]) -> Vec<ErrorPattern> {
        let standard = Self::standard();
        let mut patterns = Vec::with_capacity(standard.len() + extra.len());
        patterns.extend_from_slice(standard);
        patterns.extend_from_slice(extra);
        patterns
    }
}

/// Compiled, ordered detectors for scanning output
#[derive(Debug, Clone)]
pub struct DetectorSet {
    detectors: Vec<(Regex, ErrorPattern)>,
}

impl DetectorSet {
    pub fn compile(patterns: &[ErrorPattern]) -> Result<Self, DefinitionError> {
        let detectors = patterns
            .iter()
            .map(|p| Ok((p.compile()?, p.clone())))
            .collect::<Result<Vec<_>, DefinitionError>>()?;
        Ok(Self { detectors })
    }

    /// First detector matching the line, in list order
    pub fn first_match(&self, line: &str) -> Option<&ErrorPattern> {
        self.detectors
            .iter()
            .find(|(regex, _)| regex.is_match(line))
            .map(|(_, pattern)| pattern)
    }
}
