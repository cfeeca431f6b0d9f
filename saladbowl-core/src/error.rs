//! Definition error types
//!
//! Raised while validating authored data (manifests, templates, patterns).
//! Resolution itself never produces these: malformed catalog entries are
//! skipped, see [`crate::assembler::SkipReason`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Unsupported apiVersion '{found}'. Expected '{expected}'")]
    UnsupportedApiVersion {
        found: String,
        expected: &'static str,
    },

    #[error("Invalid kind '{found}'. Expected '{expected}'")]
    InvalidKind {
        found: String,
        expected: &'static str,
    },

    #[error("Plugin #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("Plugin '{plugin}' references unknown catalog '{catalog}'")]
    UnknownCatalog { plugin: String, catalog: String },

    #[error("Invalid minimum version '{version}' for plugin '{plugin}'")]
    InvalidMinimumVersion {
        plugin: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown placeholder '{{{{{placeholder}}}}}' in connection template '{template}'")]
    UnknownPlaceholder {
        placeholder: String,
        template: String,
    },

    #[error("Connection template for plugin '{plugin}' has no locations")]
    NoLocations { plugin: String },
}
