//! SaladBowl plugin definition registry
//!
//! Resolves a catalog of downloadable workloads into launchable
//! [`PluginDefinition`]s for a given platform and set of pool accounts.
//!
//! ```text
//! Manifest (YAML)
//!     │
//!     ├── catalogs ── Download ─► version gate ─┐
//!     └── plugins ── PluginTemplate ────────────┤
//!                                               ▼
//!     Accounts ─► connection templates ─► assembler ─► PluginDefinition
//!                 standard error patterns ─┘           │
//!                                                      ▼
//!                                   requirements / supervision (consumer side)
//! ```

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod definition;
pub mod detectors;
pub mod error;
pub mod manifest;
pub mod requirements;
pub mod supervision;

pub use assembler::{assemble, PluginTemplate, Resolution, SkipReason, SkippedEntry};
pub use catalog::{Download, Platform};
pub use connection::{Account, Accounts, ConnectionSpec, ConnectionTemplate};
pub use definition::{PluginDefinition, SupervisionPolicy};
pub use detectors::{ErrorClass, ErrorPattern, ErrorPatternRegistry, Severity};
pub use error::DefinitionError;
pub use manifest::PluginManifest;
pub use requirements::{HardwareCapabilities, ModelMatcher, Requirement};
