//! Download catalog
//!
//! A catalog is an ordered list of [`Download`] descriptors for one
//! executable family (e.g. `xmrig`). Each descriptor carries a version
//! string and an optional artifact URL per platform. Catalogs are authored
//! out-of-band in the plugin manifest and treated as static input.

mod download;
pub mod version;

pub use download::{Download, Platform};
pub use version::{coerce, VersionGate};
