//! Pool accounts and connection templating
//!
//! Each plugin template declares a connection template and an ordered list
//! of pool locations. Expanding it for an [`Account`] yields one argument
//! fragment per location, in location order; the launcher concatenates
//! them, so the first location is the primary pool.
//!
//! Placeholders: `{{location}}`, `{{address}}`, `{{rig_id}}`. Values are
//! inserted verbatim in a single pass. Quoting for the target executable is
//! left to the caller.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DefinitionError;

pub const PLACEHOLDERS: &[&str] = &["location", "address", "rig_id"];

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Credentials for one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Payout address or pool username
    pub address: String,

    /// Rig (worker) identifier reported to the pool
    pub rig_id: String,
}

impl Account {
    pub fn new(address: impl Into<String>, rig_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rig_id: rig_id.into(),
        }
    }
}

/// Accounts keyed by pool name (e.g. "nicehash")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accounts(BTreeMap<String, Account>);

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pool: impl Into<String>, account: Account) -> Self {
        self.insert(pool, account);
        self
    }

    pub fn insert(&mut self, pool: impl Into<String>, account: Account) {
        self.0.insert(pool.into(), account);
    }

    pub fn get(&self, pool: &str) -> Option<&Account> {
        self.0.get(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        serde_yaml_ng::from_str(content).context("Invalid accounts YAML")
    }
}

/// A connection-string template with `{{...}}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionTemplate(String);

impl ConnectionTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject placeholders the renderer does not know
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for caps in PLACEHOLDER_RE.captures_iter(&self.0) {
            let name = &caps[1];
            if !PLACEHOLDERS.contains(&name) {
                return Err(DefinitionError::UnknownPlaceholder {
                    placeholder: name.to_string(),
                    template: self.0.clone(),
                });
            }
        }
        Ok(())
    }

    /// Render the fragment for one location
    pub fn render(&self, account: &Account, location: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.0, |caps: &Captures| match &caps[1] {
                "location" => location.to_string(),
                "address" => account.address.clone(),
                "rig_id" => account.rig_id.clone(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }

    /// One fragment per location, preserving location order
    pub fn expand<S: AsRef<str>>(&self, account: &Account, locations: &[S]) -> Vec<String> {
        locations
            .iter()
            .map(|location| self.render(account, location.as_ref()))
            .collect()
    }
}

/// Connection section of a plugin template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    /// Pool name used to look up the [`Account`]
    pub pool: String,

    pub template: ConnectionTemplate,

    /// Pool locations in priority order
    pub locations: Vec<String>,
}

impl ConnectionSpec {
    pub fn fragments(&self, account: &Account) -> Vec<String> {
        self.template.expand(account, &self.locations)
    }
}
