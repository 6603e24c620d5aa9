//! TOML configuration for groups, bulk rules and service bindings.
//!
//! ```toml
//! [[group]]
//! name = "jsonplaceholder"
//! base_url = "https://jsonplaceholder.typicode.com/"
//! timeout_secs = 10
//! headers = { accept = "application/json" }
//!
//! [[rule]]
//! groups = "*"
//! headers = { user-agent = "http-services/0.1" }
//!
//! [bindings]
//! todos = "jsonplaceholder"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::descriptor::ServiceDescriptor;
use crate::error::{ApiError, Result};
use crate::group::{GroupConfig, GroupRule};
use crate::registry::ServiceRegistry;

/// One `[[group]]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GroupSettings {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServicesConfig {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSettings>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<GroupRule>,
    /// Service name to group name. Unlisted services use the default group.
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl ServicesConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ApiError::config(format!("invalid configuration: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Register groups, apply rules in order, then bind `descriptors`.
    pub fn configure<I>(&self, registry: &mut ServiceRegistry, descriptors: I) -> Result<()>
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        for settings in &self.groups {
            let config = GroupConfig::new(&settings.name, &settings.base_url, settings.headers.clone())?
                .with_timeout(settings.timeout_secs.map(Duration::from_secs));
            registry.insert_group(config);
        }
        for rule in &self.rules {
            registry.apply_rule(rule)?;
        }

        let mut unbound: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        for descriptor in descriptors {
            unbound.retain(|name| *name != descriptor.name());
            let group = self.bindings.get(descriptor.name()).cloned();
            registry.bind(descriptor, group.as_deref())?;
        }
        if let Some(name) = unbound.first() {
            return Err(ApiError::config(format!(
                "binding names unknown service `{name}`"
            )));
        }
        Ok(())
    }
}
