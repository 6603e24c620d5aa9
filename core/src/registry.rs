//! Group registry and proxy factory.
//!
//! # Design
//! Startup is a one-shot resolution: groups are registered, descriptors are
//! bound to groups, then `build` creates one client per group and one proxy
//! per descriptor. Every configuration problem is reported as
//! `ApiError::Configuration` before any request is sent. The resulting
//! `HttpServices` is immutable and can be shared across threads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::descriptor::ServiceDescriptor;
use crate::error::{ApiError, Result};
use crate::group::{GroupConfig, GroupPattern, GroupRule, DEFAULT_GROUP};
use crate::proxy::{GroupClient, ServiceProxy};
use crate::transport::{Transport, UreqTransport};

/// Builds the transport for a group; called once per group.
pub type TransportFactory = Arc<dyn Fn(&GroupConfig) -> Arc<dyn Transport> + Send + Sync>;

#[derive(Debug, Clone)]
struct Binding {
    descriptor: Arc<ServiceDescriptor>,
    group: String,
}

/// Mutable startup registry of groups and service bindings.
pub struct ServiceRegistry {
    groups: BTreeMap<String, GroupConfig>,
    bindings: BTreeMap<String, Binding>,
    clients: HashMap<String, Arc<GroupClient>>,
    transport_factory: TransportFactory,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    /// Registry whose groups talk HTTP through `UreqTransport`.
    pub fn new() -> Self {
        Self::with_transport_factory(Arc::new(|group: &GroupConfig| {
            Arc::new(UreqTransport::new(group.timeout)) as Arc<dyn Transport>
        }))
    }

    pub fn with_transport_factory(transport_factory: TransportFactory) -> Self {
        Self {
            groups: BTreeMap::new(),
            bindings: BTreeMap::new(),
            clients: HashMap::new(),
            transport_factory,
        }
    }

    /// Add or overwrite a group.
    pub fn register<I, K, V>(&mut self, name: &str, base_url: &str, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config = GroupConfig::new(name, base_url, headers)?;
        self.insert_group(config);
        Ok(())
    }

    /// Add or overwrite an already validated group.
    pub fn insert_group(&mut self, config: GroupConfig) {
        tracing::info!(group = %config.name, base_url = %config.base_url, "registered group");
        self.clients.remove(&config.name);
        self.groups.insert(config.name.clone(), config);
    }

    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Apply `rule` to every registered group its pattern selects.
    ///
    /// A rule with a base URL can also create a group: an exact name that is
    /// not registered yet, or the default group when the pattern is `*`.
    /// Returns the number of groups touched.
    pub fn apply_rule(&mut self, rule: &GroupRule) -> Result<usize> {
        let pattern = GroupPattern::parse(&rule.groups)?;

        let mut targets: Vec<String> = self
            .groups
            .keys()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect();
        if rule.base_url.is_some() {
            let created = match &pattern {
                GroupPattern::All => Some(DEFAULT_GROUP),
                GroupPattern::Exact(name) => Some(name.as_str()),
                GroupPattern::Prefix(_) => None,
            };
            if let Some(name) = created.filter(|name| !self.groups.contains_key(*name)) {
                targets.push(name.to_string());
            }
        }
        if targets.is_empty() {
            return Err(ApiError::config(format!(
                "rule for `{}` matches no registered group",
                rule.groups
            )));
        }

        for name in &targets {
            let mut config = match self.groups.get(name) {
                Some(existing) => existing.clone(),
                None => {
                    let base_url = rule.base_url.as_deref().unwrap_or_default();
                    GroupConfig::new(name, base_url, std::iter::empty::<(String, String)>())?
                }
            };
            rule.apply_to(&mut config)?;
            self.insert_group(config);
        }
        Ok(targets.len())
    }

    /// Bind `descriptor` to `group`, or to the default group when `None`.
    ///
    /// A named group must already be registered; the default group may be
    /// registered later, up until proxies are built.
    pub fn bind(&mut self, descriptor: ServiceDescriptor, group: Option<&str>) -> Result<()> {
        let group = group.unwrap_or(DEFAULT_GROUP);
        if group != DEFAULT_GROUP && !self.groups.contains_key(group) {
            return Err(ApiError::config(format!(
                "service `{}` is bound to unknown group `{group}`",
                descriptor.name()
            )));
        }
        tracing::info!(service = descriptor.name(), group, "bound service");
        self.bindings.insert(
            descriptor.name().to_string(),
            Binding {
                descriptor: Arc::new(descriptor),
                group: group.to_string(),
            },
        );
        Ok(())
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Build the proxy for a bound service, creating its group client on
    /// first use.
    pub fn build_proxy(&mut self, service: &str) -> Result<ServiceProxy> {
        let binding = self
            .bindings
            .get(service)
            .cloned()
            .ok_or_else(|| ApiError::config(format!("service `{service}` is not bound")))?;
        let client = self.client(&binding.group)?;
        Ok(ServiceProxy::new(binding.descriptor, client))
    }

    /// Build every bound service.
    pub fn build(mut self) -> Result<HttpServices> {
        let names: Vec<String> = self.bindings.keys().cloned().collect();
        let mut proxies = BTreeMap::new();
        for name in names {
            let proxy = self.build_proxy(&name)?;
            proxies.insert(name, proxy);
        }
        Ok(HttpServices { proxies })
    }

    fn client(&mut self, group: &str) -> Result<Arc<GroupClient>> {
        if let Some(client) = self.clients.get(group) {
            return Ok(client.clone());
        }
        let config = self.groups.get(group).cloned().ok_or_else(|| {
            ApiError::config(format!("group `{group}` has no base URL configured"))
        })?;
        let transport = (self.transport_factory)(&config);
        let client = Arc::new(GroupClient::new(config, transport));
        self.clients.insert(group.to_string(), client.clone());
        Ok(client)
    }
}

/// Immutable set of proxies produced by `ServiceRegistry::build`.
#[derive(Debug, Clone)]
pub struct HttpServices {
    proxies: BTreeMap<String, ServiceProxy>,
}

impl HttpServices {
    pub fn proxy(&self, service: &str) -> Result<ServiceProxy> {
        self.proxies
            .get(service)
            .cloned()
            .ok_or_else(|| ApiError::config(format!("service `{service}` is not bound")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.proxies.keys().map(String::as_str)
    }
}
