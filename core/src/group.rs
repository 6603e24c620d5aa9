//! Client groups and the rules that configure them in bulk.
//!
//! A group is a named base URL plus default headers; every service bound to
//! the group shares one HTTP client built from it. `GroupRule`s are plain
//! data applied by iteration, e.g. one rule adding a `user-agent` header to
//! every group and another pointing `github` at its API host.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use ureq::http::{HeaderName, HeaderValue};
use url::Url;

use crate::error::{ApiError, Result};

/// Group used by services bound without an explicit group name.
pub const DEFAULT_GROUP: &str = "default";

/// Validated configuration of one client group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    pub name: String,
    pub base_url: Url,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl GroupConfig {
    pub fn new<I, K, V>(name: &str, base_url: &str, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if name.trim().is_empty() {
            return Err(ApiError::config("group name is empty"));
        }
        let base_url = parse_base_url(name, base_url)?;
        let mut config = Self {
            name: name.to_string(),
            base_url,
            headers: Vec::new(),
            timeout: None,
        };
        for (k, v) in headers {
            config.set_header(k.into(), v.into())?;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a default header, replacing any existing one with the same name.
    pub fn set_header(&mut self, name: String, value: String) -> Result<()> {
        validate_header(&self.name, &name, &value)?;
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.base_url = parse_base_url(&self.name, base_url)?;
        Ok(())
    }
}

fn parse_base_url(group: &str, raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::config(format!(
            "group `{group}` has an empty base URL"
        )));
    }
    let url = Url::parse(raw).map_err(|e| {
        ApiError::config(format!("group `{group}` has invalid base URL `{raw}`: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ApiError::config(format!(
            "group `{group}` base URL `{raw}` is not an http(s) URL"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ApiError::config(format!(
            "group `{group}` base URL `{raw}` must not carry a query or fragment"
        )));
    }
    Ok(url)
}

fn validate_header(group: &str, name: &str, value: &str) -> Result<()> {
    check_header(name, value)
        .map_err(|reason| ApiError::config(format!("group `{group}` has {reason}")))
}

/// Checks `name` and `value` are legal on the wire; `Err` describes the
/// offending part.
pub(crate) fn check_header(name: &str, value: &str) -> std::result::Result<(), String> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| format!("invalid header name `{name}`"))?;
    HeaderValue::from_str(value).map_err(|_| format!("invalid value for header `{name}`"))?;
    Ok(())
}

/// Selects groups by name: `*` for all, `prefix*`, or an exact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPattern {
    All,
    Prefix(String),
    Exact(String),
}

impl GroupPattern {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ApiError::config("group pattern is empty"));
        }
        if raw == "*" {
            return Ok(GroupPattern::All);
        }
        match raw.strip_suffix('*') {
            Some(prefix) if !prefix.contains('*') => Ok(GroupPattern::Prefix(prefix.to_string())),
            _ if raw.contains('*') => Err(ApiError::config(format!(
                "group pattern `{raw}` may only end with '*'"
            ))),
            _ => Ok(GroupPattern::Exact(raw.to_string())),
        }
    }

    pub fn matches(&self, group: &str) -> bool {
        match self {
            GroupPattern::All => true,
            GroupPattern::Prefix(prefix) => group.starts_with(prefix.as_str()),
            GroupPattern::Exact(name) => group == name,
        }
    }
}

fn all_groups() -> String {
    "*".to_string()
}

/// Settings applied to every group whose name matches `groups`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GroupRule {
    #[serde(default = "all_groups")]
    pub groups: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl GroupRule {
    pub fn for_groups(pattern: &str) -> Self {
        Self {
            groups: pattern.to_string(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Merge this rule into an existing group.
    pub(crate) fn apply_to(&self, group: &mut GroupConfig) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            group.set_base_url(base_url)?;
        }
        for (name, value) in &self.headers {
            group.set_header(name.clone(), value.clone())?;
        }
        if let Some(secs) = self.timeout_secs {
            group.timeout = Some(Duration::from_secs(secs));
        }
        Ok(())
    }
}
