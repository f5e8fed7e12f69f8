//! Configuration loading and validation.
//!
//! Connection settings are captured once when a datasource is built and
//! never mutated afterwards. The CLI reads them from `config.toml`; a host
//! can hand over its own instance-settings JSON via
//! [`InstanceSettings::from_host_json`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::transport::reqwest_executor::DEFAULT_TIMEOUT_SECS;
use crate::variables::TemplateVariables;

/// Environment variable overriding `datasource.url`.
pub const URL_ENV: &str = "HAWKULAR_URL";
/// Environment variable overriding `datasource.tenant`.
pub const TENANT_ENV: &str = "HAWKULAR_TENANT";

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    pub datasource: InstanceSettings,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Dashboard variables available to `$name` placeholders.
    #[serde(default)]
    pub variables: HashMap<String, Vec<String>>,
}

/// Connection settings for one datasource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSettings {
    /// Base URL of the metrics API (e.g. `https://host:8443/hawkular/metrics`).
    pub url: String,

    /// Display name of the datasource.
    #[serde(default = "default_name")]
    pub name: String,

    /// Plugin type label.
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,

    /// Tenant sent in the `Hawkular-Tenant` header.
    pub tenant: String,
}

/// Shape of the instance settings handed over by the dashboard host.
#[derive(Debug, Deserialize)]
struct HostInstanceSettings {
    url: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(rename = "type", default = "default_type")]
    kind: String,
    #[serde(rename = "jsonData")]
    json_data: HostJsonData,
}

#[derive(Debug, Deserialize)]
struct HostJsonData {
    tenant: String,
}

impl InstanceSettings {
    /// Create settings from a URL and tenant with default labels.
    pub fn new(url: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: default_name(),
            kind: default_type(),
            tenant: tenant.into(),
        }
    }

    /// Parse the host's `{url, name, type, jsonData: {tenant}}` object.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` or `jsonData.tenant` is missing.
    pub fn from_host_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let host = HostInstanceSettings::deserialize(value)?;
        Ok(Self {
            url: host.url,
            name: host.name,
            kind: host.kind,
            tenant: host.json_data.tenant,
        })
    }

    /// Check that the URL is absolute http(s) and the tenant is set.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        let parsed = url::Url::parse(&self.url)
            .with_context(|| format!("invalid datasource url {:?}", self.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!(
                "datasource url must use http or https, got {:?}",
                parsed.scheme()
            );
        }
        if self.tenant.trim().is_empty() {
            anyhow::bail!("datasource tenant must not be empty");
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Dashboard variables as a resolver.
    pub fn template_variables(&self) -> TemplateVariables {
        self.variables
            .iter()
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect()
    }

    /// Override URL and tenant from `lookup` (normally the process env).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.datasource.url = url;
        }
        if let Some(tenant) = lookup(TENANT_ENV).filter(|v| !v.trim().is_empty()) {
            self.datasource.tenant = tenant;
        }
    }
}

// Default value functions for serde

fn default_name() -> String {
    "hawkular".to_owned()
}
fn default_type() -> String {
    "hawkular-datasource".to_owned()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or settings are invalid.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents).context("failed to parse config")?;
    config.datasource.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file, applying environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or is invalid.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let mut config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config
        .datasource
        .validate()
        .with_context(|| format!("invalid config at {}", path.display()))?;
    Ok(config)
}

/// Resolve the default config directory (`~/.hawkular-datasource/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".hawkular-datasource"))
}

/// Default config file path (`~/.hawkular-datasource/config.toml`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
