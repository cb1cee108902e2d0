use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::extractors::wistia::{DEFAULT_DOMAIN, OEMBED_ENDPOINT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oembed_endpoint: String,
    pub default_domain: String,
    pub user_agent: String,
    /// HTTP timeout, seconds.
    pub timeout: u64,
    /// Metadata cache lifetime, seconds.
    pub cache_ttl: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oembed_endpoint: OEMBED_ENDPOINT.to_string(),
            default_domain: DEFAULT_DOMAIN.to_string(),
            user_agent: format!("wistia-probe/{}", env!("CARGO_PKG_VERSION")),
            timeout: 30,
            cache_ttl: 6 * 60 * 60,
        }
    }
}

impl Config {
    /// Defaults, overridden by whatever keys the TOML file at `path` sets.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        Ok(config)
    }
}
