use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Outbound GET returning the response body as text.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);

        if !status.is_success() {
            anyhow::bail!("Lookup failed: HTTP {}", status);
        }

        Ok(response.text().await?)
    }
}
