use crate::config::Config;
use crate::core::{
    HttpFetcher, InMemoryCache, Metadata, MetadataCache, ReqwestFetcher, VideoReference,
};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Looks up oEmbed metadata for a reference, caching every answer by video id.
///
/// Failed lookups are cached too (as JSON `null`), so an unavailable video
/// costs one remote call per TTL window rather than one per request.
pub struct MetadataResolver {
    fetcher: Arc<dyn HttpFetcher>,
    cache: Arc<dyn MetadataCache>,
    endpoint: String,
    cache_prefix: String,
    ttl: Duration,
}

impl MetadataResolver {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        cache: Arc<dyn MetadataCache>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            endpoint: endpoint.into(),
            cache_prefix: "wistia".to_string(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(InMemoryCache::new()),
            config.oembed_endpoint.clone(),
        )
        .with_ttl(Duration::from_secs(config.cache_ttl)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache_key(&self, reference: &VideoReference) -> String {
        format!("{}_video_{}", self.cache_prefix, reference.video_id())
    }

    /// `<endpoint>?url=https:<embed url>`, with the embed URL percent-encoded.
    pub fn lookup_url(&self, reference: &VideoReference) -> Result<Url> {
        let embed_url = format!("https:{}", reference.embed_url());
        Ok(Url::parse_with_params(&self.endpoint, &[("url", embed_url)])?)
    }

    /// Any stored entry counts as a hit, including the `null` left by a failed
    /// lookup; an empty entry is not refetched until its TTL runs out.
    pub async fn resolve(&self, reference: &VideoReference) -> Metadata {
        let key = self.cache_key(reference);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("Metadata cache hit: {}", key);
            return Metadata::from_value(&cached);
        }

        let url = match self.lookup_url(reference) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build lookup URL from {:?}: {}", self.endpoint, e);
                return Metadata::default();
            }
        };

        info!("Fetching metadata for {} from {}", reference.video_id(), url);
        let body = match self.fetcher.get_text(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Metadata lookup for {} failed: {}", reference.video_id(), e);
                String::new()
            }
        };

        let value = match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                if !body.is_empty() {
                    warn!("Metadata for {} is not JSON: {}", reference.video_id(), e);
                }
                Value::Null
            }
        };

        self.cache.set(&key, value.clone(), self.ttl).await;

        Metadata::from_value(&value)
    }

    pub async fn embed_code(&self, reference: &VideoReference) -> Option<String> {
        self.resolve(reference)
            .await
            .embed_html()
            .map(str::to_string)
    }

    pub async fn thumbnail(&self, reference: &VideoReference) -> Option<String> {
        self.resolve(reference).await.thumbnail().map(|t| t.url)
    }
}
