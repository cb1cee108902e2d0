use crate::core::{ParseError, VideoReference};
use async_trait::async_trait;
use tracing::debug;

/// One video host: a cheap pre-filter, a full parser, and the accessors
/// that depend on the host's URL layout or remote API.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Coarse check that `input` might belong to this host. May accept
    /// inputs that `parse` later rejects.
    fn test(&self, input: &str) -> bool;

    fn parse(&self, input: &str) -> Result<VideoReference, ParseError>;

    fn link(&self, reference: &VideoReference) -> Option<String> {
        reference.link()
    }

    fn embed_url(&self, reference: &VideoReference) -> String {
        reference.embed_url()
    }

    fn video_type<'a>(&self, reference: &'a VideoReference) -> &'a str {
        reference.video_type()
    }

    async fn embed_code(&self, reference: &VideoReference) -> Option<String>;

    async fn thumbnail(&self, reference: &VideoReference) -> Option<String>;
}

pub struct ProviderRegistry {
    pub providers: Vec<Box<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn register_provider(&mut self, provider: Box<dyn Provider>) {
        self.providers.push(provider);
    }

    /// First registered provider whose `test` accepts the input.
    pub fn find(&self, input: &str) -> Option<&dyn Provider> {
        self.providers
            .iter()
            .find(|provider| provider.test(input))
            .map(|provider| provider.as_ref())
    }

    pub fn parse(&self, input: &str) -> Result<(&dyn Provider, VideoReference), ParseError> {
        let provider = self.find(input).ok_or(ParseError::NoProvider)?;
        debug!("Provider {} accepted input", provider.name());

        let reference = provider.parse(input)?;
        Ok((provider, reference))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
