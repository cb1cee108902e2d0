use crate::config::Config;
use crate::core::{
    Dimensions, EmbedType, MetadataResolver, ParseError, Provider, VideoReference,
};
use crate::utils::{decode_html_entities, parse_query_string};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_DOMAIN: &str = "home.wistia.com";
pub const EMBED_HOST: &str = "fast.wistia.net";
pub const OEMBED_ENDPOINT: &str = "https://fast.wistia.net/oembed";

const PROTOCOL: &str = r"(?:https?:)?//";
const DOMAIN: &str = r"(?P<domain>(?:[a-z0-9\-]+\.)*(?:wistia\.com|wistia\.net|wi\.st))";
const TYPE: &str = r"(?:(?P<type>[a-z0-9_\-]+)/)?";
const VIDEO_ID: &str = r"(?P<video_id>[a-z0-9_\-]+)";
// Bare links stop at anything that cannot appear in a URL, so markup never
// reaches the link rules.
const URL_QUERY: &str = r#"[^"'\s<>]+?"#;

/// Which kind of input a rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `//fast.wistia.net/embed/<type>/<id>`. Covers playlist embed URLs too,
    /// which share the exact layout.
    EmbedUrl,
    /// `//home.wistia.com/medias/<id>`
    PublicUrl,
    /// `<iframe src="//fast.wistia.net/embed/...">`, playlists included.
    EmbedIframe,
    /// `<div class="wistia_embed wistia_async_<id>">`
    EmbedAsync,
}

impl Shape {
    pub fn is_embed_code(self) -> bool {
        matches!(self, Shape::EmbedIframe | Shape::EmbedAsync)
    }
}

struct Rule {
    name: &'static str,
    shape: Shape,
    regex: Regex,
}

fn rule(name: &'static str, shape: Shape, pattern: String) -> Rule {
    let regex = Regex::new(&format!("(?i){}", pattern)).expect("built-in pattern compiles");
    Rule { name, shape, regex }
}

// Order matters: the first rule that matches wins.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(
            "embed_url",
            Shape::EmbedUrl,
            format!(r"{PROTOCOL}{DOMAIN}/embed/{TYPE}{VIDEO_ID}(?:\?(?P<params>{URL_QUERY}))?/?$"),
        ),
        rule(
            "public_url",
            Shape::PublicUrl,
            format!(r"{PROTOCOL}{DOMAIN}/medias/{VIDEO_ID}(?:\?(?P<params>{URL_QUERY}))?/?$"),
        ),
        rule(
            "embed_iframe",
            Shape::EmbedIframe,
            format!(
                r#"<iframe\b[^>]*?\bsrc=["']{PROTOCOL}{DOMAIN}/embed/{TYPE}{VIDEO_ID}(?:\?(?P<params>[^"']+))?["']"#
            ),
        ),
        rule(
            "embed_async",
            Shape::EmbedAsync,
            format!(
                r#"<[a-z][a-z0-9]*\b[^>]*?\bclass=["'][^"']*?\bwistia_embed\s+wistia_async_{VIDEO_ID}(?:\?(?P<params>[^"'\s]+))?["'\s]"#
            ),
        ),
    ]
});

static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<dimension>width|height)(?:=["']|:)(?P<value>\d+)(?:px)?(?:["']|;)"#)
        .expect("dimension pattern compiles")
});

static CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?:https?:)?//.*?(?:wistia\.com|wistia\.net|wi\.st)/|wistia_async_)")
        .expect("candidate pattern compiles")
});

/// Turns Wistia links and embed codes into [`VideoReference`]s.
#[derive(Debug, Clone)]
pub struct WistiaParser {
    default_domain: String,
    embed_host: String,
}

impl WistiaParser {
    pub fn new() -> Self {
        Self {
            default_domain: DEFAULT_DOMAIN.to_string(),
            embed_host: EMBED_HOST.to_string(),
        }
    }

    /// Host recorded for inputs that carry none (async embeds).
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }

    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// Loose pre-filter: does the input mention a Wistia host (or an async
    /// embed class)? A `true` here does not promise that `parse` succeeds.
    pub fn looks_like_candidate(input: &str) -> bool {
        CANDIDATE_RE.is_match(input)
    }

    pub fn parse(&self, input: &str) -> Result<VideoReference, ParseError> {
        let input = input.trim();

        for rule in RULES.iter() {
            let Some(captures) = rule.regex.captures(input) else {
                continue;
            };
            debug!("Input matched rule {}", rule.name);

            let video_id = captures
                .name("video_id")
                .map(|m| m.as_str())
                .filter(|id| !id.is_empty())
                .ok_or(ParseError::IncompleteMatch { pattern: rule.name })?;

            let domain = match captures.name("domain") {
                Some(m) if !m.as_str().is_empty() => m.as_str().to_string(),
                _ => self.default_domain.clone(),
            };

            let embed_type = match captures.name("type") {
                Some(m) => EmbedType::from(m.as_str()),
                None => EmbedType::Iframe,
            };

            // Markup writes `&` as `&amp;`.
            let params = match captures.name("params") {
                Some(m) => parse_query_string(&decode_html_entities(m.as_str())),
                None => Default::default(),
            };

            let mut reference = VideoReference::new(
                video_id.to_string(),
                embed_type,
                domain,
                self.embed_host.as_str(),
            )
            .with_params(params);

            if rule.shape.is_embed_code() {
                reference = reference.with_dimensions(extract_dimensions(input));
            }

            return Ok(reference);
        }

        Err(ParseError::NoMatch)
    }

    /// Which rule, if any, recognizes the input.
    pub fn shape_of(&self, input: &str) -> Option<Shape> {
        let input = input.trim();
        RULES
            .iter()
            .find(|rule| rule.regex.is_match(input))
            .map(|rule| rule.shape)
    }
}

impl Default for WistiaParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect every `width`/`height` hint in the markup (attributes or inline
/// style). Later occurrences overwrite earlier ones.
pub fn extract_dimensions(markup: &str) -> Dimensions {
    let mut dimensions = Dimensions::default();

    for captures in DIMENSION_RE.captures_iter(markup) {
        let (Some(name), Some(value)) = (captures.name("dimension"), captures.name("value"))
        else {
            continue;
        };
        if let Ok(value) = value.as_str().parse::<u32>() {
            dimensions.set(name.as_str(), value);
        }
    }

    dimensions
}

pub struct WistiaProvider {
    parser: WistiaParser,
    resolver: MetadataResolver,
}

impl WistiaProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let parser = WistiaParser::new().with_default_domain(config.default_domain.as_str());
        let resolver = MetadataResolver::from_config(config)?;
        Ok(Self::with_resolver(parser, resolver))
    }

    pub fn with_resolver(parser: WistiaParser, resolver: MetadataResolver) -> Self {
        Self { parser, resolver }
    }

    pub fn parser(&self) -> &WistiaParser {
        &self.parser
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub async fn image(&self, reference: &VideoReference) -> Option<String> {
        self.thumbnail(reference).await
    }
}

#[async_trait]
impl Provider for WistiaProvider {
    fn name(&self) -> &'static str {
        "wistia"
    }

    fn test(&self, input: &str) -> bool {
        WistiaParser::looks_like_candidate(input)
    }

    fn parse(&self, input: &str) -> Result<VideoReference, ParseError> {
        self.parser.parse(input)
    }

    async fn embed_code(&self, reference: &VideoReference) -> Option<String> {
        self.resolver.embed_code(reference).await
    }

    async fn thumbnail(&self, reference: &VideoReference) -> Option<String> {
        self.resolver.thumbnail(reference).await
    }
}
