use crate::utils::{build_query_string, escape_html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 360;

/// Player flavour encoded in an embed URL (`/embed/<type>/<id>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum EmbedType {
    #[default]
    Iframe,
    Playlists,
    Other(String),
}

impl EmbedType {
    pub fn as_str(&self) -> &str {
        match self {
            EmbedType::Iframe => "iframe",
            EmbedType::Playlists => "playlists",
            EmbedType::Other(other) => other,
        }
    }
}

impl From<&str> for EmbedType {
    fn from(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("iframe") {
            EmbedType::Iframe
        } else if raw.eq_ignore_ascii_case("playlists") {
            EmbedType::Playlists
        } else {
            EmbedType::Other(raw.to_string())
        }
    }
}

impl From<EmbedType> for String {
    fn from(embed_type: EmbedType) -> Self {
        embed_type.as_str().to_string()
    }
}

impl fmt::Display for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizing hints lifted from embed markup. Bare links never carry any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Dimensions {
    /// Record one `width`/`height` occurrence; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: u32) {
        match name {
            "width" => self.width = Some(value),
            "height" => self.height = Some(value),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// A recognized video: always carries a non-empty id.
///
/// Only a parser can build one, so a value of this type is never a
/// half-filled parse attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    video_id: String,
    #[serde(rename = "type")]
    embed_type: EmbedType,
    domain: String,
    params: BTreeMap<String, String>,
    dimensions: Dimensions,
    #[serde(skip)]
    embed_host: String,
}

impl VideoReference {
    pub(crate) fn new(
        video_id: String,
        embed_type: EmbedType,
        domain: String,
        embed_host: impl Into<String>,
    ) -> Self {
        debug_assert!(!video_id.is_empty());
        Self {
            video_id,
            embed_type,
            domain,
            params: BTreeMap::new(),
            dimensions: Dimensions::default(),
            embed_host: embed_host.into(),
        }
    }

    pub(crate) fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params.extend(params);
        self
    }

    pub(crate) fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn id(&self) -> &str {
        self.video_id()
    }

    pub fn embed_type(&self) -> &EmbedType {
        &self.embed_type
    }

    pub fn video_type(&self) -> &str {
        self.embed_type.as_str()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height.unwrap_or(DEFAULT_HEIGHT)
    }

    /// Canonical share link, `//<domain>/medias/<id>`.
    ///
    /// Playlists have no single media page, so they get `None`.
    pub fn link(&self) -> Option<String> {
        if self.embed_type == EmbedType::Playlists {
            return None;
        }

        Some(format!("//{}/medias/{}", self.domain, self.video_id))
    }

    pub fn share_link(&self) -> Option<String> {
        self.link()
    }

    /// Protocol-relative player URL, `//<embed host>/embed/<type>/<id>[?query]`.
    pub fn embed_url(&self) -> String {
        let mut url = format!(
            "//{}/embed/{}/{}",
            self.embed_host, self.embed_type, self.video_id
        );

        if !self.params.is_empty() {
            url.push('?');
            url.push_str(&build_query_string(&self.params));
        }

        url
    }

    /// Same as [`embed_url`](Self::embed_url), escaped for use inside an HTML attribute.
    pub fn embed_url_html(&self) -> String {
        escape_html(&self.embed_url())
    }
}
