use serde::{Deserialize, Serialize};

/// oEmbed payload for one video. Every field is optional: providers omit
/// whatever they do not know, and a failed lookup yields `Metadata::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Metadata {
    /// Build from a decoded JSON value. Anything that is not an oEmbed-shaped
    /// object (null, arrays, wrong field types) collapses to the empty record.
    pub fn from_value(value: &serde_json::Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }

        Self::deserialize(value).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Ready-made player markup, if the lookup returned a non-empty one.
    pub fn embed_html(&self) -> Option<&str> {
        non_empty(self.html.as_deref())
    }

    pub fn thumbnail(&self) -> Option<Thumbnail> {
        non_empty(self.thumbnail_url.as_deref()).map(|url| Thumbnail {
            url: url.to_string(),
            width: self.thumbnail_width,
            height: self.thumbnail_height,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
