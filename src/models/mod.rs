mod identifiers;

pub use identifiers::{CategoryId, MediaItemId};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::utils::{KioskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Poster {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub small_url: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
}

/// Popularity counter as shown to customers: the raw count, or a capped
/// label such as `"1000+"` for large values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayCount {
    Count(u64),
    Text(String),
}

impl fmt::Display for DisplayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayCount::Count(count) => write!(f, "{}", count),
            DisplayCount::Text(text) => f.write_str(text),
        }
    }
}

/// A movie or series record as served by the listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaItemId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_title: Option<String>,
    #[serde(default)]
    pub price: u64,
    /// Quota units consumed when the item is ordered.
    #[serde(default)]
    pub load: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_load: Option<String>,
    #[serde(default)]
    pub poster: Poster,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_orders: Option<DisplayCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_clicks: Option<DisplayCount>,
    #[serde(default)]
    pub is_adult: bool,
}

impl MediaItem {
    /// Series are shown with their full title (name plus season).
    pub fn display_title(&self) -> &str {
        match self.kind {
            MediaKind::Movie => &self.title,
            MediaKind::Series => self.full_title.as_deref().unwrap_or(&self.title),
        }
    }

    pub fn has_trailer(&self) -> bool {
        self.trailer_resource
            .as_deref()
            .is_some_and(|resource| !resource.is_empty())
    }

    /// Relative link to the detail page.
    pub fn detail_path(&self) -> String {
        match self.kind {
            MediaKind::Movie => format!("/movie/{}", self.slug),
            MediaKind::Series => format!("/series/{}", self.slug),
        }
    }

    /// Only movies can be ordered straight from a listing; series go
    /// through their detail page.
    pub fn is_directly_orderable(&self) -> bool {
        self.kind == MediaKind::Movie
    }
}

/// A storefront category, as used for the home page rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub previews_title: Option<String>,
}

impl Category {
    /// Slug of the pseudo-category rendered separately on the home page.
    pub const TOP_SLUG: &'static str = "top";

    pub fn section_title(&self) -> &str {
        match self.previews_title.as_deref() {
            Some(title) if !title.is_empty() && title != "None" => title,
            _ => &self.title,
        }
    }
}

/// Reply of the order endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    #[serde(default)]
    pub success: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Every storefront endpoint answers either with its payload or with
/// `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiReply<T> {
    Failure { error: String },
    Success(T),
}

impl<T> ApiReply<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiReply::Failure { error } => Err(KioskError::Server(error)),
            ApiReply::Success(payload) => Ok(payload),
        }
    }
}
