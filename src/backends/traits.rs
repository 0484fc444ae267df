use async_trait::async_trait;

use crate::models::{CategoryId, MediaItem, OrderConfirmation};
use crate::utils::Result;

/// Parameters of one listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub category_id: CategoryId,
    pub start_movies: usize,
    pub start_series: usize,
    /// `None` lets the server apply the category's preview length.
    pub length: Option<usize>,
}

impl ListingRequest {
    pub fn first_page(category_id: CategoryId) -> Self {
        Self {
            category_id,
            start_movies: 0,
            start_series: 0,
            length: None,
        }
    }
}

/// What the order endpoint is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRequest {
    /// Confirm the selection produced by the server-side auto-selection job.
    AutoSelection,
    /// Confirm an explicit `id|type,` list.
    Items(String),
}

#[async_trait]
pub trait StorefrontApi: Send + Sync + std::fmt::Debug {
    /// Media of a category past the given per-kind offsets.
    async fn list_media(&self, request: &ListingRequest) -> Result<Vec<MediaItem>>;

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderConfirmation>;

    /// Items picked by the auto-selection job, once it has finished.
    async fn auto_selection_status(&self) -> Result<Vec<MediaItem>>;
}
