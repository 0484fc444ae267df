use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::backends::traits::{ListingRequest, OrderRequest, StorefrontApi};
use crate::config::{NetworkConfig, StorefrontConfig};
use crate::models::{ApiReply, MediaItem, OrderConfirmation};
use crate::utils::{KioskError, Result};

/// JSON client for the storefront endpoints.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    client: reqwest::Client,
    media_url: Url,
    search_url: Url,
    order_url: Url,
    auto_selection_url: Url,
}

impl StorefrontClient {
    pub fn new(storefront: &StorefrontConfig, network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(network.timeout())
            .cookie_store(true)
            .build()?;

        let base_url = Url::parse(storefront.base_url.trim_end_matches('/'))?;

        Ok(Self {
            client,
            media_url: base_url.join(&storefront.media_endpoint)?,
            search_url: base_url.join(&storefront.search_endpoint)?,
            order_url: base_url.join(&storefront.order_endpoint)?,
            auto_selection_url: base_url.join(&storefront.auto_selection_endpoint)?,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("{} answered {}", url, response.status());
            return Err(KioskError::Status(response.status().as_u16()));
        }

        let reply: ApiReply<T> = response.json().await?;
        reply.into_result()
    }
}

#[async_trait]
impl StorefrontApi for StorefrontClient {
    async fn list_media(&self, request: &ListingRequest) -> Result<Vec<MediaItem>> {
        let mut query = vec![
            ("format", "json".to_string()),
            ("category_id", request.category_id.to_string()),
            ("start_movies", request.start_movies.to_string()),
            ("start_series", request.start_series.to_string()),
        ];
        if let Some(length) = request.length {
            query.push(("length", length.to_string()));
        }

        let items: Vec<MediaItem> = self.get_json(&self.media_url, &query).await?;
        info!(
            "Fetched {} items for category {} (movies from {}, series from {})",
            items.len(),
            request.category_id,
            request.start_movies,
            request.start_series
        );
        Ok(items)
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let params = [("q", query.to_string()), ("format", "json".to_string())];
        self.get_json(&self.search_url, &params).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderConfirmation> {
        let params = match order {
            OrderRequest::AutoSelection => [("auto_selection", "yes".to_string())],
            OrderRequest::Items(items) => [("items", items.clone())],
        };
        self.get_json(&self.order_url, &params).await
    }

    async fn auto_selection_status(&self) -> Result<Vec<MediaItem>> {
        self.get_json(&self.auto_selection_url, &[]).await
    }
}
