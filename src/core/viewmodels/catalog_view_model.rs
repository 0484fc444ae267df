use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{Property, PropertySubscriber, ViewModel};
use crate::backends::traits::{ListingRequest, StorefrontApi};
use crate::config::PaginationConfig;
use crate::models::{CategoryId, MediaItem, MediaKind};
use crate::utils::{KioskError, Result};

/// Result of one listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// This many items were appended to the buffer.
    Appended(usize),
    /// The server has nothing more for this category.
    Exhausted,
    /// Another fetch is already outstanding.
    Pending,
    /// The category changed while the call was running; its items were dropped.
    Stale,
}

/// What a request for the next page produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Page(Vec<MediaItem>),
    /// A fetch is outstanding; the page comes with it.
    Pending,
    Exhausted,
    /// The category has no media at all.
    NoData,
    Stale,
}

#[derive(Debug, Default)]
struct FeedState {
    category: Option<CategoryId>,
    generation: u64,
    buffer: Vec<MediaItem>,
    cursor: usize,
    start_movies: usize,
    start_series: usize,
    exhausted: bool,
    in_flight: bool,
}

impl FeedState {
    fn reveal_next(&mut self, page_size: usize) -> Option<Vec<MediaItem>> {
        if self.cursor >= self.buffer.len() {
            return None;
        }
        let end = (self.cursor + page_size).min(self.buffer.len());
        let page = self.buffer[self.cursor..end].to_vec();
        for item in &page {
            match item.kind {
                MediaKind::Movie => self.start_movies += 1,
                MediaKind::Series => self.start_series += 1,
            }
        }
        self.cursor = end;
        Some(page)
    }

    fn exhausted_outcome(&self) -> PageOutcome {
        if self.buffer.is_empty() {
            PageOutcome::NoData
        } else {
            PageOutcome::Exhausted
        }
    }
}

/// Paged media listing of one category.
///
/// Items are fetched in batches of several pages and revealed one page at a
/// time. At most one listing call is outstanding, and a call that completes
/// after the category changed is discarded.
#[derive(Debug)]
pub struct CatalogViewModel {
    api: Arc<dyn StorefrontApi>,
    pagination: PaginationConfig,
    state: Mutex<FeedState>,
    visible: Property<Vec<MediaItem>>,
    loading: Property<bool>,
    no_data: Property<bool>,
    notice: Property<Option<String>>,
}

impl CatalogViewModel {
    pub fn new(api: Arc<dyn StorefrontApi>, pagination: PaginationConfig) -> Self {
        Self {
            api,
            pagination: pagination.normalized(),
            state: Mutex::new(FeedState::default()),
            visible: Property::new(Vec::new(), "visible"),
            loading: Property::new(false, "loading"),
            no_data: Property::new(false, "no_data"),
            notice: Property::new(None, "notice"),
        }
    }

    pub fn visible(&self) -> &Property<Vec<MediaItem>> {
        &self.visible
    }

    pub fn loading(&self) -> &Property<bool> {
        &self.loading
    }

    pub fn no_data(&self) -> &Property<bool> {
        &self.no_data
    }

    pub fn notice(&self) -> &Property<Option<String>> {
        &self.notice
    }

    /// Switch to `category_id`, dropping everything loaded so far.
    pub async fn set_category(&self, category_id: CategoryId) {
        let mut state = self.state.lock().await;
        info!("Switching catalog to category {}", category_id);
        let generation = state.generation + 1;
        *state = FeedState {
            category: Some(category_id),
            generation,
            ..FeedState::default()
        };
        drop(state);

        self.visible.set(Vec::new());
        self.loading.set(false);
        self.no_data.set(false);
        self.notice.set(None);
    }

    pub async fn current_category(&self) -> Option<CategoryId> {
        self.state.lock().await.category.clone()
    }

    pub async fn buffered_len(&self) -> usize {
        self.state.lock().await.buffer.len()
    }

    pub async fn is_exhausted(&self) -> bool {
        self.state.lock().await.exhausted
    }

    /// Next offsets to request, one per kind.
    pub async fn offsets(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.start_movies, state.start_series)
    }

    /// Fetch one batch of `category_id` past the given per-kind offsets and
    /// append it to the buffer.
    pub async fn list_items(
        &self,
        category_id: &CategoryId,
        start_movies: usize,
        start_series: usize,
    ) -> Result<FetchOutcome> {
        let (request, generation) = {
            let mut state = self.state.lock().await;
            if state.category.as_ref() != Some(category_id) {
                return Ok(FetchOutcome::Stale);
            }
            if state.exhausted {
                return Ok(FetchOutcome::Exhausted);
            }
            if state.in_flight {
                return Ok(FetchOutcome::Pending);
            }
            state.in_flight = true;
            let request = ListingRequest {
                category_id: category_id.clone(),
                start_movies,
                start_series,
                length: Some(self.pagination.batch_len()),
            };
            (request, state.generation)
        };

        self.loading.set(true);
        let result = self.api.list_media(&request).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Dropping listing for category {}", request.category_id);
            return Ok(FetchOutcome::Stale);
        }
        state.in_flight = false;
        self.loading.set(false);

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to list category {}: {}", request.category_id, e);
                self.notice.set(Some(e.notice()));
                return Err(e);
            }
        };

        if items.is_empty() {
            state.exhausted = true;
            if state.buffer.is_empty() {
                self.no_data.set(true);
            }
            debug!("Category {} is exhausted", request.category_id);
            return Ok(FetchOutcome::Exhausted);
        }

        let count = items.len();
        state.buffer.extend(items);
        Ok(FetchOutcome::Appended(count))
    }

    /// Reveal the next page, fetching a new batch when the buffer runs out.
    pub async fn show_next_page(&self) -> Result<PageOutcome> {
        let (category_id, start_movies, start_series, generation) = {
            let mut state = self.state.lock().await;
            if let Some(page) = state.reveal_next(self.pagination.page_size) {
                drop(state);
                self.publish(&page);
                return Ok(PageOutcome::Page(page));
            }
            if state.exhausted {
                return Ok(state.exhausted_outcome());
            }
            if state.in_flight {
                return Ok(PageOutcome::Pending);
            }
            let Some(category_id) = state.category.clone() else {
                return Err(KioskError::Configuration(
                    "No category selected".to_string(),
                ));
            };
            (
                category_id,
                state.start_movies,
                state.start_series,
                state.generation,
            )
        };

        match self
            .list_items(&category_id, start_movies, start_series)
            .await?
        {
            FetchOutcome::Appended(_) => {
                let page = {
                    let mut state = self.state.lock().await;
                    if state.generation != generation {
                        return Ok(PageOutcome::Stale);
                    }
                    state.reveal_next(self.pagination.page_size)
                };
                match page {
                    Some(page) => {
                        self.publish(&page);
                        Ok(PageOutcome::Page(page))
                    }
                    // Another caller revealed the fresh batch first.
                    None => Ok(PageOutcome::Pending),
                }
            }
            FetchOutcome::Exhausted => Ok(self.state.lock().await.exhausted_outcome()),
            FetchOutcome::Pending => Ok(PageOutcome::Pending),
            FetchOutcome::Stale => Ok(PageOutcome::Stale),
        }
    }

    fn publish(&self, page: &[MediaItem]) {
        debug!("Revealing {} items", page.len());
        self.visible
            .update(|visible| visible.extend(page.iter().cloned()));
    }
}

impl ViewModel for CatalogViewModel {
    fn subscribe_to_property(&self, property_name: &str) -> Option<PropertySubscriber> {
        match property_name {
            "visible" => Some(self.visible.subscribe()),
            "loading" => Some(self.loading.subscribe()),
            "no_data" => Some(self.no_data.subscribe()),
            "notice" => Some(self.notice.subscribe()),
            _ => None,
        }
    }
}
