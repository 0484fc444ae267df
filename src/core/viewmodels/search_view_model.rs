use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::{Property, PropertySubscriber, ViewModel};
use crate::backends::traits::StorefrontApi;
use crate::constants::MIN_SEARCH_QUERY_LEN;
use crate::models::MediaItem;
use crate::utils::Result;
use crate::utils::text::{highlight, minor_tag};

/// One search result with its captions.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub item: MediaItem,
    /// Lower-cased display title with the query in `<b>` tags.
    pub highlighted_title: String,
    /// Tag words not already in the title, highlighted the same way.
    pub minor_tag: String,
}

impl SearchHit {
    pub fn new(item: MediaItem, query: &str) -> Self {
        let highlighted_title = highlight(item.display_title(), query);
        let minor_tag = minor_tag(&item.tags, &item.title, query);
        Self {
            item,
            highlighted_title,
            minor_tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Query too short; results are hidden and nothing was requested.
    Hidden,
    /// A newer search was issued before this one completed.
    Superseded,
    NoResults,
    Results(Vec<SearchHit>),
}

/// Type-ahead search where only the latest query may update the results.
#[derive(Debug)]
pub struct SearchViewModel {
    api: Arc<dyn StorefrontApi>,
    generation: AtomicU64,
    results: Property<Vec<SearchHit>>,
    results_visible: Property<bool>,
    searching: Property<bool>,
    notice: Property<Option<String>>,
}

impl SearchViewModel {
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
            results: Property::new(Vec::new(), "results"),
            results_visible: Property::new(false, "results_visible"),
            searching: Property::new(false, "searching"),
            notice: Property::new(None, "notice"),
        }
    }

    pub fn results(&self) -> &Property<Vec<SearchHit>> {
        &self.results
    }

    pub fn results_visible(&self) -> &Property<bool> {
        &self.results_visible
    }

    pub fn searching(&self) -> &Property<bool> {
        &self.searching
    }

    pub fn notice(&self) -> &Property<Option<String>> {
        &self.notice
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            self.results_visible.set(false);
            return Ok(SearchOutcome::Hidden);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.results_visible.get() {
            self.results.set(Vec::new());
            self.results_visible.set(true);
        }
        self.searching.set(true);

        let reply = self.api.search(query).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding results for superseded query '{}'", query);
            return Ok(SearchOutcome::Superseded);
        }
        self.searching.set(false);

        let items = match reply {
            Ok(items) => items,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                self.notice.set(Some(e.notice()));
                return Err(e);
            }
        };

        let hits: Vec<SearchHit> = items
            .into_iter()
            .map(|item| SearchHit::new(item, query))
            .collect();
        debug!("Search '{}' returned {} hits", query, hits.len());
        self.results.set(hits.clone());

        if hits.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Results(hits))
        }
    }
}

impl ViewModel for SearchViewModel {
    fn subscribe_to_property(&self, property_name: &str) -> Option<PropertySubscriber> {
        match property_name {
            "results" => Some(self.results.subscribe()),
            "results_visible" => Some(self.results_visible.subscribe()),
            "searching" => Some(self.searching.subscribe()),
            "notice" => Some(self.notice.subscribe()),
            _ => None,
        }
    }
}
