#![cfg(test)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify, Semaphore};

use crate::backends::traits::{ListingRequest, OrderRequest, StorefrontApi};
use crate::models::{MediaItem, MediaItemId, MediaKind, OrderConfirmation, Poster};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::utils::{KioskError, Result};

/// Media builders
pub fn movie(id: &str, load: u64) -> MediaItem {
    MediaItem {
        id: MediaItemId::new(id),
        kind: MediaKind::Movie,
        title: format!("Movie {}", id),
        full_title: None,
        price: 100,
        load,
        display_load: None,
        poster: Poster::default(),
        slug: format!("movie-{}", id),
        tags: String::new(),
        trailer_resource: None,
        display_orders: None,
        display_clicks: None,
        is_adult: false,
    }
}

pub fn series(id: &str, load: u64) -> MediaItem {
    MediaItem {
        kind: MediaKind::Series,
        title: format!("Series {}", id),
        full_title: Some(format!("Series {} Season 1", id)),
        slug: format!("series-{}", id),
        ..movie(id, load)
    }
}

/// `count` movies with ids `m0..`.
pub fn movies(count: usize) -> Vec<MediaItem> {
    (0..count).map(|i| movie(&format!("m{}", i), 10)).collect()
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Store whose writes to one key fail a set number of times.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    key: String,
    failures_left: AtomicUsize,
}

impl FailingStore {
    pub fn new(key: &str, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            key: key.to_string(),
            failures_left: AtomicUsize::new(failures),
        })
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if key == self.key {
            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failed {
                return Err(KioskError::Io(std::io::Error::other("disk full")));
            }
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

/// Store that parks the next read of one key until `release` is called.
#[derive(Debug)]
pub struct PausingStore {
    inner: MemoryStore,
    key: String,
    armed: Mutex<bool>,
    paused: Notify,
    gate: Semaphore,
}

impl PausingStore {
    pub fn new(key: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            key: key.to_string(),
            armed: Mutex::new(false),
            paused: Notify::new(),
            gate: Semaphore::new(0),
        })
    }

    pub async fn pause_next_read(&self) {
        *self.armed.lock().await = true;
    }

    /// Resolves once a read is parked.
    pub async fn wait_paused(&self) {
        self.paused.notified().await;
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl KeyValueStore for PausingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if key == self.key {
            let pause = std::mem::take(&mut *self.armed.lock().await);
            if pause {
                self.paused.notify_one();
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
            }
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

/// Gate that keeps a fake call pending until released.
#[derive(Debug, Default)]
struct Gates {
    gates: HashMap<String, Arc<Semaphore>>,
}

/// Scripted storefront used by the view model and worker tests.
///
/// Replies are queued per endpoint; an `Err(message)` entry is returned as
/// the server's `{"error": message}` payload.
#[derive(Debug, Default)]
pub struct FakeStorefront {
    listings: Mutex<VecDeque<std::result::Result<Vec<MediaItem>, String>>>,
    listing_requests: Mutex<Vec<ListingRequest>>,
    listing_gate: Mutex<Option<Arc<Semaphore>>>,
    search_results: Mutex<HashMap<String, Vec<MediaItem>>>,
    search_gates: Mutex<Gates>,
    search_calls: AtomicUsize,
    orders: Mutex<VecDeque<std::result::Result<OrderConfirmation, String>>>,
    order_requests: Mutex<Vec<OrderRequest>>,
    auto_selection: Mutex<VecDeque<std::result::Result<Vec<MediaItem>, String>>>,
    auto_selection_calls: AtomicUsize,
}

impl FakeStorefront {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push_listing(&self, reply: std::result::Result<Vec<MediaItem>, &str>) {
        self.listings
            .lock()
            .await
            .push_back(reply.map_err(str::to_string));
    }

    pub async fn listing_requests(&self) -> Vec<ListingRequest> {
        self.listing_requests.lock().await.clone()
    }

    /// Make listing calls wait until `release_listing` is called.
    pub async fn hold_listings(&self) {
        *self.listing_gate.lock().await = Some(Arc::new(Semaphore::new(0)));
    }

    pub async fn release_listing(&self) {
        if let Some(gate) = self.listing_gate.lock().await.as_ref() {
            gate.add_permits(1);
        }
    }

    pub async fn set_search_results(&self, query: &str, items: Vec<MediaItem>) {
        self.search_results
            .lock()
            .await
            .insert(query.to_string(), items);
    }

    pub async fn hold_search(&self, query: &str) {
        self.search_gates
            .lock()
            .await
            .gates
            .insert(query.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub async fn release_search(&self, query: &str) {
        if let Some(gate) = self.search_gates.lock().await.gates.get(query) {
            gate.add_permits(1);
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub async fn push_order(&self, reply: std::result::Result<OrderConfirmation, &str>) {
        self.orders
            .lock()
            .await
            .push_back(reply.map_err(str::to_string));
    }

    pub async fn order_requests(&self) -> Vec<OrderRequest> {
        self.order_requests.lock().await.clone()
    }

    pub async fn push_auto_selection(&self, reply: std::result::Result<Vec<MediaItem>, &str>) {
        self.auto_selection
            .lock()
            .await
            .push_back(reply.map_err(str::to_string));
    }

    pub fn auto_selection_calls(&self) -> usize {
        self.auto_selection_calls.load(Ordering::SeqCst)
    }
}

async fn wait_on(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn list_media(&self, request: &ListingRequest) -> Result<Vec<MediaItem>> {
        self.listing_requests.lock().await.push(request.clone());
        let gate = self.listing_gate.lock().await.clone();
        wait_on(gate).await;
        match self.listings.lock().await.pop_front() {
            Some(reply) => reply.map_err(KioskError::Server),
            None => Ok(Vec::new()),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.search_gates.lock().await.gates.get(query).cloned();
        wait_on(gate).await;
        Ok(self
            .search_results
            .lock()
            .await
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderConfirmation> {
        self.order_requests.lock().await.push(order.clone());
        match self.orders.lock().await.pop_front() {
            Some(reply) => reply.map_err(KioskError::Server),
            None => Ok(OrderConfirmation {
                success: true,
                ..OrderConfirmation::default()
            }),
        }
    }

    async fn auto_selection_status(&self) -> Result<Vec<MediaItem>> {
        self.auto_selection_calls.fetch_add(1, Ordering::SeqCst);
        match self.auto_selection.lock().await.pop_front() {
            Some(reply) => reply.map_err(KioskError::Server),
            None => Err(KioskError::Server("Auto-selection still running".to_string())),
        }
    }
}
