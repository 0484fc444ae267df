use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::constants::{
    AUTO_SELECTION_RUNNING_KEY, CART_IS_AUTO_SELECTION_KEY, ITEMS_COUNT_KEY, LAST_REMOVED_KEY,
    MOVIE_SELECTION_KEY, SERIES_SELECTION_KEY,
};
use crate::models::{MediaItem, MediaItemId, MediaKind};
use crate::storage::KeyValueStore;
use crate::utils::{KioskError, Result};

/// Address of one cart entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartSlot {
    pub kind: MediaKind,
    pub position: usize,
}

impl CartSlot {
    pub fn movie(position: usize) -> Self {
        Self {
            kind: MediaKind::Movie,
            position,
        }
    }

    pub fn series(position: usize) -> Self {
        Self {
            kind: MediaKind::Series,
            position,
        }
    }

    /// Cart rows are listed movies first, then series, and front-ends
    /// address them by that combined index. A series row at display index
    /// `i` is therefore series position `i - movie_count`.
    pub fn from_display_index(index: usize, kind: MediaKind, movie_count: usize) -> Option<Self> {
        match kind {
            MediaKind::Movie => Some(Self::movie(index)),
            MediaKind::Series => index.checked_sub(movie_count).map(Self::series),
        }
    }
}

/// Both selection lists, as persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSelection {
    pub movies: Vec<MediaItem>,
    pub series: Vec<MediaItem>,
}

impl CartSelection {
    pub fn items_count(&self) -> usize {
        self.movies.len() + self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items_count() == 0
    }

    pub fn list(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Series => &self.series,
        }
    }

    fn list_mut(&mut self, kind: MediaKind) -> &mut Vec<MediaItem> {
        match kind {
            MediaKind::Movie => &mut self.movies,
            MediaKind::Series => &mut self.series,
        }
    }

    /// Movies then series, the order rows are displayed in.
    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.movies.iter().chain(self.series.iter())
    }

    pub fn used_quota(&self) -> u64 {
        self.iter().map(|item| item.load).sum()
    }

    pub fn total_price(&self) -> u64 {
        self.iter().map(|item| item.price).sum()
    }

    /// `id|type,` for every item, the format the order endpoint expects.
    pub fn order_items_param(&self) -> String {
        self.iter()
            .map(|item| format!("{}|{},", item.id, item.kind))
            .collect()
    }

    fn insert(&mut self, item: MediaItem, position: Option<usize>) {
        let list = self.list_mut(item.kind);
        match position {
            Some(position) => {
                let position = position.min(list.len());
                list.insert(position, item);
            }
            None => list.push(item),
        }
    }

    fn remove(&mut self, slot: CartSlot) -> Result<MediaItem> {
        let list = self.list_mut(slot.kind);
        if slot.position >= list.len() {
            return Err(KioskError::SlotOutOfRange {
                kind: slot.kind,
                position: slot.position,
            });
        }
        Ok(list.remove(slot.position))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemovedEntry {
    item: MediaItem,
    slot: CartSlot,
}

/// Shopping cart persisted in a [`KeyValueStore`].
///
/// The item count is derived from the two lists and rewritten from that
/// derived value on every mutation, so the stored `itemsCount` can never
/// drift from the lists. The three keys are still written one after the
/// other; a failing write leaves the earlier ones in place.
///
/// The last removal is persisted too, so it can be undone from a later
/// session.
#[derive(Debug)]
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl CartStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backing_store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.store.get(key).await? {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn load_selection(&self) -> Result<CartSelection> {
        Ok(CartSelection {
            movies: self.read_list(MOVIE_SELECTION_KEY).await?,
            series: self.read_list(SERIES_SELECTION_KEY).await?,
        })
    }

    async fn save_selection(&self, selection: &CartSelection) -> Result<()> {
        self.store
            .set(ITEMS_COUNT_KEY, &selection.items_count().to_string())
            .await?;
        self.store
            .set(MOVIE_SELECTION_KEY, &serde_json::to_string(&selection.movies)?)
            .await?;
        self.store
            .set(SERIES_SELECTION_KEY, &serde_json::to_string(&selection.series)?)
            .await?;
        Ok(())
    }

    /// Insert `item` at `position` of its kind's list (appending when
    /// `None` or past the end). Returns the new item count.
    pub async fn add_to_cart(&self, item: MediaItem, position: Option<usize>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut selection = self.load_selection().await?;
        debug!("Adding {} {} to cart", item.kind, item.id);
        selection.insert(item, position);
        self.save_selection(&selection).await?;
        Ok(selection.items_count())
    }

    /// Add several items in order, persisting once.
    pub async fn add_all(&self, items: Vec<MediaItem>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut selection = self.load_selection().await?;
        for item in items {
            selection.insert(item, None);
        }
        self.save_selection(&selection).await?;
        Ok(selection.items_count())
    }

    pub async fn remove_from_cart(&self, slot: CartSlot) -> Result<MediaItem> {
        let _guard = self.write_lock.lock().await;
        let selection = self.load_selection().await?;
        self.remove_locked(selection, slot).await
    }

    /// Remove by combined display index (movies first, then series).
    pub async fn remove_at_display_index(&self, index: usize, kind: MediaKind) -> Result<MediaItem> {
        let _guard = self.write_lock.lock().await;
        let selection = self.load_selection().await?;
        let slot = CartSlot::from_display_index(index, kind, selection.movies.len())
            .ok_or(KioskError::SlotOutOfRange {
                kind,
                position: index,
            })?;
        self.remove_locked(selection, slot).await
    }

    // Caller holds `write_lock`.
    async fn remove_locked(&self, mut selection: CartSelection, slot: CartSlot) -> Result<MediaItem> {
        let item = selection.remove(slot)?;
        self.save_selection(&selection).await?;
        debug!("Removed {} {} from cart", item.kind, item.id);
        let entry = RemovedEntry {
            item: item.clone(),
            slot,
        };
        self.store
            .set(LAST_REMOVED_KEY, &serde_json::to_string(&entry)?)
            .await?;
        Ok(item)
    }

    /// Put the most recently removed item back where it was.
    pub async fn restore_last_removed(&self) -> Result<Option<MediaItem>> {
        let _guard = self.write_lock.lock().await;
        let entry: RemovedEntry = match self.store.get(LAST_REMOVED_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => return Ok(None),
        };
        let mut selection = self.load_selection().await?;
        selection.insert(entry.item.clone(), Some(entry.slot.position));
        self.save_selection(&selection).await?;
        self.store.remove(LAST_REMOVED_KEY).await?;
        debug!("Restored {} {} to cart", entry.item.kind, entry.item.id);
        Ok(Some(entry.item))
    }

    /// Empty both lists and drop the auto-selection marker.
    pub async fn clear_cart(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.set(ITEMS_COUNT_KEY, "0").await?;
        self.store.set(MOVIE_SELECTION_KEY, "[]").await?;
        self.store.set(SERIES_SELECTION_KEY, "[]").await?;
        self.store.remove(CART_IS_AUTO_SELECTION_KEY).await?;
        self.store.remove(LAST_REMOVED_KEY).await?;
        info!("Cart cleared");
        Ok(())
    }

    /// Forget the selection entirely once an order went through.
    pub async fn discard_ordered_selection(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        for key in [
            MOVIE_SELECTION_KEY,
            SERIES_SELECTION_KEY,
            ITEMS_COUNT_KEY,
            CART_IS_AUTO_SELECTION_KEY,
            LAST_REMOVED_KEY,
        ] {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    pub async fn items_count(&self) -> Result<usize> {
        Ok(self.load_selection().await?.items_count())
    }

    pub async fn used_quota(&self) -> Result<u64> {
        Ok(self.load_selection().await?.used_quota())
    }

    /// Whether ordering `load` more units still fits strictly inside the quota.
    pub async fn has_enough_balance(&self, load: u64, available_quota: u64) -> Result<bool> {
        let used = self.used_quota().await?;
        Ok(available_quota > used + load)
    }

    /// Order parameter for the current selection; `"no movie"` when no
    /// selection has ever been stored.
    pub async fn order_items_param(&self) -> Result<String> {
        let has_movies = self.store.contains(MOVIE_SELECTION_KEY).await?;
        let has_series = self.store.contains(SERIES_SELECTION_KEY).await?;
        if !has_movies && !has_series {
            return Ok("no movie".to_string());
        }
        Ok(self.load_selection().await?.order_items_param())
    }

    pub async fn selected_ids(&self) -> Result<HashSet<MediaItemId>> {
        Ok(self
            .load_selection()
            .await?
            .iter()
            .map(|item| item.id.clone())
            .collect())
    }

    pub async fn is_selected(&self, id: &MediaItemId) -> Result<bool> {
        Ok(self.selected_ids().await?.contains(id))
    }

    pub async fn is_auto_selection_running(&self) -> Result<bool> {
        self.store.contains(AUTO_SELECTION_RUNNING_KEY).await
    }

    pub async fn mark_auto_selection_running(&self) -> Result<()> {
        self.store.set(AUTO_SELECTION_RUNNING_KEY, "yes").await
    }

    pub async fn clear_auto_selection_running(&self) -> Result<()> {
        self.store.remove(AUTO_SELECTION_RUNNING_KEY).await
    }

    pub async fn is_auto_selection_cart(&self) -> Result<bool> {
        self.store.contains(CART_IS_AUTO_SELECTION_KEY).await
    }

    pub async fn mark_cart_as_auto_selection(&self) -> Result<()> {
        self.store.set(CART_IS_AUTO_SELECTION_KEY, "yes").await
    }
}

#[cfg(test)]
#[path = "cart_tests.rs"]
mod tests;
