use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

use super::{Property, PropertySubscriber, ViewModel};
use crate::backends::traits::StorefrontApi;
use crate::config::CartConfig;
use crate::constants::QUOTA_CRITICAL_RATIO;
use crate::models::{MediaItem, MediaKind, OrderConfirmation};
use crate::services::cart::{CartSelection, CartSlot, CartStore};
use crate::services::checkout;
use crate::utils::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeLevel {
    Normal,
    Critical,
}

/// Share of the user's quota consumed by the cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaGauge {
    pub used: u64,
    pub available: u64,
    pub ratio: f64,
    /// Ratio as a percentage, rounded to two decimals.
    pub percent: f64,
    pub level: GaugeLevel,
}

impl QuotaGauge {
    pub fn new(used: u64, available: u64) -> Self {
        let ratio = if available > 0 {
            used as f64 / available as f64
        } else {
            0.0
        };
        let level = if ratio > QUOTA_CRITICAL_RATIO {
            GaugeLevel::Critical
        } else {
            GaugeLevel::Normal
        };
        Self {
            used,
            available,
            ratio,
            percent: (ratio * 10_000.0).round() / 100.0,
            level,
        }
    }

    /// Fill width for a bar, capped at 100%.
    pub fn fill_percent(&self) -> f64 {
        (self.ratio * 100.0).min(100.0)
    }
}

/// One visible row of the cart panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub slot: CartSlot,
    /// Combined index (movies first, then series) used by remove buttons.
    pub display_index: usize,
    pub item: MediaItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartPanel {
    pub rows: Vec<CartRow>,
    /// Items not shown because of the visible-row cap.
    pub more: Option<usize>,
    pub items_count: usize,
    /// Price of the whole selection.
    pub total_cost: u64,
    /// Price of the visible rows only.
    pub visible_cost: u64,
    pub checkout_enabled: bool,
    pub gauge: QuotaGauge,
}

impl CartPanel {
    /// Build the panel for `selection`. With `limit_visible`, at most half
    /// of `max_visible_items` rows are shown per kind.
    pub fn build(
        selection: &CartSelection,
        max_visible_items: usize,
        limit_visible: bool,
        available_quota: u64,
    ) -> Self {
        let items_count = selection.items_count();
        let (movie_rows, series_rows, more) = if limit_visible {
            let per_kind = max_visible_items / 2;
            let more = (items_count > max_visible_items).then(|| items_count - max_visible_items);
            (
                selection.movies.len().min(per_kind),
                selection.series.len().min(per_kind),
                more,
            )
        } else {
            (selection.movies.len(), selection.series.len(), None)
        };

        let movie_count = selection.movies.len();
        let rows: Vec<CartRow> = selection
            .movies
            .iter()
            .take(movie_rows)
            .enumerate()
            .map(|(position, item)| CartRow {
                slot: CartSlot::movie(position),
                display_index: position,
                item: item.clone(),
            })
            .chain(
                selection
                    .series
                    .iter()
                    .take(series_rows)
                    .enumerate()
                    .map(|(position, item)| CartRow {
                        slot: CartSlot::series(position),
                        display_index: movie_count + position,
                        item: item.clone(),
                    }),
            )
            .collect();

        let visible_cost = rows.iter().map(|row| row.item.price).sum();

        Self {
            checkout_enabled: !rows.is_empty(),
            rows,
            more,
            items_count,
            total_cost: selection.total_price(),
            visible_cost,
            gauge: QuotaGauge::new(selection.used_quota(), available_quota),
        }
    }

    pub fn empty(available_quota: u64) -> Self {
        Self::build(&CartSelection::default(), 0, false, available_quota)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keeps the cart panel in sync with the persisted selection.
#[derive(Debug)]
pub struct CartViewModel {
    cart: Arc<CartStore>,
    config: CartConfig,
    available_quota: AtomicU64,
    panel: Property<CartPanel>,
    error: Property<Option<String>>,
}

impl CartViewModel {
    pub fn new(cart: Arc<CartStore>, config: CartConfig) -> Self {
        let available_quota = config.available_quota;
        Self {
            cart,
            config,
            available_quota: AtomicU64::new(available_quota),
            panel: Property::new(CartPanel::empty(available_quota), "panel"),
            error: Property::new(None, "error"),
        }
    }

    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    pub fn panel(&self) -> &Property<CartPanel> {
        &self.panel
    }

    pub fn error(&self) -> &Property<Option<String>> {
        &self.error
    }

    pub fn available_quota(&self) -> u64 {
        self.available_quota.load(Ordering::Relaxed)
    }

    /// The quota is user-specific and usually only known after login.
    pub async fn set_available_quota(&self, quota: u64) -> Result<CartPanel> {
        self.available_quota.store(quota, Ordering::Relaxed);
        self.populate_cart_panel().await
    }

    /// Rebuild the panel from the store.
    pub async fn populate_cart_panel(&self) -> Result<CartPanel> {
        let selection = match self.cart.load_selection().await {
            Ok(selection) => selection,
            Err(e) => {
                error!("Failed to load cart selection: {}", e);
                self.error.set(Some(e.notice()));
                return Err(e);
            }
        };

        let panel = CartPanel::build(
            &selection,
            self.config.max_visible_items,
            self.config.limit_visible,
            self.available_quota(),
        );
        debug!(
            "Cart panel: {} rows of {} items, {:.2}% of quota",
            panel.rows.len(),
            panel.items_count,
            panel.gauge.percent
        );
        self.panel.set(panel.clone());
        Ok(panel)
    }

    pub async fn add(&self, item: MediaItem) -> Result<CartPanel> {
        self.cart.add_to_cart(item, None).await?;
        self.populate_cart_panel().await
    }

    /// Add only when the item fits the known quota. Returns `None` and
    /// leaves the cart untouched otherwise; an unknown quota (0) never blocks.
    pub async fn add_within_quota(&self, item: MediaItem) -> Result<Option<CartPanel>> {
        if self.available_quota() > 0 && !self.can_afford(&item).await? {
            debug!("{} {} does not fit the remaining quota", item.kind, item.id);
            return Ok(None);
        }
        self.add(item).await.map(Some)
    }

    pub async fn remove(&self, display_index: usize, kind: MediaKind) -> Result<CartPanel> {
        self.cart.remove_at_display_index(display_index, kind).await?;
        self.populate_cart_panel().await
    }

    pub async fn undo_remove(&self) -> Result<CartPanel> {
        self.cart.restore_last_removed().await?;
        self.populate_cart_panel().await
    }

    pub async fn clear(&self) -> Result<CartPanel> {
        self.cart.clear_cart().await?;
        self.populate_cart_panel().await
    }

    /// Submit the cart. A rejected order leaves the cart untouched and its
    /// message in `error`.
    pub async fn checkout(&self, api: &dyn StorefrontApi) -> Result<OrderConfirmation> {
        match checkout::submit_order(api, &self.cart).await {
            Ok(confirmation) => {
                self.error.set(None);
                self.populate_cart_panel().await?;
                Ok(confirmation)
            }
            Err(e) => {
                self.error.set(Some(e.notice()));
                Err(e)
            }
        }
    }

    /// Whether `item` can still be ordered without exceeding the quota.
    pub async fn can_afford(&self, item: &MediaItem) -> Result<bool> {
        self.cart
            .has_enough_balance(item.load, self.available_quota())
            .await
    }
}

impl ViewModel for CartViewModel {
    fn subscribe_to_property(&self, property_name: &str) -> Option<PropertySubscriber> {
        match property_name {
            "panel" => Some(self.panel.subscribe()),
            "error" => Some(self.error.subscribe()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeStorefront, memory_store, movie, series};

    fn selection(movies: usize, series_count: usize) -> CartSelection {
        CartSelection {
            movies: (0..movies).map(|i| movie(&format!("m{}", i), 10)).collect(),
            series: (0..series_count)
                .map(|i| series(&format!("s{}", i), 5))
                .collect(),
        }
    }

    #[test]
    fn test_gauge_thresholds() {
        let normal = QuotaGauge::new(75, 100);
        assert_eq!(normal.level, GaugeLevel::Normal);
        assert_eq!(normal.percent, 75.0);

        let critical = QuotaGauge::new(76, 100);
        assert_eq!(critical.level, GaugeLevel::Critical);

        let third = QuotaGauge::new(1, 3);
        assert_eq!(third.percent, 33.33);

        let unknown = QuotaGauge::new(70, 0);
        assert_eq!(unknown.ratio, 0.0);
        assert_eq!(unknown.level, GaugeLevel::Normal);

        assert_eq!(QuotaGauge::new(300, 100).fill_percent(), 100.0);
    }

    #[test]
    fn test_panel_caps_rows_per_kind() {
        let panel = CartPanel::build(&selection(20, 10), 24, true, 0);

        assert_eq!(panel.rows.len(), 22);
        assert_eq!(panel.items_count, 30);
        assert_eq!(panel.more, Some(6));
        assert_eq!(panel.total_cost, 3000);
        assert_eq!(panel.visible_cost, 2200);
        assert!(panel.checkout_enabled);

        let first_series = &panel.rows[12];
        assert_eq!(first_series.slot, CartSlot::series(0));
        assert_eq!(first_series.display_index, 20);
    }

    #[test]
    fn test_panel_without_limit_shows_everything() {
        let panel = CartPanel::build(&selection(20, 10), 24, false, 0);
        assert_eq!(panel.rows.len(), 30);
        assert_eq!(panel.more, None);
        assert_eq!(panel.visible_cost, panel.total_cost);
    }

    #[test]
    fn test_empty_panel_disables_checkout() {
        let panel = CartPanel::build(&CartSelection::default(), 24, true, 100);
        assert!(panel.is_empty());
        assert!(!panel.checkout_enabled);
        assert_eq!(panel.more, None);
    }

    #[tokio::test]
    async fn test_view_model_refreshes_panel_on_mutation() {
        let cart = Arc::new(CartStore::new(memory_store()));
        let view_model = CartViewModel::new(
            cart,
            CartConfig {
                available_quota: 100,
                ..CartConfig::default()
            },
        );
        let mut subscriber = view_model.subscribe_to_property("panel").unwrap();

        for (id, load) in [("m1", 10), ("m2", 20), ("m3", 30)] {
            view_model.add(movie(id, load)).await.unwrap();
        }
        view_model.add(series("s1", 5)).await.unwrap();
        let panel = view_model.add(series("s2", 5)).await.unwrap();

        assert!(subscriber.wait_for_change().await);
        assert_eq!(panel.gauge.used, 70);
        assert_eq!(panel.gauge.percent, 70.0);
        assert_eq!(view_model.panel().get().items_count, 5);

        let panel = view_model.remove(3, MediaKind::Series).await.unwrap();
        assert_eq!(panel.items_count, 4);
        assert_eq!(panel.rows[3].item.id.as_str(), "s2");

        let panel = view_model.undo_remove().await.unwrap();
        assert_eq!(panel.rows[3].item.id.as_str(), "s1");

        assert!(view_model.can_afford(&movie("m4", 29)).await.unwrap());
        assert!(!view_model.can_afford(&movie("m4", 30)).await.unwrap());

        let panel = view_model.clear().await.unwrap();
        assert!(panel.is_empty());
        assert_eq!(panel.gauge.used, 0);
    }

    #[tokio::test]
    async fn test_add_within_quota_refuses_items_over_quota() {
        let cart = Arc::new(CartStore::new(memory_store()));
        let view_model = CartViewModel::new(
            cart.clone(),
            CartConfig {
                available_quota: 100,
                ..CartConfig::default()
            },
        );
        view_model.add(movie("m1", 60)).await.unwrap();

        assert!(view_model.add_within_quota(movie("m2", 40)).await.unwrap().is_none());
        assert_eq!(cart.items_count().await.unwrap(), 1);

        let panel = view_model.add_within_quota(movie("m3", 39)).await.unwrap().unwrap();
        assert_eq!(panel.items_count, 2);

        let unknown_quota = CartViewModel::new(cart.clone(), CartConfig::default());
        assert!(unknown_quota.add_within_quota(movie("m4", 500)).await.unwrap().is_some());
        assert_eq!(cart.items_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_checkout_outcomes() {
        let api = FakeStorefront::new();
        api.push_order(Err("Session expired")).await;
        let cart = Arc::new(CartStore::new(memory_store()));
        let view_model = CartViewModel::new(cart, CartConfig::default());
        view_model.add(movie("m1", 10)).await.unwrap();

        assert!(view_model.checkout(api.as_ref()).await.is_err());
        assert_eq!(view_model.error().get().as_deref(), Some("Session expired"));
        assert_eq!(view_model.panel().get().items_count, 1);

        let confirmation = view_model.checkout(api.as_ref()).await.unwrap();
        assert!(confirmation.success);
        assert!(view_model.error().get().is_none());
        assert!(view_model.panel().get().is_empty());
    }

    #[tokio::test]
    async fn test_quota_update_rebuilds_gauge() {
        let cart = Arc::new(CartStore::new(memory_store()));
        cart.add_to_cart(movie("m1", 80), None).await.unwrap();
        let view_model = CartViewModel::new(cart, CartConfig::default());

        let panel = view_model.set_available_quota(100).await.unwrap();
        assert_eq!(panel.gauge.level, GaugeLevel::Critical);
        assert!(view_model.subscribe_to_property("unknown").is_none());
    }
}
