// Storefront tuning constants. Values mirror what the storefront pages use;
// most of them can be overridden from the config file.

use std::time::Duration;

// === Pagination ===
/// Items revealed per "page" of the infinite scroll.
pub const DEFAULT_PAGE_SIZE: usize = 12;
/// Pages worth of items requested per listing call.
pub const DEFAULT_PAGES_PER_FETCH: usize = 5;

// === Cart ===
/// Rows shown in the cart panel before collapsing into "+N more".
pub const MAX_VISIBLE_CART_ITEMS: usize = 24;
/// Quota usage ratio above which the gauge turns critical.
pub const QUOTA_CRITICAL_RATIO: f64 = 0.75;

// === Search ===
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

// === Auto-selection ===
pub const AUTO_SELECTION_POLL_INTERVAL: Duration = Duration::from_secs(30);

// === Persisted keys ===
pub const ITEMS_COUNT_KEY: &str = "itemsCount";
pub const MOVIE_SELECTION_KEY: &str = "movieSelection";
pub const SERIES_SELECTION_KEY: &str = "seriesSelection";
pub const CART_IS_AUTO_SELECTION_KEY: &str = "cartIsAnAutoSelection";
pub const AUTO_SELECTION_RUNNING_KEY: &str = "autoSelectionIsRunning";
/// Last removed cart entry, kept so the removal can be undone.
pub const LAST_REMOVED_KEY: &str = "lastRemovedItem";
