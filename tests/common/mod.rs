#![allow(dead_code)]

pub mod builders;

use kiosk::backends::StorefrontClient;
use kiosk::config::{Config, NetworkConfig, StorefrontConfig};
use kiosk::models::MediaItem;
use kiosk::services::CartStore;
use kiosk::storage::SqliteStore;
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Cart backed by a SQLite file in a temporary directory.
pub struct TestContext {
    pub store: SqliteStore,
    pub cart: Arc<CartStore>,
    pub db_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("cart.db");
        let store = SqliteStore::open(&db_path)
            .await
            .expect("Failed to open test store");
        let cart = Arc::new(CartStore::new(Arc::new(store.clone())));

        Self {
            store,
            cart,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    /// A second cart over the same database file, as a new session would see it.
    pub async fn reopen(&self) -> CartStore {
        let store = SqliteStore::open(&self.db_path)
            .await
            .expect("Failed to reopen test store");
        CartStore::new(Arc::new(store))
    }
}

pub async fn mock_server() -> ServerGuard {
    Server::new_async().await
}

pub fn config_for(server: &ServerGuard) -> Config {
    Config {
        storefront: StorefrontConfig {
            base_url: server.url(),
            ..StorefrontConfig::default()
        },
        ..Config::default()
    }
}

pub fn client_for(server: &ServerGuard) -> Arc<StorefrontClient> {
    let config = config_for(server);
    Arc::new(
        StorefrontClient::new(&config.storefront, &NetworkConfig::default())
            .expect("Failed to create client"),
    )
}

/// Listing mock answering one `start_movies`/`start_series` pair.
pub async fn mock_listing(
    server: &mut ServerGuard,
    category_id: &str,
    start_movies: usize,
    start_series: usize,
    items: &[MediaItem],
) -> Mock {
    server
        .mock("GET", "/movies/get_media")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category_id".into(), category_id.into()),
            Matcher::UrlEncoded("start_movies".into(), start_movies.to_string()),
            Matcher::UrlEncoded("start_series".into(), start_series.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::to_string(items).expect("Failed to encode items"))
        .create_async()
        .await
}
