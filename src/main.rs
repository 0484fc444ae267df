use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiosk::Config;
use kiosk::backends::{StorefrontApi, StorefrontClient};
use kiosk::core::viewmodels::{
    CartPanel, CartViewModel, CatalogViewModel, GaugeLevel, PageOutcome, SearchOutcome,
    SearchViewModel,
};
use kiosk::models::{CategoryId, MediaItem, MediaKind};
use kiosk::services::CartStore;
use kiosk::storage::{KeyValueStore, MemoryStore, SqliteStore};
use kiosk::workers::AutoSelectionMonitor;

#[derive(Parser)]
#[command(name = "kiosk", version, about = "Storefront client: browse, search, cart and orders")]
struct Cli {
    /// Configuration file (defaults to <config_dir>/kiosk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the cart in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a category page by page
    Browse {
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Search movies and series
    Search { query: String },
    /// Inspect or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Order,
    /// Follow a server-side auto-selection
    AutoSelection {
        #[command(subcommand)]
        action: AutoSelectionAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    Show,
    /// Add a media item given as JSON
    Add { json: String },
    /// Remove the row at a displayed index
    Remove {
        index: usize,
        #[arg(long, value_enum, default_value = "movie")]
        kind: KindArg,
    },
    Clear,
    /// Put the last removed item back
    Undo,
}

#[derive(Subcommand)]
enum AutoSelectionAction {
    /// Flag an auto-selection as running and wait for it
    Start,
    /// Wait for a running auto-selection to finish
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Series,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Series => MediaKind::Series,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kiosk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let sqlite = if cli.ephemeral {
        None
    } else {
        let path = config.database_path()?;
        Some(
            SqliteStore::open(&path)
                .await
                .with_context(|| format!("Failed to open cart database {:?}", path))?,
        )
    };
    let store: Arc<dyn KeyValueStore> = match &sqlite {
        Some(sqlite) => Arc::new(sqlite.clone()),
        None => Arc::new(MemoryStore::new()),
    };

    let api: Arc<dyn StorefrontApi> = Arc::new(
        StorefrontClient::new(&config.storefront, &config.network)
            .context("Failed to create storefront client")?,
    );
    let cart = Arc::new(CartStore::new(store));

    info!("Using storefront at {}", config.storefront.base_url);
    let result = run(cli.command, &config, api, cart).await;

    if let Some(sqlite) = sqlite {
        sqlite.close().await;
    }
    result
}

async fn run(
    command: Command,
    config: &Config,
    api: Arc<dyn StorefrontApi>,
    cart: Arc<CartStore>,
) -> Result<()> {
    let cart_view = CartViewModel::new(cart.clone(), config.cart.clone());

    match command {
        Command::Browse { category, pages } => {
            let catalog = CatalogViewModel::new(api, config.pagination.clone());
            catalog.set_category(CategoryId::new(category)).await;
            let selected = cart.selected_ids().await?;

            for _ in 0..pages {
                match catalog.show_next_page().await? {
                    PageOutcome::Page(items) => {
                        for item in &items {
                            print_item(item, selected.contains(&item.id));
                        }
                    }
                    PageOutcome::NoData => {
                        println!("No data found");
                        break;
                    }
                    PageOutcome::Exhausted => {
                        println!("No more items");
                        break;
                    }
                    PageOutcome::Pending | PageOutcome::Stale => break,
                }
            }
        }
        Command::Search { query } => {
            let search = SearchViewModel::new(api);
            match search.search(&query).await? {
                SearchOutcome::Hidden => println!("Type at least two characters"),
                SearchOutcome::NoResults => println!("No result"),
                SearchOutcome::Results(hits) => {
                    for hit in hits {
                        println!(
                            "{:>12}  {:<7} {}  [{}]",
                            hit.item.id, hit.item.kind, hit.highlighted_title, hit.minor_tag
                        );
                    }
                }
                SearchOutcome::Superseded => {}
            }
        }
        Command::Cart { action } => {
            let panel = match action {
                CartAction::Show => cart_view.populate_cart_panel().await?,
                CartAction::Add { json } => {
                    let item: MediaItem =
                        serde_json::from_str(&json).context("Invalid media item JSON")?;
                    let title = item.display_title().to_string();
                    match cart_view.add_within_quota(item).await? {
                        Some(panel) => panel,
                        None => {
                            println!("Not enough quota left for {}, not added", title);
                            cart_view.populate_cart_panel().await?
                        }
                    }
                }
                CartAction::Remove { index, kind } => cart_view.remove(index, kind.into()).await?,
                CartAction::Clear => cart_view.clear().await?,
                CartAction::Undo => cart_view.undo_remove().await?,
            };
            print_panel(&panel);
        }
        Command::Order => {
            let confirmation = cart_view.checkout(api.as_ref()).await?;
            if confirmation.success {
                println!("Order confirmed");
            } else {
                println!("Order submitted");
            }
        }
        Command::AutoSelection { action } => {
            let monitor = Arc::new(AutoSelectionMonitor::new(
                api,
                cart.clone(),
                config.auto_selection.poll_interval(),
            ));
            let started = match action {
                AutoSelectionAction::Start => monitor.begin().await?,
                AutoSelectionAction::Watch => monitor.start().await?,
            };
            if !started {
                println!("No auto-selection running");
                return Ok(());
            }

            println!("Waiting for the auto-selection to finish (Ctrl-C to stop)");
            tokio::select! {
                _ = monitor.wait_until_resolved() => {
                    if let Some(notice) = monitor.notice().get() {
                        println!("{}", notice);
                    }
                    print_panel(&cart_view.populate_cart_panel().await?);
                }
                _ = tokio::signal::ctrl_c() => {
                    monitor.stop().await;
                }
            }
        }
    }

    Ok(())
}

fn print_item(item: &MediaItem, is_selected: bool) {
    let marker = if is_selected { "*" } else { " " };
    println!(
        "{} {:>12}  {:<7} {:<50} {:>6}",
        marker,
        item.id,
        item.kind,
        item.display_title(),
        item.price
    );
}

fn print_panel(panel: &CartPanel) {
    if panel.is_empty() {
        println!("No movie in the cart");
    }
    for row in &panel.rows {
        println!(
            "{:>3}  {:<7} {:<50} {:>6}",
            row.display_index,
            row.item.kind,
            row.item.display_title(),
            row.item.price
        );
    }
    if let Some(more) = panel.more {
        println!("     ... and {} more", more);
    }

    let level = match panel.gauge.level {
        GaugeLevel::Normal => "normal",
        GaugeLevel::Critical => "critical",
    };
    println!(
        "{} items, total {} (shown {}), quota {}/{} ({}%, {})",
        panel.items_count,
        panel.total_cost,
        panel.visible_cost,
        panel.gauge.used,
        panel.gauge.available,
        panel.gauge.percent,
        level
    );
}
