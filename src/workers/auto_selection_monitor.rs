use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backends::traits::StorefrontApi;
use crate::core::viewmodels::Property;
use crate::services::cart::CartStore;
use crate::utils::Result;

const DEFAULT_RESOLVED_NOTICE: &str = "Your automatic selection is ready in the cart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Resolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoSelectionEvent {
    Resolved {
        items_added: usize,
        resolved_at: DateTime<Utc>,
    },
}

/// Polls the storefront until a server-side auto-selection job has picked
/// its items, then moves them into the cart.
///
/// Polling only starts while the store carries the "auto-selection running"
/// flag, and every tick re-checks it so a flag cleared elsewhere turns the
/// remaining ticks into no-ops.
#[derive(Debug)]
pub struct AutoSelectionMonitor {
    api: Arc<dyn StorefrontApi>,
    cart: Arc<CartStore>,
    poll_interval: Duration,
    resolved_notice: String,
    state: Property<PollerState>,
    controls_enabled: Property<bool>,
    notice: Property<Option<String>>,
    last_checked_at: Property<Option<DateTime<Utc>>>,
    events: broadcast::Sender<AutoSelectionEvent>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl AutoSelectionMonitor {
    pub fn new(api: Arc<dyn StorefrontApi>, cart: Arc<CartStore>, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            api,
            cart,
            poll_interval: poll_interval.max(Duration::from_secs(1)),
            resolved_notice: DEFAULT_RESOLVED_NOTICE.to_string(),
            state: Property::new(PollerState::Idle, "state"),
            controls_enabled: Property::new(true, "controls_enabled"),
            notice: Property::new(None, "notice"),
            last_checked_at: Property::new(None, "last_checked_at"),
            events,
            task: Mutex::new(None),
        }
    }

    pub fn with_resolved_notice(mut self, notice: impl Into<String>) -> Self {
        self.resolved_notice = notice.into();
        self
    }

    pub fn state(&self) -> &Property<PollerState> {
        &self.state
    }

    /// Whether the auto-selection form may be used.
    pub fn controls_enabled(&self) -> &Property<bool> {
        &self.controls_enabled
    }

    pub fn notice(&self) -> &Property<Option<String>> {
        &self.notice
    }

    pub fn last_checked_at(&self) -> &Property<Option<DateTime<Utc>>> {
        &self.last_checked_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoSelectionEvent> {
        self.events.subscribe()
    }

    /// Flag a freshly requested auto-selection and start watching it.
    pub async fn begin(self: &Arc<Self>) -> Result<bool> {
        self.cart.mark_auto_selection_running().await?;
        self.start().await
    }

    /// Start polling if an auto-selection is running. Returns whether a
    /// poll loop is now active.
    pub async fn start(self: &Arc<Self>) -> Result<bool> {
        let mut task = self.task.lock().await;
        if self.state.get() == PollerState::Polling {
            return Ok(true);
        }
        if !self.cart.is_auto_selection_running().await? {
            debug!("No auto-selection running");
            return Ok(false);
        }

        info!(
            "Watching auto-selection every {}s",
            self.poll_interval.as_secs()
        );
        self.state.set(PollerState::Polling);
        self.controls_enabled.set(false);

        let token = CancellationToken::new();
        let handle = tokio::spawn(self.clone().poll_loop(token.clone()));
        *task = Some((token, handle));
        Ok(true)
    }

    /// Cancel the poll loop without resolving. The running flag is kept so
    /// a later `start` resumes watching.
    pub async fn stop(&self) {
        let Some((token, handle)) = self.task.lock().await.take() else {
            return;
        };
        token.cancel();
        if let Err(e) = handle.await {
            warn!("Auto-selection poll loop ended abnormally: {}", e);
        }
        if self.state.get() == PollerState::Polling {
            self.state.set(PollerState::Idle);
            self.controls_enabled.set(true);
        }
        info!("Stopped watching auto-selection");
    }

    pub async fn wait_until_resolved(&self) {
        let mut state = self.state.watch();
        let _ = state
            .wait_for(|state| *state == PollerState::Resolved)
            .await;
    }

    async fn poll_loop(self: Arc<Self>, token: CancellationToken) {
        // First tick completes immediately.
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    match self.check_status().await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => warn!("Auto-selection check failed: {}", e),
                    }
                }
            }
        }
    }

    /// One status check. Returns `true` once the selection was moved into
    /// the cart.
    pub async fn check_status(&self) -> Result<bool> {
        let reply = self.api.auto_selection_status().await;
        self.last_checked_at.set(Some(Utc::now()));

        let items = match reply {
            Ok(items) => items,
            Err(e) => {
                debug!("Auto-selection not ready: {}", e);
                return Ok(false);
            }
        };
        if !self.cart.is_auto_selection_running().await? {
            debug!("Auto-selection flag cleared, ignoring reply");
            return Ok(false);
        }

        // The flag goes last so a failed merge is retried on the next tick.
        let items_added = items.len();
        self.cart.add_all(items).await?;
        self.cart.mark_cart_as_auto_selection().await?;
        self.cart.clear_auto_selection_running().await?;

        info!("Auto-selection resolved with {} items", items_added);
        self.controls_enabled.set(true);
        self.notice.set(Some(self.resolved_notice.clone()));
        self.state.set(PollerState::Resolved);
        let _ = self.events.send(AutoSelectionEvent::Resolved {
            items_added,
            resolved_at: Utc::now(),
        });
        Ok(true)
    }
}
