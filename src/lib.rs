// Re-export modules
pub mod collector;
pub mod config;
pub mod dom;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod host;
pub mod pagination;
pub mod present;
pub mod results;
pub mod store;
pub mod utils;

// Re-export commonly used types for convenience
pub use collector::{Collector, Outcome, Phase};
pub use config::{CollectorConfig, SettlePolicy};
pub use error::CollectError;
pub use results::{CollectionState, ItemRecord};

use dom::parse_document;
use host::{HostPage, Notice, Request, TRIGGERS_ID};
use present::{RESTORE_ID, ResultView, sort_by_favorites};
use serde::{Deserialize, Serialize};
use store::Store;
use tokio::sync::watch;

/// Inbound enable/disable message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub enabled: bool,
}

/// What a context activation found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The system is switched off
    Disabled,
    /// Nothing in progress; waiting for a trigger
    Idle,
    /// A stored run was picked up again
    Resumed(Outcome),
}

/// What an action requested from the page produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// The current page was sorted
    Sorted(Vec<ItemRecord>),
    /// A multi-page run finished, paused or failed
    Collected(Outcome),
    /// The original view was put back, if one was replaced
    Restored(bool),
}

/// One context: a host page, the durable store, and the results view.
///
/// A session is rebuilt from scratch whenever its process restarts; anything
/// that must survive goes through the store.
pub struct Session<S: Store, H: HostPage> {
    store: S,
    host: H,
    config: CollectorConfig,
    view: ResultView,
    enabled_tx: watch::Sender<bool>,
    stored_enabled: Option<bool>,
}

impl<S: Store, H: HostPage> Session<S, H> {
    pub fn new(store: S, host: H, config: CollectorConfig) -> Self {
        let (enabled_tx, _) = watch::channel(true);
        Self {
            store,
            host,
            config,
            view: ResultView::new(),
            enabled_tx,
            stored_enabled: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Ends the session, handing back the host page
    pub fn into_host(self) -> H {
        self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled_tx.borrow()
    }

    pub fn is_presenting(&self) -> bool {
        self.view.is_presenting()
    }

    /// Handle for flipping the enable flag from another task.
    ///
    /// A run in progress checks the flag before each new cycle.
    pub fn enable_handle(&self) -> watch::Sender<bool> {
        self.enabled_tx.clone()
    }

    /// Runs on every context activation: reads the enable flag and resumes a
    /// stored run if one is in progress
    pub async fn activate(&mut self) -> Activation {
        let enabled = match store::load_enabled(&self.store).await {
            Ok(enabled) => {
                self.stored_enabled = Some(enabled);
                enabled
            }
            Err(e) => {
                ::log::warn!("Could not read enable flag, assuming enabled: {}", e);
                true
            }
        };
        self.enabled_tx.send_replace(enabled);
        if !enabled {
            ::log::info!("Sorting disabled");
            return Activation::Disabled;
        }

        self.host.arm_triggers().await;

        match self.resume_stored().await {
            Some(outcome) => Activation::Resumed(outcome),
            None => Activation::Idle,
        }
    }

    async fn resume_stored(&mut self) -> Option<Outcome> {
        let state = match store::load_state(&self.store).await {
            Ok(Some(state)) => state,
            Ok(None) => return None,
            Err(e) => {
                ::log::warn!("Could not read stored collection: {}", e);
                self.host
                    .notify(&Notice::error(format!("Saved progress unavailable: {}", e)))
                    .await;
                if let Err(e) = store::reset_state(&self.store).await {
                    ::log::warn!("Could not reset stored collection: {}", e);
                }
                return None;
            }
        };

        self.host
            .notify(&Notice::info(format!(
                "Resuming collection from page {}...",
                state.current_page
            )))
            .await;

        let mut collector = Collector::new(
            &self.store,
            &self.host,
            &self.config,
            self.enabled_tx.subscribe(),
        );
        Some(collector.resume(state, &mut self.view).await)
    }

    /// Applies an enable/disable message
    pub async fn apply_control(&mut self, message: ControlMessage) {
        self.enabled_tx.send_replace(message.enabled);
        if message.enabled {
            if !self.view.is_presenting() {
                self.host.arm_triggers().await;
            }
        } else {
            self.host.disarm_triggers().await;
        }
    }

    /// Sorts only the items on the current page. Nothing is persisted.
    pub async fn sort_current_page(&mut self) -> Result<Vec<ItemRecord>, CollectError> {
        if !self.is_enabled() {
            return Err(CollectError::Disabled);
        }
        self.host
            .notify(&Notice::info("Sorting current page items..."))
            .await;

        match self.present_current_page().await {
            Ok(items) => {
                self.host
                    .notify(&Notice::info(format!(
                        "{} items sorted by favorites!",
                        items.len()
                    )))
                    .await;
                Ok(items)
            }
            Err(e) => {
                let text = match &e {
                    CollectError::ContainerNotFound => e.to_string(),
                    other => format!("Error sorting: {}", other),
                };
                self.host.notify(&Notice::error(text)).await;
                Err(e)
            }
        }
    }

    async fn present_current_page(&mut self) -> Result<Vec<ItemRecord>, CollectError> {
        let source = self.host.source().await?;
        let mut items = {
            let doc = parse_document(&source);
            extract::extract_page(&doc.root_element())
        }
        .ok_or(CollectError::ContainerNotFound)?;

        sort_by_favorites(&mut items);
        let markup = self.host.main_markup().await?;
        let rendered = self.view.present(&items, markup, &self.config.origin);
        if let Err(e) = self.host.replace_main(&rendered).await {
            self.view.restore();
            return Err(e.into());
        }
        self.host.disarm_triggers().await;
        Ok(items)
    }

    /// Collects every page and presents them sorted.
    ///
    /// Refuses while the store holds a run in progress.
    pub async fn sort_all_pages(&mut self) -> Result<Outcome, CollectError> {
        if !self.is_enabled() {
            return Err(CollectError::Disabled);
        }
        match store::load_state(&self.store).await {
            Ok(Some(_)) => {
                let e = CollectError::AlreadyCollecting;
                self.host.notify(&Notice::error(e.to_string())).await;
                return Err(e);
            }
            Ok(None) => {}
            Err(e) => ::log::warn!("Could not check for a run in progress: {}", e),
        }

        let mut collector = Collector::new(
            &self.store,
            &self.host,
            &self.config,
            self.enabled_tx.subscribe(),
        );
        Ok(collector.start(&mut self.view).await)
    }

    /// Puts the original page back after a results view.
    ///
    /// Returns `false` when no results view was shown.
    pub async fn restore(&mut self) -> Result<bool, CollectError> {
        let Some(markup) = self.view.restore() else {
            return Ok(false);
        };
        self.host.replace_main(&markup).await?;
        if self.is_enabled() {
            self.host.arm_triggers().await;
        }
        Ok(true)
    }

    /// Dispatches an action requested from the page
    pub async fn handle(&mut self, request: Request) -> Result<Handled, CollectError> {
        match request {
            Request::SortCurrent => self.sort_current_page().await.map(Handled::Sorted),
            Request::SortAll => self.sort_all_pages().await.map(Handled::Collected),
            Request::Restore => self.restore().await.map(Handled::Restored),
        }
    }

    /// One watch tick: follows changes to the stored enable flag, puts the
    /// page controls back after a reload, and runs any action requested from
    /// the page. Re-enabling resumes a run left in the store.
    pub async fn poll(&mut self) -> Option<Result<Handled, CollectError>> {
        if let Some(outcome) = self.follow_stored_flag().await {
            return Some(Ok(Handled::Collected(outcome)));
        }
        if !self.is_enabled() {
            return None;
        }

        self.keep_controls().await;

        let request = self.host.take_request().await?;
        ::log::debug!("Page requested {:?}", request);
        Some(self.handle(request).await)
    }

    async fn follow_stored_flag(&mut self) -> Option<Outcome> {
        let enabled = match store::load_enabled(&self.store).await {
            Ok(enabled) => enabled,
            Err(e) => {
                ::log::debug!("Could not read enable flag: {}", e);
                return None;
            }
        };
        if self.stored_enabled == Some(enabled) {
            return None;
        }

        self.stored_enabled = Some(enabled);
        ::log::info!("Sorting {}", if enabled { "enabled" } else { "disabled" });
        self.apply_control(ControlMessage { enabled }).await;
        if enabled {
            self.resume_stored().await
        } else {
            None
        }
    }

    async fn keep_controls(&mut self) {
        if self.view.is_presenting() {
            if !self.host.has_element(RESTORE_ID).await {
                ::log::info!("Results view is gone, the page was reloaded");
                self.view.restore();
                self.host.arm_triggers().await;
            }
        } else if !self.host.has_element(TRIGGERS_ID).await {
            ::log::debug!("Sort controls missing, adding them again");
            self.host.arm_triggers().await;
        }
    }
}
