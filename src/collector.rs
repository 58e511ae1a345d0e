//! The multi-page collection state machine.
//!
//! One [`Collector`] drives a run: extract the current page, persist, find
//! the next page, activate it, settle, repeat. The persisted record is
//! written before every navigation, since navigation may tear down the
//! process driving the run.

use crate::config::{CollectorConfig, SettlePolicy};
use crate::dom::parse_document;
use crate::error::CollectError;
use crate::estimate;
use crate::extract;
use crate::host::{HostPage, Notice};
use crate::pagination::{self, Activator};
use crate::present::{ResultView, sort_by_favorites};
use crate::results::{CollectionState, ItemRecord};
use crate::store::{self, Store};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};

/// Lifecycle of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Completed,
    Failed,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All pages collected; items sorted and presented
    Completed(Vec<ItemRecord>),
    /// Stopped because the system was disabled; the stored run is untouched
    Suspended(CollectionState),
    /// Halted on an error; the stored run was reset
    Failed(String),
}

/// Result of one cycle
enum Step {
    Advanced,
    Exhausted,
}

/// Waits for a freshly navigated page according to the settle policy
pub async fn settle<H: HostPage>(host: &H, policy: SettlePolicy) {
    match policy {
        SettlePolicy::Fixed { delay_ms } => sleep(Duration::from_millis(delay_ms)).await,
        SettlePolicy::PollUntilStable {
            interval_ms,
            max_wait_ms,
        } => {
            let deadline = Instant::now() + Duration::from_millis(max_wait_ms);
            let mut last: Option<String> = None;
            loop {
                sleep(Duration::from_millis(interval_ms)).await;
                let current = host.source().await.ok();
                if current.is_some() && current == last {
                    ::log::debug!("Page settled");
                    return;
                }
                if Instant::now() >= deadline {
                    ::log::warn!("Page still changing after {} ms, continuing", max_wait_ms);
                    return;
                }
                last = current;
            }
        }
    }
}

/// Drives one collection run against a host page and a durable store
pub struct Collector<'a, S: Store, H: HostPage> {
    store: &'a S,
    host: &'a H,
    config: &'a CollectorConfig,
    enabled: watch::Receiver<bool>,
    phase: Phase,
    degraded: bool,
}

impl<'a, S: Store, H: HostPage> Collector<'a, S, H> {
    pub fn new(
        store: &'a S,
        host: &'a H,
        config: &'a CollectorConfig,
        enabled: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            host,
            config,
            enabled,
            phase: Phase::Idle,
            degraded: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Starts a fresh run on the current page
    pub async fn start(&mut self, view: &mut ResultView) -> Outcome {
        let total = match self.host.source().await {
            Ok(source) => {
                let doc = parse_document(&source);
                estimate::estimate(
                    &doc.root_element(),
                    self.config.page_size,
                    self.config.default_page_guess,
                )
            }
            Err(e) => return self.fail(e.into()).await,
        };

        ::log::info!("Starting collection, about {} pages", total);
        let state = CollectionState::started(total);
        self.persist(&state).await;
        self.run(state, view).await
    }

    /// Continues a run restored from the store.
    ///
    /// With a `resume_url` the next page was reached before the process
    /// stopped. Without one, the run stopped between collecting a page and
    /// reaching its successor, so the collector returns to `last_url` and
    /// steps forward before collecting anything.
    pub async fn resume(&mut self, mut state: CollectionState, view: &mut ResultView) -> Outcome {
        ::log::info!(
            "Resuming collection at page {} with {} items",
            state.current_page,
            state.items.len()
        );

        match (state.resume_url.clone(), state.last_url.clone()) {
            (Some(url), _) => {
                if let Err(e) = self.goto(&url).await {
                    return self.fail(e).await;
                }
            }
            (None, Some(url)) => {
                ::log::info!(
                    "Page {} was not reached, stepping forward from {}",
                    state.current_page,
                    url
                );
                if let Err(e) = self.goto(&url).await {
                    return self.fail(e).await;
                }
                sleep(self.config.resume_delay()).await;
                return match self.catch_up(&mut state).await {
                    Ok(Step::Advanced) => self.run(state, view).await,
                    Ok(Step::Exhausted) => self.complete(state, view).await,
                    Err(e) => self.fail(e).await,
                };
            }
            (None, None) => {
                ::log::warn!("No resume URL stored, continuing on the current page");
            }
        }

        sleep(self.config.resume_delay()).await;
        self.run(state, view).await
    }

    /// Opens a URL unless the browser is already there
    async fn goto(&self, url: &str) -> Result<(), CollectError> {
        let here = self.host.current_url().await.ok();
        if here.as_deref() != Some(url) {
            self.host.open(url).await?;
        }
        Ok(())
    }

    /// Moves from an already collected page to the next one without
    /// extracting it again
    async fn catch_up(&mut self, state: &mut CollectionState) -> Result<Step, CollectError> {
        let source = self.host.source().await?;
        let next = {
            let doc = parse_document(&source);
            pagination::find_next(&doc.root_element())
        };

        match self.next_control(next, state.current_page.saturating_sub(1)) {
            Some(activator) => {
                self.advance(&activator, state).await?;
                Ok(Step::Advanced)
            }
            None => Ok(Step::Exhausted),
        }
    }

    async fn run(&mut self, mut state: CollectionState, view: &mut ResultView) -> Outcome {
        self.phase = Phase::Collecting;
        loop {
            match self.step(&mut state).await {
                Ok(Step::Advanced) => {
                    if !*self.enabled.borrow() {
                        ::log::info!(
                            "Disabled, leaving run at page {} for later",
                            state.current_page
                        );
                        self.phase = Phase::Idle;
                        return Outcome::Suspended(state);
                    }
                }
                Ok(Step::Exhausted) => return self.complete(state, view).await,
                Err(e) => return self.fail(e).await,
            }
        }
    }

    /// One cycle: extract, persist, advance
    async fn step(&mut self, state: &mut CollectionState) -> Result<Step, CollectError> {
        let page = state.current_page;
        self.host.progress(page, state.total_pages_estimate).await;

        let here = self.host.current_url().await.ok();
        let source = self.host.source().await?;
        let (extracted, next) = {
            let doc = parse_document(&source);
            let root = doc.root_element();
            (extract::extract_page(&root), pagination::find_next(&root))
        };

        match extracted {
            Some(items) => {
                ::log::info!("Page {}: {} items", page, items.len());
                state.items.extend(items);
            }
            None => {
                self.host
                    .notify(&Notice::error(format!(
                        "Results container not found on page {}",
                        page
                    )))
                    .await;
            }
        }

        // Written before navigating: enough to resume from `last_url` alone
        state.current_page = page + 1;
        state.resume_url = None;
        state.last_url = here;
        self.persist(state).await;

        let total = match state.total_pages_estimate {
            0 => "?".to_string(),
            n => n.to_string(),
        };
        self.host
            .notify(&Notice::info(format!(
                "Collected {} items (Page {}/{})...",
                state.items.len(),
                page,
                total
            )))
            .await;

        let Some(activator) = self.next_control(next, page) else {
            return Ok(Step::Exhausted);
        };

        self.advance(&activator, state).await?;
        Ok(Step::Advanced)
    }

    /// The control to follow after `page`, unless traversal ends there
    fn next_control(&self, next: Option<Activator>, page: u32) -> Option<Activator> {
        let Some(activator) = next else {
            ::log::info!("No next page after page {}", page);
            return None;
        };
        if page >= self.config.max_pages {
            ::log::warn!("Reached the {} page ceiling", self.config.max_pages);
            return None;
        }
        Some(activator)
    }

    async fn advance(
        &mut self,
        activator: &Activator,
        state: &mut CollectionState,
    ) -> Result<(), CollectError> {
        self.host.activate(activator).await?;
        settle(self.host, self.config.settle).await;

        state.resume_url = self.host.current_url().await.ok();
        self.persist(state).await;
        Ok(())
    }

    async fn complete(&mut self, mut state: CollectionState, view: &mut ResultView) -> Outcome {
        self.clear_stored_run().await;

        sort_by_favorites(&mut state.items);
        let markup = match self.host.main_markup().await {
            Ok(markup) => markup,
            Err(e) => return self.fail(e.into()).await,
        };
        let rendered = view.present(&state.items, markup, &self.config.origin);
        if let Err(e) = self.host.replace_main(&rendered).await {
            view.restore();
            return self.fail(e.into()).await;
        }

        self.host.disarm_triggers().await;
        self.host.clear_progress().await;
        self.host.notify(&Notice::info("Sorting completed!")).await;

        ::log::info!("Collection complete with {} items", state.items.len());
        self.phase = Phase::Completed;
        Outcome::Completed(state.items)
    }

    async fn fail(&mut self, error: CollectError) -> Outcome {
        ::log::error!("Collection failed: {}", error);
        self.phase = Phase::Failed;
        self.clear_stored_run().await;
        self.host.clear_progress().await;

        let message = error.to_string();
        self.host
            .notify(&Notice::error(format!("Error collecting pages: {}", message)))
            .await;
        Outcome::Failed(message)
    }

    /// Writes the run record, degrading to a non-resumable run on failure
    async fn persist(&mut self, state: &CollectionState) {
        if let Err(e) = store::save_state(self.store, state).await {
            ::log::warn!("Could not save collection state: {}", e);
            if !self.degraded {
                self.degraded = true;
                self.host
                    .notify(&Notice::error(
                        "Progress cannot be saved; collection will not survive a restart",
                    ))
                    .await;
            }
        }
    }

    async fn clear_stored_run(&mut self) {
        if let Err(e) = store::reset_state(self.store).await {
            ::log::error!("Error clearing state: {}", e);
        }
    }
}
