/// Background coordinator: seeds visited links and serves history requests

use crate::Phase;
use crate::history::{Clock, HistoryLog, HistoryService, TimeRange};
use crate::messages::{HistoryResponse, PageCommand, RuntimeRequest, TabId, TabMessenger, TabUpdate};
use crate::storage::{SettingsKey, SettingsStore, StoredSettings};
use std::cell::Cell;

/// The background context's state holder.
///
/// Every handler completes: failures are logged and the last good state in
/// the store is left alone.
pub struct Coordinator<H, S, T, C> {
    history: HistoryService<H>,
    store: S,
    tabs: T,
    clock: C,
    phase: Cell<Phase>,
}

impl<H, S, T, C> Coordinator<H, S, T, C>
where
    H: HistoryLog,
    S: SettingsStore,
    T: TabMessenger,
    C: Clock,
{
    pub fn new(history: H, store: S, tabs: T, clock: C) -> Self {
        Coordinator {
            history: HistoryService::new(history),
            store,
            tabs,
            clock,
            phase: Cell::new(Phase::Uninitialized),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// First install: store every visited page up to now
    pub async fn on_installed(&self) -> Option<usize> {
        let range = TimeRange::all_until(self.clock.now_ms());
        self.seed(range, "install").await
    }

    /// Browser startup: store visited pages within the saved date range
    pub async fn on_startup(&self) -> Option<usize> {
        let saved = match self.store.get(&SettingsKey::DATE_RANGE).await {
            Ok(saved) => saved.resolve(),
            Err(e) => {
                log::warn!("Startup: could not read saved dates: {}", e);
                StoredSettings::default().resolve()
            }
        };

        let range = TimeRange::from_saved(
            saved.start.as_deref(),
            saved.end.as_deref(),
            self.clock.now_ms(),
        );
        self.seed(range, "startup").await
    }

    async fn seed(&self, range: TimeRange, trigger: &str) -> Option<usize> {
        let outcome = match self.history.visited_between(range).await {
            Ok(visited) => {
                let patch = StoredSettings {
                    visited_urls: Some(visited.to_vec()),
                    ..StoredSettings::default()
                };

                match self.store.set(&patch).await {
                    Ok(()) => {
                        log::info!("{}: stored {} visited links", trigger, visited.len());
                        Some(visited.len())
                    }
                    Err(e) => {
                        log::warn!("{}: could not store visited links: {}", trigger, e);
                        None
                    }
                }
            }
            Err(e) => {
                log::warn!("{}: history unavailable, keeping stored links: {}", trigger, e);
                None
            }
        };

        self.phase.set(Phase::Ready);
        outcome
    }

    /// Answer a one-shot request. Never writes the store.
    pub async fn handle_request(&self, request: RuntimeRequest) -> HistoryResponse {
        match request {
            RuntimeRequest::GetHistory { start_time, end_time, request_id } => {
                let range = TimeRange::new(
                    start_time.unwrap_or(0.0),
                    end_time.unwrap_or_else(|| self.clock.now_ms()),
                );

                match self.history.visited_between(range).await {
                    Ok(visited) => {
                        log::debug!("GET_HISTORY {:?}: {} links", request_id, visited.len());
                        HistoryResponse::found(visited.to_vec(), request_id)
                    }
                    Err(e) => {
                        log::warn!("GET_HISTORY {:?} failed: {}", request_id, e);
                        HistoryResponse::failed(&e, request_id)
                    }
                }
            }
        }
    }

    /// Ask a freshly loaded page to re-evaluate. Returns whether a command went out.
    pub async fn on_tab_updated(&self, tab: TabId, update: &TabUpdate) -> bool {
        if !update.is_load_complete() {
            return false;
        }

        match self.tabs.send_command(tab, &PageCommand::UpdateHighlight {}).await {
            Ok(()) => true,
            Err(e) => {
                // Pages without the content script (chrome://, the web store) refuse.
                log::debug!("Tab {} did not take UPDATE_HIGHLIGHT: {}", tab, e);
                false
            }
        }
    }
}
