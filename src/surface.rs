/// Settings popup logic: form state, validation and the publish protocol

use crate::error::FilterError;
use crate::history::{Clock, TimeRange, parse_local_datetime};
use crate::messages::{BackgroundLink, PageCommand, RuntimeRequest, TabMessenger};
use crate::storage::{SettingsKey, SettingsStore, StoredSettings};
use crate::url_identity::VisitedSet;
use std::fmt;

/// What the popup form is editing
#[derive(Debug, Clone, PartialEq)]
pub struct FilterForm {
    pub enabled: bool,
    pub color: String,
    pub domain_filter: String,
    pub start: String,
    pub end: String,
}

impl FilterForm {
    pub fn from_stored(stored: &StoredSettings) -> FilterForm {
        let settings = stored.resolve();
        FilterForm {
            enabled: settings.enabled,
            color: settings.color,
            domain_filter: settings.domain_filter,
            start: settings.start.unwrap_or_default(),
            end: settings.end.unwrap_or_default(),
        }
    }

    pub fn has_saved_filters(&self) -> bool {
        !self.start.is_empty() || !self.end.is_empty() || !self.domain_filter.is_empty()
    }

    /// Validate the date fields. Empty start is the epoch, empty end is now.
    pub fn time_range(&self, now_ms: f64) -> Result<TimeRange, FilterError> {
        let start_ms = if self.start.is_empty() {
            0.0
        } else {
            parse_local_datetime(&self.start).ok_or(FilterError::InvalidStart)?
        };

        let end_ms = if self.end.is_empty() {
            now_ms
        } else {
            parse_local_datetime(&self.end).ok_or(FilterError::InvalidEnd)?
        };

        if start_ms > end_ms {
            return Err(FilterError::StartAfterEnd);
        }

        Ok(TimeRange::new(start_ms, end_ms))
    }
}

impl Default for FilterForm {
    fn default() -> Self {
        FilterForm::from_stored(&StoredSettings::default())
    }
}

/// The popup's status line
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Fetching,
    Found(usize),
    Failed(FilterError),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Fetching => write!(f, "Fetching history..."),
            Status::Found(count) => write!(f, "Found: {} links", count),
            Status::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl From<Result<usize, FilterError>> for Status {
    fn from(result: Result<usize, FilterError>) -> Self {
        match result {
            Ok(count) => Status::Found(count),
            Err(e) => Status::Failed(e),
        }
    }
}

/// Originates every user-driven change.
///
/// Each change goes out twice: to the store (durable, reaches every page)
/// and straight to the active tab (immediate). The store write goes first.
pub struct SettingsSurface<S, B, T, C> {
    store: S,
    background: B,
    tabs: T,
    clock: C,
}

impl<S, B, T, C> SettingsSurface<S, B, T, C>
where
    S: SettingsStore,
    B: BackgroundLink,
    T: TabMessenger,
    C: Clock,
{
    pub fn new(store: S, background: B, tabs: T, clock: C) -> Self {
        SettingsSurface {
            store,
            background,
            tabs,
            clock,
        }
    }

    /// Read the saved form. Falls back to defaults if the store is unreadable.
    pub async fn load(&self) -> FilterForm {
        match self.store.get(&SettingsKey::FORM).await {
            Ok(stored) => FilterForm::from_stored(&stored),
            Err(e) => {
                log::warn!("Could not load settings: {}", e);
                FilterForm::default()
            }
        }
    }

    /// Re-run the saved filter when the popup opens, or fetch everything if
    /// nothing is saved
    pub async fn refresh_on_open(&self, form: &FilterForm) -> Result<usize, FilterError> {
        if form.has_saved_filters() {
            self.apply_filter(form).await
        } else {
            self.apply_all_history(form).await
        }
    }

    /// The enable command carries the saved color, never the form's, so a
    /// toggle before the form has loaded cannot repaint with a default.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), FilterError> {
        let patch = StoredSettings {
            highlight_enabled: Some(enabled),
            ..StoredSettings::default()
        };
        self.store.set(&patch).await.map_err(FilterError::SaveFailed)?;

        let command = if enabled {
            PageCommand::EnableHighlight { color: self.saved_color().await }
        } else {
            PageCommand::DisableHighlight {}
        };
        self.notify_active_tab(&command).await;
        Ok(())
    }

    async fn saved_color(&self) -> Option<String> {
        match self.store.get(&[SettingsKey::HighlightColor]).await {
            Ok(stored) => stored.highlight_color,
            Err(e) => {
                log::debug!("Could not read saved color: {}", e);
                None
            }
        }
    }

    pub async fn set_color(&self, color: &str) -> Result<(), FilterError> {
        let patch = StoredSettings {
            highlight_color: Some(color.to_string()),
            ..StoredSettings::default()
        };
        self.store.set(&patch).await.map_err(FilterError::SaveFailed)?;

        self.notify_active_tab(&PageCommand::UpdateHighlightColor { color: Some(color.to_string()) })
            .await;
        Ok(())
    }

    /// Validate the dates, fetch the matching history and publish it
    pub async fn apply_filter(&self, form: &FilterForm) -> Result<usize, FilterError> {
        let range = form.time_range(self.clock.now_ms())?;
        self.fetch_and_publish(range, &form.start, &form.end, form).await
    }

    /// Fetch all history and clear the saved dates
    pub async fn apply_all_history(&self, form: &FilterForm) -> Result<usize, FilterError> {
        let range = TimeRange::all_until(self.clock.now_ms());
        self.fetch_and_publish(range, "", "", form).await
    }

    async fn fetch_and_publish(
        &self,
        range: TimeRange,
        start: &str,
        end: &str,
        form: &FilterForm,
    ) -> Result<usize, FilterError> {
        let request = RuntimeRequest::get_history(range.start_ms, range.end_ms);

        let urls = match self.background.request(&request).await {
            Ok(Some(response)) => response.urls.ok_or_else(|| {
                log::warn!("History request failed: {}", response.error.unwrap_or_default());
                FilterError::FetchFailed
            })?,
            Ok(None) => {
                log::warn!("History request got no answer");
                return Err(FilterError::FetchFailed);
            }
            Err(e) => {
                log::warn!("History request failed: {}", e);
                return Err(FilterError::FetchFailed);
            }
        };

        let visited = VisitedSet::from_urls(urls).to_vec();
        let count = visited.len();

        let patch = StoredSettings {
            visited_urls: Some(visited.clone()),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            domain_filter: Some(form.domain_filter.clone()),
            highlight_color: Some(form.color.clone()),
            ..StoredSettings::default()
        };
        self.store.set(&patch).await.map_err(FilterError::SaveFailed)?;

        self.notify_active_tab(&PageCommand::UpdateVisitedUrls {
            urls: visited,
            color: Some(form.color.clone()),
        })
        .await;

        Ok(count)
    }

    /// Best effort: the active tab may have no page agent at all
    async fn notify_active_tab(&self, command: &PageCommand) {
        let tab = match self.tabs.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => return,
            Err(e) => {
                log::debug!("No active tab: {}", e);
                return;
            }
        };

        if let Err(e) = self.tabs.send_command(tab, command).await {
            log::debug!("Tab {} did not take the command: {}", tab, e);
        }
    }
}
