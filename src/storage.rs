/// Settings schema for chrome.storage.local and the store contract

use crate::error::PlatformError;
use crate::url_identity::VisitedSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Color used until the user picks one
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffff99";

/// Keys of the durable settings record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    HighlightEnabled,
    HighlightColor,
    DomainFilter,
    Start,
    End,
    VisitedUrls,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 6] = [
        SettingsKey::HighlightEnabled,
        SettingsKey::HighlightColor,
        SettingsKey::DomainFilter,
        SettingsKey::Start,
        SettingsKey::End,
        SettingsKey::VisitedUrls,
    ];

    /// What a page agent keeps a local copy of
    pub const MIRRORED: [SettingsKey; 4] = [
        SettingsKey::HighlightEnabled,
        SettingsKey::VisitedUrls,
        SettingsKey::DomainFilter,
        SettingsKey::HighlightColor,
    ];

    /// What the popup form edits
    pub const FORM: [SettingsKey; 5] = [
        SettingsKey::HighlightEnabled,
        SettingsKey::HighlightColor,
        SettingsKey::Start,
        SettingsKey::End,
        SettingsKey::DomainFilter,
    ];

    pub const DATE_RANGE: [SettingsKey; 2] = [SettingsKey::Start, SettingsKey::End];

    pub const fn as_str(self) -> &'static str {
        match self {
            SettingsKey::HighlightEnabled => "highlightEnabled",
            SettingsKey::HighlightColor => "highlightColor",
            SettingsKey::DomainFilter => "domainFilter",
            SettingsKey::Start => "start",
            SettingsKey::End => "end",
            SettingsKey::VisitedUrls => "visitedUrls",
        }
    }
}

/// The settings record as stored. Absent keys stay `None`.
///
/// Doubles as a merge-write patch: only the `Some` fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visited_urls: Option<Vec<String>>,
}

impl StoredSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that carry a value in this record
    pub fn keys(&self) -> Vec<SettingsKey> {
        let present = [
            self.highlight_enabled.is_some(),
            self.highlight_color.is_some(),
            self.domain_filter.is_some(),
            self.start.is_some(),
            self.end.is_some(),
            self.visited_urls.is_some(),
        ];

        SettingsKey::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(key, is_set)| is_set.then_some(key))
            .collect()
    }

    /// Keep only the listed keys
    pub fn restrict(mut self, keys: &[SettingsKey]) -> Self {
        if !keys.contains(&SettingsKey::HighlightEnabled) {
            self.highlight_enabled = None;
        }
        if !keys.contains(&SettingsKey::HighlightColor) {
            self.highlight_color = None;
        }
        if !keys.contains(&SettingsKey::DomainFilter) {
            self.domain_filter = None;
        }
        if !keys.contains(&SettingsKey::Start) {
            self.start = None;
        }
        if !keys.contains(&SettingsKey::End) {
            self.end = None;
        }
        if !keys.contains(&SettingsKey::VisitedUrls) {
            self.visited_urls = None;
        }
        self
    }

    /// Fill in defaults for everything absent
    pub fn resolve(&self) -> HighlightSettings {
        HighlightSettings {
            enabled: self.highlight_enabled.unwrap_or(false),
            color: self
                .highlight_color
                .clone()
                .unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string()),
            domain_filter: self.domain_filter.clone().unwrap_or_default(),
            start: self.start.clone().filter(|s| !s.is_empty()),
            end: self.end.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn visited_set(&self) -> VisitedSet {
        self.visited_urls
            .as_deref()
            .map(VisitedSet::from_urls)
            .unwrap_or_default()
    }
}

/// The user-facing part of the record with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSettings {
    pub enabled: bool,
    pub color: String,
    pub domain_filter: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        StoredSettings::default().resolve()
    }
}

/// Old and new value of one key in a change notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// One change notification: `{key: {oldValue, newValue}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageChanges(HashMap<String, ValueChange>);

impl StorageChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, change: ValueChange) {
        self.0.insert(key.into(), change);
    }

    pub fn contains(&self, key: SettingsKey) -> bool {
        self.0.contains_key(key.as_str())
    }

    /// `None` if the key did not change. `Some(None)` if it changed to
    /// nothing or to a value of the wrong type.
    pub fn new_value<T: DeserializeOwned>(&self, key: SettingsKey) -> Option<Option<T>> {
        self.0.get(key.as_str()).map(|change| {
            change
                .new_value
                .clone()
                .and_then(|value| serde_json::from_value(value).ok())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Durable key-value store with change notifications.
///
/// Writes from any context must eventually reach every subscriber, in
/// write order per key.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// Read the listed keys; missing keys come back as `None`
    async fn get(&self, keys: &[SettingsKey]) -> Result<StoredSettings, PlatformError>;

    /// Merge-write the `Some` fields of `patch`
    async fn set(&self, patch: &StoredSettings) -> Result<(), PlatformError>;

    fn subscribe(&self, listener: Box<dyn Fn(&StorageChanges)>);
}
