/// Chrome implementations of the collaborator traits

use crate::error::PlatformError;
use crate::history::{Clock, HistoryLog, HistoryQuery, VisitRecord};
use crate::messages::{BackgroundLink, HistoryResponse, PageCommand, RuntimeRequest, TabId, TabMessenger, TabUpdate};
use crate::storage::{SettingsKey, SettingsStore, StorageChanges, StoredSettings};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(items: JsValue) -> Result<(), JsValue>;

    fn onStorageChanged(listener: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn historySearch(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn activeTabId() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendToTab(tab_id: i32, message: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    fn onInstalled(listener: &js_sys::Function);

    fn onStartup(listener: &js_sys::Function);

    fn onTabUpdated(listener: &js_sys::Function);

    fn onRuntimeMessage(handler: &js_sys::Function);
}

/// Serialize into a plain JS object (no `Map`s, `null` for unit)
pub fn to_js<T: Serialize>(value: &T, what: &'static str) -> Result<JsValue, PlatformError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| PlatformError::Encode {
            what,
            detail: e.to_string(),
        })
}

pub fn from_js<T: DeserializeOwned>(value: JsValue, what: &'static str) -> Result<T, PlatformError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| PlatformError::Decode {
        what,
        detail: e.to_string(),
    })
}

fn describe(error: JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

/// chrome.storage.local
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStore;

impl SettingsStore for ChromeStore {
    async fn get(&self, keys: &[SettingsKey]) -> Result<StoredSettings, PlatformError> {
        let names: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
        let items = storageGet(to_js(&names, "storage keys")?)
            .await
            .map_err(|e| PlatformError::Storage(describe(e)))?;
        from_js(items, "stored settings")
    }

    async fn set(&self, patch: &StoredSettings) -> Result<(), PlatformError> {
        storageSet(to_js(patch, "settings patch")?)
            .await
            .map_err(|e| PlatformError::Storage(describe(e)))
    }

    fn subscribe(&self, listener: Box<dyn Fn(&StorageChanges)>) {
        let callback = Closure::wrap(Box::new(move |changes: JsValue| {
            match from_js::<StorageChanges>(changes, "storage changes") {
                Ok(changes) => listener(&changes),
                Err(e) => log::warn!("{}", e),
            }
        }) as Box<dyn Fn(JsValue)>);

        onStorageChanged(callback.as_ref().unchecked_ref());
        callback.forget();
    }
}

/// chrome.history
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeHistory;

impl HistoryLog for ChromeHistory {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>, PlatformError> {
        let results = historySearch(to_js(query, "history query")?)
            .await
            .map_err(|e| PlatformError::History(describe(e)))?;
        from_js(results, "history results")
    }
}

/// chrome.tabs
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl TabMessenger for ChromeTabs {
    async fn active_tab(&self) -> Result<Option<TabId>, PlatformError> {
        let id = activeTabId()
            .await
            .map_err(|e| PlatformError::Messaging(describe(e)))?;
        Ok(id.as_f64().map(|id| id as TabId))
    }

    async fn send_command(&self, tab: TabId, command: &PageCommand) -> Result<(), PlatformError> {
        sendToTab(tab, to_js(command, "page command")?)
            .await
            .map_err(|e| PlatformError::Messaging(describe(e)))
    }
}

/// chrome.runtime messaging from the popup to the background
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeRuntime;

impl BackgroundLink for ChromeRuntime {
    async fn request(&self, request: &RuntimeRequest) -> Result<Option<HistoryResponse>, PlatformError> {
        let reply = sendRuntimeMessage(to_js(request, "runtime request")?)
            .await
            .map_err(|e| PlatformError::Messaging(describe(e)))?;

        if reply.is_undefined() || reply.is_null() {
            return Ok(None);
        }
        from_js(reply, "history response").map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

pub fn on_installed(handler: impl FnMut() + 'static) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    onInstalled(callback.as_ref().unchecked_ref());
    callback.forget();
}

pub fn on_startup(handler: impl FnMut() + 'static) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    onStartup(callback.as_ref().unchecked_ref());
    callback.forget();
}

pub fn on_tab_updated(mut handler: impl FnMut(TabId, TabUpdate) + 'static) {
    let callback = Closure::wrap(Box::new(move |tab_id: i32, update: JsValue| {
        match from_js::<TabUpdate>(update, "tab update") {
            Ok(update) => handler(tab_id, update),
            Err(e) => log::warn!("{}", e),
        }
    }) as Box<dyn FnMut(i32, JsValue)>);

    onTabUpdated(callback.as_ref().unchecked_ref());
    callback.forget();
}

/// Listen for runtime messages. Return a promise to answer, `None` to stay silent.
pub fn on_runtime_message(mut handler: impl FnMut(JsValue) -> Option<js_sys::Promise> + 'static) {
    let callback = Closure::wrap(Box::new(move |message: JsValue| -> JsValue {
        handler(message).map(JsValue::from).unwrap_or(JsValue::UNDEFINED)
    }) as Box<dyn FnMut(JsValue) -> JsValue>);

    onRuntimeMessage(callback.as_ref().unchecked_ref());
    callback.forget();
}
