/// Visited Highlighter - Chrome Extension that marks links you have already visited
/// Built with Rust + WASM + Yew

pub mod background;
pub mod bridge;
pub mod dom;
pub mod domain;
pub mod error;
pub mod highlighter;
pub mod history;
pub mod messages;
pub mod storage;
pub mod surface;
pub mod ui;
pub mod url_identity;

#[cfg(test)]
mod testing;

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::background::Coordinator;
use crate::bridge::{ChromeHistory, ChromeStore, ChromeTabs, SystemClock};
use crate::highlighter::PageHighlighter;
use crate::messages::{PageCommand, RuntimeRequest};
use crate::storage::{SettingsKey, SettingsStore, StoredSettings};

/// Lifecycle of a per-context state holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export URL normalization for the JavaScript loaders
#[wasm_bindgen]
pub fn normalize_url(url: &str) -> String {
    url_identity::normalize(url)
}

// Background service worker: seeds the store and answers history requests
#[wasm_bindgen]
pub fn start_background() {
    let coordinator = Rc::new(Coordinator::new(
        ChromeHistory,
        ChromeStore,
        ChromeTabs,
        SystemClock,
    ));

    {
        let coordinator = coordinator.clone();
        bridge::on_installed(move || {
            let coordinator = coordinator.clone();
            spawn_local(async move {
                coordinator.on_installed().await;
            });
        });
    }

    {
        let coordinator = coordinator.clone();
        bridge::on_startup(move || {
            let coordinator = coordinator.clone();
            spawn_local(async move {
                coordinator.on_startup().await;
            });
        });
    }

    {
        let coordinator = coordinator.clone();
        bridge::on_tab_updated(move |tab_id, update| {
            let coordinator = coordinator.clone();
            spawn_local(async move {
                coordinator.on_tab_updated(tab_id, &update).await;
            });
        });
    }

    bridge::on_runtime_message(move |message| {
        let request: RuntimeRequest = bridge::from_js(message, "runtime request").ok()?;
        let coordinator = coordinator.clone();

        Some(future_to_promise(async move {
            let response = coordinator.handle_request(request).await;
            bridge::to_js(&response, "history response").map_err(|e| JsValue::from_str(&e.to_string()))
        }))
    });

    log::info!("Background coordinator listening");
}

// Content script: mirrors settings and paints the current page
#[wasm_bindgen]
pub fn start_highlighter() {
    let Some(page) = dom::DomLinks::current() else {
        log::warn!("No document to highlight");
        return;
    };

    let highlighter = Rc::new(RefCell::new(PageHighlighter::new(page)));
    let store = ChromeStore;

    {
        let highlighter = highlighter.clone();
        store.subscribe(Box::new(move |changes| {
            highlighter.borrow_mut().apply_store_changes(changes);
        }));
    }

    {
        let highlighter = highlighter.clone();
        bridge::on_runtime_message(move |message| {
            match bridge::from_js::<PageCommand>(message, "page command") {
                Ok(command) => {
                    highlighter.borrow_mut().handle_command(command);
                }
                Err(e) => log::debug!("Ignoring message: {}", e),
            }
            None
        });
    }

    spawn_local(async move {
        let stored = match store.get(&SettingsKey::MIRRORED).await {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Could not read settings, using defaults: {}", e);
                StoredSettings::default()
            }
        };
        let painted = highlighter.borrow_mut().finish_loading(stored);
        log::debug!("Initial pass painted {} links", painted);
    });
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::Popup>::new().render();
}
