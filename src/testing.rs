/// In-memory stand-ins for the browser collaborators, shared by unit tests

use crate::background::Coordinator;
use crate::error::PlatformError;
use crate::highlighter::{LinkSurface, PageAnchor};
use crate::history::{Clock, HistoryLog, HistoryQuery, VisitRecord};
use crate::messages::{BackgroundLink, HistoryResponse, PageCommand, RuntimeRequest, TabId, TabMessenger};
use crate::storage::{SettingsKey, SettingsStore, StorageChanges, StoredSettings, ValueChange};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct MemoryStoreInner {
    values: RefCell<Map<String, Value>>,
    listeners: RefCell<Vec<Box<dyn Fn(&StorageChanges)>>>,
    writes: RefCell<Vec<StoredSettings>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

/// chrome.storage.local stand-in that notifies subscribers synchronously
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(initial: StoredSettings) -> Self {
        let store = Self::new();
        if let Value::Object(values) = serde_json::to_value(&initial).unwrap() {
            *store.inner.values.borrow_mut() = values;
        }
        store
    }

    pub fn snapshot(&self) -> StoredSettings {
        serde_json::from_value(Value::Object(self.inner.values.borrow().clone())).unwrap()
    }

    pub fn writes(&self) -> Vec<StoredSettings> {
        self.inner.writes.borrow().clone()
    }

    pub fn fail_reads(&self) {
        self.inner.fail_reads.set(true);
    }

    pub fn fail_writes(&self) {
        self.inner.fail_writes.set(true);
    }
}

impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[SettingsKey]) -> Result<StoredSettings, PlatformError> {
        if self.inner.fail_reads.get() {
            return Err(PlatformError::Storage("read refused".to_string()));
        }

        let values = self.inner.values.borrow();
        let selected: Map<String, Value> = keys
            .iter()
            .filter_map(|key| {
                values
                    .get(key.as_str())
                    .map(|value| (key.as_str().to_string(), value.clone()))
            })
            .collect();

        serde_json::from_value(Value::Object(selected)).map_err(|e| PlatformError::Decode {
            what: "stored settings",
            detail: e.to_string(),
        })
    }

    async fn set(&self, patch: &StoredSettings) -> Result<(), PlatformError> {
        if self.inner.fail_writes.get() {
            return Err(PlatformError::Storage("write refused".to_string()));
        }

        let written = match serde_json::to_value(patch) {
            Ok(Value::Object(written)) => written,
            _ => Map::new(),
        };

        let mut changes = StorageChanges::new();
        {
            let mut values = self.inner.values.borrow_mut();
            for (key, value) in written {
                let old_value = values.insert(key.clone(), value.clone());
                changes.insert(key, ValueChange { old_value, new_value: Some(value) });
            }
        }
        self.inner.writes.borrow_mut().push(patch.clone());

        for listener in self.inner.listeners.borrow().iter() {
            listener(&changes);
        }
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&StorageChanges)>) {
        self.inner.listeners.borrow_mut().push(listener);
    }
}

#[derive(Default)]
struct FakeHistoryInner {
    records: Vec<VisitRecord>,
    queries: RefCell<Vec<HistoryQuery>>,
    failure: RefCell<Option<String>>,
}

/// History log over a fixed list of visits, filtered by `[start, end)`
#[derive(Clone, Default)]
pub struct FakeHistory {
    inner: Rc<FakeHistoryInner>,
}

impl FakeHistory {
    pub fn new(records: Vec<VisitRecord>) -> Self {
        FakeHistory {
            inner: Rc::new(FakeHistoryInner {
                records,
                ..FakeHistoryInner::default()
            }),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.inner.failure.borrow_mut() = Some(message.to_string());
    }

    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.inner.queries.borrow().clone()
    }
}

impl HistoryLog for FakeHistory {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>, PlatformError> {
        self.inner.queries.borrow_mut().push(query.clone());

        if let Some(message) = self.inner.failure.borrow().clone() {
            return Err(PlatformError::History(message));
        }

        Ok(self
            .inner
            .records
            .iter()
            .filter(|record| {
                record
                    .last_visit_time
                    .map_or(true, |t| t >= query.start_time && t < query.end_time)
            })
            .take(query.max_results as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct FakeTabsInner {
    active: Cell<Option<TabId>>,
    sent: RefCell<Vec<(TabId, PageCommand)>>,
    fail_delivery: Cell<bool>,
}

/// Records every command instead of delivering it
#[derive(Clone, Default)]
pub struct FakeTabs {
    inner: Rc<FakeTabsInner>,
}

impl FakeTabs {
    pub fn with_active(tab: TabId) -> Self {
        let tabs = Self::default();
        tabs.inner.active.set(Some(tab));
        tabs
    }

    pub fn fail_delivery(&self) {
        self.inner.fail_delivery.set(true);
    }

    pub fn sent(&self) -> Vec<(TabId, PageCommand)> {
        self.inner.sent.borrow().clone()
    }
}

impl TabMessenger for FakeTabs {
    async fn active_tab(&self) -> Result<Option<TabId>, PlatformError> {
        Ok(self.inner.active.get())
    }

    async fn send_command(&self, tab: TabId, command: &PageCommand) -> Result<(), PlatformError> {
        if self.inner.fail_delivery.get() {
            return Err(PlatformError::Messaging("no receiving end".to_string()));
        }
        self.inner.sent.borrow_mut().push((tab, command.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_ms(&self) -> f64 {
        self.0
    }
}

struct StubBackgroundInner {
    reply: Result<Option<HistoryResponse>, PlatformError>,
    requests: RefCell<Vec<RuntimeRequest>>,
}

/// Background link with a canned reply
#[derive(Clone)]
pub struct StubBackground {
    inner: Rc<StubBackgroundInner>,
}

impl StubBackground {
    pub fn replying(reply: Result<Option<HistoryResponse>, PlatformError>) -> Self {
        StubBackground {
            inner: Rc::new(StubBackgroundInner {
                reply,
                requests: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn with_urls(urls: &[&str]) -> Self {
        let urls = urls.iter().map(|url| url.to_string()).collect();
        Self::replying(Ok(Some(HistoryResponse::found(urls, None))))
    }

    pub fn requests(&self) -> Vec<RuntimeRequest> {
        self.inner.requests.borrow().clone()
    }
}

impl BackgroundLink for StubBackground {
    async fn request(&self, request: &RuntimeRequest) -> Result<Option<HistoryResponse>, PlatformError> {
        self.inner.requests.borrow_mut().push(request.clone());
        self.inner.reply.clone()
    }
}

/// Routes popup requests to a coordinator through the JSON wire format
pub struct LocalBackground<H, S, T, C> {
    pub coordinator: Rc<Coordinator<H, S, T, C>>,
}

impl<H, S, T, C> BackgroundLink for LocalBackground<H, S, T, C>
where
    H: HistoryLog,
    S: SettingsStore,
    T: TabMessenger,
    C: Clock,
{
    async fn request(&self, request: &RuntimeRequest) -> Result<Option<HistoryResponse>, PlatformError> {
        let wire = serde_json::to_value(request).unwrap();
        let decoded: RuntimeRequest = serde_json::from_value(wire).unwrap();

        let response = self.coordinator.handle_request(decoded).await;

        let wire = serde_json::to_value(&response).unwrap();
        Ok(Some(serde_json::from_value(wire).unwrap()))
    }
}

pub struct FakeAnchorInner {
    href: Option<String>,
    resolved: Option<String>,
    painted: RefCell<Option<String>>,
}

pub type FakeAnchor = Rc<FakeAnchorInner>;

impl PageAnchor for FakeAnchor {
    fn href_attribute(&self) -> Option<String> {
        self.href.clone()
    }

    fn resolved_href(&self) -> Option<String> {
        self.resolved.clone()
    }

    fn paint(&self, color: &str) {
        *self.painted.borrow_mut() = Some(color.to_string());
    }
}

#[derive(Default)]
struct FakePageInner {
    hostname: RefCell<String>,
    anchors: RefCell<Vec<FakeAnchor>>,
}

/// A document with a hostname and a list of links
#[derive(Clone, Default)]
pub struct FakePage {
    inner: Rc<FakePageInner>,
}

impl FakePage {
    pub fn new(hostname: &str) -> Self {
        let page = Self::default();
        *page.inner.hostname.borrow_mut() = hostname.to_string();
        page
    }

    /// A link whose `href` attribute is already absolute
    pub fn add_link(&self, href: &str) -> FakeAnchor {
        self.add_anchor(Some(href), Some(href))
    }

    pub fn add_anchor(&self, href: Option<&str>, resolved: Option<&str>) -> FakeAnchor {
        let anchor = Rc::new(FakeAnchorInner {
            href: href.map(str::to_string),
            resolved: resolved.map(str::to_string),
            painted: RefCell::new(None),
        });
        self.inner.anchors.borrow_mut().push(anchor.clone());
        anchor
    }

    /// Resolved URLs of the painted links with their colors, in document order
    pub fn painted(&self) -> Vec<(String, String)> {
        self.inner
            .anchors
            .borrow()
            .iter()
            .filter_map(|anchor| {
                let color = anchor.painted.borrow().clone()?;
                Some((anchor.resolved.clone().unwrap_or_default(), color))
            })
            .collect()
    }
}

impl LinkSurface for FakePage {
    type Anchor = FakeAnchor;

    fn hostname(&self) -> String {
        self.inner.hostname.borrow().clone()
    }

    fn anchors(&self) -> Vec<FakeAnchor> {
        self.inner
            .anchors
            .borrow()
            .iter()
            .filter(|anchor| anchor.href.is_some())
            .cloned()
            .collect()
    }

    fn clear_highlights(&self) {
        for anchor in self.inner.anchors.borrow().iter() {
            *anchor.painted.borrow_mut() = None;
        }
    }
}
