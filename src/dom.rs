/// The live document as a `LinkSurface`

use crate::highlighter::{LinkSurface, PageAnchor};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlAnchorElement};

/// Attribute that marks links painted by this agent
pub const HIGHLIGHT_MARKER: &str = "data-visited-highlight";

pub struct DomLinks {
    document: Document,
}

impl DomLinks {
    pub fn new(document: Document) -> DomLinks {
        DomLinks { document }
    }

    /// The document of the current window, if there is one
    pub fn current() -> Option<DomLinks> {
        web_sys::window()?.document().map(DomLinks::new)
    }

    fn select(&self, selector: &str) -> Vec<HtmlAnchorElement> {
        let nodes = match self.document.query_selector_all(selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("Query {:?} failed: {:?}", selector, e);
                return Vec::new();
            }
        };

        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<HtmlAnchorElement>().ok())
            .collect()
    }
}

/// Styling is best effort: a failed step is logged and the rest still run
fn report<T>(step: &str, result: Result<T, JsValue>) {
    if let Err(e) = result {
        log::debug!("Could not {}: {:?}", step, e);
    }
}

impl LinkSurface for DomLinks {
    type Anchor = HtmlAnchorElement;

    fn hostname(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.hostname().ok())
            .unwrap_or_default()
    }

    fn anchors(&self) -> Vec<HtmlAnchorElement> {
        self.select("a[href]")
    }

    fn clear_highlights(&self) {
        for anchor in self.select(&format!("a[{}]", HIGHLIGHT_MARKER)) {
            let style = anchor.style();
            report("clear background", style.remove_property("background-color"));
            report("clear border", style.remove_property("border-bottom"));
            report("unmark link", anchor.remove_attribute(HIGHLIGHT_MARKER));
        }
    }
}

impl PageAnchor for HtmlAnchorElement {
    fn href_attribute(&self) -> Option<String> {
        self.get_attribute("href")
    }

    fn resolved_href(&self) -> Option<String> {
        // The browser hands back the raw attribute when it cannot resolve it.
        let href = self.href();
        Url::parse(&href).ok().map(|_| href)
    }

    fn paint(&self, color: &str) {
        let style = self.style();
        report("set background", style.set_property("background-color", color));
        report("set border", style.set_property("border-bottom", &format!("2px solid {}", color)));
        report("mark link", self.set_attribute(HIGHLIGHT_MARKER, ""));
    }
}
