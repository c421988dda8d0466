/// Page agent: mirrors the settings and paints visited links

use crate::Phase;
use crate::domain::DomainPattern;
use crate::messages::PageCommand;
use crate::storage::{DEFAULT_HIGHLIGHT_COLOR, SettingsKey, StorageChanges, StoredSettings};
use crate::url_identity::{VisitedSet, normalize};

/// A link in the current document
pub trait PageAnchor {
    /// The literal `href` attribute
    fn href_attribute(&self) -> Option<String>;

    /// The absolute URL the link points to, if it resolves to one
    fn resolved_href(&self) -> Option<String>;

    /// Background fill plus a bottom border in `color`
    fn paint(&self, color: &str);
}

/// The document a page agent works on
pub trait LinkSurface {
    type Anchor: PageAnchor;

    fn hostname(&self) -> String;

    /// Every anchor that carries an `href` attribute
    fn anchors(&self) -> Vec<Self::Anchor>;

    /// Undo every paint this agent applied
    fn clear_highlights(&self);
}

/// The page agent's local copy of the settings
#[derive(Debug, Clone)]
pub struct Mirror {
    pub enabled: bool,
    pub visited: VisitedSet,
    pub color: String,
    domain_filter: String,
    pattern: DomainPattern,
}

impl Mirror {
    pub fn from_stored(stored: &StoredSettings) -> Mirror {
        let settings = stored.resolve();
        let mut mirror = Mirror {
            enabled: settings.enabled,
            visited: stored.visited_set(),
            color: settings.color,
            domain_filter: String::new(),
            pattern: DomainPattern::Any,
        };
        mirror.set_domain_filter(settings.domain_filter);
        mirror
    }

    pub fn domain_filter(&self) -> &str {
        &self.domain_filter
    }

    /// Replace the filter and recompile its pattern
    pub fn set_domain_filter(&mut self, filter: String) {
        self.pattern = DomainPattern::compile(&filter);
        self.domain_filter = filter;
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Mirror::from_stored(&StoredSettings::default())
    }
}

/// Whether an `href` attribute can point at a visited page at all
fn is_navigable(href: &str) -> bool {
    let href = href.trim();
    let is_script = href
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"));

    !href.is_empty() && !href.starts_with('#') && !is_script
}

/// The content-side state machine.
///
/// Until the initial settings load finishes, commands and store changes only
/// update the mirror; nothing is painted.
pub struct PageHighlighter<P> {
    page: P,
    mirror: Mirror,
    phase: Phase,
}

impl<P: LinkSurface> PageHighlighter<P> {
    pub fn new(page: P) -> Self {
        PageHighlighter {
            page,
            mirror: Mirror::default(),
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Take the initial settings read and run the first pass.
    ///
    /// Only the first call counts; a late duplicate would overwrite fresher
    /// state delivered by change notifications.
    pub fn finish_loading(&mut self, stored: StoredSettings) -> usize {
        if self.phase == Phase::Ready {
            log::debug!("Ignoring repeated initial load");
            return 0;
        }

        self.mirror = Mirror::from_stored(&stored);
        self.phase = Phase::Ready;
        log::debug!(
            "Page agent ready: enabled={}, {} visited, filter {:?}",
            self.mirror.enabled,
            self.mirror.visited.len(),
            self.mirror.domain_filter
        );

        self.update_highlighting()
    }

    /// Fold one change notification into the mirror, then recompute
    pub fn apply_store_changes(&mut self, changes: &StorageChanges) -> usize {
        if let Some(enabled) = changes.new_value::<bool>(SettingsKey::HighlightEnabled) {
            self.mirror.enabled = enabled.unwrap_or(false);
        }
        if let Some(urls) = changes.new_value::<Vec<String>>(SettingsKey::VisitedUrls) {
            self.mirror.visited = VisitedSet::from_urls(urls.unwrap_or_default());
        }
        if let Some(filter) = changes.new_value::<String>(SettingsKey::DomainFilter) {
            self.mirror.set_domain_filter(filter.unwrap_or_default());
        }
        if let Some(color) = changes.new_value::<String>(SettingsKey::HighlightColor) {
            self.mirror.color = color.unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string());
        }

        self.update_highlighting()
    }

    /// Apply a direct command from the popup or the background
    pub fn handle_command(&mut self, command: PageCommand) -> usize {
        match command {
            PageCommand::EnableHighlight { color } => {
                self.mirror.enabled = true;
                if let Some(color) = color {
                    self.mirror.color = color;
                }
            }
            PageCommand::DisableHighlight {} => {
                self.mirror.enabled = false;
            }
            PageCommand::UpdateHighlightColor { color } => {
                self.mirror.color = color.unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string());
            }
            PageCommand::UpdateVisitedUrls { urls, color } => {
                self.mirror.visited = VisitedSet::from_urls(urls);
                if let Some(color) = color {
                    self.mirror.color = color;
                }
            }
            PageCommand::UpdateHighlight {} => {}
        }

        self.update_highlighting()
    }

    /// Clear everything, then repaint if enabled and the page matches the
    /// domain filter. Returns how many links were painted.
    pub fn update_highlighting(&self) -> usize {
        if self.phase != Phase::Ready {
            return 0;
        }

        self.page.clear_highlights();

        if !self.mirror.enabled || !self.mirror.pattern.matches(&self.page.hostname()) {
            return 0;
        }

        self.highlight_links()
    }

    fn highlight_links(&self) -> usize {
        let mut painted = 0;

        for anchor in self.page.anchors() {
            let Some(href) = anchor.href_attribute() else {
                continue;
            };
            if !is_navigable(&href) {
                continue;
            }
            let Some(resolved) = anchor.resolved_href() else {
                log::debug!("Skipping unresolvable link {:?}", href);
                continue;
            };

            if self.mirror.visited.contains(&normalize(&resolved)) {
                anchor.paint(&self.mirror.color);
                painted += 1;
            }
        }

        painted
    }
}
