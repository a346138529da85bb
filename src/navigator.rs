//! Scroll-spy navigation
//!
//! Keeps the table of contents in sync with the reading position. Sections are
//! registered explicitly, in document order, with their vertical extent; each
//! scroll event resolves the section under `offset + lookahead`. Units are
//! whatever the caller measures in (pixels in the browser, lines in the
//! terminal viewer).

use serde::Serialize;

/// Look-ahead, in pixels, used by the HTML report
pub const DEFAULT_LOOKAHEAD: usize = 100;

/// Navigation state shared with the TOC panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    /// Id of the highlighted section, empty before the first match
    pub active_section_id: String,
    pub is_panel_visible: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active_section_id: String::new(),
            is_panel_visible: true,
        }
    }
}

/// Vertical extent of one registered section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionMetrics {
    pub id: String,
    pub top: usize,
    pub height: usize,
}

impl SectionMetrics {
    pub fn new(id: impl Into<String>, top: usize, height: usize) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.top && position < self.top.saturating_add(self.height)
    }
}

/// Resolve the active section for a scroll offset.
///
/// Nested sections overlap their parents, so the last matching section in
/// registration order wins.
pub fn resolve_active(
    sections: &[SectionMetrics],
    scroll_offset: usize,
    lookahead: usize,
) -> Option<&str> {
    let cursor = scroll_offset.saturating_add(lookahead);
    sections
        .iter()
        .rev()
        .find(|s| s.contains(cursor))
        .map(|s| s.id.as_str())
}

#[derive(Debug, Clone)]
pub struct ScrollSpy {
    sections: Vec<SectionMetrics>,
    lookahead: usize,
    state: NavigationState,
}

impl ScrollSpy {
    pub fn new(lookahead: usize) -> Self {
        Self {
            sections: Vec::new(),
            lookahead,
            state: NavigationState::default(),
        }
    }

    /// Append a section; callers register in document order
    pub fn register(&mut self, section: SectionMetrics) {
        self.sections.push(section);
    }

    /// Replace the registry after a relayout. The active id and panel
    /// visibility carry over.
    pub fn set_sections(&mut self, sections: Vec<SectionMetrics>) {
        self.sections = sections;
    }

    pub fn sections(&self) -> &[SectionMetrics] {
        &self.sections
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Handle a scroll event. Returns true when the active section changed.
    /// When no section matches, the previous active id is kept.
    pub fn on_scroll(&mut self, scroll_offset: usize) -> bool {
        match resolve_active(&self.sections, scroll_offset, self.lookahead) {
            Some(id) if id != self.state.active_section_id => {
                tracing::trace!(from = %self.state.active_section_id, to = %id, "active section");
                self.state.active_section_id = id.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn toggle_panel(&mut self) {
        self.state.is_panel_visible = !self.state.is_panel_visible;
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn active_section_id(&self) -> &str {
        &self.state.active_section_id
    }

    /// Top of the section registered under `id`
    pub fn top_of(&self, id: &str) -> Option<usize> {
        self.sections.iter().find(|s| s.id == id).map(|s| s.top)
    }
}

impl Default for ScrollSpy {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}
