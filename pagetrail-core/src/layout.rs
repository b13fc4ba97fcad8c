//! Page geometry read by the section observer
//!
//! Hosts implement [`PageLayout`]. [`DocumentLayout`] models a document as a
//! list of sections at fixed offsets plus a movable scroll position, which is
//! enough to drive the observer outside a browser.

use std::sync::Mutex;

use serde::Deserialize;

/// A tracked section as seen at check time.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSnapshot {
    /// Stable identifier, `None` when the element has no id
    pub id: Option<String>,
    /// Text of the first heading inside the section
    pub heading: Option<String>,
    /// Top edge relative to the viewport
    pub top: f64,
    /// Bottom edge relative to the viewport
    pub bottom: f64,
}

impl SectionSnapshot {
    /// True when the section straddles the vertical midpoint of the viewport
    pub fn straddles_midpoint(&self, viewport_height: f64) -> bool {
        let midpoint = viewport_height * 0.5;
        self.top <= midpoint && self.bottom >= midpoint
    }
}

/// Scroll position of the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    /// Total height of the document
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Scroll progress in percent, rounded and clamped to 0..=100.
    ///
    /// A document that cannot scroll reports 0.
    pub fn percentage(&self) -> u32 {
        let scrollable = self.scroll_height - self.viewport_height;
        if scrollable.is_nan() || scrollable <= 0.0 {
            return 0;
        }
        let percent = (self.scroll_y / scrollable * 100.0).round();
        percent.clamp(0.0, 100.0) as u32
    }
}

/// Geometry provider for section tracking.
pub trait PageLayout: Send + Sync {
    /// All tracked sections, in document order
    fn sections(&self) -> Vec<SectionSnapshot>;

    fn metrics(&self) -> ScrollMetrics;
}

/// A section placed at an absolute document offset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    /// Offset of the top edge from the top of the document
    pub offset: f64,
    pub height: f64,
}

impl SectionSpec {
    pub fn new(id: impl Into<String>, offset: f64, height: f64) -> Self {
        Self {
            id: Some(id.into()),
            heading: None,
            offset,
            height,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }
}

/// [`PageLayout`] over a static document and a scroll position.
#[derive(Debug)]
pub struct DocumentLayout {
    sections: Vec<SectionSpec>,
    document_height: f64,
    viewport_height: f64,
    scroll_y: Mutex<f64>,
}

impl DocumentLayout {
    /// Document height is the bottom of the lowest section, and at least the
    /// viewport height.
    pub fn new(sections: Vec<SectionSpec>, viewport_height: f64) -> Self {
        let document_height = sections
            .iter()
            .map(|s| s.offset + s.height)
            .fold(viewport_height, f64::max);
        Self {
            sections,
            document_height,
            viewport_height,
            scroll_y: Mutex::new(0.0),
        }
    }

    /// Scroll to `y`, clamped to the scrollable range
    pub fn scroll_to(&self, y: f64) {
        let max = (self.document_height - self.viewport_height).max(0.0);
        if let Ok(mut scroll_y) = self.scroll_y.lock() {
            *scroll_y = y.clamp(0.0, max);
        }
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y.lock().map(|y| *y).unwrap_or(0.0)
    }

    pub fn document_height(&self) -> f64 {
        self.document_height
    }
}

impl PageLayout for DocumentLayout {
    fn sections(&self) -> Vec<SectionSnapshot> {
        let scroll_y = self.scroll_y();
        self.sections
            .iter()
            .map(|s| SectionSnapshot {
                id: s.id.clone().filter(|id| !id.is_empty()),
                heading: s.heading.clone(),
                top: s.offset - scroll_y,
                bottom: s.offset + s.height - scroll_y,
            })
            .collect()
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_y: self.scroll_y(),
            scroll_height: self.document_height,
            viewport_height: self.viewport_height,
        }
    }
}
