//! Click observer
//!
//! Maps the clicked element to a stable identifier and drops the extra clicks
//! generated by text-selection gestures.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::delivery::DeliveryChannel;
use crate::event::{EventFactory, EventKind, Fields};

/// Clicks with a higher repeat counter are ignored
pub const MAX_CLICK_DETAIL: u32 = 3;

/// Characters of element text carried in a click record
pub const TEXT_LIMIT: usize = 100;

/// The element a click landed on
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementInfo {
    /// Tag name in any case (`BUTTON`, `a`)
    pub tag_name: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Class attribute; `None` when not a plain string (e.g. SVG elements)
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
}

impl ElementInfo {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// `#id`, else `.first-class`, else the lowercase tag name
    pub fn identifier(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return format!("#{}", id);
        }
        if let Some(class) = self
            .class_name
            .as_deref()
            .and_then(|c| c.split_whitespace().next())
        {
            return format!(".{}", class);
        }
        self.tag_name.to_lowercase()
    }
}

/// A capture-phase click notification
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClickSignal {
    pub target: ElementInfo,
    /// Repeat counter: 1 for a single click, 2 for a double click, ...
    #[serde(default = "default_detail")]
    pub detail: u32,
    #[serde(default)]
    pub client_x: f64,
    #[serde(default)]
    pub client_y: f64,
}

fn default_detail() -> u32 {
    1
}

impl ClickSignal {
    pub fn new(target: ElementInfo, client_x: f64, client_y: f64) -> Self {
        Self {
            target,
            detail: 1,
            client_x,
            client_y,
        }
    }

    pub fn with_detail(mut self, detail: u32) -> Self {
        self.detail = detail;
        self
    }
}

/// Emits a `click` record for every meaningful click
pub struct ClickObserver {
    factory: Arc<EventFactory>,
    channel: Arc<DeliveryChannel>,
}

impl ClickObserver {
    pub fn new(factory: Arc<EventFactory>, channel: Arc<DeliveryChannel>) -> Self {
        Self { factory, channel }
    }

    /// Handle one click. Returns whether a record was emitted.
    pub fn on_click(&self, signal: &ClickSignal) -> bool {
        if signal.detail > MAX_CLICK_DETAIL {
            tracing::trace!(detail = signal.detail, "Ignoring repeated click");
            return false;
        }

        let target = &signal.target;
        let text: String = target
            .text_content
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(TEXT_LIMIT)
            .collect();

        let mut extra = Fields::new();
        extra.insert("element_text".into(), Value::String(text));
        extra.insert(
            "element_tag".into(),
            Value::String(target.tag_name.to_lowercase()),
        );
        extra.insert("mouse_x".into(), coordinate(signal.client_x));
        extra.insert("mouse_y".into(), coordinate(signal.client_y));

        let record = self
            .factory
            .create(&EventKind::Click, target.identifier(), extra);
        self.channel.send(&record);
        true
    }
}

/// Whole-pixel coordinates as integers, fractional ones as floats
fn coordinate(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
