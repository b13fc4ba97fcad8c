//! Visibility observer

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::delivery::DeliveryChannel;
use crate::event::{EventFactory, EventKind, Fields};

/// Page visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    Visible,
    Hidden,
}

impl VisibilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityState::Visible => "visible",
            VisibilityState::Hidden => "hidden",
        }
    }
}

impl std::str::FromStr for VisibilityState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(VisibilityState::Visible),
            "hidden" => Ok(VisibilityState::Hidden),
            _ => Err(format!("unknown visibility state: {}", s)),
        }
    }
}

/// Emits a `page_visibility` record on every transition, tagged with the
/// time spent on the page so far, counted from navigation start.
pub struct VisibilityObserver {
    factory: Arc<EventFactory>,
    channel: Arc<DeliveryChannel>,
    page_start: Instant,
}

impl VisibilityObserver {
    pub fn new(
        factory: Arc<EventFactory>,
        channel: Arc<DeliveryChannel>,
        page_start: Instant,
    ) -> Self {
        Self {
            factory,
            channel,
            page_start,
        }
    }

    pub fn on_visibility_change(&self, state: VisibilityState) {
        let mut extra = Fields::new();
        extra.insert(
            "visibility_state".into(),
            Value::String(state.as_str().to_string()),
        );
        extra.insert("time_on_page".into(), Value::from(self.time_on_page_ms()));

        let record = self
            .factory
            .create(&EventKind::PageVisibility, state.as_str(), extra);
        self.channel.send(&record);
    }

    /// Milliseconds since navigation start.
    ///
    /// `page_start` is the navigation start, so the load phase is included.
    pub fn time_on_page_ms(&self) -> u64 {
        self.page_start.elapsed().as_millis() as u64
    }
}
