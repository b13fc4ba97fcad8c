//! Interaction observers
//!
//! Each observer turns one kind of page notification into event records and
//! hands them to the [`DeliveryChannel`](crate::delivery::DeliveryChannel).
//! Observers share no mutable state with each other; the set of viewed
//! sections belongs to the [`ScrollObserver`] alone.

mod click;
mod form;
mod scroll;
mod visibility;

pub use click::{ClickObserver, ClickSignal, ElementInfo, MAX_CLICK_DETAIL, TEXT_LIMIT};
pub use form::{FormControl, FormObserver, FormSnapshot, FORM_ACKNOWLEDGEMENT};
pub use scroll::{ScrollObserver, UNTITLED_SECTION};
pub use visibility::{VisibilityObserver, VisibilityState};

/// Observers the tracker can attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    Click,
    Scroll,
    Form,
    Visibility,
}

impl ObserverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObserverKind::Click => "click",
            ObserverKind::Scroll => "scroll",
            ObserverKind::Form => "form",
            ObserverKind::Visibility => "visibility",
        }
    }
}

impl std::fmt::Display for ObserverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
