//! Canonical event record
//!
//! A record is a fixed base shape (identity, page, time, environment) plus an
//! open map of kind-specific fields. When an extra field shares a name with a
//! base field, the extra field wins, both on the wire and in [`EventRecord::get`].
//! The identity fields in [`IDENTITY_FIELDS`] are the exception: they always
//! carry the values the factory assigned.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::environment::EnvironmentContext;

/// Open mapping of additional record fields.
pub type Fields = Map<String, Value>;

/// Base fields extra fields can never override
pub const IDENTITY_FIELDS: [&str; 3] = ["event_id", "event_type", "timestamp"];

/// Category of an event record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Pageview,
    Click,
    ScrollView,
    FormSubmit,
    PageVisibility,
    /// Emitted through the manual tracking path, rendered as `custom_<name>`
    Custom(String),
}

impl EventKind {
    pub fn as_str(&self) -> String {
        match self {
            EventKind::Pageview => "pageview".to_string(),
            EventKind::Click => "click".to_string(),
            EventKind::ScrollView => "scroll_view".to_string(),
            EventKind::FormSubmit => "form_submit".to_string(),
            EventKind::PageVisibility => "page_visibility".to_string(),
            EventKind::Custom(name) => format!("custom_{}", name),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pageview" => Ok(EventKind::Pageview),
            "click" => Ok(EventKind::Click),
            "scroll_view" => Ok(EventKind::ScrollView),
            "form_submit" => Ok(EventKind::FormSubmit),
            "page_visibility" => Ok(EventKind::PageVisibility),
            other => match other.strip_prefix("custom_") {
                Some(name) => Ok(EventKind::Custom(name.to_string())),
                None => Err(format!("unknown event kind: {}", s)),
            },
        }
    }
}

/// One structured telemetry fact.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: String,
    pub event_target: String,
    pub page_url: String,
    pub page_title: String,
    pub timestamp: DateTime<Utc>,
    pub context: EnvironmentContext,
    /// Kind-specific fields; override base fields of the same name
    pub extra: Fields,
}

impl EventRecord {
    /// The record as a flat JSON object, extra fields merged over base fields.
    pub fn to_map(&self) -> Fields {
        let mut map = Map::new();
        map.insert("event_id".into(), Value::String(self.event_id.clone()));
        map.insert("event_type".into(), Value::String(self.event_type.clone()));
        map.insert(
            "event_target".into(),
            Value::String(self.event_target.clone()),
        );
        map.insert("page_url".into(), Value::String(self.page_url.clone()));
        map.insert("page_title".into(), Value::String(self.page_title.clone()));
        map.insert("timestamp".into(), Value::String(self.timestamp_iso()));

        let ctx = &self.context;
        for (key, value) in [
            ("user_agent", &ctx.user_agent),
            ("screen_resolution", &ctx.screen_resolution),
            ("viewport_size", &ctx.viewport_size),
            ("language", &ctx.language),
            ("timezone", &ctx.timezone),
            ("referrer", &ctx.referrer),
        ] {
            map.insert(key.into(), Value::String(value.clone()));
        }

        for (key, value) in &self.extra {
            if !IDENTITY_FIELDS.contains(&key.as_str()) {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }

    /// Field lookup with the same precedence as the wire format.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !IDENTITY_FIELDS.contains(&key) {
            if let Some(value) = self.extra.get(key) {
                return Some(value.clone());
            }
        }
        self.to_map().remove(key)
    }

    /// Timestamp as ISO-8601 UTC with millisecond precision
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// UTF-8 JSON body sent to the collector
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_record(extra: Fields) -> EventRecord {
        EventRecord {
            event_id: "abc123".to_string(),
            event_type: "click".to_string(),
            event_target: "#buy".to_string(),
            page_url: "https://shop.example/".to_string(),
            page_title: "Shop".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
            context: EnvironmentContext {
                user_agent: "test-agent".to_string(),
                screen_resolution: "1920x1080".to_string(),
                viewport_size: "1280x720".to_string(),
                language: "en-US".to_string(),
                timezone: "UTC".to_string(),
                referrer: "direct".to_string(),
            },
            extra,
        }
    }

    #[test]
    fn test_serialize_flat_shape() {
        let mut extra = Fields::new();
        extra.insert("mouse_x".into(), Value::from(10));
        let record = make_record(extra);

        let value: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["event_type"], "click");
        assert_eq!(value["event_target"], "#buy");
        assert_eq!(value["timestamp"], "2026-03-01T12:30:00.000Z");
        assert_eq!(value["referrer"], "direct");
        assert_eq!(value["mouse_x"], 10);
    }

    #[test]
    fn test_extra_fields_override_base() {
        let mut extra = Fields::new();
        extra.insert("page_title".into(), Value::from("Checkout"));
        let record = make_record(extra);

        let map = record.to_map();
        assert_eq!(map["page_title"], "Checkout");
        assert_eq!(record.get("page_title"), Some(Value::from("Checkout")));
        assert_eq!(record.get("event_target"), Some(Value::from("#buy")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_identity_fields_cannot_be_overridden() {
        let mut extra = Fields::new();
        extra.insert("event_id".into(), Value::from("dup"));
        extra.insert("event_type".into(), Value::from(""));
        extra.insert("timestamp".into(), Value::from("yesterday"));
        let record = make_record(extra);

        let map = record.to_map();
        assert_eq!(map["event_id"], "abc123");
        assert_eq!(map["event_type"], "click");
        assert_eq!(map["timestamp"], "2026-03-01T12:30:00.000Z");
        assert_eq!(record.get("event_id"), Some(Value::from("abc123")));
        assert_eq!(record.get("event_type"), Some(Value::from("click")));
    }

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(EventKind::Pageview.as_str(), "pageview");
        assert_eq!(EventKind::ScrollView.as_str(), "scroll_view");
        assert_eq!(EventKind::Custom("signup".into()).as_str(), "custom_signup");
        assert_eq!(
            "custom_signup".parse::<EventKind>().unwrap(),
            EventKind::Custom("signup".into())
        );
        assert_eq!(
            "page_visibility".parse::<EventKind>().unwrap(),
            EventKind::PageVisibility
        );
        assert!("bogus".parse::<EventKind>().is_err());
    }
}
