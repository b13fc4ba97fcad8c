//! Event factory
//!
//! Builds canonical records from a kind, a target and extra fields, merged
//! with the environment context. The factory never sends anything.

use std::sync::Arc;

use chrono::Utc;

use super::id::IdGenerator;
use super::record::{EventKind, EventRecord, Fields};
use crate::environment::Environment;

/// Builds [`EventRecord`]s for one page session.
pub struct EventFactory {
    environment: Arc<dyn Environment>,
    ids: IdGenerator,
}

impl EventFactory {
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self {
            environment,
            ids: IdGenerator::new(),
        }
    }

    /// Create a record with a fresh identifier and the current time.
    pub fn create(&self, kind: &EventKind, target: impl Into<String>, extra: Fields) -> EventRecord {
        let location = self.environment.location();
        EventRecord {
            event_id: self.ids.next_id(),
            event_type: kind.as_str(),
            event_target: target.into(),
            page_url: location.href,
            page_title: location.title,
            timestamp: Utc::now(),
            context: self.environment.context(),
            extra,
        }
    }

    pub fn environment(&self) -> &Arc<dyn Environment> {
        &self.environment
    }
}
