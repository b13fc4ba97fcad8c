//! Section observer
//!
//! Tracks which content sections the visitor has seen. Each section id moves
//! from unseen to seen at most once per page lifetime; the transition emits a
//! single `scroll_view` record.
//!
//! Scroll notifications are debounced: the check only runs once scrolling has
//! paused for the quiet period. One extra check runs shortly after start-up to
//! pick up sections that are visible without any scrolling.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::TrackerConfig;
use crate::debounce::Debouncer;
use crate::delivery::DeliveryChannel;
use crate::event::{EventFactory, EventKind, Fields};
use crate::layout::PageLayout;

/// Title reported for sections without a heading
pub const UNTITLED_SECTION: &str = "Untitled";

/// Emits `scroll_view` records for sections reaching the viewport midpoint
pub struct ScrollObserver {
    layout: Arc<dyn PageLayout>,
    factory: Arc<EventFactory>,
    channel: Arc<DeliveryChannel>,
    viewed: Mutex<HashSet<String>>,
    debouncer: Debouncer,
    initial_delay: Duration,
    initial_check: Mutex<Option<JoinHandle<()>>>,
    checks_run: AtomicUsize,
    runtime: Handle,
}

impl ScrollObserver {
    pub fn new(
        config: &TrackerConfig,
        layout: Arc<dyn PageLayout>,
        factory: Arc<EventFactory>,
        channel: Arc<DeliveryChannel>,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            layout,
            factory,
            channel,
            viewed: Mutex::new(HashSet::new()),
            debouncer: Debouncer::new(config.scroll_debounce, runtime.clone()),
            initial_delay: config.initial_check_delay,
            initial_check: Mutex::new(None),
            checks_run: AtomicUsize::new(0),
            runtime,
        })
    }

    /// Schedule the post-load check
    pub fn start(self: &Arc<Self>) {
        let observer = Arc::downgrade(self);
        let delay = self.initial_delay;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(observer) = observer.upgrade() {
                observer.check();
            }
        });
        if let Ok(mut initial) = self.initial_check.lock() {
            if let Some(previous) = initial.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Handle a scroll notification
    pub fn on_scroll(self: &Arc<Self>) {
        let observer = Arc::downgrade(self);
        self.debouncer.schedule(move || {
            if let Some(observer) = observer.upgrade() {
                observer.check();
            }
        });
    }

    /// Check every section now. Returns how many sections became seen.
    pub fn check(&self) -> usize {
        self.checks_run.fetch_add(1, Ordering::Relaxed);

        let metrics = self.layout.metrics();
        let mut newly_seen = 0;

        for section in self.layout.sections() {
            let Some(id) = section.id.as_deref() else {
                continue;
            };
            if !section.straddles_midpoint(metrics.viewport_height) {
                continue;
            }
            let inserted = match self.viewed.lock() {
                Ok(mut viewed) => viewed.insert(id.to_string()),
                Err(_) => false,
            };
            if !inserted {
                continue;
            }

            let title = section
                .heading
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .unwrap_or(UNTITLED_SECTION);

            let mut extra = Fields::new();
            extra.insert("section_id".into(), Value::String(id.to_string()));
            extra.insert("section_title".into(), Value::String(title.to_string()));
            extra.insert(
                "scroll_percentage".into(),
                Value::from(metrics.percentage()),
            );

            let record = self
                .factory
                .create(&EventKind::ScrollView, format!("#{}", id), extra);
            tracing::debug!(section_id = %id, "Section viewed");
            self.channel.send(&record);
            newly_seen += 1;
        }

        newly_seen
    }

    /// Ids of sections already reported, sorted
    pub fn viewed_sections(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .viewed
            .lock()
            .map(|viewed| viewed.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Number of checks executed so far
    pub fn checks_run(&self) -> usize {
        self.checks_run.load(Ordering::Relaxed)
    }

    /// Cancel the pending debounced check and the post-load check
    pub fn stop(&self) {
        self.debouncer.cancel();
        if let Ok(mut initial) = self.initial_check.lock() {
            if let Some(handle) = initial.take() {
                handle.abort();
            }
        }
    }
}
