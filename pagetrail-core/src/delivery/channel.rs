//! Fire-and-forget delivery channel

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;

use super::beacon::{Beacon, BeaconQueue};
use super::http::{HttpPost, HttpTransport, PostRequest};
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::event::EventRecord;
use crate::format;

/// Transports available to the channel
#[derive(Clone)]
pub struct Transports {
    /// Unload-safe transport, when the host provides one
    pub beacon: Option<Arc<dyn Beacon>>,
    /// Keep-alive POST used when no beacon is available
    pub fallback: Arc<dyn HttpPost>,
}

impl Transports {
    /// Beacon queue and fallback both backed by one `reqwest` client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn http(config: &TrackerConfig, runtime: &Handle) -> Result<Self> {
        let http: Arc<dyn HttpPost> = Arc::new(HttpTransport::new(config.timeout)?);
        let beacon = BeaconQueue::spawn(Arc::clone(&http), runtime);
        Ok(Self {
            beacon: Some(Arc::new(beacon)),
            fallback: http,
        })
    }

    /// Fallback path only
    pub fn without_beacon(fallback: Arc<dyn HttpPost>) -> Self {
        Self {
            beacon: None,
            fallback,
        }
    }
}

/// Delivery statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Records accepted by the beacon transport
    pub beacons: usize,
    /// Records the beacon transport refused
    pub beacon_refusals: usize,
    /// Records sent through the fallback POST
    pub fallback_posts: usize,
    /// Fallback POSTs that failed
    pub fallback_failures: usize,
    /// Records dropped because no endpoint is configured
    pub unconfigured: usize,
}

#[derive(Debug, Default)]
struct Counters {
    beacons: AtomicUsize,
    beacon_refusals: AtomicUsize,
    fallback_posts: AtomicUsize,
    fallback_failures: AtomicUsize,
    unconfigured: AtomicUsize,
}

/// Serializes records and transmits them to the collector endpoint.
///
/// [`DeliveryChannel::send`] never fails and never blocks: every outcome is
/// handled inside the channel.
pub struct DeliveryChannel {
    endpoint: String,
    debug: bool,
    transports: Transports,
    runtime: Handle,
    counters: Arc<Counters>,
    missing_endpoint_reported: AtomicBool,
}

impl DeliveryChannel {
    pub fn new(
        endpoint: impl Into<String>,
        debug: bool,
        transports: Transports,
        runtime: Handle,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            debug,
            transports,
            runtime,
            counters: Arc::new(Counters::default()),
            missing_endpoint_reported: AtomicBool::new(false),
        }
    }

    /// Channel for a resolved tracker configuration
    pub fn from_config(config: &TrackerConfig, transports: Transports, runtime: Handle) -> Self {
        Self::new(config.endpoint.clone(), config.debug, transports, runtime)
    }

    /// Transmit one record.
    pub fn send(&self, record: &EventRecord) {
        if self.endpoint.trim().is_empty() {
            self.counters.unconfigured.fetch_add(1, Ordering::Relaxed);
            if !self.missing_endpoint_reported.swap(true, Ordering::Relaxed) {
                tracing::error!("No collector endpoint configured; events will not be sent");
            }
            return;
        }

        let body = match record.to_json() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(event_id = %record.event_id, error = %e, "Failed to serialize event");
                return;
            }
        };

        let transport = match &self.transports.beacon {
            Some(beacon) if beacon.send_beacon(&self.endpoint, &body) => {
                self.counters.beacons.fetch_add(1, Ordering::Relaxed);
                "beacon"
            }
            Some(_) => {
                self.counters.beacon_refusals.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(event_id = %record.event_id, "Beacon refused, falling back to POST");
                self.post_detached(body.clone());
                "fallback"
            }
            None => {
                self.post_detached(body.clone());
                "fallback"
            }
        };

        if self.debug {
            tracing::info!(
                event_id = %record.event_id,
                event_type = %record.event_type,
                event_target = %record.event_target,
                transport,
                body = %body,
                "Event sent"
            );
            tracing::debug!("\n{}", format::tabulate(record));
        }
    }

    /// Issue the fallback POST on a detached task
    fn post_detached(&self, body: String) {
        self.counters.fallback_posts.fetch_add(1, Ordering::Relaxed);

        let request = self
            .transports
            .fallback
            .post(PostRequest::json(self.endpoint.clone(), body));
        let counters = Arc::clone(&self.counters);
        let debug = self.debug;

        self.runtime.spawn(async move {
            if let Err(e) = request.await {
                counters.fallback_failures.fetch_add(1, Ordering::Relaxed);
                if debug {
                    tracing::warn!(error = %e, "Event delivery failed");
                }
            }
        });
    }

    /// Wait for queued beacons to be attempted
    pub async fn drain(&self) {
        if let Some(beacon) = &self.transports.beacon {
            beacon.drain().await;
        }
    }

    /// Current delivery statistics
    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            beacons: self.counters.beacons.load(Ordering::Relaxed),
            beacon_refusals: self.counters.beacon_refusals.load(Ordering::Relaxed),
            fallback_posts: self.counters.fallback_posts.load(Ordering::Relaxed),
            fallback_failures: self.counters.fallback_failures.load(Ordering::Relaxed),
            unconfigured: self.counters.unconfigured.load(Ordering::Relaxed),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}
