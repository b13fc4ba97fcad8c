//! Unload-safe beacon transport
//!
//! A beacon hands a record to the runtime and returns immediately. The
//! runtime, not the page, owns the request from then on, so it completes even
//! while the page is being torn down.

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::http::{HttpPost, PostRequest};
use super::BoxFuture;

/// Unload-safe, non-blocking transport.
pub trait Beacon: Send + Sync {
    /// Queue `body` for delivery to `endpoint`.
    ///
    /// Returns `false` when the runtime refuses to queue it.
    fn send_beacon(&self, endpoint: &str, body: &str) -> bool;

    /// Wait until every queued beacon has been attempted. Called on teardown.
    fn drain(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// [`Beacon`] backed by a background delivery worker.
///
/// Queued requests are posted one after another by a worker task. Draining
/// closes the queue and waits for the worker, so everything queued before
/// teardown is delivered before the tracker goes away.
pub struct BeaconQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<PostRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BeaconQueue {
    /// Start the delivery worker on `runtime`
    pub fn spawn(transport: Arc<dyn HttpPost>, runtime: &Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PostRequest>();

        let worker = runtime.spawn(async move {
            while let Some(request) = receiver.recv().await {
                let endpoint = request.endpoint.clone();
                if let Err(e) = transport.post(request).await {
                    tracing::debug!(endpoint = %endpoint, error = %e, "Beacon delivery failed");
                }
            }
            tracing::debug!("Beacon queue drained");
        });

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Whether the queue still accepts beacons
    pub fn is_open(&self) -> bool {
        self.sender
            .lock()
            .map(|sender| sender.is_some())
            .unwrap_or(false)
    }
}

impl Beacon for BeaconQueue {
    fn send_beacon(&self, endpoint: &str, body: &str) -> bool {
        let guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        match guard.as_ref() {
            Some(sender) => sender
                .send(PostRequest::beacon(endpoint, body))
                .is_ok(),
            None => false,
        }
    }

    fn drain(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            // Dropping the sender lets the worker finish once the queue is empty.
            if let Ok(mut sender) = self.sender.lock() {
                sender.take();
            }
            let worker = self.worker.lock().ok().and_then(|mut w| w.take());
            if let Some(worker) = worker {
                if let Err(e) = worker.await {
                    tracing::warn!(error = %e, "Beacon worker stopped abnormally");
                }
            }
        })
    }
}
