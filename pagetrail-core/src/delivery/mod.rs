//! Delivery of event records to the collector endpoint
//!
//! ## Architecture
//!
//! Delivery is one-way and fire-and-forget:
//! - Records are serialized to JSON and handed to the unload-safe [`Beacon`]
//!   transport when the host provides one
//! - Otherwise (or when the beacon refuses a record) a keep-alive POST is
//!   issued on a detached task through [`HttpPost`]
//! - Failures are counted and, in debug mode, logged; they never reach the
//!   observer that produced the record and are never retried
//!
//! No acknowledgement, batching or ordering is provided.

mod beacon;
mod channel;
mod http;

use std::future::Future;
use std::pin::Pin;

pub use beacon::{Beacon, BeaconQueue};
pub use channel::{DeliveryChannel, DeliveryStats, Transports};
pub use http::{HttpPost, HttpTransport, PostRequest};

/// Boxed future used at the transport seams
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
