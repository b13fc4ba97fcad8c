//! # pagetrail-core
//!
//! Core library for pagetrail - a behavioral telemetry collector.
//!
//! This library provides:
//! - Canonical event records and their factory
//! - A fire-and-forget delivery channel with an unload-safe beacon transport
//!   and a keep-alive HTTP fallback
//! - Observers for clicks, section views, form submissions and visibility
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! ```text
//! Observers → EventFactory → DeliveryChannel → collector endpoint
//! ```
//!
//! Nothing reads back from the network. Hosts provide the page through the
//! [`Environment`] and [`PageLayout`] traits and forward notifications to the
//! [`Tracker`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagetrail_core::{DocumentLayout, Host, StaticEnvironment, Tracker, TrackerOptions};
//!
//! # async fn run() -> pagetrail_core::Result<()> {
//! let environment = Arc::new(StaticEnvironment::new("https://shop.example/"));
//! let layout = Arc::new(DocumentLayout::new(vec![], 720.0));
//!
//! let options = TrackerOptions::with_endpoint("https://collector.example/e");
//! let tracker = Tracker::init(&options, Host::new(environment, layout))?;
//! tracker.track("signup", serde_json::Map::new());
//! tracker.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, TrackerConfig, TrackerOptions};
pub use delivery::{DeliveryChannel, DeliveryStats, Transports};
pub use environment::{Environment, EnvironmentContext, PageLocation, StaticEnvironment};
pub use error::{Error, Result};
pub use event::{EventFactory, EventKind, EventRecord, Fields};
pub use layout::{DocumentLayout, PageLayout, SectionSpec};
pub use observers::{ClickSignal, ElementInfo, FormSnapshot, ObserverKind, VisibilityState};
pub use tracker::{Host, Tracker};

// Public modules
pub mod config;
pub mod debounce;
pub mod delivery;
pub mod environment;
pub mod error;
pub mod event;
pub mod format;
pub mod layout;
pub mod logging;
pub mod observers;
pub mod tracker;
