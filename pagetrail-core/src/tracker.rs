//! Tracker orchestration
//!
//! [`Tracker::init`] resolves the configuration, emits the `pageview` record
//! and attaches the enabled observers. The host then forwards page
//! notifications through the `on_*` methods. Notifications for observers that
//! are not attached are ignored, as if no listener had been registered.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::{TrackerConfig, TrackerOptions};
use crate::delivery::{DeliveryChannel, DeliveryStats, Transports};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::event::{EventFactory, EventKind, Fields};
use crate::layout::PageLayout;
use crate::observers::{
    ClickObserver, ClickSignal, FormControl, FormObserver, ObserverKind, ScrollObserver,
    VisibilityObserver, VisibilityState,
};

/// Target of records emitted through [`Tracker::track`]
pub const MANUAL_TARGET: &str = "manual";

/// Capabilities of the hosting page
#[derive(Clone)]
pub struct Host {
    pub environment: Arc<dyn Environment>,
    pub layout: Arc<dyn PageLayout>,
    /// Transports to use; `None` builds the HTTP beacon queue and fallback
    pub transports: Option<Transports>,
}

impl Host {
    pub fn new(environment: Arc<dyn Environment>, layout: Arc<dyn PageLayout>) -> Self {
        Self {
            environment,
            layout,
            transports: None,
        }
    }

    pub fn with_transports(mut self, transports: Transports) -> Self {
        self.transports = Some(transports);
        self
    }
}

/// A running collector for one page
pub struct Tracker {
    config: Arc<TrackerConfig>,
    factory: Arc<EventFactory>,
    channel: Arc<DeliveryChannel>,
    clicks: Option<ClickObserver>,
    scroll: Option<Arc<ScrollObserver>>,
    forms: Option<FormObserver>,
    visibility: VisibilityObserver,
    started_at: Instant,
}

impl Tracker {
    /// Start collecting.
    ///
    /// Fails without attaching anything when no endpoint is configured, or
    /// when called outside a tokio runtime.
    pub fn init(options: &TrackerOptions, host: Host) -> Result<Self> {
        let config = match options.resolve() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Tracker not started: configure a collector endpoint");
                return Err(e);
            }
        };
        let runtime = Handle::try_current().map_err(|_| {
            Error::Config("tracker must be initialized inside a tokio runtime".to_string())
        })?;
        // Navigation started `load_time_ms` before the host handed over the page.
        let now = Instant::now();
        let load_time = Duration::from_millis(host.environment.load_time_ms());
        let page_start = now.checked_sub(load_time).unwrap_or(now);

        tracing::info!(
            endpoint = %config.endpoint,
            debug = config.debug,
            track_clicks = config.track_clicks,
            track_scroll = config.track_scroll,
            track_forms = config.track_forms,
            "Initializing tracker"
        );

        let transports = match host.transports {
            Some(transports) => transports,
            None => Transports::http(&config, &runtime)?,
        };
        let config = Arc::new(config);
        let factory = Arc::new(EventFactory::new(host.environment));
        let channel = Arc::new(DeliveryChannel::from_config(
            &config,
            transports,
            runtime.clone(),
        ));

        let environment = factory.environment();
        let mut extra = Fields::new();
        extra.insert("load_time".into(), Value::from(environment.load_time_ms()));
        let pageview = factory.create(&EventKind::Pageview, environment.location().pathname, extra);
        channel.send(&pageview);

        let clicks = config
            .track_clicks
            .then(|| ClickObserver::new(Arc::clone(&factory), Arc::clone(&channel)));

        let scroll = config.track_scroll.then(|| {
            let observer = ScrollObserver::new(
                &config,
                host.layout,
                Arc::clone(&factory),
                Arc::clone(&channel),
                runtime,
            );
            observer.start();
            observer
        });

        let forms = config
            .track_forms
            .then(|| FormObserver::new(Arc::clone(&factory), Arc::clone(&channel)));

        let visibility =
            VisibilityObserver::new(Arc::clone(&factory), Arc::clone(&channel), page_start);

        let tracker = Self {
            config,
            factory,
            channel,
            clicks,
            scroll,
            forms,
            visibility,
            started_at: now,
        };

        tracing::info!(
            observers = ?tracker.active_observers(),
            "Tracker running"
        );
        Ok(tracker)
    }

    /// Emit a custom record, `custom_<name>` targeted at `manual`
    pub fn track(&self, name: &str, data: Fields) {
        let record = self
            .factory
            .create(&EventKind::Custom(name.to_string()), MANUAL_TARGET, data);
        self.channel.send(&record);
    }

    /// Forward a click. Returns whether a record was emitted.
    pub fn on_click(&self, signal: &ClickSignal) -> bool {
        match &self.clicks {
            Some(observer) => observer.on_click(signal),
            None => false,
        }
    }

    /// Forward a scroll notification
    pub fn on_scroll(&self) {
        if let Some(observer) = &self.scroll {
            observer.on_scroll();
        }
    }

    /// Forward a form submission.
    ///
    /// Returns `false` when form tracking is off; the submission is then left
    /// untouched.
    pub fn on_submit(&self, form: &mut dyn FormControl) -> bool {
        match &self.forms {
            Some(observer) => {
                observer.on_submit(form);
                true
            }
            None => false,
        }
    }

    /// Forward a visibility transition
    pub fn on_visibility_change(&self, state: VisibilityState) {
        self.visibility.on_visibility_change(state);
    }

    /// Observers attached at initialization
    pub fn active_observers(&self) -> Vec<ObserverKind> {
        let mut kinds = Vec::new();
        if self.clicks.is_some() {
            kinds.push(ObserverKind::Click);
        }
        if self.scroll.is_some() {
            kinds.push(ObserverKind::Scroll);
        }
        if self.forms.is_some() {
            kinds.push(ObserverKind::Form);
        }
        kinds.push(ObserverKind::Visibility);
        kinds
    }

    /// When [`Tracker::init`] ran
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Earliest instant by which every scheduled section check has run,
    /// assuming no further scroll notifications.
    pub fn settled_at(&self) -> Instant {
        let after_debounce = Instant::now() + self.config.scroll_debounce;
        match &self.scroll {
            Some(_) => after_debounce.max(self.started_at + self.config.initial_check_delay),
            None => after_debounce,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn scroll_observer(&self) -> Option<&Arc<ScrollObserver>> {
        self.scroll.as_ref()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.channel.stats()
    }

    /// Page teardown: cancel pending checks and wait for queued beacons.
    ///
    /// Fallback requests already in flight are not awaited.
    pub async fn shutdown(&self) {
        if let Some(observer) = &self.scroll {
            observer.stop();
        }
        self.channel.drain().await;
        tracing::info!(stats = ?self.channel.stats(), "Tracker stopped");
    }
}
