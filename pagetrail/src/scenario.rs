//! Scripted page sessions
//!
//! A scenario describes a page (environment, sections, viewport) and the
//! interactions a visitor performs on it. Replaying a scenario drives a
//! [`Tracker`] exactly as a browser host would.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pagetrail_core::{
    ClickSignal, DocumentLayout, Fields, FormSnapshot, SectionSpec, StaticEnvironment, Tracker,
    TrackerOptions, VisibilityState,
};
use serde::Deserialize;

/// Slack added after the last scheduled section check
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

/// A page plus the steps to perform on it
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub environment: StaticEnvironment,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
    /// Tracker options layered over the config file
    #[serde(default)]
    pub options: TrackerOptions,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One visitor interaction
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Let time pass
    WaitMs(u64),
    /// Scroll the document and fire a scroll notification
    ScrollTo(f64),
    Click(ClickSignal),
    Submit(FormSnapshot),
    Visibility(VisibilityState),
    Track {
        name: String,
        #[serde(default)]
        data: Fields,
    },
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    /// Document layout sized to the scenario's viewport
    pub fn layout(&self) -> Arc<DocumentLayout> {
        Arc::new(DocumentLayout::new(
            self.sections.clone(),
            self.environment.viewport.1 as f64,
        ))
    }
}

/// Perform every step against `tracker`, then let pending checks settle.
pub async fn replay(
    steps: &[Step],
    tracker: &Tracker,
    layout: &DocumentLayout,
) -> Result<usize> {
    let mut performed = 0;
    for step in steps {
        match step {
            Step::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::ScrollTo(y) => {
                layout.scroll_to(*y);
                tracker.on_scroll();
            }
            Step::Click(signal) => {
                tracker.on_click(signal);
            }
            Step::Submit(form) => {
                let mut form = form.clone();
                if tracker.on_submit(&mut form) {
                    tracing::info!(
                        acknowledgement = ?form.acknowledgements.first(),
                        "Form completed locally"
                    );
                }
            }
            Step::Visibility(state) => tracker.on_visibility_change(*state),
            Step::Track { name, data } => tracker.track(name, data.clone()),
        }
        performed += 1;
    }

    // Let the post-load check and any trailing scroll check run before teardown.
    tokio::time::sleep_until(tracker.settled_at() + SETTLE_MARGIN).await;
    Ok(performed)
}
