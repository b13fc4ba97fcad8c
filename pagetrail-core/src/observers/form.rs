//! Form observer
//!
//! Intercepts a submission, records its fields in one `form_submit` record
//! and completes the interaction locally: the original submission never
//! proceeds, the visitor gets an acknowledgement and the form is reset.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::delivery::DeliveryChannel;
use crate::event::{EventFactory, EventKind, Fields};

/// Message shown to the visitor after a submission is recorded
pub const FORM_ACKNOWLEDGEMENT: &str =
    "Thank you! The form data was sent to analytics (not to the server).";

/// A form being submitted.
pub trait FormControl {
    /// The form's id attribute, if any
    fn id(&self) -> Option<&str>;

    /// Successful controls as name/value pairs, in document order
    fn fields(&self) -> Vec<(String, String)>;

    /// Number of elements in the form, including buttons
    fn element_count(&self) -> usize;

    /// Stop the submission from navigating or posting
    fn prevent_default(&mut self);

    /// Show `message` to the visitor
    fn acknowledge(&mut self, message: &str);

    /// Restore every control to its initial value
    fn reset(&mut self);
}

/// [`FormControl`] over plain data, recording the side effects applied to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: Vec<(String, String)>,
    #[serde(default)]
    pub element_count: usize,
    #[serde(skip)]
    pub default_prevented: bool,
    #[serde(skip)]
    pub acknowledgements: Vec<String>,
    #[serde(skip)]
    pub was_reset: bool,
}

impl FormSnapshot {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            ..Default::default()
        }
    }

    /// Add a text control
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self.element_count += 1;
        self
    }

    /// Add elements that submit no value (buttons, fieldsets)
    pub fn with_extra_elements(mut self, count: usize) -> Self {
        self.element_count += count;
        self
    }
}

impl FormControl for FormSnapshot {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn fields(&self) -> Vec<(String, String)> {
        self.fields.clone()
    }

    fn element_count(&self) -> usize {
        self.element_count
    }

    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn acknowledge(&mut self, message: &str) {
        self.acknowledgements.push(message.to_string());
    }

    fn reset(&mut self) {
        self.was_reset = true;
        for (_, value) in &mut self.fields {
            value.clear();
        }
    }
}

/// Emits a `form_submit` record for every submission
pub struct FormObserver {
    factory: Arc<EventFactory>,
    channel: Arc<DeliveryChannel>,
}

impl FormObserver {
    pub fn new(factory: Arc<EventFactory>, channel: Arc<DeliveryChannel>) -> Self {
        Self { factory, channel }
    }

    /// Handle one submission
    pub fn on_submit(&self, form: &mut dyn FormControl) {
        form.prevent_default();

        let form_id = form.id().filter(|id| !id.is_empty()).map(str::to_string);

        // Later controls with the same name overwrite earlier ones.
        let mut values = Fields::new();
        for (name, value) in form.fields() {
            values.insert(name, Value::String(value));
        }

        let mut extra = Fields::new();
        extra.insert(
            "form_id".into(),
            Value::String(form_id.clone().unwrap_or_else(|| "unknown".to_string())),
        );
        extra.insert("form_values".into(), Value::Object(values));
        extra.insert("form_fields_count".into(), Value::from(form.element_count()));

        let target = format!("#{}", form_id.as_deref().unwrap_or("unknown-form"));
        let record = self.factory.create(&EventKind::FormSubmit, target, extra);
        self.channel.send(&record);

        form.acknowledge(FORM_ACKNOWLEDGEMENT);
        form.reset();
    }
}
