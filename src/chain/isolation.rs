//! Dry-run of a single step against a mock context
//!
//! Lets a step configuration be checked without running the steps before it.
//! All user-editable JSON is validated before anything goes over the wire.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::client::inflight::run_cancellable;
use crate::client::{ChainBackend, InflightHandle, InflightSlot};
use crate::errors::{ChainpulseError, Result};
use crate::models::{parse_rules, ChainContext, IsolationRequest, ResponseBody};
use crate::output::{format_json_value, JsonFormatterOptions};

pub const FIELD_ENDPOINT: &str = "endpoint_id";
pub const FIELD_RULES: &str = "data_extraction_rules";
pub const FIELD_MOCK_CONTEXT: &str = "mock_context";

/// Raw text of the step form, exactly as the user typed it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepForm {
    pub endpoint_id: String,
    pub payload: String,
    pub headers: String,
    pub data_extraction_rules: String,
    pub mock_context: String,
}

/// Validity of one form field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub invalid: bool,
    pub message: Option<String>,
}

/// The result panels of a successful dry run
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationPanels {
    /// Payload after template rendering; pretty-printed when it is JSON
    pub rendered_payload: String,
    pub status_code: Option<u16>,
    pub response_body: ResponseBody,
    pub extracted_data: IndexMap<String, JsonValue>,
}

impl IsolationPanels {
    pub fn extracted_data_pretty(&self) -> String {
        let value = JsonValue::Object(self.extracted_data.clone().into_iter().collect());
        format_json_value(&value, &JsonFormatterOptions::default()).unwrap_or_else(|_| value.to_string())
    }
}

/// Observer of the tester. Every method defaults to doing nothing.
pub trait IsolationView {
    /// The "test this step" control is disabled (busy) or restored
    fn on_busy(&mut self, _busy: bool) {}

    /// A field failed validation and should be marked invalid inline
    fn on_field_invalid(&mut self, _field: &str, _message: &str) {}

    fn on_field_valid(&mut self, _field: &str) {}

    /// Blocking alert for problems that cannot be shown next to a field
    fn on_alert(&mut self, _message: &str) {}

    /// The dry run failed; `transport` separates HTTP failures from backend-reported errors
    fn on_error(&mut self, _message: &str, _transport: bool) {}

    fn on_result(&mut self, _panels: &IsolationPanels) {}
}

impl IsolationView for super::debugger::NullView {}

pub struct StepIsolationTester<B, V> {
    backend: B,
    view: V,
    inflight: InflightSlot,
    mock_context_state: FieldState,
}

impl<B: ChainBackend, V: IsolationView> StepIsolationTester<B, V> {
    pub fn new(backend: B, view: V) -> Self {
        Self {
            backend,
            view,
            inflight: InflightSlot::new(),
            mock_context_state: FieldState::default(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn mock_context_state(&self) -> &FieldState {
        &self.mock_context_state
    }

    pub fn cancel_handle(&self) -> InflightHandle {
        self.inflight.handle()
    }

    /// Validate the form, dry-run the step and publish the result panels
    pub async fn test_step(&mut self, form: &StepForm) -> Result<IsolationPanels> {
        let request = self.validate(form)?;

        info!(endpoint_id = %request.endpoint_id, rules = request.data_extraction_rules.len(), "testing step in isolation");
        self.view.on_busy(true);
        let result = self.send(&request).await;
        self.view.on_busy(false);

        match result {
            Ok(panels) => {
                self.view.on_result(&panels);
                Ok(panels)
            }
            Err(error) => {
                let message = match &error {
                    ChainpulseError::Application(message) => message.clone(),
                    other => format!("Request failed: {}", other),
                };
                warn!(endpoint_id = %request.endpoint_id, error = %message, "isolation test failed");
                self.view.on_error(&message, error.is_transport());
                Err(error)
            }
        }
    }

    async fn send(&mut self, request: &IsolationRequest) -> Result<IsolationPanels> {
        let token = self.inflight.begin();
        let reply = run_cancellable(token, self.backend.test_step_in_isolation(request)).await;
        self.inflight.finish();
        let reply = reply?;

        if let Some(message) = reply.error {
            return Err(ChainpulseError::Application(message));
        }

        let response = reply.response.unwrap_or_default();
        Ok(IsolationPanels {
            rendered_payload: ResponseBody::from_value(reply.rendered_payload).pretty(),
            status_code: response.status_code,
            response_body: response.body(),
            extracted_data: reply.extracted_data.unwrap_or_default(),
        })
    }

    /// Check every field before any network I/O
    fn validate(&mut self, form: &StepForm) -> Result<IsolationRequest> {
        let endpoint_id = form.endpoint_id.trim();
        if endpoint_id.is_empty() {
            let message = "Select an endpoint before testing the step";
            self.view.on_alert(message);
            return Err(ChainpulseError::validation(FIELD_ENDPOINT, message));
        }

        let rules = match parse_rules(&form.data_extraction_rules) {
            Ok(rules) => rules,
            Err(error) => {
                warn!(error = %error, "extraction rules are not a JSON array");
                self.view.on_alert(&format!("Data extraction rules must be a JSON array: {}", error));
                return Err(error);
            }
        };

        let mock_context = match parse_mock_context(&form.mock_context) {
            Ok(context) => {
                self.mock_context_state = FieldState::default();
                self.view.on_field_valid(FIELD_MOCK_CONTEXT);
                context
            }
            Err(message) => {
                warn!(error = %message, "mock context is not valid JSON");
                self.mock_context_state = FieldState { invalid: true, message: Some(message.clone()) };
                self.view.on_field_invalid(FIELD_MOCK_CONTEXT, &message);
                return Err(ChainpulseError::validation(FIELD_MOCK_CONTEXT, message));
            }
        };

        Ok(IsolationRequest {
            endpoint_id: endpoint_id.to_string(),
            payload: form.payload.clone(),
            headers: form.headers.clone(),
            data_extraction_rules: rules,
            mock_context,
        })
    }
}

/// Blank text is an empty context; anything else must be a JSON object
fn parse_mock_context(text: &str) -> std::result::Result<ChainContext, String> {
    if text.trim().is_empty() {
        return Ok(ChainContext::new());
    }
    let value: JsonValue = serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))?;
    ChainContext::from_json(value).ok_or_else(|| "Mock context must be a JSON object".to_string())
}
