//! Terminal renderings of debugger and isolation-tester events

use std::io::{self, Write};

use serde_json::Value as JsonValue;

use super::{format_json_value, JsonFormatterOptions, Palette};
use crate::chain::{DebugSession, DebuggerView, ExecutionRecord, IsolationPanels, IsolationView, StepFailure, StepRef};
use crate::models::ResponseBody;

fn render_value(value: &JsonValue, pretty: bool) -> String {
    if pretty {
        format_json_value(value, &JsonFormatterOptions::default()).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

fn render_body(body: &ResponseBody, pretty: bool) -> String {
    match body {
        ResponseBody::Json(value) => render_value(value, pretty),
        ResponseBody::Text(text) => text.clone(),
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}

/// Prints debugger progress as it happens
pub struct TerminalDebuggerView<W = io::Stdout> {
    out: W,
    palette: Palette,
    pretty: bool,
    ready: bool,
}

impl TerminalDebuggerView<io::Stdout> {
    pub fn stdout(palette: Palette, pretty: bool) -> Self {
        Self::new(io::stdout(), palette, pretty)
    }
}

impl<W: Write> TerminalDebuggerView<W> {
    pub fn new(out: W, palette: Palette, pretty: bool) -> Self {
        Self { out, palette, pretty, ready: true }
    }

    /// Whether the next step may be started
    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DebuggerView for TerminalDebuggerView<W> {
    fn on_reset(&mut self, session: &DebugSession) {
        let _ = writeln!(
            self.out,
            "{} {} steps pending, context cleared",
            self.palette.info("Session reset."),
            session.steps().len()
        );
    }

    fn on_control_changed(&mut self, enabled: bool) {
        self.ready = enabled;
    }

    fn on_step_started(&mut self, index: usize, step: &StepRef) {
        let _ = writeln!(
            self.out,
            "{} Step {}: {} [{}]",
            self.palette.info("▶"),
            index + 1,
            step.display_name(),
            step.id
        );
    }

    fn on_step_succeeded(&mut self, record: &ExecutionRecord, session: &DebugSession) {
        let status = match record.status_code {
            Some(code) => format!("HTTP {}", self.palette.http_status(code)),
            None => "no status".to_string(),
        };
        let mut text = format!(
            "{} Step {} succeeded ({}, {}ms)\n",
            self.palette.success("✓"),
            record.index + 1,
            status,
            record.elapsed.as_millis()
        );

        text.push_str(&format!("  {}\n", self.palette.label("Request payload:")));
        text.push_str(&indent(&render_value(&record.request_payload, self.pretty)));
        text.push_str(&format!("  {}\n", self.palette.label("Response body:")));
        text.push_str(&indent(&render_body(&record.body, self.pretty)));

        if record.new_context_variables.is_empty() {
            text.push_str(&format!("  {}\n", self.palette.muted("No new context variables")));
        } else {
            text.push_str(&format!("  {}\n", self.palette.label("New context variables:")));
            for (key, value) in &record.new_context_variables {
                text.push_str(&format!("    {} = {}\n", self.palette.key(key), value));
            }
        }

        let context = serde_json::to_value(session.context()).unwrap_or_default();
        text.push_str(&format!("  {}\n", self.palette.label("Context:")));
        text.push_str(&indent(&render_value(&context, self.pretty)));

        let _ = self.out.write_all(text.as_bytes());
    }

    fn on_step_failed(&mut self, index: usize, step: &StepRef, failure: &StepFailure) {
        let _ = writeln!(
            self.out,
            "{} Step {} ({}) failed: {}",
            self.palette.error("✗"),
            index + 1,
            step.display_name(),
            self.palette.error(&failure.message)
        );
    }
}

/// Prints isolation-test progress and result panels
pub struct TerminalIsolationView<W = io::Stdout> {
    out: W,
    palette: Palette,
    pretty: bool,
}

impl TerminalIsolationView<io::Stdout> {
    pub fn stdout(palette: Palette, pretty: bool) -> Self {
        Self::new(io::stdout(), palette, pretty)
    }
}

impl<W: Write> TerminalIsolationView<W> {
    pub fn new(out: W, palette: Palette, pretty: bool) -> Self {
        Self { out, palette, pretty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> IsolationView for TerminalIsolationView<W> {
    fn on_busy(&mut self, busy: bool) {
        if busy {
            let _ = writeln!(self.out, "{}", self.palette.muted("Testing..."));
        }
    }

    fn on_field_invalid(&mut self, field: &str, message: &str) {
        let _ = writeln!(self.out, "{} {}: {}", self.palette.error("✗"), self.palette.key(field), message);
    }

    fn on_alert(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", self.palette.warning("!"), message);
    }

    fn on_error(&mut self, message: &str, transport: bool) {
        if transport {
            let _ = writeln!(self.out, "{} {}", self.palette.error("✗"), message);
        } else {
            let _ = writeln!(self.out, "{} Step error: {}", self.palette.error("✗"), message);
        }
    }

    fn on_result(&mut self, panels: &IsolationPanels) {
        let status = match panels.status_code {
            Some(code) => self.palette.http_status(code),
            None => self.palette.muted("-"),
        };
        let extracted = JsonValue::Object(panels.extracted_data.clone().into_iter().collect());

        let mut text = format!("{}\n", self.palette.label("Rendered payload:"));
        text.push_str(&indent(&panels.rendered_payload));
        text.push_str(&format!("{} {}\n", self.palette.label("Response status:"), status));
        text.push_str(&format!("{}\n", self.palette.label("Response body:")));
        text.push_str(&indent(&render_body(&panels.response_body, self.pretty)));
        text.push_str(&format!("{}\n", self.palette.label("Extracted data:")));
        text.push_str(&indent(&render_value(&extracted, self.pretty)));

        let _ = self.out.write_all(text.as_bytes());
    }
}
