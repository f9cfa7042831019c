//! Output handling (terminal colors, JSON formatting, event views)

pub mod json;
pub mod terminal;
pub mod views;

pub use json::{format_json_value, JsonFormatterOptions};
pub use terminal::{colors, Palette};
pub use views::{TerminalDebuggerView, TerminalIsolationView};
