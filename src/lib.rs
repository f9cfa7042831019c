//! ChainPulse library interface
//!
//! Client-side tooling for API chains executed by a backend service: a
//! step-by-step chain debugger, a single-step dry run against a mock
//! context, and a response picker that turns response values into data
//! extraction rules.
//!
//! # Module Organization
//!
//! - [`chain`] - Chain debugger, debug session state and isolation tester
//! - [`picker`] - Response data picker and extraction-rule generation
//! - [`client`] - Backend HTTP client and request cancellation
//! - [`models`] - Context, response bodies, rules and wire types
//! - [`signals`] - Interrupt handling (was_interrupted, set_interrupted)
//! - [`errors`] - Error types (ChainpulseError, Result)
//! - [`status`] - Exit status codes (ExitStatus)
//! - [`core`] - Main execution logic

pub mod chain;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
pub mod models;
pub mod output;
pub mod picker;
pub mod signals;
pub mod status;

pub use chain::{ChainDebugger, ChainDefinition, StepIsolationTester};
pub use client::{ChainBackend, HttpBackend};
pub use errors::{ChainpulseError, Result};
pub use picker::{ResponseDataPicker, RulesField};
