//! Core data types
//!
//! The chain context, response bodies, extraction rules and the JSON shapes
//! exchanged with the chain backend.

pub mod body;
pub mod context;
pub mod rules;
pub mod wire;

pub use body::ResponseBody;
pub use context::ChainContext;
pub use rules::{
    merge_rules, parse_rules, ExtractionRule, ExtractionSelection, MergedRules, SelectionType, SourceType,
};
pub use wire::{
    ExecuteStepRequest, ExecuteStepResponse, ExecutedRequest, ExecutedResponse, IsolationRequest,
    IsolationResponse,
};
