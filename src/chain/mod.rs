//! Chain debugging: the step-by-step debugger and the single-step dry run

pub mod debugger;
pub mod definition;
pub mod isolation;
pub mod report;
pub mod session;

pub use debugger::{ChainDebugger, DebuggerView, ExecutionRecord, FailureKind, NullView, StepFailure, StepOutcome};
pub use definition::{load_chain, ChainDefinition, StepRef};
pub use isolation::{FieldState, IsolationPanels, IsolationView, StepForm, StepIsolationTester};
pub use report::{format_session_summary, format_session_summary_json};
pub use session::{DebugSession, DebuggerState, StepStatus};
