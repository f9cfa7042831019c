//! State of one debugging session over a chain
//!
//! The session owns the step list, the cursor, the accumulated context and
//! the status of every step. It is plain data: the debugger drives the
//! transitions, views and tests read it.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::definition::{ChainDefinition, StepRef};
use crate::models::{ChainContext, ExecuteStepRequest};

/// Visual status of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Cancelled => "cancelled",
        }
    }
}

/// Where the debugger is: `Idle` waits at a cursor, `Exhausted` has run every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebuggerState {
    Idle { cursor: usize },
    Running { step: usize },
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct DebugSession {
    chain: ChainDefinition,
    cursor: usize,
    context: ChainContext,
    statuses: Vec<StepStatus>,
    messages: Vec<Option<String>>,
    running: bool,
}

impl DebugSession {
    pub fn new(chain: ChainDefinition) -> Self {
        let count = chain.steps.len();
        Self {
            chain,
            cursor: 0,
            context: ChainContext::new(),
            statuses: vec![StepStatus::Pending; count],
            messages: vec![None; count],
            running: false,
        }
    }

    /// Back to the first step with an empty context
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.context.clear();
        self.statuses.iter_mut().for_each(|s| *s = StepStatus::Pending);
        self.messages.iter_mut().for_each(|m| *m = None);
        self.running = false;
    }

    pub fn state(&self) -> DebuggerState {
        if self.running {
            DebuggerState::Running { step: self.cursor }
        } else if self.cursor >= self.chain.steps.len() {
            DebuggerState::Exhausted
        } else {
            DebuggerState::Idle { cursor: self.cursor }
        }
    }

    pub fn chain(&self) -> &ChainDefinition {
        &self.chain
    }

    pub fn steps(&self) -> &[StepRef] {
        &self.chain.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    pub fn status(&self, index: usize) -> Option<StepStatus> {
        self.statuses.get(index).copied()
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    /// Error message of a failed or cancelled step
    pub fn message(&self, index: usize) -> Option<&str> {
        self.messages.get(index).and_then(|m| m.as_deref())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.chain.steps.len()
    }

    pub fn current_step(&self) -> Option<&StepRef> {
        self.chain.steps.get(self.cursor)
    }

    /// Mark the step at the cursor running and build its request.
    ///
    /// `None` when a step is already running or every step has run.
    pub(crate) fn begin_step(&mut self) -> Option<ExecuteStepRequest> {
        if self.running || self.is_exhausted() {
            return None;
        }
        let step = &self.chain.steps[self.cursor];
        let request = ExecuteStepRequest {
            step_id: step.id.clone(),
            context: self.context.clone(),
        };
        self.running = true;
        self.statuses[self.cursor] = StepStatus::Running;
        self.messages[self.cursor] = None;
        Some(request)
    }

    /// Merge the step's variables and advance by exactly one
    pub(crate) fn complete_success(&mut self, vars: Option<&IndexMap<String, JsonValue>>) {
        if let Some(vars) = vars {
            self.context.merge(vars);
        }
        self.statuses[self.cursor] = StepStatus::Succeeded;
        self.running = false;
        self.cursor += 1;
    }

    /// Close out a run whose future was dropped before it finished.
    ///
    /// The step is marked cancelled and the cursor stays put; `false` when
    /// nothing was running.
    pub(crate) fn abandon_running(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.complete_failure(StepStatus::Cancelled, "Request abandoned".to_string());
        true
    }

    /// Record the failure and stay on the same step
    pub(crate) fn complete_failure(&mut self, status: StepStatus, message: String) {
        self.statuses[self.cursor] = status;
        self.messages[self.cursor] = Some(message);
        self.running = false;
    }
}
