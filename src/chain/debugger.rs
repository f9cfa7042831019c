//! Step-by-step chain debugger
//!
//! Advances a single cursor through the steps of a chain. Each step is sent to
//! the backend together with the context accumulated so far; on success the
//! returned variables are merged in and the cursor moves forward by one. On any
//! failure the cursor and the context stay exactly where they were.
//!
//! ```text
//! idle(i) --run--> running(i) --ok--> idle(i+1) ... exhausted
//!                            \--err-> idle(i)
//! ```

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::definition::{ChainDefinition, StepRef};
use super::session::{DebugSession, StepStatus};
use crate::client::inflight::run_cancellable;
use crate::client::{ChainBackend, InflightHandle, InflightSlot};
use crate::errors::ChainpulseError;
use crate::models::ResponseBody;

/// What one successful step run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    pub index: usize,
    pub step: StepRef,
    pub request_payload: JsonValue,
    pub status_code: Option<u16>,
    pub body: ResponseBody,
    pub new_context_variables: IndexMap<String, JsonValue>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend reported an `error` for the step
    Application,
    /// HTTP status, network or malformed reply
    Transport,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    fn from_error(error: &ChainpulseError) -> Self {
        match error {
            ChainpulseError::Cancelled => Self {
                kind: FailureKind::Cancelled,
                message: "Request cancelled".to_string(),
            },
            ChainpulseError::Application(message) => Self {
                kind: FailureKind::Application,
                message: message.clone(),
            },
            other => Self {
                kind: FailureKind::Transport,
                message: format!("An unexpected error occurred: {}", other),
            },
        }
    }
}

/// Result of one `run_next_step` call
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Succeeded(ExecutionRecord),
    Failed { index: usize, failure: StepFailure },
    /// Every step has already run; nothing was sent
    Exhausted,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded(_))
    }
}

/// Observer of debugger progress. Every method defaults to doing nothing.
pub trait DebuggerView {
    fn on_reset(&mut self, _session: &DebugSession) {}

    /// The "run next step" control became enabled or disabled
    fn on_control_changed(&mut self, _enabled: bool) {}

    fn on_step_started(&mut self, _index: usize, _step: &StepRef) {}

    fn on_step_succeeded(&mut self, _record: &ExecutionRecord, _session: &DebugSession) {}

    fn on_step_failed(&mut self, _index: usize, _step: &StepRef, _failure: &StepFailure) {}
}

/// View that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl DebuggerView for NullView {}

pub struct ChainDebugger<B, V> {
    backend: B,
    session: DebugSession,
    view: V,
    inflight: InflightSlot,
}

impl<B: ChainBackend> ChainDebugger<B, NullView> {
    pub fn headless(backend: B, chain: ChainDefinition) -> Self {
        Self::new(backend, chain, NullView)
    }
}

impl<B: ChainBackend, V: DebuggerView> ChainDebugger<B, V> {
    pub fn new(backend: B, chain: ChainDefinition, view: V) -> Self {
        Self {
            backend,
            session: DebugSession::new(chain),
            view,
            inflight: InflightSlot::new(),
        }
    }

    pub fn session(&self) -> &DebugSession {
        &self.session
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

    /// Handle that abandons the request in flight from another task
    pub fn cancel_handle(&self) -> InflightHandle {
        self.inflight.handle()
    }

    /// Clear context, cursor and step statuses. No network call.
    pub fn reset_session(&mut self) {
        self.inflight.finish();
        self.session.reset();
        info!(chain = %self.session.chain().name, "debug session reset");
        self.view.on_reset(&self.session);
        self.view.on_control_changed(true);
    }

    /// Run the step under the cursor.
    ///
    /// Exclusive access for the whole call means a second submission for the
    /// same cursor position cannot start while this one is pending.
    pub async fn run_next_step(&mut self) -> StepOutcome {
        // Still marked running only if an earlier call was dropped mid-request
        if self.session.abandon_running() {
            warn!(step = self.session.cursor() + 1, "previous run was abandoned, running the step again");
            self.inflight.finish();
            self.view.on_control_changed(true);
        }

        let Some(request) = self.session.begin_step() else {
            debug!("run_next_step ignored, chain exhausted");
            return StepOutcome::Exhausted;
        };
        let index = self.session.cursor();
        let step = self.session.steps()[index].clone();

        info!(step = index + 1, step_id = %step.id, context_vars = request.context.len(), "running step");
        self.view.on_control_changed(false);
        self.view.on_step_started(index, &step);

        let token = self.inflight.begin();
        let started = Instant::now();
        let result = run_cancellable(token, self.backend.execute_step(&request)).await;
        let elapsed = started.elapsed();
        self.inflight.finish();

        let outcome = match result {
            Ok(reply) => match reply.error {
                Some(message) => {
                    let failure = StepFailure { kind: FailureKind::Application, message };
                    self.fail(index, &step, failure)
                }
                None => {
                    self.session.complete_success(reply.new_context_variables.as_ref());
                    let request = reply.request.unwrap_or_default();
                    let response = reply.response.unwrap_or_default();
                    let record = ExecutionRecord {
                        index,
                        step,
                        request_payload: request.payload,
                        status_code: response.status_code,
                        body: ResponseBody::from_value(response.body),
                        new_context_variables: reply.new_context_variables.unwrap_or_default(),
                        elapsed,
                    };
                    info!(
                        step = index + 1,
                        status = ?record.status_code,
                        new_vars = record.new_context_variables.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "step succeeded"
                    );
                    self.view.on_step_succeeded(&record, &self.session);
                    StepOutcome::Succeeded(record)
                }
            },
            Err(error) => {
                let failure = StepFailure::from_error(&error);
                self.fail(index, &step, failure)
            }
        };

        self.view.on_control_changed(true);
        outcome
    }

    fn fail(&mut self, index: usize, step: &StepRef, failure: StepFailure) -> StepOutcome {
        let status = match failure.kind {
            FailureKind::Cancelled => StepStatus::Cancelled,
            _ => StepStatus::Failed,
        };
        warn!(step = index + 1, step_id = %step.id, kind = ?failure.kind, error = %failure.message, "step failed");
        self.session.complete_failure(status, failure.message.clone());
        self.view.on_step_failed(index, step, &failure);
        StepOutcome::Failed { index, failure }
    }

    /// Run steps until the chain is exhausted or a step fails
    pub async fn run_to_end(&mut self) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        while !self.session.is_exhausted() {
            let outcome = self.run_next_step().await;
            let stop = !outcome.is_success();
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::models::{ExecuteStepRequest, ExecuteStepResponse, IsolationRequest, IsolationResponse};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend that replays canned replies and records what it was sent
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ExecuteStepResponse>>>,
        seen: Mutex<Vec<ExecuteStepRequest>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Result<ExecuteStepResponse>>) -> Self {
            Self { replies: Mutex::new(replies.into()), seen: Mutex::default() }
        }

        fn seen(&self) -> Vec<ExecuteStepRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ChainBackend for ScriptedBackend {
        async fn execute_step(&self, request: &ExecuteStepRequest) -> Result<ExecuteStepResponse> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ExecuteStepResponse::default()))
        }

        async fn test_step_in_isolation(&self, _request: &IsolationRequest) -> Result<IsolationResponse> {
            unreachable!("debugger never dry-runs steps")
        }
    }

    #[derive(Default)]
    struct RecordingView {
        events: Vec<String>,
    }

    impl DebuggerView for RecordingView {
        fn on_reset(&mut self, _session: &DebugSession) {
            self.events.push("reset".to_string());
        }
        fn on_control_changed(&mut self, enabled: bool) {
            self.events.push(format!("control:{}", enabled));
        }
        fn on_step_started(&mut self, index: usize, _step: &StepRef) {
            self.events.push(format!("started:{}", index));
        }
        fn on_step_succeeded(&mut self, record: &ExecutionRecord, _session: &DebugSession) {
            self.events.push(format!("succeeded:{}", record.index));
        }
        fn on_step_failed(&mut self, index: usize, _step: &StepRef, failure: &StepFailure) {
            self.events.push(format!("failed:{}:{}", index, failure.message));
        }
    }

    fn reply(value: JsonValue) -> Result<ExecuteStepResponse> {
        Ok(serde_json::from_value(value).unwrap())
    }

    fn chain(n: usize) -> ChainDefinition {
        ChainDefinition::from_step_ids((1..=n).map(|i| format!("s{}", i))).unwrap()
    }

    #[tokio::test]
    async fn test_successful_steps_merge_context_in_order() {
        let backend = ScriptedBackend::with(vec![
            reply(json!({"new_context_variables": {"token": "abc", "n": 1}, "response": {"status_code": 200, "body": {}}})),
            reply(json!({"new_context_variables": {"n": 2}})),
        ]);
        let mut debugger = ChainDebugger::headless(backend, chain(3));

        assert!(debugger.run_next_step().await.is_success());
        assert!(debugger.run_next_step().await.is_success());

        assert_eq!(debugger.session().cursor(), 2);
        assert_eq!(serde_json::to_value(debugger.session().context()).unwrap(), json!({"token": "abc", "n": 2}));

        let seen = debugger.backend().seen();
        assert!(seen[0].context.is_empty());
        assert_eq!(seen[1].context.get("token"), Some(&json!("abc")));
    }

    #[tokio::test]
    async fn test_application_error_keeps_cursor_and_context() {
        let backend = ScriptedBackend::with(vec![
            reply(json!({"new_context_variables": {"token": "abc"}})),
            reply(json!({"error": "bad token"})),
        ]);
        let mut debugger = ChainDebugger::new(backend, chain(3), RecordingView::default());

        debugger.run_next_step().await;
        let before = debugger.session().context().clone();
        let outcome = debugger.run_next_step().await;

        match outcome {
            StepOutcome::Failed { index, failure } => {
                assert_eq!(index, 1);
                assert_eq!(failure.kind, FailureKind::Application);
                assert_eq!(failure.message, "bad token");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(debugger.session().cursor(), 1);
        assert_eq!(debugger.session().context(), &before);
        assert_eq!(debugger.session().status(1), Some(StepStatus::Failed));
        assert_eq!(
            debugger.view().events,
            vec![
                "control:false", "started:0", "succeeded:0", "control:true",
                "control:false", "started:1", "failed:1:bad token", "control:true",
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_generic_failure() {
        let backend = ScriptedBackend::with(vec![Err(ChainpulseError::Transport {
            status: 500,
            reason: "Internal Server Error".to_string(),
        })]);
        let mut debugger = ChainDebugger::headless(backend, chain(1));

        let outcome = debugger.run_next_step().await;
        let StepOutcome::Failed { failure, .. } = outcome else { panic!("expected failure") };
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.message.starts_with("An unexpected error occurred"));
        assert_eq!(debugger.session().cursor(), 0);
        assert!(!debugger.session().is_running());
    }

    #[tokio::test]
    async fn test_exhausted_is_noop() {
        let backend = ScriptedBackend::with(vec![reply(json!({}))]);
        let mut debugger = ChainDebugger::headless(backend, chain(1));

        assert!(debugger.run_next_step().await.is_success());
        assert_eq!(debugger.run_next_step().await, StepOutcome::Exhausted);
        assert_eq!(debugger.backend().seen().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_session() {
        let backend = ScriptedBackend::with(vec![reply(json!({"new_context_variables": {"a": 1}}))]);
        let mut debugger = ChainDebugger::new(backend, chain(2), RecordingView::default());
        debugger.run_next_step().await;

        debugger.reset_session();
        assert_eq!(debugger.session().cursor(), 0);
        assert!(debugger.session().context().is_empty());
        assert_eq!(debugger.session().status(0), Some(StepStatus::Pending));
        assert!(debugger.view().events.ends_with(&["reset".to_string(), "control:true".to_string()]));
    }

    #[tokio::test]
    async fn test_run_to_end_stops_at_failure() {
        let backend = ScriptedBackend::with(vec![
            reply(json!({})),
            reply(json!({"error": "nope"})),
        ]);
        let mut debugger = ChainDebugger::headless(backend, chain(3));

        let outcomes = debugger.run_to_end().await;
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[1].is_success());
        assert_eq!(debugger.session().cursor(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_stays_on_step() {
        struct HangingBackend;

        impl ChainBackend for HangingBackend {
            async fn execute_step(&self, _request: &ExecuteStepRequest) -> Result<ExecuteStepResponse> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(ExecuteStepResponse::default())
            }

            async fn test_step_in_isolation(&self, _request: &IsolationRequest) -> Result<IsolationResponse> {
                unreachable!()
            }
        }

        let mut debugger = ChainDebugger::headless(HangingBackend, chain(2));
        let handle = debugger.cancel_handle();
        tokio::spawn(async move {
            while !handle.cancel() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let outcome = debugger.run_next_step().await;
        let StepOutcome::Failed { failure, .. } = outcome else { panic!("expected failure") };
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert_eq!(debugger.session().status(0), Some(StepStatus::Cancelled));
        assert_eq!(debugger.session().cursor(), 0);
    }

    #[tokio::test]
    async fn test_dropped_run_does_not_exhaust_chain() {
        /// Hangs on the first call, answers every later one
        #[derive(Default)]
        struct SlowFirstBackend {
            calls: AtomicUsize,
        }

        impl ChainBackend for SlowFirstBackend {
            async fn execute_step(&self, _request: &ExecuteStepRequest) -> Result<ExecuteStepResponse> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok(serde_json::from_value(json!({"new_context_variables": {"token": "abc"}})).unwrap())
            }

            async fn test_step_in_isolation(&self, _request: &IsolationRequest) -> Result<IsolationResponse> {
                unreachable!()
            }
        }

        let mut debugger = ChainDebugger::new(SlowFirstBackend::default(), chain(2), RecordingView::default());
        let dropped = tokio::time::timeout(Duration::from_millis(20), debugger.run_next_step()).await;
        assert!(dropped.is_err());
        assert!(debugger.session().is_running());

        let outcome = debugger.run_next_step().await;
        assert!(outcome.is_success(), "expected the step to run again, got {:?}", outcome);
        assert_eq!(debugger.session().cursor(), 1);
        assert_eq!(debugger.backend().calls.load(Ordering::SeqCst), 2);
        assert!(!debugger.inflight.is_active());
    }
}
