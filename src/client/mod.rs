//! Chain backend client

pub mod backend;
pub mod inflight;

pub use backend::{ChainBackend, HttpBackend, EXECUTE_STEP_PATH, TEST_STEP_PATH, USER_AGENT_STRING};
pub use inflight::{run_cancellable, InflightHandle, InflightSlot};
