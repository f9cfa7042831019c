//! Interrupt/signal handling for graceful shutdown
//!
//! Provides global state for Ctrl+C handling across the application. The
//! interactive commands register their in-flight handle here so that Ctrl+C
//! during a backend call abandons the call instead of the whole program.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::client::InflightHandle;

/// Global flag for Ctrl+C interrupt handling
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Handle of the component whose requests Ctrl+C should abandon
static ACTIVE_REQUEST: Lazy<Mutex<Option<InflightHandle>>> = Lazy::new(|| Mutex::new(None));

/// Check if the application was interrupted (Ctrl+C pressed)
#[inline]
pub fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Set the interrupted flag (called from signal handler)
#[inline]
pub fn set_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Reset the interrupted flag
#[inline]
pub fn reset_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Register the handle whose in-flight request Ctrl+C should abandon
pub fn register_request(handle: InflightHandle) {
    if let Ok(mut active) = ACTIVE_REQUEST.lock() {
        *active = Some(handle);
    }
}

/// Forget the registered handle
pub fn clear_request() {
    if let Ok(mut active) = ACTIVE_REQUEST.lock() {
        *active = None;
    }
}

/// Cancel the registered request, returning whether one was in flight
pub fn cancel_active_request() -> bool {
    match ACTIVE_REQUEST.lock() {
        Ok(active) => active.as_ref().is_some_and(|handle| handle.cancel()),
        Err(_) => false,
    }
}
