//! Cancellation of in-flight backend requests
//!
//! Each component that talks to the backend owns one slot. Starting a request
//! cancels whatever the slot held before, so a stale request can never
//! complete into the state of a newer one. A cloned [`InflightHandle`] lets
//! another task (a Ctrl+C handler, a supervisor) abandon the current request.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::errors::{ChainpulseError, Result};

/// Shared view of the token of the request currently in flight
#[derive(Debug, Clone, Default)]
pub struct InflightHandle {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl InflightHandle {
    /// Cancel the request in flight, returning whether there was one
    pub fn cancel(&self) -> bool {
        let token = match self.current.lock() {
            Ok(mut current) => current.take(),
            Err(_) => None,
        };
        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .map(|current| current.as_ref().is_some_and(|t| !t.is_cancelled()))
            .unwrap_or(false)
    }

    fn replace(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        match self.current.lock() {
            Ok(mut current) => std::mem::replace(&mut *current, token),
            Err(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InflightSlot {
    handle: InflightHandle,
}

impl InflightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous request (if any) and hand out a fresh token
    pub fn begin(&mut self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.handle.replace(Some(token.clone())) {
            previous.cancel();
        }
        token
    }

    /// Drop the finished request's token
    pub fn finish(&mut self) {
        self.handle.replace(None);
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    pub fn handle(&self) -> InflightHandle {
        self.handle.clone()
    }
}

/// Run `fut` until it completes or `token` is cancelled
pub async fn run_cancellable<T, F>(token: CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ChainpulseError::Cancelled),
        result = fut => result,
    }
}
