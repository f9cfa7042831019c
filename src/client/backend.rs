//! HTTP client for the chain backend
//!
//! The backend owns endpoint storage, chain persistence and the execution
//! engine. This module only knows the two JSON endpoints the debugger and the
//! isolation tester call.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use url::Url;

use crate::config::ServerConfig;
use crate::errors::{ChainpulseError, Result};
use crate::models::{ExecuteStepRequest, ExecuteStepResponse, IsolationRequest, IsolationResponse};

pub const USER_AGENT_STRING: &str = concat!("ChainPulse/", env!("CARGO_PKG_VERSION"));

pub const EXECUTE_STEP_PATH: &str = "api/chains/execute_step";
pub const TEST_STEP_PATH: &str = "api/chains/test_step_in_isolation";

/// The two backend operations the client side depends on
pub trait ChainBackend {
    /// Execute one step of a chain with the accumulated context.
    ///
    /// A reply carrying an `error` field is returned as `Ok`; interpreting it
    /// is the caller's job.
    fn execute_step(
        &self,
        request: &ExecuteStepRequest,
    ) -> impl Future<Output = Result<ExecuteStepResponse>> + Send;

    /// Dry-run a single step configuration against a mock context.
    ///
    /// Any non-2xx status is an error regardless of the body.
    fn test_step_in_isolation(
        &self,
        request: &IsolationRequest,
    ) -> impl Future<Output = Result<IsolationResponse>> + Send;
}

/// [`ChainBackend`] over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl HttpBackend {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT_STRING)
            .build()
            .map_err(ChainpulseError::Request)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ChainpulseError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ChainpulseError::Config(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url.clone()),
            headers,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// POST `body` as JSON and return the status plus the raw reply text
    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<(StatusCode, String)> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "POST");

        let mut request = self.client
            .post(url)
            .headers(self.headers.clone())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        debug!(status = status.as_u16(), bytes = text.len(), "reply received");
        Ok((status, text))
    }

    fn map_send_error(&self, error: reqwest::Error) -> ChainpulseError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => ChainpulseError::Timeout(timeout.as_secs_f64()),
            _ => ChainpulseError::Request(error),
        }
    }
}

impl ChainBackend for HttpBackend {
    async fn execute_step(&self, request: &ExecuteStepRequest) -> Result<ExecuteStepResponse> {
        let (status, text) = self.post_json(EXECUTE_STEP_PATH, request).await?;

        if !status.is_success() {
            // An error reply that still explains itself is an application error
            if let Ok(reply) = serde_json::from_str::<ExecuteStepResponse>(&text) {
                if reply.error.is_some() {
                    return Ok(reply);
                }
            }
            warn!(status = status.as_u16(), step_id = %request.step_id, "execute_step failed");
            return Err(transport_error(status));
        }

        parse_reply(&text)
    }

    async fn test_step_in_isolation(&self, request: &IsolationRequest) -> Result<IsolationResponse> {
        let (status, text) = self.post_json(TEST_STEP_PATH, request).await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint_id = %request.endpoint_id, "test_step_in_isolation failed");
            return Err(transport_error(status));
        }

        parse_reply(&text)
    }
}

fn transport_error(status: StatusCode) -> ChainpulseError {
    ChainpulseError::Transport {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| ChainpulseError::MalformedResponse(format!("reply is not JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ChainpulseError::MalformedResponse("reply is not a JSON object".to_string()));
    }
    serde_json::from_value(value)
        .map_err(|e| ChainpulseError::MalformedResponse(format!("unexpected reply shape: {}", e)))
}

/// `Url::join` drops the last path segment unless the base ends with `/`
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
