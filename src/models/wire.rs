//! Request and response bodies of the chain backend API
//!
//! - `POST /api/chains/execute_step`
//! - `POST /api/chains/test_step_in_isolation`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::body::ResponseBody;
use super::context::ChainContext;

/// Body of `POST /api/chains/execute_step`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteStepRequest {
    pub step_id: String,
    pub context: ChainContext,
}

/// The request the backend actually sent for a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutedRequest {
    #[serde(default)]
    pub payload: JsonValue,
}

/// The response the backend received for a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub body: JsonValue,
}

impl ExecutedResponse {
    pub fn body(&self) -> ResponseBody {
        ResponseBody::from_value(self.body.clone())
    }
}

/// Reply of `POST /api/chains/execute_step`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteStepResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_context_variables: Option<IndexMap<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Absent or `null` when the backend failed before sending anything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ExecutedRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ExecutedResponse>,
}

/// Body of `POST /api/chains/test_step_in_isolation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationRequest {
    pub endpoint_id: String,
    pub payload: String,
    pub headers: String,
    pub data_extraction_rules: Vec<JsonValue>,
    pub mock_context: ChainContext,
}

/// Reply of `POST /api/chains/test_step_in_isolation`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsolationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub rendered_payload: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ExecutedResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<IndexMap<String, JsonValue>>,
}
