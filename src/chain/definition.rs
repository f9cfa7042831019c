//! Chain definitions
//!
//! A chain file lists the server-side steps to debug, in order. Supports YAML
//! and TOML:
//!
//! ```yaml
//! name: checkout
//! steps:
//!   - id: 12
//!     name: login
//!   - id: 13
//!     name: add to cart
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ChainpulseError, Result};

/// Maximum chain file size (1 MB)
const MAX_CHAIN_FILE_SIZE: u64 = 1024 * 1024;

/// A chain: a fixed, ordered list of step references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub steps: Vec<StepRef>,
}

/// Reference to a server-side step definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRef {
    #[serde(deserialize_with = "deserialize_step_id")]
    pub id: String,

    /// Display name; the id when omitted
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl StepRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: String::new() }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Step ids are strings on the wire but often written as numbers in chain files
fn deserialize_step_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

impl ChainDefinition {
    /// Build an anonymous chain from step ids given on the command line
    pub fn from_step_ids<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chain = Self {
            name: "adhoc".to_string(),
            description: String::new(),
            steps: ids.into_iter().map(StepRef::new).collect(),
        };
        validate_chain_structure(&chain)?;
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Load a chain definition from a YAML or TOML file
pub fn load_chain(path: &Path) -> Result<ChainDefinition> {
    let file_size = fs::metadata(path)?.len();
    if file_size > MAX_CHAIN_FILE_SIZE {
        return Err(ChainpulseError::Chain(format!(
            "Chain file too large: {} bytes (max {} bytes)",
            file_size, MAX_CHAIN_FILE_SIZE
        )));
    }

    let content = fs::read_to_string(path)?;

    let extension = path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let chain: ChainDefinition = match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| ChainpulseError::Chain(format!("Failed to parse YAML chain: {}", e)))?,
        "toml" => toml::from_str(&content)
            .map_err(|e| ChainpulseError::Chain(format!("Failed to parse TOML chain: {}", e)))?,
        _ => serde_yaml::from_str(&content)
            .or_else(|_| toml::from_str(&content)
                .map_err(|e| ChainpulseError::Chain(format!("Failed to parse chain: {}", e))))?,
    };

    validate_chain_structure(&chain)?;
    Ok(chain)
}

fn validate_chain_structure(chain: &ChainDefinition) -> Result<()> {
    if chain.steps.is_empty() {
        return Err(ChainpulseError::Chain("Chain must have at least one step".to_string()));
    }

    for (i, step) in chain.steps.iter().enumerate() {
        if step.id.trim().is_empty() {
            return Err(ChainpulseError::Chain(format!("Step {} must have an id", i + 1)));
        }
    }

    Ok(())
}
