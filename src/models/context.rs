//! Chain context: variables accumulated across the steps of a run
//!
//! Backed by [`IndexMap`] so variables print in the order they were first
//! produced. A merged key is never removed again; a later step producing the
//! same name overwrites the value in place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Mapping from variable name to JSON value carried between steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainContext(IndexMap<String, JsonValue>);

impl ChainContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge; keys from `vars` win on collision.
    pub fn merge(&mut self, vars: &IndexMap<String, JsonValue>) {
        for (name, value) in vars {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JsonValue) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &IndexMap<String, JsonValue> {
        &self.0
    }

    /// Build a context from a JSON object value
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self(map.into_iter().collect())),
            _ => None,
        }
    }
}

impl From<IndexMap<String, JsonValue>> for ChainContext {
    fn from(map: IndexMap<String, JsonValue>) -> Self {
        Self(map)
    }
}
