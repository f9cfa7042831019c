//! Path-addressed tree of a response body
//!
//! Nodes are stored flat in pre-order so a node index is a stable address
//! for "clicks" until the next body replaces the tree.

use serde_json::Value as JsonValue;

use super::naming::{ROOT_PATH, TEXT_PATH};
use crate::config::config::DEFAULT_COLLAPSE_THRESHOLD;
use crate::models::{ResponseBody, SelectionType};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object { len: usize },
    Array { len: usize },
    Scalar { value: JsonValue, selection_type: SelectionType },
    /// A body that was not JSON, shown whole
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub index: usize,
    /// Dot-joined keys and indices from the root; `root` or `response_text` at the top
    pub path: String,
    /// Object key or array index under the parent; `None` at the top
    pub key: Option<String>,
    pub depth: usize,
    pub parent: Option<usize>,
    pub kind: NodeKind,
    /// Children are hidden; display only, paths are unaffected
    pub collapsed: bool,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar { .. } | NodeKind::Text { .. })
    }

    /// Type recorded when the value is picked; containers are picked whole
    pub fn value_type(&self) -> SelectionType {
        match &self.kind {
            NodeKind::Scalar { selection_type, .. } => *selection_type,
            NodeKind::Text { .. } => SelectionType::String,
            NodeKind::Object { .. } => SelectionType::Object,
            NodeKind::Array { .. } => SelectionType::Array,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Object { .. } | NodeKind::Array { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTree {
    body: ResponseBody,
    nodes: Vec<TreeNode>,
    /// Whether each node's key can be picked (object members only)
    key_selectable: Vec<bool>,
}

impl ResponseTree {
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_key_selectable(&self, index: usize) -> bool {
        self.key_selectable.get(index).copied().unwrap_or(false)
    }

    pub fn find_path(&self, path: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Whether `index` is hidden under a collapsed ancestor
    pub fn is_hidden(&self, index: usize) -> bool {
        let mut parent = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(p) = parent {
            if self.nodes[p].collapsed {
                return true;
            }
            parent = self.nodes[p].parent;
        }
        false
    }

    /// Flip the collapsed flag of a container; returns the new state
    pub fn toggle_collapse(&mut self, index: usize) -> Option<bool> {
        let node = self.nodes.get_mut(index)?;
        if !node.is_container() {
            return None;
        }
        node.collapsed = !node.collapsed;
        Some(node.collapsed)
    }

    /// Resolve a dot path against the body
    pub fn resolve(&self, path: &str) -> Option<&JsonValue> {
        let value = self.body.as_json()?;
        if path == ROOT_PATH {
            return Some(value);
        }
        path.split('.').try_fold(value, |current, segment| match current {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// Builds a [`ResponseTree`] from a body
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    collapse_threshold: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self { collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD }
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nested objects with more keys than `threshold` start collapsed
    pub fn collapse_threshold(mut self, threshold: usize) -> Self {
        self.collapse_threshold = threshold;
        self
    }

    pub fn build(&self, body: ResponseBody) -> ResponseTree {
        let mut nodes = Vec::new();
        let mut key_selectable = Vec::new();

        match &body {
            ResponseBody::Text(text) => {
                nodes.push(TreeNode {
                    index: 0,
                    path: TEXT_PATH.to_string(),
                    key: None,
                    depth: 0,
                    parent: None,
                    kind: NodeKind::Text { text: text.clone() },
                    collapsed: false,
                });
                key_selectable.push(false);
            }
            ResponseBody::Json(value) => {
                self.push_value(&mut nodes, &mut key_selectable, value, None, None, 0);
            }
        }

        ResponseTree { body, nodes, key_selectable }
    }

    fn push_value(
        &self,
        nodes: &mut Vec<TreeNode>,
        key_selectable: &mut Vec<bool>,
        value: &JsonValue,
        key: Option<String>,
        parent: Option<usize>,
        depth: usize,
    ) {
        let index = nodes.len();
        let path = match (&key, parent) {
            (Some(key), Some(p)) if nodes[p].parent.is_some() => format!("{}.{}", nodes[p].path, key),
            (Some(key), _) => key.clone(),
            (None, _) => ROOT_PATH.to_string(),
        };
        let is_member = parent.is_some_and(|p| matches!(nodes[p].kind, NodeKind::Object { .. }));

        let kind = match value {
            JsonValue::Object(map) => NodeKind::Object { len: map.len() },
            JsonValue::Array(items) => NodeKind::Array { len: items.len() },
            scalar => NodeKind::Scalar {
                value: scalar.clone(),
                selection_type: SelectionType::of(scalar),
            },
        };
        let collapsed = depth > 0 && matches!(kind, NodeKind::Object { len } if len > self.collapse_threshold);

        nodes.push(TreeNode { index, path, key, depth, parent, kind, collapsed });
        key_selectable.push(is_member);

        match value {
            JsonValue::Object(map) => {
                for (k, v) in map {
                    self.push_value(nodes, key_selectable, v, Some(k.clone()), Some(index), depth + 1);
                }
            }
            JsonValue::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    self.push_value(nodes, key_selectable, v, Some(i.to_string()), Some(index), depth + 1);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: JsonValue) -> ResponseTree {
        TreeBuilder::new().build(ResponseBody::Json(value))
    }

    #[test]
    fn test_paths() {
        let tree = build(json!({"a": {"b": 1}, "items": [{"id": 5}]}));
        let paths: Vec<&str> = tree.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["root", "a", "a.b", "items", "items.0", "items.0.id"]);
        assert!(tree.is_key_selectable(1));
        assert!(!tree.is_key_selectable(4));
        assert!(tree.node(2).unwrap().is_leaf());
        assert_eq!(tree.node(0).unwrap().value_type(), SelectionType::Object);
        assert_eq!(tree.node(3).unwrap().value_type(), SelectionType::Array);
        assert!(!tree.is_key_selectable(0));
    }

    #[test]
    fn test_scalar_root_and_text() {
        let tree = build(json!(42));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(0).unwrap().path, "root");
        assert_eq!(tree.node(0).unwrap().value_type(), SelectionType::Number);

        let tree = TreeBuilder::new().build(ResponseBody::Text("OK".to_string()));
        assert_eq!(tree.node(0).unwrap().path, "response_text");
        assert_eq!(tree.node(0).unwrap().value_type(), SelectionType::String);
    }

    #[test]
    fn test_large_objects_start_collapsed() {
        let tree = build(json!({"big": {"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6}, "small": {"a": 1}}));
        let big = tree.find_path("big").unwrap();
        assert!(big.collapsed);
        assert!(!tree.find_path("small").unwrap().collapsed);
        // Collapsing hides, it does not change addressing
        let hidden = tree.find_path("big.f").unwrap();
        assert!(tree.is_hidden(hidden.index));
    }

    #[test]
    fn test_toggle_collapse() {
        let mut tree = TreeBuilder::new().collapse_threshold(1).build(ResponseBody::Json(json!({"o": {"a": 1, "b": 2}})));
        assert!(tree.node(1).unwrap().collapsed);
        assert_eq!(tree.toggle_collapse(1), Some(false));
        assert!(!tree.is_hidden(2));
        assert_eq!(tree.toggle_collapse(2), None);
    }

    #[test]
    fn test_resolve() {
        let tree = build(json!({"a": {"b": [10, 20]}}));
        assert_eq!(tree.resolve("a.b.1"), Some(&json!(20)));
        assert_eq!(tree.resolve("root"), Some(&json!({"a": {"b": [10, 20]}})));
        assert_eq!(tree.resolve("a.c"), None);
    }
}
