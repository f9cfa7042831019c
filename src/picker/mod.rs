//! Response data picker
//!
//! Shows a response as a path-addressed tree and turns picked values into
//! extraction rules. Tree building ([`TreeBuilder`]), rendering
//! ([`ResponseRenderer`]) and change notification (observers registered with
//! [`ResponseDataPicker::on_change`]) are separate concerns.
//!
//! At most one selection exists per path: picking a path again removes it.
//! Containers can be picked whole, so the root value is addressable as `root`.

pub mod naming;
pub mod render;
pub mod tree;

pub use naming::generate_variable_name;
pub use render::{ResponseRenderer, TerminalRenderer};
pub use tree::{NodeKind, ResponseTree, TreeBuilder, TreeNode};

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::errors::{ChainpulseError, Result};
use crate::models::{merge_rules, parse_rules, ExtractionRule, ExtractionSelection, MergedRules, ResponseBody, SelectionType};

/// A change to the selection list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    DataReplaced,
    Selected { path: String },
    Deselected { path: String },
    Renamed { path: String, variable_name: String },
    Removed { path: String },
    /// Rules were written to the destination field; views flash it
    Committed { added: usize, skipped: usize },
}

type Observer = Box<dyn FnMut(&PickerEvent, &[ExtractionSelection]) + Send>;

/// The destination rules field: a JSON array of extraction rules, as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesField {
    text: String,
}

impl RulesField {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Merge `rules` into the field and re-serialize it whole.
    ///
    /// The field is left untouched when its current text is not a JSON array.
    pub fn commit(&mut self, rules: &[ExtractionRule]) -> Result<MergedRules> {
        let existing = parse_rules(&self.text)?;
        let merged = merge_rules(existing, rules);
        self.text = serde_json::to_string_pretty(&merged.rules)?;
        Ok(merged)
    }
}

pub struct ResponseDataPicker<R = TerminalRenderer> {
    builder: TreeBuilder,
    renderer: R,
    tree: Option<ResponseTree>,
    selections: Vec<ExtractionSelection>,
    observers: Vec<Observer>,
}

impl Default for ResponseDataPicker<TerminalRenderer> {
    fn default() -> Self {
        Self::new(TreeBuilder::new(), TerminalRenderer::default())
    }
}

impl<R: ResponseRenderer> ResponseDataPicker<R> {
    pub fn new(builder: TreeBuilder, renderer: R) -> Self {
        Self {
            builder,
            renderer,
            tree: None,
            selections: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Register a callback run after every change to the selection list
    pub fn on_change<F>(&mut self, observer: F)
    where
        F: FnMut(&PickerEvent, &[ExtractionSelection]) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: PickerEvent) {
        for observer in &mut self.observers {
            observer(&event, &self.selections);
        }
    }

    /// Replace the displayed response.
    ///
    /// Selections are kept as a working list but lose their node binding, so
    /// nothing in the new tree shows as picked.
    pub fn set_response_data(&mut self, body: ResponseBody) {
        let tree = self.builder.build(body);
        debug!(nodes = tree.len(), kept_selections = self.selections.len(), "response data replaced");
        for selection in &mut self.selections {
            selection.node = None;
        }
        self.tree = Some(tree);
        self.notify(PickerEvent::DataReplaced);
    }

    /// Raw text: JSON when it parses, a single plain-text leaf otherwise
    pub fn set_response_text(&mut self, raw: &str) {
        self.set_response_data(ResponseBody::from_raw(raw));
    }

    pub fn set_response_value(&mut self, value: JsonValue) {
        self.set_response_data(ResponseBody::from_value(value));
    }

    pub fn tree(&self) -> Option<&ResponseTree> {
        self.tree.as_ref()
    }

    pub fn selections(&self) -> &[ExtractionSelection] {
        &self.selections
    }

    fn node(&self, index: usize) -> Result<&TreeNode> {
        self.tree
            .as_ref()
            .and_then(|t| t.node(index))
            .ok_or_else(|| ChainpulseError::Argument(format!("No node [{}] in the current response", index)))
    }

    /// Pick or unpick the value of a node, whole for containers; returns whether it is now selected
    pub fn click_value(&mut self, index: usize) -> Result<bool> {
        let node = self.node(index)?;
        let selection_type = node.value_type();
        let path = node.path.clone();
        Ok(self.toggle(path, selection_type, index))
    }

    /// Pick or unpick an object key; returns whether it is now selected
    pub fn click_key(&mut self, index: usize) -> Result<bool> {
        let node = self.node(index)?;
        let selectable = self.tree.as_ref().is_some_and(|t| t.is_key_selectable(index));
        if !selectable {
            return Err(ChainpulseError::Argument(format!("Node [{}] has no selectable key", index)));
        }
        let path = node.path.clone();
        Ok(self.toggle(path, SelectionType::Key, index))
    }

    /// Pick by path: the key for object members that are containers, the value otherwise
    pub fn toggle_path(&mut self, path: &str) -> Result<bool> {
        let tree = self.tree.as_ref();
        let node = tree
            .and_then(|t| t.find_path(path))
            .ok_or_else(|| ChainpulseError::Argument(format!("Path '{}' is not in the current response", path)))?;
        let index = node.index;
        let by_key = node.is_container() && tree.is_some_and(|t| t.is_key_selectable(index));
        if by_key {
            self.click_key(index)
        } else {
            self.click_value(index)
        }
    }

    fn toggle(&mut self, path: String, selection_type: SelectionType, node: usize) -> bool {
        if let Some(pos) = self.selections.iter().position(|s| s.path == path) {
            self.selections.remove(pos);
            debug!(path = %path, "selection removed");
            self.notify(PickerEvent::Deselected { path });
            false
        } else {
            let variable_name = generate_variable_name(&path);
            debug!(path = %path, variable = %variable_name, "selection added");
            self.selections.push(ExtractionSelection {
                path: path.clone(),
                selection_type,
                variable_name,
                node: Some(node),
            });
            self.notify(PickerEvent::Selected { path });
            true
        }
    }

    /// Edit the variable name of selection `position`; the path is unchanged
    pub fn rename(&mut self, position: usize, variable_name: &str) -> Result<()> {
        let selection = self.selections
            .get_mut(position)
            .ok_or_else(|| ChainpulseError::Argument(format!("No selection #{}", position + 1)))?;
        selection.variable_name = variable_name.trim().to_string();
        let event = PickerEvent::Renamed {
            path: selection.path.clone(),
            variable_name: selection.variable_name.clone(),
        };
        self.notify(event);
        Ok(())
    }

    /// Drop selection `position`
    pub fn remove(&mut self, position: usize) -> Result<ExtractionSelection> {
        if position >= self.selections.len() {
            return Err(ChainpulseError::Argument(format!("No selection #{}", position + 1)));
        }
        let removed = self.selections.remove(position);
        self.notify(PickerEvent::Removed { path: removed.path.clone() });
        Ok(removed)
    }

    /// Current value at `path`, for previewing what a rule would extract
    pub fn preview(&self, path: &str) -> Option<&JsonValue> {
        self.tree.as_ref().and_then(|t| t.resolve(path))
    }

    pub fn toggle_collapse(&mut self, index: usize) -> Result<bool> {
        self.tree
            .as_mut()
            .and_then(|t| t.toggle_collapse(index))
            .ok_or_else(|| ChainpulseError::Argument(format!("Node [{}] cannot be collapsed", index)))
    }

    /// Selections as extraction rules, in selection order
    pub fn rules(&self) -> Vec<ExtractionRule> {
        self.selections.iter().map(ExtractionSelection::to_rule).collect()
    }

    /// Write the current selections into the destination rules field
    pub fn commit(&mut self, field: &mut RulesField) -> Result<MergedRules> {
        let merged = field.commit(&self.rules())?;
        info!(added = merged.added, skipped = merged.skipped, total = merged.rules.len(), "extraction rules committed");
        self.notify(PickerEvent::Committed { added: merged.added, skipped: merged.skipped });
        Ok(merged)
    }

    pub fn render(&self) -> String {
        match &self.tree {
            Some(tree) => self.renderer.render_tree(tree, &self.selections),
            None => String::new(),
        }
    }

    /// The editable selection list
    pub fn render_selections(&self) -> String {
        self.renderer.render_selections(&self.selections, self.tree.as_ref())
    }
}
