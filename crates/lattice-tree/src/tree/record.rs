//! Node records and the hierarchical descriptions they are built from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::bridge::DragPayload;

/// Something that happened to a node, reported to its [`NodeBehavior`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInteraction {
    /// The node became the sole selection.
    Selected,
    /// The node's label changed.
    Renamed { old: String, new: String },
    /// The node was collapsed (`true`) or expanded (`false`).
    CollapseChanged(bool),
    /// A context menu was requested on the node.
    ContextMenu,
}

/// Optional per-node capabilities.
///
/// A payload may carry an implementation of this trait to customise drag
/// payloads or to observe interactions on that particular node. Both methods
/// have no-op defaults.
pub trait NodeBehavior: Send + Sync {
    /// Produces the payload carried by a drag that starts on this node.
    ///
    /// Returning `None` falls back to [`DragPayload::for_record`].
    fn drag_payload(&self, _record: &TreeNodeRecord) -> Option<DragPayload> {
        None
    }

    /// Called after an interaction on this node has been applied.
    fn on_interaction(&self, _record: &TreeNodeRecord, _interaction: &NodeInteraction) {}
}

/// Caller data attached to a record.
#[derive(Clone)]
pub struct NodePayload {
    /// Display text.
    pub label: String,
    /// Arbitrary extra attributes.
    pub attributes: BTreeMap<String, String>,
    /// Explicit visibility. An invisible node hides its whole subtree.
    pub visible: bool,
    /// Optional capability object.
    pub behavior: Option<Arc<dyn NodeBehavior>>,
}

impl NodePayload {
    /// Creates a visible payload with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attributes: BTreeMap::new(),
            visible: true,
            behavior: None,
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets explicit visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Attaches a behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn NodeBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }
}

impl Default for NodePayload {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for NodePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePayload")
            .field("label", &self.label)
            .field("attributes", &self.attributes)
            .field("visible", &self.visible)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

/// One entry of the flat index.
///
/// The record's position is never stored; it is always its index in the
/// owning [`FlatIndex`](super::FlatIndex).
#[derive(Debug, Clone)]
pub struct TreeNodeRecord {
    pub(crate) id: String,
    pub(crate) parent_id: Option<String>,
    pub(crate) level: usize,
    pub(crate) payload: NodePayload,
    pub(crate) selected: bool,
    /// Number of selected strict descendants.
    pub(crate) selected_descendants: usize,
    pub(crate) collapsed: bool,
    pub(crate) hidden: bool,
    pub(crate) filtered: bool,
    pub(crate) has_children: bool,
}

impl TreeNodeRecord {
    /// Creates a detached record. Level and parent are assigned on insertion.
    pub fn new(id: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            level: 0,
            payload,
            selected: false,
            selected_descendants: 0,
            collapsed: false,
            hidden: false,
            filtered: false,
            has_children: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Depth of the record; top-level records are at level 0.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn label(&self) -> &str {
        &self.payload.label
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Returns `true` if at least one strict descendant is selected.
    pub fn is_semi_selected(&self) -> bool {
        self.selected_descendants > 0
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns `true` if an ancestor is collapsed or invisible, or the record
    /// itself is explicitly invisible.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns `true` if the active filter rejected this record.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Whether the record should currently produce a rendered row.
    pub fn is_rendered(&self) -> bool {
        !self.hidden && !self.filtered && self.payload.visible
    }

    /// The expand affordance: whether any record is nested under this one.
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    pub(crate) fn notify(&self, interaction: NodeInteraction) {
        if let Some(behavior) = &self.payload.behavior {
            behavior.on_interaction(self, &interaction);
        }
    }
}

/// A hierarchical description used to build or replace a whole tree.
///
/// Descriptions can be built in code or deserialized from JSON:
///
/// ```
/// use lattice_tree::tree::TreeItem;
///
/// let root = TreeItem::new("Root")
///     .with_id("root")
///     .child(TreeItem::new("A").with_id("a").child(TreeItem::new("A1")));
/// assert_eq!(root.children.len(), 1);
///
/// let parsed = TreeItem::from_json(r#"{"id": "root", "label": "Root", "children": []}"#).unwrap();
/// assert_eq!(parsed.label, "Root");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeItem {
    /// Explicit id; the registry assigns one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Explicit initial collapsed state, overriding the configured depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeItem>,
    #[serde(skip)]
    pub behavior: Option<Arc<dyn NodeBehavior>>,
}

fn default_visible() -> bool {
    true
}

impl Default for TreeItem {
    fn default() -> Self {
        Self::new("")
    }
}

impl TreeItem {
    /// Creates a visible item with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            attributes: BTreeMap::new(),
            visible: true,
            collapsed: None,
            children: Vec::new(),
            behavior: None,
        }
    }

    /// Parses a description from JSON.
    pub fn from_json(source: &str) -> crate::TreeResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Serializes the description to pretty-printed JSON.
    pub fn to_json(&self) -> crate::TreeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn NodeBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Appends a child and returns `self` for chaining.
    pub fn child(mut self, child: TreeItem) -> Self {
        self.children.push(child);
        self
    }

    /// Splits the item into its payload and children.
    pub(crate) fn into_parts(self) -> (Option<String>, NodePayload, Option<bool>, Vec<TreeItem>) {
        let payload = NodePayload {
            label: self.label,
            attributes: self.attributes,
            visible: self.visible,
            behavior: self.behavior,
        };
        (self.id, payload, self.collapsed, self.children)
    }
}

impl fmt::Debug for TreeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeItem")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("visible", &self.visible)
            .field("children", &self.children)
            .finish()
    }
}
