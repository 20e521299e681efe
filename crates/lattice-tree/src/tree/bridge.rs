//! The boundary between the tree core and whatever draws it.
//!
//! The host implements [`RenderBridge`] to turn records into visual handles
//! and feeds user gestures back as [`TreeIntent`] values. Drags carry a
//! [`DragPayload`] that the host hands back unchanged on drop.

use std::collections::BTreeMap;

use super::record::TreeNodeRecord;

/// Standard MIME types used in drag payloads.
pub mod mime {
    /// Plain text MIME type.
    pub const TEXT_PLAIN: &str = "text/plain";
    /// Id of the dragged tree node.
    pub const TREE_NODE_ID: &str = "application/x-lattice-tree-node";
}

/// Data carried by a drag that started on a tree node.
///
/// A payload can hold several representations of the same data, each
/// identified by a MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragPayload {
    source_id: Option<String>,
    formats: BTreeMap<String, Vec<u8>>,
}

impl DragPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default payload for a record: its id as the drag source, its label
    /// as plain text.
    pub fn for_record(record: &TreeNodeRecord) -> Self {
        let mut payload = Self::new();
        payload.set_source_id(record.id());
        payload.set_text(record.label());
        payload
    }

    /// Id of the node the drag started on, if it came from a tree.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// Sets the source node and mirrors it under [`mime::TREE_NODE_ID`].
    pub fn set_source_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.formats
            .insert(mime::TREE_NODE_ID.to_string(), id.clone().into_bytes());
        self.source_id = Some(id);
    }

    /// Returns `true` if the payload carries plain text.
    pub fn has_text(&self) -> bool {
        self.has_format(mime::TEXT_PLAIN)
    }

    /// The plain text representation, if present and valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        self.data(mime::TEXT_PLAIN)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.set_data(mime::TEXT_PLAIN, text.into().into_bytes());
    }

    pub fn has_format(&self, mime_type: &str) -> bool {
        self.formats.contains_key(mime_type)
    }

    pub fn data(&self, mime_type: &str) -> Option<&[u8]> {
        self.formats.get(mime_type).map(Vec::as_slice)
    }

    pub fn set_data(&mut self, mime_type: impl Into<String>, data: Vec<u8>) {
        self.formats.insert(mime_type.into(), data);
    }

    /// MIME types present in the payload, sorted.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

/// Turns records into host-side visual handles.
pub trait RenderBridge {
    /// Whatever the host uses to represent a drawn row.
    type Handle;

    /// Renders one record. Called in sequence order for every rendered record.
    fn render_node(&mut self, record: &TreeNodeRecord) -> Self::Handle;
}

/// A user gesture reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIntent {
    /// Plain click: make the node the sole selection.
    Select(String),
    /// Modifier click: add or remove the node from the selection.
    ToggleSelect(String),
    /// Shift click: extend the selection from the anchor to the node.
    RangeSelect(String),
    /// Click on the expand affordance.
    ToggleCollapse(String),
    /// A drag was released over `target_id`.
    Drop {
        target_id: String,
        payload: DragPayload,
    },
    /// Inline label edit committed.
    Rename { id: String, new_text: String },
    /// Delete request for a node.
    Delete { id: String },
    /// Click on empty space.
    BackgroundClick,
    /// Context menu request on a node.
    ContextMenu { id: String },
}

impl TreeIntent {
    /// The node the gesture targets, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Select(id)
            | Self::ToggleSelect(id)
            | Self::RangeSelect(id)
            | Self::ToggleCollapse(id)
            | Self::Rename { id, .. }
            | Self::Delete { id }
            | Self::ContextMenu { id } => Some(id),
            Self::Drop { target_id, .. } => Some(target_id),
            Self::BackgroundClick => None,
        }
    }
}
