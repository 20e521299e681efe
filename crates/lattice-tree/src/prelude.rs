//! Prelude module for lattice-tree.
//!
//! ```
//! use lattice_tree::prelude::*;
//! ```

// ============================================================================
// Widget and configuration
// ============================================================================

pub use crate::config::TreeConfig;
pub use crate::error::{TreeError, TreeResult};
pub use crate::tree::{TreeSignals, TreeWidget};

// ============================================================================
// Records and descriptions
// ============================================================================

pub use crate::tree::{NodeBehavior, NodeInteraction, NodePayload, TreeItem, TreeNodeRecord};

// ============================================================================
// Host boundary
// ============================================================================

pub use crate::tree::{DragPayload, RenderBridge, TreeIntent};

// ============================================================================
// Controllers
// ============================================================================

pub use crate::tree::{FlatIndex, SelectionMode};

// ============================================================================
// Signals
// ============================================================================

pub use lattice_tree_core::{ConnectionId, Signal};
