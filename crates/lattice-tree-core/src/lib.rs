//! Core plumbing for lattice-tree.
//!
//! This crate provides the pieces the tree widget is wired together with:
//!
//! - **Signal/Slot System**: Type-safe, synchronous notification of structural events
//! - **Logging**: Subsystem targets and performance spans on top of `tracing`
//!
//! # Signal/Slot Example
//!
//! ```
//! use lattice_tree_core::Signal;
//!
//! // Create a signal that carries the id of the item that changed
//! let item_removed = Signal::<String>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = item_removed.connect(|id| {
//!     println!("Removed: {}", id);
//! });
//!
//! // Emit the signal
//! item_removed.emit("node-1".to_string());
//!
//! // Disconnect when done
//! item_removed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use logging::{targets, PerfSpan};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
