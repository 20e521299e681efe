//! Flat hierarchical index and the controllers that keep it consistent.
//!
//! The whole hierarchy lives in one pre-ordered sequence of records, each
//! tagged with its depth. Structure is derived by scanning; selection and
//! visibility cascade along the implicit parent/child edges.
//!
//! # Core Types
//!
//! - `FlatIndex`: the record sequence and its structural scans
//! - `TreeNodeRecord` / `NodePayload`: one entry and the caller data it carries
//! - `TreeItem`: hierarchical description used to build a tree
//!
//! # Controllers
//!
//! - `CollapseController`: expand/collapse and the hidden cascade
//! - `SelectionController`: single, toggle and range selection with
//!   semi-selection of ancestors
//! - `MoveValidator`: cycle-safe subtree reparenting
//! - `FilterEngine`: predicate marking
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐  TreeIntent   ┌────────────┐   controllers   ┌───────────┐
//! │ RenderBridge │──────────────>│ TreeWidget │────────────────>│ FlatIndex │
//! │   (host)     │<──────────────│            │                 │           │
//! └──────────────┘  TreeSignals  └────────────┘                 └───────────┘
//! ```

mod bridge;
mod debug;
mod filter;
mod index;
mod record;
mod registry;
mod reparent;
mod selection;
mod visibility;
mod widget;

pub use bridge::{mime, DragPayload, RenderBridge, TreeIntent};
pub use debug::{IndexDebug, TreeFormatOptions, TreeStyle};
pub use filter::{FilterEngine, FilterFn};
pub use index::FlatIndex;
pub use record::{NodeBehavior, NodeInteraction, NodePayload, TreeItem, TreeNodeRecord};
pub use reparent::{MoveOutcome, MoveValidator};
pub use selection::{SelectionChange, SelectionController, SelectionMode};
pub use visibility::CollapseController;
pub use widget::{TreeSignals, TreeWidget};
