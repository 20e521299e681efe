//! lattice-tree - a tree widget core built on a flat, level-tagged index.
//!
//! The crate keeps a whole hierarchy in one pre-ordered sequence and derives
//! every structural query from it. Selection, semi-selection, collapse and
//! filtering cascade along the implicit edges, and every mutation either
//! applies completely or leaves the tree untouched.
//!
//! # Example
//!
//! ```
//! use lattice_tree::prelude::*;
//!
//! let mut tree = TreeWidget::from_items(
//!     vec![TreeItem::new("Root").with_id("root")
//!         .child(TreeItem::new("A").with_id("a").child(TreeItem::new("A1").with_id("a1")))
//!         .child(TreeItem::new("B").with_id("b"))],
//!     TreeConfig::default(),
//! );
//!
//! assert!(matches!(tree.move_item("a", "a1"), Err(TreeError::CycleRejected { .. })));
//! tree.move_item("a1", "b").unwrap();
//! assert_eq!(tree.get_item("a1").unwrap().level(), 2);
//! ```

pub use lattice_tree_core::*;

pub mod config;
mod error;
pub mod prelude;
pub mod tree;

pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
