//! Logging facilities for lattice-tree.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - Performance tracing hooks for bulk operations
//!
//! # Tracing Integration
//!
//! lattice-tree uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("lattice_tree::reparent=debug")
//!         .init();
//! }
//! ```

/// Span names used throughout lattice-tree for tracing.
pub mod span_names {
    /// Whole-tree construction and replacement.
    pub const BUILD: &str = "lattice_tree::build";
    /// Filter pass over every record.
    pub const FILTER: &str = "lattice_tree::filter";
    /// Rendering of the visible rows.
    pub const RENDER: &str = "lattice_tree::render";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Umbrella target.
    pub const TREE: &str = "lattice_tree";
    /// Flat index engine and node registry.
    pub const INDEX: &str = "lattice_tree::index";
    /// Selection controller.
    pub const SELECTION: &str = "lattice_tree::selection";
    /// Expand/collapse controller.
    pub const VISIBILITY: &str = "lattice_tree::visibility";
    /// Reparent/move validator.
    pub const REPARENT: &str = "lattice_tree::reparent";
    /// Filter engine.
    pub const FILTER: &str = "lattice_tree::filter";
    /// Widget facade and intent dispatch.
    pub const WIDGET: &str = "lattice_tree::widget";
    /// Signal/slot system.
    pub const SIGNAL: &str = "lattice_tree_core::signal";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of bulk operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "lattice_tree::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::util::SubscriberInitExt;

    #[test]
    fn test_perf_span() {
        let _subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .set_default();
        let _span = PerfSpan::new("test_operation");
        tracing::debug!(target: targets::TREE, records = 3, "inside perf span");
    }

    #[test]
    fn test_targets_share_prefix() {
        for target in [
            targets::INDEX,
            targets::SELECTION,
            targets::VISIBILITY,
            targets::REPARENT,
            targets::FILTER,
            targets::WIDGET,
        ] {
            assert!(target.starts_with(targets::TREE));
        }
    }
}
