//! Expand/collapse state and the hidden-state cascade.
//!
//! Each record is either expanded or collapsed. Whether it is hidden is a
//! derived projection: a record is hidden iff it is explicitly invisible or
//! some ancestor is collapsed or invisible. A collapsed record itself stays
//! visible. Expanding a record never expands its children.

use lattice_tree_core::targets;

use super::index::FlatIndex;
use crate::error::TreeResult;

/// Applies expand/collapse transitions and keeps `hidden` flags current.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseController {
    default_collapse_depth: Option<usize>,
}

impl CollapseController {
    /// Creates a controller. Records whose level is at least
    /// `default_collapse_depth` start collapsed.
    pub fn new(default_collapse_depth: Option<usize>) -> Self {
        Self {
            default_collapse_depth,
        }
    }

    pub fn default_collapse_depth(&self) -> Option<usize> {
        self.default_collapse_depth
    }

    /// Initial collapsed state for a new record at `level`.
    pub fn initial_collapsed(&self, level: usize) -> bool {
        self.default_collapse_depth.is_some_and(|depth| level >= depth)
    }

    /// Flips the collapsed state of `id`. Returns the new state.
    pub fn toggle(&self, index: &mut FlatIndex, id: &str) -> TreeResult<bool> {
        let position = index.position_of(id)?;
        let collapsed = !index.records()[position].collapsed;
        self.apply(index, position, collapsed);
        Ok(collapsed)
    }

    /// Sets the collapsed state of `id`. Returns `true` if it changed.
    pub fn set_collapsed(&self, index: &mut FlatIndex, id: &str, collapsed: bool) -> TreeResult<bool> {
        let position = index.position_of(id)?;
        if index.records()[position].collapsed == collapsed {
            return Ok(false);
        }
        self.apply(index, position, collapsed);
        Ok(true)
    }

    /// Expands every ancestor of `id` so that it is no longer hidden by a
    /// collapsed ancestor. Returns the ids that changed, nearest first.
    pub fn expand_to(&self, index: &mut FlatIndex, id: &str) -> TreeResult<Vec<String>> {
        let position = index.position_of(id)?;
        let mut changed = Vec::new();
        for ancestor in index.ancestor_positions(position) {
            if index.records()[ancestor].collapsed {
                index.records_mut()[ancestor].collapsed = false;
                changed.push(index.records()[ancestor].id.clone());
            }
        }
        if let Some(&top) = index.ancestor_positions(position).last() {
            refresh_subtree(index, top);
        }
        Ok(changed)
    }

    /// Sets every record that has children to `collapsed`. Returns the ids
    /// that changed, in sequence order.
    pub fn set_all(&self, index: &mut FlatIndex, collapsed: bool) -> Vec<String> {
        let mut changed = Vec::new();
        for record in index.records_mut() {
            if record.has_children && record.collapsed != collapsed {
                record.collapsed = collapsed;
                changed.push(record.id.clone());
            }
        }
        refresh_all(index);
        changed
    }

    fn apply(&self, index: &mut FlatIndex, position: usize, collapsed: bool) {
        index.records_mut()[position].collapsed = collapsed;
        refresh_subtree(index, position);
        tracing::debug!(
            target: targets::VISIBILITY,
            id = %index.records()[position].id,
            collapsed,
            "collapse state changed"
        );
    }
}

/// Recomputes `hidden` for the record at `position` and its whole subtree.
pub(crate) fn refresh_subtree(index: &mut FlatIndex, position: usize) {
    let Some(bounds) = index.subtree_bounds(position) else {
        return;
    };
    let inherited = index
        .parent_position(position)
        .is_some_and(|parent| index.hides_children(parent));
    let base_level = index.records()[position].level;

    // hides[d]: whether the open record at depth d (relative) hides its children.
    let mut hides: Vec<bool> = Vec::new();
    for record in &mut index.records_mut()[bounds] {
        let depth = record.level - base_level;
        hides.truncate(depth);
        let parent_hides = match depth {
            0 => inherited,
            _ => hides.get(depth - 1).copied().unwrap_or(inherited),
        };
        record.hidden = parent_hides || !record.payload.visible;
        hides.push(record.hidden || record.collapsed);
    }
}

/// Recomputes `hidden` for every record.
pub(crate) fn refresh_all(index: &mut FlatIndex) {
    let mut hides: Vec<bool> = Vec::new();
    for record in index.records_mut() {
        hides.truncate(record.level);
        let parent_hides = record
            .level
            .checked_sub(1)
            .and_then(|depth| hides.get(depth).copied())
            .unwrap_or(false);
        record.hidden = parent_hides || !record.payload.visible;
        hides.push(record.hidden || record.collapsed);
    }
}
