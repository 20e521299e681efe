//! Selection controller for the flat tree index.
//!
//! Tracks the selection mode and the anchor used for range selection. Own
//! selection flags live on the records; every flip goes through
//! [`FlatIndex::set_selected`], which walks the ancestor chain so that
//! semi-selection stays exact after each mutation.
//!
//! # Example
//!
//! ```
//! use lattice_tree::tree::{FlatIndex, NodePayload, SelectionController, SelectionMode, TreeNodeRecord};
//!
//! let mut index = FlatIndex::new();
//! index.insert_at(TreeNodeRecord::new("root", NodePayload::new("Root")), None, None).unwrap();
//! index.insert_at(TreeNodeRecord::new("a", NodePayload::new("A")), Some("root"), None).unwrap();
//!
//! let mut selection = SelectionController::new(SelectionMode::Single);
//! selection.select(&mut index, "a").unwrap();
//! assert!(index.get_by_id("root").unwrap().is_semi_selected());
//! ```

use serde::{Deserialize, Serialize};

use lattice_tree_core::targets;

use super::index::FlatIndex;
use crate::error::{TreeError, TreeResult};

/// Selection behavior mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// At most one record is selected at a time (default).
    #[default]
    Single,
    /// Any subset of records may be selected.
    Multi,
}

/// Ids whose own selection flag changed during one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub selected: Vec<String>,
    pub deselected: Vec<String>,
}

impl SelectionChange {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

/// Applies selection gestures to a [`FlatIndex`].
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    mode: SelectionMode,
    /// Most recently selected record, origin of range selections.
    anchor: Option<String>,
}

impl SelectionController {
    pub fn new(mode: SelectionMode) -> Self {
        Self { mode, anchor: None }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switches the mode. Entering single mode with several records selected
    /// keeps only the anchor, or the first selected record when the anchor
    /// is not selected.
    pub fn set_mode(&mut self, index: &mut FlatIndex, mode: SelectionMode) -> SelectionChange {
        self.mode = mode;
        let mut change = SelectionChange::default();
        if mode != SelectionMode::Single {
            return change;
        }

        let selected: Vec<usize> = index
            .iter()
            .enumerate()
            .filter(|(_, r)| r.selected)
            .map(|(pos, _)| pos)
            .collect();
        if selected.len() <= 1 {
            return change;
        }

        let anchor = self.anchor.as_deref().and_then(|anchor| index.index_of(anchor));
        let keep = anchor
            .filter(|pos| selected.contains(pos))
            .unwrap_or(selected[0]);
        for pos in selected {
            if pos != keep && index.set_selected(pos, false) {
                change.deselected.push(index.records()[pos].id.clone());
            }
        }
        self.anchor = Some(index.records()[keep].id.clone());

        tracing::debug!(
            target: targets::SELECTION,
            kept = %index.records()[keep].id,
            dropped = change.deselected.len(),
            "selection trimmed for single mode"
        );
        change
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Makes `id` the only selected record.
    ///
    /// Selecting the record that is already the sole selection is rejected as
    /// a no-op.
    pub fn select(&mut self, index: &mut FlatIndex, id: &str) -> TreeResult<SelectionChange> {
        let position = index.position_of(id)?;

        let selected_positions: Vec<usize> = index
            .iter()
            .enumerate()
            .filter(|(_, r)| r.selected)
            .map(|(pos, _)| pos)
            .collect();
        if selected_positions == [position] {
            tracing::debug!(target: targets::SELECTION, id, "already the sole selection");
            return Err(TreeError::no_op(format!("'{id}' is already selected")));
        }

        let mut change = SelectionChange::default();
        for pos in selected_positions {
            if pos != position && index.set_selected(pos, false) {
                change.deselected.push(index.records()[pos].id.clone());
            }
        }
        if index.set_selected(position, true) {
            change.selected.push(id.to_string());
        }
        self.anchor = Some(id.to_string());

        tracing::trace!(
            target: targets::SELECTION,
            id,
            deselected = change.deselected.len(),
            "selected"
        );
        Ok(change)
    }

    /// Adds `id` to, or removes it from, the selection without touching
    /// other records.
    ///
    /// In single mode, toggling an unselected record behaves like
    /// [`select`](Self::select).
    pub fn toggle(&mut self, index: &mut FlatIndex, id: &str) -> TreeResult<SelectionChange> {
        let position = index.position_of(id)?;
        let was_selected = index.records()[position].selected;

        if !was_selected && self.mode == SelectionMode::Single {
            return self.select(index, id);
        }

        let mut change = SelectionChange::default();
        index.set_selected(position, !was_selected);
        if was_selected {
            change.deselected.push(id.to_string());
        } else {
            change.selected.push(id.to_string());
            self.anchor = Some(id.to_string());
        }
        Ok(change)
    }

    /// Selects every record between the anchor and `id`, inclusive, in
    /// sequence order. Existing selections are kept.
    ///
    /// Without an anchor, or in single mode, this behaves like
    /// [`select`](Self::select).
    pub fn range_select(&mut self, index: &mut FlatIndex, id: &str) -> TreeResult<SelectionChange> {
        let target = index.position_of(id)?;
        let anchor = self.anchor.as_deref().and_then(|anchor| index.index_of(anchor));

        let Some(anchor) = anchor.filter(|_| self.mode == SelectionMode::Multi) else {
            return self.select(index, id);
        };

        let (first, last) = if anchor <= target {
            (anchor, target)
        } else {
            (target, anchor)
        };

        let mut change = SelectionChange::default();
        for pos in first..=last {
            if index.set_selected(pos, true) {
                change.selected.push(index.records()[pos].id.clone());
            }
        }

        tracing::trace!(
            target: targets::SELECTION,
            first,
            last,
            added = change.selected.len(),
            "range selected"
        );
        Ok(change)
    }

    /// Deselects everything.
    pub fn clear(&mut self, index: &mut FlatIndex) -> SelectionChange {
        let mut change = SelectionChange::default();
        for pos in 0..index.len() {
            if index.set_selected(pos, false) {
                change.deselected.push(index.records()[pos].id.clone());
            }
        }
        self.anchor = None;
        change
    }

    /// Ids of the selected records, in sequence order.
    pub fn selected_ids(&self, index: &FlatIndex) -> Vec<String> {
        index
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Drops the anchor if it names a record that no longer exists.
    pub(crate) fn forget_missing(&mut self, index: &FlatIndex) {
        if self
            .anchor
            .as_deref()
            .is_some_and(|anchor| index.index_of(anchor).is_none())
        {
            self.anchor = None;
        }
    }

    /// Follows an id change.
    pub(crate) fn rename_anchor(&mut self, old: &str, new: &str) {
        if self.anchor.as_deref() == Some(old) {
            self.anchor = Some(new.to_string());
        }
    }

    pub(crate) fn reset(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::record::{NodePayload, TreeNodeRecord};

    fn record(id: &str) -> TreeNodeRecord {
        TreeNodeRecord::new(id, NodePayload::new(id))
    }

    /// root -> { a -> { a1, a2 }, b -> { b1 } }
    fn sample() -> FlatIndex {
        let mut index = FlatIndex::new();
        index.insert_at(record("root"), None, None).unwrap();
        index.insert_at(record("a"), Some("root"), None).unwrap();
        index.insert_at(record("a1"), Some("a"), None).unwrap();
        index.insert_at(record("a2"), Some("a"), None).unwrap();
        index.insert_at(record("b"), Some("root"), None).unwrap();
        index.insert_at(record("b1"), Some("b"), None).unwrap();
        index
    }

    fn semi(index: &FlatIndex) -> Vec<&str> {
        index
            .iter()
            .filter(|r| r.is_semi_selected())
            .map(|r| r.id())
            .collect()
    }

    #[test]
    fn test_single_select_moves_semi_selection() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Single);

        selection.select(&mut index, "a1").unwrap();
        assert_eq!(semi(&index), vec!["root", "a"]);

        let change = selection.select(&mut index, "b1").unwrap();
        assert_eq!(change.selected, vec!["b1"]);
        assert_eq!(change.deselected, vec!["a1"]);
        assert_eq!(semi(&index), vec!["root", "b"]);
        assert_eq!(selection.selected_ids(&index), vec!["b1"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_reselect_sole_selection_is_no_op() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Single);

        selection.select(&mut index, "a").unwrap();
        let err = selection.select(&mut index, "a").unwrap_err();
        assert!(err.is_no_op());
        assert_eq!(selection.selected_ids(&index), vec!["a"]);
    }

    #[test]
    fn test_select_unknown() {
        let mut index = sample();
        let mut selection = SelectionController::default();
        assert!(matches!(
            selection.select(&mut index, "zzz"),
            Err(TreeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_multi_toggle() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);

        selection.toggle(&mut index, "a1").unwrap();
        selection.toggle(&mut index, "b1").unwrap();
        assert_eq!(selection.selected_ids(&index), vec!["a1", "b1"]);
        assert_eq!(semi(&index), vec!["root", "a", "b"]);

        let change = selection.toggle(&mut index, "a1").unwrap();
        assert_eq!(change.deselected, vec!["a1"]);
        assert_eq!(semi(&index), vec!["root", "b"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_single_mode_toggle_is_exclusive() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Single);

        selection.toggle(&mut index, "a1").unwrap();
        selection.toggle(&mut index, "a2").unwrap();
        assert_eq!(selection.selected_ids(&index), vec!["a2"]);

        selection.toggle(&mut index, "a2").unwrap();
        assert!(selection.selected_ids(&index).is_empty());
    }

    #[test]
    fn test_single_mode_keeps_selected_anchor() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);
        selection.toggle(&mut index, "a1").unwrap();
        selection.toggle(&mut index, "b1").unwrap();
        selection.toggle(&mut index, "a2").unwrap();

        let change = selection.set_mode(&mut index, SelectionMode::Single);
        assert_eq!(change.deselected, vec!["a1", "b1"]);
        assert_eq!(selection.selected_ids(&index), vec!["a2"]);
        assert_eq!(semi(&index), vec!["root", "a"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_single_mode_without_selected_anchor_keeps_first() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);
        selection.toggle(&mut index, "a1").unwrap();
        selection.toggle(&mut index, "b1").unwrap();
        selection.toggle(&mut index, "a").unwrap();
        selection.toggle(&mut index, "a").unwrap();

        let change = selection.set_mode(&mut index, SelectionMode::Single);
        assert_eq!(change.deselected, vec!["b1"]);
        assert_eq!(selection.selected_ids(&index), vec!["a1"]);
        assert_eq!(selection.anchor(), Some("a1"));
        assert_eq!(semi(&index), vec!["root", "a"]);

        assert!(selection.set_mode(&mut index, SelectionMode::Multi).is_empty());
        assert_eq!(selection.selected_ids(&index), vec!["a1"]);
    }

    #[test]
    fn test_range_uses_sequence_order() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);

        selection.select(&mut index, "a2").unwrap();
        let change = selection.range_select(&mut index, "b1").unwrap();
        assert_eq!(change.selected, vec!["b", "b1"]);
        assert_eq!(selection.selected_ids(&index), vec!["a2", "b", "b1"]);

        // Backwards from the same anchor.
        selection.range_select(&mut index, "a").unwrap();
        assert_eq!(selection.selected_ids(&index), vec!["a", "a1", "a2", "b", "b1"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_range_without_anchor_selects() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);
        selection.range_select(&mut index, "b").unwrap();
        assert_eq!(selection.selected_ids(&index), vec!["b"]);
        assert_eq!(selection.anchor(), Some("b"));
    }

    #[test]
    fn test_clear() {
        let mut index = sample();
        let mut selection = SelectionController::new(SelectionMode::Multi);
        selection.toggle(&mut index, "a1").unwrap();
        selection.toggle(&mut index, "b").unwrap();

        let change = selection.clear(&mut index);
        assert_eq!(change.deselected, vec!["a1", "b"]);
        assert!(semi(&index).is_empty());
        assert!(selection.anchor().is_none());
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::to_string(&SelectionMode::Multi).unwrap(),
            "\"multi\""
        );
    }
}
