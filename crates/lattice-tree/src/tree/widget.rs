//! The tree widget facade.
//!
//! [`TreeWidget`] owns the flat index together with the selection, collapse,
//! move and filter controllers, applies host gestures atomically and emits one
//! structural signal per completed mutation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use lattice_tree::tree::{TreeIntent, TreeItem, TreeWidget};
//!
//! let items = vec![
//!     TreeItem::new("Root").with_id("root")
//!         .child(TreeItem::new("A").with_id("a")
//!             .child(TreeItem::new("A1").with_id("a1"))
//!             .child(TreeItem::new("A2").with_id("a2")))
//!         .child(TreeItem::new("B").with_id("b")),
//! ];
//! let mut tree = TreeWidget::from_items(items, Default::default());
//!
//! let moves = Arc::new(AtomicUsize::new(0));
//! let counter = moves.clone();
//! tree.signals().item_moved.connect(move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! tree.move_item("a1", "b").unwrap();
//! assert_eq!(tree.get_children("b", true).unwrap().len(), 1);
//! assert_eq!(moves.load(Ordering::SeqCst), 1);
//!
//! tree.dispatch(TreeIntent::Select("a2".into())).unwrap();
//! assert!(tree.get_item("a").unwrap().is_semi_selected());
//! ```

use lattice_tree_core::logging::span_names;
use lattice_tree_core::{targets, PerfSpan, Signal};

use super::bridge::{DragPayload, RenderBridge, TreeIntent};
use super::debug::IndexDebug;
use super::filter::{FilterEngine, FilterFn};
use super::index::FlatIndex;
use super::record::{NodeInteraction, NodePayload, TreeItem, TreeNodeRecord};
use super::reparent::{MoveOutcome, MoveValidator};
use super::selection::{SelectionChange, SelectionController, SelectionMode};
use super::visibility::{self, CollapseController};
use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};

/// Structural events emitted by a [`TreeWidget`].
///
/// Emission is synchronous and happens after the mutation has been fully
/// applied, so slots always observe a consistent index.
#[derive(Debug, Default)]
pub struct TreeSignals {
    /// A record became the sole selection.
    pub item_selected: Signal<String>,
    /// A record joined the selection.
    pub item_added_to_selection: Signal<String>,
    /// A record left the selection.
    pub item_removed_from_selection: Signal<String>,
    /// `(id, collapsed)`.
    pub item_collapse_changed: Signal<(String, bool)>,
    /// `(id, old_parent_id, new_parent_id)`.
    pub item_moved: Signal<(String, Option<String>, String)>,
    /// `(id, old_label, new_label)`.
    pub item_renamed: Signal<(String, String, String)>,
    /// A record was removed, with its subtree when cascading.
    pub item_removed: Signal<String>,
    /// A click landed on empty space.
    pub background_clicked: Signal<()>,
    /// A context menu was requested on a record.
    pub item_context_menu_requested: Signal<String>,
}

impl TreeSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks or unblocks every signal at once.
    pub fn set_blocked(&self, blocked: bool) {
        self.item_selected.set_blocked(blocked);
        self.item_added_to_selection.set_blocked(blocked);
        self.item_removed_from_selection.set_blocked(blocked);
        self.item_collapse_changed.set_blocked(blocked);
        self.item_moved.set_blocked(blocked);
        self.item_renamed.set_blocked(blocked);
        self.item_removed.set_blocked(blocked);
        self.background_clicked.set_blocked(blocked);
        self.item_context_menu_requested.set_blocked(blocked);
    }
}

/// A tree of records backed by a [`FlatIndex`].
#[derive(Debug)]
pub struct TreeWidget {
    index: FlatIndex,
    selection: SelectionController,
    collapse: CollapseController,
    filter: FilterEngine,
    mover: MoveValidator,
    config: TreeConfig,
    signals: TreeSignals,
}

impl Default for TreeWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeWidget {
    /// Creates an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty tree.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            index: FlatIndex::new(),
            selection: SelectionController::new(config.selection_mode),
            collapse: CollapseController::new(config.default_collapse_depth),
            filter: FilterEngine::new(),
            mover: MoveValidator,
            config,
            signals: TreeSignals::new(),
        }
    }

    /// Builds a tree from a hierarchical description.
    pub fn from_items(items: Vec<TreeItem>, config: TreeConfig) -> Self {
        let mut tree = Self::with_config(config);
        tree.build(items);
        tree
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn signals(&self) -> &TreeSignals {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Changes the selection mode. Switching to single mode trims the
    /// selection down to one record.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.config.selection_mode = mode;
        let change = self.selection.set_mode(&mut self.index, mode);
        self.emit_selection(change, None);
    }

    pub fn set_drag_drop_enabled(&mut self, enabled: bool) {
        self.config.drag_drop_enabled = enabled;
    }

    /// A `Display` dump of the index for debugging.
    pub fn debug(&self) -> IndexDebug<'_> {
        IndexDebug::new(&self.index)
    }

    // =========================================================================
    // Construction and replacement
    // =========================================================================

    /// Replaces the whole tree with a new description.
    ///
    /// Every previous record, id registration and the selection anchor are
    /// discarded first. An active filter is re-applied to the new records.
    pub fn update_tree(&mut self, items: Vec<TreeItem>) {
        self.index.clear();
        self.selection.reset();
        self.build(items);
    }

    fn build(&mut self, items: Vec<TreeItem>) {
        let _perf = PerfSpan::new(span_names::BUILD);
        for item in items {
            self.insert_description(item, None, None);
        }
        visibility::refresh_all(&mut self.index);
        tracing::debug!(target: targets::WIDGET, records = self.index.len(), "tree built");
    }

    /// Inserts `item` and its descendants under `parent_position`. Returns
    /// the position of the head record.
    fn insert_description(
        &mut self,
        item: TreeItem,
        parent_position: Option<usize>,
        offset: Option<usize>,
    ) -> usize {
        let level = parent_position.map_or(0, |pos| self.index.records()[pos].level + 1);
        let (id, payload, collapsed, children) = item.into_parts();

        let mut record = TreeNodeRecord::new(id.unwrap_or_default(), payload);
        record.collapsed = collapsed.unwrap_or_else(|| self.collapse.initial_collapsed(level));
        self.filter.mark(&mut record);

        let position = self.index.insert_under(record, parent_position, offset);
        for child in children {
            self.insert_description(child, Some(position), None);
        }
        position
    }

    /// Exports the current tree as a hierarchical description.
    pub fn to_items(&self) -> Vec<TreeItem> {
        fn fold(stack: &mut Vec<(usize, TreeItem)>, roots: &mut Vec<TreeItem>) {
            if let Some((_, item)) = stack.pop() {
                match stack.last_mut() {
                    Some((_, parent)) => parent.children.push(item),
                    None => roots.push(item),
                }
            }
        }

        let mut roots = Vec::new();
        let mut stack: Vec<(usize, TreeItem)> = Vec::new();
        for record in self.index.iter() {
            while stack.last().is_some_and(|(level, _)| *level >= record.level) {
                fold(&mut stack, &mut roots);
            }
            let payload = &record.payload;
            let item = TreeItem {
                id: Some(record.id.clone()),
                label: payload.label.clone(),
                attributes: payload.attributes.clone(),
                visible: payload.visible,
                collapsed: Some(record.collapsed),
                children: Vec::new(),
                behavior: payload.behavior.clone(),
            };
            stack.push((record.level, item));
        }
        while !stack.is_empty() {
            fold(&mut stack, &mut roots);
        }
        roots
    }

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Inserts `item` (with its children) under `parent_id`, before the
    /// direct child at `offset`. Returns the id of the inserted head record.
    pub fn insert_item(
        &mut self,
        item: TreeItem,
        parent_id: Option<&str>,
        offset: Option<usize>,
    ) -> TreeResult<String> {
        let parent_position = match parent_id {
            Some(id) => Some(self.index.position_of(id)?),
            None => None,
        };
        let position = self.insert_description(item, parent_position, offset);
        let id = self.index.records()[position].id.clone();
        tracing::debug!(target: targets::WIDGET, id = %id, parent = ?parent_id, "item inserted");
        Ok(id)
    }

    /// Removes `id`. With `cascade` its whole subtree goes; otherwise its
    /// children are promoted to its parent. Returns the removed ids.
    pub fn remove_item(&mut self, id: &str, cascade: bool) -> TreeResult<Vec<String>> {
        let position = self.index.position_of(id)?;
        let removed = self.index.remove_at(position, cascade)?;
        if !cascade {
            visibility::refresh_all(&mut self.index);
        }
        self.selection.forget_missing(&self.index);

        let deselected: Vec<String> = removed
            .iter()
            .filter(|record| record.selected)
            .map(|record| record.id.clone())
            .collect();
        let removed: Vec<String> = removed.into_iter().map(|record| record.id).collect();
        tracing::debug!(target: targets::WIDGET, id, cascade, removed = removed.len(), "item removed");
        self.emit_selection(
            SelectionChange {
                selected: Vec::new(),
                deselected,
            },
            None,
        );
        self.signals.item_removed.emit(id.to_string());
        Ok(removed)
    }

    /// Changes the label of `id`.
    pub fn rename_item(&mut self, id: &str, new_label: impl Into<String>) -> TreeResult<()> {
        let position = self.index.position_of(id)?;
        let new_label = new_label.into();
        let Some(record) = self.index.get_mut(position) else {
            return Err(TreeError::not_found(id));
        };
        if record.payload.label == new_label {
            return Ok(());
        }

        let old_label = std::mem::replace(&mut record.payload.label, new_label.clone());
        self.filter.mark(record);
        self.announce_rename(position, old_label, new_label);
        Ok(())
    }

    fn announce_rename(&self, position: usize, old_label: String, new_label: String) {
        let Some(record) = self.index.get(position) else {
            return;
        };
        record.notify(NodeInteraction::Renamed {
            old: old_label.clone(),
            new: new_label.clone(),
        });
        self.signals
            .item_renamed
            .emit((record.id.clone(), old_label, new_label));
    }

    /// Replaces the payload of `id`. A changed label is announced like
    /// [`rename_item`](Self::rename_item).
    pub fn update_item(&mut self, id: &str, payload: NodePayload) -> TreeResult<()> {
        let position = self.index.position_of(id)?;
        let Some(record) = self.index.get_mut(position) else {
            return Err(TreeError::not_found(id));
        };
        let visibility_changed = record.payload.visible != payload.visible;
        let old = std::mem::replace(&mut record.payload, payload);
        self.filter.mark(record);
        let relabel = (old.label != record.payload.label)
            .then(|| (old.label, record.payload.label.clone()));

        if visibility_changed {
            visibility::refresh_subtree(&mut self.index, position);
        }
        if let Some((old_label, new_label)) = relabel {
            self.announce_rename(position, old_label, new_label);
        }
        Ok(())
    }

    /// Gives the record `old_id` a new id, re-linking its children.
    pub fn change_id(&mut self, old_id: &str, new_id: &str) -> TreeResult<()> {
        let position = self.index.position_of(old_id)?;
        if old_id == new_id {
            return Ok(());
        }
        self.index.rename_id(position, new_id)?;
        if let Some(record) = self.index.get_mut(position) {
            self.filter.mark(record);
        }
        self.selection.rename_anchor(old_id, new_id);
        tracing::debug!(target: targets::WIDGET, old = old_id, new = new_id, "item id changed");
        Ok(())
    }

    /// Removes every record. With `preserve_root`, a top-level first record
    /// survives with its children dropped.
    pub fn clear(&mut self, preserve_root: bool) {
        let root = self
            .index
            .get(0)
            .filter(|record| preserve_root && record.level == 0)
            .cloned();

        self.index.clear();
        self.selection.reset();
        if let Some(root) = root {
            self.index.insert_under(root, None, None);
            visibility::refresh_all(&mut self.index);
        }
        tracing::debug!(target: targets::WIDGET, preserve_root, "tree cleared");
    }

    /// Moves `id` with its subtree under `new_parent_id`, as its last child.
    pub fn move_item(&mut self, id: &str, new_parent_id: &str) -> TreeResult<MoveOutcome> {
        let outcome = self.mover.move_node(&mut self.index, id, new_parent_id)?;
        self.signals.item_moved.emit((
            outcome.id.clone(),
            outcome.old_parent_id.clone(),
            outcome.new_parent_id.clone(),
        ));
        Ok(outcome)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Makes `id` the sole selection.
    pub fn select(&mut self, id: &str) -> TreeResult<()> {
        let change = self.selection.select(&mut self.index, id)?;
        self.emit_selection(change, Some(id));
        Ok(())
    }

    /// Adds `id` to or removes it from the selection.
    pub fn toggle_select(&mut self, id: &str) -> TreeResult<()> {
        let change = self.selection.toggle(&mut self.index, id)?;
        self.emit_selection(change, None);
        Ok(())
    }

    /// Extends the selection from the anchor to `id`.
    pub fn range_select(&mut self, id: &str) -> TreeResult<()> {
        let change = self.selection.range_select(&mut self.index, id)?;
        self.emit_selection(change, None);
        Ok(())
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        let change = self.selection.clear(&mut self.index);
        self.emit_selection(change, None);
    }

    fn emit_selection(&self, change: SelectionChange, sole: Option<&str>) {
        for id in &change.deselected {
            self.signals.item_removed_from_selection.emit(id.clone());
        }
        for id in change.selected.iter().filter(|id| sole != Some(id.as_str())) {
            self.signals.item_added_to_selection.emit(id.clone());
        }
        if let Some(id) = sole {
            if let Some(record) = self.index.get_by_id(id) {
                record.notify(NodeInteraction::Selected);
            }
            self.signals.item_selected.emit(id.to_string());
        }
    }

    // =========================================================================
    // Expand / collapse
    // =========================================================================

    /// Flips the collapsed state of `id`. Returns the new state.
    pub fn toggle_collapse(&mut self, id: &str) -> TreeResult<bool> {
        let collapsed = self.collapse.toggle(&mut self.index, id)?;
        self.emit_collapse(id, collapsed);
        Ok(collapsed)
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> TreeResult<()> {
        if self.collapse.set_collapsed(&mut self.index, id, collapsed)? {
            self.emit_collapse(id, collapsed);
        }
        Ok(())
    }

    pub fn expand_all(&mut self) {
        for id in self.collapse.set_all(&mut self.index, false) {
            self.emit_collapse(&id, false);
        }
    }

    pub fn collapse_all(&mut self) {
        for id in self.collapse.set_all(&mut self.index, true) {
            self.emit_collapse(&id, true);
        }
    }

    /// Expands every ancestor of `id` so it is no longer hidden by a
    /// collapsed ancestor.
    pub fn expand_to(&mut self, id: &str) -> TreeResult<()> {
        for ancestor in self.collapse.expand_to(&mut self.index, id)? {
            self.emit_collapse(&ancestor, false);
        }
        Ok(())
    }

    fn emit_collapse(&self, id: &str, collapsed: bool) {
        if let Some(record) = self.index.get_by_id(id) {
            record.notify(NodeInteraction::CollapseChanged(collapsed));
        }
        self.signals
            .item_collapse_changed
            .emit((id.to_string(), collapsed));
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Installs `predicate`, or clears the filter when `None`. Returns the
    /// number of records filtered out.
    pub fn set_filter(&mut self, predicate: Option<FilterFn>) -> usize {
        self.filter.set_predicate(&mut self.index, predicate)
    }

    pub fn filter_by_predicate<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&TreeNodeRecord) -> bool + Send + Sync + 'static,
    {
        self.filter.filter_by_predicate(&mut self.index, predicate)
    }

    pub fn filter_by_text(&mut self, text: &str) -> usize {
        self.filter.filter_by_text(&mut self.index, text)
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear(&mut self.index);
    }

    pub fn is_filter_active(&self) -> bool {
        self.filter.is_active()
    }

    // =========================================================================
    // Rendering and gestures
    // =========================================================================

    /// Records that currently produce a row, in sequence order.
    pub fn rendered_records(&self) -> impl Iterator<Item = &TreeNodeRecord> {
        self.index.iter().filter(|record| record.is_rendered())
    }

    /// Hands every rendered record to `bridge`, in sequence order.
    pub fn render_visible<B: RenderBridge>(&self, bridge: &mut B) -> Vec<B::Handle> {
        let _perf = PerfSpan::new(span_names::RENDER);
        self.rendered_records()
            .map(|record| bridge.render_node(record))
            .collect()
    }

    /// The payload for a drag starting on `id`, or `None` when dragging is
    /// disabled or the id is unknown.
    pub fn begin_drag(&self, id: &str) -> Option<DragPayload> {
        if !self.config.drag_drop_enabled {
            return None;
        }
        let record = self.index.get_by_id(id)?;
        let custom = record
            .payload
            .behavior
            .as_ref()
            .and_then(|behavior| behavior.drag_payload(record));
        Some(custom.unwrap_or_else(|| DragPayload::for_record(record)))
    }

    /// Drops the node named by `payload` onto `target_id`.
    pub fn drop(&mut self, target_id: &str, payload: &DragPayload) -> TreeResult<MoveOutcome> {
        if !self.config.drag_drop_enabled {
            return Err(TreeError::no_op("drag and drop is disabled"));
        }
        let Some(source) = payload.source_id() else {
            return Err(TreeError::no_op("drop payload does not carry a tree node"));
        };
        self.move_item(source, target_id)
    }

    /// Applies one host gesture.
    pub fn dispatch(&mut self, intent: TreeIntent) -> TreeResult<()> {
        tracing::trace!(target: targets::WIDGET, ?intent, "dispatching intent");
        match intent {
            TreeIntent::Select(id) => self.select(&id),
            TreeIntent::ToggleSelect(id) => self.toggle_select(&id),
            TreeIntent::RangeSelect(id) => self.range_select(&id),
            TreeIntent::ToggleCollapse(id) => self.toggle_collapse(&id).map(|_| ()),
            TreeIntent::Drop { target_id, payload } => self.drop(&target_id, &payload).map(|_| ()),
            TreeIntent::Rename { id, new_text } => self.rename_item(&id, new_text),
            TreeIntent::Delete { id } => self.remove_item(&id, self.config.cascade_remove).map(|_| ()),
            TreeIntent::BackgroundClick => {
                self.clear_selection();
                self.signals.background_clicked.emit(());
                Ok(())
            }
            TreeIntent::ContextMenu { id } => {
                let record = self
                    .index
                    .get_by_id(&id)
                    .ok_or_else(|| TreeError::not_found(&id))?;
                record.notify(NodeInteraction::ContextMenu);
                self.signals.item_context_menu_requested.emit(id);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Children of `id`, or all its descendants without `direct_only`.
    pub fn get_children(&self, id: &str, direct_only: bool) -> TreeResult<Vec<&TreeNodeRecord>> {
        self.index.child_range(id, direct_only)
    }

    /// The structural parent of `id`, `None` for a top-level record.
    pub fn get_parent(&self, id: &str) -> TreeResult<Option<&TreeNodeRecord>> {
        let position = self.index.position_of(id)?;
        Ok(self
            .index
            .parent_position(position)
            .and_then(|pos| self.index.get(pos)))
    }

    /// Ancestors of `id`, nearest first.
    pub fn get_ancestors(&self, id: &str) -> TreeResult<Vec<&TreeNodeRecord>> {
        let position = self.index.position_of(id)?;
        Ok(self
            .index
            .ancestor_positions(position)
            .into_iter()
            .filter_map(|pos| self.index.get(pos))
            .collect())
    }

    /// Selected records in sequence order.
    pub fn get_selected_items(&self) -> Vec<&TreeNodeRecord> {
        self.index.iter().filter(|record| record.selected).collect()
    }

    /// Returns `true` if `candidate` is a strict ancestor of `of`. Unknown
    /// ids are never ancestors.
    pub fn is_ancestor(&self, candidate: &str, of: &str) -> bool {
        match (self.index.index_of(candidate), self.index.index_of(of)) {
            (Some(ancestor), Some(position)) => self.index.is_ancestor_position(ancestor, position),
            _ => false,
        }
    }

    pub fn get_item(&self, id: &str) -> Option<&TreeNodeRecord> {
        self.index.get_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// root -> { a -> { a1, a2 }, b }
    fn sample(config: TreeConfig) -> TreeWidget {
        TreeWidget::from_items(
            vec![
                TreeItem::new("Root")
                    .with_id("root")
                    .child(
                        TreeItem::new("A")
                            .with_id("a")
                            .child(TreeItem::new("A1").with_id("a1"))
                            .child(TreeItem::new("A2").with_id("a2")),
                    )
                    .child(TreeItem::new("B").with_id("b")),
            ],
            config,
        )
    }

    fn ids(records: &[&TreeNodeRecord]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    fn record_events<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        signal.connect(move |args: &T| sink.lock().push(args.clone()));
        events
    }

    #[test]
    fn test_build_from_items() {
        let tree = sample(TreeConfig::default());
        assert_eq!(tree.len(), 5);
        let levels: Vec<usize> = tree.index().iter().map(|r| r.level()).collect();
        assert_eq!(levels, vec![0, 1, 2, 2, 1]);
        assert!(tree.get_item("a").unwrap().has_children());
        tree.index().check_invariants().unwrap();
    }

    #[test]
    fn test_default_collapse_depth() {
        let tree = sample(TreeConfig::default().with_default_collapse_depth(Some(1)));
        assert!(!tree.get_item("root").unwrap().is_collapsed());
        assert!(tree.get_item("a").unwrap().is_collapsed());
        assert!(tree.get_item("a1").unwrap().is_hidden());
        assert!(tree.get_item("b").unwrap().is_collapsed());
        assert!(!tree.get_item("b").unwrap().is_hidden());
    }

    #[test]
    fn test_explicit_collapsed_overrides_depth() {
        let tree = TreeWidget::from_items(
            vec![TreeItem::new("R").with_id("r").with_collapsed(true).child(TreeItem::new("C"))],
            TreeConfig::default(),
        );
        assert!(tree.get_item("r").unwrap().is_collapsed());
        assert!(tree.get_item("node-1").unwrap().is_hidden());
    }

    #[test]
    fn test_insert_item_with_children() {
        let mut tree = sample(TreeConfig::default());
        let id = tree
            .insert_item(
                TreeItem::new("A0").with_id("a0").child(TreeItem::new("A0x").with_id("a0x")),
                Some("a"),
                Some(0),
            )
            .unwrap();
        assert_eq!(id, "a0");
        assert_eq!(ids(&tree.get_children("a", true).unwrap()), vec!["a0", "a1", "a2"]);
        assert_eq!(tree.get_item("a0x").unwrap().level(), 3);
        tree.index().check_invariants().unwrap();

        assert!(matches!(
            tree.insert_item(TreeItem::new("X"), Some("ghost"), None),
            Err(TreeError::NotFound { .. })
        ));
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_select_emits_and_replaces() {
        let mut tree = sample(TreeConfig::default());
        let selected = record_events(&tree.signals().item_selected);
        let removed = record_events(&tree.signals().item_removed_from_selection);

        tree.select("a1").unwrap();
        tree.select("a2").unwrap();
        assert_eq!(*selected.lock(), vec!["a1", "a2"]);
        assert_eq!(*removed.lock(), vec!["a1"]);
        assert!(tree.select("a2").unwrap_err().is_no_op());
        assert_eq!(selected.lock().len(), 2);
    }

    #[test]
    fn test_multi_selection_signals() {
        let mut tree = sample(TreeConfig::default().with_selection_mode(SelectionMode::Multi));
        let added = record_events(&tree.signals().item_added_to_selection);

        tree.toggle_select("a1").unwrap();
        tree.range_select("b").unwrap();
        assert_eq!(*added.lock(), vec!["a1", "a2", "b"]);
        assert_eq!(ids(&tree.get_selected_items()), vec!["a1", "a2", "b"]);
    }

    #[test]
    fn test_collapse_signals() {
        let mut tree = sample(TreeConfig::default());
        let events = record_events(&tree.signals().item_collapse_changed);

        assert!(tree.toggle_collapse("a").unwrap());
        tree.set_collapsed("a", true).unwrap();
        tree.expand_all();
        assert_eq!(
            *events.lock(),
            vec![("a".to_string(), true), ("a".to_string(), false)]
        );
    }

    #[test]
    fn test_expand_to_reveals() {
        let mut tree = sample(TreeConfig::default());
        tree.collapse_all();
        assert!(tree.get_item("a2").unwrap().is_hidden());
        tree.expand_to("a2").unwrap();
        assert!(!tree.get_item("a2").unwrap().is_hidden());
        assert!(tree.get_item("b").unwrap().is_rendered());
    }

    #[test]
    fn test_move_emits() {
        let mut tree = sample(TreeConfig::default());
        let events = record_events(&tree.signals().item_moved);

        tree.move_item("a1", "b").unwrap();
        assert_eq!(
            *events.lock(),
            vec![("a1".to_string(), Some("a".to_string()), "b".to_string())]
        );
        assert!(tree.move_item("a", "a").is_err());
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_rename_and_update() {
        let mut tree = sample(TreeConfig::default());
        let events = record_events(&tree.signals().item_renamed);

        tree.rename_item("b", "Bee").unwrap();
        tree.rename_item("b", "Bee").unwrap();
        assert_eq!(
            *events.lock(),
            vec![("b".to_string(), "B".to_string(), "Bee".to_string())]
        );

        tree.update_item("a", NodePayload::new("A").with_visible(false))
            .unwrap();
        assert!(tree.get_item("a1").unwrap().is_hidden());
        assert!(!tree.get_item("a").unwrap().is_rendered());
    }

    #[test]
    fn test_change_id_relinks() {
        let mut tree = sample(TreeConfig::default());
        tree.change_id("a", "alpha").unwrap();
        assert!(tree.get_item("a").is_none());
        assert_eq!(tree.get_parent("a1").unwrap().unwrap().id(), "alpha");
        tree.index().check_invariants().unwrap();
    }

    #[test]
    fn test_switch_to_single_mode_trims_selection() {
        let mut tree = sample(TreeConfig::default().with_selection_mode(SelectionMode::Multi));
        let removed = record_events(&tree.signals().item_removed_from_selection);
        tree.toggle_select("a1").unwrap();
        tree.toggle_select("b").unwrap();

        tree.set_selection_mode(SelectionMode::Single);
        assert_eq!(tree.config().selection_mode, SelectionMode::Single);
        assert_eq!(ids(&tree.get_selected_items()), vec!["b"]);
        assert_eq!(*removed.lock(), vec!["a1"]);
        assert!(!tree.get_item("a").unwrap().is_semi_selected());
        assert!(tree.get_item("root").unwrap().is_semi_selected());
        tree.index().check_invariants().unwrap();
    }

    #[test]
    fn test_change_id_reapplies_filter() {
        let mut tree = sample(TreeConfig::default());
        tree.filter_by_predicate(|r| r.id().starts_with('a'));
        assert!(tree.get_item("b").unwrap().is_filtered());

        tree.change_id("b", "a-bee").unwrap();
        assert!(!tree.get_item("a-bee").unwrap().is_filtered());
        assert!(tree.rendered_records().any(|r| r.id() == "a-bee"));

        tree.change_id("a1", "one").unwrap();
        assert!(tree.get_item("one").unwrap().is_filtered());
    }

    #[test]
    fn test_remove_selected_emits_deselection() {
        let mut tree = sample(TreeConfig::default().with_selection_mode(SelectionMode::Multi));
        let removed = record_events(&tree.signals().item_removed_from_selection);
        tree.toggle_select("a1").unwrap();
        tree.toggle_select("a2").unwrap();
        tree.toggle_select("b").unwrap();

        tree.remove_item("a", true).unwrap();
        assert_eq!(*removed.lock(), vec!["a1", "a2"]);
        assert_eq!(ids(&tree.get_selected_items()), vec!["b"]);

        tree.remove_item("root", false).unwrap();
        assert_eq!(removed.lock().len(), 2);
    }

    #[test]
    fn test_update_item_label_emits_rename() {
        let mut tree = sample(TreeConfig::default());
        let events = record_events(&tree.signals().item_renamed);

        tree.update_item("a", NodePayload::new("Alpha")).unwrap();
        tree.update_item("a", NodePayload::new("Alpha").with_visible(false))
            .unwrap();
        assert_eq!(
            *events.lock(),
            vec![("a".to_string(), "A".to_string(), "Alpha".to_string())]
        );
        assert_eq!(tree.get_item("a").unwrap().label(), "Alpha");
    }

    #[test]
    fn test_remove_item_promotes() {
        let mut tree = sample(TreeConfig::default());
        let removed = tree.remove_item("a", false).unwrap();
        assert_eq!(removed, vec!["a"]);
        assert_eq!(ids(&tree.get_children("root", true).unwrap()), vec!["a1", "a2", "b"]);
        tree.index().check_invariants().unwrap();
    }

    #[test]
    fn test_clear_preserve_root() {
        let mut tree = sample(TreeConfig::default());
        tree.clear(true);
        assert_eq!(tree.len(), 1);
        assert!(!tree.get_item("root").unwrap().has_children());

        tree.clear(false);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_update_tree_discards_previous() {
        let mut tree = sample(TreeConfig::default());
        tree.select("a1").unwrap();
        tree.update_tree(vec![TreeItem::new("New").with_id("new")]);

        assert_eq!(tree.len(), 1);
        assert!(tree.get_item("a1").is_none());
        assert!(tree.get_selected_items().is_empty());
        // The old id is free again.
        tree.insert_item(TreeItem::new("A1").with_id("a1"), Some("new"), None)
            .unwrap();
        assert!(!tree.index().is_duplicate_id("a1"));
    }

    #[test]
    fn test_to_items_round_trip() {
        let tree = sample(TreeConfig::default());
        let items = tree.to_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].children.len(), 2);
        assert_eq!(items[0].children[0].children.len(), 2);

        let rebuilt = TreeWidget::from_items(items, TreeConfig::default());
        let built: Vec<(&str, usize)> = tree.index().iter().map(|r| (r.id(), r.level())).collect();
        let copy: Vec<(&str, usize)> = rebuilt.index().iter().map(|r| (r.id(), r.level())).collect();
        assert_eq!(built, copy);
    }

    #[test]
    fn test_drag_and_drop() {
        let mut tree = sample(TreeConfig::default());
        let payload = tree.begin_drag("a2").unwrap();
        assert_eq!(payload.text(), Some("A2"));

        tree.dispatch(TreeIntent::Drop {
            target_id: "b".into(),
            payload,
        })
        .unwrap();
        assert_eq!(tree.get_parent("a2").unwrap().unwrap().id(), "b");

        tree.set_drag_drop_enabled(false);
        assert!(tree.begin_drag("a1").is_none());
        let err = tree.drop("b", &DragPayload::new()).unwrap_err();
        assert!(err.is_no_op());
    }

    #[test]
    fn test_dispatch_background_and_context_menu() {
        let mut tree = sample(TreeConfig::default());
        let clicks = record_events(&tree.signals().background_clicked);
        let menus = record_events(&tree.signals().item_context_menu_requested);

        tree.dispatch(TreeIntent::Select("a".into())).unwrap();
        tree.dispatch(TreeIntent::BackgroundClick).unwrap();
        assert!(tree.get_selected_items().is_empty());
        assert_eq!(clicks.lock().len(), 1);

        tree.dispatch(TreeIntent::ContextMenu { id: "b".into() }).unwrap();
        assert!(tree.dispatch(TreeIntent::ContextMenu { id: "zz".into() }).is_err());
        assert_eq!(*menus.lock(), vec!["b"]);
    }

    #[test]
    fn test_dispatch_delete_uses_config() {
        let mut tree = sample(TreeConfig::default().with_cascade_remove(false));
        let removed = record_events(&tree.signals().item_removed);
        tree.dispatch(TreeIntent::Delete { id: "a".into() }).unwrap();
        assert!(tree.get_item("a1").is_some());
        assert_eq!(*removed.lock(), vec!["a"]);
    }

    #[test]
    fn test_queries() {
        let tree = sample(TreeConfig::default());
        assert!(tree.get_parent("root").unwrap().is_none());
        assert_eq!(ids(&tree.get_ancestors("a2").unwrap()), vec!["a", "root"]);
        assert!(tree.is_ancestor("root", "a2"));
        assert!(!tree.is_ancestor("a2", "a2"));
        assert!(!tree.is_ancestor("ghost", "a2"));
        assert!(tree.get_parent("ghost").is_err());
    }

    #[test]
    fn test_render_visible_skips_hidden_and_filtered() {
        struct Labels;
        impl RenderBridge for Labels {
            type Handle = String;
            fn render_node(&mut self, record: &TreeNodeRecord) -> String {
                record.label().to_string()
            }
        }

        let mut tree = sample(TreeConfig::default());
        tree.set_collapsed("a", true).unwrap();
        tree.filter_by_predicate(|r| r.id() != "b");
        assert_eq!(tree.render_visible(&mut Labels), vec!["Root", "A"]);

        tree.clear_filter();
        assert!(!tree.is_filter_active());
        assert_eq!(tree.render_visible(&mut Labels), vec!["Root", "A", "B"]);
    }
}
