//! Flat, level-tagged index of tree records.
//!
//! The hierarchy is stored as a single pre-ordered sequence. Every record
//! carries its depth; a record's subtree is the run of following records with
//! a strictly greater level. Children, parents, ancestors and subtree bounds
//! are all derived by scanning that sequence.
//!
//! # Example
//!
//! ```
//! use lattice_tree::tree::{FlatIndex, NodePayload, TreeNodeRecord};
//!
//! let mut index = FlatIndex::new();
//! index.insert_at(TreeNodeRecord::new("root", NodePayload::new("Root")), None, None).unwrap();
//! index.insert_at(TreeNodeRecord::new("a", NodePayload::new("A")), Some("root"), None).unwrap();
//! index.insert_at(TreeNodeRecord::new("b", NodePayload::new("B")), Some("root"), Some(0)).unwrap();
//!
//! let children: Vec<_> = index
//!     .child_range("root", true)
//!     .unwrap()
//!     .iter()
//!     .map(|r| r.id().to_string())
//!     .collect();
//! assert_eq!(children, vec!["b", "a"]);
//! ```

use lattice_tree_core::targets;

use super::record::TreeNodeRecord;
use super::registry::NodeRegistry;
use crate::error::{TreeError, TreeResult};

/// The ordered sequence of records plus the registry that owns their ids.
#[derive(Debug, Default)]
pub struct FlatIndex {
    records: Vec<TreeNodeRecord>,
    registry: NodeRegistry,
}

impl FlatIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            registry: NodeRegistry::new(),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in sequence order.
    pub fn records(&self) -> &[TreeNodeRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeNodeRecord> {
        self.records.iter()
    }

    pub fn get(&self, position: usize) -> Option<&TreeNodeRecord> {
        self.records.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut TreeNodeRecord> {
        self.records.get_mut(position)
    }

    pub(crate) fn records_mut(&mut self) -> &mut [TreeNodeRecord] {
        &mut self.records
    }

    /// Position of the first record carrying `id`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        if !self.registry.contains(id) {
            return None;
        }
        self.records.iter().position(|r| r.id == id)
    }

    /// Like [`index_of`](Self::index_of) but reports a missing id as an error.
    pub fn position_of(&self, id: &str) -> TreeResult<usize> {
        self.index_of(id).ok_or_else(|| TreeError::not_found(id))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&TreeNodeRecord> {
        self.index_of(id).map(|pos| &self.records[pos])
    }

    /// Returns `true` if more than one live record carries `id`.
    pub fn is_duplicate_id(&self, id: &str) -> bool {
        self.registry.is_duplicate(id)
    }

    // =========================================================================
    // Structural scans
    // =========================================================================

    /// Positions of the records nested under `position`, in sequence order.
    ///
    /// With `direct_only`, grandchildren are skipped without ending the scan.
    pub fn child_positions(&self, position: usize, direct_only: bool) -> Vec<usize> {
        let Some(parent) = self.records.get(position) else {
            return Vec::new();
        };
        let level = parent.level;

        let mut positions = Vec::new();
        for (offset, candidate) in self.records[position + 1..].iter().enumerate() {
            if candidate.level <= level {
                break;
            }
            if direct_only && candidate.level > level + 1 {
                continue;
            }
            positions.push(position + 1 + offset);
        }
        positions
    }

    /// Children (or all descendants) of the record `id`, in sequence order.
    pub fn child_range(&self, id: &str, direct_only: bool) -> TreeResult<Vec<&TreeNodeRecord>> {
        let position = self.position_of(id)?;
        Ok(self
            .child_positions(position, direct_only)
            .into_iter()
            .map(|pos| &self.records[pos])
            .collect())
    }

    /// Position of the last record in the subtree rooted at `position`.
    ///
    /// A leaf is its own last descendant. Returns `None` for an out-of-range
    /// position.
    pub fn last_descendant_position(&self, position: usize) -> Option<usize> {
        let level = self.records.get(position)?.level;
        let end = self.records[position + 1..]
            .iter()
            .position(|candidate| candidate.level <= level)
            .map_or(self.records.len(), |offset| position + 1 + offset);
        Some(end - 1)
    }

    /// Half-open range `start..end` covering the record and its descendants.
    pub fn subtree_bounds(&self, position: usize) -> Option<std::ops::Range<usize>> {
        self.last_descendant_position(position)
            .map(|last| position..last + 1)
    }

    /// Position of the nearest preceding record one level up.
    pub fn parent_position(&self, position: usize) -> Option<usize> {
        let level = self.records.get(position)?.level;
        if level == 0 {
            return None;
        }
        self.records[..position]
            .iter()
            .rposition(|candidate| candidate.level < level)
    }

    /// Ancestor positions, nearest first.
    pub fn ancestor_positions(&self, position: usize) -> Vec<usize> {
        let Some(record) = self.records.get(position) else {
            return Vec::new();
        };

        let mut ancestors = Vec::with_capacity(record.level);
        let mut want = record.level;
        for candidate in (0..position).rev() {
            if want == 0 {
                break;
            }
            let level = self.records[candidate].level;
            if level < want {
                ancestors.push(candidate);
                want = level;
            }
        }
        ancestors
    }

    /// Returns `true` if `ancestor` strictly contains `position` in its subtree.
    pub fn is_ancestor_position(&self, ancestor: usize, position: usize) -> bool {
        ancestor < position
            && self
                .subtree_bounds(ancestor)
                .is_some_and(|bounds| bounds.contains(&position))
    }

    /// Whether any record is nested directly after `position`.
    pub fn has_children_at(&self, position: usize) -> bool {
        match (self.records.get(position), self.records.get(position + 1)) {
            (Some(record), Some(next)) => next.level > record.level,
            _ => false,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts `record` under `parent_id` (or at top level when `None`).
    ///
    /// `offset` counts existing direct siblings; the record lands before the
    /// sibling at that offset, or at the end of the parent's subtree when the
    /// offset is absent or past the last sibling. A record with an empty id is
    /// given a generated one.
    ///
    /// Returns the new record's position.
    pub fn insert_at(
        &mut self,
        record: TreeNodeRecord,
        parent_id: Option<&str>,
        offset: Option<usize>,
    ) -> TreeResult<usize> {
        let parent_position = match parent_id {
            Some(id) => Some(self.position_of(id)?),
            None => None,
        };
        Ok(self.insert_under(record, parent_position, offset))
    }

    /// Positional form of [`insert_at`](Self::insert_at) for a parent that
    /// is already resolved.
    pub(crate) fn insert_under(
        &mut self,
        mut record: TreeNodeRecord,
        parent_position: Option<usize>,
        offset: Option<usize>,
    ) -> usize {
        let (level, start, end) = match parent_position {
            Some(pos) => {
                let end = self.last_descendant_position(pos).map_or(pos + 1, |last| last + 1);
                (self.records[pos].level + 1, pos + 1, end)
            }
            None => (0, 0, self.records.len()),
        };

        let mut position = end;
        if let Some(offset) = offset {
            let mut seen = 0;
            for candidate in start..end {
                if self.records[candidate].level != level {
                    continue;
                }
                if seen == offset {
                    position = candidate;
                    break;
                }
                seen += 1;
            }
        }

        let requested = (!record.id.is_empty()).then(|| std::mem::take(&mut record.id));
        record.id = self.registry.register(requested);
        record.parent_id = parent_position.map(|pos| self.records[pos].id.clone());
        record.level = level;
        record.selected = false;
        record.selected_descendants = 0;
        record.has_children = false;
        record.hidden = !record.payload.visible
            || parent_position.is_some_and(|pos| self.hides_children(pos));

        tracing::trace!(
            target: targets::INDEX,
            id = %record.id,
            position,
            level,
            "inserting record"
        );

        self.records.insert(position, record);
        if let Some(pos) = parent_position {
            self.records[pos].has_children = true;
        }
        position
    }

    /// Removes the record at `position`.
    ///
    /// With `cascade` the whole subtree goes; otherwise only the record is
    /// removed and its descendants move up one level, its direct children
    /// being re-linked to its parent. Returns the removed records.
    pub fn remove_at(&mut self, position: usize, cascade: bool) -> TreeResult<Vec<TreeNodeRecord>> {
        let Some(bounds) = self.subtree_bounds(position) else {
            return Err(TreeError::not_found(format!("#{position}")));
        };
        let parent = self.parent_position(position);

        let removed: Vec<TreeNodeRecord> = if cascade {
            let selected = self.records[bounds.clone()]
                .iter()
                .filter(|r| r.selected)
                .count();
            self.adjust_ancestor_counts(position, -(selected as isize));
            self.records.drain(bounds).collect()
        } else {
            if self.records[position].selected {
                self.adjust_ancestor_counts(position, -1);
            }
            let level = self.records[position].level;
            let new_parent_id = self.records[position].parent_id.clone();
            for record in &mut self.records[bounds.start + 1..bounds.end] {
                if record.level == level + 1 {
                    record.parent_id = new_parent_id.clone();
                }
                record.level -= 1;
            }
            vec![self.records.remove(position)]
        };

        for record in &removed {
            self.registry.unregister(&record.id);
        }
        if let Some(pos) = parent {
            self.records[pos].has_children = self.has_children_at(pos);
        }

        tracing::trace!(
            target: targets::INDEX,
            position,
            cascade,
            removed = removed.len(),
            "removed records"
        );
        Ok(removed)
    }

    /// Removes every record and forgets every id.
    pub fn clear(&mut self) {
        self.records.clear();
        self.registry.clear();
    }

    /// Changes the id of the record at `position` and re-links its direct
    /// children.
    pub(crate) fn rename_id(&mut self, position: usize, new_id: &str) -> TreeResult<String> {
        let Some(record) = self.records.get_mut(position) else {
            return Err(TreeError::not_found(format!("#{position}")));
        };
        let old_id = std::mem::replace(&mut record.id, new_id.to_string());
        self.registry.rename(&old_id, new_id);

        for child in self.child_positions(position, true) {
            self.records[child].parent_id = Some(new_id.to_string());
        }
        Ok(old_id)
    }

    // =========================================================================
    // Subtree blocks
    // =========================================================================

    /// Cuts the subtree at `position` out of the sequence, keeping its ids
    /// registered. Selection counts on the old ancestors are released.
    pub(crate) fn detach_subtree(&mut self, position: usize) -> Vec<TreeNodeRecord> {
        let Some(bounds) = self.subtree_bounds(position) else {
            return Vec::new();
        };
        let parent = self.parent_position(position);

        let selected = self.records[bounds.clone()]
            .iter()
            .filter(|r| r.selected)
            .count();
        self.adjust_ancestor_counts(position, -(selected as isize));

        let block: Vec<TreeNodeRecord> = self.records.drain(bounds).collect();
        if let Some(pos) = parent {
            self.records[pos].has_children = self.has_children_at(pos);
        }
        block
    }

    /// Appends a detached block after the last child of `parent_position`.
    ///
    /// Levels are shifted so the block's head sits one level under the new
    /// parent; relative depths inside the block are kept. Returns the
    /// position of the block's head.
    pub(crate) fn attach_subtree(
        &mut self,
        mut block: Vec<TreeNodeRecord>,
        parent_position: usize,
    ) -> usize {
        let Some(head) = block.first() else {
            return parent_position;
        };
        let parent_level = self.records[parent_position].level;
        let shift = parent_level as isize + 1 - head.level as isize;

        for record in &mut block {
            record.level = (record.level as isize + shift) as usize;
        }
        block[0].parent_id = Some(self.records[parent_position].id.clone());

        let selected = block.iter().filter(|r| r.selected).count();
        let insert_at = self
            .last_descendant_position(parent_position)
            .map_or(parent_position + 1, |last| last + 1);

        self.records.splice(insert_at..insert_at, block);
        self.records[parent_position].has_children = true;
        self.adjust_ancestor_counts(insert_at, selected as isize);
        insert_at
    }

    // =========================================================================
    // Selection bookkeeping
    // =========================================================================

    /// Sets the own selection flag of a record and updates the
    /// selected-descendant count of each ancestor.
    ///
    /// Returns `true` if the flag changed.
    pub(crate) fn set_selected(&mut self, position: usize, selected: bool) -> bool {
        let Some(record) = self.records.get_mut(position) else {
            return false;
        };
        if record.selected == selected {
            return false;
        }
        record.selected = selected;
        self.adjust_ancestor_counts(position, if selected { 1 } else { -1 });
        true
    }

    fn adjust_ancestor_counts(&mut self, position: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for ancestor in self.ancestor_positions(position) {
            let record = &mut self.records[ancestor];
            record.selected_descendants = (record.selected_descendants as isize + delta).max(0) as usize;
        }
    }

    /// Whether the record at `position` hides the records nested under it.
    pub(crate) fn hides_children(&self, position: usize) -> bool {
        let record = &self.records[position];
        record.hidden || record.collapsed || !record.payload.visible
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Checks pre-order validity, parent linkage, the expand affordance and
    /// the selection cascade.
    pub fn check_invariants(&self) -> TreeResult<()> {
        let mut previous_level: Option<usize> = None;
        for (position, record) in self.records.iter().enumerate() {
            let max_level = previous_level.map_or(0, |level| level + 1);
            if record.level > max_level {
                return Err(TreeError::invariant(format!(
                    "'{}' at #{position} has level {} after level {:?}",
                    record.id, record.level, previous_level
                )));
            }
            previous_level = Some(record.level);

            let expected_parent = self
                .parent_position(position)
                .map(|pos| self.records[pos].id.as_str());
            if record.parent_id.as_deref() != expected_parent {
                return Err(TreeError::invariant(format!(
                    "'{}' names parent {:?} but sits under {:?}",
                    record.id, record.parent_id, expected_parent
                )));
            }

            if record.has_children != self.has_children_at(position) {
                return Err(TreeError::invariant(format!(
                    "'{}' has a stale children indicator",
                    record.id
                )));
            }

            let selected = self
                .child_positions(position, false)
                .into_iter()
                .filter(|&pos| self.records[pos].selected)
                .count();
            if record.selected_descendants != selected {
                return Err(TreeError::invariant(format!(
                    "'{}' counts {} selected descendants, found {}",
                    record.id, record.selected_descendants, selected
                )));
            }
        }
        Ok(())
    }
}
