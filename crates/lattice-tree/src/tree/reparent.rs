//! Reparenting of whole subtrees.
//!
//! A move is validated completely before the sequence is touched: the target
//! must differ from the node, both ids must resolve, the target must not sit
//! inside the node's subtree and must not already be the node's parent. Only
//! then is the subtree cut out and appended as one block after the new
//! parent's last child, with every level shifted by the same offset.

use lattice_tree_core::targets;

use super::index::FlatIndex;
use super::visibility;
use crate::error::{TreeError, TreeResult};

/// A validated move, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MovePlan {
    node_id: String,
    node_position: usize,
    parent_id: String,
    parent_position: usize,
    old_parent_id: Option<String>,
}

/// What a successful move changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub id: String,
    pub old_parent_id: Option<String>,
    pub new_parent_id: String,
    /// Position of the moved node after the move.
    pub position: usize,
    /// Number of records moved, the node included.
    pub moved: usize,
}

/// Validates and applies reparent operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveValidator;

impl MoveValidator {
    /// Checks whether `node_id` may be moved under `new_parent_id`.
    pub(crate) fn validate(
        &self,
        index: &FlatIndex,
        node_id: &str,
        new_parent_id: &str,
    ) -> TreeResult<MovePlan> {
        if node_id == new_parent_id {
            return Err(TreeError::cycle(node_id, new_parent_id));
        }

        let node_position = index.position_of(node_id)?;
        let parent_position = index.position_of(new_parent_id)?;

        if index
            .ancestor_positions(parent_position)
            .contains(&node_position)
        {
            tracing::debug!(
                target: targets::REPARENT,
                node = node_id,
                destination = new_parent_id,
                "move rejected: target is a descendant"
            );
            return Err(TreeError::cycle(node_id, new_parent_id));
        }

        let old_parent_id = index.records()[node_position].parent_id.clone();
        let structural_parent = index
            .parent_position(node_position)
            .map(|pos| index.records()[pos].id.as_str());
        if let Some(old) = old_parent_id.as_deref() {
            if index.index_of(old).is_none() || structural_parent != Some(old) {
                tracing::error!(
                    target: targets::REPARENT,
                    node = node_id,
                    parent = old,
                    "parent of moved node cannot be resolved"
                );
                return Err(TreeError::invariant(format!(
                    "parent '{old}' of '{node_id}' cannot be resolved"
                )));
            }
        }

        if old_parent_id.as_deref() == Some(new_parent_id) {
            tracing::debug!(
                target: targets::REPARENT,
                node = node_id,
                "move rejected: already under target"
            );
            return Err(TreeError::no_op(format!(
                "'{node_id}' is already a child of '{new_parent_id}'"
            )));
        }

        Ok(MovePlan {
            node_id: node_id.to_string(),
            node_position,
            parent_id: new_parent_id.to_string(),
            parent_position,
            old_parent_id,
        })
    }

    /// Applies a plan produced by [`validate`](Self::validate). A plan whose
    /// positions no longer name the same records is rejected untouched.
    pub(crate) fn apply(&self, index: &mut FlatIndex, plan: MovePlan) -> TreeResult<MoveOutcome> {
        let MovePlan {
            node_id,
            node_position,
            parent_id,
            mut parent_position,
            old_parent_id,
        } = plan;

        let names = |position: usize, id: &str| index.get(position).is_some_and(|r| r.id == id);
        if !names(node_position, &node_id) || !names(parent_position, &parent_id) {
            tracing::error!(
                target: targets::REPARENT,
                node = %node_id,
                destination = %parent_id,
                "stale move plan"
            );
            return Err(TreeError::invariant(format!(
                "move of '{node_id}' under '{parent_id}' no longer matches the index"
            )));
        }

        let block = index.detach_subtree(node_position);
        let moved = block.len();
        if parent_position > node_position {
            parent_position -= moved;
        }

        let position = index.attach_subtree(block, parent_position);
        visibility::refresh_subtree(index, position);

        let record = &index.records()[position];
        let outcome = MoveOutcome {
            id: record.id.clone(),
            old_parent_id,
            new_parent_id: index.records()[parent_position].id.clone(),
            position,
            moved,
        };

        tracing::debug!(
            target: targets::REPARENT,
            node = %outcome.id,
            from = ?outcome.old_parent_id,
            to = %outcome.new_parent_id,
            moved,
            "moved subtree"
        );
        Ok(outcome)
    }

    /// Validates and applies in one step. Leaves the index untouched on error.
    pub fn move_node(
        &self,
        index: &mut FlatIndex,
        node_id: &str,
        new_parent_id: &str,
    ) -> TreeResult<MoveOutcome> {
        let plan = self.validate(index, node_id, new_parent_id)?;
        self.apply(index, plan)
    }
}
