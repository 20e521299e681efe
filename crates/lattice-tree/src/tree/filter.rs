//! Predicate filtering over the flat index.
//!
//! Filtering only marks records; the sequence is never reordered and no
//! structural state changes. An explicitly invisible record stays excluded
//! even when the predicate accepts it.

use std::fmt;
use std::sync::Arc;

use lattice_tree_core::logging::span_names;
use lattice_tree_core::{targets, PerfSpan};

use super::index::FlatIndex;
use super::record::TreeNodeRecord;

/// Predicate deciding whether a record passes the filter.
pub type FilterFn = Arc<dyn Fn(&TreeNodeRecord) -> bool + Send + Sync>;

/// Holds the active predicate and applies it to records.
#[derive(Clone, Default)]
pub struct FilterEngine {
    predicate: Option<FilterFn>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a predicate is installed.
    pub fn is_active(&self) -> bool {
        self.predicate.is_some()
    }

    /// Installs `predicate`, or clears every mark when `None`, and re-marks
    /// every record. Returns the number of records filtered out.
    pub fn set_predicate(&mut self, index: &mut FlatIndex, predicate: Option<FilterFn>) -> usize {
        let _perf = PerfSpan::new(span_names::FILTER);
        self.predicate = predicate;

        let mut excluded = 0;
        for record in index.records_mut() {
            self.mark(record);
            if record.filtered {
                excluded += 1;
            }
        }

        tracing::debug!(
            target: targets::FILTER,
            active = self.is_active(),
            excluded,
            records = index.len(),
            "filter applied"
        );
        excluded
    }

    /// Installs a predicate built from a closure.
    pub fn filter_by_predicate<F>(&mut self, index: &mut FlatIndex, predicate: F) -> usize
    where
        F: Fn(&TreeNodeRecord) -> bool + Send + Sync + 'static,
    {
        self.set_predicate(index, Some(Arc::new(predicate)))
    }

    /// Keeps records whose label contains `text`, ignoring case. An empty
    /// string clears the filter.
    pub fn filter_by_text(&mut self, index: &mut FlatIndex, text: &str) -> usize {
        if text.is_empty() {
            return self.set_predicate(index, None);
        }
        let needle = text.to_lowercase();
        self.filter_by_predicate(index, move |record| {
            record.label().to_lowercase().contains(&needle)
        })
    }

    /// Removes the predicate and every mark.
    pub fn clear(&mut self, index: &mut FlatIndex) {
        self.set_predicate(index, None);
    }

    /// Marks a single record against the current predicate. Used for records
    /// inserted or updated while a filter is active.
    pub fn mark(&self, record: &mut TreeNodeRecord) {
        record.filtered = match &self.predicate {
            Some(predicate) => !record.payload.visible || !predicate(record),
            None => false,
        };
    }

    /// Ids of the records currently marked as filtered out.
    pub fn filtered_ids(&self, index: &FlatIndex) -> Vec<String> {
        index
            .iter()
            .filter(|r| r.filtered)
            .map(|r| r.id.clone())
            .collect()
    }
}

impl fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::record::NodePayload;

    fn sample() -> FlatIndex {
        let mut index = FlatIndex::new();
        for (id, label, parent) in [
            ("root", "Root", None),
            ("docs", "Documents", Some("root")),
            ("notes", "notes.txt", Some("docs")),
            ("pics", "Pictures", Some("root")),
            ("cat", "Cat.png", Some("pics")),
        ] {
            index
                .insert_at(TreeNodeRecord::new(id, NodePayload::new(label)), parent, None)
                .unwrap();
        }
        index
    }

    #[test]
    fn test_predicate_marks_without_reordering() {
        let mut index = sample();
        let mut filter = FilterEngine::new();
        let before: Vec<String> = index.iter().map(|r| r.id.clone()).collect();

        let excluded = filter.filter_by_predicate(&mut index, |r| r.level() < 2);
        assert_eq!(excluded, 2);
        assert_eq!(filter.filtered_ids(&index), vec!["notes", "cat"]);

        let after: Vec<String> = index.iter().map(|r| r.id.clone()).collect();
        assert_eq!(before, after);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut index = sample();
        let mut filter = FilterEngine::new();
        let predicate: FilterFn = Arc::new(|r: &TreeNodeRecord| r.label().contains('o'));

        filter.set_predicate(&mut index, Some(predicate.clone()));
        let once = filter.filtered_ids(&index);
        filter.set_predicate(&mut index, Some(predicate));
        assert_eq!(filter.filtered_ids(&index), once);
    }

    #[test]
    fn test_invisible_stays_excluded() {
        let mut index = sample();
        index.records_mut()[3].payload.visible = false;
        let mut filter = FilterEngine::new();

        filter.filter_by_predicate(&mut index, |_| true);
        assert_eq!(filter.filtered_ids(&index), vec!["pics"]);
    }

    #[test]
    fn test_text_filter_ignores_case() {
        let mut index = sample();
        let mut filter = FilterEngine::new();

        filter.filter_by_text(&mut index, "PIC");
        assert_eq!(filter.filtered_ids(&index), vec!["root", "docs", "notes", "cat"]);

        filter.filter_by_text(&mut index, "");
        assert!(!filter.is_active());
        assert!(filter.filtered_ids(&index).is_empty());
    }

    #[test]
    fn test_clear_removes_marks() {
        let mut index = sample();
        let mut filter = FilterEngine::new();
        filter.filter_by_predicate(&mut index, |_| false);
        assert_eq!(filter.filtered_ids(&index).len(), 5);

        filter.clear(&mut index);
        assert!(filter.filtered_ids(&index).is_empty());
    }

    #[test]
    fn test_mark_new_record() {
        let mut filter = FilterEngine::new();
        let mut index = sample();
        filter.filter_by_text(&mut index, "cat");

        let mut record = TreeNodeRecord::new("dog", NodePayload::new("Dog.png"));
        filter.mark(&mut record);
        assert!(record.is_filtered());
    }
}
