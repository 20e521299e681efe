//! Human-readable dumps of the flat index.
//!
//! ```
//! use lattice_tree::tree::{IndexDebug, TreeFormatOptions, TreeItem, TreeWidget};
//!
//! let tree = TreeWidget::from_items(
//!     vec![TreeItem::new("Root").with_id("root").child(TreeItem::new("A").with_id("a"))],
//!     Default::default(),
//! );
//! let dump = IndexDebug::with_options(tree.index(), TreeFormatOptions::minimal()).to_string();
//! assert_eq!(dump, "Root\n\u{2514}\u{2500}\u{2500} A\n");
//! ```

use std::fmt;

use super::index::FlatIndex;
use super::record::TreeNodeRecord;

/// Branch drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Plain indentation, no branches.
    Compact,
}

/// Configuration for index dumps.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Append `[id]` after each label.
    pub show_ids: bool,
    /// Append state markers: selected, semi-selected, collapsed, hidden,
    /// filtered.
    pub show_state: bool,
    /// Deepest level to print (None for unlimited).
    pub max_depth: Option<usize>,
    /// Spaces per nesting level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_state: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Labels only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_state: false,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Renders a [`FlatIndex`] as an indented tree through `Display`.
#[derive(Debug, Clone)]
pub struct IndexDebug<'a> {
    index: &'a FlatIndex,
    options: TreeFormatOptions,
}

impl<'a> IndexDebug<'a> {
    pub fn new(index: &'a FlatIndex) -> Self {
        Self::with_options(index, TreeFormatOptions::default())
    }

    pub fn with_options(index: &'a FlatIndex, options: TreeFormatOptions) -> Self {
        Self { index, options }
    }

    /// Whether no later sibling follows the record at `position`.
    fn is_last_sibling(&self, position: usize) -> bool {
        let level = self.index.records()[position].level;
        self.index.records()[position + 1..]
            .iter()
            .find(|candidate| candidate.level <= level)
            .is_none_or(|candidate| candidate.level < level)
    }

    /// `open[d]` tells whether the ancestor at depth `d + 1` still has
    /// siblings to come, which decides if a vertical bar is drawn.
    fn write_prefix(&self, f: &mut fmt::Formatter<'_>, open: &[bool], is_last: bool) -> fmt::Result {
        let Some((_, parents)) = open.split_last() else {
            return Ok(());
        };

        let (bar, tee, elbow) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "", ""),
        };
        let pad = " ".repeat(self.options.indent_size);

        for &more in parents {
            if more {
                write!(f, "{bar}{pad}")?;
            } else {
                write!(f, "{}{pad}", " ".repeat(bar.chars().count()))?;
            }
        }

        match self.options.style {
            TreeStyle::Compact => write!(f, "{pad}"),
            _ => write!(f, "{} ", if is_last { elbow } else { tee }),
        }
    }

    fn write_state(&self, f: &mut fmt::Formatter<'_>, record: &TreeNodeRecord) -> fmt::Result {
        let markers: Vec<&str> = [
            (record.selected, "selected"),
            (record.is_semi_selected(), "semi"),
            (record.collapsed, "collapsed"),
            (record.hidden, "hidden"),
            (record.filtered, "filtered"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        if markers.is_empty() {
            Ok(())
        } else {
            write!(f, " <{}>", markers.join(","))
        }
    }
}

impl fmt::Display for IndexDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index.is_empty() {
            return writeln!(f, "(empty)");
        }

        let mut open: Vec<bool> = Vec::new();
        for (position, record) in self.index.iter().enumerate() {
            let is_last = self.is_last_sibling(position);
            open.truncate(record.level);
            open.push(!is_last);

            if self
                .options
                .max_depth
                .is_some_and(|max| record.level > max)
            {
                continue;
            }

            self.write_prefix(f, &open[1..], is_last)?;
            let label = if record.label().is_empty() {
                "(unnamed)"
            } else {
                record.label()
            };
            f.write_str(label)?;
            if self.options.show_ids {
                write!(f, " [{}]", record.id)?;
            }
            if self.options.show_state {
                self.write_state(f, record)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
