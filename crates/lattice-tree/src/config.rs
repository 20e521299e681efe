//! Tree widget configuration.
//!
//! [`TreeConfig`] can be built in code with the `with_*` setters or loaded
//! from TOML. Every key is optional; missing keys fall back to the defaults.
//!
//! ```toml
//! selection_mode = "multi"
//! default_collapse_depth = 2
//! drag_drop_enabled = true
//! cascade_remove = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::tree::SelectionMode;

/// Behavioural settings for a [`TreeWidget`](crate::tree::TreeWidget).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Whether plain selection is exclusive or additive selection is allowed.
    pub selection_mode: SelectionMode,
    /// Records at or below this level start collapsed. `None` expands everything.
    pub default_collapse_depth: Option<usize>,
    /// Whether drag gestures produce payloads and drops are honoured.
    pub drag_drop_enabled: bool,
    /// Whether a delete intent removes the whole subtree or promotes children.
    pub cascade_remove: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::Single,
            default_collapse_depth: None,
            drag_drop_enabled: true,
            cascade_remove: true,
        }
    }
}

impl TreeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> TreeResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads a configuration from a TOML file.
    pub fn load_toml(path: impl AsRef<Path>) -> TreeResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TreeError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Sets the selection mode.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Sets the level from which new records start collapsed.
    pub fn with_default_collapse_depth(mut self, depth: Option<usize>) -> Self {
        self.default_collapse_depth = depth;
        self
    }

    /// Enables or disables drag and drop.
    pub fn with_drag_drop(mut self, enabled: bool) -> Self {
        self.drag_drop_enabled = enabled;
        self
    }

    /// Sets whether delete intents cascade to the subtree.
    pub fn with_cascade_remove(mut self, cascade: bool) -> Self {
        self.cascade_remove = cascade;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::default();
        assert_eq!(config.selection_mode, SelectionMode::Single);
        assert_eq!(config.default_collapse_depth, None);
        assert!(config.drag_drop_enabled);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TreeConfig::from_toml_str(
            r#"
            selection_mode = "multi"
            default_collapse_depth = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.selection_mode, SelectionMode::Multi);
        assert_eq!(config.default_collapse_depth, Some(2));
        assert!(config.cascade_remove);
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = TreeConfig::from_toml_str("selection_mode = \"sideways\"").unwrap_err();
        assert!(matches!(err, TreeError::Config(_)));
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "drag_drop_enabled = false").unwrap();

        let config = TreeConfig::load_toml(file.path()).unwrap();
        assert!(!config.drag_drop_enabled);
    }

    #[test]
    fn test_load_toml_missing_file() {
        let err = TreeConfig::load_toml("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TreeError::Io { .. }));
    }

    #[test]
    fn test_builder() {
        let config = TreeConfig::new()
            .with_selection_mode(SelectionMode::Multi)
            .with_default_collapse_depth(Some(0))
            .with_cascade_remove(false);
        assert_eq!(config.default_collapse_depth, Some(0));
        assert!(!config.cascade_remove);
    }
}
