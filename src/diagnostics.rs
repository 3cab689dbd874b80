//! Structured error and warning descriptors handed to the host for display.
//!
//! Every descriptor belongs to a `group`. The host clears descriptors by group, so fixing one
//! problem class never requires re-triggering an unrelated one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Error groups used by the render pipeline.
pub mod groups {
    pub const PIVOTS: &str = "pivot-req";
    pub const DIMENSIONS: &str = "dim-req";
    pub const MEASURES: &str = "mes-req";
    pub const CONFIG: &str = "config";
    pub const DATA: &str = "data";
    pub const Y_BOUNDS: &str = "y-bounds";
    pub const FIELDS: &str = "fields";
    pub const COLORS: &str = "colors";
    pub const LOG_SCALE: &str = "log-scale";
    pub const FORMAT: &str = "format";

    /// Groups owned by non-fatal configuration warnings.
    pub const WARNINGS: &[&str] = &[Y_BOUNDS, LOG_SCALE, FIELDS, COLORS, FORMAT];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub group: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(group: &str, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group: group.to_string(),
            title: title.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(group: &str, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group: group.to_string(),
            title: title.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Where a render pass reports problems. Implemented by the host integration.
pub trait ErrorSink {
    fn add_error(&mut self, diagnostic: Diagnostic);
    fn clear_errors(&mut self, group: &str);
}

/// In-memory sink keeping at most one descriptor per group, latest wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: IndexMap<String, Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: &str) -> Option<&Diagnostic> {
        self.entries.get(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.values().any(Diagnostic::is_error)
    }
}

impl ErrorSink for Diagnostics {
    fn add_error(&mut self, diagnostic: Diagnostic) {
        self.entries.insert(diagnostic.group.clone(), diagnostic);
    }

    fn clear_errors(&mut self, group: &str) {
        self.entries.shift_remove(group);
    }
}
