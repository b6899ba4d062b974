//! Which diagnostics are kept, dropped or escalated.

use std::collections::BTreeSet;

use super::message::{DiagnosticKind, Severity};

/// Policy applied to every diagnostic as it is emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct MessagePolicy {
    /// Drop warnings entirely.
    pub(crate) suppress_warnings: bool,
    /// Report warnings as errors.
    pub(crate) warnings_as_errors: bool,
    /// Downgrade portability-only errors to warnings.
    pub(crate) relaxed_errors: bool,
    /// Kinds that are never reported.
    pub(crate) suppressed: BTreeSet<DiagnosticKind>,
}

impl MessagePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_warnings(mut self, value: bool) -> Self {
        self.suppress_warnings = value;
        self
    }

    pub fn warnings_as_errors(mut self, value: bool) -> Self {
        self.warnings_as_errors = value;
        self
    }

    pub fn relaxed_errors(mut self, value: bool) -> Self {
        self.relaxed_errors = value;
        self
    }

    pub fn suppress(mut self, kind: DiagnosticKind) -> Self {
        self.suppressed.insert(kind);
        self
    }

    pub fn is_relaxed(&self) -> bool {
        self.relaxed_errors
    }

    /// Final severity for a message, or `None` if it must be dropped.
    pub(crate) fn apply(&self, kind: DiagnosticKind, severity: Severity) -> Option<Severity> {
        if self.suppressed.contains(&kind) {
            return None;
        }
        match severity {
            Severity::Warning if self.warnings_as_errors => Some(Severity::Error),
            Severity::Warning if self.suppress_warnings => None,
            other => Some(other),
        }
    }
}
