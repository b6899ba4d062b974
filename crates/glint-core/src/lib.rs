#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by every layer of the glint front end.
//!
//! - **Locations**: `SourceLoc`, attached to every diagnostic and node
//! - **Language selection**: `Stage`, `Profile`, `ProfileMask`, version constants
//! - **Limits**: `Resources` numeric limits and `Limits` capability flags

mod resources;
mod stage;

#[cfg(test)]
mod lib_tests;

pub use resources::{Limits, Resources, ResourcesError};
pub use stage::{Profile, ProfileMask, Stage, StageMask, is_known_version};

/// Position of a construct in the shader source.
///
/// `string` is the index of the source string (the `0` in `0:12`), `line` is
/// 1-based. Column is informational only and not part of rendered messages.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct SourceLoc {
    pub string: u32,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(string: u32, line: u32) -> Self {
        Self {
            string,
            line,
            column: 0,
        }
    }

    /// Convenience for single-string sources.
    pub fn line(line: u32) -> Self {
        Self::new(0, line)
    }

    pub fn with_column(self, column: u32) -> Self {
        Self { column, ..self }
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.string, self.line)
    }
}
