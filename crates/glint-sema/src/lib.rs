//! Glint: validating semantic analysis for GLSL.
//!
//! A grammar driver (not part of this crate) recognizes productions and
//! calls the matching action on [`ParseContext`]. Each action checks its
//! construct against the language rules for the selected stage, version and
//! profile, records symbols, builds a typed node, and reports problems to
//! [`Diagnostics`] without stopping.
//!
//! # Example
//!
//! ```
//! use glint_core::{SourceLoc, Stage};
//! use glint_sema::{CompileOptions, ParseContext};
//! use glint_sema::types::{BasicType, PublicType, Storage};
//!
//! let mut ctx = ParseContext::new(CompileOptions::new(Stage::Fragment)).expect("valid resources");
//! let loc = SourceLoc::line(1);
//!
//! let mut vec4 = PublicType::new(loc);
//! vec4.basic = BasicType::Float;
//! vec4.vector_size = 4;
//! vec4.qualifier.storage = Storage::VaryingOut;
//! ctx.declare_variable(loc, "color", &vec4, None, None);
//!
//! let output = ctx.finish(SourceLoc::line(2)).expect("not fatal");
//! // No `main` was defined.
//! assert!(output.has_errors());
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod context;
pub mod diagnostics;
pub mod intermediate;
pub mod symbols;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use context::{CompileOptions, CompileOutput, ParseContext};
pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, MessagePolicy, Severity};

/// Errors that abandon a compilation unit.
///
/// Ordinary semantic errors are not `Error`s: they are collected in
/// [`Diagnostics`] and checking continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A fatal condition stopped the unit; the diagnostics explain why.
    #[error("compilation abandoned after {} errors", .0.error_count())]
    Fatal(Diagnostics),

    #[error(transparent)]
    Resources(#[from] glint_core::ResourcesError),
}

/// Result type for compilation-unit operations.
pub type Result<T> = std::result::Result<T, Error>;
