//! Validating semantic actions driven by the grammar.
//!
//! The grammar driver owns the token stream and calls into [`ParseContext`]
//! once per recognized production, passing the source location and the typed
//! operands it has built so far. Every action validates its construct,
//! reports problems to the diagnostic sink, and returns the typed node (or a
//! placeholder) so that checking continues past errors.
//!
//! The implementation is split by concern:
//!
//! - `versions`: version, profile, stage and extension gating
//! - `callbacks`: host notification hooks and preprocessor relays
//! - `checks`: small reusable predicates on names and types
//! - `qualifiers`, `layout`: qualifier merging and layout resolution
//! - `blocks`: interface block declaration and member layout
//! - `declare`: variable and array declarations, initializers
//! - `io_arrays`: deferred sizing of per-vertex stage arrays
//! - `functions`: prototypes, definitions, calls and overloads
//! - `constructors`, `expressions`, `control`: expressions and statements

mod blocks;
mod callbacks;
mod checks;
mod constructors;
mod control;
mod declare;
mod expressions;
mod functions;
mod io_arrays;
mod layout;
mod options;
mod qualifiers;
mod versions;

#[cfg(test)]
mod blocks_tests;
#[cfg(test)]
mod callbacks_tests;
#[cfg(test)]
mod constructors_tests;
#[cfg(test)]
mod expressions_tests;
#[cfg(test)]
mod functions_tests;
#[cfg(test)]
mod io_arrays_tests;
#[cfg(test)]
mod layout_tests;
#[cfg(test)]
mod qualifiers_tests;
#[cfg(test)]
mod versions_tests;

use std::collections::BTreeMap;

use indexmap::IndexMap;

use glint_core::{Limits, Profile, Resources, SourceLoc, Stage};

use crate::diagnostics::{DiagnosticBuilder, DiagnosticKind, Diagnostics, Origin};
use crate::intermediate::{Intermediate, Node, ShaderLayout};
use crate::symbols::{SymbolId, SymbolTable};
use crate::types::{
    LayoutMatrix, LayoutPacking, Precision, Qualifier, Sampler, SamplerDim, Storage,
};
use crate::{Error, Result};

pub use callbacks::{Callbacks, PragmaRecord};
pub use control::{LoopKind, Nesting};
pub use io_arrays::{IoArrayState, IoResizeEntry};
pub use options::CompileOptions;
pub use versions::ExtensionBehavior;

use control::{NestingLevels, SwitchLevel};
use functions::CurrentFunction;

/// What a default precision statement applies to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrecisionSlot {
    Float,
    Int,
    AtomicUint,
    Sampler(Sampler),
}

/// Everything a finished compilation hands to the host.
#[derive(Debug)]
pub struct CompileOutput {
    /// Function definitions and global initializers, in source order.
    pub root: Option<Node>,
    /// Objects the linker needs whether or not the tree references them.
    pub linkage: Node,
    pub diagnostics: Diagnostics,
    pub symbols: SymbolTable,
    pub layout: ShaderLayout,
    pub pragma: PragmaRecord,
    pub io_arrays: Vec<IoResizeEntry>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Top-level declarations made by the source.
    pub fn declared_symbol_count(&self) -> usize {
        self.symbols.declared_count()
    }
}

/// Semantic state of one compilation unit.
pub struct ParseContext {
    pub(crate) stage: Stage,
    pub(crate) version: u32,
    pub(crate) profile: Profile,
    pub(crate) forward_compatible: bool,
    pub(crate) resources: Resources,
    pub(crate) limits: Limits,

    pub(crate) diagnostics: Diagnostics,
    pub(crate) symbols: SymbolTable,
    pub(crate) ast: Intermediate,
    pub(crate) callbacks: Callbacks,
    pub(crate) extensions: IndexMap<String, ExtensionBehavior>,
    pub(crate) pragma: PragmaRecord,

    pub(crate) nesting: NestingLevels,
    pub(crate) switch_levels: Vec<SwitchLevel>,
    pub(crate) current_function: Option<CurrentFunction>,
    /// A `return` at the top level of `main` was seen.
    pub(crate) post_main_return: bool,

    pub(crate) default_precision: IndexMap<PrecisionSlot, Precision>,
    pub(crate) global_uniform_defaults: Qualifier,
    pub(crate) global_buffer_defaults: Qualifier,
    pub(crate) global_input_defaults: Qualifier,
    pub(crate) global_output_defaults: Qualifier,
    /// Next free atomic counter offset per binding.
    pub(crate) atomic_uint_offsets: BTreeMap<u32, u32>,

    pub(crate) io_arrays: Vec<IoResizeEntry>,
    /// Loop indexes of ES 1.00 inductive loops currently or previously open.
    pub(crate) inductive_loop_ids: Vec<SymbolId>,
    /// Index expressions that must be constant-index-expressions under minimal limits.
    pub(crate) index_limit_checks: Vec<Node>,

    pub(crate) tree: Option<Node>,
    pub(crate) fatal: bool,
    /// Counter for compiler-generated temporaries.
    pub(crate) temporaries: u32,
}

impl std::fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("stage", &self.stage)
            .field("version", &self.version)
            .field("profile", &self.profile)
            .field("errors", &self.diagnostics.error_count())
            .finish_non_exhaustive()
    }
}

impl ParseContext {
    pub fn new(options: CompileOptions) -> Result<Self> {
        options.resources.validate()?;
        let built_ins = options.build_built_ins();
        let CompileOptions {
            stage,
            version,
            profile,
            forward_compatible,
            policy,
            resources,
            ..
        } = options;

        let mut ctx = Self {
            stage,
            version,
            profile,
            forward_compatible,
            limits: resources.limits,
            resources,
            diagnostics: Diagnostics::with_policy(policy),
            symbols: SymbolTable::new(built_ins),
            ast: Intermediate::new(stage, version, profile),
            callbacks: Callbacks::default(),
            extensions: IndexMap::new(),
            pragma: PragmaRecord::default(),
            nesting: NestingLevels::default(),
            switch_levels: Vec::new(),
            current_function: None,
            post_main_return: false,
            default_precision: IndexMap::new(),
            global_uniform_defaults: Qualifier::new(Storage::Uniform),
            global_buffer_defaults: Qualifier::new(Storage::Buffer),
            global_input_defaults: Qualifier::new(Storage::VaryingIn),
            global_output_defaults: Qualifier::new(Storage::VaryingOut),
            atomic_uint_offsets: BTreeMap::new(),
            io_arrays: Vec::new(),
            inductive_loop_ids: Vec::new(),
            index_limit_checks: Vec::new(),
            tree: None,
            fatal: false,
            temporaries: 0,
        };
        ctx.set_precision_defaults();
        ctx.set_global_defaults();
        tracing::debug!(stage = %stage, version, profile = ?profile, "parse context ready");
        Ok(ctx)
    }

    fn set_precision_defaults(&mut self) {
        if self.profile != Profile::Es {
            return;
        }
        let int = if self.stage == Stage::Fragment {
            Precision::Medium
        } else {
            Precision::High
        };
        self.default_precision.insert(PrecisionSlot::Int, int);
        if self.stage != Stage::Fragment {
            self.default_precision
                .insert(PrecisionSlot::Float, Precision::High);
        }
        self.default_precision
            .insert(PrecisionSlot::AtomicUint, Precision::High);
        for dim in [SamplerDim::D2, SamplerDim::Cube] {
            self.default_precision.insert(
                PrecisionSlot::Sampler(Sampler::combined(crate::types::BasicType::Float, dim)),
                Precision::Low,
            );
        }
    }

    fn set_global_defaults(&mut self) {
        for defaults in [
            &mut self.global_uniform_defaults,
            &mut self.global_buffer_defaults,
        ] {
            defaults.layout.matrix = Some(LayoutMatrix::ColumnMajor);
            defaults.layout.packing = Some(LayoutPacking::Shared);
        }
        if self.stage == Stage::Geometry {
            self.global_output_defaults.layout.stream = Some(0);
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn is_es(&self) -> bool {
        self.profile == Profile::Es
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn intermediate(&self) -> &Intermediate {
        &self.ast
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Replace the capability flags, e.g. with [`Limits::minimal`].
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
        self.resources.limits = limits;
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    pub fn push_scope(&mut self) {
        self.symbols.push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.symbols.pop_scope();
    }

    // Diagnostics

    pub(crate) fn report(&mut self, kind: DiagnosticKind, loc: SourceLoc) -> DiagnosticBuilder<'_> {
        self.diagnostics.report(kind, loc)
    }

    /// An error that the relaxed-errors policy downgrades to a warning.
    pub(crate) fn report_relaxed(
        &mut self,
        kind: DiagnosticKind,
        loc: SourceLoc,
    ) -> DiagnosticBuilder<'_> {
        let relaxed = self.diagnostics.policy().is_relaxed();
        let builder = self.diagnostics.report(kind, loc);
        if relaxed { builder.warning() } else { builder }
    }

    pub fn error(
        &mut self,
        loc: SourceLoc,
        kind: DiagnosticKind,
        reason: &str,
        token: &str,
        extra: &str,
    ) {
        self.report(kind, loc)
            .message(reason)
            .token(token)
            .extra(extra)
            .emit();
    }

    pub fn warn(
        &mut self,
        loc: SourceLoc,
        kind: DiagnosticKind,
        reason: &str,
        token: &str,
        extra: &str,
    ) {
        self.report(kind, loc)
            .message(reason)
            .token(token)
            .extra(extra)
            .warning()
            .emit();
    }

    pub fn pp_error(&mut self, loc: SourceLoc, reason: &str, token: &str, extra: &str) {
        self.report(DiagnosticKind::Preprocessor, loc)
            .message(reason)
            .token(token)
            .extra(extra)
            .origin(Origin::Preprocessor)
            .emit();
    }

    pub fn pp_warn(&mut self, loc: SourceLoc, reason: &str, token: &str, extra: &str) {
        self.report(DiagnosticKind::Preprocessor, loc)
            .message(reason)
            .token(token)
            .extra(extra)
            .origin(Origin::Preprocessor)
            .warning()
            .emit();
    }

    /// Relay a syntax error found by the grammar driver.
    pub fn parser_error(&mut self, loc: SourceLoc, message: &str) {
        self.report(DiagnosticKind::Syntax, loc)
            .message(message)
            .emit();
    }

    /// Enter the terminal state. The driver stops feeding productions.
    pub fn set_fatal(&mut self, loc: SourceLoc, message: &str) {
        self.report(DiagnosticKind::Fatal, loc)
            .message(message)
            .emit();
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    // Tree

    /// Append a top-level node (function definition or global initializer).
    pub fn append_to_tree(&mut self, node: Node) {
        let loc = node.loc;
        let tree = self.tree.take();
        self.tree = self.ast.grow_aggregate(tree, Some(node), loc);
    }

    /// Run the end-of-unit checks and hand over the results.
    ///
    /// Fails only when the unit was abandoned after a fatal error; ordinary
    /// errors are in the returned diagnostics.
    pub fn finish(mut self, end: SourceLoc) -> Result<CompileOutput> {
        if self.fatal {
            return Err(Error::Fatal(self.diagnostics));
        }
        self.final_error_check(end);

        let root = self.tree.take().map(|tree| {
            let loc = tree.loc;
            self.ast.set_aggregate_operator(
                Some(tree),
                crate::intermediate::Op::Sequence,
                &crate::types::Type::void(),
                loc,
            )
        });
        let linkage = self.ast.take_linkage(end);
        tracing::debug!(
            errors = self.diagnostics.error_count(),
            warnings = self.diagnostics.warning_count(),
            "compilation unit finished"
        );
        Ok(CompileOutput {
            root,
            linkage,
            layout: self.ast.layout().clone(),
            diagnostics: self.diagnostics,
            symbols: self.symbols,
            pragma: self.pragma,
            io_arrays: self.io_arrays,
        })
    }
}
