//! Statements: nesting bookkeeping, switch, loops, branches, and the
//! end-of-unit checks.

use glint_core::{ProfileMask, SourceLoc, Stage, StageMask};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{BranchOp, Node, NodeKind, Op};
use crate::symbols::SymbolId;
use crate::types::{BasicType, Type};

use super::ParseContext;

const LIMITATIONS: &str = "limitations";

/// Nesting counters the grammar driver keeps paired.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Nesting {
    Loop,
    /// Any construct that branches: selection bodies, loops, switch.
    ControlFlow,
    /// Compound statements.
    Statement,
    /// Struct and block member lists.
    Struct,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LoopKind {
    For,
    While,
    DoWhile,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub(crate) struct NestingLevels {
    pub(crate) loops: u32,
    pub(crate) control_flow: u32,
    pub(crate) statements: u32,
    pub(crate) structs: u32,
}

impl NestingLevels {
    fn counter(&mut self, kind: Nesting) -> &mut u32 {
        match kind {
            Nesting::Loop => &mut self.loops,
            Nesting::ControlFlow => &mut self.control_flow,
            Nesting::Statement => &mut self.statements,
            Nesting::Struct => &mut self.structs,
        }
    }

    /// A function body starts outside any statement.
    pub(crate) fn reset_statements(&mut self) {
        self.loops = 0;
        self.control_flow = 0;
        self.statements = 0;
    }
}

/// One open `switch`.
#[derive(Clone, Debug)]
pub(crate) struct SwitchLevel {
    /// Case labels and statement sequences in source order.
    pub(crate) sequence: Vec<Node>,
    /// Statement nesting of the switch body; labels must sit at this level.
    pub(crate) statement_level: u32,
}

impl ParseContext {
    pub fn push_nesting(&mut self, kind: Nesting) {
        *self.nesting.counter(kind) += 1;
    }

    pub fn pop_nesting(&mut self, kind: Nesting) {
        let counter = self.nesting.counter(kind);
        debug_assert!(*counter > 0, "unbalanced pop of {kind:?} nesting");
        *counter = counter.saturating_sub(1);
    }

    pub fn nesting_level(&self, kind: Nesting) -> u32 {
        match kind {
            Nesting::Loop => self.nesting.loops,
            Nesting::ControlFlow => self.nesting.control_flow,
            Nesting::Statement => self.nesting.statements,
            Nesting::Struct => self.nesting.structs,
        }
    }

    // Switch

    /// `switch (...) {` has been read.
    pub fn begin_switch(&mut self) {
        self.push_nesting(Nesting::ControlFlow);
        self.push_nesting(Nesting::Statement);
        self.switch_levels.push(SwitchLevel {
            sequence: Vec::new(),
            statement_level: self.nesting.statements,
        });
        self.symbols.push_scope();
    }

    /// `case expr:` or, with no expression, `default:`.
    pub fn handle_case_label(&mut self, loc: SourceLoc, value: Option<Node>) -> Option<Node> {
        let token = if value.is_some() { "case" } else { "default" };
        let Some(level) = self.switch_levels.last() else {
            self.report(DiagnosticKind::ControlFlow, loc)
                .message("cannot appear outside switch statement")
                .token(token)
                .emit();
            return None;
        };
        if level.statement_level != self.nesting.statements {
            self.report(DiagnosticKind::ControlFlow, loc)
                .message("cannot be nested inside control flow")
                .token(token)
                .emit();
            return None;
        }
        match value {
            Some(value) => {
                self.constant_value_check(&value, "case");
                self.integer_check(&value, "case");
                Some(self.ast.add_branch(BranchOp::Case, Some(value), loc))
            }
            None => Some(self.ast.add_branch(BranchOp::Default, None, loc)),
        }
    }

    /// Close the statements following a label and append the next label.
    pub fn wrapup_switch_subsequence(&mut self, statements: Option<Node>, label: Option<Node>) {
        let Some(level) = self.switch_levels.last() else {
            return;
        };
        let empty = level.sequence.is_empty();
        let mut duplicate = None;
        if let Some(label) = &label
            && let NodeKind::Branch { value: new, .. } = &label.kind
        {
            let new_value = new.as_deref().and_then(Node::const_int);
            for prev in &level.sequence {
                let NodeKind::Branch { value: old, .. } = &prev.kind else {
                    continue;
                };
                match (old.as_deref(), new.as_deref()) {
                    (None, None) => duplicate = Some(("duplicate label", "default")),
                    (Some(old), Some(_)) if old.const_int().is_some() && old.const_int() == new_value => {
                        duplicate = Some(("duplicated value", "case"));
                    }
                    _ => {}
                }
            }
        }

        if let Some(statements) = statements {
            if empty {
                self.report(DiagnosticKind::ControlFlow, statements.loc)
                    .message("cannot have statements before first case/default label")
                    .token("switch")
                    .emit();
            }
            let loc = statements.loc;
            let sequence = self
                .ast
                .set_aggregate_operator(Some(statements), Op::Sequence, &Type::void(), loc);
            if let Some(level) = self.switch_levels.last_mut() {
                level.sequence.push(sequence);
            }
        }
        if let Some(label) = label {
            if let Some((message, token)) = duplicate {
                self.report(DiagnosticKind::ControlFlow, label.loc)
                    .message(message)
                    .token(token)
                    .emit();
            }
            if let Some(level) = self.switch_levels.last_mut() {
                level.sequence.push(label);
            }
        }
    }

    /// `}` closing the switch body. `last` holds the statements after the
    /// final label.
    pub fn add_switch(&mut self, loc: SourceLoc, expression: Node, last: Option<Node>) -> Node {
        self.profile_requires(loc, ProfileMask::ES, 300, &[], "switch statements");
        self.profile_requires(loc, ProfileMask::NONE, 130, &[], "switch statements");
        let has_last = last.is_some();
        self.wrapup_switch_subsequence(last, None);

        let ty = &expression.ty;
        if !matches!(ty.basic, BasicType::Int | BasicType::Uint) || !ty.is_scalar() || ty.is_array() {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("condition must be a scalar integer expression")
                .token("switch")
                .emit();
        }

        let mut level = self.switch_levels.pop().unwrap_or(SwitchLevel {
            sequence: Vec::new(),
            statement_level: 0,
        });
        self.symbols.pop_scope();
        self.pop_nesting(Nesting::Statement);
        self.pop_nesting(Nesting::ControlFlow);

        if level.sequence.is_empty() {
            return expression;
        }
        if !has_last {
            const MESSAGE: &str = "last case/default label not followed by statements";
            if self.is_es() && self.version <= 300 {
                self.report_relaxed(DiagnosticKind::ControlFlow, loc)
                    .message(MESSAGE)
                    .token("switch")
                    .emit();
            } else {
                self.warn(loc, DiagnosticKind::ControlFlow, MESSAGE, "switch", "");
            }
            let brk = self.ast.add_branch(BranchOp::Break, None, loc);
            let recovery = self.ast.set_aggregate_operator(Some(brk), Op::Sequence, &Type::void(), loc);
            level.sequence.push(recovery);
        }

        let body = self
            .ast
            .add_named_aggregate(Op::Sequence, "", level.sequence, &Type::void(), loc);
        self.ast.add_switch(expression, body, loc)
    }

    // Loops

    /// Loop header reached; opens the loop scope.
    pub fn begin_loop(&mut self, loc: SourceLoc, kind: LoopKind) {
        match kind {
            LoopKind::While if !self.limits.while_loops => {
                self.error(loc, DiagnosticKind::ResourceLimit, "while loops not available", LIMITATIONS, "");
            }
            LoopKind::DoWhile if !self.limits.do_while_loops => {
                self.error(loc, DiagnosticKind::ResourceLimit, "do-while loops not available", LIMITATIONS, "");
            }
            _ => {}
        }
        if kind != LoopKind::DoWhile {
            self.symbols.push_scope();
        }
        self.push_nesting(Nesting::Loop);
        self.push_nesting(Nesting::Statement);
        self.push_nesting(Nesting::ControlFlow);
    }

    /// Close the loop opened by [`Self::begin_loop`]. A `for` loop becomes
    /// a sequence of its initializer and the loop.
    pub fn end_loop(
        &mut self,
        loc: SourceLoc,
        kind: LoopKind,
        init: Option<Node>,
        condition: Option<Node>,
        terminal: Option<Node>,
        body: Option<Node>,
    ) -> Node {
        if let Some(condition) = &condition {
            self.bool_check(condition.loc, condition);
        }
        if kind != LoopKind::DoWhile {
            self.symbols.pop_scope();
        }
        self.pop_nesting(Nesting::Loop);
        self.pop_nesting(Nesting::Statement);
        self.pop_nesting(Nesting::ControlFlow);

        let test_first = kind != LoopKind::DoWhile;
        let node = self.ast.add_loop(body, condition, terminal, test_first, loc);
        if kind != LoopKind::For {
            return node;
        }
        if !self.limits.non_inductive_for_loops {
            self.inductive_loop_check(loc, init.as_ref(), &node);
        }
        let sequence = init.into_iter().chain(std::iter::once(node)).collect();
        self.ast
            .add_named_aggregate(Op::Sequence, "", sequence, &Type::void(), loc)
    }

    /// ES 1.00 minimal loops: `for (type i = const; i op const; i++)` with
    /// the index left alone in the body.
    pub fn inductive_loop_check(&mut self, loc: SourceLoc, init: Option<&Node>, loop_node: &Node) {
        const BAD_INIT: &str =
            "inductive-loop init-declaration requires the form \"type-specifier loop-index = constant-expression\"";
        let init = match init {
            Some(node) if node.children().len() == 1 => node.children().first(),
            Some(node) if matches!(node.kind, NodeKind::Binary { .. }) => Some(node),
            _ => None,
        };
        let Some(init) = init.filter(|n| matches!(n.kind, NodeKind::Binary { .. })) else {
            self.error(loc, DiagnosticKind::ControlFlow, BAD_INIT, LIMITATIONS, "");
            return;
        };
        if !init.ty.is_scalar() || !matches!(init.ty.basic, BasicType::Int | BasicType::Float) {
            self.error(
                loc,
                DiagnosticKind::ControlFlow,
                "inductive loop requires a scalar 'int' or 'float' loop index",
                LIMITATIONS,
                "",
            );
            return;
        }
        let NodeKind::Binary {
            op: Op::Assign,
            left,
            right,
        } = &init.kind
        else {
            self.error(loc, DiagnosticKind::ControlFlow, BAD_INIT, LIMITATIONS, "");
            return;
        };
        let (Some((index, _)), true) = (left.as_variable(), right.is_constant()) else {
            self.error(loc, DiagnosticKind::ControlFlow, BAD_INIT, LIMITATIONS, "");
            return;
        };
        self.inductive_loop_ids.push(index);

        let NodeKind::Loop {
            condition,
            terminal,
            body,
            ..
        } = &loop_node.kind
        else {
            return;
        };
        let is_index = |node: &Node| node.as_variable().is_some_and(|(id, _)| id == index);

        let good_condition = condition.as_deref().is_some_and(|cond| match &cond.kind {
            NodeKind::Binary { op, left, right } => {
                matches!(
                    op,
                    Op::GreaterThan
                        | Op::GreaterThanEqual
                        | Op::LessThan
                        | Op::LessThanEqual
                        | Op::Equal
                        | Op::NotEqual
                ) && is_index(left)
                    && right.is_constant()
            }
            _ => false,
        });
        if !good_condition {
            self.error(
                loc,
                DiagnosticKind::ControlFlow,
                "inductive-loop condition requires the form \"loop-index <comparison-op> constant-expression\"",
                LIMITATIONS,
                "",
            );
            return;
        }

        let good_terminal = terminal.as_deref().is_some_and(|term| match &term.kind {
            NodeKind::Unary { op, operand } => {
                matches!(op, Op::PostIncrement | Op::PostDecrement) && is_index(operand)
            }
            NodeKind::Binary { op, left, right } => {
                matches!(op, Op::AddAssign | Op::SubAssign) && is_index(left) && right.is_constant()
            }
            _ => false,
        });
        if !good_terminal {
            self.error(
                loc,
                DiagnosticKind::ControlFlow,
                "inductive-loop termination requires the form \"loop-index++, loop-index--, loop-index += constant-expression, or loop-index -= constant-expression\"",
                LIMITATIONS,
                "",
            );
            return;
        }

        if let Some(body) = body.as_deref() {
            self.inductive_loop_body_check(body, index);
        }
    }

    /// The loop index must not be written inside the body.
    pub fn inductive_loop_body_check(&mut self, body: &Node, index: SymbolId) {
        let mut modified = Vec::new();
        body.walk(&mut |node| {
            let target = match &node.kind {
                NodeKind::Binary { op, left, .. } if op.is_assignment() => left.base_variable(),
                NodeKind::Unary { op, operand } if op.modifies_operand() => operand.base_variable(),
                _ => None,
            };
            if target
                .and_then(Node::as_variable)
                .is_some_and(|(id, _)| id == index)
            {
                modified.push(node.loc);
            }
        });
        for loc in modified {
            self.error(loc, DiagnosticKind::ControlFlow, "inductive loop index modified", LIMITATIONS, "");
        }
    }

    /// Under minimal limits an index may only combine constants and loop
    /// indexes of inductive loops.
    pub fn constant_index_expression_check(&mut self, index: &Node) {
        let mut bad = false;
        index.walk(&mut |node| match &node.kind {
            NodeKind::Variable { id, .. } => bad |= !self.inductive_loop_ids.contains(id),
            NodeKind::Aggregate {
                op: Op::FunctionCall,
                ..
            } => bad = true,
            _ => {}
        });
        if bad {
            self.error(
                index.loc,
                DiagnosticKind::ResourceLimit,
                "Non-constant-index-expression",
                LIMITATIONS,
                "",
            );
        }
    }

    // Selection and branches

    /// `if (cond) then else`.
    pub fn handle_selection(
        &mut self,
        loc: SourceLoc,
        condition: Node,
        then_branch: Option<Node>,
        else_branch: Option<Node>,
    ) -> Node {
        self.bool_check(loc, &condition);
        self.ast.add_selection(condition, then_branch, else_branch, loc)
    }

    /// `break`, `continue`, `discard` and `return`.
    pub fn handle_branch(&mut self, loc: SourceLoc, op: BranchOp, value: Option<Node>) -> Node {
        match op {
            BranchOp::Break if self.nesting.loops == 0 && self.switch_levels.is_empty() => {
                self.error(
                    loc,
                    DiagnosticKind::ControlFlow,
                    "break statement only allowed in switch and loops",
                    "break",
                    "",
                );
            }
            BranchOp::Continue if self.nesting.loops == 0 => {
                self.error(
                    loc,
                    DiagnosticKind::ControlFlow,
                    "continue statement only allowed in loops",
                    "continue",
                    "",
                );
            }
            BranchOp::Kill => {
                self.require_stage(loc, StageMask::FRAGMENT, "discard");
            }
            BranchOp::Return => return self.handle_return_value(loc, value),
            _ => {}
        }
        self.ast.add_branch(op, None, loc)
    }

    // End of unit

    /// Checks that need the whole unit.
    pub fn final_error_check(&mut self, loc: SourceLoc) {
        let queued = std::mem::take(&mut self.index_limit_checks);
        for index in &queued {
            self.constant_index_expression_check(index);
        }

        match self.stage {
            Stage::Compute if !self.is_es() => {
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    430,
                    &["GL_ARB_compute_shader"],
                    "compute shaders",
                );
            }
            Stage::Geometry if self.is_es() => {
                self.profile_requires(loc, ProfileMask::ES, 320, &["GL_EXT_geometry_shader"], "geometry shaders");
            }
            Stage::TessControl | Stage::TessEvaluation if self.is_es() => {
                self.profile_requires(
                    loc,
                    ProfileMask::ES,
                    320,
                    &["GL_EXT_tessellation_shader"],
                    "tessellation shaders",
                );
            }
            _ => {}
        }
        let has_main = self.symbols.find_functions("main").into_iter().any(|id| {
            !self.symbols.is_built_in(id)
                && self
                    .symbols
                    .get(id)
                    .as_function()
                    .is_some_and(|f| f.defined)
        });
        if !has_main {
            self.error(
                loc,
                DiagnosticKind::Undeclared,
                "Missing entry point: Each stage requires one entry point",
                "main",
                "",
            );
        }

        for name in self.ast.recursive_functions() {
            self.error(loc, DiagnosticKind::ControlFlow, "Recursion detected:", &name, "");
        }

        self.lock_io_arrays(loc);
        tracing::debug!(io_arrays = self.io_arrays.len(), "final checks done");
    }
}
