//! Variables, indexing, field selection, operators and assignment.

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{ConstValue, Node, NodeKind, Op};
use crate::symbols::{Lookup, SymbolKind, Variable};
use crate::types::{BasicType, Storage, Type};

use super::ParseContext;

const SWIZZLE_SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];

impl ParseContext {
    /// The symbol a bare identifier refers to, or an error for undeclared
    /// names.
    pub fn variable_check(&mut self, loc: SourceLoc, name: &str) -> Option<Lookup> {
        let found = self.symbols.lookup(name);
        if found.is_none() {
            self.report(DiagnosticKind::Undeclared, loc)
                .message("undeclared identifier")
                .token(name)
                .emit();
        }
        found
    }

    /// An identifier used as an expression.
    pub fn handle_variable(&mut self, loc: SourceLoc, name: &str) -> Node {
        let Some(found) = self.variable_check(loc, name) else {
            // Declare a float so later uses do not cascade.
            let ty = Type::scalar(BasicType::Float);
            let var = SymbolKind::Variable(Variable::new(ty.clone()));
            let id = match self.symbols.insert(name, loc, var) {
                Ok(id) | Err(id) => id,
            };
            return self.ast.add_symbol(id, name, &ty, loc);
        };

        let symbol = self.symbols.get(found.id);
        let user_type = symbol.as_variable().is_some_and(|v| v.user_type);
        if symbol.is_function() || user_type {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("variable name expected")
                .token(name)
                .emit();
            return self.ast.float_constant(0.0, loc);
        }

        if let Some((block, _)) = symbol.as_member() {
            let needs_copy = found.built_in
                && self
                    .symbols
                    .variable_type(block)
                    .is_some_and(Type::contains_unsized_array);
            let member = if needs_copy {
                self.make_editable(found.id)
            } else {
                found.id
            };
            let Some((block, index)) = self.symbols.get(member).as_member() else {
                return self.ast.float_constant(0.0, loc);
            };
            let Some(block_ty) = self.symbols.variable_type(block).cloned() else {
                return self.ast.float_constant(0.0, loc);
            };
            let block_name = self.symbols.get(block).name.clone();
            let container = self.ast.add_symbol(block, &block_name, &block_ty, loc);
            return match self.ast.add_field_select(container, index, loc) {
                Some(node) => node,
                None => self.ast.float_constant(0.0, loc),
            };
        }

        if let Some(var) = symbol.as_variable()
            && let Some(values) = &var.const_value
        {
            let ty = var.ty.clone();
            return self.ast.add_constant(values.clone(), &ty, loc);
        }

        let unsized_built_in = found.built_in
            && self
                .symbols
                .variable_type(found.id)
                .is_some_and(Type::contains_unsized_array);
        let id = if unsized_built_in {
            self.make_editable(found.id)
        } else {
            found.id
        };
        let Some(ty) = self.symbols.variable_type(id).cloned() else {
            return self.ast.float_constant(0.0, loc);
        };
        self.ast.add_symbol(id, name, &ty, loc)
    }

    /// `base[index]`.
    pub fn handle_bracket_dereference(&mut self, loc: SourceLoc, base: Node, index: Node) -> Node {
        let mut base = base;
        if !base.ty.is_array() && !base.ty.is_matrix() && !base.ty.is_vector() {
            let token = base
                .as_variable()
                .map_or_else(|| "expression".to_string(), |(_, name)| name.to_string());
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("left of '[' is not of type array, matrix, or vector")
                .token(token)
                .emit();
            return self.ast.float_constant(0.0, loc);
        }
        if self.integer_check(&index, "[]") {
            return Node::error(base.ty.dereference(), loc);
        }
        if base.ty.is_array() {
            self.handle_io_resize_array_access(loc, &mut base);
        }

        if let Some(value) = index.const_int() {
            let clamped = self.check_index(loc, &base.ty, value);
            let value = if clamped { 0 } else { u32::try_from(value).unwrap_or(0) };
            if base.ty.is_unsized_array() {
                self.update_implicit_array_size(loc, &base, value);
            }
            let clip_distance = base.as_variable().is_some_and(|(_, name)| name == "gl_ClipDistance");
            if clip_distance && value >= self.resources.max_clip_distances {
                self.report(DiagnosticKind::IndexOutOfRange, loc)
                    .message("array index out of range")
                    .token("gl_ClipDistance")
                    .emit();
            }
            let index = if clamped {
                self.ast.int_constant(0, index.loc)
            } else {
                index
            };
            return self.ast.add_index(Op::IndexDirect, base, index, loc);
        }

        self.variable_index_check(loc, &base);
        self.handle_index_limits(&base, &index);
        self.ast.add_index(Op::IndexIndirect, base, index, loc)
    }

    fn variable_index_check(&mut self, loc: SourceLoc, base: &Node) {
        let ty = &base.ty;
        if ty.is_unsized_array() {
            if self.is_io_resize_array(ty) {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("array must be sized by a redeclaration or layout qualifier before being indexed with a variable")
                    .token("[")
                    .emit();
            } else if ty.storage() != Storage::Buffer {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("array must be redeclared with a size before being indexed with a variable")
                    .token("[")
                    .emit();
            }
        }

        let storage = ty.storage();
        if ty.basic == BasicType::Block && ty.is_array() {
            match storage {
                Storage::Buffer => {
                    self.require_profile(loc, ProfileMask::DESKTOP, "variable indexing buffer block array");
                }
                Storage::Uniform => {
                    self.profile_requires(
                        loc,
                        ProfileMask::ES,
                        320,
                        &["GL_EXT_gpu_shader5"],
                        "variable indexing uniform block array",
                    );
                }
                _ => {}
            }
        } else if ty.basic == BasicType::Sampler && ty.is_array() && self.version >= 130 {
            const FEATURE: &str = "variable indexing sampler array";
            self.profile_requires(loc, ProfileMask::ES, 320, &["GL_EXT_gpu_shader5"], FEATURE);
            self.profile_requires(
                loc,
                ProfileMask::CORE | ProfileMask::COMPATIBILITY,
                400,
                &["GL_ARB_gpu_shader5"],
                FEATURE,
            );
        }
        if self.stage == Stage::Fragment && storage == Storage::VaryingOut {
            self.require_profile(
                loc,
                ProfileMask::DESKTOP,
                "variable indexing fragment shader output array",
            );
        }
    }

    /// Constant index bounds. Returns true when the index is out of range;
    /// the caller then uses 0.
    pub fn check_index(&mut self, loc: SourceLoc, ty: &Type, index: i64) -> bool {
        let message = if index < 0 {
            format!("index out of range '{index}'")
        } else if ty.is_array() {
            match ty.outer_array_size() {
                Some(size) if index >= i64::from(size) => format!("array index out of range '{index}'"),
                _ => return false,
            }
        } else if ty.is_vector() {
            if index < i64::from(ty.vector_size) {
                return false;
            }
            format!("vector index out of range '{index}'")
        } else if ty.is_matrix() {
            if index < i64::from(ty.matrix_cols) {
                return false;
            }
            format!("matrix index out of range '{index}'")
        } else {
            return false;
        };
        self.report(DiagnosticKind::IndexOutOfRange, loc)
            .message(message)
            .token("[")
            .emit();
        true
    }

    /// Under minimal limits some index expressions must be
    /// constant-index-expressions. Whether a loop index qualifies is only
    /// known at the end, so they are queued for the final pass.
    pub fn handle_index_limits(&mut self, base: &Node, index: &Node) {
        let limits = self.limits;
        let ty = &base.ty;
        let storage = ty.storage();
        let pipe_in = storage == Storage::VaryingIn;
        let pipe_io = storage.is_pipe_io();
        let restricted = (!limits.general_sampler_indexing && ty.basic == BasicType::Sampler)
            || (!limits.general_uniform_indexing
                && storage.is_uniform_or_buffer()
                && self.stage != Stage::Vertex)
            || (!limits.general_attribute_matrix_vector_indexing
                && pipe_in
                && self.stage == Stage::Vertex
                && (ty.is_matrix() || ty.is_vector()))
            || (!limits.general_constant_matrix_vector_indexing && base.is_constant())
            || (!limits.general_variable_indexing
                && !storage.is_uniform_or_buffer()
                && !pipe_io
                && !storage.is_constant())
            || (!limits.general_varying_indexing && pipe_io);
        if restricted {
            self.index_limit_checks.push(index.clone());
        }
    }

    /// `base.field`: struct and block members, swizzles.
    pub fn handle_dot_dereference(&mut self, loc: SourceLoc, base: Node, field: &str) -> Node {
        if base.ty.is_array() {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("cannot apply to an array:")
                .token(".")
                .extra(field)
                .emit();
            return base;
        }

        if base.ty.is_struct() {
            let index = base
                .ty
                .structure
                .as_ref()
                .and_then(|def| def.field(field))
                .map(|(i, _)| i);
            let Some(index) = index else {
                self.report(DiagnosticKind::Undeclared, loc)
                    .message("no such field in structure")
                    .token(field)
                    .emit();
                return base;
            };
            let fallback = base.clone();
            return self.ast.add_field_select(base, index, loc).unwrap_or(fallback);
        }

        let swizzlable = base.ty.is_scalar_or_vector()
            && matches!(
                base.ty.basic,
                BasicType::Float | BasicType::Double | BasicType::Int | BasicType::Uint | BasicType::Bool
            );
        if !swizzlable {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("does not apply to this type:")
                .token(field)
                .extra(base.ty.to_string())
                .emit();
            return base;
        }

        if base.ty.vector_size == 1 {
            const FEATURE: &str = "scalar swizzle";
            self.require_profile(loc, ProfileMask::DESKTOP, FEATURE);
            self.profile_requires(
                loc,
                ProfileMask::DESKTOP,
                420,
                &["GL_ARB_shading_language_420pack"],
                FEATURE,
            );
        }
        let components = self.parse_vector_fields(loc, field, base.ty.vector_size);

        if base.ty.vector_size == 1 {
            if components.len() == 1 {
                return base;
            }
            let mut ty = base.ty.clone();
            ty.vector_size = components.len() as u8;
            ty.qualifier.make_temporary();
            let fallback = base.clone();
            return self.add_constructor(loc, vec![base], &ty).unwrap_or(fallback);
        }
        match components.as_slice() {
            [single] => {
                let index = self.ast.int_constant(i32::from(*single), loc);
                self.ast.add_index(Op::IndexDirect, base, index, loc)
            }
            _ => self.ast.add_swizzle(base, &components, loc),
        }
    }

    /// Component offsets named by a swizzle such as `xyz` or `bgr`.
    /// Falls back to the first component after an error.
    pub fn parse_vector_fields(&mut self, loc: SourceLoc, field: &str, vec_size: u8) -> Vec<u8> {
        if field.len() > 4 {
            self.report(DiagnosticKind::InvalidOperand, loc)
                .message("vector swizzle too long")
                .token(field)
                .emit();
            return vec![0];
        }

        let mut set = None;
        let mut components = Vec::with_capacity(field.len());
        for ch in field.chars() {
            let found = SWIZZLE_SETS
                .iter()
                .enumerate()
                .find_map(|(s, letters)| letters.find(ch).map(|pos| (s, pos)));
            let Some((s, pos)) = found else {
                self.report(DiagnosticKind::InvalidOperand, loc)
                    .message("unknown swizzle selection")
                    .token(field)
                    .emit();
                return vec![0];
            };
            if set.is_some_and(|prev| prev != s) {
                self.report(DiagnosticKind::InvalidOperand, loc)
                    .message("vector swizzle selectors not from the same set")
                    .token(field)
                    .emit();
                return vec![0];
            }
            set = Some(s);
            if pos >= usize::from(vec_size) {
                self.report(DiagnosticKind::InvalidOperand, loc)
                    .message("vector swizzle selection out of range")
                    .token(field)
                    .emit();
                return vec![0];
            }
            components.push(pos as u8);
        }
        if components.is_empty() {
            components.push(0);
        }
        components
    }

    pub fn handle_binary_math(&mut self, loc: SourceLoc, op: Op, left: Node, right: Node) -> Node {
        let token = op.symbol();
        self.r_value_error_check(loc, token, &left);
        self.r_value_error_check(loc, token, &right);

        match op {
            Op::Mod | Op::LeftShift | Op::RightShift | Op::And | Op::InclusiveOr | Op::ExclusiveOr => {
                self.full_integer_check(loc, token);
            }
            Op::Equal | Op::NotEqual => {
                self.array_object_check(loc, &left.ty, "array comparison");
                self.opaque_check(loc, &left.ty, token);
            }
            _ => {}
        }

        if matches!(op, Op::Div | Op::Mod)
            && left.constant_values().is_some()
            && let Some(divisor) = right.constant_values()
            && divisor
                .iter()
                .any(|v| matches!(v, ConstValue::Int(0) | ConstValue::Uint(0)))
        {
            self.error(loc, DiagnosticKind::InvalidOperand, "divide by zero", token, "");
        }

        let (left_ty, right_ty) = (left.ty.clone(), right.ty.clone());
        let shapes_ok = !op.is_comparison() || (left_ty.is_scalar() && right_ty.is_scalar());
        let recovery = left.clone();
        let result = if shapes_ok {
            self.ast.add_binary_math(op, left, right, loc)
        } else {
            None
        };
        match result {
            Some(node) => node,
            None => {
                self.binary_op_error(loc, token, &left_ty, &right_ty);
                if op.is_comparison() || matches!(op, Op::Equal | Op::NotEqual) {
                    self.ast.bool_constant(false, loc)
                } else {
                    recovery
                }
            }
        }
    }

    pub fn handle_unary_math(&mut self, loc: SourceLoc, op: Op, operand: Node) -> Node {
        let token = op.symbol();
        if op.modifies_operand() {
            self.l_value_error_check(loc, token, &operand);
        }
        self.r_value_error_check(loc, token, &operand);
        if op == Op::BitwiseNot {
            self.full_integer_check(loc, token);
        }
        let ty = operand.ty.clone();
        let recovery = operand.clone();
        match self.ast.add_unary_math(op, operand, loc) {
            Some(node) => node,
            None => {
                self.unary_op_error(loc, token, &ty);
                recovery
            }
        }
    }

    /// `left op= right`.
    pub fn handle_assign(&mut self, loc: SourceLoc, op: Op, left: Node, right: Node) -> Node {
        let token = op.symbol();
        self.array_object_check(loc, &left.ty, "array assignment");
        if op == Op::Assign {
            self.opaque_check(loc, &left.ty, token);
        }
        if matches!(
            op,
            Op::ModAssign
                | Op::AndAssign
                | Op::InclusiveOrAssign
                | Op::ExclusiveOrAssign
                | Op::LeftShiftAssign
                | Op::RightShiftAssign
        ) {
            self.full_integer_check(loc, token);
        }
        if self.l_value_error_check(loc, token, &left) {
            return left;
        }
        self.r_value_error_check(loc, token, &right);

        let (left_ty, right_ty) = (left.ty.clone(), right.ty.clone());
        let recovery = left.clone();
        match self.ast.add_assign(op, left, right, loc) {
            Some(node) => node,
            None => {
                self.assign_error(loc, token, &left_ty, &right_ty);
                recovery
            }
        }
    }

    /// `cond ? a : b`.
    pub fn handle_ternary(&mut self, loc: SourceLoc, cond: Node, a: Node, b: Node) -> Node {
        self.bool_check(loc, &cond);
        let (a_ty, b_ty) = (a.ty.clone(), b.ty.clone());
        let recovery = b.clone();
        match self.ast.add_ternary(cond, a, b, loc) {
            Some(node) => node,
            None => {
                self.binary_op_error(loc, ":", &a_ty, &b_ty);
                recovery
            }
        }
    }

    /// Whether `node` may be written, reporting why not.
    ///
    /// Returns true when an error was reported.
    pub fn l_value_error_check(&mut self, loc: SourceLoc, op: &str, node: &Node) -> bool {
        if node.is_error() {
            return false;
        }
        match &node.kind {
            NodeKind::Binary {
                op: Op::IndexDirect | Op::IndexIndirect | Op::IndexDirectStruct,
                left,
                ..
            } => return self.l_value_error_check(loc, op, left),
            NodeKind::Binary {
                op: Op::VectorSwizzle,
                left,
                right,
            } => {
                let mut seen = [false; 4];
                let duplicate = right.children().iter().filter_map(Node::const_int).any(|c| {
                    let slot = &mut seen[(c as usize) & 3];
                    std::mem::replace(slot, true)
                });
                if duplicate {
                    self.report(DiagnosticKind::NotLValue, loc)
                        .message("l-value of swizzle cannot have duplicate components")
                        .token(op)
                        .emit();
                    return true;
                }
                return self.l_value_error_check(loc, op, left);
            }
            _ => {}
        }

        let Some((id, name)) = node.as_variable() else {
            self.report(DiagnosticKind::NotLValue, loc)
                .message("l-value required")
                .token(op)
                .emit();
            return true;
        };

        let ty = &node.ty;
        let reason = match ty.storage() {
            Storage::Const | Storage::ConstReadOnly => Some("can't modify a const"),
            Storage::Uniform => Some("can't modify a uniform"),
            Storage::Buffer if ty.qualifier.readonly => Some("can't modify a readonly buffer"),
            Storage::VaryingIn => Some("can't modify shader input"),
            _ => None,
        }
        .or(match ty.basic {
            BasicType::Sampler => Some("can't modify a sampler"),
            BasicType::AtomicUint => Some("can't modify an atomic_uint"),
            BasicType::Void => Some("can't modify void"),
            _ => None,
        })
        .or_else(|| {
            (name == "gl_FragDepth" && self.is_es() && self.ast.layout().early_fragment_tests)
                .then_some("can't modify gl_FragDepth if using early_fragment_tests")
        })
        .or_else(|| {
            self.symbols
                .get(id)
                .as_variable()
                .is_some_and(|v| v.read_only)
                .then_some("can't modify a read-only variable")
        });

        let Some(reason) = reason else {
            return false;
        };
        let extra = format!("\"{name}\" ({reason})");
        self.report(DiagnosticKind::NotLValue, loc)
            .message("l-value required")
            .token(op)
            .extra(extra)
            .emit();
        true
    }

    /// Reading a `writeonly` object.
    pub fn r_value_error_check(&mut self, loc: SourceLoc, op: &str, node: &Node) -> bool {
        let base = node.base_variable();
        let writeonly = node.ty.qualifier.writeonly || base.is_some_and(|b| b.ty.qualifier.writeonly);
        if !writeonly {
            return false;
        }
        let name = base
            .and_then(Node::as_variable)
            .map(|(_, name)| name.to_string())
            .unwrap_or_default();
        self.report(DiagnosticKind::Qualifier, loc)
            .message("can't read from writeonly object:")
            .token(op)
            .extra(name)
            .emit();
        true
    }

    pub fn constant_value_check(&mut self, node: &Node, token: &str) -> bool {
        if node.is_constant() || node.is_error() {
            return false;
        }
        self.report(DiagnosticKind::NotConstant, node.loc)
            .message("constant expression required")
            .token(token)
            .emit();
        true
    }

    pub fn integer_check(&mut self, node: &Node, token: &str) -> bool {
        if node.ty.is_integer_scalar() || node.is_error() {
            return false;
        }
        self.report(DiagnosticKind::TypeMismatch, node.loc)
            .message("scalar integer expression required")
            .token(token)
            .emit();
        true
    }

    /// Constructs only allowed at global scope.
    pub fn global_check(&mut self, loc: SourceLoc, token: &str) -> bool {
        if self.symbols.at_global_level() {
            return false;
        }
        self.report(DiagnosticKind::Storage, loc)
            .message("not allowed in nested scope")
            .token(token)
            .emit();
        true
    }

    pub fn assign_error(&mut self, loc: SourceLoc, op: &str, left: &Type, right: &Type) {
        self.report(DiagnosticKind::TypeMismatch, loc)
            .message(format!("cannot convert from '{right}' to '{left}'"))
            .token(op)
            .emit();
    }

    pub fn unary_op_error(&mut self, loc: SourceLoc, op: &str, operand: &Type) {
        self.report(DiagnosticKind::InvalidOperand, loc)
            .message("wrong operand type")
            .token(op)
            .extra(format!(
                "no operation '{op}' exists that takes an operand of type {operand} (or there is no acceptable conversion)"
            ))
            .emit();
    }

    pub fn binary_op_error(&mut self, loc: SourceLoc, op: &str, left: &Type, right: &Type) {
        self.report(DiagnosticKind::InvalidOperand, loc)
            .message("wrong operand types:")
            .token(op)
            .extra(format!(
                "no operation '{op}' exists that takes a left-hand operand of type '{left}' and a right operand of type '{right}' (or there is no acceptable conversion)"
            ))
            .emit();
    }

    /// Whole-array operations need version 120 on desktop and 300 on ES.
    ///
    /// Returns true when a gate failed.
    pub fn array_object_check(&mut self, loc: SourceLoc, ty: &Type, op: &str) -> bool {
        if !ty.contains_array() {
            return false;
        }
        let desktop = self.profile_requires(loc, ProfileMask::NONE, 120, &["GL_3DL_array_objects"], op);
        let es = self.profile_requires(loc, ProfileMask::ES, 300, &[], op);
        !(desktop && es)
    }

    /// Opaque values cannot be assigned or compared.
    pub fn opaque_check(&mut self, loc: SourceLoc, ty: &Type, op: &str) -> bool {
        if !ty.contains_opaque() {
            return false;
        }
        self.report(DiagnosticKind::InvalidOperand, loc)
            .message("can't use with samplers or structs containing samplers")
            .token(op)
            .emit();
        true
    }
}
