//! Small reusable checks on names and types.
//!
//! Checks return `true` when they reported an error, so callers can skip
//! checks that would only repeat the same problem.

use glint_core::SourceLoc;

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::Node;
use crate::types::{BasicType, Field, PublicType, Storage};

use super::ParseContext;

impl ParseContext {
    /// Identifiers starting with `gl_` belong to the implementation.
    pub fn built_in_name(name: &str) -> bool {
        name.starts_with("gl_")
    }

    pub fn reserved_error_check(&mut self, loc: SourceLoc, name: &str) -> bool {
        if Self::built_in_name(name) {
            self.diagnostics
                .report(DiagnosticKind::ReservedName, loc)
                .message("identifiers starting with \"gl_\" are reserved")
                .token(name)
                .emit();
            return true;
        }
        if name.contains("__") {
            if self.is_es() && self.version <= 300 {
                self.diagnostics
                    .report(DiagnosticKind::ReservedName, loc)
                    .message(
                        "identifiers containing consecutive underscores (\"__\") are reserved, \
                         and an error if version <= 300",
                    )
                    .token(name)
                    .emit();
                return true;
            }
            self.diagnostics
                .report(DiagnosticKind::ReservedName, loc)
                .message("identifiers containing consecutive underscores (\"__\") are reserved")
                .token(name)
                .warning()
                .emit();
        }
        false
    }

    pub fn void_error_check(&mut self, loc: SourceLoc, identifier: &str, basic: BasicType) -> bool {
        if basic != BasicType::Void {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::TypeMismatch, loc)
            .message("illegal use of type 'void'")
            .token(identifier)
            .emit();
        true
    }

    /// Conditions must be scalar booleans.
    pub fn bool_check(&mut self, loc: SourceLoc, node: &Node) -> bool {
        if node.ty.is_bool_scalar() || node.is_error() {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::TypeMismatch, loc)
            .message("boolean expression expected")
            .emit();
        true
    }

    /// The declared type of a condition variable, as in `if (bool b = ...)`.
    pub fn bool_check_type(&mut self, loc: SourceLoc, public_type: &PublicType) -> bool {
        if public_type.basic == BasicType::Bool
            && public_type.array_sizes.is_none()
            && public_type.matrix_cols == 0
            && public_type.vector_size == 1
        {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::TypeMismatch, loc)
            .message("boolean expression expected")
            .emit();
        true
    }

    /// Samplers and images live only in uniforms and parameters.
    pub fn sampler_check(
        &mut self,
        loc: SourceLoc,
        public_type: &PublicType,
        identifier: &str,
        initializer: Option<&Node>,
    ) -> bool {
        let ty = public_type.to_type();
        let storage = ty.storage();
        if storage == Storage::Uniform || storage.is_param() {
            return false;
        }
        if ty.basic == BasicType::Struct && ty.contains_basic(BasicType::Sampler) {
            self.diagnostics
                .report(DiagnosticKind::Storage, loc)
                .message("non-uniform struct contains a sampler or image:")
                .token(ty.basic_name())
                .extra(identifier)
                .emit();
            return true;
        }
        if ty.basic != BasicType::Sampler {
            return false;
        }
        let message = if initializer.is_some() {
            "sampler/image types can only be initialized in uniforms or function parameters:"
        } else {
            "sampler/image types can only be used in uniform variables or function parameters:"
        };
        self.diagnostics
            .report(DiagnosticKind::Storage, loc)
            .message(message)
            .token(ty.basic_name())
            .extra(identifier)
            .emit();
        true
    }

    pub fn atomic_uint_check(&mut self, loc: SourceLoc, public_type: &PublicType, identifier: &str) -> bool {
        let ty = public_type.to_type();
        if ty.storage() == Storage::Uniform || ty.storage().is_param() {
            return false;
        }
        let message = if ty.basic == BasicType::Struct && ty.contains_basic(BasicType::AtomicUint) {
            "non-uniform struct contains an atomic_uint:"
        } else if ty.basic == BasicType::AtomicUint {
            "atomic_uints can only be used in uniform variables or function parameters:"
        } else {
            return false;
        };
        self.diagnostics
            .report(DiagnosticKind::Storage, loc)
            .message(message)
            .token(ty.basic_name())
            .extra(identifier)
            .emit();
        true
    }

    /// Compare `value` against the built-in constant named `limit`.
    pub fn limit_check(&mut self, loc: SourceLoc, value: u32, limit: &str, feature: &str) -> bool {
        let bound = self
            .symbols
            .lookup(limit)
            .and_then(|found| self.symbols.get(found.id).as_variable())
            .and_then(|var| var.const_value.as_ref())
            .and_then(|values| values.first())
            .map(|v| v.as_i64());
        let Some(bound) = bound else {
            return false;
        };
        if i64::from(value) <= bound {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::ResourceLimit, loc)
            .message("must be less than or equal to")
            .token(feature)
            .extra(format!("{limit} ({bound})"))
            .emit();
        true
    }

    /// Size limits on built-in arrays that may be redeclared with a size.
    pub fn array_limit_check(&mut self, loc: SourceLoc, identifier: &str, size: u32) -> bool {
        match identifier {
            "gl_TexCoord" => {
                self.limit_check(loc, size, "gl_MaxTextureCoords", "gl_TexCoord array size")
            }
            "gl_ClipDistance" => {
                self.limit_check(loc, size, "gl_MaxClipDistances", "gl_ClipDistance array size")
            }
            "gl_CullDistance" => {
                self.limit_check(loc, size, "gl_MaxCullDistances", "gl_CullDistance array size")
            }
            _ => false,
        }
    }

    pub fn nested_struct_check(&mut self, loc: SourceLoc) -> bool {
        if self.nesting.structs == 0 {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::Storage, loc)
            .message("cannot nest a structure definition inside a structure or block")
            .emit();
        true
    }

    pub fn nested_block_check(&mut self, loc: SourceLoc) -> bool {
        if self.nesting.structs == 0 {
            return false;
        }
        self.diagnostics
            .report(DiagnosticKind::Storage, loc)
            .message("cannot nest a block definition inside a structure or block")
            .emit();
        true
    }

    /// Structure members take no storage, interpolation, memory, layout or
    /// invariant qualifiers. Offending layouts are cleared.
    pub fn struct_type_check(&mut self, fields: &mut [Field]) -> bool {
        let mut failed = false;
        for field in fields {
            let q = &mut field.ty.qualifier;
            let mut problems = Vec::new();
            if q.is_auxiliary()
                || q.is_interpolation()
                || !matches!(q.storage, Storage::Temporary | Storage::Global)
            {
                problems.push("cannot use storage or interpolation qualifiers on structure members");
            }
            if q.is_memory() {
                problems.push("cannot use memory qualifiers on structure members");
            }
            if q.has_layout() {
                problems.push("cannot use layout qualifiers on structure members");
                q.layout = Default::default();
            }
            if q.invariant {
                problems.push("cannot use invariant qualifier on structure members");
            }
            for problem in problems {
                self.diagnostics
                    .report(DiagnosticKind::Qualifier, field.loc)
                    .message(problem)
                    .token(field.name.as_str())
                    .emit();
                failed = true;
            }
        }
        failed
    }
}
