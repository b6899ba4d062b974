//! Variable, array and structure declarations, and their initializers.

use std::sync::Arc;

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{Node, NodeKind, Op};
use crate::symbols::{SymbolId, SymbolKind, Variable};
use crate::types::{
    ArraySizes, BasicType, Field, Precision, PublicType, Qualifier, ShaderQualifiers, Storage,
    StructDef, Type,
};

use super::ParseContext;

const NON_CONST_INITIALIZER: &[&str] = &["GL_ARB_shading_language_420pack"];

impl ParseContext {
    /// One declarator of a declaration: `float x[2] = ...`.
    ///
    /// `array_sizes` are the sizes written after the identifier; they become
    /// the outer dimensions. Returns the initializing assignment for
    /// variables that are not compile-time constants.
    pub fn declare_variable(
        &mut self,
        loc: SourceLoc,
        identifier: &str,
        public_type: &PublicType,
        array_sizes: Option<&ArraySizes>,
        initializer: Option<Node>,
    ) -> Option<Node> {
        let mut ty = public_type.to_type();
        if self.array_dim_check(loc, public_type.array_sizes.as_ref(), array_sizes) {
            return None;
        }
        Self::array_dim_merge(&mut ty, array_sizes);
        if self.void_error_check(loc, identifier, ty.basic) {
            return None;
        }

        match &initializer {
            Some(init) => {
                self.r_value_error_check(loc, "=", init);
            }
            None => self.non_init_const_check(loc, identifier, &mut ty),
        }

        let global = self.symbols.at_global_level();
        if global {
            self.global_qualifier_fix_check(loc, &mut ty.qualifier);
            let merged = PublicType::from_type(public_type.loc, &ty);
            self.global_qualifier_type_check(loc, &ty.qualifier, &merged);
        } else if !matches!(ty.storage(), Storage::Temporary | Storage::Const) {
            self.global_check(loc, ty.storage().name());
            ty.qualifier.storage = Storage::Temporary;
        }

        let checked = PublicType::from_type(public_type.loc, &ty);
        self.sampler_check(loc, &checked, identifier, initializer.as_ref());
        self.atomic_uint_check(loc, &checked, identifier);
        self.precision_qualifier_check(loc, &checked, &mut ty.qualifier);
        self.layout_qualifier_check(loc, &ty.qualifier);

        let shader = &public_type.shader_qualifiers;
        if identifier != "gl_FragCoord" && (shader.origin_upper_left || shader.pixel_center_integer) {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only apply origin_upper_left and pixel_center_origin to gl_FragCoord")
                .token("layout qualifier")
                .emit();
        }
        if identifier != "gl_FragDepth" && shader.depth.is_some() {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only apply depth layout to gl_FragDepth")
                .token("layout qualifier")
                .emit();
        }
        let redeclarable = ShaderQualifiers {
            origin_upper_left: shader.origin_upper_left,
            pixel_center_integer: shader.pixel_center_integer,
            depth: shader.depth,
            ..ShaderQualifiers::default()
        };
        let mut rest = *shader;
        rest.origin_upper_left = false;
        rest.pixel_center_integer = false;
        rest.depth = None;
        self.check_no_shader_layouts(loc, &rest);

        let mut symbol = self.redeclare_builtin_variable(loc, identifier, &ty.qualifier, &redeclarable);
        if symbol.is_none() {
            self.reserved_error_check(loc, identifier);
        }
        self.inherit_global_defaults(&mut ty.qualifier);

        let redeclared = symbol.is_some();
        let before = self.symbols.user_symbols().len();
        if let Some(sizes) = ty.array_sizes.clone() {
            self.array_unsized_check(loc, &ty.qualifier, &sizes, initializer.as_ref(), false);
            if !self.array_qualifier_error(loc, &ty.qualifier) && !self.array_error(loc, &ty) {
                self.declare_array(loc, identifier, &ty, &mut symbol);
            }
            if initializer.is_some() {
                self.profile_requires(loc, ProfileMask::NONE, 120, &["GL_3DL_array_objects"], "initializer");
                self.profile_requires(loc, ProfileMask::ES, 300, &[], "initializer");
            }
        } else {
            match symbol {
                None => symbol = self.declare_non_array(loc, identifier, &ty),
                Some(id) => {
                    let same = self
                        .symbols
                        .variable_type(id)
                        .is_some_and(|existing| existing.same_shape(&ty));
                    if !same {
                        self.report(DiagnosticKind::Redefinition, loc)
                            .message("cannot change the type of")
                            .token("redeclaration")
                            .extra(identifier)
                            .emit();
                    }
                }
            }
        }
        let id = symbol?;
        let created = !redeclared && self.symbols.user_symbols().len() > before;

        let init_node = match initializer {
            Some(init) => {
                if self.symbols.get(id).as_member().is_some() {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot initialize a block member")
                        .token(identifier)
                        .emit();
                    None
                } else {
                    self.execute_initializer(loc, init, id)
                }
            }
            None => None,
        };

        if let Some(mut final_ty) = self.symbols.variable_type(id).cloned() {
            self.layout_object_check(loc, &final_ty);
            if final_ty.basic == BasicType::AtomicUint {
                self.fix_offset(loc, &mut final_ty);
                if let Some(slot) = self.editable_type(id) {
                    *slot = final_ty.clone();
                }
            }
            if created && global {
                let node = self.ast.add_symbol(id, identifier, &final_ty, loc);
                self.ast.add_to_linkage(node);
            }
        }
        tracing::trace!(name = identifier, symbol = %id, created, "variable declared");
        init_node
    }

    /// A declaration with no declarator, as in `layout(binding = 2, offset = 4) uniform atomic_uint;`.
    pub fn declare_type_defaults(&mut self, loc: SourceLoc, public_type: &PublicType) {
        let layout = &public_type.qualifier.layout;
        if public_type.basic == BasicType::AtomicUint
            && let Some(binding) = layout.binding
        {
            let max = self.resources.max_atomic_counter_bindings;
            if binding >= max {
                self.report(DiagnosticKind::ResourceLimit, loc)
                    .message("atomic_uint binding is too large")
                    .token("binding")
                    .extra(format!("internal max is {max}"))
                    .emit();
                return;
            }
            if let Some(offset) = layout.offset {
                self.atomic_uint_offsets.insert(binding, offset);
            }
            return;
        }
        if public_type.array_sizes.is_some() {
            self.report(DiagnosticKind::ArraySize, loc)
                .message("expect an array name")
                .emit();
        }
        if public_type.qualifier.has_layout() {
            self.report(DiagnosticKind::Layout, loc)
                .message("useless application of layout qualifier")
                .token("layout")
                .warning()
                .emit();
        }
    }

    /// Insert a non-array variable into the current scope.
    ///
    /// A same-scope redeclaration with the same type and compatible
    /// qualifiers merges into the existing symbol.
    pub fn declare_non_array(
        &mut self,
        loc: SourceLoc,
        identifier: &str,
        ty: &Type,
    ) -> Option<SymbolId> {
        match self
            .symbols
            .insert(identifier, loc, SymbolKind::Variable(Variable::new(ty.clone())))
        {
            Ok(id) => Some(id),
            Err(existing) => self.merge_redeclaration(loc, identifier, existing, ty),
        }
    }

    /// Declare an array, or size an existing implicitly-sized one.
    ///
    /// `symbol` is the editable copy of a redeclared built-in, or `None` for
    /// a fresh name; it is set to the declared symbol on success.
    pub fn declare_array(
        &mut self,
        loc: SourceLoc,
        identifier: &str,
        ty: &Type,
        symbol: &mut Option<SymbolId>,
    ) {
        let id = match *symbol {
            Some(id) => id,
            None => {
                let mut ty = ty.clone();
                let resize = self.is_io_resize_array(&ty);
                if !resize {
                    self.fix_io_array_size(loc, &mut ty);
                }
                match self
                    .symbols
                    .insert(identifier, loc, SymbolKind::Variable(Variable::new(ty.clone())))
                {
                    Ok(id) => {
                        if resize {
                            self.register_io_array(id, identifier);
                            self.check_io_arrays_consistency(loc, true);
                        }
                        *symbol = Some(id);
                        return;
                    }
                    // An array redeclared in the same scope may size it.
                    Err(existing) if self.symbols.variable_type(existing).is_some_and(Type::is_array) => {
                        *symbol = Some(existing);
                        existing
                    }
                    Err(existing) => {
                        *symbol = self.merge_redeclaration(loc, identifier, existing, &ty);
                        return;
                    }
                }
            }
        };

        if self.symbols.get(id).as_member().is_some() {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("cannot redeclare a block member")
                .token(identifier)
                .emit();
            return;
        }
        let Some(existing) = self.symbols.variable_type(id).cloned() else {
            return;
        };
        let Some(existing_sizes) = existing.array_sizes.as_ref() else {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("redeclaring non-array as array")
                .token(identifier)
                .emit();
            return;
        };
        if !existing.same_element_shape(ty) {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("redeclaration of array with a different element type")
                .token(identifier)
                .emit();
            return;
        }
        let Some(new_sizes) = ty.array_sizes.as_ref() else {
            return;
        };
        if !existing_sizes.inner().same_dims(&new_sizes.inner()) {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("redeclaration of array with a different array dimensions or sizes")
                .token(identifier)
                .emit();
            return;
        }

        if let Some(size) = existing_sizes.outer_size() {
            let lenient = self.is_io_resize_array(ty) && new_sizes.outer_size() == Some(size);
            if !lenient {
                self.report(DiagnosticKind::Redefinition, loc)
                    .message("redeclaration of array with size")
                    .token(identifier)
                    .emit();
            }
            return;
        }
        let Some(new_size) = new_sizes.outer_size() else {
            return;
        };

        self.array_limit_check(loc, identifier, new_size);
        if existing_sizes.implicit_size() > new_size {
            self.report(DiagnosticKind::IndexOutOfRange, loc)
                .message("size of array is smaller than the largest index already used")
                .token(identifier)
                .extra(format!("{} > {new_size}", existing_sizes.implicit_size()))
                .emit();
        }
        if let Some(slot) = self.editable_type(id) {
            if let Some(sizes) = slot.array_sizes.as_mut() {
                sizes.set_outer_size(new_size);
            }
            slot.qualifier.precision = match ty.qualifier.precision {
                Precision::None => slot.qualifier.precision,
                precision => precision,
            };
        }
        self.symbols.mark_declared(id);
        if self.is_io_resize_array(ty) {
            self.check_io_arrays_consistency(loc, false);
        }
        tracing::debug!(name = identifier, size = new_size, "array redeclared with size");
    }

    /// Same-scope redeclaration: merge when compatible, error otherwise.
    fn merge_redeclaration(
        &mut self,
        loc: SourceLoc,
        identifier: &str,
        existing: SymbolId,
        ty: &Type,
    ) -> Option<SymbolId> {
        let compatible = self
            .symbols
            .get(existing)
            .as_variable()
            .filter(|var| !var.user_type)
            .is_some_and(|var| Self::compatible_redeclaration(&var.ty, ty));
        if !compatible {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("redefinition")
                .token(identifier)
                .emit();
            return None;
        }

        let var = self.symbols.get_mut(existing)?.as_variable_mut()?;
        let q = &mut var.ty.qualifier;
        if q.precision == Precision::None {
            q.precision = ty.qualifier.precision;
        }
        q.invariant |= ty.qualifier.invariant;
        if q.layout.is_empty() {
            q.layout = ty.qualifier.layout;
        }
        tracing::debug!(name = identifier, symbol = %existing, "redeclaration merged");
        Some(existing)
    }

    fn compatible_redeclaration(old: &Type, new: &Type) -> bool {
        let arrays = match (&old.array_sizes, &new.array_sizes) {
            (None, None) => true,
            (Some(a), Some(b)) => a.compatible_with(b),
            _ => false,
        };
        let (a, b) = (&old.qualifier, &new.qualifier);
        let precision = a.precision == b.precision
            || a.precision == Precision::None
            || b.precision == Precision::None;
        let layout = a.layout == b.layout || a.layout.is_empty() || b.layout.is_empty();
        old.same_element_shape(new)
            && arrays
            && a.storage == b.storage
            && precision
            && a.smooth == b.smooth
            && a.flat == b.flat
            && a.nopersp == b.nopersp
            && a.centroid == b.centroid
            && a.sample == b.sample
            && a.patch == b.patch
            && a.is_memory() == b.is_memory()
            && layout
    }

    /// Attach an initializer to a declared variable.
    ///
    /// Constants and uniforms get their folded value recorded on the symbol
    /// and produce no node; other variables produce an assignment node.
    pub fn execute_initializer(
        &mut self,
        loc: SourceLoc,
        initializer: Node,
        id: SymbolId,
    ) -> Option<Node> {
        let (name, mut ty) = {
            let symbol = self.symbols.get(id);
            (symbol.name.clone(), symbol.as_variable()?.ty.clone())
        };
        let mut storage = ty.storage();
        let uniform_allowed = storage == Storage::Uniform && !self.is_es() && self.version >= 120;
        if !matches!(storage, Storage::Temporary | Storage::Global | Storage::Const) && !uniform_allowed {
            self.report(DiagnosticKind::Storage, loc)
                .message("cannot initialize this type of qualifier")
                .token(storage.name())
                .emit();
            return None;
        }
        self.array_object_check(loc, &ty, "array initializer");

        let Some(init) = self.convert_initializer_list(loc, &ty, initializer) else {
            if storage == Storage::Const {
                self.demote_to_temporary(id);
            }
            return None;
        };

        if ty.is_unsized_array()
            && let Some(size) = init.ty.outer_array_size()
        {
            if let Some(sizes) = ty.array_sizes.as_mut() {
                sizes.set_outer_size(size);
            }
            if let Some(slot) = self.editable_type(id) {
                *slot = ty.clone();
            }
        }

        let global = self.symbols.at_global_level();
        let constant = init.is_constant();
        let described = ty.to_string();
        if storage == Storage::Uniform && !constant {
            self.report(DiagnosticKind::NotConstant, loc)
                .message("uniform initializers must be constant")
                .token("=")
                .extra(described)
                .emit();
            self.demote_to_temporary(id);
            return None;
        }
        if storage == Storage::Const && !constant {
            if global {
                self.report(DiagnosticKind::NotConstant, loc)
                    .message("global const initializers must be constant")
                    .token("=")
                    .extra(described)
                    .emit();
                self.demote_to_temporary(id);
                return None;
            }
            let read_only_allowed = !self.is_es()
                && (self.version >= 420
                    || NON_CONST_INITIALIZER.iter().any(|e| self.extension_turned_on(e)));
            if !read_only_allowed {
                self.report(DiagnosticKind::NotConstant, loc)
                    .message("assigning non-constant to")
                    .token("=")
                    .extra(described)
                    .emit();
                self.demote_to_temporary(id);
                return None;
            }
            storage = Storage::ConstReadOnly;
            ty.qualifier.storage = storage;
            if let Some(slot) = self.editable_type(id) {
                slot.qualifier.storage = storage;
            }
        } else if storage != Storage::Const && global && !constant && self.is_es() {
            self.report_relaxed(DiagnosticKind::VersionGate, loc)
                .message("not allowed in this version")
                .token("non-constant global initializer")
                .emit();
        }

        if matches!(storage, Storage::Const | Storage::Uniform) {
            let converted = self
                .ast
                .add_conversion(init, &ty)
                .filter(|node| node.is_constant() && node.ty.same_shape(&ty));
            let Some(values) = converted.and_then(|node| node.constant_values().map(<[_]>::to_vec)) else {
                self.report(DiagnosticKind::TypeMismatch, loc)
                    .message("non-matching or non-convertible constant type for const initializer")
                    .token(storage.name())
                    .emit();
                self.demote_to_temporary(id);
                return None;
            };
            if let Some(var) = self.symbols.get_mut(id).and_then(|s| s.as_variable_mut()) {
                var.const_value = Some(values);
            }
            tracing::trace!(name = %name, "constant initializer folded");
            return None;
        }

        let left = self.ast.add_symbol(id, &name, &ty, loc);
        let right_ty = init.ty.clone();
        match self.ast.add_assign(Op::Assign, left, init, loc) {
            Some(node) => Some(node),
            None => {
                self.assign_error(loc, "=", &ty, &right_ty);
                None
            }
        }
    }

    fn demote_to_temporary(&mut self, id: SymbolId) {
        if let Some(ty) = self.editable_type(id) {
            ty.qualifier.make_temporary();
        }
    }

    /// Turn a brace initializer into the equivalent constructor tree.
    ///
    /// The grammar hands a `{ ... }` list over as an aggregate without an
    /// operator; anything else is returned unchanged.
    pub fn convert_initializer_list(
        &mut self,
        loc: SourceLoc,
        ty: &Type,
        initializer: Node,
    ) -> Option<Node> {
        let NodeKind::Aggregate {
            op: Op::Null,
            children,
            ..
        } = initializer.kind
        else {
            return Some(initializer);
        };

        const FEATURE: &str = "initializer list";
        self.require_profile(loc, ProfileMask::DESKTOP, FEATURE);
        self.profile_requires(loc, ProfileMask::DESKTOP, 420, NON_CONST_INITIALIZER, FEATURE);

        let mut target = ty.clone();
        let count = children.len();
        let element_types: Vec<Type> = if let Some(sizes) = &ty.array_sizes {
            match sizes.outer_size() {
                None => {
                    if let (Some(sizes), Ok(count)) = (target.array_sizes.as_mut(), u32::try_from(count)) {
                        sizes.set_outer_size(count);
                    }
                }
                Some(size) if size as usize != count => {
                    self.report(DiagnosticKind::Constructor, loc)
                        .message("wrong array size")
                        .token(FEATURE)
                        .extra(ty.name())
                        .emit();
                    return None;
                }
                Some(_) => {}
            }
            vec![ty.dereference(); count]
        } else if ty.is_struct() {
            if ty.fields().len() != count {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("wrong number of structure members")
                    .token(FEATURE)
                    .extra(ty.name())
                    .emit();
                return None;
            }
            ty.fields().iter().map(|f| f.ty.clone()).collect()
        } else if ty.is_matrix() {
            if ty.matrix_cols as usize != count {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("wrong number of matrix columns:")
                    .token(FEATURE)
                    .extra(ty.name())
                    .emit();
                return None;
            }
            vec![ty.dereference(); count]
        } else if ty.is_vector() {
            if ty.vector_size as usize != count {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("wrong vector size (or rows in a matrix column):")
                    .token(FEATURE)
                    .extra(ty.name())
                    .emit();
                return None;
            }
            vec![ty.dereference(); count]
        } else {
            if count != 1 {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("scalar expected one element:")
                    .token(FEATURE)
                    .extra(ty.name())
                    .emit();
                return None;
            }
            vec![ty.clone()]
        };

        let mut converted = Vec::with_capacity(count);
        for (child, element) in children.into_iter().zip(&element_types) {
            let child = self.convert_initializer_list(loc, element, child)?;
            converted.push(child);
        }
        if !ty.is_array() && !ty.is_struct() && !ty.is_matrix() && !ty.is_vector() {
            return converted.pop();
        }
        target.qualifier.make_temporary();
        self.add_constructor(loc, converted, &target)
    }

    /// A `const` declared without an initializer is kept as a temporary.
    pub fn non_init_const_check(&mut self, loc: SourceLoc, identifier: &str, ty: &mut Type) {
        if !matches!(ty.storage(), Storage::Const | Storage::ConstReadOnly) {
            return;
        }
        ty.qualifier.make_temporary();
        self.report(DiagnosticKind::NotConstant, loc)
            .message("variables with qualifier 'const' must be initialized")
            .token(identifier)
            .emit();
    }

    /// Built-in variables a shader may redeclare to change qualifiers or
    /// sizes. Returns the editable copy, or `None` when `identifier` is not
    /// such a redeclaration.
    pub fn redeclare_builtin_variable(
        &mut self,
        loc: SourceLoc,
        identifier: &str,
        qualifier: &Qualifier,
        shader: &ShaderQualifiers,
    ) -> Option<SymbolId> {
        if !Self::built_in_name(identifier) || !self.symbols.at_global_level() {
            return None;
        }
        let desktop = !self.is_es() && (self.version >= 130 || identifier == "gl_TexCoord");
        let es = self.is_es()
            && (self.version >= 320
                || ["GL_EXT_shader_io_blocks", "GL_OES_shader_io_blocks"]
                    .iter()
                    .any(|e| self.extension_turned_on(e)));
        if !desktop && !es {
            return None;
        }
        let redeclarable = match identifier {
            "gl_FragDepth" => (desktop && self.version >= 420) || es,
            "gl_FragCoord" => (desktop && self.version >= 150) || es,
            "gl_ClipDistance" | "gl_CullDistance" | "gl_TexCoord" => true,
            _ => false,
        };
        if !redeclarable {
            return None;
        }

        let found = self.symbols.lookup(identifier)?;
        let id = if found.built_in {
            self.make_editable(found.id)
        } else {
            found.id
        };
        let existing = self.symbols.variable_type(id)?.qualifier;

        if qualifier.storage != existing.storage || qualifier.is_memory() || qualifier.is_auxiliary() {
            self.report(DiagnosticKind::Storage, loc)
                .message("cannot change storage, memory, or auxiliary qualification of")
                .token("redeclaration")
                .extra(identifier)
                .emit();
        }
        if qualifier.is_interpolation() && identifier == "gl_FragCoord" {
            self.report(DiagnosticKind::Qualifier, loc)
                .message("cannot change interpolation qualification of")
                .token("redeclaration")
                .extra(identifier)
                .emit();
        }
        if let Some(ty) = self.editable_type(id) {
            if qualifier.precision != Precision::None {
                ty.qualifier.precision = qualifier.precision;
            }
            ty.qualifier.invariant |= qualifier.invariant;
            if identifier != "gl_FragCoord" {
                ty.qualifier.smooth = qualifier.smooth;
                ty.qualifier.flat = qualifier.flat;
                ty.qualifier.nopersp = qualifier.nopersp;
            }
        }

        match identifier {
            "gl_FragCoord" => {
                if shader.origin_upper_left {
                    self.ast.set_origin_upper_left();
                }
                if shader.pixel_center_integer {
                    self.ast.set_pixel_center_integer();
                }
            }
            "gl_FragDepth" => {
                if let Some(depth) = shader.depth
                    && !self.ast.set_depth(depth)
                {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("all redeclarations must use the same depth layout on")
                        .token("redeclaration")
                        .extra(identifier)
                        .emit();
                }
            }
            _ => {}
        }
        self.symbols.mark_declared(id);
        tracing::debug!(name = identifier, symbol = %id, "built-in variable redeclared");
        Some(id)
    }

    /// Copy a built-in into the user global level so it can be changed, and
    /// record it for the linker. Copies of per-vertex stage arrays join the
    /// resize list. User symbols are returned as they are.
    pub fn make_editable(&mut self, id: SymbolId) -> SymbolId {
        if !self.symbols.is_built_in(id) {
            return id;
        }
        let first = self.symbols.copy_of(id).is_none();
        let copy = self.symbols.copy_up(id);
        if !first {
            return copy;
        }
        let target = self
            .symbols
            .get(copy)
            .as_member()
            .map_or(copy, |(block, _)| block);
        let name = self.symbols.get(target).name.clone();
        if let Some(ty) = self.symbols.variable_type(target).cloned() {
            if self.is_io_resize_array(&ty) {
                self.register_io_array(target, &name);
            }
            let loc = self.symbols.get(target).loc;
            let node = self.ast.add_symbol(target, &name, &ty, loc);
            self.ast.add_to_linkage(node);
        }
        copy
    }

    /// The symbol named `name`, copied up first if it is a built-in.
    pub fn get_editable_variable(&mut self, name: &str) -> Option<SymbolId> {
        let found = self.symbols.lookup(name)?;
        if self.symbols.get(found.id).is_function() {
            return None;
        }
        Some(if found.built_in {
            self.make_editable(found.id)
        } else {
            found.id
        })
    }

    /// Size inside `[...]`: a positive constant integer.
    pub fn array_size_check(&mut self, loc: SourceLoc, node: &Node) -> Option<u32> {
        let value = match node.const_int() {
            Some(value) if node.ty.is_integer_scalar() => value,
            _ => {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("array size must be a constant integer expression")
                    .emit();
                return None;
            }
        };
        match u32::try_from(value) {
            Ok(size) if size > 0 => Some(size),
            _ => {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("array size must be a positive integer")
                    .emit();
                None
            }
        }
    }

    /// Version gates on the storage of an array declaration.
    pub fn array_qualifier_error(&mut self, loc: SourceLoc, qualifier: &Qualifier) -> bool {
        let mut failed = false;
        if qualifier.storage == Storage::Const {
            failed |= !self.profile_requires(loc, ProfileMask::NONE, 120, &["GL_3DL_array_objects"], "const array");
            failed |= !self.profile_requires(loc, ProfileMask::ES, 300, &[], "const array");
        }
        if qualifier.storage == Storage::VaryingIn && self.stage == Stage::Vertex {
            failed |= !self.require_profile(loc, ProfileMask::DESKTOP, "vertex input arrays");
            failed |= !self.profile_requires(loc, ProfileMask::NONE, 150, &[], "vertex input arrays");
        }
        failed
    }

    /// Arrays of structures and arrays of arrays on ES stage interfaces.
    pub fn array_error(&mut self, loc: SourceLoc, ty: &Type) -> bool {
        let feature = match (self.stage, ty.storage()) {
            (Stage::Vertex, Storage::VaryingOut) if ty.is_array_of_arrays() => {
                "vertex-shader array-of-array output"
            }
            (Stage::Vertex, Storage::VaryingOut) if ty.is_struct() => {
                "vertex-shader array-of-struct output"
            }
            (Stage::Fragment, Storage::VaryingIn) if ty.is_array_of_arrays() => {
                "fragment-shader array-of-array input"
            }
            (Stage::Fragment, Storage::VaryingIn) if ty.is_struct() => {
                "fragment-shader array-of-struct input"
            }
            (Stage::Fragment, Storage::VaryingOut) if ty.is_array_of_arrays() => {
                "fragment-shader array-of-array output"
            }
            _ => return false,
        };
        !self.require_profile(loc, ProfileMask::DESKTOP, feature)
    }

    pub fn array_size_required_check(&mut self, loc: SourceLoc, sizes: &ArraySizes) -> bool {
        if !sizes.is_outer_unsized() {
            return false;
        }
        self.report(DiagnosticKind::ArraySize, loc)
            .message("array size required")
            .emit();
        true
    }

    /// Where an array may be left implicitly sized.
    ///
    /// Desktop allows an unsized outer dimension anywhere; ES only with an
    /// initializer, for the last member of a buffer block, or on per-vertex
    /// stage interfaces.
    pub fn array_unsized_check(
        &mut self,
        loc: SourceLoc,
        qualifier: &Qualifier,
        sizes: &ArraySizes,
        initializer: Option<&Node>,
        last_member: bool,
    ) {
        if let Some(init) = initializer {
            if init.ty.is_unsized_array() {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("array initializer must be sized")
                    .token("[]")
                    .emit();
            }
            return;
        }
        if sizes.is_inner_unsized() {
            self.report(DiagnosticKind::ArraySize, loc)
                .message("only outermost dimension of an array of arrays can be implicitly sized")
                .token("[]")
                .emit();
            return;
        }
        if !self.is_es() {
            return;
        }
        if qualifier.storage == Storage::Buffer && last_member {
            return;
        }
        if self.is_arrayed_io(qualifier) {
            return;
        }
        self.array_size_required_check(loc, sizes);
    }

    /// Arrays of arrays need desktop 430 or ES 310. Returns false when the
    /// gate failed.
    pub fn array_of_array_version_check(&mut self, loc: SourceLoc, sizes: &ArraySizes) -> bool {
        if sizes.num_dims() < 2 {
            return true;
        }
        const FEATURE: &str = "arrays of arrays";
        self.profile_requires(loc, ProfileMask::ES, 310, &[], FEATURE)
            && self.profile_requires(
                loc,
                ProfileMask::DESKTOP,
                430,
                &["GL_ARB_arrays_of_arrays"],
                FEATURE,
            )
    }

    /// Sizes on both the type and the declarator form an array of arrays.
    pub fn array_dim_check(
        &mut self,
        loc: SourceLoc,
        type_sizes: Option<&ArraySizes>,
        declarator_sizes: Option<&ArraySizes>,
    ) -> bool {
        let merged = match (type_sizes, declarator_sizes) {
            (Some(inner), Some(outer)) => {
                let mut merged = outer.clone();
                merged.add_inner_sizes(inner);
                merged
            }
            (Some(sizes), None) | (None, Some(sizes)) => sizes.clone(),
            (None, None) => return false,
        };
        !self.array_of_array_version_check(loc, &merged)
    }

    /// Declarator sizes become the outer dimensions of the type.
    pub fn array_dim_merge(ty: &mut Type, declarator_sizes: Option<&ArraySizes>) {
        let Some(outer) = declarator_sizes else {
            return;
        };
        let mut merged = outer.clone();
        if let Some(inner) = ty.array_sizes.take() {
            merged.add_inner_sizes(&inner);
        }
        ty.array_sizes = Some(merged);
    }

    /// Array members of a structure must be explicitly sized.
    pub fn struct_array_check(&mut self, ty: &Type) -> bool {
        let unsized_fields: Vec<SourceLoc> = ty
            .fields()
            .iter()
            .filter(|f| f.ty.array_sizes.as_ref().is_some_and(ArraySizes::is_outer_unsized))
            .map(|f| f.loc)
            .collect();
        for loc in &unsized_fields {
            self.report(DiagnosticKind::ArraySize, *loc)
                .message("array size required")
                .emit();
        }
        !unsized_fields.is_empty()
    }

    /// `struct Name { ... }`: check the members and declare the type name.
    pub fn declare_struct(
        &mut self,
        loc: SourceLoc,
        name: Option<&str>,
        mut fields: Vec<Field>,
    ) -> Type {
        self.struct_type_check(&mut fields);
        for field in &mut fields {
            field.ty.qualifier.storage = Storage::Temporary;
        }
        let def = Arc::new(StructDef::new(name.unwrap_or(""), fields));
        let ty = Type::structure(def, false);
        self.struct_array_check(&ty);

        let Some(name) = name else {
            return ty;
        };
        self.reserved_error_check(loc, name);
        if self
            .symbols
            .insert(name, loc, SymbolKind::Variable(Variable::user_type(ty.clone())))
            .is_err()
        {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("redefinition")
                .token(name)
                .extra("struct")
                .emit();
        }
        tracing::trace!(name, "struct declared");
        ty
    }
}
