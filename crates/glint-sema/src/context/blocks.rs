//! Interface blocks: declaration, built-in redeclaration and member layout.

use std::sync::Arc;

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::symbols::{SymbolId, SymbolKind, SymbolOrigin, Variable};
use crate::types::size::{location_size, memory_layout, round_up, xfb_size};
use crate::types::{
    ArraySizes, BasicType, Field, LayoutMatrix, LayoutPacking, PublicType, Qualifier, Storage,
    StructDef, Type,
};

use super::ParseContext;

impl ParseContext {
    /// `uniform Name { ... } instance[N];` and its `buffer`, `in`, `out` forms.
    ///
    /// Returns the symbol of the instance, or of the hidden container of an
    /// anonymous block.
    pub fn declare_block(
        &mut self,
        loc: SourceLoc,
        block_name: &str,
        mut members: Vec<Field>,
        public_type: &PublicType,
        instance: Option<&str>,
        array: Option<ArraySizes>,
    ) -> Option<SymbolId> {
        let mut qualifier = public_type.qualifier;
        self.global_qualifier_fix_check(loc, &mut qualifier);
        if !self.block_storage_check(loc, qualifier.storage, block_name) {
            return None;
        }
        self.check_no_shader_layouts(loc, &public_type.shader_qualifiers);

        if Self::built_in_name(block_name) {
            return self.redeclare_builtin_block(loc, block_name, members, qualifier, instance, array);
        }

        self.reserved_error_check(loc, block_name);
        if let Some(instance) = instance {
            self.reserved_error_check(loc, instance);
        }

        self.block_member_check(qualifier.storage, &mut members);

        self.inherit_global_defaults(&mut qualifier);
        self.layout_qualifier_check(loc, &qualifier);
        for member in &mut members {
            let mut layout = qualifier.layout;
            layout.location = None;
            layout.component = None;
            layout.offset = None;
            layout.xfb_offset = None;
            Self::merge_object_layout_qualifiers(&mut layout, &member.ty.qualifier.layout, false);
            member.ty.qualifier.layout = layout;
        }

        self.fix_block_locations(loc, &mut qualifier, &mut members);
        self.fix_block_xfb_offsets(&mut qualifier, &mut members);
        self.fix_block_uniform_offsets(loc, &qualifier, &mut members);

        let def = Arc::new(StructDef::new(block_name, members));
        let mut ty = Type::structure(def.clone(), true).with_qualifier(qualifier);
        ty.array_sizes = array;
        if let Some(sizes) = &ty.array_sizes {
            self.array_of_array_version_check(loc, sizes);
            if sizes.is_outer_unsized()
                && !self.is_arrayed_io(&qualifier)
                && qualifier.storage != Storage::Buffer
            {
                self.array_size_required_check(loc, sizes);
            }
        }
        self.io_array_check(loc, &ty, instance.unwrap_or(block_name));
        self.fix_io_array_size(loc, &mut ty);
        self.layout_object_check(loc, &ty);

        let id = match instance {
            Some(name) => {
                match self
                    .symbols
                    .insert(name, loc, SymbolKind::Variable(Variable::new(ty.clone())))
                {
                    Ok(id) => id,
                    Err(_) => {
                        self.report(DiagnosticKind::Redefinition, loc)
                            .message("redefinition")
                            .token(name)
                            .emit();
                        return None;
                    }
                }
            }
            None => {
                let container = self.symbols.insert_anonymous(loc, Variable::new(ty.clone()));
                for (index, field) in def.fields.iter().enumerate() {
                    let member = SymbolKind::Member {
                        block: container,
                        index,
                    };
                    if self.symbols.insert(&field.name, field.loc, member).is_err() {
                        self.report(DiagnosticKind::Redefinition, field.loc)
                            .message("nameless block contains a member that already has a name at global scope")
                            .token(field.name.as_str())
                            .emit();
                    }
                }
                container
            }
        };

        let name = instance.unwrap_or(block_name);
        if self.is_io_resize_array(&ty) {
            self.register_io_array(id, name);
            self.check_io_arrays_consistency(loc, true);
        }
        tracing::debug!(block = block_name, instance = ?instance, storage = ?qualifier.storage, "block declared");

        let node = self.ast.add_symbol(id, name, &ty, loc);
        self.ast.add_to_linkage(node);
        Some(id)
    }

    /// Returns false when the block cannot be declared with this storage.
    fn block_storage_check(&mut self, loc: SourceLoc, storage: Storage, block_name: &str) -> bool {
        const IO_BLOCKS: &[&str] = &["GL_EXT_shader_io_blocks", "GL_OES_shader_io_blocks"];
        match storage {
            Storage::Uniform => {
                self.profile_requires(loc, ProfileMask::ES, 300, &[], "uniform block");
                self.profile_requires(loc, ProfileMask::DESKTOP, 140, &[], "uniform block");
                true
            }
            Storage::Buffer => {
                self.profile_requires(loc, ProfileMask::ES, 310, &[], "buffer block");
                self.profile_requires(loc, ProfileMask::DESKTOP, 430, &[], "buffer block");
                true
            }
            Storage::VaryingIn => {
                if self.stage == Stage::Vertex {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot declare an input block in a vertex shader")
                        .token(block_name)
                        .emit();
                    return false;
                }
                self.profile_requires(loc, ProfileMask::ES, 320, IO_BLOCKS, "input block");
                self.profile_requires(loc, ProfileMask::DESKTOP, 150, &[], "input block");
                true
            }
            Storage::VaryingOut => {
                if self.stage == Stage::Fragment {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot declare an output block in a fragment shader")
                        .token(block_name)
                        .emit();
                    return false;
                }
                self.profile_requires(loc, ProfileMask::ES, 320, IO_BLOCKS, "output block");
                self.profile_requires(loc, ProfileMask::DESKTOP, 150, &[], "output block");
                true
            }
            other => {
                self.report(DiagnosticKind::Storage, loc)
                    .message("only uniform, buffer, in, or out blocks are supported")
                    .token(other.name())
                    .emit();
                false
            }
        }
    }

    fn block_member_check(&mut self, storage: Storage, members: &mut [Field]) {
        let count = members.len();
        for (index, member) in members.iter_mut().enumerate() {
            let loc = member.loc;
            let name = member.name.clone();
            let q = member.ty.qualifier;

            let member_storage = match q.storage {
                Storage::In => Storage::VaryingIn,
                Storage::Out => Storage::VaryingOut,
                other => other,
            };
            if !matches!(member_storage, Storage::Temporary | Storage::Global)
                && member_storage != storage
            {
                self.report(DiagnosticKind::Storage, loc)
                    .message("member storage qualifier cannot contradict block storage qualifier")
                    .token(name.as_str())
                    .emit();
            }
            if member.ty.contains_opaque() {
                self.report(DiagnosticKind::Storage, loc)
                    .message("member of block cannot be or contain a sampler, image, or atomic_uint type")
                    .token(name.as_str())
                    .emit();
            }
            if q.is_memory() && storage != Storage::Buffer {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message("memory qualifiers can only be used on buffer block members")
                    .token(name.as_str())
                    .emit();
            }
            if q.layout.packing.is_some() {
                self.report(DiagnosticKind::Layout, loc)
                    .message("cannot use packing layout qualifiers on a block member")
                    .token(name.as_str())
                    .emit();
                member.ty.qualifier.layout.packing = None;
            }
            if !storage.is_pipe_io() && (q.is_interpolation() || q.is_auxiliary()) {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message("cannot use interpolation or auxiliary qualifiers on a uniform or buffer block member")
                    .token(name.as_str())
                    .emit();
            }
            if let Some(sizes) = &member.ty.array_sizes {
                let runtime_sized = storage == Storage::Buffer && index + 1 == count;
                if sizes.is_outer_unsized() && !runtime_sized {
                    self.array_size_required_check(loc, sizes);
                }
            }

            member.ty.qualifier.storage = storage;
            let public = PublicType::from_type(loc, &member.ty);
            let mut q = member.ty.qualifier;
            self.precision_qualifier_check(loc, &public, &mut q);
            member.ty.qualifier = q;
        }
    }

    /// Give every member a location once the block or any member has one.
    pub fn fix_block_locations(
        &mut self,
        loc: SourceLoc,
        qualifier: &mut Qualifier,
        members: &mut [Field],
    ) {
        let with = members.iter().filter(|m| m.ty.qualifier.layout.location.is_some()).count();
        let without = members.len() - with;

        if qualifier.layout.location.is_none() && with > 0 && without > 0 {
            self.report(DiagnosticKind::Layout, loc)
                .message("either the block needs a location, or all members need a location, or no members have a location")
                .token("location")
                .emit();
            return;
        }
        if qualifier.layout.location.is_none() && with == 0 {
            return;
        }

        let mut next = qualifier.layout.location.take().unwrap_or(0);
        if qualifier.layout.component.take().is_some() {
            self.report(DiagnosticKind::Layout, loc)
                .message("cannot apply to a block")
                .token("component")
                .emit();
        }
        for member in members.iter_mut() {
            match member.ty.qualifier.layout.location {
                Some(location) => next = location,
                None => member.ty.qualifier.layout.location = Some(next),
            }
            next += location_size(&member.ty);
        }
    }

    /// Assign transform feedback offsets to members of a block that has
    /// both `xfb_buffer` and `xfb_offset`. The block offset is consumed.
    pub fn fix_block_xfb_offsets(&mut self, qualifier: &mut Qualifier, members: &mut [Field]) {
        let (Some(_), Some(start)) = (qualifier.layout.xfb_buffer, qualifier.layout.xfb_offset)
        else {
            return;
        };
        let mut next = start;
        for member in members.iter_mut() {
            let align = if member.ty.contains_double() { 8 } else { 4 };
            let offset = match member.ty.qualifier.layout.xfb_offset {
                Some(explicit) => explicit,
                None => round_up(next, align),
            };
            member.ty.qualifier.layout.xfb_offset = Some(offset);
            next = offset + xfb_size(&member.ty);
        }
        qualifier.layout.xfb_offset = None;
    }

    /// Assign std140/std430 offsets to uniform and buffer block members,
    /// in declaration order.
    pub fn fix_block_uniform_offsets(
        &mut self,
        loc: SourceLoc,
        qualifier: &Qualifier,
        members: &mut [Field],
    ) {
        if !qualifier.storage.is_uniform_or_buffer() {
            return;
        }
        let packing = match qualifier.layout.packing {
            Some(packing @ (LayoutPacking::Std140 | LayoutPacking::Std430)) => packing,
            _ => return,
        };
        let block_matrix = qualifier.layout.matrix.unwrap_or(LayoutMatrix::ColumnMajor);

        let mut offset = 0;
        for member in members.iter_mut() {
            let layout = member.ty.qualifier.layout;
            let matrix = layout.matrix.unwrap_or(block_matrix);
            let memory = memory_layout(&member.ty, packing, matrix);
            let mut align = memory.align;
            if let Some(explicit) = layout.align.or(qualifier.layout.align) {
                align = align.max(explicit);
            }

            if let Some(explicit) = layout.offset {
                if explicit < offset {
                    self.report(DiagnosticKind::Layout, member.loc)
                        .message("cannot lie in previous members")
                        .token("offset")
                        .extra(member.name.as_str())
                        .emit();
                }
                if explicit % memory.align != 0 {
                    self.report(DiagnosticKind::Layout, member.loc)
                        .message("must be a multiple of the member's alignment")
                        .token("offset")
                        .extra(member.name.as_str())
                        .emit();
                }
                offset = explicit;
            }
            offset = round_up(offset, align);
            member.ty.qualifier.layout.offset = Some(offset);
            tracing::trace!(%loc, member = %member.name, offset, size = memory.size, "member offset");
            offset += memory.size;
        }
    }

    /// Redeclare `gl_PerVertex` to trim or requalify its members.
    ///
    /// A block that was already used (and so copied up) cannot be
    /// redeclared; repeating an identical redeclaration is accepted.
    fn redeclare_builtin_block(
        &mut self,
        loc: SourceLoc,
        block_name: &str,
        members: Vec<Field>,
        qualifier: Qualifier,
        instance: Option<&str>,
        array: Option<ArraySizes>,
    ) -> Option<SymbolId> {
        const FEATURE: &str = "built-in block redeclaration";
        self.profile_requires(
            loc,
            ProfileMask::ES,
            320,
            &["GL_EXT_shader_io_blocks", "GL_OES_shader_io_blocks"],
            FEATURE,
        );
        self.profile_requires(
            loc,
            ProfileMask::DESKTOP,
            410,
            &["GL_ARB_separate_shader_objects"],
            FEATURE,
        );

        if block_name != "gl_PerVertex" {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("cannot redeclare block:")
                .token("block declaration")
                .extra(block_name)
                .emit();
            return None;
        }
        if let Some(name) = instance
            && !Self::built_in_name(name)
        {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("cannot redeclare a built-in block with a user name")
                .token(name)
                .emit();
            return None;
        }

        let key = match (instance, members.first()) {
            (Some(name), _) => name.to_string(),
            (None, Some(first)) => first.name.clone(),
            (None, None) => return None,
        };
        let Some(found) = self.symbols.lookup(&key) else {
            self.report(DiagnosticKind::Undeclared, loc)
                .message("no declaration found for redeclaration")
                .token(key.as_str())
                .emit();
            return None;
        };

        if !found.built_in {
            return self.repeated_block_redeclaration(loc, block_name, found.id, &members, &array);
        }

        let copy = self.symbols.copy_up(found.id);
        let block = self.symbols.get(copy).as_member().map_or(copy, |(block, _)| block);
        let Some(mut ty) = self.symbols.variable_type(block).cloned() else {
            return None;
        };
        if ty.basic != BasicType::Block {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("cannot redeclare a non block as a block")
                .token(key.as_str())
                .emit();
            return None;
        }

        let mut kept = Vec::new();
        let mut omitted = Vec::new();
        for old in ty.fields() {
            match members.iter().find(|m| m.name == old.name) {
                Some(new) => {
                    let mut field = old.clone();
                    self.redeclared_member_check(loc, &mut field, new);
                    kept.push(field);
                }
                None => omitted.push(old.name.clone()),
            }
        }
        if kept.len() < members.len() {
            self.report(DiagnosticKind::Redefinition, loc)
                .message("block redeclaration has extra members")
                .token(block_name)
                .emit();
        }

        match (&mut ty.array_sizes, &array) {
            (None, None) => {}
            (Some(old), Some(new)) => match (old.outer_size(), new.outer_size()) {
                (Some(_), None) => {
                    self.report(DiagnosticKind::ArraySize, loc)
                        .message("block already declared with size, can't redeclare as implicitly-sized")
                        .token(block_name)
                        .emit();
                }
                (Some(a), Some(b)) if a != b => {
                    self.report(DiagnosticKind::ArraySize, loc)
                        .message("cannot change array size of redeclared block")
                        .token(block_name)
                        .emit();
                }
                (None, Some(size)) => old.set_outer_size(size),
                _ => {}
            },
            _ => {
                self.report(DiagnosticKind::ArraySize, loc)
                    .message("cannot change arrayness of redeclared block")
                    .token(block_name)
                    .emit();
            }
        }

        let storage = ty.storage();
        if qualifier.storage != storage {
            self.report(DiagnosticKind::Storage, loc)
                .message("cannot change storage of redeclared block")
                .token(block_name)
                .emit();
        }

        let kept_names: Vec<String> = kept.iter().map(|f| f.name.clone()).collect();
        ty.structure = Some(Arc::new(StructDef::new(block_name, kept)));
        if let Some(var) = self.symbols.get_mut(block).and_then(|s| s.as_variable_mut()) {
            var.ty = ty.clone();
        }

        if instance.is_none() {
            for name in &omitted {
                self.symbols.hide(name);
            }
            for (index, name) in kept_names.iter().enumerate() {
                let Some(member) = self.symbols.lookup(name) else {
                    continue;
                };
                if let Some(symbol) = self.symbols.get_mut(member.id)
                    && let SymbolKind::Member { index: slot, .. } = &mut symbol.kind
                {
                    *slot = index;
                }
                self.symbols.mark_declared(member.id);
            }
        }
        self.symbols.mark_declared(block);

        self.layout_object_check(loc, &ty);
        let name = instance.unwrap_or(block_name);
        if self.is_io_resize_array(&ty) {
            self.register_io_array(block, name);
            self.check_io_arrays_consistency(loc, true);
        } else if ty.is_array() {
            self.fix_io_array_size(loc, &mut ty);
            if let Some(var) = self.symbols.get_mut(block).and_then(|s| s.as_variable_mut()) {
                var.ty = ty.clone();
            }
        }
        tracing::debug!(block = block_name, instance = ?instance, omitted = omitted.len(), "built-in block redeclared");

        let ty = self.symbols.variable_type(block).cloned().unwrap_or(ty);
        let node = self.ast.add_symbol(block, name, &ty, loc);
        self.ast.add_to_linkage(node);
        Some(block)
    }

    /// Check a redeclared member against the built-in one and take over the
    /// qualifiers a redeclaration may change.
    fn redeclared_member_check(&mut self, loc: SourceLoc, old: &mut Field, new: &Field) {
        let name = old.name.clone();
        let member_loc = new.loc;
        if !new.ty.same_element_shape(&old.ty) {
            self.report(DiagnosticKind::TypeMismatch, member_loc)
                .message("cannot redeclare block member with a different type")
                .token(name.as_str())
                .emit();
        }
        match (&mut old.ty.array_sizes, &new.ty.array_sizes) {
            (None, None) => {}
            (Some(old_sizes), Some(new_sizes)) => match (old_sizes.outer_size(), new_sizes.outer_size()) {
                (Some(a), b) if Some(a) != b => {
                    self.report(DiagnosticKind::ArraySize, member_loc)
                        .message("cannot change array size of redeclared block member")
                        .token(name.as_str())
                        .emit();
                }
                (None, Some(size)) => {
                    old_sizes.set_outer_size(size);
                    self.array_limit_check(loc, &name, size);
                }
                _ => {}
            },
            _ => {
                self.report(DiagnosticKind::ArraySize, member_loc)
                    .message("cannot change arrayness of redeclared block member")
                    .token(name.as_str())
                    .emit();
            }
        }

        let q = new.ty.qualifier;
        for (present, what) in [
            (q.is_memory(), "cannot add memory qualifier to redeclared block member"),
            (q.has_layout(), "cannot add layout to redeclared block member"),
            (q.patch, "cannot add patch to redeclared block member"),
        ] {
            if present {
                self.report(DiagnosticKind::Qualifier, member_loc)
                    .message(what)
                    .token(name.as_str())
                    .emit();
            }
        }
        let old_q = &mut old.ty.qualifier;
        old_q.centroid = q.centroid;
        old_q.sample = q.sample;
        old_q.invariant = q.invariant;
        old_q.smooth = q.smooth;
        old_q.flat = q.flat;
        old_q.nopersp = q.nopersp;
    }

    /// A built-in block found at user level was either used before (copied
    /// up) or already redeclared.
    fn repeated_block_redeclaration(
        &mut self,
        loc: SourceLoc,
        block_name: &str,
        found: SymbolId,
        members: &[Field],
        array: &Option<ArraySizes>,
    ) -> Option<SymbolId> {
        let symbol = self.symbols.get(found);
        let block = symbol.as_member().map_or(found, |(block, _)| block);
        let origin = self.symbols.get(block).origin;
        let identical = self.symbols.variable_type(block).is_some_and(|ty| {
            ty.is_array() == array.is_some()
                && ty.fields().len() == members.len()
                && ty.fields().iter().zip(members).all(|(old, new)| {
                    old.name == new.name
                        && old.ty.same_element_shape(&new.ty)
                        && old.ty.is_array() == new.ty.is_array()
                })
        });

        if origin == SymbolOrigin::Declared && identical {
            tracing::debug!(block = block_name, "identical block redeclaration");
            return Some(block);
        }
        self.report(DiagnosticKind::Redefinition, loc)
            .message("can only redeclare a built-in block once, and before any use")
            .token(block_name)
            .emit();
        None
    }
}
