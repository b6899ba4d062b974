//! Deferred sizing of per-vertex stage arrays.
//!
//! Geometry inputs and tessellation control outputs may be declared (and
//! indexed) before the layout that fixes their outer size. Each such array
//! gets one resize entry; entries are sized when the layout arrives and
//! locked in the final pass.

use std::sync::Arc;

use glint_core::{SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{Node, NodeKind, Op};
use crate::symbols::SymbolId;
use crate::types::{Qualifier, Storage, Type};

use super::ParseContext;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IoArrayState {
    /// No size yet; only the largest constant index seen is tracked.
    Pending,
    /// Sized from the layout known at the first indexed access.
    SizedFromFirstUse,
    /// Sized when an explicit layout declaration arrived.
    SizedFromLayout,
    /// Final; set at the end of the compilation unit.
    Locked,
}

/// A stage array whose outer size comes from a shader layout.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IoResizeEntry {
    pub symbol: SymbolId,
    pub name: String,
    pub first_use: Option<SourceLoc>,
    pub state: IoArrayState,
}

impl ParseContext {
    /// Interface storage that is per-vertex arrayed in the current stage.
    pub(crate) fn is_arrayed_io(&self, qualifier: &Qualifier) -> bool {
        match self.stage {
            Stage::Geometry => qualifier.storage == Storage::VaryingIn,
            Stage::TessControl => {
                matches!(qualifier.storage, Storage::VaryingIn | Storage::VaryingOut)
                    && !qualifier.patch
            }
            Stage::TessEvaluation => qualifier.storage == Storage::VaryingIn && !qualifier.patch,
            _ => false,
        }
    }

    /// Geometry inputs and non-patch tessellation control outputs.
    pub fn is_io_resize_array(&self, ty: &Type) -> bool {
        if !ty.is_array() {
            return false;
        }
        match self.stage {
            Stage::Geometry => ty.storage() == Storage::VaryingIn,
            Stage::TessControl => ty.storage() == Storage::VaryingOut && !ty.qualifier.patch,
            _ => false,
        }
    }

    /// Tessellation inputs are always `gl_MaxPatchVertices` long.
    pub fn fix_io_array_size(&mut self, loc: SourceLoc, ty: &mut Type) {
        if !ty.is_array() || ty.qualifier.patch || ty.storage() != Storage::VaryingIn {
            return;
        }
        if !matches!(self.stage, Stage::TessControl | Stage::TessEvaluation) {
            return;
        }
        let max = self.resources.max_patch_vertices;
        let Some(sizes) = ty.array_sizes.as_mut() else {
            return;
        };
        if sizes.outer_size() == Some(max) {
            return;
        }
        if sizes.outer_size().is_some() {
            self.report(DiagnosticKind::IoArraySize, loc)
                .message("tessellation input array size must be gl_MaxPatchVertices or implicitly sized")
                .token("[]")
                .emit();
        }
        sizes.set_outer_size(max);
    }

    pub fn io_array_check(&mut self, loc: SourceLoc, ty: &Type, identifier: &str) {
        if ty.is_array() || !self.is_arrayed_io(&ty.qualifier) {
            return;
        }
        self.report(DiagnosticKind::IoArraySize, loc)
            .message("type must be an array:")
            .token(ty.storage().name())
            .extra(identifier)
            .emit();
    }

    /// The entry for `name`, created on first call. A later copy or
    /// redeclaration of the same name takes over the entry.
    pub(crate) fn register_io_array(&mut self, symbol: SymbolId, name: &str) -> usize {
        if let Some(index) = self.io_arrays.iter().position(|e| e.name == name) {
            self.io_arrays[index].symbol = symbol;
            return index;
        }
        tracing::debug!(name, symbol = %symbol, "io array pending");
        self.io_arrays.push(IoResizeEntry {
            symbol,
            name: name.to_string(),
            first_use: None,
            state: IoArrayState::Pending,
        });
        self.io_arrays.len() - 1
    }

    /// Indexing an unsized stage array sizes it when the layout is already
    /// known, so that variable indexing is legal.
    pub fn handle_io_resize_array_access(&mut self, loc: SourceLoc, base: &mut Node) {
        if !self.is_io_resize_array(&base.ty) {
            return;
        }
        let Some((id, name)) = base.as_variable().map(|(id, name)| (id, name.to_string())) else {
            return;
        };
        let outer_unsized = base
            .ty
            .array_sizes
            .as_ref()
            .is_some_and(|sizes| sizes.is_outer_unsized());
        if !outer_unsized {
            return;
        }

        let entry = self.register_io_array(id, &name);
        if self.io_arrays[entry].first_use.is_none() {
            self.io_arrays[entry].first_use = Some(loc);
        }
        let (Some(size), _) = self.get_io_array_implicit_size() else {
            return;
        };
        if let Some(sizes) = base.ty.array_sizes.as_mut() {
            sizes.set_outer_size(size);
        }
        if let Some(sizes) = self.editable_type(id).and_then(|ty| ty.array_sizes.as_mut()) {
            sizes.set_outer_size(size);
        }
        self.io_arrays[entry].state = IoArrayState::SizedFromFirstUse;
        tracing::debug!(name = %name, size, "io array sized from first use");
    }

    /// Size the registered arrays from the current layout.
    ///
    /// With `tail_only`, only the most recent entry is checked, as after a
    /// new declaration.
    pub fn check_io_arrays_consistency(&mut self, loc: SourceLoc, tail_only: bool) {
        let (Some(required), feature) = self.get_io_array_implicit_size() else {
            return;
        };
        let start = if tail_only {
            self.io_arrays.len().saturating_sub(1)
        } else {
            0
        };
        for index in start..self.io_arrays.len() {
            let entry = &self.io_arrays[index];
            if entry.state == IoArrayState::Locked {
                continue;
            }
            let (id, name) = (entry.symbol, entry.name.clone());
            let Some(mut ty) = self.symbols.variable_type(id).cloned() else {
                continue;
            };
            self.check_io_array_consistency(loc, required, feature, &mut ty, &name);
            if let Some(slot) = self.editable_type(id) {
                *slot = ty;
            }
            let entry = &mut self.io_arrays[index];
            if entry.state == IoArrayState::Pending {
                entry.state = IoArrayState::SizedFromLayout;
                tracing::debug!(name = %name, size = required, "io array sized from layout");
            }
        }
    }

    /// Size implied by the layout declared so far, and the name of that
    /// layout for messages.
    pub fn get_io_array_implicit_size(&self) -> (Option<u32>, &'static str) {
        let layout = self.ast.layout();
        match self.stage {
            Stage::Geometry => (
                layout.input_primitive.and_then(|g| g.input_vertex_count()),
                "input primitive",
            ),
            Stage::TessControl => (layout.vertices, "vertices"),
            _ => (None, ""),
        }
    }

    pub fn check_io_array_consistency(
        &mut self,
        loc: SourceLoc,
        required: u32,
        feature: &str,
        ty: &mut Type,
        name: &str,
    ) {
        let stage = self.stage;
        let Some(sizes) = ty.array_sizes.as_mut() else {
            return;
        };
        if sizes.is_outer_unsized() {
            if sizes.implicit_size() > required {
                self.report(DiagnosticKind::IndexOutOfRange, loc)
                    .message("array index out of range for the declared layout:")
                    .token(feature)
                    .extra(name)
                    .emit();
            }
            sizes.set_outer_size(required);
            return;
        }
        if sizes.outer_size() == Some(required) {
            return;
        }
        let message = match stage {
            Stage::Geometry => "inconsistent input primitive for array size of",
            _ => "inconsistent output number of vertices for array size of",
        };
        self.report(DiagnosticKind::IoArraySize, loc)
            .message(message)
            .token(feature)
            .extra(name)
            .emit();
    }

    /// Track the largest constant index used on an unsized array.
    ///
    /// `base` is the indexed expression: a variable, or a member selected
    /// from a block.
    pub fn update_implicit_array_size(&mut self, loc: SourceLoc, base: &Node, index: u32) {
        let target = match &base.kind {
            NodeKind::Variable { id, .. } => self.editable_type(*id),
            NodeKind::Binary {
                op: Op::IndexDirectStruct,
                left,
                right,
            } => {
                let field = right.const_int().and_then(|f| usize::try_from(f).ok());
                match (left.as_variable(), field) {
                    (Some((block, _)), Some(field)) => self.editable_field_type(block, field),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some(sizes) = target.and_then(|ty| ty.array_sizes.as_mut()) else {
            return;
        };
        if !sizes.is_outer_unsized() {
            return;
        }
        sizes.update_implicit_size(index);
        tracing::trace!(%loc, index, "implicit array size");
    }

    /// Mutable type of one field of a user block or struct variable.
    pub(crate) fn editable_field_type(&mut self, block: SymbolId, field: usize) -> Option<&mut Type> {
        let var = self.symbols.get_mut(block)?.as_variable_mut()?;
        let def = var.ty.structure.as_mut()?;
        Arc::make_mut(def)
            .fields
            .get_mut(field)
            .map(|f| &mut f.ty)
    }

    /// Final pass: every registered array must have a size by now.
    pub(crate) fn lock_io_arrays(&mut self, loc: SourceLoc) {
        let (required, feature) = self.get_io_array_implicit_size();
        for index in 0..self.io_arrays.len() {
            let (id, name, first_use) = {
                let entry = &self.io_arrays[index];
                (entry.symbol, entry.name.clone(), entry.first_use)
            };
            let sized = self
                .symbols
                .variable_type(id)
                .and_then(|ty| ty.outer_array_size())
                .is_some();
            if !sized {
                match required {
                    Some(required) => {
                        if let Some(mut ty) = self.symbols.variable_type(id).cloned() {
                            self.check_io_array_consistency(loc, required, feature, &mut ty, &name);
                            if let Some(slot) = self.editable_type(id) {
                                *slot = ty;
                            }
                        }
                    }
                    None => {
                        let message = match self.stage {
                            Stage::Geometry => "array size cannot be determined without an input primitive layout:",
                            _ => "array size cannot be determined without an output vertices layout:",
                        };
                        self.report(DiagnosticKind::IoArraySize, first_use.unwrap_or(loc))
                            .message(message)
                            .token(name.as_str())
                            .emit();
                    }
                }
            }
            self.io_arrays[index].state = IoArrayState::Locked;
            tracing::debug!(name = %name, "io array locked");
        }
    }
}
