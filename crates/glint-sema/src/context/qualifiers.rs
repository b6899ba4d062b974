//! Qualifier merging, defaults, precision and per-object layout checks.

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::symbols::SymbolId;
use crate::types::{
    BasicType, Layout, LayoutGeometry, LayoutPacking, Precision, PublicType, Qualifier,
    ShaderQualifiers, Storage, Type,
};

use super::{ParseContext, PrecisionSlot};

impl ParseContext {
    /// Map parameter-style storage written at global scope onto the pipe
    /// storage classes, then run the checks that apply to every global.
    pub fn global_qualifier_fix_check(&mut self, loc: SourceLoc, qualifier: &mut Qualifier) {
        match qualifier.storage {
            Storage::In => {
                self.profile_requires(loc, ProfileMask::NONE, 130, &[], "in for stage inputs");
                self.profile_requires(loc, ProfileMask::ES, 300, &[], "in for stage inputs");
                qualifier.storage = Storage::VaryingIn;
            }
            Storage::Out => {
                self.profile_requires(loc, ProfileMask::NONE, 130, &[], "out for stage outputs");
                self.profile_requires(loc, ProfileMask::ES, 300, &[], "out for stage outputs");
                qualifier.storage = Storage::VaryingOut;
            }
            Storage::InOut => {
                self.report(DiagnosticKind::Storage, loc)
                    .message("cannot use 'inout' at global scope")
                    .emit();
                qualifier.storage = Storage::VaryingIn;
            }
            Storage::Temporary => qualifier.storage = Storage::Global,
            _ => {}
        }
        self.invariant_check(loc, qualifier);
    }

    /// Stage-interface restrictions that depend on the declared type.
    pub fn global_qualifier_type_check(
        &mut self,
        loc: SourceLoc,
        qualifier: &Qualifier,
        public_type: &PublicType,
    ) {
        if !qualifier.storage.is_pipe_io() {
            return;
        }
        let input = qualifier.storage == Storage::VaryingIn;
        let ty = public_type.to_type();

        if public_type.basic == BasicType::Bool {
            self.report(DiagnosticKind::Storage, loc)
                .message("cannot be bool")
                .token(qualifier.storage.name())
                .emit();
        }
        if ty.contains_opaque() {
            self.report(DiagnosticKind::Storage, loc)
                .message("cannot be a sampler, image or atomic counter")
                .token(qualifier.storage.name())
                .emit();
        }

        if ty.basic.is_integer() || ty.contains_double() {
            let fragment_in = self.stage == Stage::Fragment && input;
            let vertex_out = self.stage == Stage::Vertex && !input && self.is_es();
            if (fragment_in || vertex_out) && !qualifier.flat {
                let message = if vertex_out {
                    "vertex outputs of integer type must be qualified as flat"
                } else {
                    "must be qualified as flat"
                };
                self.report(DiagnosticKind::Qualifier, loc)
                    .message(message)
                    .token(ty.basic_name())
                    .extra(qualifier.storage.name())
                    .emit();
            }
        }

        if qualifier.patch && qualifier.is_interpolation() {
            self.report(DiagnosticKind::Qualifier, loc)
                .message("cannot use interpolation qualifiers with patch")
                .emit();
        }

        match (self.stage, input) {
            (Stage::Vertex, true) => {
                if ty.is_struct() {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot be a structure or block")
                        .token("vertex input")
                        .emit();
                }
                if qualifier.is_interpolation() || qualifier.is_auxiliary() {
                    self.report(DiagnosticKind::Qualifier, loc)
                        .message("vertex input cannot be further qualified")
                        .emit();
                }
                if self.is_es() && ty.is_array() {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot be an array")
                        .token("vertex input")
                        .emit();
                }
            }
            (Stage::Fragment, false) => {
                if ty.is_struct() {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot be a structure or block")
                        .token("fragment output")
                        .emit();
                }
                if ty.matrix_cols > 0 {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("cannot be a matrix")
                        .token("fragment output")
                        .emit();
                }
                if qualifier.is_interpolation() || qualifier.is_auxiliary() {
                    self.report(DiagnosticKind::Qualifier, loc)
                        .message("can't use auxiliary or interpolation qualifier on a fragment output")
                        .emit();
                }
            }
            (Stage::Compute, _) => {
                self.report(DiagnosticKind::Storage, loc)
                    .message("global storage input/output qualifier cannot be used in a compute shader")
                    .token(qualifier.storage.name())
                    .emit();
            }
            _ => {}
        }
    }

    /// Fold `src` into `dst`, as when the grammar accumulates `flat in highp`.
    ///
    /// `force` lets precision in `src` override precision already in `dst`.
    pub fn merge_qualifiers(
        &mut self,
        loc: SourceLoc,
        dst: &mut Qualifier,
        src: &Qualifier,
        force: bool,
    ) {
        // storage
        let merged = match (dst.storage, src.storage) {
            (d, Storage::Temporary) => Some(d),
            (Storage::Temporary | Storage::Global, s) => Some(s),
            (Storage::In, Storage::Out) | (Storage::Out, Storage::In) => Some(Storage::InOut),
            (Storage::Const, Storage::In) | (Storage::In, Storage::Const) => {
                Some(Storage::ConstReadOnly)
            }
            _ => None,
        };
        match merged {
            Some(storage) => dst.storage = storage,
            None => {
                let both = format!("{} {}", dst.storage.name(), src.storage.name());
                self.report(DiagnosticKind::Qualifier, loc)
                    .message("too many storage qualifiers")
                    .token(both)
                    .emit();
            }
        }

        // precision
        if src.precision != Precision::None {
            if dst.precision == Precision::None || force {
                dst.precision = src.precision;
            } else {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message("only one precision qualifier allowed")
                    .token(src.precision.name())
                    .emit();
            }
        }

        let repeated = [
            (dst.is_interpolation() && src.is_interpolation(), "only one interpolation qualifier allowed"),
            (dst.is_auxiliary() && src.is_auxiliary(), "only one auxiliary qualifier allowed"),
            (dst.invariant && src.invariant, "only one invariant qualifier allowed"),
        ];
        for (bad, message) in repeated {
            if bad {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message(message)
                    .emit();
            }
        }

        dst.invariant |= src.invariant;
        dst.centroid |= src.centroid;
        dst.sample |= src.sample;
        dst.patch |= src.patch;
        dst.smooth |= src.smooth;
        dst.flat |= src.flat;
        dst.nopersp |= src.nopersp;
        dst.coherent |= src.coherent;
        dst.volatile |= src.volatile;
        dst.restrict |= src.restrict;
        dst.readonly |= src.readonly;
        dst.writeonly |= src.writeonly;
        dst.built_in |= src.built_in;

        Self::merge_object_layout_qualifiers(&mut dst.layout, &src.layout, false);
    }

    /// Overlay the layout attributes set in `src` onto `dst`.
    ///
    /// With `inherit_only`, only attributes a member or object inherits from
    /// an enclosing block or global default are copied.
    pub fn merge_object_layout_qualifiers(dst: &mut Layout, src: &Layout, inherit_only: bool) {
        dst.matrix = src.matrix.or(dst.matrix);
        dst.packing = src.packing.or(dst.packing);
        dst.stream = src.stream.or(dst.stream);
        dst.xfb_buffer = src.xfb_buffer.or(dst.xfb_buffer);
        dst.align = src.align.or(dst.align);

        if inherit_only {
            return;
        }
        dst.location = src.location.or(dst.location);
        dst.component = src.component.or(dst.component);
        dst.index = src.index.or(dst.index);
        dst.binding = src.binding.or(dst.binding);
        dst.set = src.set.or(dst.set);
        dst.offset = src.offset.or(dst.offset);
        dst.xfb_stride = src.xfb_stride.or(dst.xfb_stride);
        dst.xfb_offset = src.xfb_offset.or(dst.xfb_offset);
        dst.push_constant |= src.push_constant;
    }

    fn precision_slot(basic: BasicType, public_type: &PublicType) -> Option<PrecisionSlot> {
        match basic {
            BasicType::Float => Some(PrecisionSlot::Float),
            BasicType::Int | BasicType::Uint => Some(PrecisionSlot::Int),
            BasicType::AtomicUint => Some(PrecisionSlot::AtomicUint),
            BasicType::Sampler => Some(PrecisionSlot::Sampler(public_type.sampler)),
            _ => None,
        }
    }

    /// `precision mediump float;`
    pub fn set_default_precision(
        &mut self,
        loc: SourceLoc,
        public_type: &PublicType,
        precision: Precision,
    ) {
        let slot = if public_type.array_sizes.is_none()
            && public_type.structure.is_none()
            && (public_type.is_scalar() || public_type.basic == BasicType::Sampler)
        {
            Self::precision_slot(public_type.basic, public_type)
        } else {
            None
        };
        let Some(slot) = slot else {
            self.report(DiagnosticKind::Precision, loc)
                .message("default precision statement only allowed for float, int, atomic_uint and sampler types")
                .token(public_type.to_type().basic_name())
                .emit();
            return;
        };
        if public_type.basic == BasicType::AtomicUint && precision != Precision::High {
            self.report(DiagnosticKind::Precision, loc)
                .message("can only apply highp to atomic_uint")
                .token("precision")
                .emit();
            return;
        }
        tracing::trace!(?slot, ?precision, "default precision");
        self.default_precision.insert(slot, precision);
    }

    pub fn get_default_precision(&self, public_type: &PublicType) -> Precision {
        Self::precision_slot(public_type.basic, public_type)
            .and_then(|slot| self.default_precision.get(&slot).copied())
            .unwrap_or(Precision::None)
    }

    /// Fill in the default precision in ES and reject precision on types
    /// that cannot carry one.
    pub fn precision_qualifier_check(
        &mut self,
        loc: SourceLoc,
        public_type: &PublicType,
        qualifier: &mut Qualifier,
    ) {
        let takes_precision = matches!(
            public_type.basic,
            BasicType::Float
                | BasicType::Int
                | BasicType::Uint
                | BasicType::Sampler
                | BasicType::AtomicUint
        );
        if !takes_precision {
            if qualifier.precision != Precision::None {
                self.report(DiagnosticKind::Precision, loc)
                    .message("type cannot have precision qualifier")
                    .token(public_type.to_type().basic_name())
                    .emit();
                qualifier.precision = Precision::None;
            }
            return;
        }
        if !self.is_es() || qualifier.precision != Precision::None {
            return;
        }
        qualifier.precision = self.get_default_precision(public_type);
        if qualifier.precision == Precision::None && public_type.basic == BasicType::Float {
            self.report(DiagnosticKind::Precision, loc)
                .message("type requires declaration of default precision qualifier")
                .token("float")
                .emit();
            qualifier.precision = Precision::Medium;
        }
    }

    pub fn invariant_check(&mut self, loc: SourceLoc, qualifier: &Qualifier) {
        if !qualifier.invariant {
            return;
        }
        let pipe_out = qualifier.storage == Storage::VaryingOut;
        let pipe_in = qualifier.storage == Storage::VaryingIn;
        let modern = if self.is_es() {
            self.version >= 300
        } else {
            self.version >= 420
        };
        if modern {
            if !pipe_out {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message("can only apply to an output")
                    .token("invariant")
                    .emit();
            }
        } else if (self.stage == Stage::Vertex && pipe_in) || (!pipe_out && !pipe_in) {
            self.report(DiagnosticKind::Qualifier, loc)
                .message("can only apply to an output, or to an input in a non-vertex stage")
                .token("invariant")
                .emit();
        }
    }

    /// `invariant gl_Position;`
    pub fn add_qualifier_to_existing(
        &mut self,
        loc: SourceLoc,
        qualifier: &Qualifier,
        identifier: &str,
    ) {
        let Some(found) = self.symbols.lookup(identifier) else {
            self.report(DiagnosticKind::Undeclared, loc)
                .message("identifier not previously declared")
                .token(identifier)
                .emit();
            return;
        };
        if self.symbols.get(found.id).is_function() {
            self.report(DiagnosticKind::Qualifier, loc)
                .message("cannot add qualifier to function")
                .token(identifier)
                .emit();
            return;
        }
        let adds_other = !matches!(qualifier.storage, Storage::Temporary | Storage::Global)
            || qualifier.precision != Precision::None
            || qualifier.is_interpolation()
            || qualifier.is_auxiliary()
            || qualifier.is_memory()
            || qualifier.has_layout();
        if adds_other {
            self.report(DiagnosticKind::Qualifier, loc)
                .message(
                    "cannot add storage, auxiliary, memory, interpolation, layout, or precision qualifier to an existing variable",
                )
                .token(identifier)
                .emit();
            return;
        }
        if !qualifier.invariant {
            return;
        }

        let id = if found.built_in {
            self.make_editable(found.id)
        } else {
            found.id
        };
        let Some(ty) = self.editable_type(id) else {
            return;
        };
        ty.qualifier.invariant = true;
        let updated = ty.qualifier;
        self.invariant_check(loc, &updated);
    }

    pub fn add_qualifier_to_existing_list(
        &mut self,
        loc: SourceLoc,
        qualifier: &Qualifier,
        identifiers: &[&str],
    ) {
        for identifier in identifiers {
            self.add_qualifier_to_existing(loc, qualifier, identifier);
        }
    }

    /// Resolve the storage of a function parameter from what was written.
    pub fn param_check_fix(&mut self, loc: SourceLoc, qualifier: &Qualifier, ty: &mut Type) {
        let storage = match qualifier.storage {
            Storage::Temporary | Storage::In => Storage::In,
            Storage::Const | Storage::ConstReadOnly => Storage::ConstReadOnly,
            Storage::Out => Storage::Out,
            Storage::InOut => Storage::InOut,
            other => {
                self.report(DiagnosticKind::Storage, loc)
                    .message("storage qualifier not allowed on function parameter")
                    .token(other.name())
                    .emit();
                Storage::In
            }
        };
        ty.qualifier.storage = storage;

        let problems = [
            (qualifier.invariant, "invariant"),
            (qualifier.is_interpolation(), "interpolation"),
            (qualifier.is_auxiliary(), "auxiliary"),
            (qualifier.has_layout(), "layout"),
        ];
        for (present, what) in problems {
            if present {
                self.report(DiagnosticKind::Qualifier, loc)
                    .message(format!("cannot use {what} qualifiers on a function parameter"))
                    .emit();
            }
        }

        if qualifier.precision != Precision::None {
            ty.qualifier.precision = qualifier.precision;
        }
        ty.qualifier.coherent |= qualifier.coherent;
        ty.qualifier.volatile |= qualifier.volatile;
        ty.qualifier.restrict |= qualifier.restrict;
        ty.qualifier.readonly |= qualifier.readonly;
        ty.qualifier.writeonly |= qualifier.writeonly;
    }

    pub fn parameter_type_check(&mut self, loc: SourceLoc, storage: Storage, ty: &Type) {
        if matches!(storage, Storage::Out | Storage::InOut) && ty.contains_opaque() {
            self.report(DiagnosticKind::Storage, loc)
                .message("samplers and atomic_uints cannot be output parameters")
                .token(ty.basic_name())
                .emit();
        }
    }

    /// Apply the global `layout(...) uniform/buffer/in/out;` defaults to a
    /// qualifier, keeping everything it sets explicitly.
    pub fn inherit_global_defaults(&self, qualifier: &mut Qualifier) {
        let defaults = match qualifier.storage {
            Storage::Uniform => &self.global_uniform_defaults,
            Storage::Buffer => &self.global_buffer_defaults,
            Storage::VaryingIn => &self.global_input_defaults,
            Storage::VaryingOut => &self.global_output_defaults,
            _ => return,
        };
        let mut layout = defaults.layout;
        Self::merge_object_layout_qualifiers(&mut layout, &qualifier.layout, false);
        qualifier.layout = layout;
    }

    /// Shader-level layout attributes belong on a standalone `layout(...) in/out;`.
    pub fn check_no_shader_layouts(&mut self, loc: SourceLoc, shader: &ShaderQualifiers) {
        let mut set = Vec::new();
        if let Some(geometry) = shader.geometry {
            set.push(geometry.name());
        }
        if shader.invocations.is_some() {
            set.push("invocations");
        }
        if shader.vertices.is_some() {
            set.push(match self.stage {
                Stage::TessControl => "vertices",
                _ => "max_vertices",
            });
        }
        if shader.spacing.is_some() {
            set.push("vertex spacing");
        }
        if shader.order.is_some() {
            set.push("vertex order");
        }
        if shader.point_mode {
            set.push("point_mode");
        }
        if shader.local_size.iter().any(Option::is_some) {
            set.push("local_size");
        }
        if shader.early_fragment_tests {
            set.push("early_fragment_tests");
        }
        for name in set {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only apply to a standalone qualifier")
                .token(name)
                .emit();
        }
    }

    /// `layout(...) uniform;`, `layout(triangles) in;` and friends.
    pub fn update_standalone_qualifier_defaults(&mut self, loc: SourceLoc, public_type: &PublicType) {
        let qualifier = public_type.qualifier;
        let shader = public_type.shader_qualifiers;
        let storage = match qualifier.storage {
            Storage::In => Storage::VaryingIn,
            Storage::Out => Storage::VaryingOut,
            other => other,
        };

        if shader.vertices.is_some() {
            self.standalone_vertices(loc, storage, shader.vertices);
        }
        if let Some(invocations) = shader.invocations {
            if storage != Storage::VaryingIn {
                self.standalone_error(loc, "invocations", "in");
            } else if invocations > self.resources.max_geometry_shader_invocations {
                self.report(DiagnosticKind::ResourceLimit, loc)
                    .message("too many invocations")
                    .token("invocations")
                    .emit();
            } else if !self.ast.set_invocations(invocations) {
                self.standalone_conflict(loc, "invocations");
            }
        }
        if let Some(geometry) = shader.geometry {
            self.standalone_geometry(loc, storage, geometry);
        }
        if let Some(spacing) = shader.spacing {
            if storage != Storage::VaryingIn {
                self.standalone_error(loc, "vertex spacing", "in");
            } else if !self.ast.set_vertex_spacing(spacing) {
                self.standalone_conflict(loc, "vertex spacing");
            }
        }
        if let Some(order) = shader.order {
            if storage != Storage::VaryingIn {
                self.standalone_error(loc, "vertex order", "in");
            } else if !self.ast.set_vertex_order(order) {
                self.standalone_conflict(loc, "vertex order");
            }
        }
        if shader.point_mode {
            if storage == Storage::VaryingIn {
                self.ast.set_point_mode();
            } else {
                self.standalone_error(loc, "point_mode", "in");
            }
        }
        self.standalone_local_size(loc, storage, &shader.local_size);
        if shader.early_fragment_tests {
            if storage == Storage::VaryingIn {
                self.ast.set_early_fragment_tests();
            } else {
                self.standalone_error(loc, "early_fragment_tests", "in");
            }
        }

        let layout = qualifier.layout;
        if layout.location.is_some() || layout.component.is_some() || layout.index.is_some() {
            self.report(DiagnosticKind::Layout, loc)
                .message("cannot declare a default, use a full declaration")
                .token("location/component/index")
                .emit();
        }
        if layout.offset.is_some() || layout.xfb_offset.is_some() {
            self.report(DiagnosticKind::Layout, loc)
                .message("cannot declare a default, use a full declaration")
                .token("offset")
                .emit();
        }
        if layout.binding.is_some() && storage != Storage::Uniform {
            self.report(DiagnosticKind::Layout, loc)
                .message("cannot declare a default, include a type or full declaration")
                .token("binding")
                .emit();
        }

        match storage {
            Storage::Uniform => {
                if layout.matrix.is_some() || layout.packing.is_some() {
                    Self::merge_object_layout_qualifiers(
                        &mut self.global_uniform_defaults.layout,
                        &layout,
                        true,
                    );
                }
            }
            Storage::Buffer => {
                Self::merge_object_layout_qualifiers(
                    &mut self.global_buffer_defaults.layout,
                    &layout,
                    true,
                );
            }
            Storage::VaryingIn => {
                Self::merge_object_layout_qualifiers(
                    &mut self.global_input_defaults.layout,
                    &layout,
                    true,
                );
            }
            Storage::VaryingOut => {
                if let Some(stream) = layout.stream
                    && self.stage != Stage::Geometry
                {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("can only be used in a geometry shader")
                        .token("stream")
                        .extra(stream.to_string())
                        .emit();
                }
                if let (Some(buffer), Some(stride)) = (layout.xfb_buffer, layout.xfb_stride)
                    && !self.ast.set_xfb_buffer_stride(buffer, stride)
                {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("all stride settings must match for xfb buffer")
                        .token("xfb_stride")
                        .extra(buffer.to_string())
                        .emit();
                }
                Self::merge_object_layout_qualifiers(
                    &mut self.global_output_defaults.layout,
                    &layout,
                    true,
                );
            }
            _ => {
                self.report(DiagnosticKind::Layout, loc)
                    .message("standalone qualifier requires 'uniform', 'buffer', 'in', or 'out' storage qualification")
                    .emit();
            }
        }
    }

    fn standalone_error(&mut self, loc: SourceLoc, feature: &str, storage: &str) {
        self.report(DiagnosticKind::Layout, loc)
            .message(format!("can only apply to '{storage}'"))
            .token(feature)
            .emit();
    }

    fn standalone_conflict(&mut self, loc: SourceLoc, feature: &str) {
        self.report(DiagnosticKind::Layout, loc)
            .message("cannot change previously set layout value")
            .token(feature)
            .emit();
    }

    fn standalone_vertices(&mut self, loc: SourceLoc, storage: Storage, vertices: Option<u32>) {
        let Some(count) = vertices else {
            return;
        };
        let (feature, limit) = match self.stage {
            Stage::TessControl => ("vertices", self.resources.max_patch_vertices),
            _ => ("max_vertices", self.resources.max_geometry_output_vertices),
        };
        if storage != Storage::VaryingOut {
            self.standalone_error(loc, feature, "out");
            return;
        }
        if count > limit {
            self.report(DiagnosticKind::ResourceLimit, loc)
                .message("too large, must be less than gl_MaxPatchVertices or gl_MaxGeometryOutputVertices")
                .token(feature)
                .extra(count.to_string())
                .emit();
            return;
        }
        if !self.ast.set_vertices(count) {
            self.standalone_conflict(loc, feature);
            return;
        }
        if self.stage == Stage::TessControl {
            self.check_io_arrays_consistency(loc, false);
        }
    }

    fn standalone_geometry(&mut self, loc: SourceLoc, storage: Storage, geometry: LayoutGeometry) {
        use LayoutGeometry::*;
        match storage {
            Storage::VaryingIn => {
                let valid = match self.stage {
                    Stage::Geometry => matches!(
                        geometry,
                        Points | Lines | LinesAdjacency | Triangles | TrianglesAdjacency
                    ),
                    Stage::TessEvaluation => matches!(geometry, Triangles | Quads | Isolines),
                    _ => false,
                };
                if !valid {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("cannot apply to input")
                        .token(geometry.name())
                        .emit();
                    return;
                }
                if !self.ast.set_input_primitive(geometry) {
                    self.standalone_conflict(loc, "input primitive");
                    return;
                }
                if self.stage == Stage::Geometry {
                    self.check_io_arrays_consistency(loc, false);
                }
            }
            Storage::VaryingOut => {
                let valid = self.stage == Stage::Geometry
                    && matches!(geometry, Points | LineStrip | TriangleStrip);
                if !valid {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("cannot apply to 'out'")
                        .token(geometry.name())
                        .emit();
                    return;
                }
                if !self.ast.set_output_primitive(geometry) {
                    self.standalone_conflict(loc, "output primitive");
                }
            }
            _ => self.standalone_error(loc, geometry.name(), "in' or 'out"),
        }
    }

    fn standalone_local_size(&mut self, loc: SourceLoc, storage: Storage, sizes: &[Option<u32>; 3]) {
        const NAMES: [&str; 3] = ["local_size_x", "local_size_y", "local_size_z"];
        let limits = [
            self.resources.max_compute_work_group_size_x,
            self.resources.max_compute_work_group_size_y,
            self.resources.max_compute_work_group_size_z,
        ];
        for (dim, size) in sizes.iter().enumerate() {
            let Some(size) = *size else {
                continue;
            };
            if storage != Storage::VaryingIn {
                self.standalone_error(loc, NAMES[dim], "in");
                continue;
            }
            if size == 0 || size > limits[dim] {
                self.report(DiagnosticKind::ResourceLimit, loc)
                    .message("too large; see gl_MaxComputeWorkGroupSize")
                    .token(NAMES[dim])
                    .extra(size.to_string())
                    .emit();
                continue;
            }
            if !self.ast.set_local_size(dim, size) {
                self.standalone_conflict(loc, NAMES[dim]);
            }
        }
    }

    /// Object layout attributes must fit the storage they are applied to.
    pub fn layout_qualifier_check(&mut self, loc: SourceLoc, qualifier: &Qualifier) {
        let layout = qualifier.layout;
        let storage = qualifier.storage;

        if layout.location.is_some() {
            match storage {
                Storage::VaryingIn => {
                    let feature = "location qualifier on input";
                    if self.stage == Stage::Vertex {
                        self.profile_requires(loc, ProfileMask::ES, 300, &[], feature);
                        self.profile_requires(
                            loc,
                            ProfileMask::DESKTOP,
                            330,
                            &["GL_ARB_explicit_attrib_location", "GL_ARB_separate_shader_objects"],
                            feature,
                        );
                    } else {
                        self.profile_requires(loc, ProfileMask::ES, 310, &[], feature);
                        self.profile_requires(
                            loc,
                            ProfileMask::DESKTOP,
                            410,
                            &["GL_ARB_separate_shader_objects"],
                            feature,
                        );
                    }
                }
                Storage::VaryingOut => {
                    let feature = "location qualifier on output";
                    if self.stage == Stage::Fragment {
                        self.profile_requires(loc, ProfileMask::ES, 300, &[], feature);
                        self.profile_requires(
                            loc,
                            ProfileMask::DESKTOP,
                            330,
                            &["GL_ARB_explicit_attrib_location", "GL_ARB_separate_shader_objects"],
                            feature,
                        );
                    } else {
                        self.profile_requires(loc, ProfileMask::ES, 310, &[], feature);
                        self.profile_requires(
                            loc,
                            ProfileMask::DESKTOP,
                            410,
                            &["GL_ARB_separate_shader_objects"],
                            feature,
                        );
                    }
                }
                Storage::Uniform | Storage::Buffer => {
                    self.profile_requires(
                        loc,
                        ProfileMask::DESKTOP,
                        430,
                        &["GL_ARB_explicit_uniform_location"],
                        "location qualifier on uniform or buffer",
                    );
                }
                _ => {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("can only apply to uniform, buffer, in, or out storage qualifiers")
                        .token("location")
                        .emit();
                }
            }
        }

        if layout.component.is_some() && layout.location.is_none() {
            self.report(DiagnosticKind::Layout, loc)
                .message("must specify 'location' to use 'component'")
                .token("component")
                .emit();
        }
        if layout.index.is_some()
            && !(self.stage == Stage::Fragment && storage == Storage::VaryingOut)
        {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only be used on a fragment output")
                .token("index")
                .emit();
        }
        if layout.binding.is_some() && !storage.is_uniform_or_buffer() {
            self.report(DiagnosticKind::Layout, loc)
                .message("requires uniform or buffer storage qualifier")
                .token("binding")
                .emit();
        }
        if (layout.matrix.is_some() || layout.packing.is_some())
            && !storage.is_uniform_or_buffer()
        {
            self.report(DiagnosticKind::Layout, loc)
                .message("matrix or packing qualifiers can only be used on a uniform or buffer")
                .emit();
        }
        if layout.packing == Some(LayoutPacking::Std430) && storage != Storage::Buffer {
            self.report(DiagnosticKind::Layout, loc)
                .message("requires the 'buffer' storage qualifier")
                .token("std430")
                .emit();
        }
        if layout.has_xfb() && storage != Storage::VaryingOut {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only be used on an output")
                .token("xfb layout qualifier")
                .emit();
        }
        if layout.stream.is_some()
            && !(self.stage == Stage::Geometry && storage == Storage::VaryingOut)
        {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only be used on a geometry shader output")
                .token("stream")
                .emit();
        }
        if layout.push_constant && storage != Storage::Uniform {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only be used with a uniform")
                .token("push_constant")
                .emit();
        }
    }

    /// Layout attributes that depend on the type of the object.
    pub fn layout_type_check(&mut self, loc: SourceLoc, ty: &Type) {
        let layout = ty.qualifier.layout;

        if layout.location.is_some() && ty.is_opaque() {
            self.report(DiagnosticKind::Layout, loc)
                .message("location is not allowed on an opaque type")
                .token(ty.basic_name())
                .emit();
        }

        if let Some(binding) = layout.binding {
            let elements = ty.outer_array_size().unwrap_or(1);
            match ty.basic {
                BasicType::Sampler => {
                    if binding + elements > self.resources.max_combined_texture_image_units {
                        self.report(DiagnosticKind::ResourceLimit, loc)
                            .message("sampler binding not less than gl_MaxCombinedTextureImageUnits")
                            .token("binding")
                            .extra(if ty.is_array() { "(using array)" } else { "" })
                            .emit();
                    }
                }
                BasicType::AtomicUint => {
                    if binding >= self.resources.max_atomic_counter_bindings {
                        self.report(DiagnosticKind::ResourceLimit, loc)
                            .message("atomic_uint binding is too large; see gl_MaxAtomicCounterBindings")
                            .token("binding")
                            .emit();
                    }
                }
                BasicType::Block => {}
                _ => {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("requires block, or sampler/image, or atomic-counter type")
                        .token("binding")
                        .emit();
                }
            }
        }

        if layout.offset.is_some() && ty.basic != BasicType::AtomicUint {
            self.report(DiagnosticKind::Layout, loc)
                .message("only applies to block members or atomic_uint")
                .token("offset")
                .emit();
        }

        if let Some(offset) = layout.xfb_offset {
            let align = if ty.contains_double() { 8 } else { 4 };
            if offset % align != 0 {
                self.report(DiagnosticKind::Layout, loc)
                    .message(format!("must be a multiple of size of first component ({align})"))
                    .token("xfb_offset")
                    .emit();
            }
        }

        if self.stage == Stage::Fragment
            && ty.storage() == Storage::VaryingOut
            && let Some(location) = layout.location
        {
            let slots = ty.outer_array_size().unwrap_or(1);
            if location + slots > self.resources.max_draw_buffers {
                self.report(DiagnosticKind::ResourceLimit, loc)
                    .message("too large for fragment output")
                    .token("location")
                    .extra(location.to_string())
                    .emit();
            }
        }
    }

    /// Checks on a declared object, run after its type is final.
    pub fn layout_object_check(&mut self, loc: SourceLoc, ty: &Type) {
        let qualifier = ty.qualifier;
        self.layout_type_check(loc, ty);

        if qualifier.storage == Storage::Uniform
            && qualifier.layout.packing.is_some()
            && ty.basic != BasicType::Block
        {
            self.report(DiagnosticKind::Layout, loc)
                .message("can only be used on a block")
                .token(qualifier.layout.packing.map_or("", LayoutPacking::name))
                .emit();
        }
        if qualifier.storage == Storage::VaryingOut
            && let (Some(buffer), Some(stride)) =
                (qualifier.layout.xfb_buffer, qualifier.layout.xfb_stride)
            && !self.ast.set_xfb_buffer_stride(buffer, stride)
        {
            self.report(DiagnosticKind::Layout, loc)
                .message("all stride settings must match for xfb buffer")
                .token("xfb_stride")
                .extra(buffer.to_string())
                .emit();
        }
        if qualifier.layout.xfb_offset.is_some() && qualifier.layout.xfb_buffer.is_none() {
            self.report(DiagnosticKind::Layout, loc)
                .message("xfb_offset requires an xfb_buffer")
                .token("xfb_offset")
                .emit();
        }
    }

    /// Assign the atomic counter offset of `ty` and advance the binding's
    /// next free offset.
    pub fn fix_offset(&mut self, loc: SourceLoc, ty: &mut Type) {
        if ty.basic != BasicType::AtomicUint {
            return;
        }
        let Some(binding) = ty.qualifier.layout.binding else {
            self.report(DiagnosticKind::Layout, loc)
                .message("layout(binding=X) is required")
                .token("atomic_uint")
                .emit();
            return;
        };
        let next = self.atomic_uint_offsets.get(&binding).copied().unwrap_or(0);
        let offset = match ty.qualifier.layout.offset {
            Some(offset) => {
                if offset % 4 != 0 {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("atomic counters offset should align based on 4")
                        .token("offset")
                        .extra(offset.to_string())
                        .emit();
                }
                if offset < next {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("atomic counters sharing the same offset")
                        .token("offset")
                        .extra(offset.to_string())
                        .emit();
                }
                offset
            }
            None => next,
        };
        ty.qualifier.layout.offset = Some(offset);
        let count = ty.array_sizes.as_ref().and_then(|a| a.cumulative_size()).unwrap_or(1);
        self.atomic_uint_offsets.insert(binding, offset + 4 * count);
        tracing::trace!(binding, offset, "atomic counter offset");
    }

    /// Mutable type of a user variable, or of the field an anonymous block
    /// member names.
    pub(crate) fn editable_type(&mut self, id: SymbolId) -> Option<&mut Type> {
        let member = self.symbols.get(id).as_member();
        match member {
            Some((block, index)) => self.editable_field_type(block, index),
            None => self
                .symbols
                .get_mut(id)?
                .as_variable_mut()
                .map(|var| &mut var.ty),
        }
    }
}
