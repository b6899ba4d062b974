//! `layout(...)` identifiers as the grammar hands them over.

use glint_core::{ProfileMask, SourceLoc, StageMask};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::Node;
use crate::types::{
    LayoutDepth, LayoutGeometry, LayoutMatrix, LayoutPacking, PublicType, VertexOrder,
    VertexSpacing,
};

use super::ParseContext;

impl ParseContext {
    /// A layout identifier without a value, e.g. `std140` or `triangles`.
    pub fn set_layout_qualifier(&mut self, loc: SourceLoc, public_type: &mut PublicType, id: &str) {
        let id = id.to_ascii_lowercase();
        let layout = &mut public_type.qualifier.layout;
        let shader = &mut public_type.shader_qualifiers;

        match id.as_str() {
            "column_major" => layout.matrix = Some(LayoutMatrix::ColumnMajor),
            "row_major" => layout.matrix = Some(LayoutMatrix::RowMajor),
            "shared" => layout.packing = Some(LayoutPacking::Shared),
            "packed" => layout.packing = Some(LayoutPacking::Packed),
            "std140" => layout.packing = Some(LayoutPacking::Std140),
            "std430" => {
                layout.packing = Some(LayoutPacking::Std430);
                self.profile_requires(loc, ProfileMask::DESKTOP, 430, &[], "std430");
                self.profile_requires(loc, ProfileMask::ES, 310, &[], "std430");
            }
            "push_constant" => layout.push_constant = true,
            "equal_spacing" => shader.spacing = Some(VertexSpacing::Equal),
            "fractional_even_spacing" => shader.spacing = Some(VertexSpacing::FractionalEven),
            "fractional_odd_spacing" => shader.spacing = Some(VertexSpacing::FractionalOdd),
            "cw" => shader.order = Some(VertexOrder::Cw),
            "ccw" => shader.order = Some(VertexOrder::Ccw),
            "point_mode" => shader.point_mode = true,
            "early_fragment_tests" => {
                shader.early_fragment_tests = true;
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    420,
                    &["GL_ARB_shader_image_load_store"],
                    "early_fragment_tests",
                );
                self.profile_requires(loc, ProfileMask::ES, 310, &[], "early_fragment_tests");
            }
            "origin_upper_left" | "pixel_center_integer" => {
                self.require_profile(loc, ProfileMask::DESKTOP, id.as_str());
                self.require_stage(loc, StageMask::FRAGMENT, id.as_str());
                if id == "origin_upper_left" {
                    shader.origin_upper_left = true;
                } else {
                    shader.pixel_center_integer = true;
                }
            }
            "depth_any" | "depth_greater" | "depth_less" | "depth_unchanged" => {
                shader.depth = Some(match id.as_str() {
                    "depth_any" => LayoutDepth::Any,
                    "depth_greater" => LayoutDepth::Greater,
                    "depth_less" => LayoutDepth::Less,
                    _ => LayoutDepth::Unchanged,
                });
                self.require_profile(loc, ProfileMask::DESKTOP, "depth layout");
                self.require_stage(loc, StageMask::FRAGMENT, "depth layout");
            }
            other => match LayoutGeometry::from_id(other) {
                Some(geometry) => {
                    shader.geometry = Some(geometry);
                    self.require_stage(
                        loc,
                        StageMask::GEOMETRY | StageMask::TESS_EVALUATION,
                        other,
                    );
                }
                None => {
                    self.report(DiagnosticKind::Layout, loc)
                        .message(
                            "unrecognized layout identifier, or qualifier requires assignment (e.g., binding = 4)",
                        )
                        .token(other)
                        .emit();
                }
            },
        }
    }

    /// A layout identifier with a value, e.g. `location = 3`.
    pub fn set_layout_qualifier_value(
        &mut self,
        loc: SourceLoc,
        public_type: &mut PublicType,
        id: &str,
        node: &Node,
    ) {
        let id = id.to_ascii_lowercase();
        let value = match node.const_int() {
            Some(v) if node.ty.is_integer_scalar() => v,
            _ => {
                self.report(DiagnosticKind::Layout, loc)
                    .message("must be a constant integer expression")
                    .token(id.as_str())
                    .emit();
                return;
            }
        };
        let Ok(value) = u32::try_from(value) else {
            self.report(DiagnosticKind::Layout, loc)
                .message("cannot be negative")
                .token(id.as_str())
                .emit();
            return;
        };

        let layout = &mut public_type.qualifier.layout;
        let shader = &mut public_type.shader_qualifiers;

        match id.as_str() {
            "location" => layout.location = Some(value),
            "component" => {
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    440,
                    &["GL_ARB_enhanced_layouts"],
                    "component",
                );
                if value > 3 {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("component is too large")
                        .token("component")
                        .emit();
                    return;
                }
                layout.component = Some(value);
            }
            "index" => {
                self.require_profile(loc, ProfileMask::DESKTOP, "index layout qualifier on fragment output");
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    330,
                    &["GL_ARB_explicit_attrib_location"],
                    "index layout qualifier on fragment output",
                );
                if value > 1 {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("index must be 0 or 1")
                        .token("index")
                        .emit();
                    return;
                }
                layout.index = Some(value);
            }
            "binding" => {
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    420,
                    &["GL_ARB_shading_language_420pack"],
                    "binding",
                );
                self.profile_requires(loc, ProfileMask::ES, 310, &[], "binding");
                layout.binding = Some(value);
            }
            "set" => layout.set = Some(value),
            "offset" => {
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    420,
                    &["GL_ARB_enhanced_layouts", "GL_ARB_shader_atomic_counters"],
                    "offset",
                );
                self.profile_requires(loc, ProfileMask::ES, 310, &[], "offset");
                layout.offset = Some(value);
            }
            "align" => {
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    440,
                    &["GL_ARB_enhanced_layouts"],
                    "align",
                );
                if !value.is_power_of_two() {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("must be a power of 2")
                        .token("align")
                        .emit();
                    return;
                }
                layout.align = Some(value);
            }
            "xfb_buffer" => {
                let max = self.resources.max_transform_feedback_buffers;
                if value >= max {
                    self.report(DiagnosticKind::ResourceLimit, loc)
                        .message("buffer is too large:")
                        .token("xfb_buffer")
                        .extra(format!("internal max is {max}"))
                        .emit();
                    return;
                }
                layout.xfb_buffer = Some(value);
            }
            "xfb_stride" => layout.xfb_stride = Some(value),
            "xfb_offset" => layout.xfb_offset = Some(value),
            "stream" => {
                self.require_stage(loc, StageMask::GEOMETRY, "stream");
                layout.stream = Some(value);
            }
            "vertices" => {
                self.require_stage(loc, StageMask::TESS_CONTROL, "vertices");
                if value == 0 {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("must be greater than 0")
                        .token("vertices")
                        .emit();
                    return;
                }
                shader.vertices = Some(value);
            }
            "max_vertices" => {
                self.require_stage(loc, StageMask::GEOMETRY, "max_vertices");
                shader.vertices = Some(value);
            }
            "invocations" => {
                self.require_stage(loc, StageMask::GEOMETRY, "invocations");
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    400,
                    &["GL_ARB_gpu_shader5"],
                    "invocations",
                );
                if value == 0 {
                    self.report(DiagnosticKind::Layout, loc)
                        .message("must be at least 1")
                        .token("invocations")
                        .emit();
                    return;
                }
                shader.invocations = Some(value);
            }
            "local_size_x" | "local_size_y" | "local_size_z" => {
                let dim = match id.as_str() {
                    "local_size_x" => 0,
                    "local_size_y" => 1,
                    _ => 2,
                };
                self.require_stage(loc, StageMask::COMPUTE, id.as_str());
                self.profile_requires(
                    loc,
                    ProfileMask::DESKTOP,
                    430,
                    &["GL_ARB_compute_shader"],
                    id.as_str(),
                );
                self.profile_requires(loc, ProfileMask::ES, 310, &[], id.as_str());
                shader.local_size[dim] = Some(value);
            }
            other => {
                self.report(DiagnosticKind::Layout, loc)
                    .message("there is no such layout identifier taking an assigned value")
                    .token(other)
                    .emit();
            }
        }
    }
}
