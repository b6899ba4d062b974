use glint_core::{Profile, Stage};

use crate::test_utils::Shader;
use crate::types::{LayoutGeometry, LayoutMatrix, LayoutPacking, PublicType};

fn layout(s: &mut Shader, ids: &[&str]) -> PublicType {
    let mut public_type = PublicType::new(Default::default());
    for id in ids {
        let loc = s.loc();
        s.ctx.set_layout_qualifier(loc, &mut public_type, id);
    }
    public_type
}

fn layout_value(s: &mut Shader, id: &str, value: i32) -> PublicType {
    let mut public_type = PublicType::new(Default::default());
    let loc = s.loc();
    let node = s.int(value);
    s.ctx.set_layout_qualifier_value(loc, &mut public_type, id, &node);
    public_type
}

#[test]
fn identifiers_are_case_insensitive() {
    let mut s = Shader::new(Stage::Vertex);
    let public_type = layout(&mut s, &["STD140", "Row_Major"]);

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(public_type.qualifier.layout.packing, Some(LayoutPacking::Std140));
    assert_eq!(public_type.qualifier.layout.matrix, Some(LayoutMatrix::RowMajor));
}

#[test]
fn std430_needs_430() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    layout(&mut s, &["std430"]);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'std430' : not supported for this version or the enabled extensions");
}

#[test]
fn unknown_identifier() {
    let mut s = Shader::new(Stage::Vertex);
    layout(&mut s, &["bogus"]);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'bogus' : unrecognized layout identifier, or qualifier requires assignment (e.g., binding = 4)");
}

#[test]
fn primitive_is_stage_gated() {
    let mut s = Shader::new(Stage::Vertex);
    layout(&mut s, &["triangles"]);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'triangles' : not supported in this stage: vertex");

    let mut s = Shader::new(Stage::Geometry);
    let public_type = layout(&mut s, &["triangles_adjacency"]);
    assert!(!s.ctx.diagnostics().has_errors());
    assert_eq!(
        public_type.shader_qualifiers.geometry,
        Some(LayoutGeometry::TrianglesAdjacency)
    );
}

#[test]
fn depth_layout_only_in_fragment() {
    let mut s = Shader::new(Stage::Vertex);
    layout(&mut s, &["depth_greater"]);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'depth layout' : not supported in this stage: vertex");
}

#[test]
fn location_value() {
    let mut s = Shader::new(Stage::Fragment);
    let public_type = layout_value(&mut s, "location", 3);

    assert!(!s.ctx.diagnostics().has_errors());
    assert_eq!(public_type.qualifier.layout.location, Some(3));
}

#[test]
fn negative_value() {
    let mut s = Shader::new(Stage::Fragment);
    let public_type = layout_value(&mut s, "location", -1);

    assert_eq!(public_type.qualifier.layout.location, None);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'location' : cannot be negative");
}

#[test]
fn value_must_be_integer_constant() {
    let mut s = Shader::new(Stage::Fragment);
    let mut public_type = PublicType::new(Default::default());
    let loc = s.loc();
    let half = s.float(0.5);
    s.ctx.set_layout_qualifier_value(loc, &mut public_type, "binding", &half);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'binding' : must be a constant integer expression");
}

#[test]
fn component_and_align_bounds() {
    let mut s = Shader::new(Stage::Fragment);
    layout_value(&mut s, "component", 4);
    layout_value(&mut s, "align", 12);
    let ok = layout_value(&mut s, "align", 16);

    assert_eq!(ok.qualifier.layout.align, Some(16));
    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: 'component' : component is too large
    ERROR: 0:2: 'align' : must be a power of 2
    ");
}

#[test]
fn xfb_buffer_over_limit() {
    let mut s = Shader::new(Stage::Vertex);
    let max = s.ctx.resources().max_transform_feedback_buffers;
    let max = i32::try_from(max).expect("small limit");
    layout_value(&mut s, "xfb_buffer", max);

    let text = s.errors();
    assert!(text.contains("'xfb_buffer' : buffer is too large:"), "{text}");
}

#[test]
fn tess_vertices_and_compute_local_size() {
    let mut s = Shader::new(Stage::TessControl);
    let public_type = layout_value(&mut s, "vertices", 3);
    assert_eq!(public_type.shader_qualifiers.vertices, Some(3));
    assert!(!s.ctx.diagnostics().has_errors());

    let mut s = Shader::new(Stage::Compute);
    let public_type = layout_value(&mut s, "local_size_y", 8);
    assert_eq!(public_type.shader_qualifiers.local_size, [None, Some(8), None]);
    assert!(!s.ctx.diagnostics().has_errors());
}

#[test]
fn unknown_valued_identifier() {
    let mut s = Shader::new(Stage::Vertex);
    layout_value(&mut s, "depth", 1);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'depth' : there is no such layout identifier taking an assigned value");
}
