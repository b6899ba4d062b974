use glint_core::Stage;

use crate::test_utils::{Shader, field, int, vec};
use crate::types::{ArraySizes, LayoutGeometry, PublicType, Storage};

use super::IoArrayState;

fn standalone(s: &mut Shader, storage: Storage, edit: impl FnOnce(&mut PublicType)) {
    let loc = s.loc();
    let mut public_type = PublicType::new(loc);
    public_type.qualifier.storage = storage;
    edit(&mut public_type);
    s.ctx.update_standalone_qualifier_defaults(loc, &public_type);
}

fn outer_size(s: &Shader, name: &str) -> Option<u32> {
    let found = s.ctx.symbols().lookup(name)?;
    s.ctx.symbols().variable_type(found.id)?.outer_array_size()
}

#[test]
fn geometry_input_sized_by_later_primitive() {
    let mut s = Shader::new(Stage::Geometry);
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());
    s.main(|s| {
        let x = s.var("x");
        let loc = s.loc();
        let two = s.int(2);
        Some(s.ctx.handle_bracket_dereference(loc, x, two))
    });
    assert_eq!(outer_size(&s, "x"), None);

    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Triangles));
    assert_eq!(outer_size(&s, "x"), Some(3));

    let output = s.finish();
    assert!(!output.has_errors(), "{}", output.diagnostics.render());
    assert_eq!(output.io_arrays.len(), 1);
    assert_eq!(output.io_arrays[0].name, "x");
    assert_eq!(output.io_arrays[0].state, IoArrayState::Locked);
}

#[test]
fn max_vertices_does_not_size_geometry_inputs() {
    let mut s = Shader::new(Stage::Geometry);
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());
    standalone(&mut s, Storage::Out, |p| p.shader_qualifiers.vertices = Some(6));
    assert_eq!(outer_size(&s, "x"), None);
    assert_eq!(s.ctx.io_arrays[0].state, IoArrayState::Pending);

    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Triangles));
    assert_eq!(outer_size(&s, "x"), Some(3));
    s.empty_main();

    let output = s.finish();
    assert!(!output.has_errors(), "{}", output.diagnostics.render());
    assert!(output.io_arrays.iter().all(|e| e.state == IoArrayState::Locked));
}

#[test]
fn geometry_input_sized_at_first_use_when_layout_known() {
    let mut s = Shader::new(Stage::Geometry);
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Lines));
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());

    assert_eq!(outer_size(&s, "x"), Some(2));
    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
}

#[test]
fn index_beyond_primitive_vertex_count() {
    let mut s = Shader::new(Stage::Geometry);
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());
    s.main(|s| {
        let x = s.var("x");
        let loc = s.loc();
        let five = s.int(5);
        Some(s.ctx.handle_bracket_dereference(loc, x, five))
    });
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Triangles));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:6: 'input primitive' : array index out of range for the declared layout: x");
}

#[test]
fn unsized_without_layout_is_reported_at_the_end() {
    let mut s = Shader::new(Stage::Geometry);
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());
    s.empty_main();

    let output = s.finish();
    insta::assert_snapshot!(output.diagnostics.render(), @"ERROR: 0:4: 'x' : array size cannot be determined without an input primitive layout:");
    assert_eq!(output.io_arrays[0].state, IoArrayState::Locked);
}

#[test]
fn variable_index_needs_a_size() {
    let mut s = Shader::new(Stage::Geometry);
    s.declare_array("x", vec(4).with_storage(Storage::In), ArraySizes::implicit());
    s.main(|s| {
        s.declare("i", int());
        let x = s.var("x");
        let i = s.var("i");
        let loc = s.loc();
        Some(s.ctx.handle_bracket_dereference(loc, x, i))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:6: '[' : array must be sized by a redeclaration or layout qualifier before being indexed with a variable");
}

#[test]
fn tess_control_output_block_has_one_entry() {
    let mut s = Shader::new(Stage::TessControl);
    s.main(|s| {
        let first = s.var("gl_out");
        let _again = s.var("gl_out");
        Some(first)
    });
    assert_eq!(s.ctx.io_arrays.len(), 1);
    assert_eq!(s.ctx.io_arrays[0].state, IoArrayState::Pending);

    standalone(&mut s, Storage::Out, |p| p.shader_qualifiers.vertices = Some(4));
    assert_eq!(outer_size(&s, "gl_out"), Some(4));
    assert_eq!(s.ctx.io_arrays[0].state, IoArrayState::SizedFromLayout);

    let output = s.finish();
    assert!(!output.has_errors(), "{}", output.diagnostics.render());
    assert_eq!(output.io_arrays.len(), 1);
    assert_eq!(output.io_arrays[0].state, IoArrayState::Locked);
}

#[test]
fn repeated_output_block_redeclaration_has_one_entry() {
    let mut s = Shader::new(Stage::TessControl);
    for _ in 0..2 {
        let loc = s.loc();
        let mut public_type = PublicType::new(loc);
        public_type.qualifier.storage = Storage::Out;
        s.ctx.declare_block(
            loc,
            "gl_PerVertex",
            vec![field("gl_Position", vec(4))],
            &public_type,
            Some("gl_out"),
            Some(ArraySizes::implicit()),
        );
    }
    assert_eq!(s.ctx.io_arrays.len(), 1);

    standalone(&mut s, Storage::Out, |p| p.shader_qualifiers.vertices = Some(4));
    assert_eq!(outer_size(&s, "gl_out"), Some(4));
    s.empty_main();

    let output = s.finish();
    assert!(!output.has_errors(), "{}", output.diagnostics.render());
    assert_eq!(output.io_arrays.len(), 1);
    assert_eq!(output.io_arrays[0].name, "gl_out");
    assert_eq!(output.io_arrays[0].state, IoArrayState::Locked);
}

#[test]
fn tess_input_must_match_patch_size() {
    let mut s = Shader::new(Stage::TessControl);
    s.declare_array("y", vec(4).with_storage(Storage::In), ArraySizes::sized(3));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: '[]' : tessellation input array size must be gl_MaxPatchVertices or implicitly sized");
    assert_eq!(outer_size(&s, "y"), Some(32));
}
