use glint_core::Stage;

use crate::test_utils::{Shader, field, float, vec};
use crate::types::{
    ArraySizes, BasicType, Field, LayoutPacking, PublicType, Qualifier, Storage, Type,
};

fn block_type(storage: Storage, packing: Option<LayoutPacking>) -> PublicType {
    let mut public_type = PublicType::new(Default::default());
    public_type.qualifier.storage = storage;
    public_type.qualifier.layout.packing = packing;
    public_type
}

fn member_offsets(s: &Shader, instance: &str) -> Vec<Option<u32>> {
    let found = s.ctx.symbols().lookup(instance).expect("instance declared");
    let ty = s.ctx.symbols().variable_type(found.id).expect("block variable");
    ty.fields()
        .iter()
        .map(|f| f.ty.qualifier.layout.offset)
        .collect()
}

#[test]
fn std140_offsets_follow_vec4_rules() {
    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::Uniform, Some(LayoutPacking::Std140));
    let members = vec![
        field("a", float()),
        field("b", vec(3)),
        field("c", float()),
        field("d", vec(4)),
    ];
    s.block("Params", &ty, members, Some("params"));

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(
        member_offsets(&s, "params"),
        vec![Some(0), Some(16), Some(28), Some(32)]
    );
}

#[test]
fn std430_packs_scalar_arrays_tightly() {
    let members = || {
        vec![
            field("f", float().with_array(ArraySizes::sized(2))),
            field("v", vec(2)),
        ]
    };

    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::Buffer, Some(LayoutPacking::Std430));
    s.block("Tight", &ty, members(), Some("tight"));
    let ty = block_type(Storage::Buffer, Some(LayoutPacking::Std140));
    s.block("Loose", &ty, members(), Some("loose"));

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(member_offsets(&s, "tight"), vec![Some(0), Some(8)]);
    assert_eq!(member_offsets(&s, "loose"), vec![Some(0), Some(32)]);
}

#[test]
fn shared_packing_assigns_no_offsets() {
    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::Uniform, None);
    s.block("Defaults", &ty, vec![field("a", float())], Some("defaults"));

    assert_eq!(member_offsets(&s, "defaults"), vec![None]);
}

#[test]
fn explicit_offset_cannot_overlap() {
    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::Uniform, Some(LayoutPacking::Std140));
    let mut b = field("b", float());
    b.ty.qualifier.layout.offset = Some(0);
    s.block("Params", &ty, vec![field("a", float()), b], Some("params"));

    let text = s.errors();
    assert!(text.contains("'offset' : cannot lie in previous members b"), "{text}");
}

#[test]
fn input_block_in_vertex_shader() {
    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::In, None);
    let declared = s.block("Inputs", &ty, vec![field("a", float())], None);

    assert!(declared.is_none());
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'Inputs' : cannot declare an input block in a vertex shader");
}

#[test]
fn anonymous_member_clashes_with_global() {
    let mut s = Shader::new(Stage::Vertex);
    s.declare("a", float());
    let ty = block_type(Storage::Uniform, None);
    s.block("Params", &ty, vec![field("a", float())], None);

    let text = s.errors();
    assert!(
        text.contains("nameless block contains a member that already has a name at global scope"),
        "{text}"
    );
}

#[test]
fn instance_name_redefinition() {
    let mut s = Shader::new(Stage::Vertex);
    s.declare("params", float());
    let ty = block_type(Storage::Uniform, None);
    s.block("Params", &ty, vec![field("a", float())], Some("params"));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'params' : redefinition");
}

#[test]
fn per_vertex_redeclaration_trims_members() {
    let mut s = Shader::new(Stage::Vertex);
    let ty = block_type(Storage::Out, None);
    let trimmed = || vec![field("gl_Position", vec(4))];
    assert!(s.block("gl_PerVertex", &ty, trimmed(), None).is_some());
    assert!(s.ctx.symbols().lookup("gl_PointSize").is_none());

    // Repeating the same redeclaration is accepted.
    assert!(s.block("gl_PerVertex", &ty, trimmed(), None).is_some());
    s.main(|s| Some(s.var("gl_Position")));

    let output = s.finish();
    assert!(!output.has_errors(), "{}", output.diagnostics.render());
}

#[test]
fn per_vertex_redeclared_after_use() {
    let mut s = Shader::new(Stage::Vertex);
    s.main(|s| Some(s.var("gl_Position")));
    let ty = block_type(Storage::Out, None);
    s.block("gl_PerVertex", &ty, vec![field("gl_Position", vec(4))], None);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:4: 'gl_PerVertex' : can only redeclare a built-in block once, and before any use");
}

fn locations(members: &[Field]) -> Vec<Option<u32>> {
    members.iter().map(|m| m.ty.qualifier.layout.location).collect()
}

#[test]
fn block_location_spreads_over_members() {
    let mut s = Shader::new(Stage::Vertex);
    let loc = s.loc();
    let mut qualifier = Qualifier { storage: Storage::Out, ..Default::default() };
    qualifier.layout.location = Some(2);
    let mut members = vec![
        field("color", vec(4)),
        field("basis", Type::matrix(BasicType::Float, 2, 2)),
        field("weight", float()),
    ];

    s.ctx.fix_block_locations(loc, &mut qualifier, &mut members);
    assert_eq!(qualifier.layout.location, None);
    assert_eq!(locations(&members), vec![Some(2), Some(3), Some(5)]);

    // Once every member is placed, assigning again changes nothing.
    s.ctx.fix_block_locations(loc, &mut qualifier, &mut members);
    assert_eq!(locations(&members), vec![Some(2), Some(3), Some(5)]);
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
}

#[test]
fn member_locations_must_be_all_or_nothing() {
    let mut s = Shader::new(Stage::Vertex);
    let loc = s.loc();
    let mut qualifier = Qualifier { storage: Storage::Out, ..Default::default() };
    let mut placed = field("a", vec(4));
    placed.ty.qualifier.layout.location = Some(1);
    let mut members = vec![placed, field("b", vec(4))];
    s.ctx.fix_block_locations(loc, &mut qualifier, &mut members);

    assert_eq!(locations(&members), vec![Some(1), None]);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'location' : either the block needs a location, or all members need a location, or no members have a location");
}

#[test]
fn xfb_offsets_follow_member_alignment() {
    let mut s = Shader::new(Stage::Vertex);
    let mut qualifier = Qualifier { storage: Storage::Out, ..Default::default() };
    qualifier.layout.xfb_buffer = Some(0);
    qualifier.layout.xfb_offset = Some(0);
    let mut members = vec![
        field("f", float()),
        field("d", Type::scalar(BasicType::Double)),
        field("v", vec(3)),
    ];
    s.ctx.fix_block_xfb_offsets(&mut qualifier, &mut members);

    let offsets: Vec<_> = members.iter().map(|m| m.ty.qualifier.layout.xfb_offset).collect();
    assert_eq!(offsets, vec![Some(0), Some(8), Some(16)]);
    assert_eq!(qualifier.layout.xfb_offset, None);
}

#[test]
fn xfb_offsets_need_a_buffer() {
    let mut s = Shader::new(Stage::Vertex);
    let mut qualifier = Qualifier { storage: Storage::Out, ..Default::default() };
    qualifier.layout.xfb_offset = Some(4);
    let mut members = vec![field("f", float())];
    s.ctx.fix_block_xfb_offsets(&mut qualifier, &mut members);

    assert_eq!(members[0].ty.qualifier.layout.xfb_offset, None);
    assert_eq!(qualifier.layout.xfb_offset, Some(4));
}

#[test]
fn uniform_offsets_are_stable_when_reassigned() {
    let mut s = Shader::new(Stage::Vertex);
    let loc = s.loc();
    let mut qualifier = Qualifier { storage: Storage::Uniform, ..Default::default() };
    qualifier.layout.packing = Some(LayoutPacking::Std140);
    let mut members = vec![
        field("a", vec(4)),
        field("b", vec(3)),
        field("c", float()),
        field("d", vec(2)),
        field("e", vec(4)),
    ];
    let offsets = |members: &[Field]| -> Vec<Option<u32>> {
        members.iter().map(|m| m.ty.qualifier.layout.offset).collect()
    };
    let expected = [0, 16, 28, 32, 48].map(Some).to_vec();

    s.ctx.fix_block_uniform_offsets(loc, &qualifier, &mut members);
    assert_eq!(offsets(&members), expected);
    s.ctx.fix_block_uniform_offsets(loc, &qualifier, &mut members);
    assert_eq!(offsets(&members), expected);
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
}
