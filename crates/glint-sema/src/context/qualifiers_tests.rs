use glint_core::{Profile, Stage};

use crate::test_utils::{Shader, field, float, int, public, vec};
use crate::types::{LayoutGeometry, LayoutPacking, Precision, PublicType, Qualifier, Storage};

fn qualifier(storage: Storage) -> Qualifier {
    Qualifier::new(storage)
}

fn standalone(s: &mut Shader, storage: Storage, edit: impl FnOnce(&mut PublicType)) {
    let loc = s.loc();
    let mut public_type = PublicType::new(loc);
    public_type.qualifier.storage = storage;
    edit(&mut public_type);
    s.ctx.update_standalone_qualifier_defaults(loc, &public_type);
}

#[test]
fn in_and_out_merge_to_inout() {
    let mut s = Shader::new(Stage::Vertex);
    let mut dst = qualifier(Storage::In);
    let loc = s.loc();
    s.ctx.merge_qualifiers(loc, &mut dst, &qualifier(Storage::Out), false);
    assert_eq!(dst.storage, Storage::InOut);

    let mut dst = qualifier(Storage::Const);
    s.ctx.merge_qualifiers(loc, &mut dst, &qualifier(Storage::In), false);
    assert_eq!(dst.storage, Storage::ConstReadOnly);
    assert!(s.ctx.diagnostics().is_empty());
}

#[test]
fn too_many_storage_qualifiers() {
    let mut s = Shader::new(Stage::Vertex);
    let mut dst = qualifier(Storage::Uniform);
    let loc = s.loc();
    s.ctx.merge_qualifiers(loc, &mut dst, &qualifier(Storage::Buffer), false);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'uniform buffer' : too many storage qualifiers");
}

#[test]
fn repeated_precision_and_interpolation() {
    let mut s = Shader::new(Stage::Fragment);
    let mut dst = Qualifier {
        precision: Precision::High,
        flat: true,
        ..Qualifier::default()
    };
    let src = Qualifier {
        precision: Precision::Low,
        smooth: true,
        ..Qualifier::default()
    };
    let loc = s.loc();
    s.ctx.merge_qualifiers(loc, &mut dst, &src, false);
    assert_eq!(dst.precision, Precision::High);

    let loc = s.loc();
    s.ctx.merge_qualifiers(loc, &mut dst, &src, true);
    assert_eq!(dst.precision, Precision::Low);

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: 'lowp' : only one precision qualifier allowed
    ERROR: 0:1: only one interpolation qualifier allowed
    ERROR: 0:2: only one interpolation qualifier allowed
    ");
}

#[test]
fn es_fragment_float_needs_default_precision() {
    let mut s = Shader::version(Stage::Fragment, 300, Profile::Es);
    s.declare("x", float());
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'float' : type requires declaration of default precision qualifier");

    let mut s = Shader::version(Stage::Fragment, 300, Profile::Es);
    let loc = s.loc();
    s.ctx
        .set_default_precision(loc, &public(float()), Precision::Medium);
    s.declare("x", float());
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());

    let found = s.ctx.symbols().lookup("x").expect("declared");
    let ty = s.ctx.symbols().variable_type(found.id).expect("variable");
    assert_eq!(ty.qualifier.precision, Precision::Medium);
}

#[test]
fn default_precision_only_for_scalars_and_samplers() {
    let mut s = Shader::version(Stage::Fragment, 300, Profile::Es);
    let loc = s.loc();
    s.ctx.set_default_precision(loc, &public(vec(4)), Precision::High);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'vec4' : default precision statement only allowed for float, int, atomic_uint and sampler types");
}

#[test]
fn vertex_stage_has_highp_float_default() {
    let s = Shader::version(Stage::Vertex, 300, Profile::Es);
    assert_eq!(s.ctx.get_default_precision(&public(float())), Precision::High);
}

#[test]
fn integer_fragment_input_must_be_flat() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("i", int().with_storage(Storage::In));

    let mut flat = int().with_storage(Storage::In);
    flat.qualifier.flat = true;
    s.declare("j", flat);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'int' : must be qualified as flat in");
}

#[test]
fn invariant_only_on_outputs() {
    let mut s = Shader::new(Stage::Vertex);
    s.declare("g", float());
    s.declare("color", vec(4).with_storage(Storage::Out));
    let invariant = Qualifier {
        invariant: true,
        ..Qualifier::default()
    };
    let loc = s.loc();
    s.ctx
        .add_qualifier_to_existing_list(loc, &invariant, &["color", "g", "missing"]);

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:3: 'invariant' : can only apply to an output
    ERROR: 0:3: 'missing' : identifier not previously declared
    ");
}

#[test]
fn standalone_primitive_conflict() {
    let mut s = Shader::new(Stage::Geometry);
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Triangles));
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Triangles));
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.geometry = Some(LayoutGeometry::Points));

    assert_eq!(
        s.ctx.intermediate().layout().input_primitive,
        Some(LayoutGeometry::Triangles)
    );
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'input primitive' : cannot change previously set layout value");
}

#[test]
fn standalone_needs_matching_storage() {
    let mut s = Shader::new(Stage::Geometry);
    standalone(&mut s, Storage::In, |p| p.shader_qualifiers.vertices = Some(3));
    standalone(&mut s, Storage::Out, |p| p.shader_qualifiers.vertices = Some(1000));

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: 'max_vertices' : can only apply to 'out'
    ERROR: 0:2: 'max_vertices' : too large, must be less than gl_MaxPatchVertices or gl_MaxGeometryOutputVertices 1000
    ");
}

#[test]
fn standalone_location_is_not_a_default() {
    let mut s = Shader::new(Stage::Fragment);
    standalone(&mut s, Storage::In, |p| p.qualifier.layout.location = Some(1));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'location/component/index' : cannot declare a default, use a full declaration");
}

#[test]
fn uniform_packing_default_reaches_blocks() {
    let mut s = Shader::new(Stage::Vertex);
    standalone(&mut s, Storage::Uniform, |p| {
        p.qualifier.layout.packing = Some(LayoutPacking::Std140);
    });
    let mut ty = PublicType::new(Default::default());
    ty.qualifier.storage = Storage::Uniform;
    s.block("Params", &ty, vec![field("a", float()), field("b", vec(2))], Some("params"));

    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
    let found = s.ctx.symbols().lookup("params").expect("declared");
    let block = s.ctx.symbols().variable_type(found.id).expect("variable");
    assert_eq!(block.qualifier.layout.packing, Some(LayoutPacking::Std140));
    let offsets: Vec<_> = block
        .fields()
        .iter()
        .map(|f| f.ty.qualifier.layout.offset)
        .collect();
    assert_eq!(offsets, vec![Some(0), Some(8)]);
}
