use std::sync::Arc;

use glint_core::SourceLoc;

use super::size::{location_size, memory_layout, xfb_size};
use super::*;

fn vec(n: u8) -> Type {
    Type::vector(BasicType::Float, n)
}

#[test]
fn type_names() {
    assert_eq!(Type::scalar(BasicType::Float).name(), "float");
    assert_eq!(Type::vector(BasicType::Int, 3).name(), "ivec3");
    assert_eq!(Type::matrix(BasicType::Float, 4, 4).name(), "mat4");
    assert_eq!(Type::matrix(BasicType::Double, 2, 3).name(), "dmat2x3");
    assert_eq!(
        Type::sampler(Sampler::combined(BasicType::Uint, SamplerDim::D2).arrayed()).name(),
        "usampler2DArray"
    );
    assert_eq!(Type::sampler(Sampler::pure(true)).name(), "samplerShadow");
    assert_eq!(vec(4).with_array(ArraySizes::implicit()).name(), "vec4[]");
}

#[test]
fn type_display_includes_qualifiers() {
    let ty = Type::scalar(BasicType::Int).with_storage(Storage::Const);
    insta::assert_snapshot!(ty.to_string(), @"const int");

    let mut q = Qualifier::new(Storage::VaryingIn);
    q.flat = true;
    q.precision = Precision::High;
    insta::assert_snapshot!(vec(2).with_qualifier(q).to_string(), @"flat in highp vec2");
}

#[test]
fn dereference_peels_one_level() {
    let mut sizes = ArraySizes::sized(3);
    sizes.add_inner(Some(2));
    let aoa = Type::matrix(BasicType::Float, 3, 2).with_array(sizes);

    let row = aoa.dereference();
    assert_eq!(row.name(), "mat3x2[2]");
    let mat = row.dereference();
    assert_eq!(mat.name(), "mat3x2");
    let column = mat.dereference();
    assert_eq!(column.name(), "vec2");
    assert_eq!(column.dereference().name(), "float");
}

#[test]
fn component_counts() {
    assert_eq!(Type::matrix(BasicType::Float, 3, 4).component_count(), 12);
    assert_eq!(vec(3).with_array(ArraySizes::sized(2)).component_count(), 6);

    let def = Arc::new(StructDef::new(
        "S",
        vec![
            Field::new("a", vec(3), SourceLoc::line(1)),
            Field::new("b", Type::scalar(BasicType::Int), SourceLoc::line(1)),
        ],
    ));
    assert_eq!(Type::structure(def, false).component_count(), 4);
}

#[test]
fn same_shape_ignores_qualifiers() {
    let a = vec(4).with_storage(Storage::Uniform);
    let b = vec(4).with_storage(Storage::Temporary);
    assert!(a.same_shape(&b));
    assert!(!a.same_shape(&vec(3)));
    assert!(!a.same_shape(&vec(4).with_array(ArraySizes::sized(1))));
}

#[test]
fn array_sizes_track_implicit_size() {
    let mut sizes = ArraySizes::implicit();
    assert!(sizes.is_outer_unsized());
    sizes.update_implicit_size(2);
    sizes.update_implicit_size(0);
    assert_eq!(sizes.implicit_size(), 3);

    sizes.set_outer_size(6);
    assert!(sizes.is_sized());
    assert_eq!(sizes.to_string(), "[6]");
}

#[test]
fn array_sizes_compatibility() {
    let mut a = ArraySizes::implicit();
    a.add_inner(Some(4));
    let mut b = ArraySizes::sized(3);
    b.add_inner(Some(4));
    let mut c = ArraySizes::sized(3);
    c.add_inner(Some(5));

    assert!(a.compatible_with(&b));
    assert!(!b.compatible_with(&c));
    assert_eq!(b.cumulative_size(), Some(12));
    assert_eq!(a.cumulative_size(), None);
}

#[test]
fn std140_layouts() {
    let std140 = |ty: &Type| memory_layout(ty, LayoutPacking::Std140, LayoutMatrix::ColumnMajor);

    let float = std140(&Type::scalar(BasicType::Float));
    assert_eq!((float.align, float.size), (4, 4));
    let v3 = std140(&vec(3));
    assert_eq!((v3.align, v3.size), (16, 12));
    let v2 = std140(&vec(2));
    assert_eq!((v2.align, v2.size), (8, 8));
    let arr = std140(&Type::scalar(BasicType::Float).with_array(ArraySizes::sized(4)));
    assert_eq!((arr.align, arr.size), (16, 64));
    let mat = std140(&Type::matrix(BasicType::Float, 3, 3));
    assert_eq!((mat.align, mat.size), (16, 48));
}

#[test]
fn std430_arrays_are_tight() {
    let arr = memory_layout(
        &Type::scalar(BasicType::Float).with_array(ArraySizes::sized(4)),
        LayoutPacking::Std430,
        LayoutMatrix::ColumnMajor,
    );
    assert_eq!((arr.align, arr.size), (4, 16));
}

#[test]
fn location_and_xfb_sizes() {
    assert_eq!(location_size(&vec(4)), 1);
    assert_eq!(location_size(&Type::vector(BasicType::Double, 4)), 2);
    assert_eq!(location_size(&Type::matrix(BasicType::Float, 4, 4)), 4);
    assert_eq!(location_size(&vec(2).with_array(ArraySizes::sized(3))), 3);

    assert_eq!(xfb_size(&vec(3)), 12);
    assert_eq!(xfb_size(&Type::vector(BasicType::Double, 2)), 16);
}

#[test]
fn shader_qualifiers_merge() {
    let mut dst = ShaderQualifiers {
        geometry: Some(LayoutGeometry::Triangles),
        ..Default::default()
    };
    let src = ShaderQualifiers {
        vertices: Some(6),
        ..Default::default()
    };
    dst.merge(&src);

    assert_eq!(dst.geometry, Some(LayoutGeometry::Triangles));
    assert_eq!(dst.vertices, Some(6));
    assert_eq!(LayoutGeometry::Triangles.input_vertex_count(), Some(3));
    assert_eq!(LayoutGeometry::TriangleStrip.input_vertex_count(), None);
}
