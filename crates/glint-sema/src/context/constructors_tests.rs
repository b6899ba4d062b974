use glint_core::Stage;

use crate::intermediate::{ConstValue, ConstructOp, Node, Op};
use crate::test_utils::{Shader, field, float, int, public, vec};
use crate::types::{ArraySizes, BasicType, Sampler, SamplerDim, Type};

fn construct(s: &mut Shader, ty: Type, args: Vec<Node>) -> Node {
    let loc = s.loc();
    s.ctx.handle_constructor_call(loc, &public(ty), args)
}

fn floats(node: &Node) -> Vec<f64> {
    node.constant_values()
        .unwrap_or_default()
        .iter()
        .filter_map(|v| match v {
            ConstValue::Float(f) => Some(*f),
            _ => None,
        })
        .collect()
}

#[test]
fn scalar_splats_across_vector() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(1.5)];
    let node = construct(&mut s, vec(3), args);

    assert!(node.is_constant());
    assert_eq!(floats(&node), vec![1.5, 1.5, 1.5]);
}

#[test]
fn integer_arguments_are_converted() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.int(1), s.int(2)];
    let node = construct(&mut s, vec(2), args);

    assert_eq!(node.ty.basic, BasicType::Float);
    assert_eq!(floats(&node), vec![1.0, 2.0]);
}

#[test]
fn matrix_from_scalar_is_diagonal() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(2.0)];
    let node = construct(&mut s, Type::matrix(BasicType::Float, 2, 2), args);

    assert_eq!(floats(&node), vec![2.0, 0.0, 0.0, 2.0]);
}

#[test]
fn matrix_from_smaller_matrix_fills_identity() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(5.0)];
    let small = construct(&mut s, Type::matrix(BasicType::Float, 2, 2), args);
    let node = construct(&mut s, Type::matrix(BasicType::Float, 3, 3), vec![small]);

    assert_eq!(
        floats(&node),
        vec![5.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn non_constant_arguments_build_a_construct_node() {
    let mut s = Shader::new(Stage::Vertex);
    s.declare("x", float());
    let x = s.var("x");
    let node = construct(&mut s, vec(4), vec![x]);

    assert_eq!(node.op(), Some(Op::Construct(ConstructOp::Vector)));
    assert_eq!(node.ty.vector_size, 4);
}

#[test]
fn argument_count_errors() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(1.0), s.float(2.0), s.float(3.0)];
    construct(&mut s, vec(2), args);
    let args = vec![s.float(1.0), s.float(2.0)];
    construct(&mut s, vec(4), args);

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: 'constructor' : too many arguments
    ERROR: 0:2: 'constructor' : not enough data provided for construction
    ");
}

#[test]
fn unsized_array_constructor_takes_argument_count() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(1.0), s.float(2.0), s.float(3.0)];
    let node = construct(&mut s, float().with_array(ArraySizes::implicit()), args);

    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
    assert_eq!(node.ty.outer_array_size(), Some(3));
    assert_eq!(floats(&node), vec![1.0, 2.0, 3.0]);
}

#[test]
fn sized_array_constructor_needs_every_element() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(1.0)];
    construct(&mut s, float().with_array(ArraySizes::sized(2)), args);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'constructor' : array constructor needs one argument per array element");
}

#[test]
fn struct_constructor() {
    let mut s = Shader::new(Stage::Vertex);
    let loc = s.loc();
    let ty = s
        .ctx
        .declare_struct(loc, Some("S"), vec![field("a", float()), field("b", int())]);

    let args = vec![s.float(1.0), s.int(2)];
    let node = construct(&mut s, ty.clone(), args);
    assert!(node.is_constant());
    assert_eq!(
        node.constant_values(),
        Some(&[ConstValue::Float(1.0), ConstValue::Int(2)][..])
    );

    let args = vec![s.float(1.0)];
    construct(&mut s, ty, args);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'constructor' : Number of constructor parameters does not match the number of structure fields");
}

#[test]
fn array_cannot_build_a_scalar() {
    let mut s = Shader::new(Stage::Vertex);
    let args = vec![s.float(1.0), s.float(2.0)];
    let array = construct(&mut s, float().with_array(ArraySizes::implicit()), args);
    construct(&mut s, float(), vec![array]);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'constructor' : constructing non-array constituent from array argument");
}

#[test]
fn types_that_cannot_be_constructed() {
    let mut s = Shader::new(Stage::Vertex);
    construct(&mut s, Type::void(), Vec::new());
    construct(&mut s, Type::scalar(BasicType::AtomicUint), Vec::new());

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: 'void' : cannot construct this type
    ERROR: 0:2: 'atomic_uint' : cannot construct this type
    ");
}

#[test]
fn sampler_constructor_needs_texture_and_sampler() {
    let mut s = Shader::new(Stage::Fragment);
    let sampler_2d = Type::sampler(Sampler::combined(BasicType::Float, SamplerDim::D2));
    let args = vec![s.float(1.0)];
    construct(&mut s, sampler_2d, args);

    let text = s.errors();
    assert!(text.contains("sampler-constructor requires two arguments"), "{text}");
}
