use glint_core::{Profile, Stage};

use crate::DiagnosticKind;
use crate::intermediate::{ConstValue, Node, NodeKind, Op};
use crate::test_utils::{Shader, field, float, int, vec};
use crate::types::{ArraySizes, BasicType, Storage, Type};

fn dot(s: &mut Shader, base: Node, field: &str) -> Node {
    let loc = s.loc();
    s.ctx.handle_dot_dereference(loc, base, field)
}

fn index(s: &mut Shader, base: Node, value: i32) -> Node {
    let loc = s.loc();
    let index = s.int(value);
    s.ctx.handle_bracket_dereference(loc, base, index)
}

fn assign(s: &mut Shader, left: Node, right: Node) -> Node {
    let loc = s.loc();
    s.ctx.handle_assign(loc, Op::Assign, left, right)
}

fn selectors(node: &Node) -> Vec<i64> {
    match &node.kind {
        NodeKind::Binary { right, .. } => match right.const_int() {
            Some(single) => vec![single],
            None => right.children().iter().filter_map(Node::const_int).collect(),
        },
        _ => Vec::new(),
    }
}

#[test]
fn undeclared_identifier_reported_once() {
    let mut s = Shader::new(Stage::Fragment);
    s.main(|s| {
        let first = s.var("nope");
        let second = s.var("nope");
        s.sequence(vec![first, second])
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'nope' : undeclared identifier");
}

#[test]
fn function_name_is_not_a_variable() {
    let mut s = Shader::new(Stage::Fragment);
    s.prototype("helper", float(), Vec::new());
    s.var("helper");

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'helper' : variable name expected");
}

#[test]
fn swizzle_selects_components() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("v", vec(4));
    let v = s.var("v");

    let bgr = dot(&mut s, v.clone(), "bgr");
    assert_eq!(bgr.op(), Some(Op::VectorSwizzle));
    assert_eq!(bgr.ty.vector_size, 3);
    assert_eq!(selectors(&bgr), vec![2, 1, 0]);

    let y = dot(&mut s, v, "y");
    assert_eq!(y.op(), Some(Op::IndexDirect));
    assert_eq!(selectors(&y), vec![1]);
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
}

#[test]
fn bad_swizzles() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("w", vec(2));
    let w = s.var("w");
    for field in ["xg", "xz", "xyzwx", "xk"] {
        dot(&mut s, w.clone(), field);
    }

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:3: 'xg' : vector swizzle selectors not from the same set
    ERROR: 0:4: 'xz' : vector swizzle selection out of range
    ERROR: 0:5: 'xyzwx' : vector swizzle too long
    ERROR: 0:6: 'xk' : unknown swizzle selection
    ");
}

#[test]
fn scalar_swizzle_needs_420() {
    let mut s = Shader::version(Stage::Fragment, 330, Profile::Core);
    s.declare("f", float());
    let f = s.var("f");
    dot(&mut s, f, "x");
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'scalar swizzle' : not supported for this version or the enabled extensions");

    let mut s = Shader::new(Stage::Fragment);
    s.declare("f", float());
    let f = s.var("f");
    let widened = dot(&mut s, f, "xx");
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
    assert_eq!(widened.ty.vector_size, 2);
}

#[test]
fn field_selection() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    let light = s
        .ctx
        .declare_struct(loc, Some("Light"), vec![field("color", vec(3)), field("power", float())]);
    s.declare("sun", light);
    s.declare_array("lamps", float(), ArraySizes::sized(2));

    let sun = s.var("sun");
    let power = dot(&mut s, sun.clone(), "power");
    assert_eq!(power.op(), Some(Op::IndexDirectStruct));
    assert_eq!(power.ty.basic, BasicType::Float);

    dot(&mut s, sun, "radius");
    let lamps = s.var("lamps");
    dot(&mut s, lamps, "x");

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:6: 'radius' : no such field in structure
    ERROR: 0:8: '.' : cannot apply to an array: x
    ");
}

#[test]
fn constant_index_bounds() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare_array("a", float(), ArraySizes::sized(4));
    s.declare("v", vec(3));
    s.declare("m", Type::matrix(BasicType::Float, 2, 2));
    let a = s.var("a");
    let v = s.var("v");
    let m = s.var("m");

    let clamped = index(&mut s, a.clone(), 4);
    index(&mut s, v, 3);
    index(&mut s, m, 2);
    index(&mut s, a, -1);

    assert_eq!(clamped.op(), Some(Op::IndexDirect));
    assert_eq!(selectors(&clamped), vec![0]);
    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:7: '[' : array index out of range '4'
    ERROR: 0:8: '[' : vector index out of range '3'
    ERROR: 0:9: '[' : matrix index out of range '2'
    ERROR: 0:10: '[' : index out of range '-1'
    ");
}

#[test]
fn indexing_needs_an_indexable_base_and_integer_index() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("f", float());
    s.declare("v", vec(4));
    let f = s.var("f");
    let v = s.var("v");

    index(&mut s, f, 0);
    let loc = s.loc();
    let half = s.float(1.0);
    let node = s.ctx.handle_bracket_dereference(loc, v, half);

    assert!(node.is_error());
    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:5: 'f' : left of '[' is not of type array, matrix, or vector
    ERROR: 0:6: '[]' : scalar integer expression required
    ");
}

#[test]
fn implicit_size_limits_later_redeclaration() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare_array("b", float(), ArraySizes::implicit());
    let b = s.var("b");
    index(&mut s, b, 6);
    s.declare_array("b", float(), ArraySizes::sized(5));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:4: 'b' : size of array is smaller than the largest index already used 7 > 5");
    let found = s.ctx.symbols().lookup("b").expect("declared");
    let ty = s.ctx.symbols().variable_type(found.id).expect("variable");
    assert_eq!(ty.outer_array_size(), Some(5));
}

#[test]
fn shader_inputs_are_read_only() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("pos", vec(4).with_storage(Storage::In));
    let pos = s.var("pos");
    let one = s.float(1.0);
    assign(&mut s, pos, one);

    insta::assert_snapshot!(s.errors(), @r#"ERROR: 0:3: '=' : l-value required "pos" (can't modify shader input)"#);
}

#[test]
fn constants_are_read_only() {
    let mut s = Shader::new(Stage::Fragment);
    let init = s.int(1);
    s.declare_init("k", int().with_storage(Storage::Const), init);
    let k = s.var("k");
    let two = s.int(2);
    assign(&mut s, k, two);

    let diagnostics = s.ctx.diagnostics();
    assert_eq!(diagnostics.of_kind(DiagnosticKind::NotLValue).count(), 1);
    assert!(s.errors().contains("0:3: '=' : l-value required"), "{}", s.errors());
}

#[test]
fn swizzle_assignment() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("v", vec(4));
    s.declare("w", vec(2));

    let v = s.var("v");
    let xx = dot(&mut s, v, "xx");
    let one = s.float(1.0);
    assign(&mut s, xx, one);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:5: '=' : l-value of swizzle cannot have duplicate components");

    let v = s.var("v");
    let zy = dot(&mut s, v, "zy");
    let w = s.var("w");
    let node = assign(&mut s, zy, w);
    assert_eq!(node.op(), Some(Op::Assign));
    assert_eq!(s.ctx.diagnostics().error_count(), 1);
}

#[test]
fn assignment_needs_convertible_types() {
    let mut s = Shader::new(Stage::Fragment);
    s.declare("f", float());
    s.declare("v", vec(3));
    let f = s.var("f");
    let v = s.var("v");
    assign(&mut s, f, v);

    let text = s.errors();
    assert!(text.contains("0:5: '=' : cannot convert from '"), "{text}");
    assert_eq!(s.ctx.diagnostics().of_kind(DiagnosticKind::TypeMismatch).count(), 1);
}

#[test]
fn binary_operators() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    let (two, three) = (s.int(2), s.int(3));
    let sum = s.ctx.handle_binary_math(loc, Op::Add, two, three);
    assert_eq!(sum.const_int(), Some(5));

    s.declare("a", vec(2));
    s.declare("b", vec(3));
    let a = s.var("a");
    let b = s.var("b");
    let loc = s.loc();
    s.ctx.handle_binary_math(loc, Op::Add, a.clone(), b);
    let loc = s.loc();
    let less = s.ctx.handle_binary_math(loc, Op::LessThan, a.clone(), a);

    assert_eq!(less.ty.basic, BasicType::Bool);
    assert_eq!(less.constant_values(), Some(&[ConstValue::Bool(false)][..]));
    let text = s.errors();
    assert!(text.contains("0:6: '+' : wrong operand types: no operation '+' exists"), "{text}");
    assert!(text.contains("0:7: '<' : wrong operand types:"), "{text}");
    assert_eq!(s.ctx.diagnostics().error_count(), 2);
}

#[test]
fn unary_operators() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    let two = s.int(2);
    let negated = s.ctx.handle_unary_math(loc, Op::Negative, two);
    assert_eq!(negated.const_int(), Some(-2));

    let loc = s.loc();
    let half = s.float(0.5);
    s.ctx.handle_unary_math(loc, Op::LogicalNot, half);

    let text = s.errors();
    assert!(text.contains("0:2: '!' : wrong operand type no operation '!'"), "{text}");
}

#[test]
fn ternary_condition_must_be_bool() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    let (cond, a, b) = (s.float(1.0), s.float(2.0), s.float(3.0));
    s.ctx.handle_ternary(loc, cond, a, b);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: boolean expression expected");
}

#[test]
fn global_only_constructs() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    assert!(!s.ctx.global_check(loc, "precision"));
    s.main(|s| {
        let loc = s.loc();
        s.ctx.global_check(loc, "precision");
        None
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'precision' : not allowed in nested scope");
}
