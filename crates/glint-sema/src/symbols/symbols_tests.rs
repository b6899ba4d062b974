use std::sync::Arc;

use glint_core::{Profile, Resources, SourceLoc, Stage};

use super::*;
use crate::types::{BasicType, Storage, Type};

fn table(stage: Stage, version: u32) -> SymbolTable {
    let built_ins = BuiltInTable::new(stage, version, Profile::Core, &Resources::default());
    SymbolTable::new(Arc::new(built_ins))
}

fn float_var() -> SymbolKind {
    SymbolKind::Variable(Variable::new(Type::scalar(BasicType::Float)))
}

#[test]
fn inner_scope_shadows_outer() {
    let mut symbols = table(Stage::Fragment, 450);
    let outer = symbols.insert("x", SourceLoc::line(1), float_var()).unwrap();
    symbols.push_scope();
    let inner = symbols.insert("x", SourceLoc::line(2), float_var()).unwrap();

    let found = symbols.lookup("x").unwrap();
    assert_eq!(found.id, inner);
    assert!(found.current_scope);

    symbols.pop_scope();
    assert_eq!(symbols.lookup("x").unwrap().id, outer);
    assert!(symbols.at_global_level());
}

#[test]
fn same_scope_insert_reports_existing() {
    let mut symbols = table(Stage::Fragment, 450);
    let first = symbols.insert("x", SourceLoc::line(1), float_var()).unwrap();
    assert_eq!(symbols.insert("x", SourceLoc::line(2), float_var()), Err(first));
}

#[test]
fn overloads_share_a_name() {
    let mut symbols = table(Stage::Fragment, 450);
    let f = |ty: Type| {
        SymbolKind::Function(Function::new(
            "f",
            Type::void(),
            vec![Param::new(Some("a"), ty, SourceLoc::line(1))],
        ))
    };
    let a = symbols.insert("f", SourceLoc::line(1), f(Type::scalar(BasicType::Float)));
    let b = symbols.insert("f", SourceLoc::line(2), f(Type::scalar(BasicType::Int)));
    assert!(a.is_ok());
    let b = b.unwrap();
    assert_eq!(
        symbols.insert("f", SourceLoc::line(3), f(Type::scalar(BasicType::Int))),
        Err(b)
    );
    assert!(symbols.insert("f", SourceLoc::line(4), float_var()).is_err());
    assert_eq!(symbols.find_functions("f").len(), 2);
}

#[test]
fn mangled_names_spell_parameter_types() {
    let params = [Type::vector(BasicType::Float, 3), Type::scalar(BasicType::Int)];
    assert_eq!(mangle("foo", &params), "foo(vec3,int)");
    assert_eq!(mangle("main", &[] as &[Type]), "main()");
}

#[test]
fn built_ins_resolve_below_user_scopes() {
    let symbols = table(Stage::Fragment, 450);
    let found = symbols.lookup("gl_FragCoord").unwrap();
    assert!(found.built_in);
    assert!(symbols.is_built_in(found.id));
    assert_eq!(
        symbols.variable_type(found.id).map(Type::name),
        Some("vec4".to_string())
    );
}

#[test]
fn copy_up_leaves_shared_table_untouched() {
    let built_ins = Arc::new(BuiltInTable::new(
        Stage::Geometry,
        450,
        Profile::Core,
        &Resources::default(),
    ));
    let mut first = SymbolTable::new(built_ins.clone());
    let second = SymbolTable::new(built_ins.clone());

    let original = first.lookup("gl_in").unwrap().id;
    let copy = first.copy_up(original);
    assert_ne!(copy, original);
    assert_eq!(first.copy_up(original), copy);

    let var = first.get_mut(copy).unwrap().as_variable_mut().unwrap();
    var.ty.array_sizes.as_mut().unwrap().set_outer_size(3);

    assert!(!first.lookup("gl_in").unwrap().built_in);
    assert!(built_ins.get(original).as_variable().unwrap().ty.is_unsized_array());
    assert!(second.lookup("gl_in").unwrap().built_in);
}

#[test]
fn copying_a_member_copies_its_block() {
    let mut symbols = table(Stage::Vertex, 450);
    let position = symbols.lookup("gl_Position").unwrap().id;
    let (block, _) = symbols.get(position).as_member().unwrap();

    let copy = symbols.copy_up(position);
    let (copied_block, index) = symbols.get(copy).as_member().unwrap();
    assert_eq!(symbols.copy_of(block), Some(copied_block));
    assert_eq!(index, 0);

    let point_size = symbols.lookup("gl_PointSize").unwrap();
    assert!(!point_size.built_in);
}

#[test]
fn hidden_built_ins_stop_resolving() {
    let mut symbols = table(Stage::Vertex, 450);
    symbols.hide("gl_PointSize");
    assert!(symbols.lookup("gl_PointSize").is_none());
    assert!(symbols.lookup("gl_Position").is_some());
}

#[test]
fn user_function_replaces_matching_built_in() {
    let mut symbols = table(Stage::Fragment, 120);
    let float = Type::scalar(BasicType::Float);
    let sin = Function::new(
        "sin",
        float.clone(),
        vec![Param::new(Some("x"), float, SourceLoc::line(1))],
    );
    let user = symbols
        .insert("sin", SourceLoc::line(1), SymbolKind::Function(sin))
        .unwrap();

    let overloads = symbols.find_functions("sin");
    assert_eq!(overloads[0], user);
    assert_eq!(overloads.len(), 4);
}

#[test]
fn declared_count_skips_copies_and_members() {
    let mut symbols = table(Stage::Vertex, 450);
    symbols.insert("a", SourceLoc::line(1), float_var()).unwrap();
    let position = symbols.lookup("gl_Position").unwrap().id;
    symbols.copy_up(position);
    assert_eq!(symbols.declared_count(), 1);
}

#[test]
fn stage_gates_built_ins() {
    let es = BuiltInTable::new(Stage::Fragment, 100, Profile::Es, &Resources::default());
    assert!(es.lookup("gl_FragColor").is_some());
    assert!(es.lookup("texture").is_none());
    assert!(es.lookup("texture2D").is_some());

    let compute = BuiltInTable::new(Stage::Compute, 430, Profile::Core, &Resources::default());
    let size = compute.get(compute.lookup("gl_WorkGroupSize").unwrap());
    assert_eq!(size.as_variable().unwrap().ty.storage(), Storage::Const);
    assert!(compute.lookup("barrier").is_some());
    assert!(compute.lookup("EmitVertex").is_none());
}
