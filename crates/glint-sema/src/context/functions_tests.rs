use std::sync::Arc;

use glint_core::{Profile, SourceLoc, Stage};

use crate::CompileOptions;
use crate::intermediate::{NodeKind, Op};
use crate::symbols::{BuiltInTable, Param};
use crate::test_utils::{Shader, float, int, param};
use crate::types::{BasicType, Storage, Type};

fn call_name(node: &crate::intermediate::Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Aggregate { name, .. } => Some(name),
        _ => None,
    }
}

#[test]
fn ambiguous_under_implicit_conversion_before_400() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    s.prototype("f", float(), vec![param("a", float()), param("b", int())]);
    s.prototype("f", float(), vec![param("a", int()), param("b", float())]);
    s.main(|s| {
        let args = vec![s.int(1), s.int(1)];
        Some(s.call("f", args))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:4: 'f' : ambiguous function signature match: multiple signatures match under implicit type conversion");
}

#[test]
fn exact_match_wins_over_conversions() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    s.prototype("f", float(), vec![param("a", float()), param("b", int())]);
    s.prototype("f", float(), vec![param("a", int()), param("b", float())]);
    s.prototype("f", float(), vec![param("a", int()), param("b", int())]);
    let mut resolved = None;
    s.main(|s| {
        let args = vec![s.int(1), s.int(1)];
        let call = s.call("f", args);
        resolved = call_name(&call).map(str::to_string);
        Some(call)
    });

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(resolved.as_deref(), Some("f(int,int)"));
}

#[test]
fn exact_match_wins_when_declared_first() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    s.prototype("f", float(), vec![param("a", int()), param("b", int())]);
    s.prototype("f", float(), vec![param("a", float()), param("b", int())]);
    s.prototype("f", float(), vec![param("a", int()), param("b", float())]);
    let mut resolved = None;
    s.main(|s| {
        let args = vec![s.int(1), s.int(1)];
        let call = s.call("f", args);
        resolved = call_name(&call).map(str::to_string);
        Some(call)
    });

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(resolved.as_deref(), Some("f(int,int)"));
}

/// A built-in table holding only `scale` overloads, in the given order.
fn scale_overloads(params: &[BasicType]) -> Arc<BuiltInTable> {
    let mut builder = BuiltInTable::builder();
    for &basic in params {
        let ty = Type::scalar(basic);
        builder.function("scale", ty.clone(), &[ty], None);
    }
    Arc::new(builder.build())
}

#[test]
fn equally_ranked_built_in_overloads_are_ambiguous() {
    let table = scale_overloads(&[BasicType::Uint, BasicType::Float]);
    let mut s = Shader::with_options(CompileOptions::new(Stage::Vertex).built_ins(table));
    s.main(|s| {
        let args = vec![s.int(1)];
        Some(s.call("scale", args))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'scale' : ambiguous best function under implicit type conversion");
}

#[test]
fn exact_built_in_overload_wins_in_any_order() {
    let orders = [
        [BasicType::Int, BasicType::Uint, BasicType::Float],
        [BasicType::Uint, BasicType::Float, BasicType::Int],
    ];
    for order in orders {
        let mut s =
            Shader::with_options(CompileOptions::new(Stage::Vertex).built_ins(scale_overloads(&order)));
        let mut result = None;
        s.main(|s| {
            let args = vec![s.int(1)];
            let call = s.call("scale", args);
            result = Some(call.ty.basic);
            Some(call)
        });

        assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
        assert_eq!(result, Some(BasicType::Int));
    }
}

#[test]
fn single_viable_signature_is_converted() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    s.prototype("f", float(), vec![param("a", float())]);
    let mut arg_type = None;
    s.main(|s| {
        let args = vec![s.int(2)];
        let call = s.call("f", args);
        arg_type = call.children().first().map(|a| a.ty.basic);
        Some(call)
    });

    assert!(!s.ctx.diagnostics().has_errors());
    assert_eq!(arg_type, Some(BasicType::Float));
}

#[test]
fn no_conversions_in_es() {
    let mut s = Shader::version(Stage::Vertex, 310, Profile::Es);
    s.prototype("f", float(), vec![param("a", float())]);
    s.main(|s| {
        let args = vec![s.int(2)];
        Some(s.call("f", args))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'f' : no matching overloaded function found");
}

#[test]
fn tie_between_equally_good_candidates_at_450() {
    let mut s = Shader::new(Stage::Vertex);
    s.prototype("f", float(), vec![param("a", float()), param("b", int())]);
    s.prototype("f", float(), vec![param("a", int()), param("b", float())]);
    s.main(|s| {
        let args = vec![s.int(1), s.int(1)];
        Some(s.call("f", args))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:4: 'f' : ambiguous best function under implicit type conversion");
}

#[test]
fn float_preferred_over_double_at_450() {
    let mut s = Shader::new(Stage::Vertex);
    s.prototype("f", float(), vec![param("a", Type::scalar(BasicType::Double))]);
    s.prototype("f", float(), vec![param("a", float())]);
    let mut resolved = None;
    s.main(|s| {
        let args = vec![s.int(1)];
        let call = s.call("f", args);
        resolved = call_name(&call).map(str::to_string);
        Some(call)
    });

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(resolved.as_deref(), Some("f(float)"));
}

#[test]
fn out_argument_goes_through_temporary() {
    let mut s = Shader::new(Stage::Vertex);
    let out_param = Param::new(
        Some("x"),
        float().with_storage(Storage::Out),
        SourceLoc::default(),
    );
    s.prototype("g", Type::void(), vec![out_param]);
    let mut shape = None;
    s.main(|s| {
        s.declare("d", Type::scalar(BasicType::Double));
        let d = s.var("d");
        let call = s.call("g", vec![d]);
        shape = Some((
            call.op(),
            call.children().iter().map(|c| c.op()).collect::<Vec<_>>(),
        ));
        Some(call)
    });

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
    assert_eq!(
        shape,
        Some((Some(Op::Comma), vec![Some(Op::FunctionCall), Some(Op::Assign)]))
    );
}

#[test]
fn constant_cannot_be_out_argument() {
    let mut s = Shader::new(Stage::Vertex);
    let out_param = Param::new(Some("x"), float().with_storage(Storage::Out), SourceLoc::default());
    s.prototype("g", Type::void(), vec![out_param]);
    s.main(|s| {
        let args = vec![s.float(1.0)];
        Some(s.call("g", args))
    });

    let text = s.errors();
    assert!(
        text.contains("Non-L-value cannot be passed for 'out' or 'inout' parameters."),
        "{text}"
    );
}

#[test]
fn missing_return_value() {
    let mut s = Shader::new(Stage::Vertex);
    s.function("h", float(), Vec::new(), |_| None);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'h' : function does not return a value:");
}

#[test]
fn void_function_returning_value() {
    let mut s = Shader::new(Stage::Vertex);
    s.main(|s| {
        let value = s.float(1.0);
        Some(s.ret(Some(value)))
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'return' : void function cannot return a value");
}

#[test]
fn second_body_is_redefinition() {
    let mut s = Shader::new(Stage::Vertex);
    s.function("f", Type::void(), Vec::new(), |_| None);
    s.function("f", Type::void(), Vec::new(), |_| None);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'f' : function already has a body");
}

#[test]
fn overloads_must_agree_on_return_type() {
    let mut s = Shader::new(Stage::Vertex);
    s.prototype("f", float(), vec![param("a", float())]);
    s.prototype("f", int(), vec![param("a", float())]);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'f' : overloaded functions must have the same return type");
}

#[test]
fn main_takes_no_parameters() {
    let mut s = Shader::new(Stage::Vertex);
    s.function("main", Type::void(), vec![param("x", float())], |_| None);

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'main' : function cannot take any parameter(s)");
}

#[test]
fn variable_used_as_function() {
    let mut s = Shader::new(Stage::Vertex);
    s.declare("v", float());
    s.main(|s| Some(s.call("v", Vec::new())));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'v' : can't use function syntax on variable");
}

#[test]
fn barrier_before_return_in_main() {
    let mut s = Shader::new(Stage::TessControl);
    s.main(|s| {
        let barrier = s.call("barrier", Vec::new());
        let done = s.ret(None);
        s.sequence(vec![barrier, done])
    });

    assert!(!s.ctx.diagnostics().has_errors(), "{}", s.errors());
}

#[test]
fn barrier_after_return_in_main() {
    let mut s = Shader::new(Stage::TessControl);
    s.main(|s| {
        let early = s.ret(None);
        let barrier = s.call("barrier", Vec::new());
        s.sequence(vec![early, barrier])
    });

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: 'barrier()' : tessellation control barrier() cannot be placed after a return from main()");
}

#[test]
fn barrier_outside_main() {
    let mut s = Shader::new(Stage::TessControl);
    s.function("sync", Type::void(), Vec::new(), |s| Some(s.call("barrier", Vec::new())));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:2: 'barrier()' : tessellation control barrier() must be in main()");
}
