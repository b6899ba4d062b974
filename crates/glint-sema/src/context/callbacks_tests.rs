use std::cell::RefCell;
use std::rc::Rc;

use glint_core::{Profile, Stage};

use crate::diagnostics::Origin;
use crate::test_utils::Shader;

use super::Callbacks;

fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn hooks_receive_directives() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut s = Shader::new(Stage::Fragment);
    let callbacks = Callbacks::new()
        .on_version({
            let seen = seen.clone();
            move |line, version, profile| {
                seen.borrow_mut().push(format!("version {line} {version} {profile}"));
            }
        })
        .on_extension({
            let seen = seen.clone();
            move |line, name, behavior| {
                seen.borrow_mut().push(format!("extension {line} {name} {behavior}"));
            }
        })
        .on_line({
            let seen = seen.clone();
            move |current, new, has_source, source, name| {
                seen.borrow_mut()
                    .push(format!("line {current} {new} {has_source} {source} {name:?}"));
            }
        })
        .on_pragma({
            let seen = seen.clone();
            move |line, tokens| seen.borrow_mut().push(format!("pragma {line} {}", tokens.join(" ")))
        })
        .on_error({
            let seen = seen.clone();
            move |line, message| seen.borrow_mut().push(format!("error {line} {message}"))
        });
    s.ctx.set_callbacks(callbacks);

    s.ctx.notify_version(1, 450, "core");
    let loc = s.loc();
    s.ctx
        .update_extension_behavior(loc, "GL_ARB_gpu_shader5", "enable");
    s.ctx.notify_line_directive(3, 10, true, 2, Some("lib.glsl"));
    let loc = s.loc();
    s.ctx.handle_pragma(loc, &tokens(&["mine", "(", "x", ")"]));
    let loc = s.loc();
    s.ctx.notify_error_directive(loc, "stop here");

    insta::assert_debug_snapshot!(seen.borrow(), @r#"
    [
        "version 1 450 core",
        "extension 1 GL_ARB_gpu_shader5 enable",
        "line 3 10 true 2 Some(\"lib.glsl\")",
        "pragma 2 mine ( x )",
        "error 3 stop here",
    ]
    "#);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:3: '#error' : stop here");
    let origin = s.ctx.diagnostics().iter().next().map(|d| d.origin());
    assert_eq!(origin, Some(Origin::Preprocessor));
}

#[test]
fn missing_hooks_are_silent() {
    let mut s = Shader::new(Stage::Fragment);
    s.ctx.notify_version(1, 450, "core");
    s.ctx.notify_line_directive(1, 5, false, 0, None);
    assert!(s.ctx.diagnostics().is_empty());
}

#[test]
fn optimize_and_debug_pragmas() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.handle_pragma(loc, &tokens(&["optimize", "(", "off", ")"]));
    let loc = s.loc();
    s.ctx.handle_pragma(loc, &tokens(&["debug", "(", "on", ")"]));

    assert!(!s.ctx.pragma.optimize);
    assert!(s.ctx.pragma.debug);
    assert!(s.ctx.diagnostics().is_empty());
}

#[test]
fn malformed_pragmas_warn() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.handle_pragma(loc, &tokens(&["optimize", "(", "maybe", ")"]));
    let loc = s.loc();
    s.ctx.handle_pragma(loc, &tokens(&["debug", "on"]));

    assert!(s.ctx.pragma.optimize);
    insta::assert_snapshot!(s.errors(), @r#"
    WARNING: 0:1: '#pragma' : expected "on" or "off" optimize
    WARNING: 0:2: '#pragma' : expected "(on)" or "(off)" debug
    "#);
}

#[test]
fn unknown_pragmas_are_recorded() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx
        .handle_pragma(loc, &tokens(&["vendor_unroll", "(", "4", ")"]));

    assert_eq!(
        s.ctx.pragma.table.get("vendor_unroll"),
        Some(&tokens(&["(", "4", ")"]))
    );
}

#[test]
fn invariant_all() {
    let mut s = Shader::new(Stage::Vertex);
    let loc = s.loc();
    s.ctx
        .handle_pragma(loc, &tokens(&["STDGL", "invariant", "(", "all", ")"]));
    assert!(s.ctx.pragma.invariant_all);

    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx
        .handle_pragma(loc, &tokens(&["STDGL", "invariant", "(", "all", ")"]));
    assert!(!s.ctx.pragma.invariant_all);
    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: '#pragma' : 'invariant(all)' is not allowed in a fragment shader");
}

#[test]
fn line_continuation_by_version() {
    let mut es = Shader::version(Stage::Fragment, 100, Profile::Es);
    let loc = es.loc();
    assert!(!es.ctx.line_continuation_check(loc, false));
    insta::assert_snapshot!(es.errors(), @"ERROR: 0:1: 'line continuation' : not supported for this version");

    let mut old = Shader::version(Stage::Fragment, 330, Profile::Core);
    let loc = old.loc();
    assert!(old.ctx.line_continuation_check(loc, false));
    let loc = old.loc();
    assert!(old.ctx.line_continuation_check(loc, true));
    insta::assert_snapshot!(old.errors(), @r"
    WARNING: 0:1: 'line continuation' : not portable before version 420
    WARNING: 0:2: 'line continuation' : used at end of comment; the following line is still part of the comment
    ");

    let mut modern = Shader::new(Stage::Fragment);
    let loc = modern.loc();
    assert!(modern.ctx.line_continuation_check(loc, false));
    assert!(modern.ctx.diagnostics().is_empty());
}

#[test]
fn reserved_macro_names() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.reserved_pp_error_check(loc, "GL_MINE", "#define");
    let loc = s.loc();
    s.ctx.reserved_pp_error_check(loc, "MY__MACRO", "#define");
    let loc = s.loc();
    s.ctx.reserved_pp_error_check(loc, "PLAIN", "#undef");

    insta::assert_snapshot!(s.errors(), @r#"
    ERROR: 0:1: '#define' : names beginning with "GL_" can't be (un)defined: GL_MINE
    WARNING: 0:2: '#define' : names containing consecutive underscores are reserved: MY__MACRO
    "#);

    let mut es = Shader::version(Stage::Fragment, 300, Profile::Es);
    let loc = es.loc();
    es.ctx.reserved_pp_error_check(loc, "MY__MACRO", "#define");
    assert!(es.ctx.diagnostics().has_errors());
}

#[test]
fn line_directive_numbering() {
    let es100 = Shader::version(Stage::Fragment, 100, Profile::Es);
    let es300 = Shader::version(Stage::Fragment, 300, Profile::Es);
    let core330 = Shader::version(Stage::Fragment, 330, Profile::Core);
    let legacy = Shader::version(Stage::Fragment, 120, Profile::None);

    assert!(!es100.ctx.line_directive_should_set_next_line());
    assert!(es300.ctx.line_directive_should_set_next_line());
    assert!(core330.ctx.line_directive_should_set_next_line());
    assert!(!legacy.ctx.line_directive_should_set_next_line());
}
