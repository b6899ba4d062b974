use glint_core::{Profile, ProfileMask, Stage, StageMask};

use crate::DiagnosticKind;
use crate::context::CompileOptions;
use crate::test_utils::Shader;

use super::ExtensionBehavior;

#[test]
fn parse_behavior() {
    assert_eq!(ExtensionBehavior::parse("require"), Some(ExtensionBehavior::Require));
    assert_eq!(ExtensionBehavior::parse("warn"), Some(ExtensionBehavior::Warn));
    assert_eq!(ExtensionBehavior::parse("Enable"), None);
}

#[test]
fn enabled_extension_satisfies_gate() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    let loc = s.loc();
    s.ctx
        .update_extension_behavior(loc, "GL_ARB_gpu_shader5", "enable");
    let loc = s.loc();
    let passed = s.ctx.profile_requires(
        loc,
        ProfileMask::DESKTOP,
        400,
        &["GL_ARB_gpu_shader5"],
        "gather",
    );

    assert!(passed);
    assert!(s.ctx.diagnostics().is_empty(), "{}", s.errors());
}

#[test]
fn warn_behavior_reports_use() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "GL_ARB_gpu_shader5", "warn");
    let loc = s.loc();
    s.ctx
        .profile_requires(loc, ProfileMask::DESKTOP, 400, &["GL_ARB_gpu_shader5"], "gather");

    insta::assert_snapshot!(s.errors(), @"WARNING: 0:2: 'gather' : extension GL_ARB_gpu_shader5 is being used for");
}

#[test]
fn gate_failure_and_other_profiles() {
    let mut s = Shader::version(Stage::Vertex, 330, Profile::Core);
    let loc = s.loc();
    assert!(!s.ctx.profile_requires(loc, ProfileMask::DESKTOP, 400, &[], "gather"));
    let loc = s.loc();
    // ES-only gates do not apply to a core shader.
    assert!(s.ctx.profile_requires(loc, ProfileMask::ES, 320, &[], "gather"));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'gather' : not supported for this version or the enabled extensions");
}

#[test]
fn require_profile_names_current_profile() {
    let mut s = Shader::version(Stage::Vertex, 310, Profile::Es);
    let loc = s.loc();
    s.ctx.require_profile(loc, ProfileMask::DESKTOP, "double");

    let mut none = Shader::version(Stage::Vertex, 110, Profile::None);
    let loc = none.loc();
    none.ctx.require_profile(loc, ProfileMask::ES, "precision");

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'double' : not supported with this profile: es");
    insta::assert_snapshot!(none.errors(), @"ERROR: 0:1: 'precision' : not supported with this profile: none");
}

#[test]
fn unknown_extension() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "GL_FOO_bar", "enable");
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "GL_FOO_bar", "require");

    let diagnostics = s.ctx.diagnostics();
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.of_kind(DiagnosticKind::ExtensionGate).count(), 1);
    insta::assert_snapshot!(s.errors(), @r"
    WARNING: 0:1: '#extension' : extension not supported: GL_FOO_bar
    ERROR: 0:2: '#extension' : extension not supported: GL_FOO_bar
    ");
}

#[test]
fn bad_behavior_and_all() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "GL_ARB_gpu_shader5", "sometimes");
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "all", "enable");

    insta::assert_snapshot!(s.errors(), @r"
    ERROR: 0:1: '#extension' : behavior not supported: sometimes
    ERROR: 0:2: '#extension' : extension 'all' cannot have 'require' or 'enable' behavior
    ");
}

#[test]
fn all_warn_turns_everything_on() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.update_extension_behavior(loc, "all", "warn");

    assert!(s.ctx.extension_turned_on("GL_OES_texture_3D"));
    assert!(s.ctx.extension_turned_on("GL_ARB_compute_shader"));
}

#[test]
fn require_extensions_lists_candidates() {
    let mut s = Shader::new(Stage::Fragment);
    let loc = s.loc();
    s.ctx.require_extensions(
        loc,
        &["GL_EXT_shader_io_blocks", "GL_OES_shader_io_blocks"],
        "io block",
    );

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'io block' : required extension not requested: GL_EXT_shader_io_blocks GL_OES_shader_io_blocks");
}

#[test]
fn deprecation_is_an_error_when_forward_compatible() {
    let mut s = Shader::version(Stage::Vertex, 150, Profile::Core);
    let loc = s.loc();
    s.ctx.check_deprecated(loc, ProfileMask::CORE, 130, "varying");
    assert_eq!(s.ctx.diagnostics().warning_count(), 1);

    let options = CompileOptions::new(Stage::Vertex)
        .version(150, Profile::Core)
        .forward_compatible(true);
    let mut strict = Shader::with_options(options);
    let loc = strict.loc();
    strict.ctx.check_deprecated(loc, ProfileMask::CORE, 130, "varying");
    insta::assert_snapshot!(strict.errors(), @"ERROR: 0:1: 'varying' : deprecated, may be removed in future release");
}

#[test]
fn removed_feature() {
    let mut s = Shader::version(Stage::Vertex, 300, Profile::Es);
    let loc = s.loc();
    s.ctx.deprecated_keyword_check(loc, "attribute");

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'attribute' : no longer supported in es profile; removed in version 300");
}

#[test]
fn stage_gate() {
    let mut s = Shader::new(Stage::Compute);
    let loc = s.loc();
    assert!(!s.ctx.require_stage(loc, StageMask::FRAGMENT, "dFdx"));

    insta::assert_snapshot!(s.errors(), @"ERROR: 0:1: 'dFdx' : not supported in this stage: compute");
}
