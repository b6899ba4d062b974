use glint_core::SourceLoc;
use indoc::indoc;

use super::*;

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"ERROR");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"WARNING");
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::Redefinition, SourceLoc::line(3))
        .token("x")
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    insta::assert_snapshot!(diagnostics.render(), @"ERROR: 0:3: 'x' : redefinition");
}

#[test]
fn report_with_message_and_extra() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::TypeMismatch, SourceLoc::new(1, 7))
        .token("=")
        .message("cannot convert from 'const int' to 'temp bool'")
        .emit();
    diagnostics
        .report(DiagnosticKind::ArraySize, SourceLoc::new(1, 8))
        .token("")
        .message("array size must be a positive integer")
        .extra("(got 0)")
        .emit();

    insta::assert_snapshot!(diagnostics.render(), @r"
    ERROR: 1:7: '=' : cannot convert from 'const int' to 'temp bool'
    ERROR: 1:8: array size must be a positive integer (got 0)
    ");
}

#[test]
fn warnings_do_not_set_error_state() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::Deprecated, SourceLoc::line(1))
        .token("varying")
        .emit();

    assert!(!diagnostics.has_errors());
    assert!(diagnostics.has_warnings());
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.error_count(), 0);
}

#[test]
fn call_site_can_downgrade_to_warning() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::Layout, SourceLoc::line(2))
        .warning()
        .emit();

    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.as_slice()[0].severity(), Severity::Warning);
}

#[test]
fn policy_suppresses_warnings() {
    let policy = MessagePolicy::new().suppress_warnings(true);
    let mut diagnostics = Diagnostics::with_policy(policy);
    diagnostics
        .report(DiagnosticKind::Pragma, SourceLoc::line(1))
        .emit();

    assert!(diagnostics.is_empty());
}

#[test]
fn policy_escalates_warnings() {
    let policy = MessagePolicy::new().warnings_as_errors(true);
    let mut diagnostics = Diagnostics::with_policy(policy);
    diagnostics
        .report(DiagnosticKind::Portability, SourceLoc::line(1))
        .emit();

    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.error_count(), 1);
}

#[test]
fn policy_suppresses_kinds() {
    let policy = MessagePolicy::new().suppress(DiagnosticKind::Extension);
    let mut diagnostics = Diagnostics::with_policy(policy);
    diagnostics
        .report(DiagnosticKind::Extension, SourceLoc::line(1))
        .emit();
    diagnostics
        .report(DiagnosticKind::Undeclared, SourceLoc::line(2))
        .token("y")
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.of_kind(DiagnosticKind::Undeclared).count(), 1);
}

#[test]
fn policy_deserializes() {
    let json = indoc! {r#"
        {
            "suppress_warnings": true,
            "suppressed": ["Pragma"]
        }
    "#};
    let policy: MessagePolicy = serde_json::from_str(json).unwrap();
    assert_eq!(
        policy,
        MessagePolicy::new()
            .suppress_warnings(true)
            .suppress(DiagnosticKind::Pragma)
    );
}

#[test]
fn preprocessor_origin_is_kept() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::Preprocessor, SourceLoc::line(5))
        .origin(Origin::Preprocessor)
        .token("#error")
        .message("user error")
        .emit();

    let msg = &diagnostics.as_slice()[0];
    assert_eq!(msg.origin(), Origin::Preprocessor);
    assert_eq!(msg.text(), "'#error' : user error");
}

#[test]
fn annotated_rendering_mentions_line() {
    let source = indoc! {"
        void main() {
            int x = true;
        }
    "};
    let sources = [source];
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::TypeMismatch, SourceLoc::line(2))
        .token("=")
        .emit();

    let out = diagnostics.printer().sources(&sources).render();
    assert!(out.contains("'=' : type mismatch"));
    assert!(out.contains("int x = true;"));
}

#[test]
fn annotated_rendering_falls_back_for_unknown_line() {
    let sources = ["one line"];
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::Syntax, SourceLoc::line(9))
        .emit();

    let out = diagnostics.printer().sources(&sources).render();
    insta::assert_snapshot!(out, @"ERROR: 0:9: syntax error");
}
