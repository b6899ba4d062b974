use super::*;

#[test]
fn source_loc_display() {
    insta::assert_snapshot!(SourceLoc::new(2, 17).to_string(), @"2:17");
    assert_eq!(SourceLoc::line(4), SourceLoc::new(0, 4));
}

#[test]
fn source_locs_order_by_string_then_line() {
    let mut locs = vec![SourceLoc::new(1, 2), SourceLoc::new(0, 9), SourceLoc::new(1, 1)];
    locs.sort();
    assert_eq!(
        locs,
        vec![SourceLoc::new(0, 9), SourceLoc::new(1, 1), SourceLoc::new(1, 2)]
    );
}

#[test]
fn stage_masks() {
    let mask = StageMask::GEOMETRY | StageMask::TESS_CONTROL;
    assert!(mask.contains(Stage::Geometry));
    assert!(mask.contains(Stage::TessControl));
    assert!(!mask.contains(Stage::Fragment));
    assert!(StageMask::ALL.contains(Stage::Compute));
}

#[test]
fn profile_masks() {
    assert!(ProfileMask::DESKTOP.contains(Profile::Core));
    assert!(ProfileMask::DESKTOP.contains(Profile::None));
    assert!(!ProfileMask::DESKTOP.contains(Profile::Es));
    assert_eq!(Profile::parse("es"), Some(Profile::Es));
    assert_eq!(Profile::parse("strict"), None);
}

#[test]
fn known_versions() {
    assert!(is_known_version(310, Profile::Es));
    assert!(!is_known_version(330, Profile::Es));
    assert!(is_known_version(450, Profile::Core));
    assert!(!is_known_version(300, Profile::None));
}

#[test]
fn resources_json_overrides_defaults() {
    let json = indoc::indoc! {r#"
        {
            "MaxDrawBuffers": 4,
            "Limits": { "whileLoops": false }
        }
    "#};
    let resources = Resources::from_json(json).unwrap();

    assert_eq!(resources.max_draw_buffers, 4);
    assert_eq!(resources.max_vertex_attribs, Resources::default().max_vertex_attribs);
    assert!(!resources.limits.while_loops);
    assert!(resources.limits.do_while_loops);
}

#[test]
fn resources_reject_out_of_range() {
    let err = Resources::from_json(r#"{"MaxDrawBuffers": 0}"#).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"resource `MaxDrawBuffers` must be at least 1, got 0");
}

#[test]
fn resources_reject_malformed_json() {
    let err = Resources::from_json("{").unwrap_err();
    assert!(matches!(err, ResourcesError::Json(_)));
}
