#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use zen_validation::router::Router;
use zen_validation::spec::parse_spec_str;

fn router() -> Router {
    Router::from_spec(&parse_spec_str(common::petstore::SPEC).unwrap()).unwrap()
}

#[test]
fn test_exact_paths_match_only_themselves() {
    let router = router();
    let m = router.match_route("GET", "/pets/mine").unwrap();
    assert_eq!(m.operation_id(), "myPets");
    assert!(m.path_params.is_empty());

    assert_eq!(router.match_route("GET", "/pets").unwrap().operation_id(), "listPets");
    assert!(router.match_route("GET", "/pets/").is_none());
    assert!(router.match_route("GET", "/pets/mine/extra").is_none());
    assert!(router.match_route("PUT", "/pets").is_none());
}

#[test]
fn test_templates_capture_segments() {
    let router = router();
    for id in ["1", "abc", "with%20space", "-"] {
        let m = router.match_route("GET", &format!("/pets/{id}")).unwrap();
        assert_eq!(m.operation_id(), "getPet");
        assert_eq!(m.get_path_param("petId"), Some(id));
    }

    let m = router.match_route("GET", "/pets/7/photos/front").unwrap();
    assert_eq!(m.operation_id(), "getPetPhoto");
    assert_eq!(m.get_path_param("petId"), Some("7"));
    assert_eq!(m.get_path_param("photoId"), Some("front"));
    assert_eq!(m.path_params.len(), 2);
}

#[test]
fn test_segments_never_span_slashes() {
    let router = router();
    assert!(router.match_route("GET", "/pets/1/2").is_none());
    assert!(router.match_route("GET", "/pets//photos/x").is_none());
}

#[test]
fn test_method_selects_operation() {
    let router = router();
    assert_eq!(router.match_route("delete", "/pets/3").unwrap().operation_id(), "deletePet");
    assert_eq!(router.match_route("GET", "/pets/3").unwrap().operation_id(), "getPet");
    assert_eq!(router.len(), 8);
}
