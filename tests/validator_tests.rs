#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::petstore::{validator, validator_with};
use std::collections::HashSet;
use std::io::Cursor;
use zen_validation::problem::flatten_output;
use zen_validation::runtime_config::ValidationConfig;
use zen_validation::schema::evaluate;
use zen_validation::{Problem, RequestValidator, ValidationOutcome, ValidationRequest};

fn create_pet(body: &str) -> ValidationRequest {
    ValidationRequest::new("POST", "/pets")
        .with_header("Authorization", "Bearer token-123")
        .with_header("Content-Type", "application/json")
        .with_body(body)
}

fn problem(outcome: ValidationOutcome) -> Problem {
    match outcome {
        ValidationOutcome::Invalid { problem, .. } => problem,
        other => panic!("expected Invalid, got {other:?}"),
    }
}

fn locations(problem: &Problem) -> HashSet<&str> {
    problem.errors.iter().map(|e| e.location.as_str()).collect()
}

#[test]
fn test_missing_required_field_points_at_body_id() {
    let v = validator();
    let p = problem(v.validate(&mut create_pet(r#"{"name":"x"}"#)));
    assert_eq!(p.status, 400);
    assert_eq!(p.type_uri, "/errors/validation/bad-request");
    assert_eq!(p.errors.len(), 1);
    assert_eq!(p.errors[0].location, "body.id");
    assert!(p.errors[0].fix.is_some());
}

#[test]
fn test_each_violation_is_reported_separately() {
    let v = validator();
    let p = problem(v.validate(&mut create_pet(r#"{"name":"x","age":99}"#)));
    assert_eq!(p.errors.len(), 2);
    assert_eq!(locations(&p), HashSet::from(["body.id", "body.age"]));
    assert_eq!(p.detail, "2 fields failed validation");
}

#[test]
fn test_valid_body_passes_and_stays_readable() {
    let v = validator();
    let mut req = create_pet(r#"{"id":"p1","name":"Rex","age":3}"#);
    let outcome = v.validate(&mut req);
    assert!(outcome.is_valid(), "{outcome:?}");
    assert_eq!(outcome.route().unwrap().operation_id(), "createPet");
    assert_eq!(req.body.bytes(), br#"{"id":"p1","name":"Rex","age":3}"#);
}

#[test]
fn test_nullable_field_accepts_null_but_not_numbers() {
    let v = validator();
    assert!(v
        .validate(&mut create_pet(r#"{"id":"1","name":"x","nickname":null}"#))
        .is_valid());
    assert!(v
        .validate(&mut create_pet(r#"{"id":"1","name":"x","nickname":"Rexy"}"#))
        .is_valid());
    let p = problem(v.validate(&mut create_pet(r#"{"id":"1","name":"x","nickname":5}"#)));
    assert_eq!(locations(&p), HashSet::from(["body.nickname"]));
}

#[test]
fn test_streamed_body_is_buffered_for_downstream() {
    let v = validator();
    let payload = br#"{"id":"1","name":"x"}"#.to_vec();
    let mut req = ValidationRequest::new("POST", "/pets")
        .with_header("Authorization", "Bearer t")
        .with_stream(Cursor::new(payload.clone()));
    assert!(v.validate(&mut req).is_valid());
    assert_eq!(req.body.bytes(), payload.as_slice());
}

#[test]
fn test_required_body_must_be_present() {
    let v = validator();
    let mut req = ValidationRequest::new("POST", "/pets").with_header("Authorization", "Bearer t");
    let p = problem(v.validate(&mut req));
    assert_eq!(p.status, 400);
    assert_eq!(p.errors[0].location, "body");
    assert_eq!(p.errors[0].message, "Request body is required");

    let p = problem(v.validate(&mut create_pet("   \n")));
    assert_eq!(p.errors[0].location, "body");
}

#[test]
fn test_optional_body_may_be_omitted() {
    let v = validator();
    let mut req = ValidationRequest::new("POST", "/adoptions");
    assert!(v.validate(&mut req).is_valid());
}

#[test]
fn test_malformed_json_is_rejected() {
    let v = validator();
    let p = problem(v.validate(&mut create_pet(r#"{"id": "1","#)));
    assert_eq!(p.status, 400);
    assert_eq!(p.errors[0].location, "body");
    assert!(p.errors[0].message.starts_with("Malformed JSON"));
}

#[test]
fn test_discriminated_one_of() {
    let v = validator();
    let adopt = |body: &str| {
        ValidationRequest::new("POST", "/adoptions")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    };
    assert!(v.validate(&mut adopt(r#"{"petType":"dog","bark":true}"#)).is_valid());
    assert!(v.validate(&mut adopt(r#"{"petType":"cat","meow":false}"#)).is_valid());

    let p = problem(v.validate(&mut adopt(r#"{"petType":"dog","meow":true}"#)));
    assert_eq!(p.status, 400);
    assert!(p.errors.iter().all(|e| e.location.starts_with("body")));
    let bark = p
        .errors
        .iter()
        .find(|e| e.location == "body.bark")
        .unwrap_or_else(|| panic!("no body.bark entry in {:?}", p.errors));
    assert_eq!(bark.fix.as_deref(), Some("Add the required field 'bark'"));
    assert!(locations(&p).contains("body.petType"), "{:?}", p.errors);
}

#[test]
fn test_evaluator_branches_flatten_to_fields() {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "pet": {"oneOf": [
                {"type": "object", "required": ["bark"]},
                {"type": "object", "required": ["meow"], "properties": {"lives": {"type": "integer", "maximum": 9}}}
            ]}
        }
    });
    let compiled = jsonschema::validator_for(&schema).unwrap();
    let out = evaluate(&compiled, &serde_json::json!({"pet": {"lives": 12}}));
    let errors = flatten_output(&out, "body");
    assert_eq!(errors[0].location, "body.pet");
    assert_eq!(errors[0].fix, None);
    let found: HashSet<(&str, Option<&str>)> = errors[1..]
        .iter()
        .map(|e| (e.location.as_str(), e.fix.as_deref()))
        .collect();
    assert_eq!(
        found,
        HashSet::from([
            ("body.pet.bark", Some("Add the required field 'bark'")),
            ("body.pet.meow", Some("Add the required field 'meow'")),
            ("body.pet.lives", Some("Decrease 'lives' to at most the maximum allowed value")),
        ])
    );
    assert_eq!(errors.len(), 4);
}

const BINARY_TREE_SPEC: &str = r#"
openapi: 3.1.0
info: { title: Trees, version: "1" }
components:
  schemas:
    Node:
      type: object
      required: [value]
      properties:
        value: { type: integer }
        label: { type: string, contentEncoding: base64 }
        secret: { type: string, format: password }
        left: { $ref: '#/components/schemas/Node' }
        right: { $ref: '#/components/schemas/Node' }
paths:
  /trees:
    post:
      operationId: plantTree
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: '#/components/schemas/Node' }
      responses: { "201": { description: planted } }
"#;

#[test]
fn test_two_way_recursive_schema_compiles_and_validates() {
    let v = RequestValidator::from_spec_str(BINARY_TREE_SPEC, ValidationConfig::default()).unwrap();
    let plant = |body: &str| {
        ValidationRequest::new("POST", "/trees")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    };
    let tree = r#"{"value":1,"left":{"value":2,"right":{"value":3}},"right":{"value":4}}"#;
    assert!(v.validate(&mut plant(tree)).is_valid());

    let p = problem(v.validate(&mut plant(r#"{"value":1,"left":{"right":{"value":"x"}}}"#)));
    assert_eq!(locations(&p), HashSet::from(["body.left.value", "body.left.right.value"]));

    let p = problem(v.validate(&mut plant(r#"{"value":1,"label":"%%%"}"#)));
    assert_eq!(locations(&p), HashSet::from(["body.label"]));

    let rules = v.redaction().get("plantTree").unwrap();
    assert_eq!(
        rules.redact_request(br#"{"value":1,"secret":"s"}"#),
        r#"{"value":1,"secret":"[REDACTED]"}"#
    );
}

#[test]
fn test_bearer_required_by_global_security() {
    let v = validator();
    let mut req = ValidationRequest::new("POST", "/pets").with_body(r#"{"id":"1","name":"x"}"#);
    let p = problem(v.validate(&mut req));
    assert_eq!(p.status, 401);
    assert_eq!(p.type_uri, "/errors/auth/unauthorized");
    assert_eq!(p.detail, "A valid Bearer token is required in the Authorization header");

    let mut req = create_pet(r#"{"id":"1","name":"x"}"#).with_header("Authorization", "Basic abc");
    assert_eq!(problem(v.validate(&mut req)).status, 401);
}

#[test]
fn test_empty_security_is_public() {
    let v = validator();
    let mut req = ValidationRequest::new("GET", "/pets");
    assert!(v.validate(&mut req).is_valid());
}

#[test]
fn test_security_alternatives_or() {
    let v = validator();
    let mut by_key = ValidationRequest::new("GET", "/pets/mine").with_header("X-API-Key", "k");
    assert!(v.validate(&mut by_key).is_valid());

    let mut by_cookie = ValidationRequest::new("GET", "/pets/mine").with_header("Cookie", "session=s1");
    assert!(v.validate(&mut by_cookie).is_valid());

    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets/mine")));
    assert_eq!(p.status, 401);
    assert_eq!(p.detail, "Authentication required");
}

#[test]
fn test_security_requirement_and() {
    let v = validator();
    let mut one = ValidationRequest::new("DELETE", "/pets/1").with_header("X-API-Key", "k");
    assert_eq!(problem(v.validate(&mut one)).status, 401);

    let mut both = ValidationRequest::new("DELETE", "/pets/1")
        .with_header("X-API-Key", "k")
        .with_header("X-Tenant", "acme");
    assert!(v.validate(&mut both).is_valid());
}

#[test]
fn test_query_integer_bounds() {
    let v = validator();
    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets?limit=0")));
    assert_eq!(locations(&p), HashSet::from(["query.limit"]));

    assert!(v.validate(&mut ValidationRequest::new("GET", "/pets?limit=50")).is_valid());

    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets?limit=abc")));
    assert_eq!(locations(&p), HashSet::from(["query.limit"]));
}

#[test]
fn test_parameter_errors_accumulate() {
    let v = validator();
    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets?limit=0&ids=1|x&filter[size]=big")));
    assert_eq!(
        locations(&p),
        HashSet::from(["query.limit", "query.ids[1]", "query.filter.size"])
    );
}

#[test]
fn test_query_styles_decode() {
    let v = validator();
    for target in [
        "/pets?tags=a&tags=b&tags=c",
        "/pets?ids=1|2|3",
        "/pets?filter[color]=red&filter[size]=3",
    ] {
        let outcome = v.validate(&mut ValidationRequest::new("GET", target));
        assert!(outcome.is_valid(), "{target}: {outcome:?}");
    }
}

#[test]
fn test_empty_query_values() {
    let v = validator();
    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets?q=")));
    assert_eq!(p.errors[0].location, "query.q");
    assert_eq!(p.errors[0].message, "Empty value is not allowed");

    assert!(v.validate(&mut ValidationRequest::new("GET", "/pets?flag=")).is_valid());
}

#[test]
fn test_path_parameter_is_coerced_and_checked() {
    let v = validator();
    let mut ok = ValidationRequest::new("GET", "/pets/42").with_header("X-Trace-Id", "abcd");
    let outcome = v.validate(&mut ok);
    assert!(outcome.is_valid(), "{outcome:?}");
    assert_eq!(outcome.route().unwrap().get_path_param("petId"), Some("42"));

    let mut bad = ValidationRequest::new("GET", "/pets/rex").with_header("X-Trace-Id", "abcd");
    let p = problem(v.validate(&mut bad));
    assert_eq!(locations(&p), HashSet::from(["path.petId"]));
}

#[test]
fn test_header_parameters() {
    let v = validator();
    let p = problem(v.validate(&mut ValidationRequest::new("GET", "/pets/1")));
    assert_eq!(p.errors[0].location, "header.X-Trace-Id");
    assert_eq!(p.errors[0].fix.as_deref(), Some("Provide the 'X-Trace-Id' header parameter"));

    let mut short = ValidationRequest::new("GET", "/pets/1").with_header("x-trace-id", "abc");
    let p = problem(v.validate(&mut short));
    assert_eq!(locations(&p), HashSet::from(["header.X-Trace-Id"]));
}

#[test]
fn test_cookie_parameter_enum() {
    let v = validator();
    let mut ok = ValidationRequest::new("GET", "/pets/1/photos/p9").with_header("Cookie", "theme=dark; other=1");
    assert!(v.validate(&mut ok).is_valid());

    let mut bad = ValidationRequest::new("GET", "/pets/1/photos/p9").with_header("Cookie", "theme=blue");
    let p = problem(v.validate(&mut bad));
    assert_eq!(locations(&p), HashSet::from(["cookie.theme"]));
}

#[test]
fn test_unsupported_content_type() {
    let v = validator();
    let mut req = ValidationRequest::new("POST", "/adoptions")
        .with_header("Content-Type", "application/xml")
        .with_body("<dog/>");
    let p = problem(v.validate(&mut req));
    assert_eq!(p.status, 415);
    assert_eq!(p.type_uri, "/errors/validation/unsupported-media-type");
    assert_eq!(p.errors[0].location, "header.content-type");
}

#[test]
fn test_content_type_parameters_and_suffixes() {
    let v = validator();
    let mut charset = ValidationRequest::new("POST", "/adoptions")
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(r#"{"petType":"dog","bark":true}"#);
    assert!(v.validate(&mut charset).is_valid());

    let mut patch = ValidationRequest::new("POST", "/adoptions")
        .with_header("Content-Type", "application/merge-patch+json")
        .with_body(r#"{"petType":"dog"}"#);
    assert!(!v.validate(&mut patch).is_valid());
}

#[test]
fn test_non_json_body_skips_schema() {
    let v = validator();
    let mut req = ValidationRequest::new("PUT", "/uploads")
        .with_header("Content-Type", "text/plain")
        .with_body("just text");
    assert!(v.validate(&mut req).is_valid());
}

#[test]
fn test_encoded_content_leaves() {
    let v = validator();
    let upload = |data: &str| {
        ValidationRequest::new("PUT", "/uploads")
            .with_header("Content-Type", "application/json")
            .with_body(format!(r#"{{"files":[{{"name":"a","data":"eyJhIjoxfQ=="}},{{"name":"b","data":"{data}"}}]}}"#))
    };
    assert!(v.validate(&mut upload("W10=")).is_valid());

    let p = problem(v.validate(&mut upload("%%%")));
    assert_eq!(locations(&p), HashSet::from(["body.files[1].data"]));
    assert_eq!(p.errors[0].fix.as_deref(), Some("Provide a valid base64-encoded value"));

    // "not json" in base64
    let p = problem(v.validate(&mut upload("bm90IGpzb24=")));
    assert_eq!(p.errors[0].location, "body.files[1].data");
    assert_eq!(p.errors[0].fix.as_deref(), Some("Provide a valid JSON document"));
}

#[test]
fn test_unmatched_requests() {
    let v = validator();
    assert!(matches!(
        v.validate(&mut ValidationRequest::new("GET", "/unknown")),
        ValidationOutcome::NoMatch
    ));
    assert!(matches!(
        v.validate(&mut ValidationRequest::new("PATCH", "/pets")),
        ValidationOutcome::NoMatch
    ));
}

#[test]
fn test_body_size_limit() {
    let v = validator_with(ValidationConfig {
        max_body_bytes: 16,
        ..Default::default()
    });
    let p = problem(v.validate(&mut create_pet(r#"{"id":"1","name":"a long enough name"}"#)));
    assert_eq!(p.status, 400);
    assert!(p.detail.contains("exceeds the maximum of 16 bytes"));

    let mut streamed = ValidationRequest::new("POST", "/pets")
        .with_header("Authorization", "Bearer t")
        .with_stream(Cursor::new(vec![b' '; 1024]));
    assert_eq!(problem(v.validate(&mut streamed)).status, 400);
    assert_eq!(streamed.body.bytes().len(), 17);
}

#[test]
fn test_disabled_validation_only_routes() {
    let v = validator_with(ValidationConfig {
        enabled: false,
        ..Default::default()
    });
    let outcome = v.validate(&mut ValidationRequest::new("POST", "/pets").with_body("{"));
    assert_eq!(outcome.route().unwrap().operation_id(), "createPet");
    assert!(outcome.is_valid());
    assert!(matches!(
        v.validate(&mut ValidationRequest::new("GET", "/nope")),
        ValidationOutcome::NoMatch
    ));
}

#[test]
fn test_request_id_resolution() {
    let v = validator();
    let explicit = problem(v.validate(&mut create_pet("{}").with_request_id("req-explicit")));
    assert_eq!(explicit.request_id, "req-explicit");

    let from_header = problem(v.validate(&mut create_pet("{}").with_header("X-Request-Id", "req-header")));
    assert_eq!(from_header.request_id, "req-header");

    let generated = problem(v.validate(&mut create_pet("{}")));
    assert!(generated.request_id.starts_with("req_"));

    let custom = validator_with(ValidationConfig {
        request_id_header: "x-correlation-id".to_string(),
        ..Default::default()
    });
    let p = problem(custom.validate(&mut create_pet("{}").with_header("X-Correlation-Id", "corr-1")));
    assert_eq!(p.request_id, "corr-1");
}

#[test]
fn test_problem_document_shape() {
    let v = validator();
    let p = problem(v.validate(&mut create_pet(r#"{"name":"x"}"#).with_request_id("req-1")));
    let json = p.to_json();
    assert_eq!(json["type"], "/errors/validation/bad-request");
    assert_eq!(json["title"], "Bad Request");
    assert_eq!(json["status"], 400);
    assert_eq!(json["requestId"], "req-1");
    assert_eq!(json["detail"], "One field failed validation");
    assert_eq!(json["errors"][0]["location"], "body.id");
    assert_eq!(p.status_code(), http::StatusCode::BAD_REQUEST);
}

#[test]
fn test_validator_is_shared_across_threads() {
    let v = std::sync::Arc::new(validator());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let v = std::sync::Arc::clone(&v);
            std::thread::spawn(move || {
                let mut req = ValidationRequest::new("GET", &format!("/pets?limit={}", i * 40));
                v.validate(&mut req).is_valid()
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, true, true, false]);
}
