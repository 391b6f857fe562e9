use innkeep::envelope::{GENERIC_FAILURE, ResponseEnvelope, StatusCode, route_not_found};
use innkeep::errors::{FieldViolation, ServiceError};
use serde_json::json;

#[test]
fn success_body_omits_errors() {
    let body = serde_json::to_value(ResponseEnvelope::success("Room inserted successfully.", json!({ "inserted": {} })))
        .unwrap();
    assert_eq!(body, json!({ "success": true, "message": "Room inserted successfully.", "data": { "inserted": {} } }));
}

#[test]
fn each_error_kind_maps_to_its_status() {
    let cases = [
        (ServiceError::NotFound("room".into()), StatusCode::NOT_FOUND),
        (ServiceError::InvalidIdentifier("x".into()), StatusCode::BAD_REQUEST),
        (ServiceError::EmptyUpdate("room".into()), StatusCode::BAD_REQUEST),
        (ServiceError::Conflict { field: "phone".into(), value: "0911".into() }, StatusCode::CONFLICT),
        (ServiceError::Validation(vec![FieldViolation::new("type", json!("attic"), "bad")]), StatusCode::UNPROCESSABLE_ENTITY),
        (ServiceError::Unauthenticated(None), StatusCode::UNAUTHORIZED),
        (ServiceError::Unauthorized(None), StatusCode::FORBIDDEN),
        (ServiceError::Unknown("disk on fire".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
        let env = ResponseEnvelope::from(&err);
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.status(), status, "{err}");
    }
}

#[test]
fn unknown_errors_do_not_leak_details() {
    let env = ResponseEnvelope::from_error(&ServiceError::Unknown("connection string postgres://secret".into()));
    let text = serde_json::to_string(&env).unwrap();
    assert!(!text.contains("secret"));
    assert_eq!(env.errors.unwrap()[0].message, GENERIC_FAILURE);
}

#[test]
fn validation_entries_carry_field_and_value() {
    let err = ServiceError::Validation(vec![FieldViolation::new("occupancy", json!("busy"), "not allowed")]);
    let body = serde_json::to_value(ResponseEnvelope::from_error(&err)).unwrap();
    assert_eq!(body["errors"][0]["type"], "UNPROCESSABLE_ENTITY");
    assert_eq!(body["errors"][0]["field"], "occupancy");
    assert_eq!(body["errors"][0]["value"], "busy");
}

#[test]
fn unmatched_routes_name_the_url() {
    let env = route_not_found("GET", "/api/v1/spaceships");
    assert_eq!(env.status(), StatusCode::NOT_FOUND);
    let details = env.errors.unwrap()[0].details.clone().unwrap();
    assert!(details.as_str().unwrap().contains("[GET]:/api/v1/spaceships"));
}
