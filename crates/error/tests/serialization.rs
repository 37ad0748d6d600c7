use homesales_error::{ErrorCode, ErrorContext, HomeSalesError};
use serde_json::Value;

#[test]
fn test_json_serialization() {
    let error = HomeSalesError::new(ErrorCode::FieldNotFound, "Field 'bedroom' not found")
        .with_context(ErrorContext::FieldNotFound {
            field: "bedroom".to_string(),
            view: Some("home_sales".to_string()),
            available_fields: vec!["bedrooms".to_string(), "bathrooms".to_string()],
        })
        .with_hint("Did you mean 'bedrooms'?");

    let json = error.to_json();
    let v: Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(v["code"], "HS-2002");
    assert_eq!(v["message"], "Field 'bedroom' not found");
    assert_eq!(v["hint"], "Did you mean 'bedrooms'?");
    assert_eq!(v["context"]["type"], "field_not_found");
    assert_eq!(v["context"]["view"], "home_sales");
}

#[test]
fn test_json_roundtrip_preserves_code() {
    let error = HomeSalesError::new(ErrorCode::QueryTimeout, "Query timed out after 1 seconds")
        .with_context(ErrorContext::Timeout {
            timeout_seconds: 1,
            sql: "SELECT 1".to_string(),
        });

    let back: HomeSalesError = serde_json::from_str(&error.to_json_pretty()).expect("roundtrip");
    assert_eq!(back.code, ErrorCode::QueryTimeout);
    assert!(matches!(
        back.context,
        Some(ErrorContext::Timeout {
            timeout_seconds: 1,
            ..
        })
    ));
}

#[test]
fn test_error_code_parsing() {
    let code: ErrorCode = "HS-4002".to_string().try_into().unwrap();
    assert_eq!(code, ErrorCode::PartitionColumnMissing);
}
