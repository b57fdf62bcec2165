use std::collections::BTreeMap;
use serde_json::json;

use agentcore_chat::error::request_id_from_headers;
use agentcore_chat::{Error, HttpError};

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String>
{   pairs.iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
}

#[test]
fn forbidden_response_builds_transport_error()
{   let err = HttpError::from_parts(
      403
    , Some("Forbidden")
    , headers(&[("x-amzn-requestid", "abc-123")])
    , r#"{"message":"Forbidden","errorCode":"ACCESS_DENIED"}"#
    );
    assert_eq!(err.status, 403);
    assert_eq!(err.message, "Forbidden");
    assert_eq!(err.error_code.as_deref(), Some("ACCESS_DENIED"));
    assert_eq!(err.request_id.as_deref(), Some("abc-123"));
    assert_eq!(
      err.details,
      Some(json!({"message": "Forbidden", "errorCode": "ACCESS_DENIED"}))
    );
}

#[test]
fn message_falls_back_in_order()
{   let err = HttpError::from_parts(
      500, Some("Internal Server Error"), BTreeMap::new()
    , r#"{"error":"boom","code":"E1","details":{"step":"invoke"}}"#
    );
    assert_eq!(err.message, "boom");
    assert_eq!(err.error_code.as_deref(), Some("E1"));
    assert_eq!(err.details, Some(json!({"step": "invoke"})));

    let err = HttpError::from_parts(
      502, Some("Bad Gateway"), BTreeMap::new(), "<html>oops</html>"
    );
    assert_eq!(err.message, "Bad Gateway");
    assert_eq!(err.details, None);
    assert_eq!(err.error_code, None);

    let err = HttpError::from_parts(599, None, BTreeMap::new(), "");
    assert_eq!(err.message, "Request failed");
}

#[test]
fn numeric_error_code_is_kept()
{   let err = HttpError::from_parts(
      500, Some("Internal Server Error"), BTreeMap::new()
    , r#"{"message":"throttled","code":429}"#
    );
    assert_eq!(err.message, "throttled");
    assert_eq!(err.error_code.as_deref(), Some("429"));
    assert_eq!(err.to_string(), "throttled (status 500) [429]");

    let err = HttpError::from_parts(
      500, None, BTreeMap::new(), r#"{"errorCode":0,"code":"E2"}"#
    );
    assert_eq!(err.error_code.as_deref(), Some("E2"));
}

#[test]
fn request_id_header_variants_in_priority_order()
{   let h = headers(&[
      ("x-request-id", "second")
    , ("x-amzn-request-id", "third")
    ]);
    assert_eq!(request_id_from_headers(&h).as_deref(), Some("second"));

    let h = headers(&[("X-Amzn-RequestId", "mixed-case")]);
    assert_eq!(request_id_from_headers(&h).as_deref(), Some("mixed-case"));

    let h = headers(&[("x-amzn-requestid", ""), ("x-amzn-request-id", "x")]);
    assert_eq!(request_id_from_headers(&h).as_deref(), Some("x"));

    assert_eq!(request_id_from_headers(&BTreeMap::new()), None);
}

#[test]
fn transport_error_is_distinguishable()
{   let http = HttpError::from_parts(
      401, Some("Unauthorized"), headers(&[("x-request-id", "r-9")]), "{}"
    );
    let err = Error::from(http);
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.request_id(), Some("r-9"));
    assert_eq!(err.to_string(), "Unauthorized (status 401)");

    let wrapped = Error::invocation("connection refused");
    assert!(!wrapped.is_transport());
    assert_eq!(wrapped.to_string(), "Failed to invoke agent: connection refused");
}
