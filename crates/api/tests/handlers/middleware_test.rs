use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use chrono::Duration;
use pretty_assertions::assert_eq;
use rstest::rstest;
use schedlite_api::middleware::auth::JwtVerifier;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_health_and_version() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));

    let response = ctx.server.get("/version").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["version"],
        json!(env!("CARGO_PKG_VERSION"))
    );
}

#[rstest]
#[case("/api/rules")]
#[case("/api/overrides")]
#[case("/api/slots/mine")]
#[case("/api/book/mine")]
#[case("/api/session-types")]
#[tokio::test]
async fn test_owner_endpoints_require_token(#[case] path: &str) {
    let ctx = TestContext::new();

    let response = ctx.server.get(path).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_rejects_bad_tokens() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();

    let foreign = JwtVerifier::new("someone-else")
        .issue(user_id, Duration::hours(1))
        .unwrap();
    for value in [
        format!("Bearer {}", foreign),
        "Bearer not.a.token".to_string(),
        "Basic dXNlcjpwYXNz".to_string(),
    ] {
        ctx.server
            .get("/api/rules")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&value).unwrap())
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let (name, value) = ctx.auth(Uuid::new_v4());

    let response = ctx
        .server
        .post("/api/rules")
        .add_header(name, value)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}
