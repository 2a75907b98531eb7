use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_session_type_crud() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    let response = ctx
        .server
        .post("/api/session-types")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "15 Minute Quick Call", "durationMinutes": 15, "priceCents": 0 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>();
    assert_eq!(created["userId"], json!(owner));
    assert_eq!(created["durationMinutes"], json!(15));

    let listed = ctx
        .server
        .get("/api/session-types")
        .add_header(name.clone(), value.clone())
        .await
        .json::<Vec<Value>>();
    assert_eq!(listed, vec![created.clone()]);

    let path = format!("/api/session-types/{}", created["id"].as_str().unwrap());
    let (other_name, other_value) = ctx.auth(Uuid::new_v4());
    ctx.server
        .delete(&path)
        .add_header(other_name, other_value)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx.server
        .delete(&path)
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();
    ctx.server
        .delete(&path)
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_type_validation() {
    let ctx = TestContext::new();
    let (name, value) = ctx.auth(Uuid::new_v4());

    for body in [
        json!({ "durationMinutes": 30 }),
        json!({ "name": "  ", "durationMinutes": 30 }),
        json!({ "name": "Call", "durationMinutes": 0 }),
        json!({ "name": "Call", "durationMinutes": 30, "priceCents": -100 }),
    ] {
        ctx.server
            .post("/api/session-types")
            .add_header(name.clone(), value.clone())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_session_type_in_use_cannot_be_deleted() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);
    let session_type = ctx.session_type(owner).await;

    ctx.server
        .post("/api/rules")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "schedule": [{
                "day": "Friday",
                "enabled": true,
                "blocks": [{ "start": "10:00", "end": "11:00", "sessionTypeId": session_type.id }]
            }]
        }))
        .await
        .assert_status_ok();

    ctx.server
        .delete(&format!("/api/session-types/{}", session_type.id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::CONFLICT);
}
