use axum::http::StatusCode;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::TestContext;

fn monday_morning() -> Value {
    json!({
        "schedule": [
            { "day": "Monday", "enabled": true, "blocks": [{ "start": "09:00", "end": "12:00" }] },
            { "day": "Tuesday", "enabled": false, "blocks": [{ "start": "09:00", "end": "12:00" }] }
        ]
    })
}

fn start_of(slot: &Value) -> DateTime<Utc> {
    slot["startTime"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_save_rules_materializes_slots() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    let response = ctx
        .server
        .post("/api/rules")
        .add_header(name.clone(), value.clone())
        .json(&monday_morning())
        .await;
    response.assert_status_ok();
    let saved = response.json::<Value>();
    assert_eq!(saved["rules"], json!(1));
    assert!(saved["slots"]["inserted"].as_u64().unwrap() >= 4);

    let rules = ctx
        .server
        .get("/api/rules")
        .add_header(name, value)
        .await
        .json::<Vec<Value>>();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["dayOfWeek"], json!(1));
    assert_eq!(rules[0]["startTime"], json!("09:00"));
    assert_eq!(rules[0]["endTime"], json!("12:00"));

    let slots = ctx
        .server
        .get("/api/slots/available")
        .add_query_param("userId", owner)
        .await
        .json::<Vec<Value>>();
    assert!(slots.len() >= 4);
    for slot in &slots {
        let start = start_of(slot);
        assert_eq!(start.weekday(), Weekday::Mon);
        assert_eq!((start.hour(), start.minute()), (9, 0));
        assert_eq!(slot["isBooked"], json!(false));
    }
}

#[tokio::test]
async fn test_invalid_schedule_is_rejected_without_writes() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    for body in [
        json!({}),
        json!({ "schedule": [{ "day": "Someday", "enabled": true, "blocks": [] }] }),
        json!({ "schedule": [{ "day": "Monday", "enabled": true, "blocks": [{ "start": "9", "end": "12:00" }] }] }),
        json!({ "schedule": [{ "day": "Monday", "enabled": true, "blocks": [{ "start": "12:00", "end": "09:00" }] }] }),
    ] {
        ctx.server
            .post("/api/rules")
            .add_header(name.clone(), value.clone())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let rules = ctx
        .server
        .get("/api/rules")
        .add_header(name, value)
        .await
        .json::<Vec<Value>>();
    assert!(rules.is_empty());
}

#[tokio::test]
async fn test_override_replaces_rules_for_its_date() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    ctx.server
        .post("/api/rules")
        .add_header(name.clone(), value.clone())
        .json(&monday_morning())
        .await
        .assert_status_ok();

    let available = |ctx: &TestContext| {
        ctx.server
            .get("/api/slots/available")
            .add_query_param("userId", owner)
    };
    let before = available(&ctx).await.json::<Vec<Value>>();
    let last_monday = start_of(before.last().unwrap()).date_naive();

    let response = ctx
        .server
        .post("/api/overrides")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "date": last_monday.to_string(),
            "status": "custom",
            "start": "13:00",
            "end": "15:00"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["status"], json!("custom"));

    let after = available(&ctx).await.json::<Vec<Value>>();
    assert_eq!(after.len(), before.len());
    let moved = start_of(after.last().unwrap());
    assert_eq!(moved.date_naive(), last_monday);
    assert_eq!(moved.hour(), 13);

    let overrides = ctx
        .server
        .get("/api/overrides")
        .add_header(name, value)
        .await
        .json::<Vec<Value>>();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0]["date"], json!(last_monday.to_string()));
}

#[tokio::test]
async fn test_bulk_save_with_unavailable_override() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    let response = ctx
        .server
        .post("/api/slots/bulk")
        .add_header(name.clone(), value.clone())
        .json(&monday_morning())
        .await;
    response.assert_status(StatusCode::CREATED);
    let all_mondays = response.json::<Value>()["slots"]["inserted"].as_u64().unwrap();

    let first_monday = {
        let slots = ctx
            .server
            .get("/api/slots/available")
            .add_query_param("userId", owner)
            .await
            .json::<Vec<Value>>();
        start_of(&slots[0]).date_naive()
    };

    let mut body = monday_morning();
    body["overrides"] = json!([{ "date": first_monday.to_string(), "status": "unavailable" }]);
    let response = ctx
        .server
        .post("/api/slots/bulk")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    let saved = response.json::<Value>();
    assert_eq!(saved["overrides"], json!(1));
    assert_eq!(saved["slots"]["inserted"].as_u64().unwrap(), all_mondays - 1);

    let slots = ctx
        .server
        .get("/api/slots/available")
        .add_query_param("userId", owner)
        .await
        .json::<Vec<Value>>();
    assert!(slots.iter().all(|s| start_of(s).date_naive() != first_monday));
}

#[tokio::test]
async fn test_granting_override_needs_times() {
    let ctx = TestContext::new();
    let (name, value) = ctx.auth(Uuid::new_v4());

    ctx.server
        .post("/api/overrides")
        .add_header(name, value)
        .json(&json!({ "date": "2030-01-14", "status": "available" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
