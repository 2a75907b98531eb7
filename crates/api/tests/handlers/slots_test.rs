use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use pretty_assertions::assert_eq;
use schedlite_core::{models::booking::NewBooking, store::SchedulingStore};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::TestContext;

fn rfc3339(hours_from_now: i64) -> String {
    (Utc::now() + Duration::hours(hours_from_now)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[tokio::test]
async fn test_create_manual_slot() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    let response = ctx
        .server
        .post("/api/slots")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "startTime": rfc3339(24), "endTime": rfc3339(25) }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let slot = response.json::<Value>();
    assert_eq!(slot["userId"], json!(owner));
    assert_eq!(slot["isBooked"], json!(false));

    // Overlaps the first one.
    ctx.server
        .post("/api/slots")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "startTime": rfc3339(24), "endTime": rfc3339(26) }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Starts exactly when the first one ends.
    ctx.server
        .post("/api/slots")
        .add_header(name, value)
        .json(&json!({ "startTime": rfc3339(25), "endTime": rfc3339(26) }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_manual_slot_rejects_bad_times() {
    let ctx = TestContext::new();
    let (name, value) = ctx.auth(Uuid::new_v4());

    for body in [
        json!({}),
        json!({ "startTime": "tomorrow", "endTime": rfc3339(25) }),
        json!({ "startTime": rfc3339(25), "endTime": rfc3339(24) }),
    ] {
        ctx.server
            .post("/api/slots")
            .add_header(name.clone(), value.clone())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_available_slots_are_public_and_filtered() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    ctx.slot(owner, -3).await;
    let later = ctx.slot(owner, 48).await;
    let sooner = ctx.slot(owner, 24).await;
    ctx.slot(other, 24).await;

    let slots = ctx
        .server
        .get("/api/slots/available")
        .add_query_param("userId", owner)
        .await
        .json::<Vec<Value>>();
    let ids: Vec<_> = slots.iter().map(|s| s["id"].clone()).collect();
    assert_eq!(ids, vec![json!(sooner.id), json!(later.id)]);

    let everyone = ctx.server.get("/api/slots/available").await.json::<Vec<Value>>();
    assert_eq!(everyone.len(), 3);

    ctx.server
        .get("/api/slots/available")
        .add_query_param("userId", "not-a-uuid")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_my_slots_include_bookings() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);
    let session_type = ctx.session_type(owner).await;
    let open = ctx.slot(owner, 24).await;
    let booked = ctx.slot(owner, 48).await;
    ctx.store
        .insert_booking(NewBooking {
            slot_id: booked.id,
            session_type_id: session_type.id,
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            note: None,
        })
        .await
        .unwrap();

    let slots = ctx
        .server
        .get("/api/slots/mine")
        .add_header(name, value)
        .await
        .json::<Vec<Value>>();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["id"], json!(booked.id));
    assert_eq!(slots[0]["booking"]["name"], json!("Grace Hopper"));
    assert_eq!(slots[1]["id"], json!(open.id));
    assert_eq!(slots[1]["booking"], Value::Null);
}

#[tokio::test]
async fn test_delete_slot_rules() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (owner_name, owner_value) = ctx.auth(owner);
    let (other_name, other_value) = ctx.auth(Uuid::new_v4());
    let session_type = ctx.session_type(owner).await;
    let open = ctx.slot(owner, 24).await;
    let booked = ctx.slot(owner, 48).await;
    ctx.store
        .insert_booking(NewBooking {
            slot_id: booked.id,
            session_type_id: session_type.id,
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            note: None,
        })
        .await
        .unwrap();

    ctx.server
        .delete(&format!("/api/slots/{}", open.id))
        .add_header(other_name, other_value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    ctx.server
        .delete(&format!("/api/slots/{}", booked.id))
        .add_header(owner_name.clone(), owner_value.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    ctx.server
        .delete(&format!("/api/slots/{}", Uuid::new_v4()))
        .add_header(owner_name.clone(), owner_value.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.server
        .delete(&format!("/api/slots/{}", open.id))
        .add_header(owner_name, owner_value)
        .await
        .assert_status_ok();
    assert!(ctx.store.slot_by_id(open.id).await.unwrap().is_none());
    assert!(ctx.store.slot_by_id(booked.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_generate_slots_reports() {
    let ctx = TestContext::new();
    let (name, value) = ctx.auth(Uuid::new_v4());

    let response = ctx
        .server
        .post("/api/slots/generate")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "candidates": 0, "removed": 0, "inserted": 0, "skipped": 0 })
    );
}
