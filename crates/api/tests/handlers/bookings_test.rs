use axum::http::StatusCode;
use chrono::{Datelike, Duration, Utc, Weekday};
use fake::{
    Fake,
    faker::{internet::en::SafeEmail, name::en::Name},
};
use pretty_assertions::assert_eq;
use schedlite_core::models::slot::SlotRange;
use schedlite_core::store::SchedulingStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::TestContext;

fn booking_request(slot_id: impl serde::Serialize, session_type_id: Uuid) -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "slotId": slot_id,
        "sessionTypeId": session_type_id,
        "name": name,
        "email": email,
        "note": "Looking forward to it"
    })
}

/// Monday rule, generate, book, double-book, cancel.
#[tokio::test]
async fn test_monday_booking_lifecycle() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);

    let session_type = ctx
        .server
        .post("/api/session-types")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Consultation", "durationMinutes": 180 }))
        .await
        .json::<Value>();
    let session_type_id: Uuid = serde_json::from_value(session_type["id"].clone()).unwrap();

    ctx.server
        .post("/api/rules")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "schedule": [{ "day": "Monday", "enabled": true, "blocks": [{ "start": "09:00", "end": "12:00" }] }]
        }))
        .await
        .assert_status_ok();

    let slots = ctx
        .server
        .get("/api/slots/available")
        .add_query_param("userId", owner)
        .await
        .json::<Vec<Value>>();
    let first = &slots[0];
    let start: chrono::DateTime<Utc> = first["startTime"].as_str().unwrap().parse().unwrap();
    let end: chrono::DateTime<Utc> = first["endTime"].as_str().unwrap().parse().unwrap();
    assert_eq!(start.weekday(), Weekday::Mon);
    assert_eq!(end - start, Duration::hours(3));
    assert_eq!(
        slots
            .iter()
            .filter(|s| s["startTime"].as_str().unwrap().starts_with(&start.date_naive().to_string()))
            .count(),
        1
    );

    let response = ctx
        .server
        .post("/api/book")
        .json(&booking_request(&first["id"], session_type_id))
        .await;
    response.assert_status(StatusCode::CREATED);
    let booking = response.json::<Value>();
    assert_eq!(booking["status"], json!("confirmed"));
    assert_eq!(booking["slotId"], first["id"]);

    ctx.server
        .post("/api/book")
        .json(&booking_request(&first["id"], session_type_id))
        .await
        .assert_status(StatusCode::CONFLICT);

    let mine = ctx
        .server
        .get("/api/slots/mine")
        .add_header(name.clone(), value.clone())
        .await
        .json::<Vec<Value>>();
    let booked = mine.iter().find(|s| s["id"] == first["id"]).unwrap();
    assert_eq!(booked["isBooked"], json!(true));

    let response = ctx
        .server
        .patch(&format!("/api/book/{}/cancel", booking["id"].as_str().unwrap()))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let cancelled = response.json::<Value>();
    assert_eq!(cancelled["status"], json!("cancelled"));
    assert_ne!(cancelled["slotId"], first["id"]);

    let mine = ctx
        .server
        .get("/api/slots/mine")
        .add_header(name.clone(), value.clone())
        .await
        .json::<Vec<Value>>();
    let released = mine.iter().find(|s| s["id"] == first["id"]).unwrap();
    assert_eq!(released["isBooked"], json!(false));
    assert_eq!(released["isArchived"], json!(false));
    assert_eq!(released["booking"], Value::Null);

    // The reopened slot takes a new booking; the cancelled one stays listed.
    ctx.server
        .post("/api/book")
        .json(&booking_request(&first["id"], session_type_id))
        .await
        .assert_status(StatusCode::CREATED);

    let bookings = ctx
        .server
        .get("/api/book/mine")
        .add_header(name, value)
        .await
        .json::<Vec<Value>>();
    assert_eq!(bookings.len(), 2);
    let history = bookings
        .iter()
        .find(|b| b["status"] == json!("cancelled"))
        .unwrap();
    assert_eq!(history["slot"]["isArchived"], json!(true));
    assert_eq!(history["slot"]["startTime"], first["startTime"]);
    let live = bookings
        .iter()
        .find(|b| b["status"] == json!("confirmed"))
        .unwrap();
    assert_eq!(live["slotId"], first["id"]);
}

#[tokio::test]
async fn test_booking_validation() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let session_type = ctx.session_type(owner).await;
    let slot = ctx.slot(owner, 24).await;
    let past = ctx.slot(owner, -5).await;

    let mut bad_email = booking_request(slot.id, session_type.id);
    bad_email["email"] = json!("not-an-email");
    let mut missing_name = booking_request(slot.id, session_type.id);
    missing_name["name"] = Value::Null;
    let foreign_type = booking_request(slot.id, ctx.session_type(Uuid::new_v4()).await.id);

    for body in [bad_email, missing_name, foreign_type] {
        ctx.server
            .post("/api/book")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    ctx.server
        .post("/api/book")
        .json(&booking_request(past.id, session_type.id))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    ctx.server
        .post("/api/book")
        .json(&booking_request(Uuid::new_v4(), session_type.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(!ctx.store.slot_by_id(slot.id).await.unwrap().unwrap().is_booked);
}

#[tokio::test]
async fn test_cancel_requires_slot_owner() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (owner_name, owner_value) = ctx.auth(owner);
    let (other_name, other_value) = ctx.auth(Uuid::new_v4());
    let session_type = ctx.session_type(owner).await;
    let slot = ctx.slot(owner, 24).await;

    let booking = ctx
        .server
        .post("/api/book")
        .json(&booking_request(slot.id, session_type.id))
        .await
        .json::<Value>();
    let cancel_path = format!("/api/book/{}/cancel", booking["id"].as_str().unwrap());

    ctx.server
        .patch(&cancel_path)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    ctx.server
        .patch(&cancel_path)
        .add_header(other_name, other_value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    ctx.server
        .patch(&format!("/api/book/{}/cancel", Uuid::new_v4()))
        .add_header(owner_name.clone(), owner_value.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(ctx.store.slot_by_id(slot.id).await.unwrap().unwrap().is_booked);

    ctx.server
        .patch(&cancel_path)
        .add_header(owner_name.clone(), owner_value.clone())
        .await
        .assert_status_ok();
    ctx.server
        .patch(&cancel_path)
        .add_header(owner_name, owner_value)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_my_bookings_expire_ended_slots() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();
    let (name, value) = ctx.auth(owner);
    let session_type = ctx.session_type(owner).await;

    // Booked while it was still upcoming, then the clock moved on.
    let start = Utc::now() - Duration::hours(3);
    let ended = ctx
        .store
        .insert_slot(owner, SlotRange::new(start, start + Duration::hours(1)).unwrap())
        .await
        .unwrap();
    ctx.store
        .insert_booking(schedlite_core::models::booking::NewBooking {
            slot_id: ended.id,
            session_type_id: session_type.id,
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            note: None,
        })
        .await
        .unwrap();
    let upcoming = ctx.slot(owner, 24).await;
    ctx.server
        .post("/api/book")
        .json(&booking_request(upcoming.id, session_type.id))
        .await
        .assert_status(StatusCode::CREATED);

    for _ in 0..2 {
        let bookings = ctx
            .server
            .get("/api/book/mine")
            .add_header(name.clone(), value.clone())
            .await
            .json::<Vec<Value>>();
        assert_eq!(bookings.len(), 2);
        // Newest first.
        assert_eq!(bookings[0]["slotId"], json!(upcoming.id));
        assert_eq!(bookings[0]["status"], json!("confirmed"));
        assert_eq!(bookings[1]["slotId"], json!(ended.id));
        assert_eq!(bookings[1]["status"], json!("expired"));
        assert_eq!(bookings[1]["slot"]["id"], json!(ended.id));
    }
}
