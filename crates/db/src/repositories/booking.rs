use crate::models::{DbBooking, DbBookingWithSlot};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

const BOOKING_WITH_SLOT: &str = r#"
    SELECT b.id, b.slot_id, b.session_type_id, b.name, b.email, b.note, b.status, b.created_at,
           s.user_id AS slot_user_id,
           s.start_time AS slot_start_time,
           s.end_time AS slot_end_time,
           s.is_booked AS slot_is_booked,
           s.is_archived AS slot_is_archived,
           s.created_at AS slot_created_at
    FROM bookings b
    JOIN calendar_slots s ON s.id = b.slot_id
"#;

pub async fn create_booking(
    conn: &mut PgConnection,
    slot_id: Uuid,
    session_type_id: Uuid,
    name: &str,
    email: &str,
    note: Option<&str>,
) -> Result<DbBooking> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO bookings (id, slot_id, session_type_id, name, email, note, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'confirmed', $7)
        RETURNING id, slot_id, session_type_id, name, email, note, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(slot_id)
    .bind(session_type_id)
    .bind(name)
    .bind(email)
    .bind(note)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(booking)
}

pub async fn get_booking_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<DbBookingWithSlot>> {
    let booking = sqlx::query_as::<_, DbBookingWithSlot>(&format!(
        "{} WHERE b.id = $1",
        BOOKING_WITH_SLOT
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(booking)
}

/// Bookings on slots owned by the user, newest first.
pub async fn get_bookings_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<DbBookingWithSlot>> {
    let bookings = sqlx::query_as::<_, DbBookingWithSlot>(&format!(
        "{} WHERE s.user_id = $1 ORDER BY b.created_at DESC",
        BOOKING_WITH_SLOT
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(bookings)
}

/// Moves a confirmed booking to cancelled. Returns `None` for any other state.
pub async fn cancel_booking(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = 'cancelled'
        WHERE id = $1 AND status = 'confirmed'
        RETURNING id, slot_id, session_type_id, name, email, note, status, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(booking)
}

/// Re-points a booking at another slot, used to move cancelled bookings onto
/// their archived slot copy.
pub async fn move_booking_to_slot(
    conn: &mut PgConnection,
    id: Uuid,
    slot_id: Uuid,
) -> Result<DbBooking> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET slot_id = $2
        WHERE id = $1
        RETURNING id, slot_id, session_type_id, name, email, note, status, created_at
        "#,
    )
    .bind(id)
    .bind(slot_id)
    .fetch_one(conn)
    .await?;

    Ok(booking)
}

/// Confirmed bookings whose slot ended before `now` become expired.
pub async fn expire_bookings(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE bookings b
        SET status = 'expired'
        FROM calendar_slots s
        WHERE s.id = b.slot_id
          AND s.user_id = $1
          AND s.end_time < $2
          AND b.status = 'confirmed'
        "#,
    )
    .bind(user_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
