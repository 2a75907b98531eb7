use crate::models::{DbCalendarSlot, DbSlotWithBooking};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn create_slot(
    conn: &mut PgConnection,
    user_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<DbCalendarSlot> {
    let slot = sqlx::query_as::<_, DbCalendarSlot>(
        r#"
        INSERT INTO calendar_slots (id, user_id, start_time, end_time, is_booked, is_archived, created_at)
        VALUES ($1, $2, $3, $4, FALSE, FALSE, $5)
        RETURNING id, user_id, start_time, end_time, is_booked, is_archived, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(start_time)
    .bind(end_time)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(slot)
}

pub async fn get_slot_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbCalendarSlot>> {
    let slot = sqlx::query_as::<_, DbCalendarSlot>(
        r#"
        SELECT id, user_id, start_time, end_time, is_booked, is_archived, created_at
        FROM calendar_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(slot)
}

/// Serializes slot rewrites for one user until the surrounding transaction ends.
pub async fn lock_user_slots(conn: &mut PgConnection, user_id: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended(($1::uuid)::text, 0))")
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Deletes the user's open slots starting at or after `now`. A slot with no
/// active booking is open; archived history rows are never touched.
pub async fn delete_reclaimable_slots(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM calendar_slots s
        WHERE s.user_id = $1
          AND s.start_time >= $2
          AND s.is_booked = FALSE
          AND s.is_archived = FALSE
          AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.slot_id = s.id)
        "#,
    )
    .bind(user_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Live slots of the user that have not ended yet.
pub async fn get_unfinished_slots_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<DbCalendarSlot>> {
    let slots = sqlx::query_as::<_, DbCalendarSlot>(
        r#"
        SELECT id, user_id, start_time, end_time, is_booked, is_archived, created_at
        FROM calendar_slots
        WHERE user_id = $1 AND end_time > $2 AND is_archived = FALSE
        ORDER BY start_time ASC
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(conn)
    .await?;

    Ok(slots)
}

pub async fn get_available_slots(
    conn: &mut PgConnection,
    user_id: Option<Uuid>,
    from: DateTime<Utc>,
) -> Result<Vec<DbCalendarSlot>> {
    let slots = sqlx::query_as::<_, DbCalendarSlot>(
        r#"
        SELECT id, user_id, start_time, end_time, is_booked, is_archived, created_at
        FROM calendar_slots
        WHERE is_booked = FALSE
          AND is_archived = FALSE
          AND start_time >= $1
          AND ($2::uuid IS NULL OR user_id = $2)
        ORDER BY start_time ASC
        "#,
    )
    .bind(from)
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(slots)
}

/// Live slots of the user, latest first, each with its booking if any.
pub async fn get_slots_with_bookings_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<DbSlotWithBooking>> {
    let slots = sqlx::query_as::<_, DbSlotWithBooking>(
        r#"
        SELECT s.id, s.user_id, s.start_time, s.end_time, s.is_booked, s.is_archived, s.created_at,
               b.id AS booking_id,
               b.session_type_id AS booking_session_type_id,
               b.name AS booking_name,
               b.email AS booking_email,
               b.note AS booking_note,
               b.status AS booking_status,
               b.created_at AS booking_created_at
        FROM calendar_slots s
        LEFT JOIN bookings b ON b.slot_id = s.id
        WHERE s.user_id = $1 AND s.is_archived = FALSE
        ORDER BY s.start_time DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(slots)
}

/// Flips an open slot to booked. Returns false when it is booked, archived
/// or does not exist.
pub async fn mark_slot_booked(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE calendar_slots
        SET is_booked = TRUE
        WHERE id = $1 AND is_booked = FALSE AND is_archived = FALSE
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Inserts an archived copy of the slot to hold booking history and returns
/// its id.
pub async fn create_archived_copy(conn: &mut PgConnection, id: Uuid) -> Result<Uuid> {
    let (archived_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO calendar_slots (id, user_id, start_time, end_time, is_booked, is_archived, created_at)
        SELECT $2, user_id, start_time, end_time, FALSE, TRUE, created_at
        FROM calendar_slots
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(Uuid::new_v4())
    .fetch_one(conn)
    .await?;

    Ok(archived_id)
}

pub async fn release_slot(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE calendar_slots
        SET is_booked = FALSE
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Deletes the slot if it is open.
pub async fn delete_unbooked_slot(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM calendar_slots s
        WHERE s.id = $1
          AND s.is_booked = FALSE
          AND s.is_archived = FALSE
          AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.slot_id = s.id)
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
