use crate::models::DbAvailabilityOverride;
use chrono::{NaiveDate, NaiveTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn create_override(
    conn: &mut PgConnection,
    user_id: Uuid,
    date: NaiveDate,
    status: &str,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<DbAvailabilityOverride> {
    let entry = sqlx::query_as::<_, DbAvailabilityOverride>(
        r#"
        INSERT INTO availability_overrides (id, user_id, date, status, start_time, end_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, date, status, start_time, end_time, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(status)
    .bind(start_time)
    .bind(end_time)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(entry)
}

/// Inserts the override or replaces the user's existing one for `date`.
pub async fn upsert_override(
    conn: &mut PgConnection,
    user_id: Uuid,
    date: NaiveDate,
    status: &str,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<DbAvailabilityOverride> {
    let entry = sqlx::query_as::<_, DbAvailabilityOverride>(
        r#"
        INSERT INTO availability_overrides (id, user_id, date, status, start_time, end_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, date) DO UPDATE
        SET status = EXCLUDED.status,
            start_time = EXCLUDED.start_time,
            end_time = EXCLUDED.end_time,
            created_at = EXCLUDED.created_at
        RETURNING id, user_id, date, status, start_time, end_time, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(status)
    .bind(start_time)
    .bind(end_time)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(entry)
}

pub async fn get_overrides_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<DbAvailabilityOverride>> {
    let overrides = sqlx::query_as::<_, DbAvailabilityOverride>(
        r#"
        SELECT id, user_id, date, status, start_time, end_time, created_at
        FROM availability_overrides
        WHERE user_id = $1
        ORDER BY date ASC, created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(overrides)
}

pub async fn delete_overrides_by_user_id(conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM availability_overrides
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
