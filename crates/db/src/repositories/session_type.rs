use crate::models::DbSessionType;
use chrono::Utc;
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn create_session_type(
    conn: &mut PgConnection,
    user_id: Uuid,
    name: &str,
    duration_minutes: i32,
    price_cents: Option<i64>,
) -> Result<DbSessionType> {
    let session_type = sqlx::query_as::<_, DbSessionType>(
        r#"
        INSERT INTO session_types (id, user_id, name, duration_minutes, price_cents, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, name, duration_minutes, price_cents, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(duration_minutes)
    .bind(price_cents)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(session_type)
}

pub async fn get_session_type_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<DbSessionType>> {
    let session_type = sqlx::query_as::<_, DbSessionType>(
        r#"
        SELECT id, user_id, name, duration_minutes, price_cents, created_at
        FROM session_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(session_type)
}

pub async fn get_session_types_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<DbSessionType>> {
    let session_types = sqlx::query_as::<_, DbSessionType>(
        r#"
        SELECT id, user_id, name, duration_minutes, price_cents, created_at
        FROM session_types
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(session_types)
}

/// Foreign keys from rules and bookings make this fail while the type is in use.
pub async fn delete_session_type(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM session_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}
