use crate::models::DbAvailabilityRule;
use chrono::{NaiveTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn create_rule(
    conn: &mut PgConnection,
    user_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    session_type_id: Option<Uuid>,
) -> Result<DbAvailabilityRule> {
    let rule = sqlx::query_as::<_, DbAvailabilityRule>(
        r#"
        INSERT INTO availability_rules (id, user_id, day_of_week, start_time, end_time, session_type_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, day_of_week, start_time, end_time, session_type_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(day_of_week)
    .bind(start_time)
    .bind(end_time)
    .bind(session_type_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(rule)
}

pub async fn get_rules_by_user_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<DbAvailabilityRule>> {
    let rules = sqlx::query_as::<_, DbAvailabilityRule>(
        r#"
        SELECT id, user_id, day_of_week, start_time, end_time, session_type_id, created_at
        FROM availability_rules
        WHERE user_id = $1
        ORDER BY day_of_week ASC, start_time ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rules)
}

pub async fn delete_rules_by_user_id(conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM availability_rules
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Users with at least one rule or override.
pub async fn get_known_user_ids(conn: &mut PgConnection) -> Result<Vec<Uuid>> {
    let user_ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT user_id FROM availability_rules
        UNION
        SELECT user_id FROM availability_overrides
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(user_ids)
}
