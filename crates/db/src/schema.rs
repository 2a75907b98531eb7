use eyre::{Result, WrapErr};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

/// Idempotent DDL, applied in order.
const STATEMENTS: &[&str] = &[
    // Needed for the `user_id WITH =` part of the slot exclusion constraint.
    "CREATE EXTENSION IF NOT EXISTS btree_gist",
    r#"
    CREATE TABLE IF NOT EXISTS session_types (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL,
        name VARCHAR(255) NOT NULL,
        duration_minutes INTEGER NOT NULL,
        price_cents BIGINT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT positive_duration CHECK (duration_minutes > 0),
        CONSTRAINT non_negative_price CHECK (price_cents IS NULL OR price_cents >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS availability_rules (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL,
        day_of_week SMALLINT NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        session_type_id UUID NULL REFERENCES session_types(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_day_of_week CHECK (day_of_week BETWEEN 0 AND 6),
        CONSTRAINT valid_rule_range CHECK (end_time > start_time)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS availability_overrides (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL,
        date DATE NOT NULL,
        status VARCHAR(32) NOT NULL,
        start_time TIME NULL,
        end_time TIME NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT one_override_per_date UNIQUE (user_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendar_slots (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL,
        start_time TIMESTAMP WITH TIME ZONE NOT NULL,
        end_time TIMESTAMP WITH TIME ZONE NOT NULL,
        is_booked BOOLEAN NOT NULL DEFAULT FALSE,
        is_archived BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_slot_range CHECK (end_time > start_time),
        CONSTRAINT archived_slots_are_unbooked CHECK (NOT (is_archived AND is_booked)),
        CONSTRAINT no_overlapping_slots EXCLUDE USING gist (
            user_id WITH =,
            tstzrange(start_time, end_time, '[)') WITH &&
        ) WHERE (NOT is_archived)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slot_id UUID NOT NULL REFERENCES calendar_slots(id),
        session_type_id UUID NOT NULL REFERENCES session_types(id),
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        note TEXT NULL,
        status VARCHAR(32) NOT NULL DEFAULT 'confirmed',
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_booking_status CHECK (status IN ('confirmed', 'cancelled', 'expired')),
        CONSTRAINT one_booking_per_slot UNIQUE (slot_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_availability_rules_user_id ON availability_rules(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_availability_overrides_user_id ON availability_overrides(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_calendar_slots_user_id_start ON calendar_slots(user_id, start_time)",
    "CREATE INDEX IF NOT EXISTS idx_calendar_slots_open_start ON calendar_slots(start_time) WHERE is_booked = FALSE AND is_archived = FALSE",
    "CREATE INDEX IF NOT EXISTS idx_session_types_user_id ON session_types(user_id)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in STATEMENTS {
        debug!("Applying: {}", statement.trim());
        sqlx::query(statement)
            .execute(pool)
            .await
            .wrap_err_with(|| format!("Failed to apply schema statement: {}", statement.trim()))?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
