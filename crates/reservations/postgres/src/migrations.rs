use sqlx::PgPool;

/// Create the reservations table and its indexes if they do not exist.
///
/// The partial unique index on `(analyst_id, slot_time)` is what makes a
/// second confirmed booking of a slot fail at the database.
pub async fn run_migrations(pool: &PgPool, prefix: &str) -> Result<(), sqlx::Error> {
    let table = format!("{prefix}reservations");

    let create_table = format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id               TEXT PRIMARY KEY,
            user_id          TEXT NOT NULL,
            analyst_id       TEXT NOT NULL,
            slot_time        TIMESTAMPTZ NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 30,
            status           TEXT NOT NULL,
            created_at       TIMESTAMPTZ NOT NULL,
            updated_at       TIMESTAMPTZ NOT NULL
        )
        "
    );

    sqlx::query(&create_table).execute(pool).await?;

    let indexes = [
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{prefix}reservations_confirmed_slot \
             ON {table} (analyst_id, slot_time) WHERE status = 'confirmed'"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}reservations_user \
             ON {table} (user_id, slot_time DESC)"
        ),
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    Ok(())
}
