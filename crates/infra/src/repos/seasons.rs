use crate::models::SeasonRow;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};

#[derive(Debug, Clone)]
pub struct CreateSeason {
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: &str,
) -> SqlxResult<Option<SeasonRow>> {
    sqlx::query_as::<_, SeasonRow>(
        r#"
        SELECT id, start_at, end_at, status, created_at
        FROM seasons
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Season referenced by the singleton pointer, whatever its status.
pub async fn get_current<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<Option<SeasonRow>> {
    sqlx::query_as::<_, SeasonRow>(
        r#"
        SELECT s.id, s.start_at, s.end_at, s.status, s.created_at
        FROM current_season cs
        INNER JOIN seasons s ON s.id = cs.season_id
        WHERE cs.singleton = true
        "#,
    )
    .fetch_optional(executor)
    .await
}

/// Insert a season window. Concurrent creators of the same window all get
/// the stored row back.
pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateSeason,
) -> SqlxResult<SeasonRow> {
    sqlx::query_as::<_, SeasonRow>(
        r#"
        INSERT INTO seasons (id, start_at, end_at, status)
        VALUES ($1, $2, $3, 'active')
        ON CONFLICT (id) DO UPDATE SET status = seasons.status
        RETURNING id, start_at, end_at, status, created_at
        "#,
    )
    .bind(&data.id)
    .bind(data.start_at)
    .bind(data.end_at)
    .fetch_one(executor)
    .await
}

pub async fn set_current<'e>(executor: impl PgExecutor<'e>, season_id: &str) -> SqlxResult<()> {
    sqlx::query(
        r#"
        INSERT INTO current_season (singleton, season_id)
        VALUES (true, $1)
        ON CONFLICT (singleton) DO UPDATE SET
            season_id = EXCLUDED.season_id,
            updated_at = NOW()
        "#,
    )
    .bind(season_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn mark_inactive<'e>(executor: impl PgExecutor<'e>, season_id: &str) -> SqlxResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE seasons
        SET status = 'inactive'
        WHERE id = $1 AND status = 'active'
        "#,
    )
    .bind(season_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
