use crate::models::UserSeasonPointsRow;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RecordAssignment {
    pub season_id: String,
    pub user_id: Uuid,
    pub league: i32,
    pub group_id: Uuid,
    pub initial_points: f64,
}

pub async fn get<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
) -> SqlxResult<Option<UserSeasonPointsRow>> {
    sqlx::query_as::<_, UserSeasonPointsRow>(
        r#"
        SELECT season_id, user_id, league, group_id, points, last_activity_at
        FROM user_season_points
        WHERE season_id = $1 AND user_id = $2
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Read the ledger row and hold its lock until the transaction ends, so no
/// point submission lands between this read and the caller's writes.
pub async fn lock<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
) -> SqlxResult<Option<UserSeasonPointsRow>> {
    sqlx::query_as::<_, UserSeasonPointsRow>(
        r#"
        SELECT season_id, user_id, league, group_id, points, last_activity_at
        FROM user_season_points
        WHERE season_id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Open a zero-point ledger row. Returns false when the row already existed.
pub async fn create_if_absent<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
    league: i32,
) -> SqlxResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_season_points (season_id, user_id, league, points)
        VALUES ($1, $2, $3, 0)
        ON CONFLICT (season_id, user_id) DO NOTHING
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .bind(league)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Point the ledger row at a group, creating it with the initial points when absent.
/// Existing point totals are kept.
pub async fn record_assignment<'e>(
    executor: impl PgExecutor<'e>,
    data: RecordAssignment,
) -> SqlxResult<UserSeasonPointsRow> {
    sqlx::query_as::<_, UserSeasonPointsRow>(
        r#"
        INSERT INTO user_season_points (season_id, user_id, league, group_id, points)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (season_id, user_id) DO UPDATE SET
            league = EXCLUDED.league,
            group_id = EXCLUDED.group_id
        RETURNING season_id, user_id, league, group_id, points, last_activity_at
        "#,
    )
    .bind(&data.season_id)
    .bind(data.user_id)
    .bind(data.league)
    .bind(data.group_id)
    .bind(data.initial_points)
    .fetch_one(executor)
    .await
}

pub async fn add_points<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
    delta: f64,
    at: DateTime<Utc>,
) -> SqlxResult<Option<UserSeasonPointsRow>> {
    sqlx::query_as::<_, UserSeasonPointsRow>(
        r#"
        UPDATE user_season_points
        SET points = points + $3, last_activity_at = $4
        WHERE season_id = $1 AND user_id = $2
        RETURNING season_id, user_id, league, group_id, points, last_activity_at
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .bind(delta)
    .bind(at)
    .fetch_optional(executor)
    .await
}
