use crate::models::LeagueGroupRow;
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateLeagueGroup {
    pub season_id: String,
    pub league_number: i32,
    pub capacity: i32,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateLeagueGroup,
) -> SqlxResult<LeagueGroupRow> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        INSERT INTO league_groups (season_id, league_number, capacity, current_count, is_full)
        VALUES ($1, $2, $3, 0, false)
        RETURNING id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        "#,
    )
    .bind(&data.season_id)
    .bind(data.league_number)
    .bind(data.capacity)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        SELECT id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        FROM league_groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// The group holding the user's seat in a season, if any.
pub async fn get_for_user_in_season<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
) -> SqlxResult<Option<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        SELECT g.id, g.season_id, g.league_number, g.capacity, g.current_count, g.is_full,
               g.created_at, g.updated_at
        FROM group_memberships gm
        INNER JOIN league_groups g ON g.id = gm.group_id
        WHERE gm.season_id = $1 AND gm.user_id = $2
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Re-read a group and hold its row lock until the surrounding transaction ends.
pub async fn lock_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        SELECT id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        FROM league_groups
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// First group of the pair with a free seat, oldest first.
pub async fn find_first_open<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    league_number: i32,
) -> SqlxResult<Option<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        SELECT id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        FROM league_groups
        WHERE season_id = $1
            AND league_number = $2
            AND is_full = false
            AND current_count < capacity
        ORDER BY created_at ASC, id ASC
        LIMIT 1
        "#,
    )
    .bind(season_id)
    .bind(league_number)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_season_league<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    league_number: i32,
) -> SqlxResult<Vec<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        SELECT id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        FROM league_groups
        WHERE season_id = $1 AND league_number = $2
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(season_id)
    .bind(league_number)
    .fetch_all(executor)
    .await
}

pub async fn set_occupancy<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    current_count: i32,
    is_full: bool,
) -> SqlxResult<LeagueGroupRow> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        UPDATE league_groups
        SET current_count = $2, is_full = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(current_count)
    .bind(is_full)
    .fetch_one(executor)
    .await
}

/// Give one seat back. The count never goes below zero.
pub async fn release_seat<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LeagueGroupRow>> {
    sqlx::query_as::<_, LeagueGroupRow>(
        r#"
        UPDATE league_groups
        SET current_count = GREATEST(current_count - 1, 0),
            is_full = false,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, season_id, league_number, capacity, current_count, is_full, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Recompute occupancy from the membership table for every group of a season
/// whose stored counters drifted. Returns the number of groups repaired.
pub async fn repair_counts<'e>(executor: impl PgExecutor<'e>, season_id: &str) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE league_groups g
        SET current_count = actual.member_count,
            is_full = actual.member_count >= g.capacity,
            updated_at = NOW()
        FROM (
            SELECT lg.id, COUNT(gm.user_id)::INTEGER AS member_count
            FROM league_groups lg
            LEFT JOIN group_memberships gm ON gm.group_id = lg.id
            WHERE lg.season_id = $1
            GROUP BY lg.id
        ) actual
        WHERE g.id = actual.id
            AND (g.current_count <> actual.member_count
                 OR g.is_full <> (actual.member_count >= g.capacity))
        "#,
    )
    .bind(season_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
