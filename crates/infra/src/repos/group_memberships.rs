use crate::models::{GroupMembershipRow, MemberStandingRow};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub season_id: String,
    pub points: f64,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateMembership,
) -> SqlxResult<GroupMembershipRow> {
    sqlx::query_as::<_, GroupMembershipRow>(
        r#"
        INSERT INTO group_memberships (group_id, user_id, season_id, points)
        VALUES ($1, $2, $3, $4)
        RETURNING group_id, user_id, season_id, points, last_activity_at, joined_at
        "#,
    )
    .bind(data.group_id)
    .bind(data.user_id)
    .bind(&data.season_id)
    .bind(data.points)
    .fetch_one(executor)
    .await
}

pub async fn get_for_user_in_season<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
    user_id: Uuid,
) -> SqlxResult<Option<GroupMembershipRow>> {
    sqlx::query_as::<_, GroupMembershipRow>(
        r#"
        SELECT group_id, user_id, season_id, points, last_activity_at, joined_at
        FROM group_memberships
        WHERE season_id = $1 AND user_id = $2
        "#,
    )
    .bind(season_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
    user_id: Uuid,
) -> SqlxResult<bool> {
    let result = sqlx::query("DELETE FROM group_memberships WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Increment the group-local mirror of a user's season points.
pub async fn add_points<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
    user_id: Uuid,
    delta: f64,
    at: DateTime<Utc>,
) -> SqlxResult<Option<GroupMembershipRow>> {
    sqlx::query_as::<_, GroupMembershipRow>(
        r#"
        UPDATE group_memberships
        SET points = points + $3, last_activity_at = $4
        WHERE group_id = $1 AND user_id = $2
        RETURNING group_id, user_id, season_id, points, last_activity_at, joined_at
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .bind(delta)
    .bind(at)
    .fetch_optional(executor)
    .await
}

/// Members of a group, best first. Equal points fall back to join order.
pub async fn list_standings<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> SqlxResult<Vec<MemberStandingRow>> {
    sqlx::query_as::<_, MemberStandingRow>(
        r#"
        SELECT gm.user_id, u.username, gm.points, gm.last_activity_at
        FROM group_memberships gm
        INNER JOIN users u ON u.id = gm.user_id
        WHERE gm.group_id = $1
        ORDER BY gm.points DESC, gm.joined_at ASC, gm.user_id ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(executor)
    .await
}

pub async fn count_in_group<'e>(executor: impl PgExecutor<'e>, group_id: Uuid) -> SqlxResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM group_memberships WHERE group_id = $1")
        .bind(group_id)
        .fetch_one(executor)
        .await
}

/// Copy ledger totals onto membership mirrors that disagree with them.
pub async fn sync_points_from_ledger<'e>(
    executor: impl PgExecutor<'e>,
    season_id: &str,
) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE group_memberships gm
        SET points = usp.points, last_activity_at = usp.last_activity_at
        FROM user_season_points usp
        WHERE usp.season_id = gm.season_id
            AND usp.user_id = gm.user_id
            AND usp.group_id = gm.group_id
            AND gm.season_id = $1
            AND gm.points <> usp.points
        "#,
    )
    .bind(season_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
