use crate::models::UserRow;
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub username: String,
    pub league: i32,
    pub friends: Vec<Uuid>,
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, league, current_group_id, friends, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateUserData,
) -> SqlxResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, league, friends)
        VALUES ($1, $2, $3)
        RETURNING id, username, league, current_group_id, friends, created_at, updated_at
        "#,
    )
    .bind(&data.username)
    .bind(data.league)
    .bind(&data.friends)
    .fetch_one(executor)
    .await
}

/// Mirror a fresh group assignment onto the profile.
pub async fn set_group<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    league: i32,
    group_id: Uuid,
) -> SqlxResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET league = $2, current_group_id = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(league)
    .bind(group_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_league<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    league: i32,
) -> SqlxResult<bool> {
    let result = sqlx::query("UPDATE users SET league = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(league)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
