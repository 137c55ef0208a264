use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::UserSeasonPointsRow;
use infra::repos::{group_memberships, user_season_points, users};

use crate::config::LeagueSettings;
use crate::gql::domains::groups::service::{self as group_service, AssignParams};
use crate::gql::domains::seasons::service as season_service;
use crate::gql::error::LeagueError;

/// A delta must be present and a finite number; negative values are allowed.
pub fn validate_delta(delta: Option<f64>) -> Result<f64, LeagueError> {
    match delta {
        None => Err(LeagueError::MissingParams("delta")),
        Some(value) if !value.is_finite() => Err(LeagueError::NonNumericDelta),
        Some(value) => Ok(value),
    }
}

/// Add `delta` to a user's season total, seating them in a group on their
/// first activity of the season.
///
/// The ledger row and the membership mirror are incremented in one
/// transaction with in-place `points + delta` updates, so concurrent
/// submissions for the same user cannot drop an increment.
pub async fn submit_points(
    pool: &PgPool,
    settings: &LeagueSettings,
    user_id: Uuid,
    delta: f64,
    now: DateTime<Utc>,
) -> Result<UserSeasonPointsRow, LeagueError> {
    let delta = validate_delta(Some(delta))?;
    let season = season_service::ensure_current_season(pool, now).await?;
    let user = users::get_by_id(pool, user_id)
        .await?
        .ok_or(LeagueError::UserNotFound)?;

    let ledger = user_season_points::get(pool, &season.id, user_id).await?;
    if ledger.is_none() {
        user_season_points::create_if_absent(pool, &season.id, user_id, user.league).await?;
    }

    if ledger.as_ref().and_then(|row| row.group_id).is_none() {
        let params = AssignParams {
            season_id: season.id.clone(),
            league: user.league,
            user_id,
            initial_points: ledger.as_ref().map(|row| row.points).unwrap_or(0.0),
        };
        let params = &params;
        let group_id = group_service::retry_on_group_full(settings, move || {
            group_service::assign(pool, params)
        })
        .await?;
        tracing::info!(%user_id, %group_id, season_id = %season.id, "First activity of the season");
    }

    let mut tx = pool.begin().await?;
    let row = user_season_points::add_points(&mut *tx, &season.id, user_id, delta, now)
        .await?
        .ok_or(LeagueError::NotFound("Season points"))?;
    if let Some(group_id) = row.group_id {
        let mirrored =
            group_memberships::add_points(&mut *tx, group_id, user_id, delta, now).await?;
        if mirrored.is_none() {
            tracing::warn!(%user_id, %group_id, "Ledger has no matching group membership");
        }
    }
    tx.commit().await?;

    Ok(row)
}
