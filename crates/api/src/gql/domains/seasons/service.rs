use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use sqlx::PgPool;

use infra::models::SeasonRow;
use infra::repos::{seasons, CreateSeason};

use crate::gql::error::LeagueError;

/// The Monday 00:00 UTC to next Monday 00:00 UTC window containing `now`.
pub fn week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_from_monday);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(7))
}

/// Seasons are named after the ISO week they start in, e.g. `2026-W42`.
pub fn season_id_for(start_at: DateTime<Utc>) -> String {
    let week = start_at.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Read-path lookup: the singleton season if its window is still open.
/// Never creates a season.
pub async fn current_season(pool: &PgPool, now: DateTime<Utc>) -> Result<SeasonRow, LeagueError> {
    match seasons::get_current(pool).await? {
        Some(season) if season.is_active_at(now) => Ok(season),
        _ => Err(LeagueError::NoActiveSeason),
    }
}

/// Use the caller's season id when given, otherwise the active season.
pub async fn resolve_season_id(
    pool: &PgPool,
    season_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<String, LeagueError> {
    match season_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => Ok(id),
        None => Ok(current_season(pool, now).await?.id),
    }
}

/// Write-path lookup: returns the active season, opening the current week's
/// window (and retiring the previous one) when none is open.
pub async fn ensure_current_season(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<SeasonRow, LeagueError> {
    if let Some(season) = seasons::get_current(pool).await? {
        if season.is_active_at(now) {
            return Ok(season);
        }
    }

    let (start_at, end_at) = week_window(now);
    let mut tx = pool.begin().await?;

    let previous = seasons::get_current(&mut *tx).await?;
    let season = seasons::create(
        &mut *tx,
        CreateSeason {
            id: season_id_for(start_at),
            start_at,
            end_at,
        },
    )
    .await?;

    if let Some(previous) = previous.filter(|p| p.id != season.id) {
        seasons::mark_inactive(&mut *tx, &previous.id).await?;
    }
    seasons::set_current(&mut *tx, &season.id).await?;

    tx.commit().await?;

    tracing::info!(season_id = %season.id, end_at = %season.end_at, "Season window opened");
    Ok(season)
}
