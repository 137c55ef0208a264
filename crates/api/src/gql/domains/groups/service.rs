//! Group allocation and league transfers.
//!
//! Admission is optimistic: a cheap scan outside any transaction picks a
//! candidate group, then a transaction locks that group row, re-checks its
//! capacity and commits the seat. Losing the race yields `GroupFull`, which
//! [`retry_on_group_full`] absorbs with a bounded, jittered retry.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use infra::models::{LeagueGroupRow, GROUP_CAPACITY};
use infra::repos::{
    group_memberships, league_groups, seasons, user_season_points, users, CreateLeagueGroup,
    CreateMembership, RecordAssignment,
};

use crate::config::LeagueSettings;
use crate::gql::domains::leagues::tiers::validate_league;
use crate::gql::domains::seasons::service as season_service;
use crate::gql::error::LeagueError;

/// One admission request into a (season, league) pair.
#[derive(Debug, Clone)]
pub struct AssignParams {
    pub season_id: String,
    pub league: i32,
    pub user_id: Uuid,
    pub initial_points: f64,
}

#[derive(Debug, Clone)]
pub struct TransferParams {
    pub season_id: String,
    pub user_id: Uuid,
    pub from_group_id: Option<Uuid>,
    pub to_league: i32,
}

/// Outcome of a league change.
#[derive(Debug, Clone)]
pub struct LeagueChange {
    pub league: i32,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileReport {
    pub groups_repaired: u64,
    pub memberships_resynced: u64,
}

/// Occupancy after seating one more member: `(current_count, is_full)`.
pub fn next_occupancy(current_count: i32, capacity: i32) -> Result<(i32, bool), LeagueError> {
    if current_count >= capacity {
        return Err(LeagueError::GroupFull);
    }
    let current_count = current_count + 1;
    Ok((current_count, current_count >= capacity))
}

/// Exponential delay with equal jitter. `attempt` starts at 1 and `jitter`
/// is a sample from `[0, 1)`.
pub fn backoff_delay(attempt: u32, base: Duration, jitter: f64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let ceiling = base.saturating_mul(1 << exponent);
    let half = ceiling / 2;
    half + half.mul_f64(jitter.clamp(0.0, 1.0))
}

/// Re-run `attempt_fn` while it fails with `GroupFull`, at most
/// `allocation_max_attempts` times in total.
pub async fn retry_on_group_full<T, F, Fut>(
    settings: &LeagueSettings,
    mut attempt_fn: F,
) -> Result<T, LeagueError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LeagueError>>,
{
    let max_attempts = settings.allocation_max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_fn().await {
            Err(e) if e.is_group_full() && attempt < max_attempts => {
                let delay = backoff_delay(attempt, settings.allocation_backoff, rand::random());
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Group filled during admission, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_group_full() => {
                tracing::warn!(attempts = attempt, "Group admission still contended, giving up");
                return Err(e);
            }
            other => return other,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Non-transactional lookup: the oldest group with a free seat, or a new one.
async fn find_or_create_open_group(
    pool: &PgPool,
    season_id: &str,
    league: i32,
) -> Result<LeagueGroupRow, LeagueError> {
    if let Some(group) = league_groups::find_first_open(pool, season_id, league).await? {
        return Ok(group);
    }

    let group = league_groups::create(
        pool,
        CreateLeagueGroup {
            season_id: season_id.to_string(),
            league_number: league,
            capacity: GROUP_CAPACITY,
        },
    )
    .await?;
    tracing::info!(group_id = %group.id, season_id, league, "Opened new league group");

    Ok(group)
}

/// Seat a user in `group_id`. Must run inside a transaction; locks the group row.
async fn admit(
    conn: &mut PgConnection,
    group_id: Uuid,
    params: &AssignParams,
) -> Result<Uuid, LeagueError> {
    let group = league_groups::lock_by_id(&mut *conn, group_id)
        .await?
        .ok_or(LeagueError::NotFound("Group"))?;

    if let Some(seat) =
        league_groups::get_for_user_in_season(&mut *conn, &params.season_id, params.user_id)
            .await?
    {
        if seat.league_number == params.league {
            return Ok(seat.id);
        }
        // Seated in another tier since the lookup; the next attempt moves the seat.
        return Err(LeagueError::GroupFull);
    }

    if !group.has_spare_capacity() {
        return Err(LeagueError::GroupFull);
    }
    let (current_count, is_full) = next_occupancy(group.current_count, group.capacity)?;

    group_memberships::create(
        &mut *conn,
        CreateMembership {
            group_id: group.id,
            user_id: params.user_id,
            season_id: params.season_id.clone(),
            points: params.initial_points,
        },
    )
    .await?;
    league_groups::set_occupancy(&mut *conn, group.id, current_count, is_full).await?;
    user_season_points::record_assignment(
        &mut *conn,
        RecordAssignment {
            season_id: params.season_id.clone(),
            user_id: params.user_id,
            league: params.league,
            group_id: group.id,
            initial_points: params.initial_points,
        },
    )
    .await?;

    if !users::set_group(&mut *conn, params.user_id, params.league, group.id).await? {
        return Err(LeagueError::UserNotFound);
    }

    tracing::debug!(
        user_id = %params.user_id,
        group_id = %group.id,
        current_count,
        is_full,
        "User admitted to group"
    );
    Ok(group.id)
}

/// Give up a seat. The counter only moves when a membership was actually removed.
async fn leave_group(
    conn: &mut PgConnection,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<(), LeagueError> {
    if group_memberships::delete(&mut *conn, group_id, user_id).await? {
        league_groups::release_seat(&mut *conn, group_id).await?;
    }
    Ok(())
}

/// Single admission attempt. A user who already holds a seat of the requested
/// league this season gets that group back; a seat in another league is moved.
pub async fn assign(pool: &PgPool, params: &AssignParams) -> Result<Uuid, LeagueError> {
    validate_league(params.league)?;

    if let Some(seat) =
        league_groups::get_for_user_in_season(pool, &params.season_id, params.user_id).await?
    {
        if seat.league_number == params.league {
            return Ok(seat.id);
        }
        let move_params = TransferParams {
            season_id: params.season_id.clone(),
            user_id: params.user_id,
            from_group_id: Some(seat.id),
            to_league: params.league,
        };
        return transfer(pool, &move_params).await;
    }

    let candidate = find_or_create_open_group(pool, &params.season_id, params.league).await?;

    let mut tx = pool.begin().await?;
    let admitted = admit(&mut *tx, candidate.id, params).await;
    match admitted {
        Ok(group_id) => {
            tx.commit().await?;
            Ok(group_id)
        }
        // A concurrent request seated this user first.
        Err(LeagueError::Db(e)) if is_unique_violation(&e) => {
            tx.rollback().await?;
            let seat =
                league_groups::get_for_user_in_season(pool, &params.season_id, params.user_id)
                    .await?
                    .ok_or(LeagueError::Db(e))?;
            if seat.league_number == params.league {
                Ok(seat.id)
            } else {
                Err(LeagueError::GroupFull)
            }
        }
        Err(e) => Err(e),
    }
}

/// Move a user into a group of another league within one transaction:
/// leaving the old group and joining the new one commit or roll back together.
/// Points carried over are read under the ledger row lock.
pub async fn transfer(pool: &PgPool, params: &TransferParams) -> Result<Uuid, LeagueError> {
    validate_league(params.to_league)?;

    let current_group_id =
        group_memberships::get_for_user_in_season(pool, &params.season_id, params.user_id)
            .await?
            .map(|membership| membership.group_id)
            .or(params.from_group_id);

    let candidate = find_or_create_open_group(pool, &params.season_id, params.to_league).await?;

    let mut tx = pool.begin().await?;

    // Lock in id order so opposite transfers cannot deadlock.
    let mut lock_order: Vec<Uuid> = current_group_id.into_iter().collect();
    lock_order.push(candidate.id);
    lock_order.sort();
    lock_order.dedup();
    for group_id in &lock_order {
        league_groups::lock_by_id(&mut *tx, *group_id).await?;
    }

    let carried_points = user_season_points::lock(&mut *tx, &params.season_id, params.user_id)
        .await?
        .map(|row| row.points)
        .unwrap_or(0.0);

    let seat =
        group_memberships::get_for_user_in_season(&mut *tx, &params.season_id, params.user_id)
            .await?
            .map(|membership| membership.group_id);
    if seat.is_some() && seat != current_group_id {
        // Moved by a concurrent request after the lookup.
        return Err(LeagueError::GroupFull);
    }

    if let Some(old_group_id) = current_group_id {
        leave_group(&mut *tx, old_group_id, params.user_id).await?;
    }

    let assign_params = AssignParams {
        season_id: params.season_id.clone(),
        league: params.to_league,
        user_id: params.user_id,
        initial_points: carried_points,
    };
    let group_id = admit(&mut *tx, candidate.id, &assign_params).await?;
    users::set_league(&mut *tx, params.user_id, params.to_league).await?;

    tx.commit().await?;
    Ok(group_id)
}

/// Admin entry point: seat a user in a league for an explicit season.
pub async fn assign_user_to_group(
    pool: &PgPool,
    settings: &LeagueSettings,
    user_id: Uuid,
    league: i32,
    season_id: String,
) -> Result<Uuid, LeagueError> {
    validate_league(league)?;
    users::get_by_id(pool, user_id)
        .await?
        .ok_or(LeagueError::UserNotFound)?;
    seasons::get_by_id(pool, &season_id)
        .await?
        .ok_or(LeagueError::NotFound("Season"))?;

    let initial_points = user_season_points::get(pool, &season_id, user_id)
        .await?
        .map(|row| row.points)
        .unwrap_or(0.0);
    let params = AssignParams {
        season_id,
        league,
        user_id,
        initial_points,
    };

    let params = &params;
    retry_on_group_full(settings, move || assign(pool, params)).await
}

/// Change a user's league, moving them to a group of the new tier.
/// Asking for the league the user is already in changes nothing.
pub async fn update_user_league(
    pool: &PgPool,
    settings: &LeagueSettings,
    user_id: Uuid,
    new_league: i32,
    season_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<LeagueChange, LeagueError> {
    validate_league(new_league)?;
    let user = users::get_by_id(pool, user_id)
        .await?
        .ok_or(LeagueError::UserNotFound)?;

    if user.league == new_league {
        let group_id = match season_service::resolve_season_id(pool, season_id, now).await {
            Ok(season_id) => user_season_points::get(pool, &season_id, user_id)
                .await?
                .and_then(|row| row.group_id),
            Err(LeagueError::NoActiveSeason) => None,
            Err(e) => return Err(e),
        };
        return Ok(LeagueChange {
            league: new_league,
            group_id,
        });
    }

    let season_id = season_service::resolve_season_id(pool, season_id, now).await?;
    let current_group_id = user_season_points::get(pool, &season_id, user_id)
        .await?
        .and_then(|row| row.group_id);

    let params = TransferParams {
        season_id,
        user_id,
        from_group_id: current_group_id,
        to_league: new_league,
    };
    let params = &params;
    let group_id = retry_on_group_full(settings, move || transfer(pool, params)).await?;

    tracing::info!(
        %user_id,
        from_league = user.league,
        to_league = new_league,
        %group_id,
        "League transfer completed"
    );
    Ok(LeagueChange {
        league: new_league,
        group_id: Some(group_id),
    })
}

/// The group a user sits in for a season, if any.
pub async fn user_group(
    pool: &PgPool,
    user_id: Uuid,
    season_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<Option<LeagueGroupRow>, LeagueError> {
    let season_id = season_service::resolve_season_id(pool, season_id, now).await?;
    let Some(group_id) = user_season_points::get(pool, &season_id, user_id)
        .await?
        .and_then(|row| row.group_id)
    else {
        return Ok(None);
    };

    Ok(league_groups::get_by_id(pool, group_id).await?)
}

/// Repair drift left by interrupted writes: membership mirrors are reset to
/// the ledger totals, then group counters to the actual member counts.
pub async fn reconcile_season(
    pool: &PgPool,
    season_id: &str,
) -> Result<ReconcileReport, LeagueError> {
    seasons::get_by_id(pool, season_id)
        .await?
        .ok_or(LeagueError::NotFound("Season"))?;

    let mut tx = pool.begin().await?;
    let memberships_resynced =
        group_memberships::sync_points_from_ledger(&mut *tx, season_id).await?;
    let groups_repaired = league_groups::repair_counts(&mut *tx, season_id).await?;
    tx.commit().await?;

    tracing::info!(
        season_id,
        groups_repaired,
        memberships_resynced,
        "Season reconciliation finished"
    );
    Ok(ReconcileReport {
        groups_repaired,
        memberships_resynced,
    })
}
