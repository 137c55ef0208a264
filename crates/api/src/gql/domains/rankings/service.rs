use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{LeagueGroupRow, MemberStandingRow};
use infra::repos::{group_memberships, league_groups, user_season_points, users};

use crate::gql::domains::seasons::service as season_service;
use crate::gql::error::LeagueError;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedMember {
    pub user_id: Uuid,
    pub username: String,
    pub points: f64,
    pub position: i32,
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub season_id: String,
    pub group_id: Option<Uuid>,
    pub league_number: Option<i32>,
    pub entries: Vec<RankedMember>,
}

impl Leaderboard {
    fn empty(season_id: String) -> Self {
        Self {
            season_id,
            group_id: None,
            league_number: None,
            entries: Vec::new(),
        }
    }

    pub fn total_members(&self) -> i32 {
        self.entries.len() as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRanking {
    pub user_id: Uuid,
    pub username: String,
    pub position: i32,
    pub group_id: Uuid,
    pub league_number: i32,
    pub points: f64,
    pub total_members: i32,
}

/// Competition ranking: one more than the number of strictly better scores,
/// so tied scores share a position.
pub fn competition_position(points: f64, field: impl IntoIterator<Item = f64>) -> i32 {
    field.into_iter().filter(|other| *other > points).count() as i32 + 1
}

/// Order members by points (highest first) and number them 1, 2, 3...
/// Ties keep the order the store returned them in.
pub fn ordinal_standings(mut members: Vec<MemberStandingRow>) -> Vec<RankedMember> {
    members.sort_by(|a, b| b.points.total_cmp(&a.points));
    members
        .into_iter()
        .enumerate()
        .map(|(index, member)| RankedMember {
            user_id: member.user_id,
            username: member.username,
            points: member.points,
            position: index as i32 + 1,
            last_activity_at: member.last_activity_at,
        })
        .collect()
}

pub fn sort_by_points_desc(rankings: &mut [UserRanking]) {
    rankings.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

/// Read a group and its members from one consistent snapshot.
async fn group_snapshot(
    pool: &PgPool,
    group_id: Uuid,
) -> Result<Option<(LeagueGroupRow, Vec<MemberStandingRow>)>, LeagueError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let snapshot = match league_groups::get_by_id(&mut *tx, group_id).await? {
        Some(group) => {
            let standings = group_memberships::list_standings(&mut *tx, group_id).await?;
            Some((group, standings))
        }
        None => None,
    };
    tx.commit().await?;

    Ok(snapshot)
}

/// The standings of the user's group. Users without a group get an empty board.
pub async fn leaderboard(
    pool: &PgPool,
    user_id: Uuid,
    season_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<Leaderboard, LeagueError> {
    let season_id = season_service::resolve_season_id(pool, season_id, now).await?;

    let Some(group_id) = user_season_points::get(pool, &season_id, user_id)
        .await?
        .and_then(|row| row.group_id)
    else {
        return Ok(Leaderboard::empty(season_id));
    };

    let Some((group, standings)) = group_snapshot(pool, group_id).await? else {
        return Ok(Leaderboard::empty(season_id));
    };

    Ok(Leaderboard {
        season_id,
        group_id: Some(group.id),
        league_number: Some(group.league_number),
        entries: ordinal_standings(standings),
    })
}

/// A user's competition-ranked position inside their group, or `None`
/// when they have no group this season.
pub async fn user_ranking(
    pool: &PgPool,
    user_id: Uuid,
    season_id: &str,
) -> Result<Option<UserRanking>, LeagueError> {
    let Some(ledger) = user_season_points::get(pool, season_id, user_id).await? else {
        return Ok(None);
    };
    let Some(group_id) = ledger.group_id else {
        return Ok(None);
    };
    let Some((group, standings)) = group_snapshot(pool, group_id).await? else {
        return Ok(None);
    };

    let mine = standings.iter().find(|member| member.user_id == user_id);
    let points = mine.map(|member| member.points).unwrap_or(ledger.points);
    let username = match mine {
        Some(member) => member.username.clone(),
        None => users::get_by_id(pool, user_id)
            .await?
            .map(|user| user.username)
            .unwrap_or_default(),
    };

    Ok(Some(UserRanking {
        user_id,
        username,
        position: competition_position(points, standings.iter().map(|member| member.points)),
        group_id: group.id,
        league_number: group.league_number,
        points,
        total_members: standings.len() as i32,
    }))
}

/// Rankings of everyone the user follows, best first. Friends without a
/// season record, or whose lookup fails, are left out.
pub async fn following_rankings(
    pool: &PgPool,
    concurrency: usize,
    user_id: Uuid,
    season_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<Vec<UserRanking>, LeagueError> {
    let Some(user) = users::get_by_id(pool, user_id).await? else {
        return Ok(Vec::new());
    };
    if user.friends.is_empty() {
        return Ok(Vec::new());
    }

    let season_id = match season_service::resolve_season_id(pool, season_id, now).await {
        Ok(season_id) => season_id,
        Err(LeagueError::NoActiveSeason) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let season_id = season_id.as_str();

    let mut rankings: Vec<UserRanking> = stream::iter(user.friends)
        .map(|friend_id| async move { (friend_id, user_ranking(pool, friend_id, season_id).await) })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(friend_id, result)| async move {
            match result {
                Ok(ranking) => ranking,
                Err(e) => {
                    tracing::debug!(%friend_id, error = %e, "Skipping friend ranking");
                    None
                }
            }
        })
        .collect()
        .await;

    sort_by_points_desc(&mut rankings);
    Ok(rankings)
}
