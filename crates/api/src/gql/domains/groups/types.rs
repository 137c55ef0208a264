use async_graphql::{SimpleObject, ID};

use infra::models::LeagueGroupRow;

use super::service::{LeagueChange, ReconcileReport};

/// A user's cohort for the season.
#[derive(SimpleObject, Clone, Debug)]
pub struct UserGroup {
    pub group_id: ID,
    pub league_number: i32,
    pub member_count: i32,
    pub capacity: i32,
    pub is_full: bool,
}

impl From<LeagueGroupRow> for UserGroup {
    fn from(row: LeagueGroupRow) -> Self {
        Self {
            group_id: row.id.into(),
            league_number: row.league_number,
            member_count: row.current_count,
            capacity: row.capacity,
            is_full: row.is_full,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct LeagueGroup {
    pub id: ID,
    pub season_id: String,
    pub league_number: i32,
    pub capacity: i32,
    pub current_count: i32,
    pub is_full: bool,
}

impl From<LeagueGroupRow> for LeagueGroup {
    fn from(row: LeagueGroupRow) -> Self {
        Self {
            id: row.id.into(),
            season_id: row.season_id,
            league_number: row.league_number,
            capacity: row.capacity,
            current_count: row.current_count,
            is_full: row.is_full,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct LeagueUpdateResult {
    pub success: bool,
    pub league: i32,
    pub group_id: Option<ID>,
}

impl From<LeagueChange> for LeagueUpdateResult {
    fn from(change: LeagueChange) -> Self {
        Self {
            success: true,
            league: change.league,
            group_id: change.group_id.map(Into::into),
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct GroupAssignmentResult {
    pub success: bool,
    pub group_id: ID,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct ReconcileResult {
    pub groups_repaired: i32,
    pub memberships_resynced: i32,
}

impl From<ReconcileReport> for ReconcileResult {
    fn from(report: ReconcileReport) -> Self {
        Self {
            groups_repaired: report.groups_repaired as i32,
            memberships_resynced: report.memberships_resynced as i32,
        }
    }
}
