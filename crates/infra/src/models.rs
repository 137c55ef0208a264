use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed number of seats in every league group.
pub const GROUP_CAPACITY: i32 = 20;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub league: i32,
    pub current_group_id: Option<Uuid>,
    pub friends: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeasonRow {
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SeasonRow {
    /// A season counts as active until its window closes, even if nobody
    /// has flipped the stored status yet.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && now < self.end_at
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeagueGroupRow {
    pub id: Uuid,
    pub season_id: String,
    pub league_number: i32,
    pub capacity: i32,
    pub current_count: i32,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeagueGroupRow {
    pub fn has_spare_capacity(&self) -> bool {
        !self.is_full && self.current_count < self.capacity
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupMembershipRow {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub season_id: String,
    pub points: f64,
    pub last_activity_at: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

/// Membership joined with the member's display name, used by leaderboards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberStandingRow {
    pub user_id: Uuid,
    pub username: String,
    pub points: f64,
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSeasonPointsRow {
    pub season_id: String,
    pub user_id: Uuid,
    pub league: i32,
    pub group_id: Option<Uuid>,
    pub points: f64,
    pub last_activity_at: DateTime<Utc>,
}
