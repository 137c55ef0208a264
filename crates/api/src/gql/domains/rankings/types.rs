use async_graphql::{SimpleObject, ID};
use chrono::{DateTime, Utc};

use super::service::{Leaderboard, RankedMember, UserRanking};

#[derive(SimpleObject, Clone, Debug)]
pub struct LeaderboardEntry {
    pub user_id: ID,
    pub username: String,
    pub points: f64,
    pub position: i32, // 1-based, ties numbered in list order
    pub last_activity_at: DateTime<Utc>,
}

impl From<RankedMember> for LeaderboardEntry {
    fn from(member: RankedMember) -> Self {
        Self {
            user_id: member.user_id.into(),
            username: member.username,
            points: member.points,
            position: member.position,
            last_activity_at: member.last_activity_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct GroupLeaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub group_id: Option<ID>,
    pub league_number: Option<i32>,
    pub season_id: String,
    pub total_members: i32,
}

impl From<Leaderboard> for GroupLeaderboard {
    fn from(board: Leaderboard) -> Self {
        let total_members = board.total_members();
        Self {
            entries: board.entries.into_iter().map(LeaderboardEntry::from).collect(),
            group_id: board.group_id.map(Into::into),
            league_number: board.league_number,
            season_id: board.season_id,
            total_members,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct UserRankingInfo {
    pub position: i32, // competition ranking: ties share a position
    pub group_id: ID,
    pub league_number: i32,
    pub points: f64,
    pub total_members: i32,
}

impl From<UserRanking> for UserRankingInfo {
    fn from(ranking: UserRanking) -> Self {
        Self {
            position: ranking.position,
            group_id: ranking.group_id.into(),
            league_number: ranking.league_number,
            points: ranking.points,
            total_members: ranking.total_members,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct FriendRanking {
    pub user_id: ID,
    pub username: String,
    pub position: i32,
    pub group_id: ID,
    pub league_number: i32,
    pub points: f64,
    pub total_members: i32,
}

impl From<UserRanking> for FriendRanking {
    fn from(ranking: UserRanking) -> Self {
        Self {
            user_id: ranking.user_id.into(),
            username: ranking.username,
            position: ranking.position,
            group_id: ranking.group_id.into(),
            league_number: ranking.league_number,
            points: ranking.points,
            total_members: ranking.total_members,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct FollowingRankings {
    pub rankings: Vec<FriendRanking>,
}
