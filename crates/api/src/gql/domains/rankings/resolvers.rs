use async_graphql::{Context, Object, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::gql::domains::seasons::service as season_service;
use crate::gql::error::{require_param, LeagueResultExt};
use crate::state::AppState;

use super::service;
use super::types::{FollowingRankings, FriendRanking, GroupLeaderboard, UserRankingInfo};

#[derive(Default)]
pub struct RankingQuery;

#[Object]
impl RankingQuery {
    /// Standings of the user's group, best first
    async fn leaderboard(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        season_id: Option<String>,
    ) -> Result<GroupLeaderboard> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;

        let board = service::leaderboard(&state.db, user_id, season_id, Utc::now())
            .await
            .into_gql()?;

        Ok(board.into())
    }

    /// The user's position in their group, or null before their first activity
    async fn user_ranking(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        season_id: Option<String>,
    ) -> Result<Option<UserRankingInfo>> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;

        let season_id = season_service::resolve_season_id(&state.db, season_id, Utc::now())
            .await
            .into_gql()?;
        let ranking = service::user_ranking(&state.db, user_id, &season_id)
            .await
            .into_gql()?;

        Ok(ranking.map(UserRankingInfo::from))
    }

    /// Rankings of the users this user follows, best first
    async fn following_rankings(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        season_id: Option<String>,
    ) -> Result<FollowingRankings> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;

        let rankings = service::following_rankings(
            &state.db,
            state.league().following_lookup_concurrency,
            user_id,
            season_id,
            Utc::now(),
        )
        .await
        .into_gql()?;

        Ok(FollowingRankings {
            rankings: rankings.into_iter().map(FriendRanking::from).collect(),
        })
    }
}
