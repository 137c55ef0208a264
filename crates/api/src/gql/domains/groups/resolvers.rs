use async_graphql::{Context, Object, Result};
use chrono::Utc;
use uuid::Uuid;

use infra::repos::league_groups;

use crate::auth::permissions::{require_admin, require_self_or_admin};
use crate::gql::error::{require_param, LeagueError, LeagueResultExt};
use crate::state::AppState;

use super::service;
use super::types::{
    GroupAssignmentResult, LeagueGroup, LeagueUpdateResult, ReconcileResult, UserGroup,
};

#[derive(Default)]
pub struct GroupQuery;

#[Object]
impl GroupQuery {
    /// The group a user belongs to this season, or null before their first activity
    async fn user_group(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        season_id: Option<String>,
    ) -> Result<Option<UserGroup>> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;

        let group = service::user_group(&state.db, user_id, season_id, Utc::now())
            .await
            .into_gql()?;

        Ok(group.map(UserGroup::from))
    }

    /// Occupancy details for one group
    async fn group_info(&self, ctx: &Context<'_>, group_id: Uuid) -> Result<Option<LeagueGroup>> {
        let state = ctx.data::<AppState>()?;

        let group = league_groups::get_by_id(&state.db, group_id)
            .await
            .map_err(LeagueError::from)
            .into_gql()?;

        Ok(group.map(LeagueGroup::from))
    }
}

#[derive(Default)]
pub struct GroupMutation;

#[Object]
impl GroupMutation {
    /// Move a user to another league tier (the user themselves or an admin)
    async fn update_user_league(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        new_league: Option<i32>,
        season_id: Option<String>,
    ) -> Result<LeagueUpdateResult> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;
        let new_league = require_param(new_league, "newLeague").into_gql()?;
        require_self_or_admin(ctx, user_id).into_gql()?;

        let change = service::update_user_league(
            &state.db,
            state.league(),
            user_id,
            new_league,
            season_id,
            Utc::now(),
        )
        .await
        .into_gql()?;

        Ok(change.into())
    }

    /// Seat a user in a group of the given league and season (admins only)
    async fn assign_user_to_group(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        league_number: Option<i32>,
        season_id: Option<String>,
    ) -> Result<GroupAssignmentResult> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;
        let league_number = require_param(league_number, "leagueNumber").into_gql()?;
        let season_id = require_param(season_id.filter(|id| !id.trim().is_empty()), "seasonId")
            .into_gql()?;
        require_admin(ctx).into_gql()?;

        let group_id = service::assign_user_to_group(
            &state.db,
            state.league(),
            user_id,
            league_number,
            season_id,
        )
        .await
        .into_gql()?;

        Ok(GroupAssignmentResult {
            success: true,
            group_id: group_id.into(),
        })
    }

    /// Repair occupancy counters and point mirrors for a season (admins only)
    async fn reconcile_season(
        &self,
        ctx: &Context<'_>,
        season_id: String,
    ) -> Result<ReconcileResult> {
        let state = ctx.data::<AppState>()?;
        require_admin(ctx).into_gql()?;

        let report = service::reconcile_season(&state.db, &season_id)
            .await
            .into_gql()?;

        Ok(report.into())
    }
}
