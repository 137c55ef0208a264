use async_graphql::{Context, Object, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::permissions::require_self_or_admin;
use crate::gql::error::{require_param, LeagueResultExt};
use crate::state::AppState;

use super::service;
use super::types::SubmitPointsResult;

#[derive(Default)]
pub struct PointsMutation;

#[Object]
impl PointsMutation {
    /// Record points earned (or lost) in the current season
    async fn submit_points(
        &self,
        ctx: &Context<'_>,
        user_id: Option<Uuid>,
        delta: Option<f64>,
    ) -> Result<SubmitPointsResult> {
        let state = ctx.data::<AppState>()?;
        let user_id = require_param(user_id, "userId").into_gql()?;
        let delta = service::validate_delta(delta).into_gql()?;
        require_self_or_admin(ctx, user_id).into_gql()?;

        let row = service::submit_points(&state.db, state.league(), user_id, delta, Utc::now())
            .await
            .into_gql()?;

        Ok(SubmitPointsResult {
            success: true,
            points: row.points,
        })
    }
}
