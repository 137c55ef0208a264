use async_graphql::{Context, Object, Result};
use chrono::Utc;

use crate::gql::error::{LeagueError, LeagueResultExt};
use crate::state::AppState;

use super::service;
use super::types::Season;

#[derive(Default)]
pub struct SeasonQuery;

#[Object]
impl SeasonQuery {
    /// The season currently accumulating points, if one is open
    async fn current_season(&self, ctx: &Context<'_>) -> Result<Option<Season>> {
        let state = ctx.data::<AppState>()?;

        match service::current_season(&state.db, Utc::now()).await {
            Ok(season) => Ok(Some(season.into())),
            Err(LeagueError::NoActiveSeason) => Ok(None),
            Err(e) => Err(e).into_gql(),
        }
    }
}
