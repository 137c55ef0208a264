use async_graphql::{Object, Result};

use crate::gql::error::{require_param, LeagueResultExt};

use super::tiers;
use super::types::LeagueTier;

#[derive(Default)]
pub struct LeagueQuery;

#[Object]
impl LeagueQuery {
    /// Look up a single league tier (1 to 15)
    async fn league_info(&self, league_number: Option<i32>) -> Result<LeagueTier> {
        let league_number = require_param(league_number, "leagueNumber").into_gql()?;
        let tier = tiers::get_tier(league_number).into_gql()?;
        Ok(tier.into())
    }

    /// All league tiers, lowest first
    async fn all_leagues_info(&self) -> Vec<LeagueTier> {
        tiers::list_tiers().iter().map(LeagueTier::from).collect()
    }
}
