use async_graphql::MergedObject;

use crate::gql::domains::groups::GroupQuery;
use crate::gql::domains::leagues::LeagueQuery;
use crate::gql::domains::rankings::RankingQuery;
use crate::gql::domains::seasons::SeasonQuery;

#[derive(MergedObject, Default)]
pub struct QueryRoot(GroupQuery, LeagueQuery, RankingQuery, SeasonQuery);
