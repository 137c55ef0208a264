use async_graphql::MergedObject;

use crate::gql::domains::groups::GroupMutation;
use crate::gql::domains::points::PointsMutation;

#[derive(MergedObject, Default)]
pub struct MutationRoot(GroupMutation, PointsMutation);
