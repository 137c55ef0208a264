use async_graphql::SimpleObject;

#[derive(SimpleObject, Clone, Debug)]
pub struct SubmitPointsResult {
    pub success: bool,
    /// Season total after this submission
    pub points: f64,
}
