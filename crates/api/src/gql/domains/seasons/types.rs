use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};

use infra::models::SeasonRow;

#[derive(SimpleObject, Clone, Debug)]
pub struct Season {
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
}

impl From<SeasonRow> for Season {
    fn from(row: SeasonRow) -> Self {
        Self {
            id: row.id,
            start_at: row.start_at,
            end_at: row.end_at,
            status: row.status,
        }
    }
}
