use async_graphql::SimpleObject;

use super::tiers::TierDef;

#[derive(SimpleObject, Clone, Debug)]
pub struct LeagueTier {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub description: String,
}

impl From<&TierDef> for LeagueTier {
    fn from(def: &TierDef) -> Self {
        Self {
            id: def.id,
            name: def.name.to_string(),
            color: def.color.to_string(),
            description: def.description.to_string(),
        }
    }
}
