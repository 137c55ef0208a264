pub mod resolvers;
pub mod tiers;
pub mod types;

pub use resolvers::LeagueQuery;
