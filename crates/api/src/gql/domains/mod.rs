// Each domain contains: mod.rs, resolvers.rs, types.rs and, where it owns
// behaviour beyond lookups, service.rs

pub mod groups;
pub mod leagues;
pub mod points;
pub mod rankings;
pub mod seasons;
