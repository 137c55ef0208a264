pub mod group_memberships;
pub mod league_groups;
pub mod seasons;
pub mod user_season_points;
pub mod users;

pub use group_memberships::CreateMembership;
pub use league_groups::CreateLeagueGroup;
pub use seasons::CreateSeason;
pub use user_season_points::RecordAssignment;
pub use users::CreateUserData;
