use crate::gql::error::LeagueError;

pub const MIN_LEAGUE: i32 = 1;
pub const MAX_LEAGUE: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDef {
    pub id: i32,
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

const fn tier(
    id: i32,
    name: &'static str,
    color: &'static str,
    description: &'static str,
) -> TierDef {
    TierDef {
        id,
        name,
        color,
        description,
    }
}

/// The fifteen league tiers, lowest first. Index `n` holds tier `n + 1`.
pub static LEAGUE_TIERS: [TierDef; 15] = [
    tier(1, "Sprout", "#8BC34A", "Everyone starts here. Study a little every day."),
    tier(2, "Seedling", "#4CAF50", "A steady habit is taking root."),
    tier(3, "Bronze", "#CD7F32", "Regular reviews are paying off."),
    tier(4, "Silver", "#C0C0C0", "Consistent learners who keep their streaks."),
    tier(5, "Gold", "#FFD700", "Above-average dedication across the week."),
    tier(6, "Sapphire", "#0F52BA", "Disciplined learners with deep decks."),
    tier(7, "Ruby", "#E0115F", "Sharp recall under steady pressure."),
    tier(8, "Emerald", "#50C878", "Top half of the ladder."),
    tier(9, "Amethyst", "#9966CC", "Learners who rarely miss a session."),
    tier(10, "Pearl", "#EAE0C8", "Polished study routines."),
    tier(11, "Obsidian", "#3D3D3D", "Hard-won mastery of large collections."),
    tier(12, "Diamond", "#B9F2FF", "Elite weekly output."),
    tier(13, "Master", "#FF6F00", "Few reach this far."),
    tier(14, "Grandmaster", "#D50000", "The strongest cohorts of the season."),
    tier(15, "Legend", "#6200EA", "The top of the ladder."),
];

pub fn validate_league(league: i32) -> Result<i32, LeagueError> {
    if (MIN_LEAGUE..=MAX_LEAGUE).contains(&league) {
        Ok(league)
    } else {
        Err(LeagueError::OutOfRange(league))
    }
}

pub fn get_tier(id: i32) -> Result<&'static TierDef, LeagueError> {
    let league = validate_league(id)?;
    LEAGUE_TIERS
        .get((league - MIN_LEAGUE) as usize)
        .ok_or(LeagueError::OutOfRange(id))
}

pub fn list_tiers() -> &'static [TierDef] {
    &LEAGUE_TIERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_valid_id_resolves_to_itself() {
        for id in MIN_LEAGUE..=MAX_LEAGUE {
            assert_eq!(get_tier(id).unwrap().id, id);
        }
    }

    #[test]
    fn ids_outside_the_ladder_are_rejected() {
        assert!(matches!(get_tier(0), Err(LeagueError::OutOfRange(0))));
        assert!(matches!(get_tier(16), Err(LeagueError::OutOfRange(16))));
        assert!(matches!(get_tier(-3), Err(LeagueError::OutOfRange(-3))));
    }

    #[test]
    fn listing_is_complete_and_ascending() {
        let tiers = list_tiers();
        assert_eq!(tiers.len(), 15);
        assert_eq!(tiers[0].id, 1);
        assert_eq!(tiers[14].id, 15);
        assert!(tiers.windows(2).all(|w| w[0].id + 1 == w[1].id));
    }

    #[test]
    fn tier_names_are_unique() {
        let mut names: Vec<_> = list_tiers().iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 15);
    }
}
