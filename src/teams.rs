use crate::models::Team;

const fn team(id: u32, abbreviation: &'static str) -> Team {
    Team { id, abbreviation }
}

/// All thirty NBA franchises, in the order discovery walks them.
pub const NBA_TEAMS: [Team; 30] = [
    team(1610612737, "ATL"),
    team(1610612738, "BOS"),
    team(1610612739, "CLE"),
    team(1610612740, "NOP"),
    team(1610612741, "CHI"),
    team(1610612742, "DAL"),
    team(1610612743, "DEN"),
    team(1610612744, "GSW"),
    team(1610612745, "HOU"),
    team(1610612746, "LAC"),
    team(1610612747, "LAL"),
    team(1610612748, "MIA"),
    team(1610612749, "MIL"),
    team(1610612750, "MIN"),
    team(1610612751, "BKN"),
    team(1610612752, "NYK"),
    team(1610612753, "ORL"),
    team(1610612754, "IND"),
    team(1610612755, "PHI"),
    team(1610612756, "PHX"),
    team(1610612757, "POR"),
    team(1610612758, "SAC"),
    team(1610612759, "SAS"),
    team(1610612760, "OKC"),
    team(1610612761, "TOR"),
    team(1610612762, "UTA"),
    team(1610612763, "MEM"),
    team(1610612764, "WAS"),
    team(1610612765, "DET"),
    team(1610612766, "CHA"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_ids_unique() {
        let ids: HashSet<u32> = NBA_TEAMS.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), NBA_TEAMS.len());
        let abbrs: HashSet<&str> = NBA_TEAMS.iter().map(|t| t.abbreviation).collect();
        assert_eq!(abbrs.len(), NBA_TEAMS.len());
    }

    #[test]
    fn test_registry_id_range() {
        assert!(NBA_TEAMS
            .iter()
            .all(|t| (1610612737..=1610612766).contains(&t.id)));
    }
}
