//! League configuration for the NBA.
//!
//! This module provides:
//! - The fixed roster of franchise codes used by the historical dataset
//! - Normalization of live-feed codes that differ from the dataset's codes
//! - Team lookup by abbreviation or (partial) name

/// Static configuration for a single franchise.
#[derive(Debug, Clone)]
pub struct TeamConfig {
    /// Stats provider team id (e.g., 1610612747)
    pub team_id: u64,
    /// Dataset abbreviation (e.g., "LAL")
    pub abbreviation: &'static str,
    /// Full name (e.g., "Los Angeles Lakers")
    pub full_name: &'static str,
    /// Nickname (e.g., "Lakers")
    pub nickname: &'static str,
    pub city: &'static str,
}

/// Static configuration for all thirty franchises.
pub static NBA_TEAMS: &[TeamConfig] = &[
    // Eastern Conference
    TeamConfig { team_id: 1610612737, abbreviation: "ATL", full_name: "Atlanta Hawks", nickname: "Hawks", city: "Atlanta" },
    TeamConfig { team_id: 1610612738, abbreviation: "BOS", full_name: "Boston Celtics", nickname: "Celtics", city: "Boston" },
    TeamConfig { team_id: 1610612751, abbreviation: "BKN", full_name: "Brooklyn Nets", nickname: "Nets", city: "Brooklyn" },
    TeamConfig { team_id: 1610612766, abbreviation: "CHA", full_name: "Charlotte Hornets", nickname: "Hornets", city: "Charlotte" },
    TeamConfig { team_id: 1610612741, abbreviation: "CHI", full_name: "Chicago Bulls", nickname: "Bulls", city: "Chicago" },
    TeamConfig { team_id: 1610612739, abbreviation: "CLE", full_name: "Cleveland Cavaliers", nickname: "Cavaliers", city: "Cleveland" },
    TeamConfig { team_id: 1610612765, abbreviation: "DET", full_name: "Detroit Pistons", nickname: "Pistons", city: "Detroit" },
    TeamConfig { team_id: 1610612754, abbreviation: "IND", full_name: "Indiana Pacers", nickname: "Pacers", city: "Indiana" },
    TeamConfig { team_id: 1610612748, abbreviation: "MIA", full_name: "Miami Heat", nickname: "Heat", city: "Miami" },
    TeamConfig { team_id: 1610612749, abbreviation: "MIL", full_name: "Milwaukee Bucks", nickname: "Bucks", city: "Milwaukee" },
    TeamConfig { team_id: 1610612752, abbreviation: "NYK", full_name: "New York Knicks", nickname: "Knicks", city: "New York" },
    TeamConfig { team_id: 1610612753, abbreviation: "ORL", full_name: "Orlando Magic", nickname: "Magic", city: "Orlando" },
    TeamConfig { team_id: 1610612755, abbreviation: "PHI", full_name: "Philadelphia 76ers", nickname: "76ers", city: "Philadelphia" },
    TeamConfig { team_id: 1610612761, abbreviation: "TOR", full_name: "Toronto Raptors", nickname: "Raptors", city: "Toronto" },
    TeamConfig { team_id: 1610612764, abbreviation: "WAS", full_name: "Washington Wizards", nickname: "Wizards", city: "Washington" },
    // Western Conference
    TeamConfig { team_id: 1610612742, abbreviation: "DAL", full_name: "Dallas Mavericks", nickname: "Mavericks", city: "Dallas" },
    TeamConfig { team_id: 1610612743, abbreviation: "DEN", full_name: "Denver Nuggets", nickname: "Nuggets", city: "Denver" },
    TeamConfig { team_id: 1610612744, abbreviation: "GSW", full_name: "Golden State Warriors", nickname: "Warriors", city: "Golden State" },
    TeamConfig { team_id: 1610612745, abbreviation: "HOU", full_name: "Houston Rockets", nickname: "Rockets", city: "Houston" },
    TeamConfig { team_id: 1610612746, abbreviation: "LAC", full_name: "LA Clippers", nickname: "Clippers", city: "Los Angeles" },
    TeamConfig { team_id: 1610612747, abbreviation: "LAL", full_name: "Los Angeles Lakers", nickname: "Lakers", city: "Los Angeles" },
    TeamConfig { team_id: 1610612763, abbreviation: "MEM", full_name: "Memphis Grizzlies", nickname: "Grizzlies", city: "Memphis" },
    TeamConfig { team_id: 1610612750, abbreviation: "MIN", full_name: "Minnesota Timberwolves", nickname: "Timberwolves", city: "Minnesota" },
    TeamConfig { team_id: 1610612740, abbreviation: "NOP", full_name: "New Orleans Pelicans", nickname: "Pelicans", city: "New Orleans" },
    TeamConfig { team_id: 1610612760, abbreviation: "OKC", full_name: "Oklahoma City Thunder", nickname: "Thunder", city: "Oklahoma City" },
    TeamConfig { team_id: 1610612756, abbreviation: "PHX", full_name: "Phoenix Suns", nickname: "Suns", city: "Phoenix" },
    TeamConfig { team_id: 1610612757, abbreviation: "POR", full_name: "Portland Trail Blazers", nickname: "Trail Blazers", city: "Portland" },
    TeamConfig { team_id: 1610612758, abbreviation: "SAC", full_name: "Sacramento Kings", nickname: "Kings", city: "Sacramento" },
    TeamConfig { team_id: 1610612759, abbreviation: "SAS", full_name: "San Antonio Spurs", nickname: "Spurs", city: "San Antonio" },
    TeamConfig { team_id: 1610612762, abbreviation: "UTA", full_name: "Utah Jazz", nickname: "Jazz", city: "Utah" },
];

/// Live feed codes that differ from the dataset's codes.
static FEED_CODE_ALIASES: &[(&str, &str)] = &[
    ("GS", "GSW"),
    ("NY", "NYK"),
    ("SA", "SAS"),
    ("NO", "NOP"),
    ("UTAH", "UTA"),
    ("WSH", "WAS"),
    ("PHO", "PHX"),
    ("BRK", "BKN"),
];

/// Normalize a team code to the dataset's abbreviation (uppercased, aliases resolved).
pub fn normalize_code(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    FEED_CODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(upper)
}

/// Whether a code (after normalization) belongs to the league roster.
pub fn is_league_code(code: &str) -> bool {
    get_team_by_abbr(code).is_some()
}

/// Get team configuration by abbreviation (feed aliases accepted).
pub fn get_team_by_abbr(code: &str) -> Option<&'static TeamConfig> {
    let code = normalize_code(code);
    NBA_TEAMS.iter().find(|t| t.abbreviation == code)
}

/// Find a team by (partial) name, case-insensitive; first roster match wins.
///
/// "lakers", "Los Angeles L" and "LAL" all resolve to the Lakers.
pub fn find_team(query: &str) -> Option<&'static TeamConfig> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(team) = get_team_by_abbr(&needle) {
        return Some(team);
    }
    NBA_TEAMS
        .iter()
        .find(|t| t.full_name.to_lowercase().contains(&needle))
}

/// Get list of all roster abbreviations.
pub fn get_all_team_codes() -> Vec<&'static str> {
    NBA_TEAMS.iter().map(|t| t.abbreviation).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_size() {
        assert_eq!(NBA_TEAMS.len(), 30);
        let mut codes = get_all_team_codes();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 30);
    }

    #[test]
    fn test_normalize_feed_codes() {
        assert_eq!(normalize_code("GS"), "GSW");
        assert_eq!(normalize_code("utah"), "UTA");
        assert_eq!(normalize_code("WSH"), "WAS");
        assert_eq!(normalize_code("lal"), "LAL");
    }

    #[test]
    fn test_get_team_by_abbr() {
        let lakers = get_team_by_abbr("LAL").unwrap();
        assert_eq!(lakers.full_name, "Los Angeles Lakers");
        assert_eq!(get_team_by_abbr("NY").unwrap().abbreviation, "NYK");
        assert!(get_team_by_abbr("XYZ").is_none());
    }

    #[test]
    fn test_find_team_by_partial_name() {
        assert_eq!(find_team("lakers").unwrap().abbreviation, "LAL");
        assert_eq!(find_team("Celtics").unwrap().abbreviation, "BOS");
        assert_eq!(find_team("golden state").unwrap().abbreviation, "GSW");
        assert_eq!(find_team("sas").unwrap().abbreviation, "SAS");
        assert!(find_team("").is_none());
        assert!(find_team("Sonics").is_none());
    }

    #[test]
    fn test_is_league_code() {
        assert!(is_league_code("BOS"));
        assert!(is_league_code("SA"));
        assert!(!is_league_code("SEA"));
    }
}
