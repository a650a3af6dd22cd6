//! Matchup string parsing.
//!
//! Box-score matchups read `"LAL vs. BOS"` for a home game and `"LAL @ BOS"`
//! for a road game. Contract: the first whitespace-delimited token is the
//! team, the last is the opponent, and the separator decides the location.

use crate::league_config::normalize_code;
use crate::models::Location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub team: String,
    pub opponent: String,
    pub location: Location,
}

/// The opponent code: the last whitespace-delimited token, normalized.
pub fn opponent_code(matchup: &str) -> Option<String> {
    matchup.split_whitespace().last().map(normalize_code)
}

/// Parse a full matchup. Requires exactly three tokens with a `vs`/`vs.`/`@` separator.
pub fn parse_matchup(matchup: &str) -> Option<Matchup> {
    let tokens: Vec<&str> = matchup.split_whitespace().collect();
    let [team, separator, opponent] = tokens.as_slice() else {
        return None;
    };
    let location = match separator.to_ascii_lowercase().as_str() {
        "vs" | "vs." => Location::Home,
        "@" => Location::Away,
        _ => return None,
    };
    Some(Matchup {
        team: normalize_code(team),
        opponent: normalize_code(opponent),
        location,
    })
}
