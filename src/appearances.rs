use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Match, Venue};
use crate::reduce::KeyedFold;

pub const DEFAULT_APPEARANCE_LIMIT: usize = 15;
/// Appearances needed to count as a regular starter.
pub const REGULAR_THRESHOLD: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerAppearances {
    pub player: String,
    pub appearances: u32,
    /// Clubs the player lined up for, sorted and comma-separated.
    pub teams: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppearanceReport {
    pub players: Vec<PlayerAppearances>,
    pub total_matches: u64,
    pub regulars_count: usize,
}

#[derive(Debug, Default)]
struct PlayerTally {
    appearances: u32,
    teams: BTreeSet<String>,
}

/// Counts lineup appearances per player. `total_matches` is passed in from the store's own
/// count rather than derived from the lineups.
pub fn player_appearances<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
    limit: usize,
    total_matches: u64,
) -> AppearanceReport {
    let mut fold: KeyedFold<String, PlayerTally> = KeyedFold::new();
    for m in matches {
        for side in m.sides() {
            let lineup = match side.venue {
                Venue::Home => &m.home_lineup,
                Venue::Away => &m.away_lineup,
            };
            for entry in lineup.iter().filter(|p| !p.player_name.is_empty()) {
                let tally = fold.entry(&entry.player_name);
                tally.appearances += 1;
                tally.teams.insert(side.team.name.clone());
            }
        }
    }

    let mut players: Vec<PlayerAppearances> = fold
        .into_entries()
        .into_iter()
        .map(|(player, tally)| PlayerAppearances {
            player,
            appearances: tally.appearances,
            teams: tally.teams.into_iter().collect::<Vec<_>>().join(", "),
        })
        .collect();
    players.sort_by(|a, b| b.appearances.cmp(&a.appearances));

    let regulars_count = players
        .iter()
        .filter(|p| p.appearances >= REGULAR_THRESHOLD)
        .count();
    players.truncate(limit);

    AppearanceReport {
        players,
        total_matches,
        regulars_count,
    }
}
