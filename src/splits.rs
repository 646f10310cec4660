use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Match, MatchResult, Venue};
use crate::reduce::fold_by_team;
use crate::rounding::{percent, round1};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VenueRecord {
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueSplit {
    pub team: String,
    pub home: VenueRecord,
    pub away: VenueRecord,
}

/// Output row, percentages rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueSplitRow {
    pub team: String,
    pub home_played: u32,
    pub home_wins: u32,
    pub home_draws: u32,
    pub home_losses: u32,
    pub home_points: u32,
    pub home_win_pct: f64,
    pub away_played: u32,
    pub away_wins: u32,
    pub away_draws: u32,
    pub away_losses: u32,
    pub away_points: u32,
    pub away_win_pct: f64,
    pub home_advantage: f64,
}

/// Rows largest home advantage first, with the extremes and the league mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeAwayReport {
    pub results: Vec<VenueSplitRow>,
    pub best_home: Option<VenueSplitRow>,
    pub worst_home: Option<VenueSplitRow>,
    /// Mean home advantage across teams, one decimal.
    pub avg_advantage: f64,
}

impl VenueRecord {
    fn record(&mut self, result: MatchResult) {
        self.played += 1;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Loss => self.losses += 1,
        }
        self.points += result.points();
    }

    pub fn win_pct(&self) -> f64 {
        percent(self.wins, self.played)
    }
}

impl VenueSplit {
    pub fn home_advantage(&self) -> f64 {
        self.home.win_pct() - self.away.win_pct()
    }

    pub fn to_row(&self) -> VenueSplitRow {
        VenueSplitRow {
            team: self.team.clone(),
            home_played: self.home.played,
            home_wins: self.home.wins,
            home_draws: self.home.draws,
            home_losses: self.home.losses,
            home_points: self.home.points,
            home_win_pct: round1(self.home.win_pct()),
            away_played: self.away.played,
            away_wins: self.away.wins,
            away_draws: self.away.draws,
            away_losses: self.away.losses,
            away_points: self.away.points,
            away_win_pct: round1(self.away.win_pct()),
            home_advantage: round1(self.home_advantage()),
        }
    }
}

/// Home and away records per team, largest home advantage first. A side only ever updates the
/// bucket of the venue it played at.
pub fn compute_venue_splits<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Vec<VenueSplit> {
    let mut rows = fold_by_team(
        matches,
        |acc: &mut VenueSplit, side| {
            let bucket = match side.venue {
                Venue::Home => &mut acc.home,
                Venue::Away => &mut acc.away,
            };
            bucket.record(side.result());
        },
        |team, mut acc| {
            acc.team = team;
            acc
        },
    );
    rows.sort_by(|a, b| {
        b.home_advantage()
            .partial_cmp(&a.home_advantage())
            .unwrap_or(Ordering::Equal)
    });
    rows
}

pub fn home_away_report<'a>(matches: impl IntoIterator<Item = &'a Match>) -> HomeAwayReport {
    let splits = compute_venue_splits(matches);
    let avg_advantage = if splits.is_empty() {
        0.0
    } else {
        splits.iter().map(VenueSplit::home_advantage).sum::<f64>() / splits.len() as f64
    };
    let results: Vec<VenueSplitRow> = splits.iter().map(VenueSplit::to_row).collect();
    HomeAwayReport {
        best_home: results.first().cloned(),
        worst_home: results.last().cloned(),
        avg_advantage: round1(avg_advantage),
        results,
    }
}
