use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Match, MatchResult, SideView};
use crate::reduce::fold_by_team;
use crate::rounding::{ratio, round2};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamStanding {
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i64,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingsReport {
    pub standings: Vec<TeamStanding>,
    pub top_scorer: Option<TeamStanding>,
    pub best_defense: Option<TeamStanding>,
}

#[derive(Debug, Clone, Default)]
struct ScoringTotals {
    matches: u32,
    goals_scored: u32,
    goals_conceded: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScoring {
    pub team: String,
    pub matches: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub avg_scored: f64,
    pub avg_conceded: f64,
    pub goal_diff: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringSummary {
    pub best_attack: Option<TeamScoring>,
    pub best_defense: Option<TeamScoring>,
    pub worst_defense: Option<TeamScoring>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringReport {
    pub best_attack: Vec<TeamScoring>,
    pub best_defense: Vec<TeamScoring>,
    pub worst_defense: Vec<TeamScoring>,
    pub summary: ScoringSummary,
}

impl TeamStanding {
    fn record(&mut self, side: &SideView<'_>) {
        self.played += 1;
        self.goals_for += side.goals_for;
        self.goals_against += side.goals_against;
        match side.result() {
            MatchResult::Win => self.wins += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Loss => self.losses += 1,
        }
        self.points += side.result().points();
    }
}

/// One row per team seen on either side, ordered by points then goal difference (both
/// descending). Teams level on both keep first-seen order.
pub fn compute_standings<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Vec<TeamStanding> {
    let mut rows = fold_by_team(
        matches,
        |acc: &mut TeamStanding, side| acc.record(side),
        |team, mut acc| {
            acc.team = team;
            acc.goal_diff = i64::from(acc.goals_for) - i64::from(acc.goals_against);
            acc
        },
    );
    sort_standings(&mut rows);
    rows
}

pub fn sort_standings(rows: &mut [TeamStanding]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_diff.cmp(&a.goal_diff))
    });
}

pub fn standings_report<'a>(matches: impl IntoIterator<Item = &'a Match>) -> StandingsReport {
    let standings = compute_standings(matches);
    // First team wins ties, mirroring max()/min() over the table order.
    let top_scorer = standings
        .iter()
        .fold(None::<&TeamStanding>, |best, row| match best {
            Some(b) if b.goals_for >= row.goals_for => Some(b),
            _ => Some(row),
        })
        .cloned();
    let best_defense = standings
        .iter()
        .fold(None::<&TeamStanding>, |best, row| match best {
            Some(b) if b.goals_against <= row.goals_against => Some(b),
            _ => Some(row),
        })
        .cloned();
    StandingsReport {
        standings,
        top_scorer,
        best_defense,
    }
}

/// Goals scored/conceded per team with per-match averages.
pub fn compute_scoring<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Vec<TeamScoring> {
    fold_by_team(
        matches,
        |acc: &mut ScoringTotals, side| {
            acc.matches += 1;
            acc.goals_scored += side.goals_for;
            acc.goals_conceded += side.goals_against;
        },
        |team, acc| TeamScoring {
            team,
            matches: acc.matches,
            goals_scored: acc.goals_scored,
            goals_conceded: acc.goals_conceded,
            avg_scored: ratio(acc.goals_scored, acc.matches),
            avg_conceded: ratio(acc.goals_conceded, acc.matches),
            goal_diff: i64::from(acc.goals_scored) - i64::from(acc.goals_conceded),
        },
    )
}

pub fn scoring_report<'a>(matches: impl IntoIterator<Item = &'a Match>) -> ScoringReport {
    let rows = compute_scoring(matches);

    let mut best_attack = rows.clone();
    best_attack.sort_by(|a, b| cmp_f64(b.avg_scored, a.avg_scored));
    let mut best_defense = rows.clone();
    best_defense.sort_by(|a, b| cmp_f64(a.avg_conceded, b.avg_conceded));
    let mut worst_defense = rows;
    worst_defense.sort_by(|a, b| cmp_f64(b.avg_conceded, a.avg_conceded));

    let present = |rows: &mut Vec<TeamScoring>| {
        for row in rows.iter_mut() {
            row.avg_scored = round2(row.avg_scored);
            row.avg_conceded = round2(row.avg_conceded);
        }
    };
    present(&mut best_attack);
    present(&mut best_defense);
    present(&mut worst_defense);

    let summary = ScoringSummary {
        best_attack: best_attack.first().cloned(),
        best_defense: best_defense.first().cloned(),
        worst_defense: worst_defense.first().cloned(),
    };
    ScoringReport {
        best_attack,
        best_defense,
        worst_defense,
        summary,
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;

    #[test]
    fn goal_diff_breaks_points_ties() {
        let matches = vec![
            fixture(1, "2015-08-01", "A", "B", 3, 0),
            fixture(2, "2015-08-02", "C", "D", 1, 0),
        ];
        let table = compute_standings(&matches);
        let names: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D", "B"]);
        assert_eq!(table[0].goal_diff, 3);
        assert_eq!(table[3].goal_diff, -3);
    }

    #[test]
    fn report_picks_top_scorer_and_best_defense() {
        let matches = vec![
            fixture(1, "2015-08-01", "A", "B", 4, 3),
            fixture(2, "2015-08-08", "C", "A", 0, 0),
        ];
        let report = standings_report(&matches);
        assert_eq!(report.top_scorer.map(|r| r.team), Some("A".to_string()));
        assert_eq!(report.best_defense.map(|r| r.team), Some("C".to_string()));
    }

    #[test]
    fn scoring_rankings_order_by_averages() {
        let matches = vec![
            fixture(1, "2015-08-01", "A", "B", 2, 1),
            fixture(2, "2015-08-08", "B", "C", 0, 3),
            fixture(3, "2015-08-15", "C", "A", 1, 1),
        ];
        let report = scoring_report(&matches);
        assert_eq!(report.best_attack[0].team, "C");
        assert_eq!(report.best_attack[0].avg_scored, 2.0);
        assert_eq!(report.best_defense[0].team, "C");
        assert_eq!(report.best_defense[0].avg_conceded, 0.5);
        assert_eq!(report.worst_defense[0].team, "B");
        assert_eq!(report.worst_defense[0].avg_conceded, 2.5);
        assert_eq!(
            report.summary.best_attack.map(|r| r.team),
            Some("C".to_string())
        );
    }

    #[test]
    fn averages_round_half_to_even() {
        let mut matches = vec![fixture(1, "2015-08-01", "A", "B", 1, 5)];
        for id in 2..=8 {
            matches.push(fixture(id, "2015-08-08", "A", "B", 0, 0));
        }
        let report = scoring_report(&matches);
        let a = report.best_attack.iter().find(|r| r.team == "A").unwrap();
        assert_eq!(a.avg_scored, 0.12);
        assert_eq!(a.avg_conceded, 0.62);
    }
}
