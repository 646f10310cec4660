use serde::Serialize;

use crate::model::{Match, MatchResult, match_date};
use crate::reduce::fold_sides;
use crate::rounding::{percent, round1};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadToHeadMatch {
    pub date: String,
    pub season: String,
    pub league: String,
    pub home: String,
    pub away: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub score: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHead {
    pub team1: String,
    pub team2: String,
    pub total_matches: u32,
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub draws: u32,
    pub team1_goals: u32,
    pub team2_goals: u32,
    pub team1_win_pct: f64,
    pub team2_win_pct: f64,
    pub draw_pct: f64,
    /// Every meeting, oldest first.
    pub matches: Vec<HeadToHeadMatch>,
}

#[derive(Debug, Clone, Default)]
struct PairTally {
    total: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    goals_for: u32,
    goals_against: u32,
}

impl HeadToHead {
    /// The last `n` meetings, newest first.
    pub fn recent(&self, n: usize) -> Vec<&HeadToHeadMatch> {
        self.matches.iter().rev().take(n).collect()
    }
}

pub fn is_meeting(m: &Match, team1: &str, team2: &str) -> bool {
    (m.home_team.name == team1 && m.away_team.name == team2)
        || (m.home_team.name == team2 && m.away_team.name == team1)
}

/// Record between two teams from `team1`'s point of view. Matches not between the pair are
/// ignored; `None` when they never met.
pub fn analyze_head_to_head(team1: &str, team2: &str, matches: &[Match]) -> Option<HeadToHead> {
    let mut meetings: Vec<&Match> = matches
        .iter()
        .filter(|m| is_meeting(m, team1, team2))
        .collect();
    if meetings.is_empty() {
        return None;
    }
    meetings.sort_by(|a, b| a.date.cmp(&b.date));

    let tally = fold_sides(
        meetings.iter().copied(),
        |side| (side.team.name == team1).then_some(()),
        |acc: &mut PairTally, side| {
            acc.total += 1;
            acc.goals_for += side.goals_for;
            acc.goals_against += side.goals_against;
            match side.result() {
                MatchResult::Win => acc.wins += 1,
                MatchResult::Loss => acc.losses += 1,
                MatchResult::Draw => acc.draws += 1,
            }
        },
        |_, acc| acc,
    )
    .pop()
    .unwrap_or_default();

    let rows = meetings
        .iter()
        .map(|m| {
            let result = match m.side_of(team1).map(|s| s.result()) {
                Some(MatchResult::Win) => format!("{team1} win"),
                Some(MatchResult::Loss) => format!("{team2} win"),
                _ => "Draw".to_string(),
            };
            HeadToHeadMatch {
                date: match_date::format(&m.date),
                season: m.season.clone(),
                league: m.league_name.clone(),
                home: m.home_team.name.clone(),
                away: m.away_team.name.clone(),
                home_goals: m.home_goals,
                away_goals: m.away_goals,
                score: m.score(),
                result,
            }
        })
        .collect::<Vec<_>>();

    Some(HeadToHead {
        team1: team1.to_string(),
        team2: team2.to_string(),
        total_matches: tally.total,
        team1_wins: tally.wins,
        team2_wins: tally.losses,
        draws: tally.draws,
        team1_goals: tally.goals_for,
        team2_goals: tally.goals_against,
        team1_win_pct: round1(percent(tally.wins, tally.total)),
        team2_win_pct: round1(percent(tally.losses, tally.total)),
        draw_pct: round1(percent(tally.draws, tally.total)),
        matches: rows,
    })
}
