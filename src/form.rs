use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Match, MatchResult, match_date};

pub const DEFAULT_FORM_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormMatch {
    pub date: String,
    pub opponent: String,
    pub venue: String,
    pub score: String,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormRecord {
    pub team: String,
    pub matches_analyzed: usize,
    /// One of `W`/`D`/`L` per match, oldest first.
    pub form: String,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i64,
    pub points: u32,
    pub max_points: u32,
    pub matches: Vec<FormMatch>,
}

impl FormRecord {
    fn push(&mut self, m: &Match) {
        let Some(side) = m.side_of(&self.team) else {
            return;
        };
        let result = side.result();
        self.form.push(result.as_char());
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Loss => self.losses += 1,
        }
        self.goals_for += side.goals_for;
        self.goals_against += side.goals_against;
        self.points += result.points();
        self.max_points += 3;
        self.matches_analyzed += 1;
        self.matches.push(FormMatch {
            date: match_date::format(&m.date),
            opponent: side.opponent.name.clone(),
            venue: side.venue.label().to_string(),
            score: m.score(),
            result: result.label().to_string(),
        });
    }
}

/// Form over the team's last `window` matches in `matches` (fewer if it has not played that
/// many). `None` when the team has no matches at all.
pub fn team_form(team: &str, matches: &[Match], window: usize) -> Option<FormRecord> {
    let mut played: Vec<&Match> = matches.iter().filter(|m| m.involves(team)).collect();
    if played.is_empty() {
        return None;
    }
    played.sort_by(|a, b| a.date.cmp(&b.date));
    let start = played.len().saturating_sub(window);

    let mut record = FormRecord {
        team: team.to_string(),
        ..FormRecord::default()
    };
    for m in &played[start..] {
        record.push(m);
    }
    record.goal_diff = i64::from(record.goals_for) - i64::from(record.goals_against);
    Some(record)
}

/// Form of every team that appears as a home side, best recent points first, then goal
/// difference.
pub fn league_form(matches: &[Match], window: usize) -> Vec<FormRecord> {
    let teams: BTreeSet<&str> = matches.iter().map(|m| m.home_team.name.as_str()).collect();
    let mut rows: Vec<FormRecord> = teams
        .into_iter()
        .filter_map(|team| team_form(team, matches, window))
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_diff.cmp(&a.goal_diff))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;

    fn season() -> Vec<Match> {
        vec![
            fixture(4, "2015-09-12", "A", "D", 1, 1),
            fixture(1, "2015-08-08", "A", "B", 2, 0),
            fixture(2, "2015-08-15", "C", "A", 3, 1),
            fixture(3, "2015-08-22", "B", "A", 0, 0),
            fixture(5, "2015-09-19", "E", "A", 0, 4),
        ]
    }

    #[test]
    fn window_takes_most_recent_in_play_order() {
        let record = team_form("A", &season(), 3).unwrap();
        assert_eq!(record.form, "DDW");
        assert_eq!(record.matches_analyzed, 3);
        assert_eq!(record.points, 5);
        assert_eq!(record.max_points, 9);
        assert_eq!(record.goals_for, 5);
        assert_eq!(record.goals_against, 1);
        assert_eq!(record.goal_diff, 4);
        let last = record.matches.last().unwrap();
        assert_eq!(last.opponent, "E");
        assert_eq!(last.venue, "Away");
        assert_eq!(last.score, "0-4");
        assert_eq!(last.result, "Win");
    }

    #[test]
    fn window_shrinks_when_history_is_short() {
        let record = team_form("A", &season(), 10).unwrap();
        assert_eq!(record.form, "WLDDW");
        assert_eq!(record.form.len(), 5);
        assert_eq!(record.max_points, 15);
        assert!(team_form("Z", &season(), 5).is_none());
    }

    #[test]
    fn league_form_only_lists_home_sides() {
        let rows = league_form(&season(), 5);
        let teams: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(teams, vec!["A", "C", "B", "E"]);
    }
}
