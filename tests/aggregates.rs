use soccer_analytics::form::team_form;
use soccer_analytics::head_to_head::analyze_head_to_head;
use soccer_analytics::model::{Match, TeamRef, match_date};
use soccer_analytics::splits::compute_venue_splits;
use soccer_analytics::standings::{compute_scoring, compute_standings, sort_standings};

fn side(name: &str, api_id: i64) -> TeamRef {
    TeamRef {
        name: name.to_string(),
        api_id,
    }
}

fn game(id: i64, date: &str, home: (&str, i64), away: (&str, i64), hg: u32, ag: u32) -> Match {
    Match {
        id,
        date: match_date::parse(date).expect("fixture date"),
        season: "2014/2015".to_string(),
        league_name: "Spain LIGA BBVA".to_string(),
        home_team: side(home.0, home.1),
        away_team: side(away.0, away.1),
        home_goals: hg,
        away_goals: ag,
        home_lineup: Vec::new(),
        away_lineup: Vec::new(),
    }
}

const BARCA: (&str, i64) = ("FC Barcelona", 8634);
const MADRID: (&str, i64) = ("Real Madrid CF", 8633);
const VALENCIA: (&str, i64) = ("Valencia CF", 10267);
const SEVILLA: (&str, i64) = ("Sevilla FC", 8302);

fn season() -> Vec<Match> {
    vec![
        game(1, "2014-08-24", BARCA, MADRID, 2, 1),
        game(2, "2014-08-31", VALENCIA, SEVILLA, 1, 1),
        game(3, "2014-09-13", MADRID, VALENCIA, 0, 2),
        game(4, "2014-09-20", SEVILLA, BARCA, 0, 0),
        game(5, "2014-10-04", MADRID, BARCA, 3, 1),
        game(6, "2014-10-18", BARCA, VALENCIA, 4, 0),
        game(7, "2014-11-01", SEVILLA, MADRID, 2, 3),
        game(8, "2015-03-22", BARCA, MADRID, 0, 0),
    ]
}

#[test]
fn points_and_goals_are_conserved() {
    let matches = season();
    let table = compute_standings(&matches);

    let draws = matches.iter().filter(|m| m.home_goals == m.away_goals).count() as u32;
    let decisive = matches.len() as u32 - draws;
    let points: u32 = table.iter().map(|t| t.points).sum();
    assert_eq!(points, 3 * decisive + 2 * draws);

    let scored: u32 = table.iter().map(|t| t.goals_for).sum();
    let conceded: u32 = table.iter().map(|t| t.goals_against).sum();
    let total: u32 = matches.iter().map(|m| m.home_goals + m.away_goals).sum();
    assert_eq!(scored, total);
    assert_eq!(conceded, total);
    for row in &table {
        assert_eq!(row.played, row.wins + row.draws + row.losses);
    }
}

#[test]
fn resorting_sorted_standings_is_a_no_op() {
    let table = compute_standings(&season());
    let mut again = table.clone();
    sort_standings(&mut again);
    assert_eq!(again, table);
    for pair in table.windows(2) {
        assert!(
            (pair[0].points, pair[0].goal_diff) >= (pair[1].points, pair[1].goal_diff),
            "{} before {}",
            pair[0].team,
            pair[1].team
        );
    }
}

#[test]
fn head_to_head_totals_match_rows() {
    let matches = season();
    let h2h = analyze_head_to_head(BARCA.0, MADRID.0, &matches).expect("they met");
    assert_eq!(h2h.total_matches, 3);
    assert_eq!(h2h.team1_wins + h2h.team2_wins + h2h.draws, h2h.total_matches);
    assert_eq!((h2h.team1_wins, h2h.team2_wins, h2h.draws), (1, 1, 1));

    let team1_goals: u32 = h2h
        .matches
        .iter()
        .map(|r| if r.home == BARCA.0 { r.home_goals } else { r.away_goals })
        .sum();
    let team2_goals: u32 = h2h
        .matches
        .iter()
        .map(|r| if r.home == MADRID.0 { r.home_goals } else { r.away_goals })
        .sum();
    assert_eq!((h2h.team1_goals, h2h.team2_goals), (team1_goals, team2_goals));
    assert_eq!(h2h.team1_win_pct, 33.3);
    assert_eq!(h2h.matches[1].result, "Real Madrid CF win");
    assert_eq!(h2h.recent(1)[0].date, "2015-03-22 00:00:00");

    assert!(analyze_head_to_head(VALENCIA.0, "Getafe CF", &matches).is_none());
}

#[test]
fn form_string_follows_play_order() {
    let matches = season();
    let all = team_form(BARCA.0, &matches, 10).expect("played");
    assert_eq!(all.form, "WDLWD");
    assert_eq!(all.form.len(), all.matches_analyzed);
    assert_eq!(all.points, 3 * all.wins + all.draws);

    let last3 = team_form(BARCA.0, &matches, 3).expect("played");
    assert_eq!(last3.form, "LWD");
    assert_eq!(last3.max_points, 9);
    assert_eq!(last3.points, 4);
    assert_eq!(last3.matches[0].venue, "Away");
    assert_eq!(last3.matches[0].score, "3-1");
    assert_eq!(last3.matches[0].result, "Loss");
}

#[test]
fn split_then_mirrored_pair() {
    let matches = vec![
        game(1, "2015-08-08", ("A", 1), ("B", 2), 2, 1),
        game(2, "2015-08-15", ("B", 2), ("A", 1), 1, 0),
    ];
    let table = compute_standings(&matches);
    for row in &table {
        assert_eq!(
            (row.played, row.wins, row.draws, row.losses, row.points),
            (2, 1, 0, 1, 3)
        );
    }
    let a = table.iter().find(|r| r.team == "A").unwrap();
    assert_eq!((a.goals_for, a.goals_against), (2, 2));
    let b = table.iter().find(|r| r.team == "B").unwrap();
    assert_eq!((b.goals_for, b.goals_against), (2, 2));

    let splits = compute_venue_splits(&matches);
    let a = splits.iter().find(|s| s.team == "A").unwrap();
    assert_eq!((a.home.wins, a.away.losses), (1, 1));
}

#[test]
fn goalless_draw() {
    let matches = vec![game(1, "2015-08-08", ("A", 1), ("B", 2), 0, 0)];
    for row in compute_standings(&matches) {
        assert_eq!((row.draws, row.points, row.goal_diff), (1, 1, 0));
    }
    for row in compute_scoring(&matches) {
        assert_eq!(row.avg_scored, 0.0);
        assert_eq!(row.avg_conceded, 0.0);
    }
}
