use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use soccer_analytics::correlation::correlate_ratings;
use soccer_analytics::features::{FormTracker, build_training_table};
use soccer_analytics::form::league_form;
use soccer_analytics::model::{AttributeIndex, Match, Team, TeamAttributeSnapshot, TeamRef, match_date};
use soccer_analytics::standings::{compute_standings, scoring_report};

const TEAMS: i64 = 20;

fn synthetic_teams() -> Vec<Team> {
    (0..TEAMS)
        .map(|i| Team {
            api_id: 8000 + i,
            long_name: format!("Team {i:02}"),
            short_name: format!("T{i:02}"),
            attributes: vec![TeamAttributeSnapshot {
                date: match_date::parse("2015-02-22").unwrap(),
                build_up_play_speed: Some(35 + (i as i32 * 7) % 40),
                defence_pressure: Some(30 + (i as i32 * 11) % 45),
                chance_creation_shooting: Some(40 + (i as i32 * 5) % 35),
                defence_aggression: Some(45 + (i as i32 * 3) % 30),
            }],
        })
        .collect()
}

/// Double round robin, 380 matches, with goals drawn from a fixed pattern.
fn synthetic_season(teams: &[Team]) -> Vec<Match> {
    let start = match_date::parse("2015-08-08").unwrap();
    let mut matches = Vec::new();
    let mut id = 0i64;
    for home in teams {
        for away in teams {
            if home.api_id == away.api_id {
                continue;
            }
            id += 1;
            matches.push(Match {
                id,
                date: start + chrono::Duration::hours(id * 9),
                season: "2015/2016".to_string(),
                league_name: "Germany 1. Bundesliga".to_string(),
                home_team: TeamRef {
                    name: home.long_name.clone(),
                    api_id: home.api_id,
                },
                away_team: TeamRef {
                    name: away.long_name.clone(),
                    api_id: away.api_id,
                },
                home_goals: ((id * 7) % 5) as u32,
                away_goals: ((id * 3) % 4) as u32,
                home_lineup: Vec::new(),
                away_lineup: Vec::new(),
            });
        }
    }
    matches
}

fn bench_standings(c: &mut Criterion) {
    let teams = synthetic_teams();
    let season = synthetic_season(&teams);
    c.bench_function("standings_season", |b| {
        b.iter(|| {
            let table = compute_standings(black_box(&season));
            black_box(table.len());
        })
    });
    c.bench_function("scoring_season", |b| {
        b.iter(|| black_box(scoring_report(black_box(&season))))
    });
    c.bench_function("league_form_season", |b| {
        b.iter(|| black_box(league_form(black_box(&season), 5)))
    });
}

fn bench_features(c: &mut Criterion) {
    let teams = synthetic_teams();
    let season = synthetic_season(&teams);
    let index = AttributeIndex::from_teams(&teams);
    c.bench_function("training_table_with_form", |b| {
        b.iter(|| {
            let (table, _) =
                build_training_table(black_box(&season), &index, true, FormTracker::new());
            black_box(table.len());
        })
    });
    c.bench_function("rating_correlation", |b| {
        b.iter(|| black_box(correlate_ratings(black_box(&season), &index)))
    });
}

criterion_group!(benches, bench_standings, bench_features);
criterion_main!(benches);
