use crate::model::{Match, TeamRef, match_date};

pub fn team_ref(name: &str) -> TeamRef {
    let api_id = name
        .bytes()
        .fold(7i64, |acc, b| acc.wrapping_mul(31).wrapping_add(i64::from(b)));
    TeamRef {
        name: name.to_string(),
        api_id,
    }
}

pub fn fixture(id: i64, date: &str, home: &str, away: &str, home_goals: u32, away_goals: u32) -> Match {
    Match {
        id,
        date: match_date::parse(date).expect("test date should parse"),
        season: "2015/2016".to_string(),
        league_name: "England Premier League".to_string(),
        home_team: team_ref(home),
        away_team: team_ref(away),
        home_goals,
        away_goals,
        home_lineup: Vec::new(),
        away_lineup: Vec::new(),
    }
}
