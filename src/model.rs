use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Rating used for any attribute component a snapshot does not carry.
pub const DEFAULT_ATTRIBUTE: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub name: String,
    pub api_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAppearance {
    pub player_name: String,
    pub position: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    #[serde(with = "match_date")]
    pub date: NaiveDateTime,
    pub season: String,
    pub league_name: String,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    #[serde(alias = "home_team_goal")]
    pub home_goals: u32,
    #[serde(alias = "away_team_goal")]
    pub away_goals: u32,
    #[serde(default)]
    pub home_lineup: Vec<PlayerAppearance>,
    #[serde(default)]
    pub away_lineup: Vec<PlayerAppearance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "home_win")]
    Home,
    #[serde(rename = "draw")]
    Draw,
    #[serde(rename = "away_win")]
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
}

/// One team's view of a match: who it played, where, and the score from its side.
#[derive(Debug, Clone, Copy)]
pub struct SideView<'a> {
    pub team: &'a TeamRef,
    pub opponent: &'a TeamRef,
    pub venue: Venue,
    pub goals_for: u32,
    pub goals_against: u32,
    pub source: &'a Match,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAttributeSnapshot {
    #[serde(with = "match_date")]
    pub date: NaiveDateTime,
    #[serde(rename = "buildUpPlaySpeed", default)]
    pub build_up_play_speed: Option<i32>,
    #[serde(rename = "defencePressure", default)]
    pub defence_pressure: Option<i32>,
    #[serde(rename = "chanceCreationShooting", default)]
    pub chance_creation_shooting: Option<i32>,
    #[serde(rename = "defenceAggression", default)]
    pub defence_aggression: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub api_id: i64,
    pub long_name: String,
    pub short_name: String,
    #[serde(default, alias = "attributes_history")]
    pub attributes: Vec<TeamAttributeSnapshot>,
}

/// Attribute snapshot with every component resolved (missing ones at 50).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAttributes {
    pub build_up_play_speed: i32,
    pub defence_pressure: i32,
    pub chance_creation_shooting: i32,
    pub defence_aggression: i32,
}

/// Latest resolved attributes keyed by team api id. Teams without any snapshot are absent.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    by_api_id: HashMap<i64, TeamAttributes>,
}

impl Outcome {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            Outcome::Home
        } else if home_goals < away_goals {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    /// Class label used by the classifier: 0 = away win, 1 = draw, 2 = home win.
    pub fn label(self) -> usize {
        match self {
            Outcome::Away => 0,
            Outcome::Draw => 1,
            Outcome::Home => 2,
        }
    }

    pub fn from_label(label: usize) -> Option<Self> {
        match label {
            0 => Some(Outcome::Away),
            1 => Some(Outcome::Draw),
            2 => Some(Outcome::Home),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Outcome::Away => "Away Win",
            Outcome::Draw => "Draw",
            Outcome::Home => "Home Win",
        }
    }
}

impl MatchResult {
    pub fn from_goals(goals_for: u32, goals_against: u32) -> Self {
        if goals_for > goals_against {
            MatchResult::Win
        } else if goals_for < goals_against {
            MatchResult::Loss
        } else {
            MatchResult::Draw
        }
    }

    pub fn points(self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            MatchResult::Win => 'W',
            MatchResult::Draw => 'D',
            MatchResult::Loss => 'L',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchResult::Win => "Win",
            MatchResult::Draw => "Draw",
            MatchResult::Loss => "Loss",
        }
    }

    /// Score used by the rolling form feature.
    pub fn form_score(self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Draw => 0.5,
            MatchResult::Loss => 0.0,
        }
    }
}

impl Venue {
    pub fn label(self) -> &'static str {
        match self {
            Venue::Home => "Home",
            Venue::Away => "Away",
        }
    }
}

impl Match {
    pub fn home_team_api_id(&self) -> i64 {
        self.home_team.api_id
    }

    pub fn away_team_api_id(&self) -> i64 {
        self.away_team.api_id
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.home_goals, self.away_goals)
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    pub fn score(&self) -> String {
        format!("{}-{}", self.home_goals, self.away_goals)
    }

    pub fn involves(&self, team_name: &str) -> bool {
        self.home_team.name == team_name || self.away_team.name == team_name
    }

    pub fn home_side(&self) -> SideView<'_> {
        SideView {
            team: &self.home_team,
            opponent: &self.away_team,
            venue: Venue::Home,
            goals_for: self.home_goals,
            goals_against: self.away_goals,
            source: self,
        }
    }

    pub fn away_side(&self) -> SideView<'_> {
        SideView {
            team: &self.away_team,
            opponent: &self.home_team,
            venue: Venue::Away,
            goals_for: self.away_goals,
            goals_against: self.home_goals,
            source: self,
        }
    }

    pub fn sides(&self) -> [SideView<'_>; 2] {
        [self.home_side(), self.away_side()]
    }

    /// The named team's side, home checked first.
    pub fn side_of(&self, team_name: &str) -> Option<SideView<'_>> {
        if self.home_team.name == team_name {
            Some(self.home_side())
        } else if self.away_team.name == team_name {
            Some(self.away_side())
        } else {
            None
        }
    }
}

impl SideView<'_> {
    pub fn result(&self) -> MatchResult {
        MatchResult::from_goals(self.goals_for, self.goals_against)
    }

    pub fn goal_diff(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    pub fn score(&self) -> String {
        format!("{}-{}", self.goals_for, self.goals_against)
    }
}

impl TeamAttributes {
    pub fn neutral() -> Self {
        Self {
            build_up_play_speed: DEFAULT_ATTRIBUTE,
            defence_pressure: DEFAULT_ATTRIBUTE,
            chance_creation_shooting: DEFAULT_ATTRIBUTE,
            defence_aggression: DEFAULT_ATTRIBUTE,
        }
    }

    pub fn from_snapshot(snapshot: &TeamAttributeSnapshot) -> Self {
        Self {
            build_up_play_speed: snapshot.build_up_play_speed.unwrap_or(DEFAULT_ATTRIBUTE),
            defence_pressure: snapshot.defence_pressure.unwrap_or(DEFAULT_ATTRIBUTE),
            chance_creation_shooting: snapshot
                .chance_creation_shooting
                .unwrap_or(DEFAULT_ATTRIBUTE),
            defence_aggression: snapshot.defence_aggression.unwrap_or(DEFAULT_ATTRIBUTE),
        }
    }

    /// Overall strength: mean of build-up speed, defence pressure and chance creation.
    pub fn rating(&self) -> f64 {
        f64::from(self.build_up_play_speed + self.defence_pressure + self.chance_creation_shooting)
            / 3.0
    }

    pub fn attack(&self) -> i32 {
        self.chance_creation_shooting
    }

    pub fn defense(&self) -> i32 {
        self.defence_pressure
    }
}

impl Team {
    /// Most recent snapshot. Snapshots are kept in date order, so this is the last one.
    pub fn latest_attributes(&self) -> Option<&TeamAttributeSnapshot> {
        self.attributes.last()
    }

    /// Latest attributes, or the all-50 profile when the team has no snapshots.
    pub fn current_attributes(&self) -> TeamAttributes {
        self.latest_attributes()
            .map(TeamAttributes::from_snapshot)
            .unwrap_or_else(TeamAttributes::neutral)
    }

    pub fn sort_attributes(&mut self) {
        self.attributes.sort_by(|a, b| a.date.cmp(&b.date));
    }
}

impl AttributeIndex {
    pub fn from_teams<'a>(teams: impl IntoIterator<Item = &'a Team>) -> Self {
        let mut by_api_id = HashMap::new();
        for team in teams {
            if let Some(snapshot) = team.latest_attributes() {
                by_api_id.insert(team.api_id, TeamAttributes::from_snapshot(snapshot));
            }
        }
        Self { by_api_id }
    }

    pub fn get(&self, api_id: i64) -> Option<&TeamAttributes> {
        self.by_api_id.get(&api_id)
    }

    /// Both sides' attributes, or `None` when either team is missing.
    pub fn pair(&self, m: &Match) -> Option<(&TeamAttributes, &TeamAttributes)> {
        Some((self.get(m.home_team_api_id())?, self.get(m.away_team_api_id())?))
    }

    pub fn len(&self) -> usize {
        self.by_api_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_api_id.is_empty()
    }
}

/// Kickoff timestamps as stored: `YYYY-MM-DD HH:MM:SS`. Bare dates and ISO `T` forms are
/// accepted on input.
pub mod match_date {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn format(date: &NaiveDateTime) -> String {
        date.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date {raw:?}")))
    }
}
