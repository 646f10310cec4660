use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::model::{Match, PlayerAppearance, Team, TeamAttributeSnapshot, TeamRef, match_date};

/// Exact-match conditions, all of which must hold. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub league_name: Option<String>,
    pub season: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_team_api_id: Option<i64>,
    pub away_team_api_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// `base` AND (any one of `any_of`), optionally sorted by kickoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub base: MatchFilter,
    pub any_of: Vec<MatchFilter>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    Season,
    LeagueName,
    HomeTeam,
}

impl DistinctField {
    fn column(self) -> &'static str {
        match self {
            DistinctField::Season => "season",
            DistinctField::LeagueName => "league_name",
            DistinctField::HomeTeam => "home_team",
        }
    }

    fn value_of(self, m: &Match) -> &str {
        match self {
            DistinctField::Season => &m.season,
            DistinctField::LeagueName => &m.league_name,
            DistinctField::HomeTeam => &m.home_team.name,
        }
    }
}

impl MatchFilter {
    pub fn home(team: &str) -> Self {
        Self {
            home_team: Some(team.to_string()),
            ..Self::default()
        }
    }

    pub fn away(team: &str) -> Self {
        Self {
            away_team: Some(team.to_string()),
            ..Self::default()
        }
    }

    pub fn fixture(home: &str, away: &str) -> Self {
        Self {
            home_team: Some(home.to_string()),
            away_team: Some(away.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, m: &Match) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, got: &T) -> bool {
            want.as_ref().is_none_or(|w| w == got)
        }
        eq(&self.league_name, &m.league_name)
            && eq(&self.season, &m.season)
            && eq(&self.home_team, &m.home_team.name)
            && eq(&self.away_team, &m.away_team.name)
            && eq(&self.home_team_api_id, &m.home_team.api_id)
            && eq(&self.away_team_api_id, &m.away_team.api_id)
    }

    fn sql_terms(&self, values: &mut Vec<Value>) -> Vec<String> {
        let mut terms = Vec::new();
        let mut text = |column: &str, v: &Option<String>, values: &mut Vec<Value>| {
            if let Some(v) = v {
                values.push(Value::Text(v.clone()));
                terms.push(format!("{column} = ?{}", values.len()));
            }
        };
        text("league_name", &self.league_name, values);
        text("season", &self.season, values);
        text("home_team", &self.home_team, values);
        text("away_team", &self.away_team, values);
        for (column, v) in [
            ("home_team_api_id", self.home_team_api_id),
            ("away_team_api_id", self.away_team_api_id),
        ] {
            if let Some(v) = v {
                values.push(Value::Integer(v));
                terms.push(format!("{column} = ?{}", values.len()));
            }
        }
        terms
    }
}

impl MatchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn league(mut self, league_name: &str) -> Self {
        self.base.league_name = Some(league_name.to_string());
        self
    }

    pub fn season(mut self, season: &str) -> Self {
        self.base.season = Some(season.to_string());
        self
    }

    /// Matches where `team` played on either side.
    pub fn involving_team(mut self, team: &str) -> Self {
        self.any_of = vec![MatchFilter::home(team), MatchFilter::away(team)];
        self
    }

    /// Matches between the two teams, whoever hosted.
    pub fn between(mut self, team1: &str, team2: &str) -> Self {
        self.any_of = vec![
            MatchFilter::fixture(team1, team2),
            MatchFilter::fixture(team2, team1),
        ];
        self
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    pub fn matches(&self, m: &Match) -> bool {
        self.base.matches(m) && (self.any_of.is_empty() || self.any_of.iter().any(|f| f.matches(m)))
    }

    fn sql_where(&self) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let mut clauses = self.base.sql_terms(&mut values);
        if !self.any_of.is_empty() {
            let groups: Vec<String> = self
                .any_of
                .iter()
                .map(|f| {
                    let terms = f.sql_terms(&mut values);
                    if terms.is_empty() {
                        "1 = 1".to_string()
                    } else {
                        format!("({})", terms.join(" AND "))
                    }
                })
                .collect();
            clauses.push(format!("({})", groups.join(" OR ")));
        }
        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }

    fn sql_order(&self) -> &'static str {
        match self.sort {
            Some(SortOrder::Descending) => "ORDER BY date DESC, id DESC",
            _ => "ORDER BY date ASC, id ASC",
        }
    }
}

/// Read access to stored matches.
pub trait MatchStore {
    fn find_matches(&self, query: &MatchQuery) -> Result<Vec<Match>>;
    fn count_matches(&self, query: &MatchQuery) -> Result<u64>;
    /// Sorted distinct values of `field` over the matches selected by `query`.
    fn distinct_values(&self, field: DistinctField, query: &MatchQuery) -> Result<Vec<String>>;
}

/// Read access to teams and their attribute history (snapshots oldest first).
pub trait TeamStore {
    fn find_team_by_name(&self, long_name: &str) -> Result<Option<Team>>;
    fn find_team_by_api_id(&self, api_id: i64) -> Result<Option<Team>>;
    fn all_teams(&self) -> Result<Vec<Team>>;
}

/// Serialized dataset: every match with its lineups plus every team with its attribute
/// history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetDump {
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub teams: Vec<Team>,
}

pub fn load_dump(path: &Path) -> Result<DatasetDump> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read dataset {}", path.display()))?;
    let dump = serde_json::from_str::<DatasetDump>(&raw)
        .with_context(|| format!("parse dataset {}", path.display()))?;
    log::info!(
        "loaded {} matches and {} teams from {}",
        dump.matches.len(),
        dump.teams.len(),
        path.display()
    );
    Ok(dump)
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    matches: Vec<Match>,
    teams: Vec<Team>,
}

impl InMemoryStore {
    pub fn new(matches: Vec<Match>, mut teams: Vec<Team>) -> Self {
        for team in &mut teams {
            team.sort_attributes();
        }
        Self { matches, teams }
    }

    pub fn from_dump(dump: DatasetDump) -> Self {
        Self::new(dump.matches, dump.teams)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl MatchStore for InMemoryStore {
    fn find_matches(&self, query: &MatchQuery) -> Result<Vec<Match>> {
        let mut out: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        if query.sort == Some(SortOrder::Descending) {
            out.reverse();
        }
        Ok(out)
    }

    fn count_matches(&self, query: &MatchQuery) -> Result<u64> {
        Ok(self.matches.iter().filter(|m| query.matches(m)).count() as u64)
    }

    fn distinct_values(&self, field: DistinctField, query: &MatchQuery) -> Result<Vec<String>> {
        let mut values: Vec<String> = self
            .matches
            .iter()
            .filter(|m| query.matches(m))
            .map(|m| field.value_of(m).to_string())
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }
}

impl TeamStore for InMemoryStore {
    fn find_team_by_name(&self, long_name: &str) -> Result<Option<Team>> {
        Ok(self.teams.iter().find(|t| t.long_name == long_name).cloned())
    }

    fn find_team_by_api_id(&self, api_id: i64) -> Result<Option<Team>> {
        Ok(self.teams.iter().find(|t| t.api_id == api_id).cloned())
    }

    fn all_teams(&self) -> Result<Vec<Team>> {
        Ok(self.teams.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub matches: usize,
    pub lineup_entries: usize,
    pub teams: usize,
    pub attribute_snapshots: usize,
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

struct MatchRow {
    id: i64,
    date: String,
    season: String,
    league_name: String,
    home_team: String,
    home_team_api_id: i64,
    away_team: String,
    away_team_api_id: i64,
    home_goals: u32,
    away_goals: u32,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        log::debug!("opened match store {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Upserts every match (replacing its lineups), team and attribute snapshot in one
    /// transaction.
    pub fn import_dump(&mut self, dump: &DatasetDump) -> Result<ImportSummary> {
        let tx = self.conn.transaction().context("begin import transaction")?;
        let mut summary = ImportSummary::default();
        for m in &dump.matches {
            upsert_match(&tx, m)?;
            summary.matches += 1;
            summary.lineup_entries += m.home_lineup.len() + m.away_lineup.len();
        }
        for team in &dump.teams {
            upsert_team(&tx, team)?;
            summary.teams += 1;
            summary.attribute_snapshots += team.attributes.len();
        }
        tx.commit().context("commit import transaction")?;
        log::info!(
            "imported {} matches, {} lineup entries, {} teams, {} attribute snapshots",
            summary.matches,
            summary.lineup_entries,
            summary.teams,
            summary.attribute_snapshots
        );
        Ok(summary)
    }

    fn load_lineups(&self, m: &mut Match) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT side, position, player_name FROM lineups WHERE match_id = ?1 ORDER BY side, position",
            )
            .context("prepare lineup query")?;
        let rows = stmt
            .query_map(params![m.id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    PlayerAppearance {
                        position: row.get::<_, u8>(1)?,
                        player_name: row.get(2)?,
                    },
                ))
            })
            .context("query lineups")?;
        for row in rows {
            let (side, player) = row.context("decode lineup row")?;
            match side.as_str() {
                "home" => m.home_lineup.push(player),
                "away" => m.away_lineup.push(player),
                other => return Err(anyhow!("match {} has lineup side {other:?}", m.id)),
            }
        }
        Ok(())
    }

    fn load_team(&self, where_sql: &str, value: Value) -> Result<Option<Team>> {
        let sql = format!("SELECT api_id, long_name, short_name FROM teams WHERE {where_sql} LIMIT 1");
        let team = self
            .conn
            .query_row(&sql, params![value], |row| {
                Ok(Team {
                    api_id: row.get(0)?,
                    long_name: row.get(1)?,
                    short_name: row.get(2)?,
                    attributes: Vec::new(),
                })
            })
            .optional()
            .context("query team")?;
        let Some(mut team) = team else {
            return Ok(None);
        };
        team.attributes = self.load_attributes(team.api_id)?;
        Ok(Some(team))
    }

    fn load_attributes(&self, api_id: i64) -> Result<Vec<TeamAttributeSnapshot>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT date, build_up_play_speed, defence_pressure,
                       chance_creation_shooting, defence_aggression
                FROM team_attributes
                WHERE team_api_id = ?1
                ORDER BY date ASC
                "#,
            )
            .context("prepare attribute query")?;
        let rows = stmt
            .query_map(params![api_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i32>>(1)?,
                    row.get::<_, Option<i32>>(2)?,
                    row.get::<_, Option<i32>>(3)?,
                    row.get::<_, Option<i32>>(4)?,
                ))
            })
            .context("query team attributes")?;
        let mut out = Vec::new();
        for row in rows {
            let (date, speed, pressure, shooting, aggression) =
                row.context("decode attribute row")?;
            out.push(TeamAttributeSnapshot {
                date: match_date::parse(&date)
                    .ok_or_else(|| anyhow!("team {api_id} has bad attribute date {date:?}"))?,
                build_up_play_speed: speed,
                defence_pressure: pressure,
                chance_creation_shooting: shooting,
                defence_aggression: aggression,
            });
        }
        Ok(out)
    }
}

impl MatchStore for SqliteStore {
    fn find_matches(&self, query: &MatchQuery) -> Result<Vec<Match>> {
        let (where_sql, values) = query.sql_where();
        let sql = format!(
            r#"
            SELECT id, date, season, league_name,
                   home_team, home_team_api_id, away_team, away_team_api_id,
                   home_goals, away_goals
            FROM matches
            {where_sql}
            {}
            "#,
            query.sql_order()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare match query")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(MatchRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    season: row.get(2)?,
                    league_name: row.get(3)?,
                    home_team: row.get(4)?,
                    home_team_api_id: row.get(5)?,
                    away_team: row.get(6)?,
                    away_team_api_id: row.get(7)?,
                    home_goals: row.get(8)?,
                    away_goals: row.get(9)?,
                })
            })
            .context("query matches")?;

        let mut out = Vec::new();
        for row in rows {
            let row = row.context("decode match row")?;
            let date = match_date::parse(&row.date)
                .ok_or_else(|| anyhow!("match {} has bad date {:?}", row.id, row.date))?;
            let mut m = Match {
                id: row.id,
                date,
                season: row.season,
                league_name: row.league_name,
                home_team: TeamRef {
                    name: row.home_team,
                    api_id: row.home_team_api_id,
                },
                away_team: TeamRef {
                    name: row.away_team,
                    api_id: row.away_team_api_id,
                },
                home_goals: row.home_goals,
                away_goals: row.away_goals,
                home_lineup: Vec::new(),
                away_lineup: Vec::new(),
            };
            self.load_lineups(&mut m)?;
            out.push(m);
        }
        log::debug!("match query returned {} rows", out.len());
        Ok(out)
    }

    fn count_matches(&self, query: &MatchQuery) -> Result<u64> {
        let (where_sql, values) = query.sql_where();
        let sql = format!("SELECT COUNT(*) FROM matches {where_sql}");
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .context("count matches")?;
        u64::try_from(count).context("negative match count")
    }

    fn distinct_values(&self, field: DistinctField, query: &MatchQuery) -> Result<Vec<String>> {
        let (where_sql, values) = query.sql_where();
        let column = field.column();
        let sql = format!("SELECT DISTINCT {column} FROM matches {where_sql} ORDER BY {column} ASC");
        let mut stmt = self.conn.prepare(&sql).context("prepare distinct query")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))
            .context("query distinct values")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode distinct value")?);
        }
        Ok(out)
    }
}

impl TeamStore for SqliteStore {
    fn find_team_by_name(&self, long_name: &str) -> Result<Option<Team>> {
        self.load_team("long_name = ?1", Value::Text(long_name.to_string()))
    }

    fn find_team_by_api_id(&self, api_id: i64) -> Result<Option<Team>> {
        self.load_team("api_id = ?1", Value::Integer(api_id))
    }

    fn all_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT api_id, long_name, short_name FROM teams ORDER BY long_name ASC")
            .context("prepare team list query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Team {
                    api_id: row.get(0)?,
                    long_name: row.get(1)?,
                    short_name: row.get(2)?,
                    attributes: Vec::new(),
                })
            })
            .context("query teams")?;
        let mut out = Vec::new();
        for row in rows {
            let mut team = row.context("decode team row")?;
            team.attributes = self.load_attributes(team.api_id)?;
            out.push(team);
        }
        Ok(out)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            season TEXT NOT NULL,
            league_name TEXT NOT NULL,
            home_team TEXT NOT NULL,
            home_team_api_id INTEGER NOT NULL,
            away_team TEXT NOT NULL,
            away_team_api_id INTEGER NOT NULL,
            home_goals INTEGER NOT NULL CHECK (home_goals >= 0),
            away_goals INTEGER NOT NULL CHECK (away_goals >= 0)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_matches_league_season ON matches(league_name, season);
        CREATE INDEX IF NOT EXISTS idx_matches_home_team ON matches(home_team);
        CREATE INDEX IF NOT EXISTS idx_matches_away_team ON matches(away_team);
        CREATE INDEX IF NOT EXISTS idx_matches_home_api ON matches(home_team_api_id);
        CREATE INDEX IF NOT EXISTS idx_matches_away_api ON matches(away_team_api_id);

        CREATE TABLE IF NOT EXISTS lineups (
            match_id INTEGER NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            side TEXT NOT NULL CHECK (side IN ('home', 'away')),
            position INTEGER NOT NULL CHECK (position BETWEEN 1 AND 11),
            player_name TEXT NOT NULL,
            PRIMARY KEY (match_id, side, position)
        );

        CREATE TABLE IF NOT EXISTS teams (
            api_id INTEGER PRIMARY KEY,
            long_name TEXT NOT NULL,
            short_name TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_teams_long_name ON teams(long_name);

        CREATE TABLE IF NOT EXISTS team_attributes (
            team_api_id INTEGER NOT NULL REFERENCES teams(api_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            build_up_play_speed INTEGER NULL,
            defence_pressure INTEGER NULL,
            chance_creation_shooting INTEGER NULL,
            defence_aggression INTEGER NULL,
            PRIMARY KEY (team_api_id, date)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &Match) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            id, date, season, league_name,
            home_team, home_team_api_id, away_team, away_team_api_id,
            home_goals, away_goals
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            date = excluded.date,
            season = excluded.season,
            league_name = excluded.league_name,
            home_team = excluded.home_team,
            home_team_api_id = excluded.home_team_api_id,
            away_team = excluded.away_team,
            away_team_api_id = excluded.away_team_api_id,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals
        "#,
        params![
            m.id,
            match_date::format(&m.date),
            m.season,
            m.league_name,
            m.home_team.name,
            m.home_team.api_id,
            m.away_team.name,
            m.away_team.api_id,
            m.home_goals,
            m.away_goals,
        ],
    )
    .with_context(|| format!("upsert match {}", m.id))?;

    tx.execute("DELETE FROM lineups WHERE match_id = ?1", params![m.id])
        .with_context(|| format!("clear lineups for match {}", m.id))?;
    let mut stmt = tx
        .prepare_cached(
            "INSERT OR REPLACE INTO lineups (match_id, side, position, player_name) VALUES (?1, ?2, ?3, ?4)",
        )
        .context("prepare lineup insert")?;
    for (side, lineup) in [("home", &m.home_lineup), ("away", &m.away_lineup)] {
        for p in lineup {
            stmt.execute(params![m.id, side, p.position, p.player_name])
                .with_context(|| format!("insert lineup entry for match {}", m.id))?;
        }
    }
    Ok(())
}

fn upsert_team(tx: &rusqlite::Transaction<'_>, team: &Team) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO teams (api_id, long_name, short_name) VALUES (?1, ?2, ?3)
        ON CONFLICT(api_id) DO UPDATE SET
            long_name = excluded.long_name,
            short_name = excluded.short_name
        "#,
        params![team.api_id, team.long_name, team.short_name],
    )
    .with_context(|| format!("upsert team {}", team.api_id))?;

    let mut stmt = tx
        .prepare_cached(
            r#"
            INSERT INTO team_attributes (
                team_api_id, date, build_up_play_speed, defence_pressure,
                chance_creation_shooting, defence_aggression
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(team_api_id, date) DO UPDATE SET
                build_up_play_speed = excluded.build_up_play_speed,
                defence_pressure = excluded.defence_pressure,
                chance_creation_shooting = excluded.chance_creation_shooting,
                defence_aggression = excluded.defence_aggression
            "#,
        )
        .context("prepare attribute upsert")?;
    for snapshot in &team.attributes {
        stmt.execute(params![
            team.api_id,
            match_date::format(&snapshot.date),
            snapshot.build_up_play_speed,
            snapshot.defence_pressure,
            snapshot.chance_creation_shooting,
            snapshot.defence_aggression,
        ])
        .with_context(|| format!("upsert attributes for team {}", team.api_id))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;

    fn sample() -> Vec<Match> {
        let mut m1 = fixture(1, "2015-08-08 15:00:00", "Arsenal", "Chelsea", 2, 1);
        m1.home_lineup = vec![PlayerAppearance {
            player_name: "Cech".into(),
            position: 1,
        }];
        let mut m2 = fixture(2, "2015-09-01", "Chelsea", "Arsenal", 0, 0);
        m2.season = "2014/2015".into();
        let m3 = fixture(3, "2015-08-15", "Spurs", "Chelsea", 1, 3);
        vec![m1, m2, m3]
    }

    #[test]
    fn query_builds_or_groups() {
        let q = MatchQuery::new().league("England Premier League").between("Arsenal", "Chelsea");
        let (sql, values) = q.sql_where();
        assert_eq!(
            sql,
            "WHERE league_name = ?1 AND ((home_team = ?2 AND away_team = ?3) OR (home_team = ?4 AND away_team = ?5))"
        );
        assert_eq!(values.len(), 5);
        assert_eq!(MatchQuery::new().sql_where().0, "");
    }

    #[test]
    fn in_memory_filters_and_sorts() {
        let store = InMemoryStore::new(sample(), Vec::new());
        let q = MatchQuery::new()
            .involving_team("Chelsea")
            .sorted(SortOrder::Descending);
        let ids: Vec<i64> = store.find_matches(&q).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        let seasons = store
            .distinct_values(DistinctField::Season, &MatchQuery::new())
            .unwrap();
        assert_eq!(seasons, vec!["2014/2015", "2015/2016"]);
        assert_eq!(
            store
                .count_matches(&MatchQuery::new().season("2015/2016"))
                .unwrap(),
            2
        );
    }

    #[test]
    fn sqlite_round_trips_matches_and_teams() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let team = Team {
            api_id: 9825,
            long_name: "Arsenal".into(),
            short_name: "ARS".into(),
            attributes: vec![TeamAttributeSnapshot {
                date: match_date::parse("2015-09-10").unwrap(),
                build_up_play_speed: Some(59),
                defence_pressure: None,
                chance_creation_shooting: Some(64),
                defence_aggression: Some(48),
            }],
        };
        let dump = DatasetDump {
            matches: sample(),
            teams: vec![team.clone()],
        };
        let summary = store.import_dump(&dump).unwrap();
        assert_eq!(summary.matches, 3);
        assert_eq!(summary.lineup_entries, 1);
        // Re-import is an upsert, not a duplicate.
        store.import_dump(&dump).unwrap();

        let q = MatchQuery::new().season("2015/2016").involving_team("Arsenal");
        let found = store.find_matches(&q).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].home_lineup[0].player_name, "Cech");
        assert_eq!(match_date::format(&found[0].date), "2015-08-08 15:00:00");
        assert_eq!(store.count_matches(&MatchQuery::new()).unwrap(), 3);
        assert_eq!(
            store
                .distinct_values(DistinctField::HomeTeam, &MatchQuery::new())
                .unwrap(),
            vec!["Arsenal", "Chelsea", "Spurs"]
        );

        let loaded = store.find_team_by_name("Arsenal").unwrap().unwrap();
        assert_eq!(loaded, team);
        assert!(store.find_team_by_api_id(1).unwrap().is_none());
        assert_eq!(store.all_teams().unwrap().len(), 1);
    }
}
