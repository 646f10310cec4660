//! Request boundary for every analysis: validates input before the store is touched, maps
//! empty selections to `NotFound` and wraps store faults with the operation and its inputs.

use serde::Serialize;

use crate::appearances::{AppearanceReport, player_appearances};
use crate::bundle::{ModelBundle, Prediction};
use crate::correlation::{CorrelationReport, correlate_ratings};
use crate::dataset::{DistinctField, MatchQuery, MatchStore, SortOrder, TeamStore};
use crate::error::{AnalysisError, AnalysisResult};
use crate::features::{FormTracker, TrainingTable, build_training_table};
use crate::form::{FormRecord, league_form, team_form};
use crate::head_to_head::{HeadToHead, analyze_head_to_head};
use crate::model::{AttributeIndex, Match, Team};
use crate::splits::{HomeAwayReport, home_away_report};
use crate::standings::{ScoringReport, StandingsReport, scoring_report, standings_report};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub matches: u64,
    pub leagues: Vec<String>,
    pub seasons: Vec<String>,
    pub teams: usize,
}

/// Analyses over one store. Holds no state between calls.
pub struct Analytics<'a, S> {
    store: &'a S,
}

fn require<'v>(field: &str, value: &'v str) -> AnalysisResult<&'v str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn require_positive(field: &str, value: usize) -> AnalysisResult<usize> {
    if value == 0 {
        return Err(AnalysisError::InvalidInput(format!("{field} must be at least 1")));
    }
    Ok(value)
}

fn scope(league: &str, season: &str) -> String {
    format!("league={league:?}, season={season:?}")
}

impl<'a, S: MatchStore + TeamStore> Analytics<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn fetch(
        &self,
        operation: &'static str,
        params: &str,
        query: &MatchQuery,
    ) -> AnalysisResult<Vec<Match>> {
        self.store
            .find_matches(query)
            .map_err(|e| AnalysisError::computation(operation, params, e))
    }

    /// League/season matches, `NotFound` when there are none.
    fn season_matches(
        &self,
        operation: &'static str,
        league: &str,
        season: &str,
    ) -> AnalysisResult<(Vec<Match>, String)> {
        let league = require("league", league)?;
        let season = require("season", season)?;
        let params = scope(league, season);
        let query = MatchQuery::new().league(league).season(season);
        let matches = self.fetch(operation, &params, &query)?;
        if matches.is_empty() {
            return Err(AnalysisError::NotFound(format!(
                "no matches for {league} {season}"
            )));
        }
        log::debug!("{operation}: {} matches for {params}", matches.len());
        Ok((matches, params))
    }

    fn attribute_index(&self, operation: &'static str, params: &str) -> AnalysisResult<AttributeIndex> {
        let teams = self
            .store
            .all_teams()
            .map_err(|e| AnalysisError::computation(operation, params, e))?;
        Ok(AttributeIndex::from_teams(&teams))
    }

    pub fn team_standings(&self, league: &str, season: &str) -> AnalysisResult<StandingsReport> {
        let (matches, _) = self.season_matches("team_standings", league, season)?;
        Ok(standings_report(&matches))
    }

    pub fn home_away(&self, league: &str, season: &str) -> AnalysisResult<HomeAwayReport> {
        let (matches, _) = self.season_matches("home_away", league, season)?;
        Ok(home_away_report(&matches))
    }

    pub fn scoring_profile(&self, league: &str, season: &str) -> AnalysisResult<ScoringReport> {
        let (matches, _) = self.season_matches("scoring_profile", league, season)?;
        Ok(scoring_report(&matches))
    }

    pub fn head_to_head(
        &self,
        team1: &str,
        team2: &str,
        league: Option<&str>,
    ) -> AnalysisResult<HeadToHead> {
        let team1 = require("team1", team1)?;
        let team2 = require("team2", team2)?;
        if team1 == team2 {
            return Err(AnalysisError::InvalidInput(format!(
                "head-to-head needs two different teams, got {team1:?} twice"
            )));
        }
        let league = league.map(str::trim).filter(|l| !l.is_empty());
        let params = format!("team1={team1:?}, team2={team2:?}, league={league:?}");

        let mut query = MatchQuery::new()
            .between(team1, team2)
            .sorted(SortOrder::Ascending);
        if let Some(league) = league {
            query = query.league(league);
        }
        let matches = self.fetch("head_to_head", &params, &query)?;
        analyze_head_to_head(team1, team2, &matches).ok_or_else(|| {
            AnalysisError::NotFound(format!("no matches between {team1} and {team2}"))
        })
    }

    pub fn player_appearances(
        &self,
        league: &str,
        season: &str,
        limit: usize,
    ) -> AnalysisResult<AppearanceReport> {
        let limit = require_positive("limit", limit)?;
        let (matches, params) = self.season_matches("player_appearances", league, season)?;
        let query = MatchQuery::new().league(league.trim()).season(season.trim());
        let total = self
            .store
            .count_matches(&query)
            .map_err(|e| AnalysisError::computation("player_appearances", &params, e))?;
        Ok(player_appearances(&matches, limit, total))
    }

    pub fn team_form(
        &self,
        team: &str,
        league: &str,
        season: &str,
        window: usize,
    ) -> AnalysisResult<FormRecord> {
        let team = require("team", team)?;
        let league = require("league", league)?;
        let season = require("season", season)?;
        let window = require_positive("window", window)?;
        let params = format!("team={team:?}, {}, window={window}", scope(league, season));

        let query = MatchQuery::new()
            .league(league)
            .season(season)
            .involving_team(team)
            .sorted(SortOrder::Ascending);
        let matches = self.fetch("team_form", &params, &query)?;
        team_form(team, &matches, window).ok_or_else(|| {
            AnalysisError::NotFound(format!("no matches for {team} in {league} {season}"))
        })
    }

    pub fn league_form(
        &self,
        league: &str,
        season: &str,
        window: usize,
    ) -> AnalysisResult<Vec<FormRecord>> {
        let window = require_positive("window", window)?;
        let (matches, _) = self.season_matches("league_form", league, season)?;
        Ok(league_form(&matches, window))
    }

    pub fn rating_correlation(&self, league: &str, season: &str) -> AnalysisResult<CorrelationReport> {
        let (matches, params) = self.season_matches("rating_correlation", league, season)?;
        let index = self.attribute_index("rating_correlation", &params)?;
        Ok(correlate_ratings(&matches, &index))
    }

    /// Example table over every stored match, in kickoff order.
    pub fn training_table(&self, with_form: bool) -> AnalysisResult<TrainingTable> {
        let params = format!("with_form={with_form}");
        let query = MatchQuery::new().sorted(SortOrder::Ascending);
        let matches = self.fetch("training_table", &params, &query)?;
        if matches.is_empty() {
            return Err(AnalysisError::NotFound("no matches in the dataset".to_string()));
        }
        let index = self.attribute_index("training_table", &params)?;
        let (table, _) = build_training_table(&matches, &index, with_form, FormTracker::new());
        Ok(table)
    }

    fn team_by_name(&self, operation: &'static str, params: &str, name: &str) -> AnalysisResult<Team> {
        self.store
            .find_team_by_name(name)
            .map_err(|e| AnalysisError::computation(operation, params, e))?
            .ok_or_else(|| AnalysisError::NotFound(format!("unknown team {name}")))
    }

    /// Scores a fixture with the bundle. Teams without attribute history are scored with the
    /// neutral profile.
    pub fn predict(
        &self,
        bundle: &ModelBundle,
        home_team: &str,
        away_team: &str,
    ) -> AnalysisResult<Prediction> {
        let home_team = require("home_team", home_team)?;
        let away_team = require("away_team", away_team)?;
        let params = format!("home_team={home_team:?}, away_team={away_team:?}");

        let home = self.team_by_name("predict", &params, home_team)?;
        let away = self.team_by_name("predict", &params, away_team)?;
        bundle
            .predict(
                home_team,
                &home.current_attributes(),
                away_team,
                &away.current_attributes(),
            )
            .map_err(|e| AnalysisError::computation("predict", params, e))
    }

    pub fn dataset_summary(&self) -> AnalysisResult<DatasetSummary> {
        let all = MatchQuery::new();
        let fault = |e| AnalysisError::computation("dataset_summary", "", e);
        Ok(DatasetSummary {
            matches: self.store.count_matches(&all).map_err(fault)?,
            leagues: self
                .store
                .distinct_values(DistinctField::LeagueName, &all)
                .map_err(fault)?,
            seasons: self
                .store
                .distinct_values(DistinctField::Season, &all)
                .map_err(fault)?,
            teams: self.store.all_teams().map_err(fault)?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryStore;
    use crate::testutil::fixture;
    use anyhow::{Context, Result, anyhow};

    /// Store whose backing database is gone.
    struct BrokenStore;

    impl MatchStore for BrokenStore {
        fn find_matches(&self, _query: &MatchQuery) -> Result<Vec<Match>> {
            Err(anyhow!("disk I/O error")).context("query matches")
        }

        fn count_matches(&self, _query: &MatchQuery) -> Result<u64> {
            Err(anyhow!("disk I/O error"))
        }

        fn distinct_values(&self, _field: DistinctField, _query: &MatchQuery) -> Result<Vec<String>> {
            Err(anyhow!("disk I/O error"))
        }
    }

    impl TeamStore for BrokenStore {
        fn find_team_by_name(&self, _long_name: &str) -> Result<Option<Team>> {
            Err(anyhow!("disk I/O error"))
        }

        fn find_team_by_api_id(&self, _api_id: i64) -> Result<Option<Team>> {
            Err(anyhow!("disk I/O error"))
        }

        fn all_teams(&self) -> Result<Vec<Team>> {
            Err(anyhow!("disk I/O error"))
        }
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new(
            vec![
                fixture(1, "2015-08-08", "A", "B", 2, 1),
                fixture(2, "2015-08-15", "B", "A", 1, 0),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn validation_runs_before_lookup() {
        let store = store();
        let analytics = Analytics::new(&store);
        let err = analytics.team_standings(" ", "2015/2016").unwrap_err();
        assert!(err.is_invalid_input());
        let err = analytics.head_to_head("A", "A", None).unwrap_err();
        assert!(err.is_invalid_input());
        let err = analytics.team_form("A", "England Premier League", "2015/2016", 0).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn empty_selections_are_not_found() {
        let store = store();
        let analytics = Analytics::new(&store);
        assert!(analytics.team_standings("Spain LIGA BBVA", "2015/2016").unwrap_err().is_not_found());
        assert!(analytics.head_to_head("A", "C", None).unwrap_err().is_not_found());
        assert!(
            analytics
                .team_form("Z", "England Premier League", "2015/2016", 5)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn standings_through_the_boundary() {
        let store = store();
        let analytics = Analytics::new(&store);
        let report = analytics
            .team_standings("England Premier League", "2015/2016")
            .unwrap();
        assert_eq!(report.standings.len(), 2);
        let summary = analytics.dataset_summary().unwrap();
        assert_eq!(summary.matches, 2);
        assert_eq!(summary.seasons, vec!["2015/2016"]);
    }

    #[test]
    fn store_faults_carry_operation_and_inputs() {
        let analytics = Analytics::new(&BrokenStore);
        let err = analytics
            .team_standings("England Premier League", "2015/2016")
            .unwrap_err();
        match err {
            AnalysisError::Computation {
                operation,
                params,
                message,
            } => {
                assert_eq!(operation, "team_standings");
                assert!(params.contains("England Premier League"), "{params}");
                assert!(params.contains("2015/2016"), "{params}");
                assert!(message.contains("disk I/O error"), "{message}");
            }
            other => panic!("expected a computation fault, got {other:?}"),
        }

        // Validation still wins over the broken store.
        assert!(analytics.team_standings("", "2015/2016").unwrap_err().is_invalid_input());
        let err = analytics.dataset_summary().unwrap_err();
        assert!(matches!(err, AnalysisError::Computation { operation: "dataset_summary", .. }));
    }

    #[test]
    fn home_away_includes_league_mean() {
        let store = store();
        let analytics = Analytics::new(&store);
        let report = analytics
            .home_away("England Premier League", "2015/2016")
            .unwrap();
        // A: 100 - 0, B: 100 - 0.
        assert_eq!(report.avg_advantage, 100.0);
        assert_eq!(report.results.len(), 2);
    }
}
