use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::model::{AttributeIndex, Match, TeamAttributes};

/// Attribute-only feature columns, in vector order.
pub const BASE_FEATURES: [&str; 12] = [
    "home_rating",
    "away_rating",
    "rating_diff",
    "home_build_up",
    "away_build_up",
    "home_defense",
    "away_defense",
    "home_attack",
    "away_attack",
    "attack_diff",
    "defense_diff",
    "home_advantage",
];

/// Appended after the base columns when rolling form is enabled.
pub const FORM_FEATURES: [&str; 3] = ["home_form", "away_form", "form_diff"];

/// Form value for a team with no prior results.
pub const NEUTRAL_FORM: f64 = 0.5;
pub const FORM_LOOKBACK: usize = 5;

pub fn feature_names(with_form: bool) -> Vec<String> {
    let mut names: Vec<String> = BASE_FEATURES.iter().map(|s| s.to_string()).collect();
    if with_form {
        names.extend(FORM_FEATURES.iter().map(|s| s.to_string()));
    }
    names
}

/// Rolling form going into a match for both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormPair {
    pub home: f64,
    pub away: f64,
}

impl FormPair {
    pub fn neutral() -> Self {
        Self {
            home: NEUTRAL_FORM,
            away: NEUTRAL_FORM,
        }
    }
}

/// One column by name. `None` for a name this builder does not know.
pub fn feature_value(
    name: &str,
    home: &TeamAttributes,
    away: &TeamAttributes,
    form: FormPair,
) -> Option<f64> {
    let v = match name {
        "home_rating" => home.rating(),
        "away_rating" => away.rating(),
        "rating_diff" => home.rating() - away.rating(),
        "home_build_up" => f64::from(home.build_up_play_speed),
        "away_build_up" => f64::from(away.build_up_play_speed),
        "home_defense" => f64::from(home.defense()),
        "away_defense" => f64::from(away.defense()),
        "home_attack" => f64::from(home.attack()),
        "away_attack" => f64::from(away.attack()),
        "attack_diff" => f64::from(home.attack() - away.attack()),
        "defense_diff" => f64::from(home.defense() - away.defense()),
        "home_advantage" => 1.0,
        "home_form" => form.home,
        "away_form" => form.away,
        "form_diff" => form.home - form.away,
        _ => return None,
    };
    Some(v)
}

/// Per-team trailing results (1 win, 0.5 draw, 0 loss) keyed by team api id. Owned by a
/// single feature-building run; results are appended only after a match's features are taken.
#[derive(Debug, Clone, Default)]
pub struct FormTracker {
    history: HashMap<i64, VecDeque<f64>>,
}

impl FormTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the team's last five results, or 0.5 before its first one.
    pub fn form_before(&self, api_id: i64) -> f64 {
        match self.history.get(&api_id) {
            Some(results) if !results.is_empty() => {
                results.iter().sum::<f64>() / results.len() as f64
            }
            _ => NEUTRAL_FORM,
        }
    }

    pub fn record(&mut self, api_id: i64, score: f64) {
        let results = self.history.entry(api_id).or_default();
        results.push_back(score);
        while results.len() > FORM_LOOKBACK {
            results.pop_front();
        }
    }

    pub fn teams_tracked(&self) -> usize {
        self.history.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub match_id: i64,
    pub features: Vec<f64>,
    /// 0 away win, 1 draw, 2 home win.
    pub label: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingTable {
    pub feature_names: Vec<String>,
    pub examples: Vec<TrainingExample>,
    /// Matches left out because a side had no attributes.
    pub skipped: usize,
}

impl TrainingTable {
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.examples.iter().map(|e| e.features.clone()).collect()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Builds one example per match where both teams have attributes, walking the whole set in
/// kickoff order. Matches without attributes are skipped and do not move either team's form.
/// The tracker is taken and handed back so a caller can continue a run.
pub fn build_training_table<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
    index: &AttributeIndex,
    with_form: bool,
    mut tracker: FormTracker,
) -> (TrainingTable, FormTracker) {
    let mut ordered: Vec<&Match> = matches.into_iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let names = feature_names(with_form);
    let mut examples = Vec::with_capacity(ordered.len());
    let mut skipped = 0usize;

    for m in ordered {
        let Some((home, away)) = index.pair(m) else {
            skipped += 1;
            continue;
        };
        let form = FormPair {
            home: tracker.form_before(m.home_team_api_id()),
            away: tracker.form_before(m.away_team_api_id()),
        };
        let features = names
            .iter()
            .filter_map(|name| feature_value(name, home, away, form))
            .collect();
        let outcome = m.outcome();
        examples.push(TrainingExample {
            match_id: m.id,
            features,
            label: outcome.label(),
        });

        let [home_side, away_side] = m.sides();
        tracker.record(m.home_team_api_id(), home_side.result().form_score());
        tracker.record(m.away_team_api_id(), away_side.result().form_score());
    }

    log::info!(
        "built {} training examples ({} skipped, {} teams with form)",
        examples.len(),
        skipped,
        tracker.teams_tracked()
    );

    (
        TrainingTable {
            feature_names: names,
            examples,
            skipped,
        },
        tracker,
    )
}
