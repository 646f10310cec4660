use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, OutcomeModel, argmax};
use crate::features::{FORM_FEATURES, FormPair, feature_value};
use crate::model::{Outcome, TeamAttributes};
use crate::rounding::{round1, round2};
use crate::training::{StandardScaler, TrainingOutcome};

pub const BUNDLE_VERSION: u32 = 1;

static GLOBAL_BUNDLE: OnceCell<ModelBundle> = OnceCell::new();

/// Everything the prediction path needs: the fitted model, its scaler and the feature order
/// used at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    pub generated_at: String,
    pub model_name: String,
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub model: OutcomeModel,
    pub train_samples: usize,
    pub test_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub away_win: f64,
    pub draw: f64,
    pub home_win: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideAttributes {
    pub rating: f64,
    pub attack: i32,
    pub defense: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupAttributes {
    pub home: SideAttributes,
    pub away: SideAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub home_team: String,
    pub away_team: String,
    /// Percentages, two decimals.
    pub probabilities: OutcomeProbabilities,
    pub prediction: String,
    pub confidence: f64,
    pub team_attributes: MatchupAttributes,
}

impl SideAttributes {
    fn from_attributes(attrs: &TeamAttributes) -> Self {
        Self {
            rating: round1(attrs.rating()),
            attack: attrs.attack(),
            defense: attrs.defense(),
        }
    }
}

impl ModelBundle {
    pub fn from_training(outcome: TrainingOutcome) -> Self {
        Self {
            version: BUNDLE_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            model_name: outcome.model.name().to_string(),
            feature_names: outcome.feature_names,
            scaler: outcome.scaler,
            model: outcome.model,
            train_samples: outcome.train_samples,
            test_accuracy: outcome.evaluation.accuracy,
        }
    }

    pub fn uses_form(&self) -> bool {
        self.feature_names.iter().any(|n| n == FORM_FEATURES[0])
    }

    fn validate(&self) -> Result<()> {
        if self.version != BUNDLE_VERSION {
            return Err(anyhow!(
                "unsupported model bundle version {} (expected {BUNDLE_VERSION})",
                self.version
            ));
        }
        let width = self.feature_names.len();
        if self.scaler.width() != width || self.model.n_features() != width {
            return Err(anyhow!(
                "model bundle shape mismatch: {} features, scaler {}, model {}",
                width,
                self.scaler.width(),
                self.model.n_features()
            ));
        }
        Ok(())
    }

    /// Rebuilds the training-time feature row for a fixture. Form columns get the neutral
    /// 0.5/0.5/0.0 values.
    pub fn feature_row(&self, home: &TeamAttributes, away: &TeamAttributes) -> Result<Vec<f64>> {
        self.feature_names
            .iter()
            .map(|name| {
                feature_value(name, home, away, FormPair::neutral())
                    .ok_or_else(|| anyhow!("model bundle uses unknown feature {name:?}"))
            })
            .collect()
    }

    pub fn predict(
        &self,
        home_team: &str,
        home: &TeamAttributes,
        away_team: &str,
        away: &TeamAttributes,
    ) -> Result<Prediction> {
        let row = self.feature_row(home, away)?;
        let probs = self.model.predict_proba(&self.scaler.transform(&row));
        let best = argmax(&probs);
        let label = Outcome::from_label(best)
            .map(Outcome::display_name)
            .context("classifier returned an unknown label")?;

        Ok(Prediction {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            probabilities: OutcomeProbabilities {
                away_win: round2(probs[0] * 100.0),
                draw: round2(probs[1] * 100.0),
                home_win: round2(probs[2] * 100.0),
            },
            prediction: label.to_string(),
            confidence: round2(probs[best] * 100.0),
            team_attributes: MatchupAttributes {
                home: SideAttributes::from_attributes(home),
                away: SideAttributes::from_attributes(away),
            },
        })
    }
}

/// Writes next to the target and renames over it, so readers never see a partial bundle.
pub fn save_bundle(bundle: &ModelBundle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create model directory {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(bundle).context("serialize model bundle")?;
    fs::write(&tmp, json).with_context(|| format!("write model bundle {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap model bundle {}", path.display()))?;
    log::info!("saved {} bundle to {}", bundle.model_name, path.display());
    Ok(())
}

pub fn load_bundle(path: &Path) -> Result<ModelBundle> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read model bundle {}", path.display()))?;
    let bundle = serde_json::from_str::<ModelBundle>(&raw)
        .with_context(|| format!("parse model bundle {}", path.display()))?;
    bundle.validate()?;
    log::info!(
        "loaded {} bundle ({} features) from {}",
        bundle.model_name,
        bundle.feature_names.len(),
        path.display()
    );
    Ok(bundle)
}

/// Process-wide bundle, loaded on first use and never replaced. Later calls ignore `path`.
pub fn global_bundle(path: &Path) -> Result<&'static ModelBundle> {
    GLOBAL_BUNDLE.get_or_try_init(|| load_bundle(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LogisticModel;

    fn tiny_bundle(feature_names: Vec<String>) -> ModelBundle {
        let width = feature_names.len();
        let mut coefficients = vec![vec![0.0; width]; 3];
        // Home win grows with the rating gap (column 2).
        coefficients[2][2] = 1.0;
        coefficients[0][2] = -1.0;
        ModelBundle {
            version: BUNDLE_VERSION,
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            model_name: "Logistic Regression".to_string(),
            feature_names,
            scaler: StandardScaler {
                mean: vec![0.0; width],
                scale: vec![1.0; width],
            },
            model: OutcomeModel::Logistic(LogisticModel {
                coefficients,
                intercepts: [0.0; 3],
            }),
            train_samples: 10,
            test_accuracy: 0.5,
        }
    }

    #[test]
    fn prediction_favours_stronger_home_side() {
        let bundle = tiny_bundle(crate::features::feature_names(false));
        let strong = TeamAttributes {
            build_up_play_speed: 70,
            defence_pressure: 66,
            chance_creation_shooting: 71,
            defence_aggression: 50,
        };
        let p = bundle
            .predict("Home", &strong, "Away", &TeamAttributes::neutral())
            .unwrap();
        assert_eq!(p.prediction, "Home Win");
        assert!(p.probabilities.home_win > 99.0);
        assert_eq!(p.confidence, p.probabilities.home_win);
        assert_eq!(p.team_attributes.home.rating, 69.0);
        assert_eq!(p.team_attributes.home.attack, 71);
        assert_eq!(p.team_attributes.away.defense, 50);
    }

    #[test]
    fn form_columns_only_when_bundle_has_them() {
        let with_form = tiny_bundle(crate::features::feature_names(true));
        assert!(with_form.uses_form());
        let row = with_form
            .feature_row(&TeamAttributes::neutral(), &TeamAttributes::neutral())
            .unwrap();
        assert_eq!(&row[12..], &[0.5, 0.5, 0.0]);

        let plain = tiny_bundle(crate::features::feature_names(false));
        assert!(!plain.uses_form());

        let mut unknown = tiny_bundle(vec!["home_rating".into(), "xg".into(), "z".into()]);
        unknown.model_name = "broken".into();
        assert!(
            unknown
                .feature_row(&TeamAttributes::neutral(), &TeamAttributes::neutral())
                .is_err()
        );
    }

    #[test]
    fn save_then_load_and_reject_partial_files() {
        let dir = std::env::temp_dir().join(format!("soccer_bundle_{}", std::process::id()));
        let path = dir.join("outcome_model.json");
        let bundle = tiny_bundle(crate::features::feature_names(false));
        save_bundle(&bundle, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        let loaded = load_bundle(&path).unwrap();
        assert_eq!(loaded.feature_names, bundle.feature_names);

        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, &raw[..raw.len() / 2]).unwrap();
        assert!(load_bundle(&path).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
