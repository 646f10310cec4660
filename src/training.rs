use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ForestParams, LogisticModel, N_CLASSES, OutcomeModel, RandomForest};
use crate::features::TrainingTable;
use crate::model::Outcome;

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Holdout split that keeps each label's share of the test set as close as whole rows allow.
///
/// The test set holds `ceil(n * test_fraction)` rows. Each class gets the floor of its exact
/// share and leftover slots go to the largest remainders (bigger classes first on ties).
/// Rows inside a class are shuffled with a seeded RNG before the test slice is taken.
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(anyhow!("test fraction must be in (0, 1), got {test_fraction}"));
    }
    let n = labels.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(anyhow!(
            "cannot split {n} rows into non-empty train/test partitions"
        ));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); N_CLASSES];
    for (i, &label) in labels.iter().enumerate() {
        by_class
            .get_mut(label)
            .ok_or_else(|| anyhow!("label {label} out of range"))?
            .push(i);
    }

    let exact: Vec<f64> = by_class
        .iter()
        .map(|rows| n_test as f64 * rows.len() as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut order: Vec<usize> = (0..N_CLASSES).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
            .then_with(|| by_class[b].len().cmp(&by_class[a].len()))
    });
    let mut left = n_test - alloc.iter().sum::<usize>();
    for &c in order.iter().cycle().take(N_CLASSES * 2) {
        if left == 0 {
            break;
        }
        if alloc[c] < by_class[c].len() {
            alloc[c] += 1;
            left -= 1;
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (rows, take) in by_class.iter_mut().zip(alloc) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Per-column standardization fit on training rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Population standard deviation; constant columns use 1.
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().context("cannot fit scaler on zero rows")?;
        let width = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                let d = x - m;
                *v += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > 1e-12 { std } else { 1.0 }
            })
            .collect();
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    /// Away win, draw, home win.
    pub per_class: Vec<ClassMetrics>,
    /// Rows are true labels, columns predictions.
    pub confusion: [[usize; N_CLASSES]; N_CLASSES],
}

pub fn evaluate(truth: &[usize], predicted: &[usize]) -> Evaluation {
    let mut confusion = [[0usize; N_CLASSES]; N_CLASSES];
    for (&t, &p) in truth.iter().zip(predicted) {
        if t < N_CLASSES && p < N_CLASSES {
            confusion[t][p] += 1;
        }
    }
    let total: usize = confusion.iter().flatten().sum();
    let correct: usize = (0..N_CLASSES).map(|c| confusion[c][c]).sum();

    let per_class = (0..N_CLASSES)
        .map(|c| {
            let tp = confusion[c][c] as f64;
            let support: usize = confusion[c].iter().sum();
            let predicted_c: usize = (0..N_CLASSES).map(|r| confusion[r][c]).sum();
            let precision = if predicted_c > 0 { tp / predicted_c as f64 } else { 0.0 };
            let recall = if support > 0 { tp / support as f64 } else { 0.0 };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: Outcome::from_label(c)
                    .map(|o| o.display_name().to_string())
                    .unwrap_or_default(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    Evaluation {
        accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
        per_class,
        confusion,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub forest: ForestParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            forest: ForestParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub model_name: String,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub model: OutcomeModel,
    pub train_samples: usize,
    pub test_samples: usize,
    pub candidates: Vec<CandidateResult>,
    /// Evaluation of the selected model on the holdout rows.
    pub evaluation: Evaluation,
    /// Selected model's importances, largest first.
    pub importances: Vec<FeatureImportance>,
}

impl TrainingOutcome {
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }
}

/// Splits, scales, fits every candidate classifier and keeps the one with the best holdout
/// accuracy (the earlier candidate on ties).
pub fn train_and_select(table: &TrainingTable, config: &TrainingConfig) -> Result<TrainingOutcome> {
    let labels = table.labels();
    let mut counts = [0usize; N_CLASSES];
    for &label in &labels {
        if label < N_CLASSES {
            counts[label] += 1;
        }
    }
    if let Some(missing) = counts.iter().position(|&c| c == 0) {
        let name = Outcome::from_label(missing).map_or("unknown", Outcome::display_name);
        return Err(anyhow!("no training examples labelled {name}"));
    }

    let split = stratified_split(&labels, config.test_fraction, config.seed)
        .context("split training table")?;
    let rows = table.rows();
    let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
        (
            idx.iter().map(|&i| rows[i].clone()).collect(),
            idx.iter().map(|&i| labels[i]).collect(),
        )
    };
    let (train_x, train_y) = pick(&split.train);
    let (test_x, test_y) = pick(&split.test);

    let scaler = StandardScaler::fit(&train_x).context("fit feature scaler")?;
    let train_x = scaler.transform_all(&train_x);
    let test_x = scaler.transform_all(&test_x);
    log::info!(
        "training on {} rows, holding out {} ({} features)",
        train_x.len(),
        test_x.len(),
        scaler.width()
    );

    let candidates = vec![
        OutcomeModel::Logistic(
            LogisticModel::fit(&train_x, &train_y).context("fit logistic regression")?,
        ),
        OutcomeModel::Forest(
            RandomForest::fit(&train_x, &train_y, config.forest).context("fit random forest")?,
        ),
    ];

    let mut results = Vec::with_capacity(candidates.len());
    let mut best: Option<(usize, f64)> = None;
    for (i, model) in candidates.iter().enumerate() {
        let predicted: Vec<usize> = test_x.iter().map(|x| model.predict(x)).collect();
        let evaluation = evaluate(&test_y, &predicted);
        log::info!(
            "{}: holdout accuracy {:.2}%",
            model.name(),
            evaluation.accuracy * 100.0
        );
        if best.is_none_or(|(_, acc)| evaluation.accuracy > acc) {
            best = Some((i, evaluation.accuracy));
        }
        results.push(CandidateResult {
            model_name: model.name().to_string(),
            evaluation,
        });
    }

    let (best_idx, _) = best.context("no candidate models were trained")?;
    let evaluation = results[best_idx].evaluation.clone();
    let model = candidates
        .into_iter()
        .nth(best_idx)
        .context("selected model missing")?;

    let mut importances: Vec<FeatureImportance> = table
        .feature_names
        .iter()
        .zip(model.feature_importances())
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    Ok(TrainingOutcome {
        feature_names: table.feature_names.clone(),
        scaler,
        model,
        train_samples: train_y.len(),
        test_samples: test_y.len(),
        candidates: results,
        evaluation,
        importances,
    })
}
