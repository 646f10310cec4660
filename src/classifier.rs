use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const N_CLASSES: usize = 3;

const LR_START: f64 = 0.5;
const MAX_ITERS: usize = 1000;
const IMPROVEMENT_EPS: f64 = 1e-6;
const CHECK_EVERY: usize = 20;
const PATIENCE: usize = 10;

/// Three-way outcome classifier over a standardized feature row.
pub trait Classifier {
    /// Probabilities for labels 0 (away win), 1 (draw), 2 (home win).
    fn predict_proba(&self, x: &[f64]) -> [f64; N_CLASSES];

    fn predict(&self, x: &[f64]) -> usize {
        argmax(&self.predict_proba(x))
    }

    /// One non-negative weight per feature, summing to 1 (all zero if nothing was learned).
    fn feature_importances(&self) -> Vec<f64>;
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// `n / (classes * count_c)` per sample, so every class carries the same total weight.
pub fn balanced_weights(labels: &[usize]) -> Result<Vec<f64>> {
    let mut counts = [0usize; N_CLASSES];
    for &label in labels {
        let slot = counts
            .get_mut(label)
            .ok_or_else(|| anyhow!("label {label} out of range"))?;
        *slot += 1;
    }
    let n = labels.len() as f64;
    Ok(labels
        .iter()
        .map(|&label| n / (N_CLASSES as f64 * counts[label] as f64))
        .collect())
}

fn normalized(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in &mut values {
            *v /= total;
        }
    }
    values
}

fn check_inputs(rows: &[Vec<f64>], labels: &[usize]) -> Result<usize> {
    if rows.is_empty() {
        return Err(anyhow!("no training rows"));
    }
    if rows.len() != labels.len() {
        return Err(anyhow!(
            "row/label count mismatch: {} rows, {} labels",
            rows.len(),
            labels.len()
        ));
    }
    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return Err(anyhow!("ragged feature rows"));
    }
    Ok(width)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeModel {
    Logistic(LogisticModel),
    Forest(RandomForest),
}

impl OutcomeModel {
    pub fn name(&self) -> &'static str {
        match self {
            OutcomeModel::Logistic(_) => "Logistic Regression",
            OutcomeModel::Forest(_) => "Random Forest",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            OutcomeModel::Logistic(m) => m.coefficients.first().map_or(0, Vec::len),
            OutcomeModel::Forest(m) => m.n_features,
        }
    }
}

impl Classifier for OutcomeModel {
    fn predict_proba(&self, x: &[f64]) -> [f64; N_CLASSES] {
        match self {
            OutcomeModel::Logistic(m) => m.predict_proba(x),
            OutcomeModel::Forest(m) => m.predict_proba(x),
        }
    }

    fn feature_importances(&self) -> Vec<f64> {
        match self {
            OutcomeModel::Logistic(m) => m.feature_importances(),
            OutcomeModel::Forest(m) => m.feature_importances(),
        }
    }
}

/// Multinomial logistic regression, class-balanced, fit by full-batch gradient descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One coefficient row per class.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: [f64; N_CLASSES],
}

impl LogisticModel {
    pub fn fit(rows: &[Vec<f64>], labels: &[usize]) -> Result<Self> {
        let width = check_inputs(rows, labels)?;
        let weights = balanced_weights(labels)?;
        let wsum: f64 = weights.iter().sum();
        // Same penalty scale as C = 1 on the summed loss.
        let l2 = 1.0 / rows.len() as f64;

        let mut model = Self {
            coefficients: vec![vec![0.0; width]; N_CLASSES],
            intercepts: [0.0; N_CLASSES],
        };
        let mut best = model.clone();
        let mut best_loss = model.loss(rows, labels, &weights, l2);
        let mut no_improve = 0usize;

        for iter in 0..MAX_ITERS {
            let mut grad_w = vec![vec![0.0; width]; N_CLASSES];
            let mut grad_b = [0.0; N_CLASSES];
            for ((x, &label), &w) in rows.iter().zip(labels).zip(&weights) {
                let p = model.predict_proba(x);
                for c in 0..N_CLASSES {
                    let target = if c == label { 1.0 } else { 0.0 };
                    let dz = w * (p[c] - target);
                    grad_b[c] += dz;
                    for (g, xj) in grad_w[c].iter_mut().zip(x) {
                        *g += dz * xj;
                    }
                }
            }

            let lr = LR_START / (1.0 + iter as f64 * 0.003);
            for c in 0..N_CLASSES {
                model.intercepts[c] -= lr * grad_b[c] / wsum;
                for j in 0..width {
                    let g = grad_w[c][j] / wsum + l2 * model.coefficients[c][j];
                    model.coefficients[c][j] -= lr * g;
                }
            }

            if iter % CHECK_EVERY == 0 || iter + 1 == MAX_ITERS {
                let loss = model.loss(rows, labels, &weights, l2);
                if loss + IMPROVEMENT_EPS < best_loss {
                    best_loss = loss;
                    best = model.clone();
                    no_improve = 0;
                } else {
                    no_improve += 1;
                    if no_improve >= PATIENCE {
                        break;
                    }
                }
            }
        }

        log::debug!("logistic regression converged at weighted log loss {best_loss:.4}");
        Ok(best)
    }

    fn loss(&self, rows: &[Vec<f64>], labels: &[usize], weights: &[f64], l2: f64) -> f64 {
        let mut sum = 0.0;
        let mut wsum = 0.0;
        for ((x, &label), &w) in rows.iter().zip(labels).zip(weights) {
            let p = self.predict_proba(x);
            sum += -w * p[label].max(1e-12).ln();
            wsum += w;
        }
        let penalty: f64 = self
            .coefficients
            .iter()
            .flatten()
            .map(|c| c * c)
            .sum::<f64>()
            * l2
            / 2.0;
        sum / wsum.max(1e-12) + penalty
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, x: &[f64]) -> [f64; N_CLASSES] {
        let mut z = self.intercepts;
        for (c, coeffs) in self.coefficients.iter().enumerate() {
            z[c] += coeffs.iter().zip(x).map(|(a, b)| a * b).sum::<f64>();
        }
        softmax(z)
    }

    fn feature_importances(&self) -> Vec<f64> {
        let width = self.coefficients.first().map_or(0, Vec::len);
        let mean_abs = (0..width)
            .map(|j| {
                self.coefficients.iter().map(|row| row[j].abs()).sum::<f64>() / N_CLASSES as f64
            })
            .collect();
        normalized(mean_abs)
    }
}

fn softmax(z: [f64; N_CLASSES]) -> [f64; N_CLASSES] {
    let mx = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut e = z.map(|v| (v - mx).exp());
    let den: f64 = e.iter().sum::<f64>().max(1e-12);
    for v in &mut e {
        *v /= den;
    }
    e
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 20,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        probs: [f64; N_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

/// Shared, read-only inputs for growing one tree.
struct GrowContext<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    weights: &'a [f64],
    max_features: usize,
    params: ForestParams,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    child_impurity: f64,
    left_weight: f64,
    left_gini: f64,
    right_weight: f64,
    right_gini: f64,
}

fn gini(totals: &[f64; N_CLASSES], weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    1.0 - totals.iter().map(|t| (t / weight).powi(2)).sum::<f64>()
}

impl DecisionTree {
    /// Grows a CART tree on a bootstrap sample. Returns the tree and its raw impurity
    /// decrease per feature.
    fn grow(ctx: &GrowContext<'_>, rng: &mut StdRng) -> (Self, Vec<f64>) {
        let n = ctx.rows.len();
        let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let mut tree = Self { nodes: Vec::new() };
        let mut importances = vec![0.0; ctx.rows[0].len()];
        tree.grow_node(ctx, rng, sample, 0, &mut importances);
        (tree, importances)
    }

    fn grow_node(
        &mut self,
        ctx: &GrowContext<'_>,
        rng: &mut StdRng,
        sample: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
    ) -> usize {
        let mut totals = [0.0; N_CLASSES];
        for &i in &sample {
            totals[ctx.labels[i]] += ctx.weights[i];
        }
        let weight: f64 = totals.iter().sum();
        let impurity = gini(&totals, weight);

        let idx = self.nodes.len();
        let leaf = TreeNode::Leaf {
            probs: if weight > 0.0 {
                totals.map(|t| t / weight)
            } else {
                [1.0 / N_CLASSES as f64; N_CLASSES]
            },
        };
        self.nodes.push(leaf);

        if depth >= ctx.params.max_depth
            || sample.len() < ctx.params.min_samples_split
            || impurity <= 0.0
        {
            return idx;
        }
        let Some(best) = best_split(ctx, rng, &sample, weight) else {
            return idx;
        };
        if best.child_impurity >= impurity - 1e-12 {
            return idx;
        }

        importances[best.feature] += weight * impurity
            - best.left_weight * best.left_gini
            - best.right_weight * best.right_gini;

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| ctx.rows[i][best.feature] <= best.threshold);
        let left = self.grow_node(ctx, rng, left, depth + 1, importances);
        let right = self.grow_node(ctx, rng, right, depth + 1, importances);
        self.nodes[idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn predict_proba(&self, x: &[f64]) -> [f64; N_CLASSES] {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { probs }) => return *probs,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return [1.0 / N_CLASSES as f64; N_CLASSES],
            }
        }
    }
}

/// Best weighted-gini threshold over a random subset of `max_features` columns.
fn best_split(
    ctx: &GrowContext<'_>,
    rng: &mut StdRng,
    sample: &[usize],
    weight: f64,
) -> Option<BestSplit> {
    let width = ctx.rows[0].len();
    let candidates = rand::seq::index::sample(rng, width, ctx.max_features.min(width));
    let mut best: Option<BestSplit> = None;
    let mut order = sample.to_vec();

    for feature in candidates.iter() {
        order.sort_by(|&a, &b| ctx.rows[a][feature].total_cmp(&ctx.rows[b][feature]));
        let mut left = [0.0; N_CLASSES];
        let mut left_weight = 0.0;
        let mut right = [0.0; N_CLASSES];
        for &i in &order {
            right[ctx.labels[i]] += ctx.weights[i];
        }

        for pos in 0..order.len() - 1 {
            let i = order[pos];
            let w = ctx.weights[i];
            left[ctx.labels[i]] += w;
            right[ctx.labels[i]] -= w;
            left_weight += w;

            let here = ctx.rows[i][feature];
            let next = ctx.rows[order[pos + 1]][feature];
            if next <= here {
                continue;
            }
            let right_weight = weight - left_weight;
            let left_gini = gini(&left, left_weight);
            let right_gini = gini(&right, right_weight);
            let child_impurity = (left_weight * left_gini + right_weight * right_gini) / weight;
            if best.is_none_or(|b| child_impurity < b.child_impurity) {
                best = Some(BestSplit {
                    feature,
                    threshold: (here + next) / 2.0,
                    child_impurity,
                    left_weight,
                    left_gini,
                    right_weight,
                    right_gini,
                });
            }
        }
    }
    best
}

/// Bagged CART trees with class-balanced sample weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(rows: &[Vec<f64>], labels: &[usize], params: ForestParams) -> Result<Self> {
        let width = check_inputs(rows, labels)?;
        if params.n_trees == 0 {
            return Err(anyhow!("random forest needs at least one tree"));
        }
        let weights = balanced_weights(labels)?;
        let ctx = GrowContext {
            rows,
            labels,
            weights: &weights,
            max_features: ((width as f64).sqrt() as usize).max(1),
            params,
        };

        let grown: Vec<(DecisionTree, Vec<f64>)> = (0..params.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                DecisionTree::grow(&ctx, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; width];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, raw) in grown {
            for (acc, v) in importances.iter_mut().zip(normalized(raw)) {
                *acc += v;
            }
            trees.push(tree);
        }
        log::debug!("grew {} trees over {} features", trees.len(), width);

        Ok(Self {
            params,
            n_features: width,
            trees,
            importances: normalized(importances),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, x: &[f64]) -> [f64; N_CLASSES] {
        if self.trees.is_empty() {
            return [1.0 / N_CLASSES as f64; N_CLASSES];
        }
        let mut acc = [0.0; N_CLASSES];
        for tree in &self.trees {
            let p = tree.predict_proba(x);
            for c in 0..N_CLASSES {
                acc[c] += p[c];
            }
        }
        acc.map(|v| v / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label follows the sign of the first column; the second column is noise.
    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..90 {
            let class = i % 3;
            let centre = class as f64 * 2.0 - 2.0;
            let jitter = ((i * 7) % 10) as f64 / 20.0 - 0.25;
            rows.push(vec![centre + jitter, ((i * 13) % 11) as f64 / 5.0 - 1.0]);
            labels.push(class);
        }
        (rows, labels)
    }

    fn accuracy(model: &impl Classifier, rows: &[Vec<f64>], labels: &[usize]) -> f64 {
        let hits = rows
            .iter()
            .zip(labels)
            .filter(|(x, y)| model.predict(x) == **y)
            .count();
        hits as f64 / rows.len() as f64
    }

    #[test]
    fn balanced_weights_equalise_class_totals() {
        let labels = vec![0, 1, 1, 2, 2, 2];
        let w = balanced_weights(&labels).unwrap();
        assert!((w[0] - 2.0).abs() < 1e-12);
        assert!((w[1] - 1.0).abs() < 1e-12);
        assert!((w[3] - 2.0 / 3.0).abs() < 1e-12);
        assert!(balanced_weights(&[0, 3]).is_err());
    }

    #[test]
    fn logistic_separates_clusters() {
        let (rows, labels) = separable();
        let model = LogisticModel::fit(&rows, &labels).unwrap();
        assert!(accuracy(&model, &rows, &labels) > 0.9);
        let p = model.predict_proba(&rows[0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let imp = model.feature_importances();
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn forest_is_deterministic_for_a_seed() {
        let (rows, labels) = separable();
        let params = ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&rows, &labels, params).unwrap();
        let b = RandomForest::fit(&rows, &labels, params).unwrap();
        assert_eq!(a.n_trees(), 15);
        assert!(accuracy(&a, &rows, &labels) > 0.8);
        for x in &rows {
            assert_eq!(a.predict_proba(x), b.predict_proba(x));
        }
        let imp = a.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.3, 0.6]), 2);
    }

    #[test]
    fn model_survives_json() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(
            &rows,
            &labels,
            ForestParams {
                n_trees: 3,
                ..ForestParams::default()
            },
        )
        .unwrap();
        let model = OutcomeModel::Forest(forest);
        let json = serde_json::to_string(&model).unwrap();
        let back: OutcomeModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "Random Forest");
        let (p, q) = (back.predict_proba(&rows[5]), model.predict_proba(&rows[5]));
        for c in 0..N_CLASSES {
            assert!((p[c] - q[c]).abs() < 1e-9);
        }
    }
}
