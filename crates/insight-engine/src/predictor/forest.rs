//! Bootstrap-aggregated regression trees over engineered features
//!
//! Trains a small bagged ensemble on one-step-lagged feature vectors and
//! estimates fit quality with leave-one-out cross-validation. All sampling
//! runs off an explicit seed so repeat predictions are bit-identical.

use super::features::{build_features, mean, FeatureVector, NUM_FEATURES};
use super::{FitError, ModelForecast, Regressor};
use crate::models::SemesterRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Minimum series length for the tree model (three training pairs)
pub const MIN_SERIES_LEN: usize = 4;

/// Trees in the main ensemble for longer series
const LARGE_ENSEMBLE: usize = 50;

/// Trees in the main ensemble for short series
const SMALL_ENSEMBLE: usize = 20;

/// Series length at which the larger ensemble kicks in
const LARGE_ENSEMBLE_MIN_LEN: usize = 6;

/// Trees per leave-one-out refit
const LOO_ENSEMBLE: usize = 10;

/// Fraction of features considered at each split
const FEATURE_FRACTION: f64 = 0.8;

/// Depth cap for individual trees
const MAX_DEPTH: usize = 10;

/// Fit quality reported when the training targets have zero spread
const DEGENERATE_R2: f64 = 0.7;

/// Bagged regression-tree forecaster
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    /// Seed for bootstrap and feature sampling
    pub seed: u64,
}

impl Default for ForestRegressor {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl ForestRegressor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Leave-one-out cross-validated quality over the training pairs.
    ///
    /// Each held-out pair is predicted by a fresh 10-tree ensemble trained
    /// on the remainder; quality is the resulting out-of-sample r-squared.
    fn loo_quality(&self, pairs: &[(FeatureVector, f64)]) -> f64 {
        let targets: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();
        let target_mean = mean(&targets);
        let ss_tot: f64 = targets.iter().map(|y| (y - target_mean).powi(2)).sum();

        let mut ss_res = 0.0;
        for held_out in 0..pairs.len() {
            let train: Vec<(FeatureVector, f64)> = pairs
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != held_out)
                .map(|(_, pair)| *pair)
                .collect();
            if train.len() < 2 {
                continue;
            }

            let mut rng = StdRng::seed_from_u64(self.seed);
            let trees = train_ensemble(&train, LOO_ENSEMBLE, &mut rng);
            let predicted = predict_ensemble(&trees, &pairs[held_out].0);
            ss_res += (pairs[held_out].1 - predicted).powi(2);
        }

        if ss_tot == 0.0 {
            DEGENERATE_R2
        } else {
            (1.0 - ss_res / ss_tot).max(0.0)
        }
    }
}

impl Regressor for ForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn forecast(&self, history: &[SemesterRecord]) -> Result<ModelForecast, FitError> {
        let n = history.len();
        if n < MIN_SERIES_LEN {
            return Err(FitError::InsufficientData {
                need: MIN_SERIES_LEN,
                have: n,
            });
        }

        // One training pair per semester that has at least one predecessor
        let pairs: Vec<(FeatureVector, f64)> = (1..n)
            .map(|i| (build_features(history, i), history[i].sgpa))
            .collect();

        let n_trees = if n >= LARGE_ENSEMBLE_MIN_LEN {
            LARGE_ENSEMBLE
        } else {
            SMALL_ENSEMBLE
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let trees = train_ensemble(&pairs, n_trees, &mut rng);
        let next_features = build_features(history, n);
        let value = predict_ensemble(&trees, &next_features);
        let fit_quality = self.loo_quality(&pairs);

        debug!(n_trees, value, fit_quality, "tree ensemble forecast");
        Ok(ModelForecast { value, fit_quality })
    }
}

fn train_ensemble(
    pairs: &[(FeatureVector, f64)],
    n_trees: usize,
    rng: &mut StdRng,
) -> Vec<DecisionTree> {
    (0..n_trees)
        .map(|_| {
            // Bootstrap sample with replacement, same size as the training set
            let sample: Vec<(FeatureVector, f64)> = (0..pairs.len())
                .map(|_| pairs[rng.gen_range(0..pairs.len())])
                .collect();
            DecisionTree::fit(&sample, rng)
        })
        .collect()
}

fn predict_ensemble(trees: &[DecisionTree], features: &FeatureVector) -> f64 {
    trees.iter().map(|t| t.predict(features)).sum::<f64>() / trees.len() as f64
}

enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Regression tree splitting on variance reduction
struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    fn fit(samples: &[(FeatureVector, f64)], rng: &mut StdRng) -> Self {
        Self {
            root: grow(samples, 0, rng),
        }
    }

    fn predict(&self, features: &FeatureVector) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn grow(samples: &[(FeatureVector, f64)], depth: usize, rng: &mut StdRng) -> TreeNode {
    let targets: Vec<f64> = samples.iter().map(|(_, y)| *y).collect();
    let leaf_value = mean(&targets);

    if depth >= MAX_DEPTH || samples.len() < 2 || sum_squared_error(&targets) < 1e-12 {
        return TreeNode::Leaf { value: leaf_value };
    }

    let candidates = sample_features(rng);
    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in &candidates {
        let mut values: Vec<f64> = samples.iter().map(|(x, _)| x[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for window in values.windows(2) {
            let threshold = (window[0] + window[1]) / 2.0;
            let mut left = Vec::new();
            let mut right = Vec::new();
            for (x, y) in samples {
                if x[feature] <= threshold {
                    left.push(*y);
                } else {
                    right.push(*y);
                }
            }
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let split_error = sum_squared_error(&left) + sum_squared_error(&right);
            if best.map_or(true, |(_, _, err)| split_error < err) {
                best = Some((feature, threshold, split_error));
            }
        }
    }

    let Some((feature, threshold, _)) = best else {
        // Every candidate feature is constant across the sample
        return TreeNode::Leaf { value: leaf_value };
    };

    let mut left_samples = Vec::new();
    let mut right_samples = Vec::new();
    for pair in samples {
        if pair.0[feature] <= threshold {
            left_samples.push(*pair);
        } else {
            right_samples.push(*pair);
        }
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(grow(&left_samples, depth + 1, rng)),
        right: Box::new(grow(&right_samples, depth + 1, rng)),
    }
}

/// Draw the per-split feature subset (partial Fisher-Yates)
fn sample_features(rng: &mut StdRng) -> Vec<usize> {
    let count = ((FEATURE_FRACTION * NUM_FEATURES as f64).floor() as usize).max(1);
    let mut indices: Vec<usize> = (0..NUM_FEATURES).collect();
    for i in 0..count {
        let j = rng.gen_range(i..NUM_FEATURES);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

fn sum_squared_error(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}
