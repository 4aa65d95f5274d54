//! Gradient-boosted regression trees over lagged weekly values
//!
//! Squared-error boosting: the ensemble starts at the training mean and each
//! tree is fitted to the current residuals, then added with a shrinkage
//! factor. Trees are grown greedily by exact variance-reduction splits.

use crate::error::{ForecastError, Result};
use crate::models::lagged::{OneStepRegressor, TrainedLagModel};
use crate::models::{ForecastModel, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Boosting hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingSettings {
    /// Number of lagged weeks used as features
    pub lags: usize,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Seed for the per-node feature order
    pub seed: u64,
}

impl Hash for BoostingSettings {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lags.hash(state);
        self.n_estimators.hash(state);
        self.learning_rate.to_bits().hash(state);
        self.max_depth.hash(state);
        self.min_samples_split.hash(state);
        self.min_samples_leaf.hash(state);
        self.seed.hash(state);
    }
}

impl Default for BoostingSettings {
    fn default() -> Self {
        Self {
            lags: 52,
            n_estimators: 300,
            learning_rate: 0.05,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl BoostingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 || self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "Tree depth and leaf sizes must be positive, min_samples_split at least 2"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Regression tree node
#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Grows one tree on `targets` restricted to the row indices it is given
struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    settings: &'a BoostingSettings,
    rng: &'a mut StdRng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &[usize], depth: usize) -> Node {
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let leaf = Node::Leaf(sum / indices.len() as f64);

        if depth >= self.settings.max_depth || indices.len() < self.settings.min_samples_split {
            return leaf;
        }

        match self.best_split(indices, sum) {
            Some(split) => Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(self.build(&split.left, depth + 1)),
                right: Box::new(self.build(&split.right, depth + 1)),
            },
            None => leaf,
        }
    }

    /// Split maximising the reduction in squared error; the first best in feature order wins
    fn best_split(&mut self, indices: &[usize], sum: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.settings.min_samples_leaf;
        let parent = sum * sum / n as f64;

        let mut features: Vec<usize> = (0..self.rows[0].len()).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<SplitCandidate> = None;
        for feature in features {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            for split in 1..n {
                left_sum += self.targets[order[split - 1]];
                let below = self.rows[order[split - 1]][feature];
                let above = self.rows[order[split]][feature];
                if split < min_leaf || n - split < min_leaf || below == above {
                    continue;
                }

                let right_sum = sum - left_sum;
                let gain = left_sum * left_sum / split as f64
                    + right_sum * right_sum / (n - split) as f64
                    - parent;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (below + above) / 2.0,
                        gain,
                        left: order[..split].to_vec(),
                        right: order[split..].to_vec(),
                    });
                }
            }
        }

        best
    }
}

/// Fitted boosted ensemble
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    init: f64,
    learning_rate: f64,
    trees: Vec<Node>,
}

impl BoostedTrees {
    /// Fit on design rows and targets
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], settings: &BoostingSettings) -> Result<Self> {
        settings.validate()?;
        if rows.is_empty() || rows.len() != targets.len() || rows[0].is_empty() {
            return Err(ForecastError::InvalidParameter(format!(
                "Boosting needs a non-empty design matrix, got {} rows for {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let n = targets.len();
        let init = targets.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![init; n];
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let indices: Vec<usize> = (0..n).collect();
        let mut trees = Vec::with_capacity(settings.n_estimators);

        for _ in 0..settings.n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();
            let tree = TreeBuilder {
                rows,
                targets: &residuals,
                settings,
                rng: &mut rng,
            }
            .build(&indices, 0);

            for (p, row) in predictions.iter_mut().zip(rows) {
                *p += settings.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(Node::depth).max().unwrap_or(0),
            "Boosted trees fitted"
        );

        Ok(Self {
            init,
            learning_rate: settings.learning_rate,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl OneStepRegressor for BoostedTrees {
    fn predict_one(&self, features: &[f64]) -> f64 {
        self.init
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict(features))
                    .sum::<f64>()
    }
}

/// Gradient boosting forecaster
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    name: String,
    settings: BoostingSettings,
}

impl GradientBoosting {
    pub fn new(settings: BoostingSettings) -> Self {
        Self {
            name: "Gradient Boosting".to_string(),
            settings,
        }
    }

    pub fn settings(&self) -> &BoostingSettings {
        &self.settings
    }
}

impl ForecastModel for GradientBoosting {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        let fitted = TrainedLagModel::fit(&self.name, train, self.settings.lags, |x, y| {
            BoostedTrees::fit(x, y, &self.settings)
        })?;
        Ok(Box::new(fitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_step_function() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..40).map(|i| if i < 20 { 1.0 } else { 9.0 }).collect();

        let model = BoostedTrees::fit(&rows, &targets, &BoostingSettings::default()).unwrap();
        assert_eq!(model.n_trees(), 300);
        assert!((model.predict_one(&[5.0]) - 1.0).abs() < 0.01);
        assert!((model.predict_one(&[30.0]) - 9.0).abs() < 0.01);
    }

    #[test]
    fn test_invalid_settings() {
        let settings = BoostingSettings {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(BoostingSettings::default().validate().is_ok());
    }

    #[test]
    fn test_same_seed_same_forecast() {
        let train: Vec<f64> = (0..90).map(|i| 20.0 + ((i * 3) % 17) as f64).collect();
        let settings = BoostingSettings {
            n_estimators: 40,
            ..Default::default()
        };
        let model = GradientBoosting::new(settings);
        let a = model.fit_forecast(&train, 6).unwrap();
        let b = model.fit_forecast(&train, 6).unwrap();
        assert_eq!(a.values().len(), 6);
        assert_eq!(a, b);
    }
}
