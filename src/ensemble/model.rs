use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::training::{TrainingControl, TrainingParams};
use crate::error::TrainingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Depth-limited least-squares regression tree stored as a flat node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        let indices: Vec<usize> = (0..rows.len()).collect();
        tree.grow(rows, targets, indices, 0, max_depth, min_samples_leaf.max(1));
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Highest feature index any split reads.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[f64],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        min_leaf: usize,
    ) -> usize {
        let node_idx = self.nodes.len();
        let mean = if indices.is_empty() {
            0.0
        } else {
            indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
        };
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= max_depth || indices.len() < 2 * min_leaf {
            return node_idx;
        }
        let Some(split) = best_split(rows, targets, &indices, min_leaf) else {
            return node_idx;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);

        let left = self.grow(rows, targets, left_idx, depth + 1, max_depth, min_leaf);
        let right = self.grow(rows, targets, right_idx, depth + 1, max_depth, min_leaf);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }
}

/// Split maximizing squared-error reduction, respecting the leaf minimum.
fn best_split(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let width = rows.get(indices[0]).map(Vec::len).unwrap_or(0);
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    let parent = total * total / n as f64;

    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| {
            rows[a][feature]
                .partial_cmp(&rows[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += targets[order[k - 1]];
            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = rows[order[k - 1]][feature];
            let hi = rows[order[k]][feature];
            if hi <= lo {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / k as f64
                + right_sum * right_sum / (n - k) as f64
                - parent;
            if gain > 1e-12 && best.as_ref().map(|b| gain > b.gain).unwrap_or(true) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}

/// Summary of one boosting fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub rounds: usize,
    pub train_mse: f64,
    pub validation_mse: Option<f64>,
}

/// Gradient-boosted regression trees under squared loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Fit on `rows`/`targets`. With a validation split, keeps the round count
    /// with the lowest validation error and stops after
    /// `early_stopping_rounds` rounds without improvement.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        validation: Option<(&[Vec<f64>], &[f64])>,
        params: &TrainingParams,
        control: &TrainingControl,
    ) -> Result<(Self, FitSummary), TrainingError> {
        let base_score = if targets.is_empty() {
            0.0
        } else {
            targets.iter().sum::<f64>() / targets.len() as f64
        };
        let mut model = GradientBoostedTrees {
            base_score,
            learning_rate: params.learning_rate,
            trees: Vec::with_capacity(params.estimators),
        };

        let mut train_pred = vec![base_score; rows.len()];
        let mut valid_pred = validation.map(|(v_rows, _)| vec![base_score; v_rows.len()]);
        let mut best_rounds = 0;
        let mut best_valid = validation.map(|(_, v_targets)| {
            mse(valid_pred.as_deref().unwrap_or(&[]), v_targets)
        });
        let mut stale_rounds = 0;

        for round in 0..params.estimators {
            control.checkpoint()?;

            let residuals: Vec<f64> = targets
                .iter()
                .zip(&train_pred)
                .map(|(y, p)| y - p)
                .collect();
            let tree = RegressionTree::fit(
                rows,
                &residuals,
                params.max_depth,
                params.min_samples_leaf,
            );

            for (p, row) in train_pred.iter_mut().zip(rows) {
                *p += params.learning_rate * tree.predict(row);
            }

            if let (Some((v_rows, v_targets)), Some(v_pred)) = (validation, valid_pred.as_mut()) {
                for (p, row) in v_pred.iter_mut().zip(v_rows) {
                    *p += params.learning_rate * tree.predict(row);
                }
                let current = mse(v_pred, v_targets);
                model.trees.push(tree);

                if best_valid.map(|best| current < best).unwrap_or(true) {
                    best_valid = Some(current);
                    best_rounds = round + 1;
                    stale_rounds = 0;
                } else {
                    stale_rounds += 1;
                    if params.early_stopping_rounds > 0
                        && stale_rounds >= params.early_stopping_rounds
                    {
                        break;
                    }
                }
            } else {
                model.trees.push(tree);
                best_rounds = round + 1;
            }
        }

        model.trees.truncate(best_rounds);
        let train_mse = mse(
            &rows.iter().map(|row| model.predict(row)).collect::<Vec<_>>(),
            targets,
        );
        let summary = FitSummary {
            rounds: model.trees.len(),
            train_mse,
            validation_mse: validation.map(|(v_rows, v_targets)| {
                mse(
                    &v_rows.iter().map(|row| model.predict(row)).collect::<Vec<_>>(),
                    v_targets,
                )
            }),
        };
        Ok((model, summary))
    }

    /// Unclamped prediction.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict(row))
                .sum::<f64>()
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }

    pub fn max_feature(&self) -> Option<usize> {
        self.trees.iter().filter_map(RegressionTree::max_feature).max()
    }
}

pub(crate) fn mse(predictions: &[f64], targets: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    predictions
        .iter()
        .zip(targets)
        .map(|(p, y)| (p - y) * (p - y))
        .sum::<f64>()
        / targets.len() as f64
}
