//! Decision-tree ensemble classifier.
//!
//! Each tree is a flat node array walked from the root with the convention
//! `x[feature] <= threshold` goes left. Leaves carry a probability
//! distribution over the emotion classes; the ensemble output is the
//! unweighted average of all leaf distributions. Inference is fully
//! deterministic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EmotionError;
use crate::model::Classifier;

/// A single node: either an internal split or a leaf distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f32>,
    },
}

/// One decision tree as a flat node array, root at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf distribution.
    ///
    /// The step count is capped at the node count so a malformed (cyclic)
    /// artifact fails instead of hanging.
    fn predict(&self, features: &[f32]) -> Result<&[f32], EmotionError> {
        let mut index = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or(EmotionError::DimensionMismatch {
                        expected: *feature + 1,
                        actual: features.len(),
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value),
                None => {
                    return Err(EmotionError::InvalidBundle(format!(
                        "tree node index {} out of range",
                        index
                    )))
                }
            }
        }
        Err(EmotionError::InvalidBundle(
            "cycle detected in decision tree".to_string(),
        ))
    }
}

/// Ensemble of decision trees over the standardized feature space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    /// Structural validation of a deserialized ensemble: at least one tree,
    /// child indices in range, every leaf distribution the right length.
    pub fn validate(&self) -> Result<(), EmotionError> {
        if self.trees.is_empty() {
            return Err(EmotionError::InvalidBundle(
                "classifier has no trees".to_string(),
            ));
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(EmotionError::InvalidBundle(format!(
                    "tree {} has no nodes",
                    tree_idx
                )));
            }
            for node in &tree.nodes {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return Err(EmotionError::InvalidBundle(format!(
                                "tree {} splits on feature {} (n_features {})",
                                tree_idx, feature, self.n_features
                            )));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(EmotionError::InvalidBundle(format!(
                                "tree {} has child index out of range",
                                tree_idx
                            )));
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.n_classes {
                            return Err(EmotionError::InvalidBundle(format!(
                                "tree {} leaf has {} classes, expected {}",
                                tree_idx,
                                value.len(),
                                self.n_classes
                            )));
                        }
                    }
                }
            }
        }

        debug!(
            "Validated forest: {} trees, {} features, {} classes",
            self.trees.len(),
            self.n_features,
            self.n_classes
        );
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>, EmotionError> {
        if features.len() != self.n_features {
            return Err(EmotionError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        // Average leaf distributions in f64 so 300-tree sums stay exact
        let mut acc = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.predict(features)?;
            for (a, &v) in acc.iter_mut().zip(leaf.iter()) {
                *a += v as f64;
            }
        }

        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|v| (v / n) as f32).collect())
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(class: usize) -> TreeNode {
        let mut value = vec![0.0f32; 8];
        value[class] = 1.0;
        TreeNode::Leaf { value }
    }

    /// A stump that votes class `low` when x[feature] <= threshold,
    /// else class `high`
    fn stump(feature: usize, threshold: f32, low: usize, high: usize) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                leaf(low),
                leaf(high),
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> ForestClassifier {
        ForestClassifier {
            n_features: 240,
            n_classes: 8,
            trees,
        }
    }

    #[test]
    fn test_single_stump_routes_correctly() {
        let f = forest(vec![stump(0, 0.5, 2, 5)]);
        f.validate().unwrap();

        let mut x = vec![0.0f32; 240];
        let probs = f.predict(&x).unwrap();
        assert_eq!(probs[2], 1.0);

        x[0] = 1.0;
        let probs = f.predict(&x).unwrap();
        assert_eq!(probs[5], 1.0);
    }

    #[test]
    fn test_ensemble_averages_votes() {
        // Three stumps on feature 0: below threshold two vote class 1,
        // one votes class 3
        let f = forest(vec![stump(0, 0.5, 1, 0), stump(0, 0.5, 1, 0), stump(0, 0.5, 3, 0)]);
        let probs = f.predict(&vec![0.0f32; 240]).unwrap();

        assert!((probs[1] - 2.0 / 3.0).abs() < 1e-6);
        assert!((probs[3] - 1.0 / 3.0).abs() < 1e-6);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let f = forest(vec![stump(0, 0.5, 0, 1)]);
        let result = f.predict(&[0.0; 10]);
        assert!(matches!(
            result,
            Err(EmotionError::DimensionMismatch {
                expected: 240,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_forest() {
        let f = forest(vec![]);
        assert!(matches!(f.validate(), Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_child() {
        let f = forest(vec![DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 10,
                right: 11,
            }],
        }]);
        assert!(matches!(f.validate(), Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_validate_rejects_wrong_leaf_width() {
        let f = forest(vec![DecisionTree {
            nodes: vec![TreeNode::Leaf {
                value: vec![1.0; 3],
            }],
        }]);
        assert!(matches!(f.validate(), Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_validate_rejects_feature_out_of_range() {
        let f = forest(vec![stump(500, 0.5, 0, 1)]);
        assert!(matches!(f.validate(), Err(EmotionError::InvalidBundle(_))));
    }

    #[test]
    fn test_node_roundtrips_through_json() {
        let f = forest(vec![stump(3, -1.25, 0, 7)]);
        let json = serde_json::to_string(&f).unwrap();
        let back: ForestClassifier = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();

        let mut x = vec![0.0f32; 240];
        x[3] = -2.0;
        assert_eq!(back.predict(&x).unwrap()[0], 1.0);
    }

    #[test]
    fn test_deterministic_inference() {
        let f = forest(vec![stump(0, 0.5, 1, 2), stump(5, -0.3, 4, 6)]);
        let x = vec![0.1f32; 240];
        assert_eq!(f.predict(&x).unwrap(), f.predict(&x).unwrap());
    }
}
