use serde::Serialize;
use tracing::{debug, info};

use crate::config::MatchingConfig;
use crate::record::CanonicalRecord;
use crate::scorer::{CompositeScorer, NameWeights, ScoreBreakdown};
use crate::similarity::SimilarityKind;

/// A left record and its best right-side counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPair {
    pub left_index: usize,
    pub right_index: usize,
    pub left: CanonicalRecord,
    pub right: CanonicalRecord,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Best-match resolver between two record collections.
///
/// Every left record is compared against every right record. The best right
/// record is kept only if its score reaches the threshold; ties keep the
/// first right record seen. Output follows left order.
#[derive(Debug)]
pub struct Matcher {
    scorer: CompositeScorer,
    threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            scorer: CompositeScorer::default(),
            threshold: 0.8,
        }
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            scorer: CompositeScorer::new(config.weights, config.similarity),
            threshold: config.threshold,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: NameWeights) -> Self {
        self.scorer = CompositeScorer::new(weights, self.scorer.kind());
        self
    }

    pub fn with_similarity(mut self, kind: SimilarityKind) -> Self {
        self.scorer = CompositeScorer::new(self.scorer.weights(), kind);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn weights(&self) -> NameWeights {
        self.scorer.weights()
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    pub fn resolve(&self, left: &[CanonicalRecord], right: &[CanonicalRecord]) -> Vec<MatchPair> {
        let mut pairs = Vec::new();
        if left.is_empty() || right.is_empty() {
            return pairs;
        }

        for (left_index, a) in left.iter().enumerate() {
            let mut best: Option<(usize, ScoreBreakdown)> = None;
            for (right_index, b) in right.iter().enumerate() {
                let breakdown = self.scorer.breakdown(a, b);
                let better = match &best {
                    None => true,
                    Some((_, current)) => breakdown.composite > current.composite,
                };
                if better {
                    best = Some((right_index, breakdown));
                }
            }

            match best {
                Some((right_index, breakdown)) if breakdown.composite >= self.threshold => {
                    pairs.push(MatchPair {
                        left_index,
                        right_index,
                        left: a.clone(),
                        right: right[right_index].clone(),
                        score: breakdown.composite,
                        breakdown,
                    });
                }
                Some((right_index, breakdown)) => {
                    debug!(
                        left = %a.display_name(),
                        best_right = right_index,
                        score = breakdown.composite,
                        threshold = self.threshold,
                        "best candidate below threshold"
                    );
                }
                None => {}
            }
        }

        info!(
            left = left.len(),
            right = right.len(),
            matched = pairs.len(),
            threshold = self.threshold,
            "resolved best matches"
        );
        pairs
    }
}
