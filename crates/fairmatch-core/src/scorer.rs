use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::normalize;
use crate::record::CanonicalRecord;
use crate::similarity::{Similarity, SimilarityKind};

/// Relative weights of the two identifying name fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameWeights {
    pub primary: f64,
    pub secondary: f64,
}

impl Default for NameWeights {
    fn default() -> Self {
        Self {
            primary: 0.6,
            secondary: 0.4,
        }
    }
}

/// Per-field similarities and the blended score for one record pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub primary: f64,
    pub secondary: f64,
    pub composite: f64,
}

/// Blends Korean-name and English-name similarity into one confidence.
///
/// A name field that is empty on either side contributes neither to the
/// numerator nor to the denominator, so a record that only carries one
/// language is not penalized for the missing one.
#[derive(Debug)]
pub struct CompositeScorer {
    weights: NameWeights,
    kind: SimilarityKind,
    similarity: Box<dyn Similarity>,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new(NameWeights::default(), SimilarityKind::default())
    }
}

impl CompositeScorer {
    pub fn new(weights: NameWeights, kind: SimilarityKind) -> Self {
        Self {
            weights,
            kind,
            similarity: kind.build(),
        }
    }

    pub fn weights(&self) -> NameWeights {
        self.weights
    }

    pub fn kind(&self) -> SimilarityKind {
        self.kind
    }

    pub fn similarity_name(&self) -> &'static str {
        self.similarity.name()
    }

    pub fn score(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> f64 {
        self.breakdown(a, b).composite
    }

    pub fn breakdown(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> ScoreBreakdown {
        let primary = self.field_similarity(a.primary_name(), b.primary_name());
        let secondary = self.field_similarity(a.secondary_name(), b.secondary_name());
        let composite = self.blend(primary, secondary);
        debug!(
            left = %a.display_name(),
            right = %b.display_name(),
            primary,
            secondary,
            composite,
            "scored pair"
        );
        ScoreBreakdown {
            primary,
            secondary,
            composite,
        }
    }

    fn field_similarity(&self, a: &str, b: &str) -> f64 {
        let a = normalize(a);
        let b = normalize(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        self.similarity.similarity(&a, &b)
    }

    fn blend(&self, primary: f64, secondary: f64) -> f64 {
        if primary == 0.0 && secondary == 0.0 {
            return 0.0;
        }
        let used_primary = if primary > 0.0 { self.weights.primary } else { 0.0 };
        let used_secondary = if secondary > 0.0 { self.weights.secondary } else { 0.0 };
        let denom = used_primary + used_secondary;
        if denom == 0.0 {
            return 0.0;
        }
        // A single contributing field keeps its own score exactly.
        if used_secondary == 0.0 {
            return primary;
        }
        if used_primary == 0.0 {
            return secondary;
        }
        (primary * used_primary + secondary * used_secondary) / denom
    }
}
