//! Reconciliation core for exhibition metadata records.
//!
//! Records extracted from independent sources are canonicalized onto a
//! fixed 19-field schema, compared by bilingual name similarity, paired by a
//! best-match resolver, and rendered as field diffs or merged into a
//! user-curated aggregate. Nothing here performs I/O except [`loader`] and
//! [`config`].

pub mod aggregate;
pub mod config;
pub mod diff;
pub mod error;
pub mod fields;
pub mod homepage;
pub mod loader;
pub mod normalize;
pub mod payload;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod scorer;
pub mod similarity;

pub use aggregate::{AggregateRecord, FieldDivergence, FieldOrigin, MAX_SOURCES};
pub use config::{FairmatchConfig, HomepageConfig, MatchingConfig, SchemaConfig};
pub use diff::{Comparison, DiffRow, PairReport, RecordDiff, diff, diff_all};
pub use error::{FairmatchError, Result};
pub use homepage::{DEFAULT_AGGREGATOR_DOMAINS, pick_official_homepage};
pub use loader::{LoadedCollection, SkipReason, SkippedElement, load_path, load_str};
pub use normalize::normalize;
pub use payload::{ExtractionPayload, parse_json_object};
pub use record::{CanonicalRecord, RawRecord};
pub use resolver::{MatchPair, Matcher};
pub use schema::{DEFAULT_SCHEMA, FIELD_COUNT, Field, Schema, canonicalize};
pub use scorer::{CompositeScorer, NameWeights, ScoreBreakdown};
pub use similarity::{PartialRatio, SequenceRatio, Similarity, SimilarityKind};

/// Resolve best matches between two collections and summarize them.
pub fn compare_records(
    left: &[CanonicalRecord],
    right: &[CanonicalRecord],
    config: &MatchingConfig,
) -> Comparison {
    let matcher = Matcher::from_config(config);
    let pairs = matcher.resolve(left, right);
    Comparison::summarize(pairs, matcher.threshold(), matcher.weights())
}

/// Composite name score of one record pair.
pub fn score_record(a: &CanonicalRecord, b: &CanonicalRecord, config: &MatchingConfig) -> f64 {
    CompositeScorer::new(config.weights, config.similarity).score(a, b)
}
