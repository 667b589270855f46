//! Bounded string similarity strategies.
//!
//! Both strategies work on `char`s (names are frequently Hangul) and are
//! built on the same indel ratio, `2 * LCS / (len_a + len_b)`:
//!
//! - [`PartialRatio`] slides the shorter string over the longer one and
//!   keeps the best window, so an acronym or a short name fully contained in
//!   a longer title scores 1.0.
//! - [`SequenceRatio`] compares the two full strings. It is the fallback for
//!   callers that want whole-string similarity; scores are directionally the
//!   same as [`PartialRatio`] but lower whenever one side has extra words.
//!
//! Empty input on either side scores 0.0 under both strategies.

use std::fmt::Debug;

use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};

/// A similarity strategy. Implementations must return a value in `[0, 1]`,
/// 1.0 for identical non-empty input, and 0.0 when either side is empty.
pub trait Similarity: Debug + Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    fn name(&self) -> &'static str;
}

/// Selects a [`Similarity`] implementation from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    Partial,
    Sequence,
}

impl SimilarityKind {
    pub fn build(self) -> Box<dyn Similarity> {
        match self {
            Self::Partial => Box::new(PartialRatio),
            Self::Sequence => Box::new(SequenceRatio),
        }
    }
}

impl std::fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Partial => write!(f, "partial"),
            Self::Sequence => write!(f, "sequence"),
        }
    }
}

impl std::str::FromStr for SimilarityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partial" => Ok(Self::Partial),
            "sequence" => Ok(Self::Sequence),
            other => Err(format!("unknown similarity '{other}' (expected partial or sequence)")),
        }
    }
}

/// Best-window partial ratio.
///
/// The shorter string is always the pattern. Windows are every
/// pattern-length slice of the longer string plus the shorter prefixes and
/// suffixes at both ends. For equal lengths both directions are tried so the
/// score is symmetric.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl Similarity for PartialRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a.len() == b.len() {
            return best_window(&a, &b).max(best_window(&b, &a));
        }
        if a.len() < b.len() {
            best_window(&a, &b)
        } else {
            best_window(&b, &a)
        }
    }

    fn name(&self) -> &'static str {
        "partial"
    }
}

/// Whole-string indel ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl Similarity for SequenceRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        fuzz::ratio(a.chars(), b.chars())
    }

    fn name(&self) -> &'static str {
        "sequence"
    }
}

fn best_window(pattern: &[char], text: &[char]) -> f64 {
    let m = pattern.len();
    let n = text.len();
    let mut best = 0.0_f64;

    let full = (0..=n.saturating_sub(m)).map(|start| &text[start..(start + m).min(n)]);
    let heads = (1..m.min(n)).map(|len| &text[..len]);
    let tails = (1..m.min(n)).map(|len| &text[n - len..]);

    for window in full.chain(heads).chain(tails) {
        let score = fuzz::ratio(pattern.iter().copied(), window.iter().copied());
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}
