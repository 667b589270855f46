use std::fmt;

use serde::Serialize;

use crate::record::CanonicalRecord;
use crate::resolver::MatchPair;
use crate::scorer::NameWeights;
use crate::schema::Field;

/// One row of a field-by-field comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub field: Field,
    pub left: String,
    pub right: String,
    pub differs: bool,
}

/// Field-by-field comparison of two records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDiff {
    pub rows: Vec<DiffRow>,
}

impl RecordDiff {
    pub fn differing_count(&self) -> usize {
        self.rows.iter().filter(|r| r.differs).count()
    }

    pub fn differing(&self) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(|r| r.differs)
    }

    /// Markdown table; differing right-hand values are bolded.
    pub fn to_markdown(&self, left_title: &str, right_title: &str) -> String {
        let mut lines = vec![
            format!("| 항목 | {left_title} | {right_title} |"),
            "|---|---|---|".to_string(),
        ];
        for row in &self.rows {
            let right = if row.differs && !row.right.is_empty() {
                format!("**{}**", row.right)
            } else if row.differs {
                "**(없음)**".to_string()
            } else {
                row.right.clone()
            };
            lines.push(format!("| {} | {} | {} |", row.field, row.left, right));
        }
        lines.join("\n")
    }
}

/// Compare two records over `order`. Values are compared as exact strings.
pub fn diff(a: &CanonicalRecord, b: &CanonicalRecord, order: &[Field]) -> RecordDiff {
    let rows = order
        .iter()
        .map(|&field| {
            let left = a.get(field);
            let right = b.get(field);
            DiffRow {
                field,
                left: left.to_string(),
                right: right.to_string(),
                differs: left != right,
            }
        })
        .collect();
    RecordDiff { rows }
}

/// [`diff`] over every field in display order.
pub fn diff_all(a: &CanonicalRecord, b: &CanonicalRecord) -> RecordDiff {
    diff(a, b, &Field::ALL)
}

/// A matched pair together with its field diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    #[serde(flatten)]
    pub pair: MatchPair,
    pub diff: RecordDiff,
}

/// Result of comparing two collections.
///
/// An empty result is a valid outcome and carries the threshold it was
/// produced at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Comparison {
    NoMatches {
        threshold: f64,
        weights: NameWeights,
    },
    Matched {
        threshold: f64,
        weights: NameWeights,
        pairs: Vec<PairReport>,
    },
}

impl Comparison {
    pub fn summarize(pairs: Vec<MatchPair>, threshold: f64, weights: NameWeights) -> Self {
        if pairs.is_empty() {
            return Self::NoMatches { threshold, weights };
        }
        let pairs = pairs
            .into_iter()
            .map(|pair| {
                let diff = diff_all(&pair.left, &pair.right);
                PairReport { pair, diff }
            })
            .collect();
        Self::Matched {
            threshold,
            weights,
            pairs,
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            Self::NoMatches { threshold, .. } | Self::Matched { threshold, .. } => *threshold,
        }
    }

    pub fn pairs(&self) -> &[PairReport] {
        match self {
            Self::NoMatches { .. } => &[],
            Self::Matched { pairs, .. } => pairs,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoMatches { .. })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatches { threshold, .. } => {
                write!(f, "No matches at threshold {threshold:.2}.")
            }
            Self::Matched {
                threshold,
                weights,
                pairs,
            } => {
                writeln!(
                    f,
                    "**{} match(es)** at threshold {threshold:.2} (weights: 국문명 {:.2}, 영문명 {:.2})",
                    pairs.len(),
                    weights.primary,
                    weights.secondary
                )?;
                writeln!(f)?;
                writeln!(f, "| # | Score | 국문명 | 영문명 | Differing |")?;
                writeln!(f, "|---|---|---|---|---|")?;
                for (i, report) in pairs.iter().enumerate() {
                    writeln!(
                        f,
                        "| {} | {:.3} | {} | {} | {} |",
                        i + 1,
                        report.pair.score,
                        report.pair.left.primary_name(),
                        report.pair.left.secondary_name(),
                        report.diff.differing_count()
                    )?;
                }
                for (i, report) in pairs.iter().enumerate() {
                    let b = &report.pair.breakdown;
                    writeln!(f)?;
                    writeln!(
                        f,
                        "### Match {}: {:.3} (국문명 {:.3}, 영문명 {:.3})",
                        i + 1,
                        b.composite,
                        b.primary,
                        b.secondary
                    )?;
                    writeln!(f)?;
                    writeln!(f, "{}", report.diff.to_markdown("Left", "Right"))?;
                }
                Ok(())
            }
        }
    }
}
