//! User-curated aggregate record assembled field-by-field from up to four
//! candidate sources.
//!
//! The aggregate is terminal output: once created it only changes through
//! explicit selections and edits, never by re-reconciling the sources.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::{FairmatchError, Result};
use crate::record::CanonicalRecord;
use crate::schema::{FIELD_COUNT, Field};

pub const MAX_SOURCES: usize = 4;

/// Where the current value of an aggregate field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    Source(usize),
    Cleared,
    Edited,
}

/// A field whose sources disagree, and which sources differ from the
/// nominated primary. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDivergence {
    pub field: Field,
    pub distinct_values: Vec<String>,
    pub differing_sources: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateRecord {
    sources: Vec<CanonicalRecord>,
    record: CanonicalRecord,
    origins: [FieldOrigin; FIELD_COUNT],
}

impl AggregateRecord {
    /// Start from `default_source` for every field.
    pub fn new(sources: Vec<CanonicalRecord>, default_source: usize) -> Result<Self> {
        if sources.is_empty() {
            return Err(FairmatchError::NoSources);
        }
        if sources.len() > MAX_SOURCES {
            return Err(FairmatchError::TooManySources {
                count: sources.len(),
                max: MAX_SOURCES,
            });
        }
        let record = sources
            .get(default_source)
            .cloned()
            .ok_or(FairmatchError::SourceOutOfRange {
                index: default_source,
                available: sources.len(),
            })?;
        Ok(Self {
            sources,
            record,
            origins: [FieldOrigin::Source(default_source); FIELD_COUNT],
        })
    }

    pub fn sources(&self) -> &[CanonicalRecord] {
        &self.sources
    }

    pub fn record(&self) -> &CanonicalRecord {
        &self.record
    }

    pub fn into_record(self) -> CanonicalRecord {
        self.record
    }

    pub fn origin(&self, field: Field) -> FieldOrigin {
        self.origins[field.index()]
    }

    /// Value of `field` in every source, in source order.
    pub fn candidates(&self, field: Field) -> Vec<&str> {
        self.sources.iter().map(|s| s.get(field)).collect()
    }

    /// Take `field` from `source`, independent of every other field.
    pub fn select(&mut self, field: Field, source: usize) -> Result<()> {
        let value = self
            .sources
            .get(source)
            .ok_or(FairmatchError::SourceOutOfRange {
                index: source,
                available: self.sources.len(),
            })?
            .get(field)
            .to_string();
        debug!(field = %field, source, "selected aggregate value");
        self.record.set(field, value);
        self.origins[field.index()] = FieldOrigin::Source(source);
        Ok(())
    }

    pub fn clear(&mut self, field: Field) {
        self.record.set(field, "");
        self.origins[field.index()] = FieldOrigin::Cleared;
    }

    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.record.set(field, value);
        self.origins[field.index()] = FieldOrigin::Edited;
    }

    /// Apply label/value rows from an edited table. Rows whose value is
    /// unchanged keep their origin; unknown labels are ignored.
    pub fn apply_rows<I, K, V>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changed = 0;
        for (label, value) in rows {
            let Some(field) = Field::from_label(label.as_ref().trim()) else {
                debug!(label = label.as_ref(), "ignoring unknown row");
                continue;
            };
            let value = value.as_ref().trim();
            if self.record.get(field) != value {
                self.edit(field, value);
                changed += 1;
            }
        }
        changed
    }

    /// Fields with more than one distinct value across the sources.
    pub fn divergent_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|&f| self.distinct_values(f).len() > 1)
            .collect()
    }

    /// Per divergent field, the sources whose value differs from `primary`.
    pub fn divergence(&self, primary: usize) -> Result<Vec<FieldDivergence>> {
        let reference = self
            .sources
            .get(primary)
            .ok_or(FairmatchError::SourceOutOfRange {
                index: primary,
                available: self.sources.len(),
            })?;
        Ok(self
            .divergent_fields()
            .into_iter()
            .map(|field| FieldDivergence {
                field,
                distinct_values: self.distinct_values(field),
                differing_sources: self
                    .sources
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.get(field) != reference.get(field))
                    .map(|(i, _)| i)
                    .collect(),
            })
            .collect())
    }

    fn distinct_values(&self, field: Field) -> Vec<String> {
        let set: BTreeSet<&str> = self.sources.iter().map(|s| s.get(field)).collect();
        set.into_iter().map(str::to_string).collect()
    }
}
