use std::ops::Index;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{normalize_date, normalize_url, normalize_year};
use crate::schema::{DEFAULT_SCHEMA, FIELD_COUNT, Field};

/// A record as produced by an extractor: arbitrary keys, arbitrary JSON
/// values, insertion order preserved.
pub type RawRecord = serde_json::Map<String, Value>;

/// A record with exactly the 19 canonical fields, in display order.
///
/// Values are never absent: a missing field is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CanonicalRecord {
    values: [String; FIELD_COUNT],
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn primary_name(&self) -> &str {
        self.get(Field::PRIMARY_NAME)
    }

    pub fn secondary_name(&self) -> &str {
        self.get(Field::SECONDARY_NAME)
    }

    /// A record can take part in matching only if it names the exhibition
    /// in at least one language.
    pub fn is_usable(&self) -> bool {
        !self.primary_name().trim().is_empty() || !self.secondary_name().trim().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Short "국문명 / English name" label for summaries.
    pub fn display_name(&self) -> String {
        format!("{} / {}", self.primary_name(), self.secondary_name())
    }

    pub fn to_raw(&self) -> RawRecord {
        self.iter()
            .map(|(f, v)| (f.label().to_string(), Value::String(v.to_string())))
            .collect()
    }

    /// Apply the per-field value normalizers: dates to `YYYY-MM-DD`, the
    /// first-held year to `YYYY`, the homepage to a bare http(s) URL.
    pub fn normalize_values(&mut self) {
        for field in [Field::StartDate, Field::EndDate] {
            let normalized = normalize_date(self.get(field));
            self.set(field, normalized);
        }
        let year = normalize_year(self.get(Field::FirstHeldYear));
        self.set(Field::FirstHeldYear, year);
        let homepage = normalize_url(self.get(Field::Homepage));
        self.set(Field::Homepage, homepage);
    }

    /// Two-column Markdown table in display order. Homepage and source URLs
    /// become links.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec!["| 항목 | 값 |".to_string(), "|---|---|".to_string()];
        for (field, value) in self.iter() {
            let linked = matches!(field, Field::Homepage | Field::Source)
                && !value.is_empty()
                && !value.starts_with('[');
            if linked {
                lines.push(format!("| {field} | [{value}]({value}) |"));
            } else {
                lines.push(format!("| {field} | {value} |"));
            }
        }
        lines.join("\n")
    }
}

impl Index<Field> for CanonicalRecord {
    type Output = str;

    fn index(&self, field: Field) -> &str {
        self.get(field)
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.label(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CanonicalRecord {
    /// Lenient: any JSON object is accepted and canonicalized with the
    /// built-in schema.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        Ok(DEFAULT_SCHEMA.canonicalize(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_needs_a_name() {
        assert!(!CanonicalRecord::new().is_usable());
        assert!(!CanonicalRecord::new().with(Field::Country, "Korea").is_usable());
        assert!(CanonicalRecord::new().with(Field::EnglishName, "CES").is_usable());
        assert!(CanonicalRecord::new().with(Field::KoreanName, "코엑스 전시").is_usable());
    }

    #[test]
    fn serializes_all_keys_in_order() {
        let record = CanonicalRecord::new().with(Field::City, "Seoul");
        let json = serde_json::to_string(&record).unwrap();
        let parsed: RawRecord = serde_json::from_str(&json).unwrap();
        let keys: Vec<&String> = parsed.keys().collect();
        assert_eq!(keys.len(), FIELD_COUNT);
        for (key, field) in keys.iter().zip(Field::ALL) {
            assert_eq!(key.as_str(), field.label());
        }
        assert_eq!(parsed["도시"], "Seoul");
    }

    #[test]
    fn deserialize_canonicalizes() {
        let record: CanonicalRecord =
            serde_json::from_str(r#"{"영문명(Full name)": " Waste Expo ", "extra": 1}"#).unwrap();
        assert_eq!(&record[Field::EnglishName], "Waste Expo");
        assert_eq!(record.iter().count(), FIELD_COUNT);
    }

    #[test]
    fn normalize_values_touches_only_typed_fields() {
        let mut record = CanonicalRecord::new()
            .with(Field::StartDate, "2025.05.06")
            .with(Field::EndDate, "2025년 5월 8일")
            .with(Field::FirstHeldYear, "1968년")
            .with(Field::Homepage, "[https://www.wasteexpo.com]")
            .with(Field::Phone, "212-520-2700");
        record.normalize_values();
        assert_eq!(record.get(Field::StartDate), "2025-05-06");
        assert_eq!(record.get(Field::EndDate), "2025-05-08");
        assert_eq!(record.get(Field::FirstHeldYear), "1968");
        assert_eq!(record.get(Field::Homepage), "https://www.wasteexpo.com");
        assert_eq!(record.get(Field::Phone), "212-520-2700");
    }

    #[test]
    fn markdown_links_urls() {
        let record = CanonicalRecord::new()
            .with(Field::KoreanName, "폐기물 전시회")
            .with(Field::Homepage, "https://www.wasteexpo.com");
        let md = record.to_markdown();
        assert!(md.starts_with("| 항목 | 값 |"));
        assert!(md.contains("| 공식 홈페이지 | [https://www.wasteexpo.com](https://www.wasteexpo.com) |"));
        assert!(md.contains("| 전시회 국문명 | 폐기물 전시회 |"));
        assert!(md.contains("| 출처 |  |"));
        assert_eq!(md.lines().count(), FIELD_COUNT + 2);
    }
}
