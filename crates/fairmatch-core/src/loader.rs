//! Loading record collections from extractor output.
//!
//! Accepted shapes: a payload object (`{"data": [...]}` or `{"data": {...}}`),
//! a bare record, an array of records/payloads/JSON-encoded strings, or JSON
//! Lines (tried when multi-line text is not a single JSON document).
//! Elements that cannot be turned into a usable record are skipped and
//! reported; only a collection with no usable record at all is an error.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FairmatchError, Result};
use crate::record::{CanonicalRecord, RawRecord};
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A string element or JSONL line that is not valid JSON.
    Undecodable,
    /// Decoded fine, but not a JSON object.
    NotAnObject,
    /// An object with neither name field.
    Unusable,
}

/// An element that did not make it into the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedElement {
    pub index: usize,
    pub reason: SkipReason,
}

/// Usable canonical records from one input, plus what was dropped.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedCollection {
    pub input: String,
    pub records: Vec<CanonicalRecord>,
    pub skipped: Vec<SkippedElement>,
}

impl LoadedCollection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&CanonicalRecord> {
        self.records.first()
    }
}

/// Read and load a file. `input` in errors is the file name.
pub fn load_path(path: &Path, schema: &Schema) -> Result<LoadedCollection> {
    let input = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let text = fs::read_to_string(path)?;
    load_str(&input, &text, schema)
}

/// Load from already-read text. `input` identifies the source in errors
/// and logs.
pub fn load_str(input: &str, text: &str, schema: &Schema) -> Result<LoadedCollection> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FairmatchError::Malformed {
            input: input.to_string(),
            message: "empty input".to_string(),
        });
    }

    let mut skipped = Vec::new();
    let elements = if is_json_lines(text) {
        decode_lines(text)
    } else {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => top_level_items(value),
            // One object per line also starts with `{`.
            Err(_) if text.contains('\n') => decode_lines(text),
            Err(e) => {
                return Err(FairmatchError::Malformed {
                    input: input.to_string(),
                    message: e.to_string(),
                });
            }
        }
    };

    let mut records = Vec::with_capacity(elements.len());
    for (index, element) in elements {
        let raw = match element {
            Element::Decoded(value) => match into_object(value) {
                Some(raw) => raw,
                None => {
                    skipped.push(SkippedElement {
                        index,
                        reason: SkipReason::NotAnObject,
                    });
                    continue;
                }
            },
            Element::Undecodable => {
                skipped.push(SkippedElement {
                    index,
                    reason: SkipReason::Undecodable,
                });
                continue;
            }
        };

        let record = schema.canonicalize(&raw);
        if record.is_usable() {
            records.push(record);
        } else {
            skipped.push(SkippedElement {
                index,
                reason: SkipReason::Unusable,
            });
        }
    }

    for skip in &skipped {
        debug!(input, index = skip.index, reason = ?skip.reason, "skipped element");
    }

    if records.is_empty() {
        return Err(FairmatchError::NoUsableRecords {
            input: input.to_string(),
        });
    }
    if !skipped.is_empty() {
        warn!(
            input,
            loaded = records.len(),
            skipped = skipped.len(),
            "some elements were skipped"
        );
    }

    Ok(LoadedCollection {
        input: input.to_string(),
        records,
        skipped,
    })
}

enum Element {
    Decoded(Value),
    Undecodable,
}

fn is_json_lines(text: &str) -> bool {
    text.contains('\n') && !text.starts_with('{') && !text.starts_with('[')
}

fn decode_lines(text: &str) -> Vec<(usize, Element)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| match serde_json::from_str::<Value>(line) {
            Ok(value) => (index, Element::Decoded(value)),
            Err(_) => (index, Element::Undecodable),
        })
        .collect()
}

fn top_level_items(value: Value) -> Vec<(usize, Element)> {
    let items = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(data)) => vec![Value::Object(data)],
            Some(_) => Vec::new(),
            None => vec![Value::Object(map)],
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
                Ok(value) => (index, Element::Decoded(value)),
                Err(_) => (index, Element::Undecodable),
            },
            other => (index, Element::Decoded(other)),
        })
        .collect()
}

/// An object element, unwrapping a payload whose `data` is a single record.
fn into_object(value: Value) -> Option<RawRecord> {
    let Value::Object(mut map) = value else {
        return None;
    };
    if matches!(map.get("data"), Some(Value::Object(_))) {
        if let Some(Value::Object(data)) = map.remove("data") {
            return Some(data);
        }
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schema::Field;
    use tempfile::NamedTempFile;

    fn load(text: &str) -> Result<LoadedCollection> {
        load_str("test.json", text, &Schema::builtin())
    }

    #[test]
    fn bare_record() {
        let c = load(r#"{"전시회 국문명": "폐기물 엑스포"}"#).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.records[0].get(Field::KoreanName), "폐기물 엑스포");
    }

    #[test]
    fn payload_with_data_object() {
        let c = load(
            r#"{"source_url": "https://a.example", "keys": [], "data": {"영문명(Full Name)": "Waste Expo"}}"#,
        )
        .unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.records[0].get(Field::EnglishName), "Waste Expo");
    }

    #[test]
    fn payload_with_data_array() {
        let c = load(r#"{"data": [{"영문명(Full Name)": "A"}, {"영문명(Full Name)": "B"}]}"#).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.skipped.is_empty());
    }

    #[test]
    fn array_mixes_objects_strings_and_junk() {
        let text = r#"[
            {"영문명(Full Name)": "Waste Expo"},
            "{\"전시회 국문명\": \"서울 식품전\"}",
            "not json at all",
            42,
            {"국가": "Korea"},
            {"data": {"영문명(Full Name)": "CES"}}
        ]"#;
        let c = load(text).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.records[1].display_name(), "서울 식품전 / ");
        assert_eq!(
            c.skipped,
            vec![
                SkippedElement { index: 2, reason: SkipReason::Undecodable },
                SkippedElement { index: 3, reason: SkipReason::NotAnObject },
                SkippedElement { index: 4, reason: SkipReason::Unusable },
            ]
        );
        assert_eq!(c.records[2].get(Field::EnglishName), "CES");
    }

    #[test]
    fn json_lines() {
        let text = "\n  \"header line\"\n{\"영문명(Full Name)\": \"A\"}\n\nbroken {\n{\"영문명(Full Name)\": \"B\"}\n";
        let c = load(text).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.skipped.len(), 2);
        assert_eq!(c.skipped[0].reason, SkipReason::NotAnObject);
        assert_eq!(c.skipped[1].reason, SkipReason::Undecodable);
    }

    #[test]
    fn json_lines_of_objects() {
        let text = "{\"영문명(Full Name)\": \"A\"}\n{\"영문명(Full Name)\": \"B\"}";
        let c = load(text).unwrap();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn no_usable_records_is_load_error() {
        let err = load(r#"[{"국가": "Korea"}, {"전시회 국문명": "  "}]"#).unwrap_err();
        assert!(matches!(err, FairmatchError::NoUsableRecords { ref input } if input == "test.json"));
        assert!(err.is_load_failure());
        assert!(matches!(load("[]"), Err(FairmatchError::NoUsableRecords { .. })));
        assert!(matches!(load(r#"{"data": "x"}"#), Err(FairmatchError::NoUsableRecords { .. })));
    }

    #[test]
    fn malformed_and_empty_text() {
        assert!(matches!(load("{ nope"), Err(FairmatchError::Malformed { .. })));
        assert!(matches!(load("   "), Err(FairmatchError::Malformed { .. })));
    }

    #[test]
    fn custom_schema_is_used() {
        let schema = Schema::builtin()
            .with_aliases([("Exhibition", "english_name")])
            .unwrap();
        let c = load_str("custom", r#"{"Exhibition": "CES"}"#, &schema).unwrap();
        assert_eq!(c.records[0].get(Field::EnglishName), "CES");
    }

    #[test]
    fn load_from_file_names_the_input() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"[{{"국가": "Korea"}}]"#).unwrap();
        let err = load_path(file.path(), &Schema::builtin()).unwrap_err();
        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(err.to_string().contains(&name));

        let missing = load_path(Path::new("/definitely/not/here.json"), &Schema::builtin());
        assert!(matches!(missing, Err(FairmatchError::Io(_))));
    }
}
