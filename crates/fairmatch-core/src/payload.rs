use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{FairmatchError, Result};
use crate::record::{CanonicalRecord, RawRecord};
use crate::schema::{Field, Schema};

/// One extraction result as persisted and exchanged between tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    #[serde(default)]
    pub source_url: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub num_ctx: u32,
    #[serde(default = "Field::labels")]
    pub keys: Vec<String>,
    pub data: CanonicalRecord,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl ExtractionPayload {
    pub fn new(
        source_url: impl Into<String>,
        model: impl Into<String>,
        num_ctx: u32,
        data: CanonicalRecord,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            extracted_at: Utc::now(),
            model: model.into(),
            num_ctx,
            keys: Field::labels(),
            data,
        }
    }

    /// Build a payload from raw extractor text.
    ///
    /// The text is parsed leniently, canonicalized, and run through the
    /// field value normalizers. An empty source field is filled with
    /// `source_url`.
    pub fn from_model_output(
        source_url: &str,
        model: &str,
        num_ctx: u32,
        text: &str,
        schema: &Schema,
    ) -> Result<Self> {
        let raw = parse_json_object(text).ok_or_else(|| FairmatchError::Malformed {
            input: source_url.to_string(),
            message: "model output contains no JSON object".to_string(),
        })?;
        let mut record = schema.canonicalize(&raw);
        record.normalize_values();
        if record.get(Field::Source).is_empty() && !source_url.trim().is_empty() {
            record.set(Field::Source, source_url.trim());
        }
        debug!(source_url, model, name = %record.display_name(), "built extraction payload");
        Ok(Self::new(source_url.trim(), model, num_ctx, record))
    }

    /// Markdown table of the record with a provenance footer.
    pub fn to_markdown(&self) -> String {
        format!(
            "{}\n\n<sub>model: {} · num_ctx: {} · extracted_at (UTC): {}</sub>",
            self.data.to_markdown(),
            self.model,
            self.num_ctx,
            self.extracted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Lenient JSON object extraction from model output: the whole text, else
/// the slice from the first `{` to the last `}`.
pub fn parse_json_object(text: &str) -> Option<RawRecord> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
