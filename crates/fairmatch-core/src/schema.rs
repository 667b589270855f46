//! The fixed exhibition field set and the key canonicalizer.
//!
//! Extractors (LLM output, scraped tables, the reference database) disagree
//! on field names: typos, missing closing brackets, spacing variants. A
//! [`Schema`] maps those onto the 19 canonical [`Field`]s.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{FairmatchError, Result};
use crate::record::{CanonicalRecord, RawRecord};

pub const FIELD_COUNT: usize = 19;

/// One of the 19 canonical exhibition attributes, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    KoreanName,
    EnglishName,
    EnglishAbbreviation,
    StartDate,
    EndDate,
    VenueKorean,
    VenueEnglish,
    Country,
    City,
    FirstHeldYear,
    Frequency,
    Homepage,
    Organizer,
    Contact,
    Phone,
    Email,
    Industry,
    Exhibits,
    Source,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::KoreanName,
        Field::EnglishName,
        Field::EnglishAbbreviation,
        Field::StartDate,
        Field::EndDate,
        Field::VenueKorean,
        Field::VenueEnglish,
        Field::Country,
        Field::City,
        Field::FirstHeldYear,
        Field::Frequency,
        Field::Homepage,
        Field::Organizer,
        Field::Contact,
        Field::Phone,
        Field::Email,
        Field::Industry,
        Field::Exhibits,
        Field::Source,
    ];

    /// Korean exhibition name, the heavier-weighted identifying field.
    pub const PRIMARY_NAME: Field = Field::KoreanName;
    /// English full name, the second identifying field.
    pub const SECONDARY_NAME: Field = Field::EnglishName;

    /// Serialized key, exactly as it appears in payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::KoreanName => "전시회 국문명",
            Self::EnglishName => "영문명(Full Name)",
            Self::EnglishAbbreviation => "영문명(약자)",
            Self::StartDate => "개최 시작",
            Self::EndDate => "개최 종료",
            Self::VenueKorean => "개최장소(국문)",
            Self::VenueEnglish => "개최장소(영어)",
            Self::Country => "국가",
            Self::City => "도시",
            Self::FirstHeldYear => "첫 개최년도",
            Self::Frequency => "개최 주기",
            Self::Homepage => "공식 홈페이지",
            Self::Organizer => "주최기관",
            Self::Contact => "담당자",
            Self::Phone => "전화",
            Self::Email => "이메일",
            Self::Industry => "산업분야",
            Self::Exhibits => "전시품목",
            Self::Source => "출처",
        }
    }

    /// ASCII identifier, handy on the command line.
    pub fn ident(self) -> &'static str {
        match self {
            Self::KoreanName => "korean_name",
            Self::EnglishName => "english_name",
            Self::EnglishAbbreviation => "english_abbreviation",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::VenueKorean => "venue_korean",
            Self::VenueEnglish => "venue_english",
            Self::Country => "country",
            Self::City => "city",
            Self::FirstHeldYear => "first_held_year",
            Self::Frequency => "frequency",
            Self::Homepage => "homepage",
            Self::Organizer => "organizer",
            Self::Contact => "contact",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Industry => "industry",
            Self::Exhibits => "exhibits",
            Self::Source => "source",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }

    /// All labels in display order (the `keys` array of a payload).
    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|f| f.label().to_string()).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = FairmatchError;

    /// Accepts either the payload label or the ASCII identifier.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.label() == s || f.ident().eq_ignore_ascii_case(s))
            .ok_or_else(|| FairmatchError::UnknownField(s.to_string()))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ─── Schema ────────────────────────────────────────────────

/// Known misspelled or variant keys, many-to-one.
const BUILTIN_ALIASES: &[(&str, Field)] = &[
    ("영문명(Full Name", Field::EnglishName),
    ("영문명(FullName)", Field::EnglishName),
    ("영문명(Full name)", Field::EnglishName),
    ("공식홈페이지", Field::Homepage),
    ("개최장소(영문)", Field::VenueEnglish),
    ("개최 장소(영어)", Field::VenueEnglish),
];

/// Process-wide built-in schema.
pub static DEFAULT_SCHEMA: Lazy<Schema> = Lazy::new(Schema::builtin);

/// Immutable alias table used to canonicalize raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    aliases: HashMap<String, Field>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Schema {
    pub fn builtin() -> Self {
        Self {
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(variant, field)| (variant.to_string(), *field))
                .collect(),
        }
    }

    /// Extend the alias table. Targets must name a canonical field (label or
    /// identifier); later entries override earlier ones.
    pub fn with_aliases<I, K, V>(mut self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        for (variant, target) in extra {
            let field = target.as_ref().parse::<Field>().map_err(|_| {
                FairmatchError::ConfigError(format!(
                    "alias target '{}' is not a canonical field",
                    target.as_ref()
                ))
            })?;
            self.aliases.insert(variant.into(), field);
        }
        Ok(self)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Rewrite a raw key through the alias table; unknown keys pass through.
    pub fn resolve_key<'a>(&self, key: &'a str) -> &'a str {
        match self.aliases.get(key) {
            Some(field) => field.label(),
            None => key,
        }
    }

    /// Map an arbitrary raw record onto the 19 canonical fields.
    ///
    /// Per field the candidates are the exact key followed by every other key
    /// that starts with the label minus its trailing `)` (in input order).
    /// The first candidate whose trimmed text is non-empty wins.
    pub fn canonicalize(&self, raw: &RawRecord) -> CanonicalRecord {
        // Alias rewrite keeps the first position of a key and the last value.
        let mut fixed: Vec<(&str, &Value)> = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let key = self.resolve_key(key.as_str());
            match fixed.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => fixed.push((key, value)),
            }
        }

        let mut record = CanonicalRecord::default();
        for field in Field::ALL {
            let label = field.label();
            let stem = label.trim_end_matches(')');

            let exact = fixed.iter().filter(|(k, _)| *k == label);
            let variants = fixed
                .iter()
                .filter(|(k, _)| *k != label && k.starts_with(stem));

            let value = exact
                .chain(variants)
                .map(|(_, v)| value_text(v))
                .map(|text| text.trim().to_string())
                .find(|text| !text.is_empty())
                .unwrap_or_default();
            record.set(field, value);
        }
        record
    }
}

/// Canonicalize with the built-in schema.
pub fn canonicalize(raw: &RawRecord) -> CanonicalRecord {
    DEFAULT_SCHEMA.canonicalize(raw)
}

/// Text of a raw JSON value. `null` is empty; arrays join their non-empty
/// elements with `", "`.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(value_text)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Cow::Owned(value.to_string()),
    }
}
