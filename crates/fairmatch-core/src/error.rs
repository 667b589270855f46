use thiserror::Error;

/// All errors that can occur in fairmatch-core.
///
/// Canonicalization, normalization and scoring are total and never produce
/// one of these; only loading, aggregate bookkeeping and config handling do.
#[derive(Debug, Error)]
pub enum FairmatchError {
    #[error(
        "No usable records in {input}: every record lacks both '전시회 국문명' and '영문명(Full Name)'"
    )]
    NoUsableRecords { input: String },

    #[error("Malformed input in {input}: {message}")]
    Malformed { input: String, message: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Aggregate needs at least one source record")]
    NoSources,

    #[error("Aggregate accepts at most {max} source records, got {count}")]
    TooManySources { count: usize, max: usize },

    #[error("Source index {index} out of range ({available} sources)")]
    SourceOutOfRange { index: usize, available: usize },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl FairmatchError {
    /// True for failures that mean "this input had nothing to reconcile",
    /// as opposed to a reconciliation that ran and found no matches.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::NoUsableRecords { .. } | Self::Malformed { .. } | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FairmatchError>;
