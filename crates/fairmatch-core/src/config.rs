use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FairmatchError, Result};
use crate::homepage::DEFAULT_AGGREGATOR_DOMAINS;
use crate::schema::Schema;
use crate::scorer::NameWeights;
use crate::similarity::SimilarityKind;

/// Root configuration, loaded from `~/.config/fairmatch/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairmatchConfig {
    pub matching: MatchingConfig,
    pub schema: SchemaConfig,
    pub homepage: HomepageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub similarity: SimilarityKind,
    pub weights: NameWeights,
}

/// Extra key aliases, variant → canonical label (or field identifier).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomepageConfig {
    pub aggregator_domains: Vec<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            similarity: SimilarityKind::default(),
            weights: NameWeights::default(),
        }
    }
}

impl Default for HomepageConfig {
    fn default() -> Self {
        Self {
            aggregator_domains: DEFAULT_AGGREGATOR_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

// ─── Validation ────────────────────────────────────────────

impl MatchingConfig {
    pub fn validate(&self) -> Result<()> {
        let NameWeights { primary, secondary } = self.weights;
        for (name, weight) in [("primary", primary), ("secondary", secondary)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FairmatchError::ConfigError(format!(
                    "matching.weights.{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if primary + secondary == 0.0 {
            return Err(FairmatchError::ConfigError(
                "matching.weights: at least one weight must be positive".to_string(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(FairmatchError::ConfigError(format!(
                "matching.threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl FairmatchConfig {
    pub fn validate(&self) -> Result<()> {
        self.matching.validate()?;
        self.build_schema()?;
        Ok(())
    }

    /// Built-in schema extended with the configured aliases.
    pub fn build_schema(&self) -> Result<Schema> {
        Schema::builtin().with_aliases(
            self.schema
                .aliases
                .iter()
                .map(|(variant, target)| (variant.clone(), target.as_str())),
        )
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl FairmatchConfig {
    /// Standard config file path: `~/.config/fairmatch/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("FAIRMATCH_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("fairmatch")
            .join("config.toml")
    }

    /// Load and validate config, falling back to defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = FairmatchConfig::default();
        assert_eq!(cfg.matching.threshold, 0.8);
        assert_eq!(cfg.matching.weights.primary, 0.6);
        assert_eq!(cfg.matching.similarity, SimilarityKind::Partial);
        assert!(cfg.homepage.aggregator_domains.contains(&"10times.com".to_string()));
        cfg.validate().unwrap();
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = FairmatchConfig::default();
        cfg.matching.threshold = 0.7;
        cfg.matching.similarity = SimilarityKind::Sequence;
        cfg.schema
            .aliases
            .insert("Exhibition Name".to_string(), "english_name".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = FairmatchConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg =
            FairmatchConfig::load_from(Path::new("/tmp/nonexistent_fairmatch_config.toml")).unwrap();
        assert_eq!(cfg, FairmatchConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[matching]\nthreshold = 0.65\n\n[matching.weights]\nsecondary = 0.5\n",
        )
        .unwrap();
        let cfg = FairmatchConfig::load_from(&path).unwrap();
        assert_eq!(cfg.matching.threshold, 0.65);
        assert_eq!(cfg.matching.weights.primary, 0.6);
        assert_eq!(cfg.matching.weights.secondary, 0.5);
        assert_eq!(cfg.homepage, HomepageConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut cfg = FairmatchConfig::default();
        cfg.matching.weights = NameWeights {
            primary: 0.0,
            secondary: 0.0,
        };
        assert!(matches!(cfg.validate(), Err(FairmatchError::ConfigError(_))));

        let mut cfg = FairmatchConfig::default();
        cfg.matching.weights.primary = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = FairmatchConfig::default();
        cfg.matching.threshold = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = FairmatchConfig::default();
        cfg.schema.aliases.insert("x".to_string(), "nope".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nsimilarity = \"levenshtein\"\n").unwrap();
        assert!(matches!(
            FairmatchConfig::load_from(&path),
            Err(FairmatchError::TomlParse(_))
        ));
    }

    #[test]
    fn test_schema_includes_aliases() {
        let mut cfg = FairmatchConfig::default();
        cfg.schema
            .aliases
            .insert("Exhibition Name".to_string(), "영문명(Full Name)".to_string());
        let schema = cfg.build_schema().unwrap();
        assert_eq!(schema.resolve_key("Exhibition Name"), "영문명(Full Name)");
    }
}
