//! Perfdash configuration

use anyhow::{Context, Result};
use clap::ValueEnum;
use perfdash_lib::{ArtifactKind, ArtifactRules, DisambiguationRules};
use serde::Deserialize;
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (default)
    #[default]
    Json,
    /// Human readable
    Text,
}

/// Maps artifact files starting with `prefix` to a decoder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub kind: ArtifactKind,
}

/// Perfdash configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerfdashConfig {
    /// Keep only this many of the most recent builds
    #[serde(default)]
    pub max_builds: Option<usize>,

    /// Name normalization rules for resource usage summaries
    #[serde(default)]
    pub normalizer: DisambiguationRules,

    /// Extra file name prefixes, added on top of the built-in ones
    #[serde(default)]
    pub artifact_prefixes: Vec<PrefixRule>,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl PerfdashConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `PERFDASH_` prefix and take precedence
    /// over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("PERFDASH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Built-in prefixes plus the configured ones
    pub fn artifact_rules(&self) -> ArtifactRules {
        self.artifact_prefixes
            .iter()
            .fold(ArtifactRules::default(), |rules, rule| {
                rules.with_prefix(rule.prefix.as_str(), rule.kind)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("perfdash.toml");
        fs::write(
            &path,
            r#"
max_builds = 20
log_format = "text"

[[artifact_prefixes]]
prefix = "LoadResponsiveness"
kind = "perf_data"

[[normalizer.rules]]
min_len = 1
max_len = 2
alphabet = "0123456789"
"#,
        )
        .unwrap();

        let config = PerfdashConfig::load(Some(path.as_path())).unwrap();

        assert_eq!(config.max_builds, Some(20));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.normalizer.rules.len(), 1);
        assert_eq!(config.normalizer.rules[0].max_len, 2);
        assert_eq!(
            config.artifact_rules().classify("LoadResponsiveness_x.json"),
            Some(ArtifactKind::PerfData)
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(PerfdashConfig::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PerfdashConfig::default();
        assert_eq!(config.max_builds, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.normalizer, DisambiguationRules::default());
        assert_eq!(
            config.artifact_rules().classify("ResourceUsageSummary.json"),
            Some(ArtifactKind::ResourceUsage)
        );
    }
}
