use config::{Config, ConfigError, Environment, File, Map};
use extractors::{GuardrailConfig, ParserConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::receipt_extractor::default_model_sequence;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Skip the model entirely and use the local parser.
    pub force_local: bool,
    pub model: ModelConfig,
    pub parser: ParserConfig,
    pub guardrails: GuardrailConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub sequence: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            sequence: default_model_sequence(),
            timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    /// Load configuration from `path`, or from the default location when no
    /// path is given. A missing default file means built-in defaults; a
    /// missing explicit file is an error. `RECEIPT_*` environment variables
    /// override file values; `RECEIPT_MODEL__SEQUENCE` takes a comma-separated
    /// list of model IDs.
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`AgentConfig::load`], reading `RECEIPT_*` variables from `vars`
    /// instead of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        vars: Option<Map<String, String>>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let (config_path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (get_config_path(), false),
        };

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()).required(required))
            .add_source(
                Environment::with_prefix("RECEIPT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("model.sequence")
                    .source(vars),
            )
            .build()?;

        let mut config: AgentConfig = builder.try_deserialize()?;

        if config.model.api_key.is_none() {
            config.model.api_key = std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        let used_path = config_path.exists().then_some(config_path);
        Ok((config, used_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("receipt-extractor").join("config.toml")
    } else {
        PathBuf::from("receipt-extractor.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "receipt-extractor-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let path = write_temp_config(
            "partial",
            r#"
force_local = true

[model]
sequence = ["gemini-1.5-pro"]
timeout_secs = 5

[guardrails]
suspicious_tax_rate = 0.25
"#,
        );

        let (config, used) = AgentConfig::load_with_env(Some(&path), Some(Map::new())).unwrap();
        assert!(config.force_local);
        assert_eq!(config.model.sequence, vec!["gemini-1.5-pro".to_string()]);
        assert_eq!(config.model.timeout_secs, 5);
        assert_eq!(config.guardrails.suspicious_tax_rate, 0.25);
        // Untouched calibration constants keep their defaults
        assert_eq!(config.guardrails.subtotal_tolerance, 0.05);
        assert_eq!(config.parser, ParserConfig::default());
        assert_eq!(used.as_deref(), Some(path.as_path()));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_env_overrides_model_sequence_and_force_local() {
        let path = write_temp_config("env", "[model]\ntimeout_secs = 5\n");
        let vars: Map<String, String> = [
            ("RECEIPT_MODEL__SEQUENCE", "gemini-1.5-pro,gemini-1.5-flash"),
            ("RECEIPT_FORCE_LOCAL", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (config, _) = AgentConfig::load_with_env(Some(&path), Some(vars)).unwrap();
        assert_eq!(
            config.model.sequence,
            vec!["gemini-1.5-pro".to_string(), "gemini-1.5-flash".to_string()]
        );
        assert!(config.force_local);
        assert_eq!(config.model.timeout_secs, 5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("receipt-extractor-does-not-exist.toml");
        assert!(AgentConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert!(!config.force_local);
        assert_eq!(config.model.sequence.len(), 4);
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.guardrails.max_items, 20);
    }
}
