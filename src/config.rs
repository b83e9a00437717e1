use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CorepError, Result};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Hashing,
    OpenAi,
}

impl FromStr for EmbeddingBackend {
    type Err = CorepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hashing" => Ok(EmbeddingBackend::Hashing),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            other => Err(CorepError::Config(format!(
                "unknown embedding provider '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub dimensions: usize,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Hashing,
            dimensions: 384,
            model: "text-embedding-3-small".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub top_k: usize,
    pub tolerance: f64,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            tolerance: DEFAULT_TOLERANCE,
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON file (explicit path or the per-user one), then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            CorepError::Config(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// `<config dir>/corep-rag/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("corep-rag").join("config.json"))
    }

    /// Applies overrides from a variable lookup, so tests never touch the
    /// real process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("COREP_TOP_K") {
            self.top_k = parse_var("COREP_TOP_K", &v)?;
        }
        if let Some(v) = lookup("COREP_TOLERANCE") {
            self.tolerance = parse_var("COREP_TOLERANCE", &v)?;
        }
        if let Some(v) = lookup("COREP_EMBEDDING_PROVIDER") {
            self.embedding.provider = v.parse()?;
        }
        if let Some(v) = lookup("COREP_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = parse_var("COREP_EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = lookup("COREP_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = lookup("COREP_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Some(v) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.embedding.api_key = Some(v);
        }
        if let Some(v) = lookup("GEMINI_MODEL") {
            self.generation.model = v;
        }
        if let Some(v) = lookup("GEMINI_ENDPOINT") {
            self.generation.endpoint = v;
        }
        if let Some(v) = lookup("GEMINI_API_KEY").filter(|v| !v.is_empty()) {
            self.generation.api_key = Some(v);
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CorepError::Config(format!("{key} has an invalid value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.top_k, 3);
        assert!((config.tolerance - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.embedding.provider, EmbeddingBackend::Hashing);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert!(config.generation.api_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path)?;
        writeln!(file, r#"{{"top_k": 5, "embedding": {{"dimensions": 64}}}}"#)?;

        let config = Config::from_file(&path)?;
        assert_eq!(config.top_k, 5);
        assert_eq!(config.embedding.dimensions, 64);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert!((config.tolerance - DEFAULT_TOLERANCE).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_config_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "not json")?;

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, CorepError::Config(_)));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> anyhow::Result<()> {
        let vars: HashMap<&str, &str> = [
            ("COREP_TOP_K", "7"),
            ("COREP_TOLERANCE", "0.5"),
            ("COREP_EMBEDDING_PROVIDER", "OpenAI"),
            ("GEMINI_API_KEY", "secret"),
            ("OPENAI_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()))?;

        assert_eq!(config.top_k, 7);
        assert!((config.tolerance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAi);
        assert_eq!(config.generation.api_key.as_deref(), Some("secret"));
        assert!(config.embedding.api_key.is_none());
        Ok(())
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "COREP_TOP_K").then(|| "three".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("COREP_TOP_K"));
    }
}
