//! Configuration file for dolphin.
//!
//! An optional YAML file supplies defaults for the `gen` command. Every
//! field is optional; command-line flags override file values.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Mock;

/// File names searched for when no `--config` is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["dolphin.yaml", ".dolphin.yaml"];

/// What to do when a function already has a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Assume {
    /// Ask on the terminal.
    #[default]
    Ask,
    /// Generate anyway.
    Yes,
    /// Skip every overlapping function.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory that import paths are joined onto.
    #[serde(alias = "workspace_root")]
    pub module_path: Option<PathBuf>,
    /// Mock library name, recorded verbatim in the prompt.
    pub mock_lib: Option<String>,
    /// Mock directory, recorded verbatim in the prompt.
    pub mock_dir: Option<String>,
    /// Ollama model (default: llama2).
    pub model: Option<String>,
    /// Ollama base URL (default: http://localhost:11434).
    pub ollama_url: Option<String>,
    /// Sampling temperature (default: 0.8).
    pub temperature: Option<f32>,
    pub assume: Option<Assume>,
    /// Whether to look for existing tests before generating (default: true).
    pub check_existing: Option<bool>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to null rather than a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit`, or the first default config found in `dir`, or defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::parse_file(path),
            None => match discover(dir) {
                Some(path) => {
                    tracing::debug!("using config {}", path.display());
                    Self::parse_file(path)
                }
                None => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("ollama_url must be an http(s) URL, got {:?}", url);
            }
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                anyhow::bail!("model must not be empty");
            }
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                anyhow::bail!("temperature must be between 0 and 2, got {}", t);
            }
        }
        Ok(())
    }

    pub fn mock(&self) -> Mock {
        Mock {
            name: self.mock_lib.clone().unwrap_or_default(),
            dir: self.mock_dir.clone().unwrap_or_default(),
        }
    }

    pub fn assume(&self) -> Assume {
        self.assume.unwrap_or_default()
    }

    pub fn should_check_existing(&self) -> bool {
        self.check_existing.unwrap_or(true)
    }
}

/// Find a default config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
module_path: /home/dev/go/src
mock_lib: mockery
mock_dir: internal/mocks
model: codellama
ollama_url: http://localhost:11434
assume: skip
check_existing: false
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.module_path, Some(PathBuf::from("/home/dev/go/src")));
        assert_eq!(
            config.mock(),
            Mock {
                name: "mockery".into(),
                dir: "internal/mocks".into()
            }
        );
        assert_eq!(config.model.as_deref(), Some("codellama"));
        assert_eq!(config.assume(), Assume::Skip);
        assert!(!config.should_check_existing());
    }

    #[test]
    fn test_workspace_root_alias() {
        let config = Config::parse("workspace_root: ./ws\n").unwrap();
        assert_eq!(config.module_path, Some(PathBuf::from("./ws")));
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.assume(), Assume::Ask);
        assert!(config.should_check_existing());
        assert_eq!(config.mock(), Mock::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("ollama_url: localhost:11434\n").is_err());
        assert!(Config::parse("model: \"\"\n").is_err());
        assert!(Config::parse("assume: maybe\n").is_err());
        assert!(Config::parse("temperature: 3.5\n").is_err());
        assert_eq!(
            Config::parse("temperature: 0.2\n").unwrap().temperature,
            Some(0.2)
        );
    }

    #[test]
    fn test_load_discovers_default_names() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Config::load(None, temp.path()).unwrap(), Config::default());

        fs::write(temp.path().join(".dolphin.yaml"), "mock_lib: gomock\n").unwrap();
        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.mock_lib.as_deref(), Some("gomock"));

        let explicit = temp.path().join("custom.yaml");
        fs::write(&explicit, "mock_lib: testify\n").unwrap();
        let config = Config::load(Some(&explicit), temp.path()).unwrap();
        assert_eq!(config.mock_lib.as_deref(), Some("testify"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(&temp.path().join("nope.yaml")), temp.path()).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
