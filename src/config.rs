//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-lineage.toml` in current directory
//! 4. `~/.config/sql-lineage/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! provider = "groq"            # groq, openai, anthropic, ollama
//! model = "llama-3.1-8b-instant"
//! api_key = "gsk-..."          # or use LLM_API_KEY / GROQ_API_KEY
//! base_url = "https://api.groq.com/openai/v1"
//! temperature = 0.7
//! timeout_secs = 120
//!
//! [github]
//! api_url = "https://api.github.com"
//! path = "sql"
//!
//! [clone]
//! workdir = "/tmp/lineage"
//! auth = "header"              # header, embedded-url
//! shallow = true
//!
//! [analysis]
//! error_policy = "collapse"    # collapse, per-category
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `LLM_API_KEY` | Generation-service API key |
//! | `GROQ_API_KEY` | Fallback API key when `LLM_API_KEY` is unset |
//! | `LLM_PROVIDER` | Provider name |
//! | `LLM_MODEL` | Model identifier |
//! | `LLM_BASE_URL` | Provider endpoint root |
//! | `GITHUB_API_URL` | Hosting API root |

use std::{
    env, fs,
    path::{Path, PathBuf}
};

use serde::Deserialize;

use crate::{
    classify::ErrorPolicy,
    error::{AppResult, config_error, file_read_error},
    llm::DEFAULT_TIMEOUT_SECS,
    repo::{CloneAuth, Credential}
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm:          LlmConfig,
    #[serde(default)]
    pub github:       GithubConfig,
    #[serde(default, rename = "clone")]
    pub working_copy: CloneConfig,
    #[serde(default)]
    pub analysis:     AnalysisConfig
}

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider:     Option<String>,
    pub api_key:      Option<Credential>,
    pub model:        Option<String>,
    pub base_url:     Option<String>,
    pub temperature:  Option<f32>,
    pub timeout_secs: u64
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider:     None,
            api_key:      None,
            model:        None,
            base_url:     None,
            temperature:  None,
            timeout_secs: DEFAULT_TIMEOUT_SECS
        }
    }
}

/// Hosting API configuration for the remote-listing strategy
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: Option<String>,
    /// Directory listed inside the repository, root when empty
    pub path:    String
}

/// Working-copy configuration for the clone-based strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    pub workdir: PathBuf,
    pub auth:    CloneAuth,
    pub shallow: bool
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            auth:    CloneAuth::default(),
            shallow: false
        }
    }
}

/// Classification configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub error_policy: ErrorPolicy
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-lineage.toml)
    /// 3. Config file in home directory (~/.config/sql-lineage/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-lineage")
                .join("config.toml");
            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        // Current directory config overrides the home config
        let local_config = PathBuf::from(".sql-lineage.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| file_read_error(&path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override fields from environment-style variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
            self.llm.api_key = Some(Credential::new(key));
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = Some(provider);
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(url) = lookup("GITHUB_API_URL") {
            self.github.api_url = Some(url);
        }
    }
}
