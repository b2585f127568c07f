use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::error::CciError;
use crate::git::RepoDefaults;
use crate::providers::circleci::{CircleCiClient, Project};

const DEFAULT_BASE_URL: &str = "https://circleci.com";

/// Configuration file structure for cci.
///
/// Holds the project coordinates and credentials that would otherwise have
/// to be passed as flags on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// CircleCI connection and project settings
    #[serde(default)]
    pub circleci: CircleCiConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircleCiConfig {
    /// CircleCI personal API token
    pub token: Option<String>,

    /// CircleCI instance base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Version control provider (e.g., 'github', 'bitbucket')
    pub vcs_type: Option<String>,

    /// Organization or user owning the project
    pub org: Option<String>,

    /// Project (repository) name
    pub project: Option<String>,

    /// Branch to inspect
    pub branch: Option<String>,

    /// Number of recent pipelines to show
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for CircleCiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            vcs_type: None,
            org: None,
            project: None,
            branch: None,
            limit: default_limit(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_limit() -> usize {
    1
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./cci.toml, ./cci.json, ./cci.yaml, ./cci.yml
    /// 3. `<config dir>/cci/config.toml`
    ///
    /// Returns default configuration if no file is found. An explicitly
    /// given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        match Self::discover(&cwd, dirs::config_dir().as_deref()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// First existing config file among the known candidates.
    fn discover(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
        let candidates = ["cci.toml", "cci.json", "cci.yaml", "cci.yml"];

        candidates
            .iter()
            .map(|candidate| cwd.join(candidate))
            .chain(config_dir.map(|dir| dir.join("cci").join("config.toml")))
            .find(|path| path.is_file())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub vcs_type: Option<String>,
    pub org: Option<String>,
    pub project: Option<String>,
    pub branch: Option<String>,
}

/// Settings after merging flags, the config file and git defaults.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub token: Token,
    pub base_url: String,
    pub vcs_type: String,
    pub org: String,
    pub project: String,
    pub branch: String,
}

impl ResolvedSettings {
    /// Flags win over the config file, which wins over git defaults.
    pub fn resolve(overrides: Overrides, config: &Config, git: RepoDefaults) -> Self {
        let file = &config.circleci;
        let pick = |flag: Option<String>, file: &Option<String>, git: String| {
            flag.filter(|v| !v.is_empty())
                .or_else(|| file.clone().filter(|v| !v.is_empty()))
                .unwrap_or(git)
        };

        Self {
            token: Token::from(pick(overrides.token, &file.token, String::new())),
            base_url: overrides
                .base_url
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| file.base_url.clone()),
            vcs_type: pick(overrides.vcs_type, &file.vcs_type, git.vcs_type),
            org: pick(overrides.org, &file.org, git.organization),
            project: pick(overrides.project, &file.project, git.repository),
            branch: pick(overrides.branch, &file.branch, git.branch),
        }
    }

    /// Validates the settings and builds a client for the project.
    pub fn client(&self) -> crate::error::Result<CircleCiClient> {
        let required = [
            (&self.project, "no project specified"),
            (&self.org, "no organization specified"),
            (&self.vcs_type, "no vcs-type specified"),
        ];
        if let Some((_, message)) = required.iter().find(|(value, _)| value.is_empty()) {
            return Err(CciError::Config((*message).to_string()));
        }
        if self.token.is_empty() {
            return Err(CciError::Config("no circleci token specified".to_string()));
        }

        let project = Project {
            name: self.project.clone(),
            organization: self.org.clone(),
            vcs_type: self.vcs_type.clone(),
        };
        CircleCiClient::new(&self.base_url, project, self.token.clone())
    }
}
