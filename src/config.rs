use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub github: GithubConfig,
  /// Custom title for header (defaults to owner/repo if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub latency: LatencyConfig,
  #[serde(default)]
  pub list_mode: ListMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
  pub owner: String,
  pub repo: String,
  /// REST API root, override for GitHub Enterprise
  #[serde(default = "default_api_url")]
  pub api_url: String,
  /// Page size sent as `per_page`; GitHub's default (30) when unset
  pub per_page: Option<u32>,
}

fn default_api_url() -> String {
  "https://api.github.com".to_string()
}

/// Simulated latency added before each request, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
  pub issues_ms: u64,
  pub issue_ms: u64,
  pub comments_ms: u64,
  pub labels_ms: u64,
}

impl Default for LatencyConfig {
  fn default() -> Self {
    Self {
      issues_ms: 1500,
      issue_ms: 1500,
      comments_ms: 1500,
      labels_ms: 1000,
    }
  }
}

impl LatencyConfig {
  pub fn issues(&self) -> Duration {
    Duration::from_millis(self.issues_ms)
  }

  pub fn issue(&self) -> Duration {
    Duration::from_millis(self.issue_ms)
  }

  pub fn comments(&self) -> Duration {
    Duration::from_millis(self.comments_ms)
  }

  pub fn labels(&self) -> Duration {
    Duration::from_millis(self.labels_ms)
  }
}

/// How the issue list is paged through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
  /// Explicit page counter with next/previous
  Paged,
  /// Pages accumulate into one list
  #[default]
  Infinite,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gh9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gh9s/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/gh9s/config.yaml\n\
                 or pass --repo owner/name."
      )),
    }
  }

  /// Minimal configuration for a repository given on the command line
  pub fn for_repo(slug: &str) -> Result<Self> {
    let (owner, repo) = parse_repo(slug)?;
    Ok(Self {
      github: GithubConfig {
        owner,
        repo,
        api_url: default_api_url(),
        per_page: None,
      },
      title: None,
      latency: LatencyConfig::default(),
      list_mode: ListMode::default(),
    })
  }

  /// Configuration for a `--repo` run: the config file when there is one,
  /// otherwise defaults for `slug`. A config file that fails to load is an
  /// error, not a reason to fall back.
  pub fn load_for_repo(slug: &str) -> Result<Self> {
    Self::from_found_file(Self::find_config_file(), slug)
  }

  fn from_found_file(found: Option<PathBuf>, slug: &str) -> Result<Self> {
    match found {
      Some(path) => Self::load_from_path(&path),
      None => Self::for_repo(slug),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("gh9s.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gh9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Display name of the repository, `owner/repo`
  pub fn repo_slug(&self) -> String {
    format!("{}/{}", self.github.owner, self.github.repo)
  }

  /// Get the GitHub token from environment variables.
  ///
  /// Checks GH9S_GITHUB_TOKEN first, then GITHUB_TOKEN as fallback. A missing
  /// token is not an error: public repositories work anonymously.
  pub fn get_api_token() -> Option<String> {
    std::env::var("GH9S_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}

/// Split `owner/repo` into its two parts
pub fn parse_repo(slug: &str) -> Result<(String, String)> {
  match slug.trim().split_once('/') {
    Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
      Ok((owner.to_string(), repo.to_string()))
    }
    _ => Err(eyre!("Invalid repository '{}', expected owner/name", slug)),
  }
}
