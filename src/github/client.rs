use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Thin GitHub REST client scoped to a single repository
#[derive(Clone)]
pub struct GithubClient {
  http: reqwest::Client,
  base_url: Url,
}

impl GithubClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = repo_base_url(&config.github.api_url, &config.github.owner, &config.github.repo)?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("gh9s"));
    headers.insert(
      ACCEPT,
      HeaderValue::from_static("application/vnd.github+json"),
    );
    if let Some(token) = Config::get_api_token() {
      let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| eyre!("Invalid GitHub token: {}", e))?;
      value.set_sensitive(true);
      headers.insert(AUTHORIZATION, value);
    }

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// GET `path` below the repository URL and decode the JSON body
  pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let url = endpoint_url(&self.base_url, path, query);
    debug!(%url, "GET");

    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("GET {} returned {}", url, status));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?;
    debug!(%url, bytes = body.len(), "response received");

    serde_json::from_slice(&body).map_err(|e| eyre!("Failed to parse response from {}: {}", url, e))
  }
}

/// Build `{api_url}/repos/{owner}/{repo}`
fn repo_base_url(api_url: &str, owner: &str, repo: &str) -> Result<Url> {
  let mut url =
    Url::parse(api_url).map_err(|e| eyre!("Invalid GitHub API URL {}: {}", api_url, e))?;
  url
    .path_segments_mut()
    .map_err(|_| eyre!("GitHub API URL cannot be a base: {}", api_url))?
    .pop_if_empty()
    .extend(["repos", owner, repo]);
  Ok(url)
}

/// Append `path` segments and query pairs to the repository URL
fn endpoint_url(base: &Url, path: &str, query: &[(&str, String)]) -> Url {
  let mut url = base.clone();
  if let Ok(mut segments) = url.path_segments_mut() {
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
  }
  if !query.is_empty() {
    url
      .query_pairs_mut()
      .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
  }
  url
}
