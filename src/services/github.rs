use crate::error::AnalysisError;
use crate::models::repo::{FileStructure, RepoData, RepoId};
use crate::services::credentials::CredentialPool;
use crate::services::resilient::{Classify, ErrorClass, ResilientClient};
use crate::services::RepositoryProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const SERVICE: &str = "GitHub";
const USER_AGENT: &str = concat!("gitgrade/", env!("CARGO_PKG_VERSION"));
const README_LIMIT: usize = 10_000;

static LAST_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[?&]page=(\d+)[^>]*>;\s*rel="last""#).expect("link header pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GithubError {
    #[error("{0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub rejected the credential: {0}")]
    Unauthorized(String),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Network(String),

    #[error("Unexpected GitHub response: {0}")]
    Decode(String),
}

impl Classify for GithubError {
    fn classify(&self) -> ErrorClass {
        match self {
            GithubError::NotFound(_) => ErrorClass::NotFound,
            GithubError::RateLimited(_) | GithubError::Unauthorized(_) => ErrorClass::Exhausted,
            GithubError::Api { .. } | GithubError::Network(_) | GithubError::Decode(_) => {
                ErrorClass::Transient
            }
        }
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GithubError::Decode(err.to_string())
        } else {
            GithubError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    license: Option<LicenseResponse>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    has_issues: bool,
    #[serde(default)]
    has_wiki: bool,
    #[serde(default)]
    default_branch: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateResources,
}

#[derive(Debug, Deserialize)]
struct RateResources {
    core: RateWindow,
}

#[derive(Debug, Deserialize)]
struct RateWindow {
    remaining: u64,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// GitHub REST client. Every request goes through the shared [`ResilientClient`].
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    resilient: ResilientClient,
}

impl GithubClient {
    pub fn new(
        base_url: &str,
        pool: Arc<CredentialPool>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        if pool.is_empty() {
            log::warn!("No GitHub token configured; using the unauthenticated API (60 requests/hour)");
        } else {
            log::info!("GitHub client initialized with {} token(s)", pool.len());
        }
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            resilient: ResilientClient::new(SERVICE, pool).with_deadline(timeout),
        })
    }

    fn get(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .get(format!("{}{path}", self.base_url))
            .header(ACCEPT, "application/vnd.github+json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_once(&self, repo: &RepoId, token: Option<String>) -> Result<RepoData, GithubError> {
        let token = token.as_deref();
        let full_name = repo.full_name();
        let not_found = format!("Repository not found or is private: {full_name}");

        let response = self.get(&format!("/repos/{full_name}"), token).send().await?;
        let meta: RepoResponse = check_status(response, &not_found).await?.json().await?;

        let mut data = RepoData {
            name: meta.name,
            description: meta.description.unwrap_or_default(),
            url: repo.key(),
            license: meta.license.map(|license| license.name),
            stars: meta.stargazers_count,
            forks: meta.forks_count,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            has_issues: meta.has_issues,
            has_wiki: meta.has_wiki,
            default_branch: meta.default_branch,
            size: meta.size,
            ..RepoData::default()
        };
        if data.size == 0 {
            return Ok(data);
        }

        data.languages = optional(
            "Languages",
            &full_name,
            self.languages(&full_name, token).await,
        )?;
        data.readme = optional("README", &full_name, self.readme(&full_name, token).await)?;
        data.contributors = optional(
            "Contributors",
            &full_name,
            self.contributor_count(&full_name, token).await,
        )?;
        data.file_structure = optional(
            "Contents",
            &full_name,
            self.top_level(&full_name, token).await,
        )?;

        Ok(data)
    }

    async fn languages(&self, full_name: &str, token: Option<&str>) -> Result<BTreeMap<String, u64>, GithubError> {
        let response = self.get(&format!("/repos/{full_name}/languages"), token).send().await?;
        Ok(check_status(response, full_name).await?.json().await?)
    }

    async fn readme(&self, full_name: &str, token: Option<&str>) -> Result<String, GithubError> {
        let response = self
            .get(&format!("/repos/{full_name}/readme"), token)
            .header(ACCEPT, "application/vnd.github.raw+json")
            .send()
            .await?;
        let text = check_status(response, full_name).await?.text().await?;
        Ok(text.chars().take(README_LIMIT).collect())
    }

    /// Reads the total from the `rel="last"` link when the listing is paginated.
    async fn contributor_count(&self, full_name: &str, token: Option<&str>) -> Result<u64, GithubError> {
        let response = self
            .get(&format!("/repos/{full_name}/contributors?per_page=1&anon=1"), token)
            .send()
            .await?;
        let response = check_status(response, full_name).await?;
        if let Some(last) = last_page(response.headers()) {
            return Ok(last);
        }
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(0);
        }
        let entries: Vec<serde_json::Value> = response.json().await?;
        Ok(entries.len() as u64)
    }

    async fn top_level(&self, full_name: &str, token: Option<&str>) -> Result<FileStructure, GithubError> {
        let response = self.get(&format!("/repos/{full_name}/contents"), token).send().await?;
        let entries: Vec<ContentEntry> = check_status(response, full_name).await?.json().await?;

        let folders = entries.iter().filter(|entry| entry.kind == "dir").count();
        let file_names: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.kind == "file")
            .map(|entry| entry.name)
            .collect();
        Ok(FileStructure {
            folders,
            files: file_names.len(),
            file_names,
        })
    }

    async fn rate_limit_once(&self, token: Option<String>) -> Result<u64, GithubError> {
        let response = self.get("/rate_limit", token.as_deref()).send().await?;
        let body: RateLimitResponse = check_status(response, "rate limit endpoint").await?.json().await?;
        Ok(body.resources.core.remaining)
    }
}

#[async_trait]
impl RepositoryProvider for GithubClient {
    async fn fetch_repository(&self, repo: &RepoId) -> Result<RepoData, AnalysisError> {
        let data = self
            .resilient
            .call(|token| self.fetch_once(repo, token))
            .await?;

        if data.size == 0 {
            return Err(AnalysisError::EmptyResource(format!(
                "Repository has no files: {}",
                repo.full_name()
            )));
        }
        log::info!(
            "Fetched {} ({} stars, {} languages)",
            repo.full_name(),
            data.stars,
            data.languages.len()
        );
        Ok(data)
    }

    async fn rate_limit_remaining(&self) -> Result<u64, AnalysisError> {
        Ok(self.resilient.call(|token| self.rate_limit_once(token)).await?)
    }
}

/// Maps a non-success response onto a classified [`GithubError`].
async fn check_status(response: reqwest::Response, not_found: &str) -> Result<reqwest::Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let quota_spent = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0");
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageBody>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::NOT_FOUND => GithubError::NotFound(not_found.to_string()),
        StatusCode::UNAUTHORIZED => GithubError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => GithubError::RateLimited(message),
        StatusCode::FORBIDDEN if quota_spent || message.to_lowercase().contains("rate limit") => {
            GithubError::RateLimited(message)
        }
        other => GithubError::Api {
            status: other.as_u16(),
            message,
        },
    })
}

/// Secondary lookups degrade to an empty value unless the credential itself
/// is spent, in which case the whole fetch is retried with the next one.
fn optional<T: Default>(what: &str, full_name: &str, result: Result<T, GithubError>) -> Result<T, GithubError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.classify() == ErrorClass::Exhausted => Err(err),
        Err(err) => {
            log::debug!("{what} unavailable for {full_name}: {err}");
            Ok(T::default())
        }
    }
}

fn last_page(headers: &HeaderMap) -> Option<u64> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let captures = LAST_PAGE.captures(link)?;
    captures[1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn classification_routes_quota_errors_to_rotation() {
        assert_eq!(GithubError::NotFound("x".into()).classify(), ErrorClass::NotFound);
        assert_eq!(GithubError::RateLimited("x".into()).classify(), ErrorClass::Exhausted);
        assert_eq!(GithubError::Unauthorized("x".into()).classify(), ErrorClass::Exhausted);
        assert_eq!(
            GithubError::Api {
                status: 502,
                message: "bad gateway".into()
            }
            .classify(),
            ErrorClass::Transient
        );
        assert_eq!(GithubError::Network("reset".into()).classify(), ErrorClass::Transient);
    }

    #[test]
    fn spent_credential_on_secondary_lookup_is_not_swallowed() {
        let spent = optional::<u64>("Contributors", "a/b", Err(GithubError::RateLimited("limit".into())));
        assert_eq!(spent, Err(GithubError::RateLimited("limit".into())));

        let revoked = optional::<String>("README", "a/b", Err(GithubError::Unauthorized("bad".into())));
        assert!(revoked.is_err());

        let absent = optional::<String>("README", "a/b", Err(GithubError::NotFound("a/b".into())));
        assert_eq!(absent, Ok(String::new()));

        let flaky = optional::<u64>("Contributors", "a/b", Err(GithubError::Network("reset".into())));
        assert_eq!(flaky, Ok(0));
    }

    #[test]
    fn last_page_is_read_from_link_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.github.com/repositories/1/contributors?per_page=1&anon=1&page=2>; rel=\"next\", \
                 <https://api.github.com/repositories/1/contributors?per_page=1&anon=1&page=187>; rel=\"last\"",
            ),
        );
        assert_eq!(last_page(&headers), Some(187));
        assert_eq!(last_page(&HeaderMap::new()), None);
    }
}
