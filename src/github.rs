//! Thin client for the parts of the GitHub REST API the dashboard reads.
//!
//! Successful `200` responses are cached in-process for a few minutes so a
//! dashboard refresh does not burn through the unauthenticated rate limit.
//! Nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::constants;
use crate::error::GitHubError;

/// Upper bound on cached responses; search keys come from client input.
const MAX_CACHE_ENTRIES: usize = 1024;

/// `(owner, repo)` pair naming a repository on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub repo: String,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `owner/repo` as returned in a repository's `full_name`.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo))
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub size: u64,
    // Only present on the single-repository endpoint, not in search results.
    #[serde(default)]
    pub subscribers_count: u64,
    #[serde(default)]
    pub network_count: u64,
}

/// One week of `/stats/commit_activity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitActivityWeek {
    pub week: i64,
    #[serde(default)]
    pub days: Vec<u64>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, Copy)]
pub enum SearchSort {
    Stars,
    Forks,
    Updated,
}

impl SearchSort {
    fn as_str(self) -> &'static str {
        match self {
            SearchSort::Stars => "stars",
            SearchSort::Forks => "forks",
            SearchSort::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    fetched_at: Instant,
    body: serde_json::Value,
    link: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    cache: Arc<RwLock<HashMap<String, CachedResponse>>>,
    cache_ttl: Duration,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        debug!(
            authenticated = token.is_some(),
            "GitHub API client initialized"
        );
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::from_secs(constants::GITHUB_CACHE_TTL_SECS),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<CachedResponse, GitHubError> {
        let cache_key = if query.is_empty() {
            path.to_string()
        } else {
            let params: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", path, params.join("&"))
        };

        if let Some(hit) = self.cache.read().await.get(&cache_key) {
            if hit.fetched_at.elapsed() < self.cache_ttl {
                debug!(endpoint = %cache_key, "GitHub cache hit");
                return Ok(hit.clone());
            }
        }

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(header::ACCEPT, "application/vnd.github.v3+json")
            .header(header::USER_AGENT, constants::USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await.map_err(|source| GitHubError::Transport {
            endpoint: cache_key.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(GitHubError::Status { status, body });
        }

        let link = response
            .headers()
            .get(header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|source| GitHubError::Transport {
            endpoint: cache_key.clone(),
            source,
        })?;
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| GitHubError::Decode {
                endpoint: cache_key.clone(),
                source,
            })?;

        let fetched = CachedResponse {
            fetched_at: Instant::now(),
            body,
            link,
        };
        // 202 means GitHub is still computing statistics; don't pin that.
        if status == StatusCode::OK {
            let mut cache = self.cache.write().await;
            store_in_cache(&mut cache, cache_key, fetched.clone(), self.cache_ttl);
        }
        Ok(fetched)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let response = self.request(path, query).await?;
        serde_json::from_value(response.body).map_err(|source| GitHubError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    #[instrument(skip(self), fields(repo = %id))]
    pub async fn get_repository(&self, id: &RepositoryId) -> Result<GitHubRepo, GitHubError> {
        self.get_json(&format!("/repos/{}/{}", id.owner, id.repo), &[])
            .await
    }

    #[instrument(skip(self), fields(repo = %id))]
    pub async fn get_commit_activity(
        &self,
        id: &RepositoryId,
    ) -> Result<Vec<CommitActivityWeek>, GitHubError> {
        self.get_json(
            &format!("/repos/{}/{}/stats/commit_activity", id.owner, id.repo),
            &[],
        )
        .await
    }

    #[instrument(skip(self), fields(repo = %id))]
    pub async fn get_releases(
        &self,
        id: &RepositoryId,
        limit: u32,
    ) -> Result<Vec<Release>, GitHubError> {
        self.get_json(
            &format!("/repos/{}/{}/releases", id.owner, id.repo),
            &[("per_page", limit.to_string())],
        )
        .await
    }

    #[instrument(skip(self), fields(repo = %id))]
    pub async fn get_languages(
        &self,
        id: &RepositoryId,
    ) -> Result<BTreeMap<String, u64>, GitHubError> {
        self.get_json(&format!("/repos/{}/{}/languages", id.owner, id.repo), &[])
            .await
    }

    /// Contributor count, read from the `rel="last"` page of a one-per-page listing.
    #[instrument(skip(self), fields(repo = %id))]
    pub async fn get_contributors_count(&self, id: &RepositoryId) -> Result<u64, GitHubError> {
        let path = format!("/repos/{}/{}/contributors", id.owner, id.repo);
        let response = self.request(&path, &[("per_page", "1".to_string())]).await?;
        if let Some(last) = response.link.as_deref().and_then(last_page) {
            return Ok(last);
        }
        let page: Vec<serde_json::Value> =
            serde_json::from_value(response.body).map_err(|source| GitHubError::Decode {
                endpoint: path,
                source,
            })?;
        Ok(page.len() as u64)
    }

    #[instrument(skip(self))]
    pub async fn search_repositories(
        &self,
        query: &str,
        sort: SearchSort,
        limit: u32,
    ) -> Result<Vec<GitHubRepo>, GitHubError> {
        let response: SearchResponse = self
            .get_json(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("sort", sort.as_str().to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", limit.to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }
}

/// Insert `entry`, first dropping expired entries and, when still full, the oldest one.
fn store_in_cache(
    cache: &mut HashMap<String, CachedResponse>,
    key: String,
    entry: CachedResponse,
    ttl: Duration,
) {
    cache.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
    if cache.len() >= MAX_CACHE_ENTRIES && !cache.contains_key(&key) {
        let oldest = cache
            .iter()
            .min_by_key(|(_, cached)| cached.fetched_at)
            .map(|(k, _)| k.clone());
        if let Some(oldest) = oldest {
            debug!(endpoint = %oldest, "GitHub cache full; evicting oldest entry");
            cache.remove(&oldest);
        }
    }
    cache.insert(key, entry);
}

/// Page number of the `rel="last"` entry of a `Link` header.
fn last_page(link: &str) -> Option<u64> {
    link.split(',')
        .find(|part| part.contains("rel=\"last\""))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            let url = part.get(start..end)?;
            let (_, query) = url.split_once('?')?;
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_id_from_full_name() {
        let id = RepositoryId::from_full_name("langchain-ai/langgraph").unwrap();
        assert_eq!(id, RepositoryId::new("langchain-ai", "langgraph"));
        assert_eq!(id.to_string(), "langchain-ai/langgraph");

        assert!(RepositoryId::from_full_name("no-slash").is_none());
        assert!(RepositoryId::from_full_name("/repo").is_none());
        assert!(RepositoryId::from_full_name("a/b/c").is_none());
    }

    fn cached(fetched_at: Instant) -> CachedResponse {
        CachedResponse {
            fetched_at,
            body: serde_json::Value::Null,
            link: None,
        }
    }

    #[test]
    fn test_cache_prunes_expired_entries() {
        let mut cache = HashMap::new();
        let ttl = Duration::from_millis(5);
        store_in_cache(&mut cache, "/search/repositories?q=a".into(), cached(Instant::now()), ttl);
        std::thread::sleep(Duration::from_millis(20));
        store_in_cache(&mut cache, "/search/repositories?q=b".into(), cached(Instant::now()), ttl);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("/search/repositories?q=b"));
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut cache = HashMap::new();
        let ttl = Duration::from_secs(300);
        for i in 0..MAX_CACHE_ENTRIES + 10 {
            store_in_cache(&mut cache, format!("/search/repositories?q={}", i), cached(Instant::now()), ttl);
        }
        assert_eq!(cache.len(), MAX_CACHE_ENTRIES);
        assert!(cache.contains_key(&format!("/search/repositories?q={}", MAX_CACHE_ENTRIES + 9)));
    }

    #[test]
    fn test_last_page_from_link_header() {
        let link = r#"<https://api.github.com/repositories/1/contributors?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/1/contributors?per_page=1&page=342>; rel="last""#;
        assert_eq!(last_page(link), Some(342));
        assert_eq!(
            last_page(r#"<https://api.github.com/x?page=2>; rel="next""#),
            None
        );
    }

    #[test]
    fn test_repo_deserializes_search_item_without_counts() {
        let json = serde_json::json!({
            "name": "fastmcp",
            "full_name": "jlowin/fastmcp",
            "description": null,
            "stargazers_count": 12,
            "html_url": "https://github.com/jlowin/fastmcp",
            "created_at": "2024-11-30T12:00:00Z"
        });
        let repo: GitHubRepo = serde_json::from_value(json).unwrap();
        assert_eq!(repo.stargazers_count, 12);
        assert_eq!(repo.subscribers_count, 0);
        assert!(repo.topics.is_empty());
        assert!(repo.created_at.is_some());
        assert!(repo.pushed_at.is_none());
    }
}
