//! Live repository statistics for resolved frameworks.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::constants;
use crate::error::GitHubError;
use crate::github::{CommitActivityWeek, GitHubClient, GitHubRepo, Release, RepositoryId};
use crate::resolver::Resolver;

const RELEASE_LIMIT: u32 = 10;
const RECENT_RELEASE_DAYS: i64 = 30;
const RECENT_COMMIT_WEEKS: usize = 4;

/// Everything fetched for one repository.
#[derive(Debug, Clone)]
pub struct RepositoryMetrics {
    pub id: RepositoryId,
    pub repo: GitHubRepo,
    pub commit_activity: Vec<CommitActivityWeek>,
    pub releases: Vec<Release>,
    pub languages: BTreeMap<String, u64>,
    pub contributors: u64,
}

impl RepositoryMetrics {
    /// Releases published within the last 30 days of `now`.
    pub fn recent_releases(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(RECENT_RELEASE_DAYS);
        self.releases
            .iter()
            .filter(|r| r.published_at.is_some_and(|at| at > cutoff))
            .count()
    }

    /// Commits over the last four weeks of the activity histogram.
    pub fn recent_commits(&self) -> u64 {
        let skip = self.commit_activity.len().saturating_sub(RECENT_COMMIT_WEEKS);
        self.commit_activity.iter().skip(skip).map(|w| w.total).sum()
    }

    pub fn weekly_commits(&self) -> Vec<u64> {
        self.commit_activity.iter().map(|w| w.total).collect()
    }

    /// Language with the most bytes, `"Unknown"` when GitHub reports none.
    pub fn primary_language(&self) -> String {
        self.languages
            .iter()
            // max_by_key keeps the last maximum; reverse so ties go to the first name.
            .rev()
            .max_by_key(|(_, bytes)| **bytes)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Fetch metadata plus the auxiliary resources for `id`.
///
/// Only the core repository call can fail the whole operation; the auxiliary
/// resources degrade to empty values with a warning.
#[instrument(skip(github), fields(repo = %id))]
pub async fn fetch_metrics(
    github: &GitHubClient,
    id: &RepositoryId,
) -> Result<RepositoryMetrics, GitHubError> {
    let (repo, commit_activity, releases, languages, contributors) = tokio::join!(
        github.get_repository(id),
        github.get_commit_activity(id),
        github.get_releases(id, RELEASE_LIMIT),
        github.get_languages(id),
        github.get_contributors_count(id),
    );

    let repo = repo.map_err(|e| {
        error!("Failed to fetch repository metadata for {}: {}", id, e);
        e
    })?;

    Ok(RepositoryMetrics {
        id: id.clone(),
        repo,
        commit_activity: or_default(commit_activity, "commit activity", id),
        releases: or_default(releases, "releases", id),
        languages: or_default(languages, "languages", id),
        contributors: or_default(contributors, "contributors count", id),
    })
}

fn or_default<T: Default>(result: Result<T, GitHubError>, what: &str, id: &RepositoryId) -> T {
    result.unwrap_or_else(|e| {
        warn!("Failed to fetch {} for {}: {}", what, id, e);
        T::default()
    })
}

/// Flattened metrics for one framework as served by `/api/github`.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkMetrics {
    pub name: String,
    pub repository: String,
    pub github_stars: u64,
    pub github_forks: u64,
    pub github_issues: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_pushed: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub recent_releases: usize,
    pub recent_commits: u64,
    pub weekly_commits: Vec<u64>,
    pub contributors: u64,
    pub languages: BTreeMap<String, u64>,
    pub primary_language: String,
    pub repo_url: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub archived: bool,
    pub size_kb: u64,
    pub subscribers: u64,
    pub network_count: u64,
    pub license: Option<String>,
    pub default_branch: Option<String>,
}

impl FrameworkMetrics {
    pub fn from_metrics(name: &str, metrics: RepositoryMetrics, now: DateTime<Utc>) -> Self {
        let recent_releases = metrics.recent_releases(now);
        let recent_commits = metrics.recent_commits();
        let weekly_commits = metrics.weekly_commits();
        let primary_language = metrics.primary_language();
        let RepositoryMetrics {
            id,
            repo,
            languages,
            contributors,
            ..
        } = metrics;
        Self {
            name: name.to_string(),
            repository: id.to_string(),
            github_stars: repo.stargazers_count,
            github_forks: repo.forks_count,
            github_issues: repo.open_issues_count,
            last_updated: repo.updated_at,
            last_pushed: repo.pushed_at,
            created_at: repo.created_at,
            recent_releases,
            recent_commits,
            weekly_commits,
            contributors,
            languages,
            primary_language,
            repo_url: repo.html_url,
            description: repo.description,
            topics: repo.topics,
            archived: repo.archived,
            size_kb: repo.size,
            subscribers: repo.subscribers_count,
            network_count: repo.network_count,
            license: repo.license.map(|l| l.name),
            default_branch: repo.default_branch,
        }
    }
}

/// Stand-in row for a framework that could not be resolved or fetched.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkFailure {
    pub name: String,
    pub error: String,
    pub github_stars: u64,
    pub github_forks: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub recent_releases: usize,
    pub languages: BTreeMap<String, u64>,
    pub repo_url: Option<String>,
}

impl FrameworkFailure {
    pub fn new(name: &str, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            error: error.into(),
            github_stars: 0,
            github_forks: 0,
            last_updated: None,
            recent_releases: 0,
            languages: BTreeMap::new(),
            repo_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FrameworkResult {
    Found(Box<FrameworkMetrics>),
    Failed(FrameworkFailure),
}

impl FrameworkResult {
    pub fn name(&self) -> &str {
        match self {
            FrameworkResult::Found(m) => &m.name,
            FrameworkResult::Failed(f) => &f.name,
        }
    }

    pub fn metrics(&self) -> Option<&FrameworkMetrics> {
        match self {
            FrameworkResult::Found(m) => Some(m),
            FrameworkResult::Failed(_) => None,
        }
    }
}

/// Resolve and fetch every name, one result per input in input order.
pub async fn collect_framework_metrics(
    resolver: &Resolver,
    github: &GitHubClient,
    names: &[String],
) -> Vec<FrameworkResult> {
    // Each future owns its name so the batch stays `Send` inside axum handlers.
    stream::iter(names.iter().cloned())
        .map(|name| async move { framework_result(resolver, github, &name).await })
        .buffered(constants::METRICS_BATCH_CONCURRENCY)
        .collect()
        .await
}

async fn framework_result(
    resolver: &Resolver,
    github: &GitHubClient,
    name: &str,
) -> FrameworkResult {
    info!("Fetching GitHub data for: {}", name);
    let Some(id) = resolver.resolve(name).await else {
        warn!("Could not find GitHub repository for: {}", name);
        return FrameworkResult::Failed(FrameworkFailure::new(name, "Repository not found"));
    };

    match fetch_metrics(github, &id).await {
        Ok(metrics) => {
            info!(
                "Successfully fetched data for {}: {} stars",
                name, metrics.repo.stargazers_count
            );
            FrameworkResult::Found(Box::new(FrameworkMetrics::from_metrics(
                name,
                metrics,
                Utc::now(),
            )))
        }
        Err(e) => {
            error!("Error fetching data for {}: {}", name, e);
            FrameworkResult::Failed(FrameworkFailure::new(name, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> RepositoryMetrics {
        let repo: GitHubRepo = serde_json::from_value(serde_json::json!({
            "name": "crewAI",
            "full_name": "crewAIInc/crewAI",
            "stargazers_count": 18500,
            "html_url": "https://github.com/crewAIInc/crewAI"
        }))
        .unwrap();
        RepositoryMetrics {
            id: RepositoryId::new("crewAIInc", "crewAI"),
            repo,
            commit_activity: (1..=6)
                .map(|n| CommitActivityWeek {
                    week: n,
                    days: vec![],
                    total: n as u64 * 10,
                })
                .collect(),
            releases: vec![],
            languages: BTreeMap::new(),
            contributors: 0,
        }
    }

    fn release(tag: &str, published_at: Option<DateTime<Utc>>) -> Release {
        Release {
            tag_name: tag.to_string(),
            name: None,
            published_at,
            prerelease: false,
            draft: published_at.is_none(),
        }
    }

    #[test]
    fn test_recent_commits_sums_last_four_weeks() {
        let metrics = sample_metrics();
        assert_eq!(metrics.recent_commits(), 30 + 40 + 50 + 60);

        let mut short = sample_metrics();
        short.commit_activity.truncate(2);
        assert_eq!(short.recent_commits(), 30);

        let mut empty = sample_metrics();
        empty.commit_activity.clear();
        assert_eq!(empty.recent_commits(), 0);
    }

    #[test]
    fn test_recent_releases_window() {
        let now = Utc::now();
        let mut metrics = sample_metrics();
        metrics.releases = vec![
            release("v3", Some(now - Duration::days(2))),
            release("v2", Some(now - Duration::days(29))),
            release("v1", Some(now - Duration::days(45))),
            release("draft", None),
        ];
        assert_eq!(metrics.recent_releases(now), 2);
    }

    #[test]
    fn test_primary_language() {
        let mut metrics = sample_metrics();
        assert_eq!(metrics.primary_language(), "Unknown");

        metrics.languages.insert("Python".to_string(), 900);
        metrics.languages.insert("TypeScript".to_string(), 1200);
        metrics.languages.insert("Shell".to_string(), 15);
        assert_eq!(metrics.primary_language(), "TypeScript");

        metrics.languages.insert("Go".to_string(), 1200);
        assert_eq!(metrics.primary_language(), "Go");
    }

    #[test]
    fn test_failure_placeholder_shape() {
        let value = serde_json::to_value(FrameworkResult::Failed(FrameworkFailure::new(
            "Mystery",
            "Repository not found",
        )))
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Mystery",
                "error": "Repository not found",
                "github_stars": 0,
                "github_forks": 0,
                "last_updated": null,
                "recent_releases": 0,
                "languages": {},
                "repo_url": null
            })
        );
    }
}
