//! Summary numbers and chart series for the dashboard.

use std::collections::HashSet;

use serde::Serialize;

use crate::constants;
use crate::extractor::{ExtractedRecord, ValueSource};
use crate::metrics::FrameworkResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_projects: usize,
    pub average_stars: u64,
    pub average_growth: f64,
    pub active_projects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    /// Stars in thousands.
    pub stars: f64,
    pub popularity: u32,
}

/// Where a displayed number in a [`MergedProject`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    Github,
    Narrative,
    Placeholder,
}

impl From<ValueSource> for MetricSource {
    fn from(source: ValueSource) -> Self {
        match source {
            ValueSource::Parsed => MetricSource::Narrative,
            ValueSource::Placeholder => MetricSource::Placeholder,
        }
    }
}

/// An extracted record next to the live numbers for the same project, if any.
///
/// Live and estimated star counts stay in separate fields. Every displayed
/// number has a `*_source` field saying where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct MergedProject {
    pub name: String,
    pub category: String,
    pub estimated_stars: u64,
    pub github_stars: Option<u64>,
    pub stars: u64,
    pub stars_source: MetricSource,
    pub growth: String,
    pub growth_source: MetricSource,
    pub sentiment: String,
    pub recent_commits: u64,
    pub recent_commits_source: MetricSource,
    pub repo_url: Option<String>,
}

pub fn summarize(records: &[ExtractedRecord]) -> Summary {
    if records.is_empty() {
        return Summary {
            total_projects: 0,
            average_stars: 0,
            average_growth: 0.0,
            active_projects: 0,
        };
    }

    let total_stars = records
        .iter()
        .fold(0u64, |total, r| total.saturating_add(r.stars.value));
    let growths: Vec<f64> = records.iter().filter_map(|r| r.growth_percent()).collect();
    let average_growth = if growths.is_empty() {
        0.0
    } else {
        let mean = growths.iter().sum::<f64>() / growths.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    Summary {
        total_projects: records.len(),
        average_stars: total_stars / records.len() as u64,
        average_growth,
        active_projects: records
            .iter()
            .filter(|r| r.recent_commits.value > constants::ACTIVE_COMMIT_THRESHOLD)
            .count(),
    }
}

pub fn chart_series(records: &[ExtractedRecord]) -> Vec<ChartPoint> {
    records
        .iter()
        .map(|r| ChartPoint {
            name: r.name.clone(),
            stars: r.stars.value as f64 / 1000.0,
            popularity: r.popularity,
        })
        .collect()
}

/// Pair each record with the live result of the same name, ignoring case.
pub fn merge(records: &[ExtractedRecord], live: &[FrameworkResult]) -> Vec<MergedProject> {
    records
        .iter()
        .map(|record| {
            let metrics = live
                .iter()
                .find(|r| r.name().eq_ignore_ascii_case(&record.name))
                .and_then(FrameworkResult::metrics);
            let (stars, stars_source) = match metrics {
                Some(m) => (m.github_stars, MetricSource::Github),
                None => (record.stars.value, record.stars.source.into()),
            };
            // GitHub has no growth figure, so growth always comes from the narrative.
            let (recent_commits, recent_commits_source) = match metrics {
                Some(m) => (m.recent_commits, MetricSource::Github),
                None => (
                    record.recent_commits.value,
                    record.recent_commits.source.into(),
                ),
            };
            MergedProject {
                name: record.name.clone(),
                category: record.category.clone(),
                estimated_stars: record.stars.value,
                github_stars: metrics.map(|m| m.github_stars),
                stars,
                stars_source,
                growth: record.growth.value.clone(),
                growth_source: record.growth.source.into(),
                sentiment: record.sentiment.to_string(),
                recent_commits,
                recent_commits_source,
                repo_url: metrics.map(|m| m.repo_url.clone()),
            }
        })
        .collect()
}

/// Known names followed by names found in the narrative, without case-insensitive duplicates.
pub fn project_names<'a, K, N>(known: K, discovered: N) -> Vec<String>
where
    K: IntoIterator<Item = &'a str>,
    N: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    known
        .into_iter()
        .chain(discovered)
        .map(str::trim)
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}
