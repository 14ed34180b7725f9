pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod github;
pub mod known_repos;
pub mod llm;
pub mod metrics;
pub mod resolver;
pub mod web_server;

pub use config::DashboardConfig;
pub use extractor::{ExtractedRecord, Extraction, NarrativeExtractor};
pub use github::{GitHubClient, RepositoryId};
pub use metrics::FrameworkResult;
pub use resolver::Resolver;
