use std::path::PathBuf;

use crate::constants;

/// Runtime settings shared by the server and the CLI.
///
/// Built once at start-up from the environment (see [`constants`]) and handed
/// to the components that need it. Tests construct it directly.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: constants::OPENAI_API_KEY.clone(),
            openai_api_url: constants::OPENAI_API_URL.clone(),
            openai_model: constants::OPENAI_MODEL.clone(),
            github_token: constants::GITHUB_TOKEN.clone(),
            github_api_url: constants::GITHUB_API_URL.clone(),
            templates_dir: PathBuf::from(&*constants::TEMPLATES_DIR),
            static_dir: PathBuf::from(&*constants::STATIC_DIR),
        }
    }

    /// Point both upstreams at a single base URL. Used by tests against a mock server.
    pub fn with_upstream(base_url: &str) -> Self {
        Self {
            openai_api_key: None,
            openai_api_url: base_url.to_string(),
            openai_model: "test-model".to_string(),
            github_token: None,
            github_api_url: base_url.to_string(),
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
        }
    }
}
