// Constants loaded from the environment with sensible defaults.

use std::env;

lazy_static::lazy_static! {
    pub static ref OPENAI_API_URL: String = env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
    pub static ref OPENAI_MODEL: String = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4-turbo".to_string());
    pub static ref OPENAI_API_KEY: Option<String> = non_empty_var("OPENAI_API_KEY");
    pub static ref GITHUB_API_URL: String = env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string());
    pub static ref GITHUB_TOKEN: Option<String> = non_empty_var("GITHUB_TOKEN");
    pub static ref TEMPLATES_DIR: String = env::var("DASHBOARD_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("DASHBOARD_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}

pub const USER_AGENT: &str = "AI-Agent-Metrics-Dashboard";

/// How long successful GitHub responses are reused within one process.
pub const GITHUB_CACHE_TTL_SECS: u64 = 300;

/// Names resolved and fetched at the same time by the batch endpoint.
pub const METRICS_BATCH_CONCURRENCY: usize = 4;

/// Projects with more commits than this over the last month count as active.
pub const ACTIVE_COMMIT_THRESHOLD: u64 = 500;

pub const SYSTEM_PROMPT: &str = r#"You are an AI expert specializing in analyzing AI Agent frameworks and Model Context Protocol (MCP) servers.

CRITICAL REQUIREMENTS:
1. MUST analyze ALL frameworks mentioned in the user's request - do not skip any
2. MUST provide COMPLETE analysis in a single response
3. NEVER indicate analysis is "in progress", "pending", or "will be completed later"
4. If a framework list contains numbered items, analyze EVERY number in sequence

Format requirements:
- Use section headers: ## MAIN FRAMEWORKS ANALYSIS and ## EMERGING FRAMEWORKS DISCOVERED
- For each framework use this EXACT format:

**Framework Name:** [Name]
**Category:** [AI Framework or MCP Server]
**Description:** [Brief description]
**GitHub Stars:** [Number] (estimate if needed)
**Recent Growth:** [Percentage] over the past 6 months (estimate if needed)
**Community Sentiment:** [Positive/Very Positive/Neutral]
**Recent Activity:** [Number] commits in the last month
**Key Strengths:** [Brief list]
**Use Cases:** [Primary applications]

Provide reasonable estimates for all metrics. Focus on being comprehensive and complete."#;

pub const DEFAULT_PROMPT: &str = r#"Analyze the current landscape of AI Agent frameworks and Model Context Protocol (MCP) servers. Provide detailed metrics and insights on the following frameworks:

**AI Agent Frameworks:**
- LangChain
- AutoGPT
- CrewAI
- Microsoft Semantic Kernel
- Haystack
- LlamaIndex
- AgentGPT
- MetaGPT

**MCP Server Implementations:**
- FastMCP
- MCP Server SDK
- Claude MCP Servers
- OpenAI MCP Toolkit
- Local MCP Servers

For each framework/tool, provide:
1. GitHub stars and recent growth trends
2. Community sentiment and adoption metrics
3. Recent activity indicators (commits, releases, issues)
4. Popularity ranking within its category
5. Key strengths and use cases

Format the response as structured data that can be easily parsed for dashboard visualization."#;

/// Frameworks listed in [`DEFAULT_PROMPT`], fetched alongside any the narrative discovers.
pub const DEFAULT_FRAMEWORKS: &[&str] = &[
    "LangChain",
    "AutoGPT",
    "CrewAI",
    "Microsoft Semantic Kernel",
    "Haystack",
    "LlamaIndex",
    "AgentGPT",
    "MetaGPT",
    "FastMCP",
    "MCP Server SDK",
    "Claude MCP Servers",
    "OpenAI MCP Toolkit",
    "Local MCP Servers",
];

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
