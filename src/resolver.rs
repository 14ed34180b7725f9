//! Maps human-readable framework names to GitHub repositories.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::github::{GitHubClient, GitHubRepo, RepositoryId, SearchSort};
use crate::known_repos::KnownNameTable;

const LEADING_ROLE_WORDS: &[&str] = &["microsoft", "openai", "claude", "local"];
const TRAILING_ROLE_WORDS: &[&str] = &["sdk", "servers", "toolkit", "agents"];
const SEARCH_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct Resolver {
    table: Arc<KnownNameTable>,
    github: GitHubClient,
}

impl Resolver {
    pub fn new(table: Arc<KnownNameTable>, github: GitHubClient) -> Self {
        Self { table, github }
    }

    pub fn table(&self) -> &KnownNameTable {
        &self.table
    }

    /// Resolve `name`, falling back to a GitHub search when the table has nothing.
    ///
    /// A failed search is logged and reported as not found.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Option<RepositoryId> {
        if name.trim().is_empty() {
            return None;
        }
        if let Some(id) = self.resolve_local(name) {
            return Some(id);
        }

        info!("Searching GitHub for \"{}\"", name);
        let results = match self
            .github
            .search_repositories(name, SearchSort::Stars, SEARCH_LIMIT)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!("Failed to search for {}: {}", name, e);
                return None;
            }
        };

        let found = results
            .iter()
            .find(|repo| search_candidate_matches(repo, name))
            .and_then(|repo| RepositoryId::from_full_name(&repo.full_name));
        match &found {
            Some(id) => info!("Found search result for \"{}\": {}", name, id),
            None => info!("No GitHub repo found for \"{}\"", name),
        }
        found
    }

    /// Table-only resolution: exact variants first, then substring matches.
    pub fn resolve_local(&self, name: &str) -> Option<RepositoryId> {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        let variants = name_variants(&lower);
        debug!(?variants, "Trying name variants");
        if let Some(id) = variants.iter().find_map(|v| self.table.get(v)) {
            debug!("Found exact match for \"{}\": {}", name, id);
            return Some(id.clone());
        }

        let compact = strip_whitespace(&lower);
        let partial = self.table.iter().find(|(key, _)| {
            let key_compact: String = key
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect();
            key.contains(lower.as_str())
                || lower.contains(key)
                || (!key_compact.is_empty() && key_compact.contains(compact.as_str()))
                || (!key_compact.is_empty() && compact.contains(key_compact.as_str()))
        });
        if let Some((key, id)) = partial {
            debug!("Found partial match for \"{}\" via \"{}\": {}", name, key, id);
            return Some(id.clone());
        }
        None
    }
}

/// Lower-case spellings of a name worth trying against the table, in priority order.
pub fn name_variants(name: &str) -> Vec<String> {
    let lower = name.trim().to_lowercase();
    let dashed_symbols: String = lower
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let dashed_spaces = lower.split_whitespace().collect::<Vec<_>>().join("-");

    let mut variants = vec![
        lower.clone(),
        dashed_symbols,
        strip_whitespace(&lower),
        dashed_spaces,
        strip_leading_role_word(&lower).to_string(),
        strip_trailing_role_word(&lower).to_string(),
    ];
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
    variants
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_leading_role_word(lower: &str) -> &str {
    for word in LEADING_ROLE_WORDS {
        if let Some(rest) = lower.strip_prefix(word) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    lower
}

fn strip_trailing_role_word(lower: &str) -> &str {
    for word in TRAILING_ROLE_WORDS {
        if let Some(rest) = lower.strip_suffix(word) {
            if rest.ends_with(char::is_whitespace) {
                return rest.trim_end();
            }
        }
    }
    lower
}

fn search_candidate_matches(repo: &GitHubRepo, name: &str) -> bool {
    let needle = name.to_lowercase();
    repo.name.to_lowercase().contains(&needle)
        || repo
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
        || repo
            .topics
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_resolver() -> Resolver {
        // Nothing listens on port 9; local resolution never touches the network.
        Resolver::new(
            Arc::new(KnownNameTable::builtin()),
            GitHubClient::new("http://127.0.0.1:9", None),
        )
    }

    #[test]
    fn test_name_variants() {
        let variants = name_variants("Microsoft Semantic Kernel");
        assert_eq!(variants[0], "microsoft semantic kernel");
        assert!(variants.contains(&"microsoft-semantic-kernel".to_string()));
        assert!(variants.contains(&"microsoftsemantickernel".to_string()));
        assert!(variants.contains(&"semantic kernel".to_string()));

        let variants = name_variants("Claude MCP Servers");
        assert!(variants.contains(&"mcp servers".to_string()));
        assert!(variants.contains(&"claude mcp".to_string()));

        let variants = name_variants("Vercel.AI");
        assert!(variants.contains(&"vercel-ai".to_string()));
    }

    #[test]
    fn test_role_words_need_a_word_boundary() {
        assert_eq!(strip_leading_role_word("localai"), "localai");
        assert_eq!(strip_leading_role_word("local ai"), "ai");
        assert_eq!(strip_trailing_role_word("mcpsdk"), "mcpsdk");
        assert_eq!(strip_trailing_role_word("python sdk"), "python");
    }

    #[test]
    fn test_resolve_local_exact_and_symbol_variants() {
        let resolver = local_resolver();
        assert_eq!(
            resolver.resolve_local("Vercel.AI"),
            Some(RepositoryId::new("vercel", "ai"))
        );
        assert_eq!(
            resolver.resolve_local("Semantic Kernel"),
            Some(RepositoryId::new("microsoft", "semantic-kernel"))
        );
        assert_eq!(
            resolver.resolve_local("Llama Index"),
            Some(RepositoryId::new("run-llama", "llama_index"))
        );
    }

    #[test]
    fn test_resolve_local_partial_match() {
        let resolver = local_resolver();
        assert_eq!(
            resolver.resolve_local("CrewAI Framework"),
            Some(RepositoryId::new("crewAIInc", "crewAI"))
        );
    }

    #[test]
    fn test_resolve_local_blank_is_none() {
        let resolver = local_resolver();
        assert!(resolver.resolve_local("").is_none());
        assert!(resolver.resolve_local("   ").is_none());
    }

    #[test]
    fn test_search_candidate_matching() {
        let repo: GitHubRepo = serde_json::from_value(serde_json::json!({
            "name": "pydantic-ai",
            "full_name": "pydantic/pydantic-ai",
            "description": "Agent Framework / shim to use Pydantic with LLMs",
            "topics": ["agents", "llm"]
        }))
        .unwrap();
        assert!(search_candidate_matches(&repo, "Pydantic-AI"));
        assert!(search_candidate_matches(&repo, "agent framework"));
        assert!(search_candidate_matches(&repo, "LLM"));
        assert!(!search_candidate_matches(&repo, "haystack"));
    }
}
