//! Static table of well-known framework names and the repositories they live in.

use std::collections::HashMap;

use crate::github::RepositoryId;

const BUILTIN: &[(&str, &str, &str)] = &[
    // Main AI frameworks
    ("langgraph", "langchain-ai", "langgraph"),
    ("LangGraph", "langchain-ai", "langgraph"),
    ("langchain", "langchain-ai", "langchain"),
    ("autogpt", "Significant-Gravitas", "AutoGPT"),
    ("AutoGPT", "Significant-Gravitas", "AutoGPT"),
    ("crewai", "crewAIInc", "crewAI"),
    ("CrewAI", "crewAIInc", "crewAI"),
    ("semantic-kernel", "microsoft", "semantic-kernel"),
    ("microsoft semantic kernel", "microsoft", "semantic-kernel"),
    ("Microsoft Semantic Kernel", "microsoft", "semantic-kernel"),
    ("llamaindex", "run-llama", "llama_index"),
    ("LlamaIndex", "run-llama", "llama_index"),
    ("agentgpt", "reworkd", "AgentGPT"),
    ("AgentGPT", "reworkd", "AgentGPT"),
    ("vercel-ai", "vercel", "ai"),
    ("vercel ai sdk", "vercel", "ai"),
    ("Vercel AI SDK", "vercel", "ai"),
    // MCP servers and tools
    ("fastmcp", "jlowin", "fastmcp"),
    ("FastMCP", "jlowin", "fastmcp"),
    ("mcp server sdk", "modelcontextprotocol", "python-sdk"),
    ("MCP Server SDK", "modelcontextprotocol", "python-sdk"),
    ("claude mcp servers", "modelcontextprotocol", "servers"),
    ("Claude MCP Servers", "modelcontextprotocol", "servers"),
    ("openai mcp toolkit", "openai", "openai-python"),
    ("OpenAI MCP Toolkit", "openai", "openai-python"),
    ("local mcp servers", "modelcontextprotocol", "servers"),
    ("Local MCP Servers", "modelcontextprotocol", "servers"),
    // Emerging frameworks
    ("langfuse", "langfuse", "langfuse"),
    ("Langfuse", "langfuse", "langfuse"),
    ("phidata", "phidatahq", "phidata"),
    ("Phidata", "phidatahq", "phidata"),
    ("composio", "ComposioHQ", "composio"),
    ("Composio", "ComposioHQ", "composio"),
    ("swarm", "openai", "swarm"),
    ("Swarm", "openai", "swarm"),
    ("autogen", "microsoft", "autogen"),
    ("Autogen", "microsoft", "autogen"),
    ("controlflow", "PrefectHQ", "ControlFlow"),
    ("ControlFlow", "PrefectHQ", "ControlFlow"),
    ("taskweaver", "microsoft", "TaskWeaver"),
    ("TaskWeaver", "microsoft", "TaskWeaver"),
    ("haystack", "deepset-ai", "haystack"),
    ("Haystack", "deepset-ai", "haystack"),
    ("metagpt", "geekan", "MetaGPT"),
    ("MetaGPT", "geekan", "MetaGPT"),
    // Cloudflare alternatives
    ("cloudflare agents", "cloudflare", "agents"),
    ("Cloudflare Agents", "cloudflare", "workers-ai"),
];

/// Read-only lookup from name variants to repositories.
///
/// Keys are folded to lower case. When two entries fold to the same key the
/// later entry's repository wins but the key keeps the position of its first
/// appearance, which is the order partial matching walks.
#[derive(Debug, Clone)]
pub struct KnownNameTable {
    entries: Vec<(String, RepositoryId)>,
    index: HashMap<String, usize>,
    raw_names: Vec<String>,
}

impl KnownNameTable {
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN
                .iter()
                .map(|(name, owner, repo)| (name.to_string(), RepositoryId::new(*owner, *repo))),
        )
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, RepositoryId)>,
    {
        let mut table = Self {
            entries: Vec::new(),
            index: HashMap::new(),
            raw_names: Vec::new(),
        };
        for (name, id) in entries {
            let key = name.to_lowercase();
            table.raw_names.push(name);
            match table.index.get(&key) {
                Some(&slot) => table.entries[slot].1 = id,
                None => {
                    table.index.insert(key.clone(), table.entries.len());
                    table.entries.push((key, id));
                }
            }
        }
        table
    }

    /// Exact lookup, ignoring case.
    pub fn get(&self, name: &str) -> Option<&RepositoryId> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.entries[slot].1)
    }

    /// Lower-cased keys with their repositories, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryId)> {
        self.entries.iter().map(|(key, id)| (key.as_str(), id))
    }

    /// Names exactly as they were registered, including case variants.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.raw_names.iter().map(String::as_str)
    }

    /// Number of registered names, counting case variants separately.
    pub fn len(&self) -> usize {
        self.raw_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_names.is_empty()
    }
}

impl Default for KnownNameTable {
    fn default() -> Self {
        Self::builtin()
    }
}
