use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_metrics::known_repos::KnownNameTable;
use agent_metrics::llm::{self, ChatClient, ChatMessage};
use agent_metrics::{aggregate, constants, metrics, web_server};
use agent_metrics::{DashboardConfig, GitHubClient, NarrativeExtractor, Resolver};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the dashboard web server.
    #[command(alias = "serve")]
    Start {
        #[arg(long, env = "DASHBOARD_PORT", default_value_t = 3000, help = "Port for the web server.")]
        port: u16,
    },
    /// Resolve framework names to GitHub repositories.
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long, help = "Only consult the built-in name table.")]
        offline: bool,
        #[arg(long, help = "Fetch live repository metrics for each name.", conflicts_with = "offline")]
        metrics: bool,
    },
    /// Extract framework records from a narrative file ("-" reads stdin).
    Extract {
        path: PathBuf,
        #[arg(long, help = "Seed for placeholder values.")]
        seed: Option<u64>,
    },
    /// Run an analysis through the language model and print the extracted results.
    Analyze {
        #[arg(long, help = "Prompt to send instead of the default framework list.")]
        prompt: Option<String>,
        #[arg(long, help = "Merge live GitHub metrics into the results.")]
        fetch_metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for API keys and upstream URLs)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,agent_metrics=debug).
    // Logs go to stderr so command output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    info!("agent-metrics starting with command: {:?}", cli.command);

    let config = DashboardConfig::from_env();
    match cli.command {
        Commands::Start { port } => {
            info!("Starting dashboard on port {}...", port);
            let mut web_server_handle =
                tokio::spawn(async move { web_server::start_web_server(port, config).await });

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down.");
                    web_server_handle.abort();
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(Ok(())) => info!("Web server task finished."),
                        Ok(Err(e)) => {
                            error!("Web server failed: {:?}", e);
                            return Err(e);
                        }
                        Err(e) => error!("Web server task panicked: {:?}", e),
                    }
                }
            }
        }
        Commands::Resolve {
            names,
            offline,
            metrics,
        } => resolve_command(&config, &names, offline, metrics).await?,
        Commands::Extract { path, seed } => extract_command(&path, seed)?,
        Commands::Analyze {
            prompt,
            fetch_metrics,
        } => analyze_command(&config, prompt, fetch_metrics).await?,
    }

    Ok(())
}

fn resolver_for(config: &DashboardConfig) -> (Resolver, GitHubClient) {
    let github = GitHubClient::new(config.github_api_url.clone(), config.github_token.clone());
    let resolver = Resolver::new(Arc::new(KnownNameTable::builtin()), github.clone());
    (resolver, github)
}

async fn resolve_command(
    config: &DashboardConfig,
    names: &[String],
    offline: bool,
    with_metrics: bool,
) -> Result<()> {
    let (resolver, github) = resolver_for(config);

    if with_metrics {
        let results = metrics::collect_framework_metrics(&resolver, &github, names).await;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for name in names {
        let resolved = if offline {
            resolver.resolve_local(name)
        } else {
            resolver.resolve(name).await
        };
        match resolved {
            Some(id) => println!("{}\t{}", name, id),
            None => println!("{}\tnot found", name),
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read narrative from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read narrative from {}", path.display()))
    }
}

fn extract_command(path: &Path, seed: Option<u64>) -> Result<()> {
    let text = read_input(path)?;
    let extraction = match seed {
        Some(seed) => NarrativeExtractor::seeded(seed).extract(&text),
        None => NarrativeExtractor::from_entropy().extract(&text),
    };
    let records: Vec<_> = extraction.all().cloned().collect();

    let output = json!({
        "main": extraction.main,
        "emerging": extraction.emerging,
        "summary": aggregate::summarize(&records),
        "chart": aggregate::chart_series(&records),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn analyze_command(
    config: &DashboardConfig,
    prompt: Option<String>,
    fetch_metrics: bool,
) -> Result<()> {
    let client = ChatClient::from_config(config)?;
    let prompt = prompt.unwrap_or_else(|| constants::DEFAULT_PROMPT.to_string());

    let rx = client
        .stream_chat(vec![ChatMessage::user(prompt)])
        .await
        .context("Failed to start analysis")?;
    // Echo the narrative to stderr as it arrives; the JSON result goes to stdout.
    let narrative = llm::collect_stream(rx, |chunk| {
        eprint!("{}", chunk);
        let _ = io::stderr().flush();
    })
    .await
    .context("Analysis stream failed")?;
    eprintln!();

    let extraction = NarrativeExtractor::from_entropy().extract(&narrative);
    let records: Vec<_> = extraction.all().cloned().collect();
    let discovered = extraction.names();
    let names = aggregate::project_names(
        constants::DEFAULT_FRAMEWORKS.iter().copied(),
        discovered.iter().map(String::as_str),
    );

    let merged = if fetch_metrics {
        let (resolver, github) = resolver_for(config);
        let live = metrics::collect_framework_metrics(&resolver, &github, &names).await;
        Some(aggregate::merge(&records, &live))
    } else {
        None
    };

    let output = json!({
        "summary": aggregate::summarize(&records),
        "chart": aggregate::chart_series(&records),
        "names": names,
        "main": extraction.main,
        "emerging": extraction.emerging,
        "merged": merged,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
