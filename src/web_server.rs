//! HTTP surface of the dashboard.
//!
//! | Method | Path           | Description                                   |
//! |--------|----------------|-----------------------------------------------|
//! | `GET`  | `/`            | Dashboard page                                |
//! | `POST` | `/api/chat`    | Stream an analysis from the language model    |
//! | `POST` | `/api/github`  | Live GitHub metrics for a list of frameworks  |
//! | `GET`  | `/api/github`  | Known-repository table info                   |
//! | `POST` | `/api/analyze` | Records, summary and charts from a narrative  |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use chrono::Utc;
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::aggregate::{self, ChartPoint, MergedProject, Summary};
use crate::config::DashboardConfig;
use crate::constants;
use crate::error::ChatError;
use crate::extractor::{ExtractedRecord, NarrativeExtractor};
use crate::github::GitHubClient;
use crate::known_repos::KnownNameTable;
use crate::llm::{self, ChatClient, ChatMessage};
use crate::metrics::{self, FrameworkResult};
use crate::resolver::Resolver;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    config: Arc<DashboardConfig>,
    resolver: Resolver,
    github: GitHubClient,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let github = GitHubClient::new(config.github_api_url.clone(), config.github_token.clone());
        let resolver = Resolver::new(Arc::new(KnownNameTable::builtin()), github.clone());
        Self {
            templates: Arc::new(create_minijinja_env(config.templates_dir.clone())),
            config: Arc::new(config),
            resolver,
            github,
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    // Use AutoReloader for development convenience
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "AI Agent Metrics Dashboard",
                    default_prompt => constants::DEFAULT_PROMPT,
                    default_frameworks => constants::DEFAULT_FRAMEWORKS,
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Parse a JSON body, answering 400 with `message` when it does not fit `T`.
fn parse_body<T: DeserializeOwned>(body: &Bytes, message: &str) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        info!("Rejected request body: {}", e);
        json_error(StatusCode::BAD_REQUEST, message)
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    // Configuration is checked before the body so a missing key is always reported.
    let client = match ChatClient::from_config(&state.config) {
        Ok(client) => client,
        Err(e) => {
            error!("OPENAI_API_KEY is not set");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let request: ChatRequest = match parse_body(&body, "Invalid messages format") {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("Processing chat request with {} messages", request.messages.len());

    match client.stream_chat(request.messages).await {
        Ok(rx) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(llm::into_stream(rx)),
        )
            .into_response(),
        Err(e) => chat_failure(e),
    }
}

fn chat_failure(e: ChatError) -> Response {
    error!("Error in chat API: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Error processing request",
            "details": e.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct MetricsRequest {
    frameworks: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct MetricsResponse {
    success: bool,
    data: Vec<FrameworkResult>,
    timestamp: String,
    total_frameworks: usize,
}

/// Non-string entries keep their slot (as their JSON text) so the reply stays aligned with the request.
fn framework_names(values: Vec<serde_json::Value>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(name) => name,
            other => other.to_string(),
        })
        .collect()
}

async fn github_metrics_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: MetricsRequest =
        match parse_body(&body, "Invalid request: frameworks array required") {
            Ok(request) => request,
            Err(response) => return response,
        };
    let names = framework_names(request.frameworks);

    let data = metrics::collect_framework_metrics(&state.resolver, &state.github, &names).await;
    Json(MetricsResponse {
        success: true,
        data,
        timestamp: Utc::now().to_rfc3339(),
        total_frameworks: names.len(),
    })
    .into_response()
}

async fn github_info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let table = state.resolver.table();
    Json(json!({
        "message": "GitHub data API endpoint",
        "known_repositories": table.len(),
        "usage": "POST /api/github with { frameworks: [\"framework1\", \"framework2\"] }",
        "example_frameworks": table.names().take(10).collect::<Vec<_>>(),
        "authenticated": state.github.is_authenticated(),
    }))
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
    /// Names to fetch alongside those found in the text; defaults to the prompt's list.
    #[serde(default)]
    frameworks: Option<Vec<String>>,
    /// Also fetch live GitHub metrics and merge them in.
    #[serde(default)]
    fetch_metrics: bool,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    main: Vec<ExtractedRecord>,
    emerging: Vec<ExtractedRecord>,
    summary: Summary,
    chart: Vec<ChartPoint>,
    names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merged: Option<Vec<MergedProject>>,
}

async fn analyze_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: AnalyzeRequest = match parse_body(&body, "Invalid request: text required") {
        Ok(request) => request,
        Err(response) => return response,
    };

    let extraction = NarrativeExtractor::from_entropy().extract(&request.text);
    let records: Vec<ExtractedRecord> = extraction.all().cloned().collect();
    let discovered = extraction.names();
    let known: Vec<String> = request.frameworks.unwrap_or_else(|| {
        constants::DEFAULT_FRAMEWORKS
            .iter()
            .map(|s| s.to_string())
            .collect()
    });
    let names = aggregate::project_names(
        known.iter().map(String::as_str),
        discovered.iter().map(String::as_str),
    );

    let merged = if request.fetch_metrics {
        let live = metrics::collect_framework_metrics(&state.resolver, &state.github, &names).await;
        Some(aggregate::merge(&records, &live))
    } else {
        None
    };

    Json(AnalyzeResponse {
        summary: aggregate::summarize(&records),
        chart: aggregate::chart_series(&records),
        main: extraction.main,
        emerging: extraction.emerging,
        names,
        merged,
    })
    .into_response()
}

/// Build the router; split out so tests can drive it without binding a port.
pub fn build_router(state: AppState) -> Router {
    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(&state.config.static_dir).not_found_service(
        tower::service_fn(|_: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }),
    );

    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/github",
            get(github_info_handler).post(github_metrics_handler),
        )
        .route("/api/analyze", post(analyze_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, config: DashboardConfig) -> Result<()> {
    if config.openai_api_key.is_none() {
        info!("OPENAI_API_KEY is not set; /api/chat will answer with a configuration error");
    }
    let app = build_router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
