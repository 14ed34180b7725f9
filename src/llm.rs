//! Streaming chat completions against an OpenAI-compatible API.

use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::DashboardConfig;
use crate::constants;
use crate::error::ChatError;

const CHANNEL_CAPACITY: usize = 64;
/// Longest partial SSE line kept while waiting for its newline.
const MAX_PENDING_LINE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// Structures matching the chat completions endpoint
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Text chunks of one completion, in order. Closed when the completion ends.
pub type ChatStream = mpsc::Receiver<Result<String, ChatError>>;

#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Fails with [`ChatError::MissingApiKey`] when no key is configured.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, ChatError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(ChatError::MissingApiKey)?;
        Ok(Self::new(
            config.openai_api_url.clone(),
            api_key,
            config.openai_model.clone(),
        ))
    }

    /// Start a completion with the analysis system prompt in front of `messages`.
    ///
    /// Errors before the first byte (transport, non-2xx) are returned directly;
    /// later errors arrive on the stream. Dropping the receiver stops the
    /// producer and releases the upstream connection.
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<ChatStream, ChatError> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage::system(constants::SYSTEM_PROMPT));
        all.extend(messages);

        let url = format!("{}/v1/chat/completions", self.api_url);
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: all,
            stream: true,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Chat completion request failed");
            return Err(ChatError::Upstream { status, body });
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward_stream(Box::pin(response.bytes_stream()), tx));
        Ok(rx)
    }
}

async fn forward_stream<S, B>(mut upstream: S, tx: mpsc::Sender<Result<String, ChatError>>)
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut buffer = SseBuffer::default();

    loop {
        let chunk = tokio::select! {
            _ = tx.closed() => {
                info!("Chat stream consumer went away; dropping upstream response");
                return;
            }
            chunk = upstream.next() => chunk,
        };
        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                error!("Chat stream error: {}", e);
                let _ = tx.send(Err(ChatError::Transport(e))).await;
                return;
            }
            None => break,
        };

        for event in buffer.push(bytes.as_ref()) {
            let data = match event {
                SseEvent::Done => {
                    debug!("Chat stream finished");
                    return;
                }
                SseEvent::Data(data) => data,
            };
            let parsed = match serde_json::from_str::<ChatCompletionChunk>(&data) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Failed to parse chat stream event: {} - Error: {}", data, e);
                    continue;
                }
            };
            for text in parsed
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .filter(|text| !text.is_empty())
            {
                if tx.send(Ok(text)).await.is_err() {
                    info!("Chat stream consumer went away; dropping upstream response");
                    return;
                }
            }
        }
    }
    debug!("Chat upstream closed");
}

/// Adapt a [`ChatStream`] into a `futures` stream.
pub fn into_stream(rx: ChatStream) -> impl Stream<Item = Result<String, ChatError>> {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
}

/// Drain a stream into one string, calling `on_chunk` as text arrives.
pub async fn collect_stream(
    mut rx: ChatStream,
    mut on_chunk: impl FnMut(&str),
) -> Result<String, ChatError> {
    let mut full = String::new();
    while let Some(chunk) = rx.recv().await {
        let chunk = chunk?;
        on_chunk(&chunk);
        full.push_str(&chunk);
    }
    Ok(full)
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Data(String),
    Done,
}

/// Reassembles server-sent event lines split across network chunks.
#[derive(Default)]
struct SseBuffer {
    pending: Vec<u8>,
    /// Set after an oversized partial line was dropped; its tail is skipped too.
    skipping: bool,
}

impl SseBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if self.skipping {
                self.skipping = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            match data.trim() {
                "" => {}
                "[DONE]" => events.push(SseEvent::Done),
                data => events.push(SseEvent::Data(data.to_string())),
            }
        }
        if self.pending.len() > MAX_PENDING_LINE {
            warn!(
                "Dropping {} bytes of an unterminated chat stream line",
                self.pending.len()
            );
            self.pending.clear();
            self.skipping = true;
        }
        events
    }
}
