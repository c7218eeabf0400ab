//! Upstream chat-completion client
//!
//! Issues a streaming request against an OpenAI-compatible endpoint and
//! exposes the response as a lazy, pull-based sequence of normalized
//! [`TokenDelta`]s. Consumers drive progress by polling; dropping the
//! stream drops the upstream connection.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{ArtifexError, Result};

use super::provider::{ChatTurn, ProviderRequest};
use super::sse::{SseDecoder, TokenDelta};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI-compatible chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Client for streaming generation calls
///
/// Holds a single `reqwest::Client`; one instance serves any number of
/// concurrent generation requests with no shared mutable state.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: reqwest::Client,
    default_temperature: f32,
    default_max_tokens: u32,
}

impl GenerationClient {
    /// Create a client with the given overall request timeout
    ///
    /// The overall timeout bounds the whole streamed response; only the
    /// connect phase gets a short fixed bound, since generations can
    /// legitimately run for minutes.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArtifexError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            default_temperature: 0.7,
            default_max_tokens: 8000,
        })
    }

    /// Set the generation defaults applied when a request omits them
    pub fn with_defaults(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.default_temperature = temperature;
        self.default_max_tokens = max_tokens;
        self
    }

    /// Open a streaming generation call
    ///
    /// Fails before any network I/O when the request carries no API key.
    /// A non-success upstream status is terminal and never retried; the
    /// status and body are preserved for the caller to surface.
    pub async fn generate(&self, request: &ProviderRequest) -> Result<DeltaStream> {
        if request.api_key.trim().is_empty() {
            return Err(ArtifexError::Authentication {
                provider: request.provider.name(),
            });
        }

        let url = Url::parse(&format!(
            "{}/chat/completions",
            request.base_url().trim_end_matches('/')
        ))
        .map_err(|e| ArtifexError::Config(format!("Invalid provider base URL: {e}")))?;
        let body = ChatCompletionRequest {
            model: request.model(),
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            stream: true,
        };

        debug!(
            provider = request.provider.name(),
            model = body.model,
            "Opening streaming completion at {url}"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ArtifexError::Network(format!("Request timed out: {e}"))
                } else if e.is_connect() {
                    ArtifexError::Network(format!("Failed to connect to upstream: {e}"))
                } else {
                    ArtifexError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ArtifexError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DeltaStream::new(response.bytes_stream()))
    }
}

/// Lazy sequence of normalized token deltas from one generation call
///
/// Emission order is exactly upstream arrival order. The stream ends at
/// the `[DONE]` sentinel or upstream EOF; a mid-stream transport
/// failure surfaces as one terminal `Err` item.
pub struct DeltaStream {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<TokenDelta>,
    finished: bool,
}

impl std::fmt::Debug for DeltaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaStream")
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl DeltaStream {
    pub(crate) fn new(
        inner: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(inner),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Drain the stream, concatenating every delta into the full
    /// response text
    pub async fn into_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(delta) = self.next().await {
            text.push_str(&delta?.text);
        }
        Ok(text)
    }
}

impl Stream for DeltaStream {
    type Item = Result<TokenDelta>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(delta) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(delta)));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.decoder.feed(&bytes));
                    if this.decoder.is_done() {
                        this.finished = true;
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(ArtifexError::Network(format!(
                        "Upstream stream failed: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    this.pending.extend(this.decoder.finish());
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
