//! Streaming generation relay
//!
//! Forwards a chat-completion request to an upstream provider and
//! re-emits each upstream content fragment as a normalized
//! [`TokenDelta`]. Providers differ only in base URL and default
//! model; they all speak the OpenAI-compatible SSE wire format.

mod client;
mod provider;
mod server;
mod sse;

pub use client::{DeltaStream, GenerationClient};
pub use provider::{ChatTurn, Provider, ProviderRequest, Role};
pub use server::{AppState, GenerateRequest, RelayServer, create_router};
pub use sse::{SseDecoder, TokenDelta, encode_envelope};
