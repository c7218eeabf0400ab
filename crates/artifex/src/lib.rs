//! Artifex - streaming generation relay and artifact decoding
//!
//! This crate provides the generation core of an AI app builder: a
//! relay that streams normalized token deltas from upstream LLM
//! providers, and a decoder that classifies the assembled response
//! into structured artifacts (documents, presentations, spreadsheets,
//! code, plans) with a chat fallback.

pub mod artifact;
pub mod config;
pub mod error;
pub mod relay;

pub use artifact::{Artifact, decode_artifact};
pub use error::ArtifexError;
pub use relay::{GenerationClient, TokenDelta};
