//! Chat-completion client for an OpenAI-compatible endpoint.

mod client;

pub use client::{ChatClient, ChatError};
