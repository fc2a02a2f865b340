//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for LLM providers so the
//! beat extractor can run against OpenAI, any OpenAI-compatible service,
//! or a stub in tests.

mod openai;
mod provider;
mod types;

pub use openai::OpenAIProvider;
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
