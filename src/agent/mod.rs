//! LLM infrastructure used to derive story beats.
//!
//! Only the provider abstraction lives here; prompt construction and
//! response parsing belong to the `beats` module.

pub mod llm;

pub use llm::{
    CompletionOptions, CompletionResponse, LlmError, LlmProvider, Message, MessageRole,
    OpenAIProvider,
};
