//! Canonical chat model shared by every provider adapter

pub mod types;

pub use types::{
    AssistantMessage, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, Choice,
    FinishReason, MessageRole, OBJECT_CHAT_COMPLETION, Usage, completion_id, current_timestamp,
};
