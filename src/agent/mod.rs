//! LLM agent over the vibration tools.
//!
//! `Agent` runs the tool-calling loop for a task; `stream_chat` is a plain
//! streamed completion for free-form questions.

mod runner;
mod stream;

pub use runner::{Agent, AgentResponse, ToolCallRecord, DEFAULT_SYSTEM_PROMPT};
pub use stream::stream_chat;
