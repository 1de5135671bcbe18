// file: src/llm/mod.rs
// description: chat completion adapters
// reference: internal module structure

pub mod client;

pub use client::OpenAiChatClient;
