//! Model invocation.
//!
//! This module provides the chat-completion client and the token/cost
//! accounting for the single audit request.

pub mod client;
pub mod usage;

pub use client::{ChatModel, ClientConfig, OpenAiChatClient};
pub use usage::{Pricing, UsageMetrics};
