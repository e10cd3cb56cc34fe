// Conversational assistant: a tool-calling loop over the CV working copy,
// with per-session history and optional retrieval context.

pub mod agent;
pub mod handlers;
pub mod memory;
pub mod prompts;
pub mod tools;
