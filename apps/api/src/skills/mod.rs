// Skill extraction (LLM) and CV-versus-job skill matching.

pub mod extract;
pub mod handlers;
pub mod matcher;
pub mod prompts;
