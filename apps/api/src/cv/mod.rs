// CV analysis, section editing and the optimization pipeline.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod sections;
pub mod structure;
