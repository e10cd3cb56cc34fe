// Upload text extraction and Harvard-style PDF generation.
// Extraction and rendering are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod extract;
pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod render;
