//! CLI interface for askdocs

mod ingest;
mod ui;

pub use ingest::DocumentIngestor;
pub use ui::{display_banner, print_answer, print_collection_info, print_search_results};

// Re-export core types
pub use askdocs_core::{Error, Result};
