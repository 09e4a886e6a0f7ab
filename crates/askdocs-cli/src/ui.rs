//! Terminal output helpers

use colored::*;

use askdocs_core::{Answer, CollectionInfo, RetrievedChunk};

pub fn display_banner() {
    println!("{}", "📚 askdocs — ask questions about your documents".bold());
}

pub fn print_search_results(results: &[RetrievedChunk]) {
    if results.is_empty() {
        println!("{}", "No matching chunks.".yellow());
        return;
    }

    for (rank, hit) in results.iter().enumerate() {
        println!(
            "{} {}",
            format!("{}.", rank + 1).green().bold(),
            format!("score {:.3}", hit.score).dimmed()
        );
        println!("   {}", hit.text);
    }
}

pub fn print_answer(answer: &Answer, show_prompt: bool) {
    println!("{} {}", "💬".blue(), answer.text.bold());

    if !answer.retrieved_chunks.is_empty() {
        println!(
            "{}",
            format!("({} chunks retrieved)", answer.retrieved_chunks.len()).dimmed()
        );
    }

    if show_prompt {
        println!();
        println!("{}", "Prompt used:".yellow());
        println!("{}", answer.prompt_used.dimmed());
    }
}

pub fn print_collection_info(project: &str, info: &CollectionInfo) {
    println!("{} project {}", "ℹ️".blue(), project.bold());
    println!("   vectors:   {}", info.vector_count);
    println!("   dimension: {}", info.dimension);
    println!("   metric:    {}", info.metric);
}
