use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

// Import from our modular crates
use askdocs_cli::{
    DocumentIngestor, display_banner, print_answer, print_collection_info, print_search_results,
};
use askdocs_cohere::CohereClient;
use askdocs_core::{AppConfig, DocumentStore, LlmProvider, ProviderKind, VectorIndex};
use askdocs_openai::OpenAiClient;
use askdocs_rag::{
    EngineOptions, InMemoryDocumentStore, QdrantVectorIndex, RagEngine, TemplateCatalog,
};

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "Ask questions about your documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk and store text files, then embed and index the project
    Ingest {
        project: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Re-run the embed-and-upsert push for a project
    Push { project: String },
    /// Retrieve the most relevant chunks for a query
    Search {
        project: String,
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the project's documents
    Ask {
        project: String,
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        locale: Option<String>,
        /// Also print the assembled prompt
        #[arg(long)]
        show_prompt: bool,
    },
    /// Delete the project's vector collection
    Reset { project: String },
    /// Show the project's collection facts
    Info { project: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Providers are selected once at startup and shared for the process
    // lifetime; the engine never branches on a concrete backend.
    let embedder = build_provider(config.embedding_backend, &config)?;
    let generator = if config.generation_backend == config.embedding_backend {
        Arc::clone(&embedder)
    } else {
        build_provider(config.generation_backend, &config)?
    };

    let index: Arc<dyn VectorIndex> = Arc::new(QdrantVectorIndex::connect(&config.qdrant_url)?);
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let templates = TemplateCatalog::builtin(config.default_locale.clone());

    let engine = RagEngine::new(
        embedder,
        generator,
        index,
        Arc::clone(&store),
        templates,
        EngineOptions::from_config(&config),
    );

    match cli.command {
        Command::Ingest { project, files } => {
            display_banner();
            let ingestor =
                DocumentIngestor::new(store, config.chunk_size, config.chunk_overlap);

            let mut stored = 0;
            for file in &files {
                stored += ingestor.ingest_file(&project, file).await?;
            }
            println!("{} {stored} chunks stored", "✅".green());

            let indexed = engine.index_project(&project).await?;
            println!("{} {indexed} vectors indexed", "✅".green());
        }
        Command::Push { project } => {
            let indexed = engine.index_project(&project).await?;
            println!("{} {indexed} vectors indexed", "✅".green());
        }
        Command::Search {
            project,
            query,
            top_k,
        } => {
            let results = engine
                .search(&project, &query, top_k.unwrap_or(config.default_top_k))
                .await?;
            print_search_results(&results);
        }
        Command::Ask {
            project,
            question,
            top_k,
            locale,
            show_prompt,
        } => {
            let answer = engine
                .answer(
                    &project,
                    &question,
                    top_k.unwrap_or(config.default_top_k),
                    locale.as_deref().unwrap_or(&config.primary_locale),
                )
                .await?;
            print_answer(&answer, show_prompt);
        }
        Command::Reset { project } => {
            engine.reset_project(&project).await?;
            println!("{} collection deleted", "🗑️".yellow());
        }
        Command::Info { project } => {
            let info = engine.project_info(&project).await?;
            print_collection_info(&project, &info);
        }
    }

    Ok(())
}

fn build_provider(kind: ProviderKind, config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::OpenAi => Arc::new(
            OpenAiClient::from_env()?
                .with_embedding_model(
                    config.embedding_model_id.clone(),
                    config.embedding_dimension,
                )
                .with_generation_model(config.generation_model_id.clone())
                .with_timeout(config.provider_timeout),
        ),
        ProviderKind::Cohere => Arc::new(
            CohereClient::from_env()?
                .with_embedding_model(
                    config.embedding_model_id.clone(),
                    config.embedding_dimension,
                )
                .with_generation_model(config.generation_model_id.clone())
                .with_timeout(config.provider_timeout),
        ),
    };
    Ok(provider)
}
