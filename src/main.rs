use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use futures::StreamExt;
use knowledge_explorer::api::types::ConfigSummary;
use knowledge_explorer::config::AppConfig;
use knowledge_explorer::ingest::IngestStatus;
use knowledge_explorer::rag::QueryEvent;
use knowledge_explorer::rag::RagQuery;
use knowledge_explorer::KnowledgeExplorer;
use tracing::info;
use tracing::warn;

#[derive(Parser)]
#[command(name = "knowledge-explorer")]
#[command(about = "Ask questions about your PDF and TXT documents")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ingest local PDF or TXT files
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question
    Ask {
        question: String,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Search the documents even without document keywords
        #[arg(long)]
        force_documents: bool,
        /// Restrict retrieval to one document
        #[arg(long)]
        filename: Option<String>,
        /// Print tokens as they arrive
        #[arg(long)]
        stream: bool,
    },
    /// Show index statistics
    Stats,
    /// Delete every chunk of one document
    Delete { filename: String },
    /// Delete every vector in the index
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    knowledge_explorer::logging::init_logging_with_config(&config.logging, cli.verbose)?;
    info!("Configuration loaded successfully");

    if let Commands::Config = cli.command {
        print_config(&config)?;
        return Ok(());
    }

    let explorer = Arc::new(KnowledgeExplorer::from_config(config)?);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Err(e) = explorer.store().ensure_index().await {
                warn!("⚠️  Vector index is not ready yet: {}", e);
            }
            let host = host.unwrap_or_else(|| explorer.config().server.host.clone());
            let port = port.unwrap_or(explorer.config().server.port);
            knowledge_explorer::api::serve_api(explorer, &host, port).await?;
        }
        Commands::Ingest { paths } => handle_ingest(&explorer, &paths).await,
        Commands::Ask {
            question,
            top_k,
            force_documents,
            filename,
            stream,
        } => {
            let query = RagQuery {
                question,
                top_k,
                force_documents,
                filename,
            };
            if stream {
                handle_stream(&explorer, query).await?;
            } else {
                handle_ask(&explorer, query).await?;
            }
        }
        Commands::Stats => {
            let stats = explorer.stats().await?;
            println!("📊 Index: {}", explorer.config().vector_store.index_name);
            println!("  Total vectors: {}", stats.total_vectors);
            println!("  Dimension: {}", stats.dimension);
            for (name, ns) in &stats.namespaces {
                let name = if name.is_empty() { "(default)" } else { name };
                println!("  Namespace {}: {} vectors", name, ns.vector_count);
            }
        }
        Commands::Delete { filename } => {
            let deleted = explorer.delete_document(&filename).await?;
            println!("🗑️  Deleted {deleted} vectors for {filename}");
        }
        Commands::Clear { force } => {
            if !force && !confirm("Delete every vector in the index?")? {
                println!("Aborted");
                return Ok(());
            }
            explorer.clear().await?;
            println!("🗑️  Index cleared");
        }
        Commands::Config => print_config(explorer.config())?,
    }

    Ok(())
}

async fn handle_ingest(explorer: &KnowledgeExplorer, paths: &[PathBuf]) {
    for path in paths {
        let result = explorer.ingestion().ingest_path(path).await;
        let icon = match result.status {
            IngestStatus::Success => "✅",
            IngestStatus::Warning => "⚠️ ",
            IngestStatus::Error => "❌",
        };
        println!(
            "{} {} ({} chunks, {} upserted): {}",
            icon, result.filename, result.chunks, result.upserted, result.message
        );
    }
}

async fn handle_ask(explorer: &KnowledgeExplorer, query: RagQuery) -> anyhow::Result<()> {
    let response = explorer.rag().query(query).await?;
    println!("{}", response.answer);
    print_sources(
        response
            .sources
            .iter()
            .map(|s| (s.filename.as_str(), s.score)),
    );
    Ok(())
}

async fn handle_stream(explorer: &KnowledgeExplorer, query: RagQuery) -> anyhow::Result<()> {
    let mut events = explorer.rag().clone().stream_query(query);
    let mut sources = Vec::new();
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event {
            QueryEvent::Metadata(metadata) => {
                info!(
                    "Answer mode: {:?}, {} chunks",
                    metadata.metadata.mode, metadata.metadata.retrieved_docs
                );
                sources = metadata.sources;
            }
            QueryEvent::Token(token) => {
                print!("{token}");
                stdout.flush()?;
            }
            QueryEvent::Done { token_count, .. } => {
                println!();
                info!("Streamed {} tokens", token_count);
            }
            QueryEvent::Error(message) => anyhow::bail!(message),
        }
    }

    print_sources(sources.iter().map(|s| (s.filename.as_str(), s.score)));
    Ok(())
}

fn print_sources<'a>(sources: impl Iterator<Item = (&'a str, f32)>) {
    let mut sources = sources.peekable();
    if sources.peek().is_none() {
        return;
    }
    println!("\n📚 Sources:");
    for (filename, score) in sources {
        println!("  - {filename} (score: {score:.3})");
    }
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let keys = config.api_key_status();
    let mark = |present: bool| if present { "✅" } else { "❌" };
    println!("🔑 API keys:");
    println!("  GROQ_API_KEY:     {}", mark(keys.groq));
    println!("  PINECONE_API_KEY: {}", mark(keys.pinecone));
    println!("  JINA_API_KEY:     {}", mark(keys.jina));
    println!("⚙️  Configuration:");
    println!(
        "{}",
        serde_json::to_string_pretty(&ConfigSummary::from_config(config))?
    );
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
