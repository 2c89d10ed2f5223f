//! # pdf-rag CLI (`pdfrag`)
//!
//! Ask questions about a PDF using a local Ollama server.
//!
//! ## Usage
//!
//! ```bash
//! pdfrag --config ./config/pdfrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdfrag models` | List selectable models |
//! | `pdfrag recommend <pdf>` | Show size, segmentation and recommended model |
//! | `pdfrag ingest <pdf>` | Build an index and save it to the cache |
//! | `pdfrag ask <pdf> "<question>"` | Answer one question, with citations |
//! | `pdfrag chat <pdf>` | Interactive question session |
//! | `pdfrag completions <shell>` | Print a shell completion script |
//!
//! Logs go to stderr; set `RUST_LOG=info` (or `--verbose`) for pipeline detail.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pdf_rag::answer::{Answer, AnswerEngine};
use pdf_rag::catalog;
use pdf_rag::config::{self, Config};
use pdf_rag::embedding::OllamaEmbedder;
use pdf_rag::extract::extract_pdf;
use pdf_rag::generation::{GenerationOptions, OllamaGenerator};
use pdf_rag::heuristic::{recommend_model, segmentation_for};
use pdf_rag::index::DocumentIndex;
use pdf_rag::ingest::{ingest, sha256_hex, IngestionResult};
use pdf_rag::persist::{key_for_filename, IndexStore};
use pdf_rag::session::Session;

/// Citation excerpts are cut to this many characters.
const CITATION_PREVIEW_CHARS: usize = 200;

/// pdf-rag: ask questions about PDF documents with a local LLM.
#[derive(Parser)]
#[command(
    name = "pdfrag",
    about = "Ask questions about PDF documents using a local Ollama server",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults are used if it does not exist.
    #[arg(long, global = true, default_value = "./config/pdfrag.toml")]
    config: PathBuf,

    /// Log pipeline progress at info level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List selectable models in display order.
    Models,

    /// Show page count, size, segmentation and the recommended model for a PDF.
    Recommend {
        /// Path to the PDF.
        pdf: PathBuf,
    },

    /// Build an index for a PDF and save it to the cache.
    Ingest {
        pdf: PathBuf,

        /// Catalog model identifier (defaults to `[model] default`).
        #[arg(long)]
        model: Option<String>,

        /// Build the index without saving it.
        #[arg(long)]
        no_save: bool,
    },

    /// Answer one question about a PDF.
    ///
    /// Reuses the cached index when it was built from the same file with the
    /// same model; otherwise the PDF is ingested first.
    Ask {
        pdf: PathBuf,

        question: String,

        #[arg(long)]
        model: Option<String>,

        /// Ignore any cached index and ingest again.
        #[arg(long)]
        rebuild: bool,
    },

    /// Interactive question session. `/clear` empties the history, `/quit` exits.
    Chat {
        pdf: PathBuf,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        rebuild: bool,
    },

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Commands that don't require config
    match &cli.command {
        Commands::Models => {
            list_models();
            return Ok(());
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "pdfrag", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Recommend { pdf } => run_recommend(&pdf)?,
        Commands::Ingest {
            pdf,
            model,
            no_save,
        } => {
            let model = model.unwrap_or_else(|| cfg.model.default.clone());
            let embedder = OllamaEmbedder::new(&model, &cfg.ollama)?;
            let bytes = read_pdf(&pdf)?;
            let result = build_index(&cfg, &pdf, &bytes, &model, &embedder).await?;
            if !no_save {
                save_index(&cfg, &pdf, &result.index)?;
            }
        }
        Commands::Ask {
            pdf,
            question,
            model,
            rebuild,
        } => {
            let model = model.unwrap_or_else(|| cfg.model.default.clone());
            let embedder = OllamaEmbedder::new(&model, &cfg.ollama)?;
            let generator = OllamaGenerator::new(
                &model,
                &cfg.ollama,
                GenerationOptions::from(cfg.generation.clone()),
            )?;
            let index = open_index(&cfg, &pdf, &model, rebuild, &embedder).await?;
            let engine =
                AnswerEngine::new(&embedder, &generator).with_top_k(cfg.retrieval.top_k);
            let answer = engine.answer(&index, &question).await?;
            print_answer(&answer);
        }
        Commands::Chat {
            pdf,
            model,
            rebuild,
        } => {
            let model = model.unwrap_or_else(|| cfg.model.default.clone());
            run_chat(&cfg, &pdf, &model, rebuild).await?;
        }
        Commands::Models | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_models() {
    for m in catalog::list_models() {
        let marker = if m.identifier == catalog::DEFAULT_MODEL {
            "*"
        } else {
            " "
        };
        println!("{} {:<20} {}", marker, m.identifier, m.label());
        println!("  {:<20} {}", "", m.description);
    }
}

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_recommend(pdf: &Path) -> Result<()> {
    let document = extract_pdf(&read_pdf(pdf)?)?;
    let total_chars = document.total_chars();
    let segmentation = segmentation_for(total_chars, document.page_count());
    let recommended = recommend_model(total_chars);

    println!("{}", file_name(pdf));
    println!("  pages: {}", document.page_count());
    println!("  characters: {}", total_chars);
    println!("  segmentation: {}", segmentation.description);
    match catalog::describe(recommended) {
        Some(m) => println!("  recommended model: {} ({})", m.identifier, m.label()),
        None => println!("  recommended model: {}", recommended),
    }
    Ok(())
}

async fn build_index(
    cfg: &Config,
    pdf: &Path,
    bytes: &[u8],
    model: &str,
    embedder: &OllamaEmbedder,
) -> Result<IngestionResult> {
    let result = ingest(bytes, model, embedder, cfg.embedding.batch_size).await?;

    println!("ingest {}", file_name(pdf));
    println!("  {}", result.segmentation_description());
    println!(
        "  pages: {} | characters: {} | passages: {}",
        result.page_count, result.total_chars, result.passage_count
    );
    let label = catalog::describe(model)
        .map(|m| m.label())
        .unwrap_or_default();
    println!("  model: {} {}", model, label);
    if result.recommended_model != model {
        let rec = catalog::describe(result.recommended_model)
            .map(|m| m.label())
            .unwrap_or_else(|| result.recommended_model.to_string());
        println!("  hint: {} is recommended for a document this size", rec);
    }

    Ok(result)
}

fn save_index(cfg: &Config, pdf: &Path, index: &DocumentIndex) -> Result<()> {
    let store = IndexStore::new(&cfg.cache.root);
    let path = store.save(index, &key_for_filename(&file_name(pdf)))?;
    println!("  saved: {}", path.display());
    Ok(())
}

/// Load the cached index for `pdf` when it matches, otherwise ingest and save.
async fn open_index(
    cfg: &Config,
    pdf: &Path,
    model: &str,
    rebuild: bool,
    embedder: &OllamaEmbedder,
) -> Result<DocumentIndex> {
    let store = IndexStore::new(&cfg.cache.root);
    let key = key_for_filename(&file_name(pdf));
    let bytes = read_pdf(pdf)?;

    if !rebuild {
        if let Some(index) = store.load_if_current(&key, model, &sha256_hex(&bytes))? {
            return Ok(index);
        }
    }

    let result = build_index(cfg, pdf, &bytes, model, embedder).await?;
    store.save(&result.index, &key)?;
    Ok(result.index)
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    println!();
    println!("sources ({}):", answer.cited_passages.len());
    for (i, p) in answer.cited_passages.iter().enumerate() {
        let preview: String = p
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(CITATION_PREVIEW_CHARS)
            .collect();
        println!("  [{}] page {}: {}", i + 1, p.source_page + 1, preview);
    }
}

async fn run_chat(cfg: &Config, pdf: &Path, model: &str, rebuild: bool) -> Result<()> {
    let embedder = OllamaEmbedder::new(model, &cfg.ollama)?;
    let generator = OllamaGenerator::new(
        model,
        &cfg.ollama,
        GenerationOptions::from(cfg.generation.clone()),
    )?;
    let engine = AnswerEngine::new(&embedder, &generator).with_top_k(cfg.retrieval.top_k);

    let mut session = Session::new(model)?;
    let index = open_index(cfg, pdf, model, rebuild, &embedder).await?;
    session.attach(file_name(pdf), index)?;

    println!(
        "chatting about {} with {} (/clear resets history, /quit exits)",
        file_name(pdf),
        model
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        match question {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear_history();
                println!("history cleared");
                continue;
            }
            _ => {}
        }

        match session.ask(&engine, question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("error: {}", e),
        }
        println!();
    }

    Ok(())
}
