//! # Feedback Pulse CLI (`pulse`)
//!
//! The `pulse` binary drives the enrichment and answering pipeline. It plays
//! the collaborator role around the core: loading row files, calling into
//! the library, and rendering outputs.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pulse enrich` | Enrich raw rows concurrently and write the artifact |
//! | `pulse ask` | Answer a question over an enriched artifact |
//! | `pulse stats` | Summarize an enriched artifact |
//!
//! ## Examples
//!
//! ```bash
//! # Enrich raw feedback rows (JSONL, one row per line)
//! pulse enrich --input data/rows.jsonl --output data/enriched.jsonl
//!
//! # Ask a question over the enriched corpus
//! pulse ask "What do customers say about the DJ?" --data data/enriched.jsonl
//!
//! # Show sources alongside the answer
//! pulse ask "Worst catering feedback?" --data data/enriched.jsonl --show-sources
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use feedback_pulse::artifact;
use feedback_pulse::context::AppContext;

/// Feedback Pulse CLI, a customer-feedback enrichment and
/// retrieval-augmented answering pipeline.
#[derive(Parser)]
#[command(
    name = "pulse",
    about = "Feedback Pulse — enrich customer feedback with AI labels and answer questions over it",
    version,
    long_about = "Feedback Pulse enriches free-text customer feedback with sentiment/topic labels \
    and semantic embeddings via an external AI gateway, indexes the enriched corpus, and answers \
    natural-language questions over it using retrieval-augmented generation."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pulse.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich raw feedback rows and write the enriched artifact.
    ///
    /// Reads rows as line-delimited JSON, fans them out over the bounded
    /// worker pool, and writes one enriched record per line with the
    /// embedding inline. Rows whose gateway calls fail are written with
    /// sentinel labels instead of aborting the batch. Ctrl-C cancels
    /// cleanly: remaining rows complete as failed.
    Enrich {
        /// Input rows (line-delimited JSON, one feedback row per line).
        #[arg(long)]
        input: PathBuf,

        /// Output artifact path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Answer a natural-language question over an enriched artifact.
    ///
    /// Builds the in-memory vector index from the artifact, retrieves the
    /// most similar comments, and generates an answer conditioned on them.
    Ask {
        /// The question to answer.
        question: String,

        /// Enriched artifact to load and index.
        #[arg(long)]
        data: PathBuf,

        /// Print the supporting documents after the answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// Summarize an enriched artifact.
    ///
    /// Prints row counts, embedding coverage, and per-sentiment totals.
    Stats {
        /// Enriched artifact to summarize.
        #[arg(long)]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enrich { input, output } => {
            let ctx = AppContext::initialize(&cli.config)?;
            run_enrich(&ctx, &input, &output).await
        }
        Commands::Ask {
            question,
            data,
            show_sources,
        } => {
            let ctx = AppContext::initialize(&cli.config)?;
            run_ask(&ctx, &question, &data, show_sources).await
        }
        Commands::Stats { data } => run_stats(&data),
    }
}

async fn run_enrich(ctx: &AppContext, input: &Path, output: &Path) -> Result<()> {
    let rows = artifact::read_rows(input)?;
    let total = rows.len();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let enriched = ctx.enrich_rows(rows, &cancel).await;

    let embedded = enriched.iter().filter(|r| r.has_embedding()).count();
    let degraded = enriched.iter().filter(|r| r.is_degraded()).count();
    artifact::write_enriched(output, &enriched)?;

    println!("enrich");
    println!("  rows: {}", total);
    println!("  embedded: {}", embedded);
    println!("  degraded: {}", degraded);
    println!("  artifact: {}", output.display());
    println!("ok");
    Ok(())
}

async fn run_ask(ctx: &AppContext, question: &str, data: &Path, show_sources: bool) -> Result<()> {
    let rows = artifact::read_enriched(data)?;
    let index = ctx.build_index(&rows);
    let answerer = ctx.answerer();

    let result = answerer.answer(&index, question).await;

    println!("{}", result.answer);
    if show_sources && !result.sources.is_empty() {
        println!();
        println!("sources:");
        for doc in &result.sources {
            println!("  [{:.3}] {}: {}", doc.score, doc.id, snippet(&doc.text));
        }
    }
    Ok(())
}

fn run_stats(data: &Path) -> Result<()> {
    let rows = artifact::read_enriched(data)?;
    let embedded = rows.iter().filter(|r| r.has_embedding()).count();

    let mut by_sentiment: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &rows {
        *by_sentiment.entry(row.sentiment.as_str()).or_default() += 1;
    }

    println!("stats");
    println!("  rows: {}", rows.len());
    println!("  with embedding: {}", embedded);
    println!("  sentiment:");
    for (label, count) in by_sentiment {
        println!("    {}: {}", label, count);
    }
    println!("ok");
    Ok(())
}

fn snippet(text: &str) -> String {
    const MAX: usize = 80;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
