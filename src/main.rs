//! PRA COREP own funds reporting assistant.
//!
//! Usage:
//!   corep-rag                                  # default question
//!   corep-rag How should AT1 be reported?      # custom question
//!   corep-rag --retrieve-only Tier 2 maturity  # ranked passages only

use anyhow::Result;
use clap::Parser;
use corep_rag::embeddings::provider_from_config;
use corep_rag::{Config, CorepPipeline, Corpus, Retriever, report};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUESTION: &str =
    "How should a UK bank report its Common Equity Tier 1 capital under PRA COREP Own Funds?";

#[derive(Parser)]
#[command(name = "corep-rag", version, about = "PRA COREP own funds reporting assistant")]
struct Cli {
    /// Question to answer; words are joined with spaces
    question: Vec<String>,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON passage file to use instead of the built-in corpus
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Print only the structured JSON output
    #[arg(long)]
    json: bool,

    /// Print ranked passages and skip generation
    #[arg(long)]
    retrieve_only: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "corep_rag=debug"
    } else {
        "corep_rag=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(k) = cli.top_k {
        config.top_k = k;
    }

    let corpus = match &cli.corpus {
        Some(path) => Corpus::from_json_file(path)?,
        None => Corpus::own_funds(),
    };

    let question = if cli.question.is_empty() {
        DEFAULT_QUESTION.to_string()
    } else {
        cli.question.join(" ")
    };

    if cli.retrieve_only {
        let retriever = Retriever::new(corpus, provider_from_config(&config.embedding)?);
        for hit in retriever.retrieve(&question, config.top_k)? {
            println!(
                "{}: {}, {} (dist: {:.4})",
                hit.passage.id, hit.passage.source, hit.passage.locator, hit.distance
            );
        }
        return Ok(());
    }

    let pipeline = CorepPipeline::from_config(&config, corpus)?;
    let output = pipeline.run(&question)?;

    if cli.json {
        println!("{}", report::to_json(&output)?);
    } else {
        println!("{}", report::full_report(&output)?);
    }
    Ok(())
}
