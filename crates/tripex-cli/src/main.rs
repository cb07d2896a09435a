//! Tripex CLI - Command-line interface
//!
//! Usage:
//!   tripex extract <file> [--format conllu|json] [--method pos|dependency|both]
//!   tripex evaluate [titles...] [--llm] [--sample N] [--interactive] [--output report.json]
//!
//! Author: hephaex@gmail.com

mod batch;
mod report;
mod review;

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tripex_core::{AppConfig, Document, LoggingConfig, Triplet};
use tripex_extractor::{
    DependencyMatcher, LlmExtractor, LlmExtractorConfig, SpanScanner, TripletExtractor,
};
use tripex_source::{create_text_source, HttpAnnotator};

use crate::batch::{BatchRunner, DEFAULT_TITLES};

#[derive(Parser)]
#[command(name = "tripex")]
#[command(about = "Subject-relation-object triplet extraction")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triplets from a pre-annotated file
    Extract {
        /// CoNLL-U or token JSON file
        file: PathBuf,

        /// Annotation format (guessed from the extension if omitted)
        #[arg(long, value_enum)]
        format: Option<InputFormat>,

        #[arg(long, value_enum, default_value_t = Method::Both)]
        method: Method,

        /// Reject spans with more than three relation tokens
        #[arg(long)]
        strict: bool,

        /// Print JSON instead of one triplet per line
        #[arg(long)]
        json: bool,
    },
    /// Fetch, annotate and extract a batch of documents, then report samples
    Evaluate {
        /// Document titles
        titles: Vec<String>,

        /// Samples drawn per extractor
        #[arg(long)]
        sample: Option<usize>,

        /// Also run the LLM strategy
        #[arg(long)]
        llm: bool,

        /// Ask for a Y/N verdict on every sample
        #[arg(long)]
        interactive: bool,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Conllu,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    Pos,
    Dependency,
    Both,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            file,
            format,
            method,
            strict,
            json,
        } => run_extract(&config, &file, format, method, strict, json),
        Commands::Evaluate {
            titles,
            sample,
            llm,
            interactive,
            output,
            seed,
        } => {
            let options = EvaluateOptions {
                titles,
                sample,
                llm,
                interactive,
                output,
                seed,
            };
            run_evaluate(&config, options).await
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    // stdout carries results, logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn span_scanner(config: &AppConfig, strict: bool) -> SpanScanner {
    match config.extraction.max_relation_tokens {
        Some(limit) => SpanScanner::new().with_max_relation_tokens(limit),
        None if strict => SpanScanner::strict(),
        None => SpanScanner::new(),
    }
}

fn extractors(config: &AppConfig, method: Method, strict: bool) -> Vec<Arc<dyn TripletExtractor>> {
    let mut out: Vec<Arc<dyn TripletExtractor>> = Vec::new();
    if method != Method::Dependency {
        out.push(Arc::new(span_scanner(config, strict)));
    }
    if method != Method::Pos {
        out.push(Arc::new(DependencyMatcher::new()));
    }
    out
}

fn read_document(path: &Path, format: Option<InputFormat>) -> anyhow::Result<Document> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let format = format.unwrap_or_else(|| match path.extension().and_then(|e| e.to_str()) {
        Some("json") => InputFormat::Json,
        _ => InputFormat::Conllu,
    });

    let doc = match format {
        InputFormat::Conllu => Document::from_conllu(&input),
        InputFormat::Json => Document::from_token_json(&input),
    }
    .with_context(|| format!("Invalid annotation in {}", path.display()))?;

    Ok(doc)
}

fn run_extract(
    config: &AppConfig,
    file: &Path,
    format: Option<InputFormat>,
    method: Method,
    strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    let doc = read_document(file, format)?;
    tracing::info!(file = %file.display(), tokens = doc.len(), "loaded document");

    let results: Vec<(String, Vec<Triplet>)> = extractors(config, method, strict)
        .iter()
        .map(|e| (e.name().to_string(), e.extract(&doc)))
        .collect();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if json {
        let value: serde_json::Map<String, serde_json::Value> = results
            .into_iter()
            .map(|(name, triplets)| serde_json::to_value(triplets).map(|v| (name, v)))
            .collect::<serde_json::Result<_>>()?;
        serde_json::to_writer_pretty(&mut out, &value)?;
        writeln!(out)?;
    } else {
        for (name, triplets) in &results {
            writeln!(out, "# {name}: {} triplets", triplets.len())?;
            for triplet in triplets {
                writeln!(out, "{triplet}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

struct EvaluateOptions {
    titles: Vec<String>,
    sample: Option<usize>,
    llm: bool,
    interactive: bool,
    output: Option<PathBuf>,
    seed: Option<u64>,
}

async fn run_evaluate(config: &AppConfig, options: EvaluateOptions) -> anyhow::Result<()> {
    let titles = if options.titles.is_empty() {
        DEFAULT_TITLES.iter().map(|t| t.to_string()).collect()
    } else {
        options.titles
    };

    let source = create_text_source(&config.source)?;
    let annotator = Arc::new(HttpAnnotator::from_config(&config.annotator)?);

    let mut runner = BatchRunner::new(source, annotator, extractors(config, Method::Both, false))
        .with_sample_size(options.sample.unwrap_or(config.extraction.sample_size))
        .with_concurrency(config.extraction.concurrency);

    if options.llm {
        let client = tripex_llm::create_llm_client(&config.llm)?;
        let llm_config = LlmExtractorConfig {
            max_input_chars: config.llm.max_input_chars,
        };
        runner = runner.with_llm(LlmExtractor::with_config(client, llm_config));
    }
    if let Some(seed) = options.seed {
        runner = runner.with_seed(seed);
    }

    let mut report = runner.run(&titles).await;

    let stdout = std::io::stdout();
    report.render(&mut stdout.lock())?;

    if options.interactive {
        let stdin = std::io::stdin();
        review::review_report(&mut report, &mut stdin.lock(), &mut stdout.lock())?;
        report.render(&mut stdout.lock())?;
    }

    if let Some(path) = options.output {
        report.write_json(&path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_JSON: &str = r#"[
        {"text": "Alice", "pos": "PROPN", "dep": "nsubj", "head": 1},
        {"text": "spoke", "pos": "VERB", "dep": "ROOT", "head": 1},
        {"text": "with", "pos": "ADP", "dep": "prep", "head": 1},
        {"text": "Bob", "pos": "PROPN", "dep": "pobj", "head": 2}
    ]"#;

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::parse_from([
            "tripex", "evaluate", "Alice", "Bob", "--llm", "--sample", "3",
        ]);
        match cli.command {
            Commands::Evaluate {
                titles, sample, llm, ..
            } => {
                assert_eq!(titles, ["Alice", "Bob"]);
                assert_eq!(sample, Some(3));
                assert!(llm);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_extractor_selection() {
        let config = AppConfig::default();
        let names = |m, strict| -> Vec<String> {
            extractors(&config, m, strict)
                .iter()
                .map(|e| e.name().to_string())
                .collect()
        };
        assert_eq!(names(Method::Both, false), ["pos", "dependency"]);
        assert_eq!(names(Method::Pos, true), ["pos-strict"]);
        assert_eq!(names(Method::Dependency, true), ["dependency"]);
    }

    #[test]
    fn test_read_document_guesses_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.json");
        std::fs::write(&path, ALICE_JSON).unwrap();

        let doc = read_document(&path, None).unwrap();
        let triplets = DependencyMatcher::new().extract(&doc);
        assert_eq!(triplets, vec![Triplet::new("Alice", "spoke with", "Bob")]);

        assert!(read_document(&path, Some(InputFormat::Conllu)).is_err());
    }
}
