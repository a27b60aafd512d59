//! Title extraction CLI
//!
//! Reads source records (JSON array or JSON lines), extracts person/title
//! entities and writes them as JSON lines.
//!
//! Usage:
//!   title-extract --input records.jsonl --keywords keywords.json \
//!     --ner-host localhost --ner-port 9199 --output entities.jsonl
//!
//! Examples:
//!   # No NER service: POS tags and the local grammar
//!   title-extract --input records.jsonl --grammar local
//!
//!   # Check a config file without running anything
//!   title-extract --config extractor.json --check

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rapid_title_extract::chunk::GrammarKind;
use rapid_title_extract::pipeline::StageTimingObserver;
use rapid_title_extract::{load_records, EntitySink, ExtractorSpec, JsonLinesSink};

/// Extract (first name, last name, job title) entities from biography text
#[derive(Parser, Debug)]
#[command(name = "title-extract")]
#[command(about = "Extract person names and job titles from free-text records")]
struct Args {
    /// Source records (JSON array or JSON lines)
    #[arg(long, short = 'i', required_unless_present = "check")]
    input: Option<PathBuf>,

    /// Extractor spec (JSON); flags below override its settings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Keyword file (.json grouped by category, or one keyword per line)
    #[arg(long, short = 'k')]
    keywords: Option<PathBuf>,

    /// Category to read from a JSON keyword file
    #[arg(long)]
    category: Option<String>,

    /// Tagging strategy: external (NER service) or local (POS only)
    #[arg(long, short = 'g')]
    grammar: Option<GrammarKind>,

    /// Grammar file replacing the built-in grammar
    #[arg(long)]
    grammar_file: Option<PathBuf>,

    /// Stanford NER server host
    #[arg(long, env = "NER_HOST")]
    ner_host: Option<String>,

    /// Stanford NER server port (default: 9199)
    #[arg(long, env = "NER_PORT")]
    ner_port: Option<u16>,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Log per-stage timings
    #[arg(long)]
    timings: bool,

    /// Validate the configuration, print the report and exit
    #[arg(long)]
    check: bool,
}

impl Args {
    fn spec(&self) -> anyhow::Result<ExtractorSpec> {
        let mut spec = match &self.config {
            Some(path) => ExtractorSpec::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ExtractorSpec::default(),
        };

        if let Some(grammar) = self.grammar {
            spec.grammar = grammar;
        }
        if let Some(file) = &self.grammar_file {
            spec.grammar_file = Some(file.clone());
        }
        if let Some(file) = &self.keywords {
            spec.keywords = None;
            spec.keyword_file = Some(file.clone());
        }
        if let Some(category) = &self.category {
            spec.keyword_category = Some(category.clone());
        }
        if let Some(host) = &self.ner_host {
            spec.ner.host = Some(host.clone());
        }
        if let Some(port) = self.ner_port {
            spec.ner.port = Some(port);
        }
        Ok(spec)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("rapid_title_extract=info".parse()?)
                .add_directive("title_extract=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let spec = args.spec()?;

    if args.check {
        let report = spec.validate();
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.has_errors() {
            anyhow::bail!("configuration has {} error(s)", report.errors().count());
        }
        return Ok(());
    }

    let pipeline = spec
        .build_pipeline()
        .context("building extraction pipeline")?;

    let input = args.input.as_ref().context("--input is required")?;
    let records =
        load_records(input).with_context(|| format!("loading records from {}", input.display()))?;

    let started = Instant::now();
    let (entities, observers) = pipeline.run_batch_observed(&records, StageTimingObserver::new);

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            JsonLinesSink::new(BufWriter::new(file)).write_batch(&entities)?
        }
        None => JsonLinesSink::new(std::io::stdout().lock()).write_batch(&entities)?,
    };

    tracing::info!(
        records = records.len(),
        entities = written,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction finished"
    );

    if args.timings {
        let mut timings = StageTimingObserver::new();
        for observer in observers {
            timings.absorb(observer);
        }
        for (stage, total) in timings.totals() {
            tracing::info!(stage, elapsed_ms = total.as_secs_f64() * 1000.0, "stage time");
        }
    }

    Ok(())
}
