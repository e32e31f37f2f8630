mod error;
mod fetcher;
mod parser;
mod pipeline;
mod settings;
mod table;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use fetcher::WikiClient;
use parser::country::CountryStrategy;
use parser::occupation::{ClassifierInput, ClassifierVariant};
use pipeline::PipelineOptions;
use settings::Settings;
use table::CandidateTable;

#[derive(Parser)]
#[command(name = "bio_enricher", about = "Enrich a candidate list with Wikipedia biography fields")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and write the enriched table (default)
    Run {
        /// Input TSV with a Candidate column
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output TSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only process the first N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long, value_enum)]
        country_strategy: Option<CountryStrategy>,
        #[arg(long, value_enum)]
        classifier_input: Option<ClassifierInput>,
        #[arg(long, value_enum)]
        variant: Option<ClassifierVariant>,
        /// Max requests in flight
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Report candidates without a reachable page
    Check {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;
    info!(?settings, "settings loaded");

    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        output: None,
        limit: None,
        country_strategy: None,
        classifier_input: None,
        variant: None,
        concurrency: None,
    });

    match command {
        Commands::Run {
            input,
            output,
            limit,
            country_strategy,
            classifier_input,
            variant,
            concurrency,
        } => {
            if let Some(s) = country_strategy {
                settings.country_strategy = s;
            }
            if let Some(c) = classifier_input {
                settings.classifier_input = c;
            }
            if let Some(v) = variant {
                settings.variant = v;
            }
            if let Some(n) = concurrency {
                settings.concurrency = n;
            }
            let input = input.unwrap_or_else(|| PathBuf::from(&settings.input));
            let output = output.unwrap_or_else(|| PathBuf::from(&settings.output));

            let client = Arc::new(WikiClient::new(&settings)?);
            let opts = PipelineOptions::from_settings(&settings);
            println!("Enriching {:?} -> {:?}", input, output);
            let stats = pipeline::run(&input, &output, limit, client, &opts)
                .await
                .with_context(|| format!("Enrichment of {:?} failed", input))?;
            stats.print();
        }
        Commands::Check { input, limit } => {
            let input = input.unwrap_or_else(|| PathBuf::from(&settings.input));
            let mut table = CandidateTable::read(&input)?;
            if let Some(n) = limit {
                table.truncate(n);
            }
            if table.is_empty() {
                println!("No candidates in {:?}.", input);
                return Ok(());
            }

            let client = Arc::new(WikiClient::new(&settings)?);
            let opts = PipelineOptions::from_settings(&settings);
            let missing = pipeline::missing_pages(&table, client, &opts).await;
            if missing.is_empty() {
                println!("All {} candidates have a page.", table.len());
            } else {
                println!("{} of {} candidates have no page:", missing.len(), table.len());
                for name in &missing {
                    println!("  {}", if name.is_empty() { "(blank)" } else { name });
                }
            }
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
