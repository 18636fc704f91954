use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_enrichment::config::Config;
use lead_enrichment::dedup::deduplicate_leads;
use lead_enrichment::enrichment::ContactEnricher;
use lead_enrichment::export::{export_leads, write_csv, CrmFormat};
use lead_enrichment::hunter_client::HunterClient;
use lead_enrichment::models::{EnrichmentReport, Lead};
use lead_enrichment::sources::{bulk_domain_search, generate_sample_leads, parse_csv};

/// Enrich leads with verified emails and quality scores, then export them
/// for CRM import.
#[derive(Debug, Parser)]
#[command(name = "lead-enrich", version)]
struct Cli {
    /// CSV file with leads.
    #[arg(long, conflicts_with_all = ["sample", "domain"])]
    input: Option<PathBuf>,

    /// Generate this many sample leads (at most 10).
    #[arg(long, conflicts_with = "domain")]
    sample: Option<usize>,

    /// Company domain to search with Hunter.io (repeatable).
    #[arg(long)]
    domain: Vec<String>,

    /// Results per domain for domain search.
    #[arg(long, default_value_t = 20)]
    per_domain: usize,

    /// Maximum leads to enrich (defaults to MAX_REQUESTS_PER_MINUTE).
    #[arg(long)]
    max: Option<usize>,

    /// Export layout: salesforce, hubspot, pipedrive or generic.
    #[arg(long, default_value = "generic")]
    format: CrmFormat,

    /// Output file (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep duplicate emails.
    #[arg(long)]
    no_dedupe: bool,

    /// Also write the run summary as JSON to this file.
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Entry point: load leads, enrich, deduplicate, report, export.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_enrichment=info,lead_enrich=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let leads = load_leads(&cli, &config).await?;
    if leads.is_empty() {
        tracing::warn!("No leads to enrich");
        return Ok(());
    }
    tracing::info!("Loaded {} leads", leads.len());

    let enricher = ContactEnricher::from_config(&config)?;
    let cap = cli.max.unwrap_or_else(|| enricher.default_batch_cap());

    let started = Instant::now();
    let mut enriched = enricher.bulk_enrich(&leads, cap).await;
    let elapsed = started.elapsed();

    if !cli.no_dedupe {
        enriched = deduplicate_leads(enriched);
    }

    let report = EnrichmentReport::from_leads(&enriched, elapsed);
    tracing::info!(
        "Enrichment complete: {} leads, {} enriched, {} verified, {} invalid, avg quality {:.1}, {:.2}s",
        report.total_leads,
        report.enriched_count,
        report.verified_emails,
        report.invalid_emails,
        report.avg_quality_score,
        report.processing_time
    );
    tracing::info!(
        "Confidence: {} high, {} medium, {} low",
        report.high_confidence,
        report.medium_confidence,
        report.low_confidence
    );

    if let Some(path) = &cli.report {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
        tracing::info!("Wrote run summary to {}", path.display());
    }

    let table = export_leads(cli.format, &enriched);
    match &cli.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_csv(&table, &mut writer)?;
            writer.flush()?;
            tracing::info!("Wrote {} rows to {}", table.rows.len(), path.display());
        }
        None => write_csv(&table, io::stdout().lock())?,
    }

    Ok(())
}

async fn load_leads(cli: &Cli, config: &Config) -> anyhow::Result<Vec<Lead>> {
    if let Some(path) = &cli.input {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Cannot open {}: {}", path.display(), e))?;
        return Ok(parse_csv(file)?);
    }

    if !cli.domain.is_empty() {
        if !config.has_credentials() {
            anyhow::bail!("HUNTER_API_KEY is required for domain search");
        }
        let client = HunterClient::new(config)?;
        return Ok(bulk_domain_search(&client, &cli.domain, cli.per_domain).await);
    }

    Ok(generate_sample_leads(cli.sample.unwrap_or(10)))
}
