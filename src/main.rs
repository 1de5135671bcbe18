// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rfp_rag::database::SchemaManager;
use rfp_rag::pipeline::{FileScanner, ProgressTracker};
use rfp_rag::utils::logging::{format_error, format_info, format_success, format_warning};
use rfp_rag::utils::{HealthStatus, check_services};
use rfp_rag::{
    Config, DataFields, IngestMetadata, IngestReport, JsonExporter, LanceDbClient, OperationTimer,
    RagPipeline, SearchFilters, Services,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

const PREVIEW_CHARS: usize = 300;
const SLOW_ANALYSIS: Duration = Duration::from_secs(120);

#[derive(Parser)]
#[command(name = "rfp_rag")]
#[command(version)]
#[command(
    about = "Knowledge base search and RFP requirement extraction backed by LanceDB",
    long_about = None
)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Use process-local stores instead of LanceDB
    #[arg(long, action = ArgAction::SetTrue)]
    memory: bool,

    /// Write command results as JSON into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Write exported JSON on a single line
    #[arg(long, action = ArgAction::SetTrue, requires = "output")]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a document or every matching document under a directory
    Ingest {
        path: PathBuf,

        /// Title for a single file; defaults to the detected title
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        jurisdiction: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        doc_type: Option<String>,

        #[arg(long)]
        source_url: Option<String>,
    },

    /// Search the knowledge base
    Search {
        query: String,

        #[arg(short, long)]
        k: Option<usize>,

        #[arg(long)]
        jurisdiction: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        doc_type: Option<String>,
    },

    /// Extract requirement rows from an RFP
    Analyze {
        file: PathBuf,

        /// JSON object of known data fields
        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,
    },

    /// Draft a response to an RFP
    Draft {
        file: PathBuf,

        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        industry: Option<String>,
    },

    Stats,

    /// Probe stores, embedder and llm configuration
    Health,

    /// Check that every LanceDB table exists
    Verify,

    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    rfp_rag::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let exporter = cli
        .output
        .as_ref()
        .map(JsonExporter::new)
        .transpose()
        .context("Failed to create output directory")?
        .map(|e| if cli.compact { e.compact() } else { e });

    match cli.command {
        Commands::Ingest {
            path,
            title,
            jurisdiction,
            industry,
            doc_type,
            source_url,
        } => {
            let metadata = IngestMetadata {
                title: title.unwrap_or_default(),
                path: None,
                jurisdiction,
                industry,
                doc_type,
                source_url,
                description: None,
            };
            let pipeline = build_pipeline(&config, cli.memory).await?;
            cmd_ingest(&pipeline, &config, &path, metadata, cli.color).await?;
        }
        Commands::Search {
            query,
            k,
            jurisdiction,
            industry,
            doc_type,
        } => {
            let filters = SearchFilters {
                jurisdiction,
                industry,
                doc_type,
            };
            let pipeline = build_pipeline(&config, cli.memory).await?;
            cmd_search(&pipeline, exporter.as_ref(), &query, k, &filters).await?;
        }
        Commands::Analyze { file, fields } => {
            let pipeline = build_pipeline(&config, cli.memory).await?;
            cmd_analyze(&pipeline, exporter.as_ref(), &file, fields.as_deref()).await?;
        }
        Commands::Draft {
            file,
            fields,
            city,
            industry,
        } => {
            let pipeline = build_pipeline(&config, cli.memory).await?;
            cmd_draft(
                &pipeline,
                exporter.as_ref(),
                &file,
                fields.as_deref(),
                city.as_deref(),
                industry.as_deref(),
            )
            .await?;
        }
        Commands::Stats => {
            cmd_stats(&build_pipeline(&config, cli.memory).await?).await?;
        }
        Commands::Health => {
            cmd_health(&build_pipeline(&config, cli.memory).await?).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(&build_pipeline(&config, cli.memory).await?, confirm).await?;
        }
        Commands::Verify => {
            cmd_verify(&config).await?;
        }
    }

    Ok(())
}

async fn build_pipeline(config: &Config, memory: bool) -> Result<RagPipeline> {
    let services = if memory {
        info!("Using in-memory stores");
        Services::in_memory(config).context("Failed to create services")?
    } else {
        Services::from_config(config)
            .await
            .context("Failed to connect to LanceDB")?
    };
    Ok(RagPipeline::new(services, config))
}

async fn cmd_ingest(
    pipeline: &RagPipeline,
    config: &Config,
    path: &Path,
    metadata: IngestMetadata,
    colored: bool,
) -> Result<()> {
    if path.is_file() {
        let report = ingest_file(pipeline, path, &metadata).await?;
        let message = format!(
            "Stored {} as {} ({} chunks)",
            path.display(),
            report.doc_id,
            report.chunk_count
        );
        if report.indexed {
            println!("{}", format_success(&message));
        } else {
            println!(
                "{}",
                format_warning(&format!("{}, not indexed for search", message))
            );
        }
        return Ok(());
    }

    let timer = OperationTimer::new("directory ingest");
    let scanner = FileScanner::new(config.scan.clone());
    let files = scanner
        .scan_directory(path)
        .context("Failed to scan directory")?;

    if files.is_empty() {
        println!("{}", format_info("No matching documents found"));
        return Ok(());
    }

    let tracker = ProgressTracker::with_color(files.len(), colored);
    for file in &files {
        tracker.set_message(file.relative_path.clone());

        // a directory ingest titles each file from its own content
        let file_metadata = IngestMetadata {
            title: String::new(),
            ..metadata.clone()
        };

        match ingest_file(pipeline, &file.path, &file_metadata).await {
            Ok(report) => tracker.record_ingested(report.chunk_count, report.indexed, file.size),
            Err(e) => {
                error!("Failed to ingest {}: {:#}", file.relative_path, e);
                tracker.inc_files_failed();
            }
        }
    }
    tracker.finish();

    let stats = tracker.get_stats();
    timer.finish_with_count(stats.files_processed);

    println!(
        "{}",
        format_success(&format!(
            "Ingested {} of {} files ({} chunks, {:.1}% success)",
            stats.files_processed,
            files.len(),
            stats.chunks_created,
            stats.success_rate()
        ))
    );
    if stats.files_unindexed > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} files stored without search vectors",
                stats.files_unindexed
            ))
        );
    }

    Ok(())
}

async fn ingest_file(
    pipeline: &RagPipeline,
    path: &Path,
    metadata: &IngestMetadata,
) -> Result<IngestReport> {
    let text = read_text(path)?;
    let metadata = IngestMetadata {
        path: Some(path.display().to_string()),
        ..metadata.clone()
    };
    pipeline
        .ingest(&text, metadata)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))
}

async fn cmd_search(
    pipeline: &RagPipeline,
    exporter: Option<&JsonExporter>,
    query: &str,
    k: Option<usize>,
    filters: &SearchFilters,
) -> Result<()> {
    info!("Searching for: {}", query);

    let k = k.unwrap_or_else(|| pipeline.default_k());
    let response = pipeline
        .search(query, k, filters)
        .await
        .context("Search failed")?;

    if let Some(exporter) = exporter {
        exporter.export("search", None, &response)?;
    }

    if response.out_of_scope {
        println!(
            "{}",
            format_warning("Query is outside the economic development knowledge base")
        );
        return Ok(());
    }

    if response.hits.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Removing filters");
        println!("  - Checking that documents have been ingested");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", response.hits.len());
    println!("{}", "=".repeat(80));

    for (idx, hit) in response.hits.iter().enumerate() {
        println!("\n{}. {}", idx + 1, hit.format_summary(PREVIEW_CHARS));
        if !hit.jurisdiction.is_empty() || !hit.industry.is_empty() {
            println!(
                "   Jurisdiction: {} | Industry: {} | Type: {}",
                hit.jurisdiction, hit.industry, hit.doc_type
            );
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_analyze(
    pipeline: &RagPipeline,
    exporter: Option<&JsonExporter>,
    file: &Path,
    fields: Option<&Path>,
) -> Result<()> {
    let text = read_text(file)?;
    let fields = read_fields(fields)?;

    let timer = OperationTimer::new("rfp analysis");
    let outcome = pipeline
        .analyze_detailed(&text, &fields)
        .await
        .context("Analysis failed")?;
    timer.warn_if_slow(SLOW_ANALYSIS, "requirement extraction");
    timer.finish_with_count(outcome.result.requirements.len());

    for failure in &outcome.section_failures {
        println!(
            "{}",
            format_warning(&format!(
                "Section {} ({}) skipped after {} attempts: {}",
                failure.index, failure.header, failure.attempts, failure.error
            ))
        );
    }
    if outcome.deadline_hit {
        println!(
            "{}",
            format_warning("Deadline reached, remaining sections were not analyzed")
        );
    }

    if let Some(exporter) = exporter {
        exporter.export("analysis", Some(file), &outcome.result)?;
    }

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);

    let summary = &outcome.result.summary;
    println!(
        "{}",
        format_info(&format!(
            "{} requirements ({:?}): {} met, {} not met, {} unknown",
            outcome.result.requirements.len(),
            outcome.mode,
            summary.met,
            summary.not_met,
            summary.unknown
        ))
    );
    Ok(())
}

async fn cmd_draft(
    pipeline: &RagPipeline,
    exporter: Option<&JsonExporter>,
    file: &Path,
    fields: Option<&Path>,
    city: Option<&str>,
    industry: Option<&str>,
) -> Result<()> {
    let text = read_text(file)?;
    let fields = read_fields(fields)?;

    let draft = pipeline
        .draft(&text, &fields, city, industry)
        .await
        .context("Draft failed")?;

    if let Some(exporter) = exporter {
        exporter.export("draft", Some(file), &draft)?;
    }

    println!("{}", draft.to_markdown());
    Ok(())
}

async fn cmd_stats(pipeline: &RagPipeline) -> Result<()> {
    info!("Gathering statistics");

    let stats = pipeline.stats().await?;
    let vectors = pipeline.services().vector_store.count().await?;

    println!("Documents:       {}", stats.documents);
    println!("Chunks:          {}", stats.chunks);
    println!("Indexed chunks:  {}", stats.indexed_chunks);
    println!("Vectors:         {}", vectors);
    Ok(())
}

async fn cmd_health(pipeline: &RagPipeline) -> Result<()> {
    let services = pipeline.services();
    let report = check_services(
        services.documents.as_ref(),
        services.vector_store.as_ref(),
        services.embedder.as_ref(),
        services.llm.as_deref(),
    )
    .await;

    println!("{}", report.format());
    if report.overall_status == HealthStatus::Unhealthy {
        return Err(anyhow::anyhow!("One or more components are unhealthy"));
    }
    Ok(())
}

async fn cmd_verify(config: &Config) -> Result<()> {
    info!("Verifying database schema");

    let client = LanceDbClient::new(config.database.clone())
        .await
        .context("Failed to create LanceDB client")?;

    if !client.ping().await? {
        error!("Cannot connect to LanceDB");
        return Err(anyhow::anyhow!("Database connection failed"));
    }

    if SchemaManager::new(&client).verify_schema().await? {
        println!("{}", format_success("All tables exist"));
    } else {
        println!(
            "{}",
            format_warning("Some tables are missing; they are created on first ingest")
        );
    }
    Ok(())
}

async fn cmd_reset(pipeline: &RagPipeline, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_error("This will delete all data. Use --confirm to proceed")
        );
        return Ok(());
    }

    warn!("Resetting stores - all data will be lost");
    pipeline.reset().await.context("Failed to reset stores")?;
    println!("{}", format_success("Stores reset"));
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_fields(path: Option<&Path>) -> Result<DataFields> {
    let Some(path) = path else {
        return Ok(DataFields::new());
    };
    let raw = read_text(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} must hold a JSON object of data fields", path.display()))
}
