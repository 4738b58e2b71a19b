//! @ai:module:intent CLI for the EGRA/EGMA zero-score dashboard
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use egra_dashboard::{
    config::DashboardConfig,
    i18n::{catalog::TASK_NAMES, Catalog, Locale, LocalizationStore},
    metrics::{AggregationResult, AggregatorTrait, ExecutiveSummary, ZeroScoreAggregator},
    narrative::{
        GeminiClient, MockTextGenerator, NarrativeOutcome, NarrativePipeline, RetryPolicy,
    },
    report::{GeneratedReports, ReportGenerator},
    table::{loader::write_template, tasks::is_task, AssessmentTable, TableLoader, TableLoaderTrait},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DRY_RUN_NARRATIVE: &str = "## Pedagogical Interpretation\n\
**Summary:**\n\
Dry run: no request was sent to the text-generation service.\n\
- Review the results table for tasks above 20% zero scores.";

#[derive(Parser)]
#[command(name = "egra-dashboard")]
#[command(about = "Zero-score analysis and reporting for EGRA/EGMA assessments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze zero scores and generate reports
    Analyze {
        /// Assessment data (CSV with a header row)
        #[arg(short, long)]
        input: PathBuf,

        /// Task columns to analyze (comma-separated); defaults to the first three EGRA and first three EGMA tasks present
        #[arg(long)]
        tasks: Option<String>,

        /// Report language (en, fr, ar)
        #[arg(short, long)]
        locale: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the narrative request and use rule-based recommendations
        #[arg(long)]
        no_ai: bool,

        /// Use a canned narrative instead of calling the service
        #[arg(long)]
        dry_run: bool,

        /// Field delimiter of the input file
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// List assessment tasks and whether a data file provides them
    Tasks {
        /// Data file to inspect
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Language for display names
        #[arg(short, long, default_value = "en")]
        locale: String,
    },

    /// Write an empty data template with the expected columns
    Template {
        #[arg(short, long, default_value = "template.csv")]
        output: PathBuf,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "dashboard.toml")]
        output: PathBuf,
    },
}

struct AnalyzeArgs {
    input: PathBuf,
    tasks: Option<String>,
    locale: Option<String>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    no_ai: bool,
    dry_run: bool,
    delimiter: char,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("egra_dashboard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            tasks,
            locale,
            config,
            output,
            no_ai,
            dry_run,
            delimiter,
        } => run_analysis(AnalyzeArgs {
            input,
            tasks,
            locale,
            config,
            output,
            no_ai,
            dry_run,
            delimiter,
        })
        .await,
        Commands::Tasks { input, locale } => list_tasks(input, &locale),
        Commands::Template { output } => create_template(output),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Load data, aggregate, request a narrative and write every report
/// @ai:effects fs:read, fs:write, network
async fn run_analysis(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;
    if let Some(locale) = args.locale {
        config.report.locale = locale;
    }
    let locale = Locale::from_code(&config.report.locale);
    let output_dir = args.output.unwrap_or_else(|| config.report.output_dir.clone());

    let mut catalog = Catalog::builtin()?;
    if let Some(template) = config.load_prompt_override()? {
        catalog = catalog.with_prompt_override(template);
    }
    let store: Arc<dyn LocalizationStore> = Arc::new(catalog);

    if !args.delimiter.is_ascii() {
        anyhow::bail!("Delimiter must be a single ASCII character");
    }
    let loader = TableLoader::new().with_delimiter(args.delimiter as u8);
    let table = loader
        .load_path(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    tracing::info!(
        "Loaded {} records with {} columns",
        table.row_count(),
        table.columns().len()
    );

    let selection = select_tasks(&table, args.tasks.as_deref());
    let aggregator = ZeroScoreAggregator::new(store.get_mapping(locale, TASK_NAMES));

    let Some(result) = aggregator.aggregate(&table, &selection).into_result() else {
        tracing::warn!("No assessment task selected; nothing to analyze");
        return Ok(());
    };
    if result.is_empty() {
        tracing::warn!("None of the selected tasks has any recorded score");
        return Ok(());
    }

    let policy = RetryPolicy::from(&config.retry);
    let outcome = if args.no_ai {
        NarrativeOutcome::Unavailable {
            reason: "disabled with --no-ai".to_string(),
        }
    } else if args.dry_run {
        tracing::info!("Dry run: using canned narrative");
        let client = MockTextGenerator::new(DRY_RUN_NARRATIVE.to_string());
        NarrativePipeline::new(Some(client), store.clone(), policy)
            .request_narrative(&result, locale)
            .await
    } else {
        let client = GeminiClient::from_env(&config.api, Path::new("."));
        if client.is_none() {
            tracing::warn!(
                "No usable {} found; using rule-based recommendations",
                config.api.api_key_env
            );
        }
        NarrativePipeline::new(client, store.clone(), policy)
            .request_narrative(&result, locale)
            .await
    };

    let generator = ReportGenerator::new(store, config.credits.clone());
    let reports = generator.generate_all(
        &result,
        &outcome,
        locale,
        chrono::Local::now().naive_local(),
        &output_dir,
    )?;

    print_summary(&result, &outcome, &reports);
    Ok(())
}

/// @ai:intent Resolve the task selection from the CLI list or the table's columns
/// @ai:effects pure
fn select_tasks(table: &AssessmentTable, requested: Option<&str>) -> Vec<String> {
    let Some(requested) = requested else {
        return table.default_selection();
    };

    requested
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| {
            let known = is_task(id);
            if !known {
                tracing::warn!("Ignoring unknown task '{}'", id);
            }
            known
        })
        .map(str::to_string)
        .collect()
}

/// @ai:intent List tasks with localized names
/// @ai:effects fs:read
fn list_tasks(input: Option<PathBuf>, locale: &str) -> Result<()> {
    let locale = Locale::from_code(locale);
    let catalog = Catalog::builtin()?;
    let names = catalog.get_mapping(locale, TASK_NAMES);

    let table = match input {
        Some(path) => Some(
            TableLoader::new()
                .load_path(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
        ),
        None => None,
    };

    println!("{:<16} {:<36} {:<8}", "ID", "Name", "Present");
    println!("{}", "-".repeat(62));

    for id in egra_dashboard::table::EGRA_TASKS
        .iter()
        .chain(egra_dashboard::table::EGMA_TASKS.iter())
    {
        let present = match &table {
            Some(t) if t.has_column(id) => "yes",
            Some(_) => "no",
            None => "-",
        };
        let name = names.get(*id).map(String::as_str).unwrap_or(*id);
        println!("{:<16} {:<36} {:<8}", id, name, present);
    }

    Ok(())
}

/// @ai:intent Write the data template
/// @ai:effects fs:write
fn create_template(output: PathBuf) -> Result<()> {
    write_template(&output)?;
    println!("Template saved to {}", output.display());
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = DashboardConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::load(&p),
        None => {
            let default_path = PathBuf::from("dashboard.toml");

            if default_path.exists() {
                DashboardConfig::load(&default_path)
            } else {
                Ok(DashboardConfig::default())
            }
        }
    }
}

/// @ai:intent Print summary to console
/// @ai:effects io
fn print_summary(result: &AggregationResult, outcome: &NarrativeOutcome, reports: &GeneratedReports) {
    let summary = ExecutiveSummary::from_result(result);

    println!();
    println!("{:<36} {:>8} {:>8} {:>9}", "Task", "Zeros", "Total", "Percent");
    println!("{}", "-".repeat(64));
    for agg in &result.aggregates {
        println!(
            "{:<36} {:>8} {:>8} {:>8.2}%",
            agg.display_name, agg.zero_count, agg.total_count, agg.zero_percentage
        );
    }
    println!();
    println!("Average zero percentage: {:.1}%", summary.avg_percentage);
    println!(
        "Critical: {}  Concerning: {}",
        summary.critical_count, summary.concerning_count
    );
    if !result.skipped.is_empty() {
        println!("Skipped (no scores): {}", result.skipped.join(", "));
    }

    let narrative = match outcome {
        NarrativeOutcome::Success { .. } => "received".to_string(),
        NarrativeOutcome::Unavailable { reason } => format!("unavailable ({})", reason),
        NarrativeOutcome::QuotaExceeded => "quota exceeded".to_string(),
        NarrativeOutcome::Failed { message } => format!("failed ({})", message),
    };
    println!("Narrative: {}", narrative);

    println!();
    println!("Word report:     {}", reports.docx.display());
    println!("Markdown report: {}", reports.markdown.display());
    println!("JSON results:    {}", reports.json.display());
    if let Some(chart) = &reports.chart {
        println!("Chart:           {}", chart.display());
    }
}
