use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use ffq_nutrition::batch::run_batch;
use ffq_nutrition::frequency_resolver::FrequencyMapping;
use ffq_nutrition::nutrition_config::{EngineConfig, DEFAULT_MIN_SCORE};
use ffq_nutrition::report::{load_summaries, write_statistics_report};
use ffq_nutrition::survey_processor::SurveyProcessor;

#[derive(Parser)]
#[command(name = "ffq-nutrition")]
#[command(about = "Estimate nutrient intake from food-frequency questionnaires")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every survey and write per-survey results plus cohort statistics
    Calculate {
        /// Frequency template: v1, v2, or the path of a mapping JSON file
        #[arg(long)]
        template: String,

        #[arg(long, default_value = "data/reference/nutrition_data.json")]
        nutrition_data: PathBuf,

        #[arg(long, default_value = "data/reference/ref_man.json")]
        ref_man: PathBuf,

        #[arg(long, default_value = "data/reference/ref_woman.json")]
        ref_woman: PathBuf,

        #[arg(long, default_value = "data/surveys")]
        surveys_dir: PathBuf,

        #[arg(long, default_value = "data/results")]
        results_dir: PathBuf,

        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,

        /// Minimum fuzzy score (0-100) for a food match
        #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
        min_score: u8,
    },

    /// Recompute cohort statistics from previously written survey results
    Analyze {
        #[arg(long, default_value = "data/results")]
        results_dir: PathBuf,

        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Calculate {
            template,
            nutrition_data,
            ref_man,
            ref_woman,
            surveys_dir,
            results_dir,
            reports_dir,
            min_score,
        } => {
            let mapping = FrequencyMapping::select(&template)
                .with_context(|| format!("Invalid frequency template '{template}'"))?;
            info!(template = %mapping.name(), "Using frequency mapping");

            let config = EngineConfig::new(mapping).with_min_score(min_score);
            let processor = SurveyProcessor::load(config, &nutrition_data, &ref_man, &ref_woman)
                .context("Failed to load reference data")?;

            let report = run_batch(Arc::new(processor), &surveys_dir, &results_dir).await?;
            for (survey, reason) in &report.failed {
                warn!(survey = %survey, error = %reason, "Survey was skipped");
            }

            if report.cohort.is_empty() {
                warn!("No survey processed successfully; statistics not written");
            } else {
                write_report(&report.cohort.statistics(), &reports_dir)?;
            }
        }
        Commands::Analyze {
            results_dir,
            reports_dir,
        } => {
            let cohort = load_summaries(&results_dir)
                .with_context(|| format!("Failed to read results in {}", results_dir.display()))?;
            if cohort.is_empty() {
                warn!(dir = %results_dir.display(), "No survey results found to analyze");
            } else {
                write_report(&cohort.statistics(), &reports_dir)?;
            }
        }
    }

    Ok(())
}

fn write_report(stats: &ffq_nutrition::cohort::CohortStatistics, reports_dir: &Path) -> Result<()> {
    let path = write_statistics_report(stats, reports_dir)
        .with_context(|| format!("Failed to write statistics to {}", reports_dir.display()))?;
    info!(path = %path.display(), "Statistics report written");
    Ok(())
}
