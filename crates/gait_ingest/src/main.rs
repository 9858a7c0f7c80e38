//! gait_ingest CLI
//!
//! CSV gait rows (+ YAML range spec / config) → JSON analysis report

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "gait_ingest")]
#[command(about = "Analyze phase-normalized gait cycles from CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run patterns, symmetry, outliers and range validation
    Analyze {
        /// Input CSV file path
        #[arg(long)]
        data: PathBuf,

        /// Range spec YAML (task → feature → phase bins)
        #[arg(long)]
        ranges: Option<PathBuf>,

        /// Analysis config YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated feature names (default: every feature column)
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Output JSON file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List subjects, tasks, features and cycle completeness
    Catalog {
        /// Input CSV file path
        #[arg(long)]
        data: PathBuf,

        /// Phase points per cycle
        #[arg(long, default_value_t = gait_core::PHASE_POINTS)]
        phase_points: usize,

        /// Output JSON file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the JSON schema of the dataset summary
    Schema {
        /// Output JSON file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            data,
            ranges,
            config,
            features,
            out,
        } => {
            eprintln!("🔬 Analyzing gait cycles...");
            eprintln!("   Data:   {}", data.display());
            if let Some(ranges) = &ranges {
                eprintln!("   Ranges: {}", ranges.display());
            }
            if let Some(config) = &config {
                eprintln!("   Config: {}", config.display());
            }

            let options = gait_ingest::AnalyzeOptions {
                ranges: ranges.as_deref(),
                config: config.as_deref(),
                features,
            };
            let report = gait_ingest::analyze_file(&data, &options)?;

            print_summary(&report);
            emit(out.as_ref(), &report)?;
        }

        Commands::Catalog {
            data,
            phase_points,
            out,
        } => {
            let catalog = gait_ingest::catalog_file(&data, phase_points)?;
            eprintln!(
                "📋 {} subjects, {} tasks, {} features, {} complete / {} incomplete cycles",
                catalog.subjects.len(),
                catalog.tasks.len(),
                catalog.features.len(),
                catalog.total_complete_cycles(),
                catalog.total_incomplete_cycles()
            );
            emit(out.as_ref(), &catalog)?;
        }

        Commands::Schema { out } => {
            emit(out.as_ref(), &gait_core::DatasetSummary::json_schema())?;
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(report: &gait_ingest::AnalysisReport) {
    let summary = &report.summary;
    eprintln!("\n✅ Analysis complete");
    eprintln!(
        "   Rows:        {} parsed, {} skipped, {} bad cells",
        report.parse.parsed, report.parse.skipped_rows, report.parse.bad_cells
    );
    eprintln!("   Groups:      {}", summary.groups.len());
    for (task, t) in &summary.tasks {
        eprintln!(
            "   {:<12} {} strides, {} evaluated, pass rate {}",
            task,
            t.total_strides,
            t.evaluated_strides,
            format_rate(&t.pass_rate)
        );
    }
    eprintln!("   Overall:     {}", format_rate(&summary.overall.pass_rate));
    if !summary.failures.is_empty() {
        eprintln!("⚠️  {} group(s) failed:", summary.failures.len());
        for f in &summary.failures {
            eprintln!("   {}/{}: {}", f.subject, f.task, f.error);
        }
    }
}

#[cfg(feature = "cli")]
fn format_rate(rate: &gait_core::PassRate) -> String {
    match rate {
        gait_core::PassRate::Defined(v) => format!("{}%", v),
        gait_core::PassRate::Unavailable(gait_core::RateStatus::Undefined) => "undefined".into(),
        gait_core::PassRate::Unavailable(gait_core::RateStatus::NoValidation) => {
            "no validation".into()
        }
    }
}

#[cfg(feature = "cli")]
fn emit<T: serde::Serialize>(out: Option<&PathBuf>, value: &T) -> Result<()> {
    match out {
        Some(path) => {
            gait_ingest::write_json(path, value)?;
            eprintln!("\n📄 Written to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("gait_ingest CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
