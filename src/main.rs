use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod grading;
mod join;
mod loader;
mod models;
mod output;
mod partition;
mod report;
mod scoring;

use config::GradingConfig;
use models::SectionGroup;

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Compute final course grades from roster, homework/exam and quiz CSVs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade every student and write one CSV per section
    Grade {
        /// Directory holding roster.csv, hw_exam_grades.csv and quiz_*_grades.csv
        #[arg(long)]
        data_dir: PathBuf,
        /// TOML grading config (defaults to the built-in course setup)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where section files go (defaults to the data directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Also write a markdown report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print per-section counts and letter distribution
    Summary {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the default grading config as TOML
    InitConfig {
        #[arg(long, default_value = "gradebook.toml")]
        out: PathBuf,
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            data_dir,
            config,
            out_dir,
            report,
        } => {
            let config = load_config(config.as_deref())?;
            let groups = grade_sections(&data_dir, &config)?;

            let out_dir = out_dir.unwrap_or_else(|| data_dir.clone());
            let paths = output::write_sections(&out_dir, &groups)
                .with_context(|| format!("failed to write section files to {}", out_dir.display()))?;

            for (group, path) in groups.iter().zip(&paths) {
                println!(
                    "In Section {} there are {} students saved to file {}.",
                    group.section,
                    group.len(),
                    path.display()
                );
            }

            if let Some(report_path) = report {
                let today = Utc::now().date_naive();
                let markdown = report::build_report(today, &config, &groups);
                std::fs::write(&report_path, markdown)
                    .with_context(|| format!("failed to write {}", report_path.display()))?;
                println!("Report written to {}.", report_path.display());
            }
        }
        Commands::Summary {
            data_dir,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let groups = grade_sections(&data_dir, &config)?;
            let summaries = report::section_summaries(&groups);

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Ok(());
            }

            if summaries.is_empty() {
                println!("No students matched across all inputs.");
                return Ok(());
            }

            for summary in &summaries {
                let letters = summary
                    .letters
                    .iter()
                    .rev()
                    .map(|(letter, count)| format!("{letter}={count}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "- Section {}: {} students ({})",
                    summary.section, summary.students, letters
                );
            }
        }
        Commands::InitConfig { out, force } => {
            if out.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", out.display());
            }
            let text = GradingConfig::default().to_toml()?;
            std::fs::write(&out, text).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Default config written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GradingConfig> {
    let Some(path) = path else {
        return Ok(GradingConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = GradingConfig::from_toml(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!(path = %path.display(), "Loaded grading config");
    Ok(config)
}

/// Loads and grades everything in memory before any output is produced.
fn grade_sections(data_dir: &Path, config: &GradingConfig) -> anyhow::Result<Vec<SectionGroup>> {
    let input = loader::load_data_dir(data_dir)
        .with_context(|| format!("failed to load grades from {}", data_dir.display()))?;

    let graded = grading::grade_students(&input.roster, &input.grades, &input.quizzes, config)
        .context("grading aborted")?;
    info!(
        roster = input.roster.len(),
        graded = graded.len(),
        "Graded students"
    );

    Ok(partition::partition_by_section(graded))
}
