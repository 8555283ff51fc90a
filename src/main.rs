// SPDX-License-Identifier: PMPL-1.0-or-later

//! nessus-report: turn Nessus v2 scan exports into sheet-ready datasets
//!
//! Parses a `.nessus` file, classifies findings by severity, aggregates them
//! per host and writes the dataset bundle consumed by the spreadsheet
//! renderer.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use nessus_report::pipeline;
use nessus_report::profile::ReportProfile;
use nessus_report::report::{self, ReportBundle, ReportOutputFormat};
use nessus_report::storage;
use nessus_report::sweep::{self, SweepConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "nessus-report")]
#[command(version)]
#[command(about = "Parse Nessus XML v2 exports into report datasets")]
#[command(long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report datasets for one scan export
    Report {
        /// Path to the .nessus XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (default: nessus_report_YYYYMMDDHHMMSS.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bundle format (default: from the output extension, else json)
        #[arg(short, long, value_enum)]
        format: Option<ReportOutputFormat>,

        /// Report profile (.json, .yaml)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Skip the console summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Build datasets for every .nessus file under a directory
    Sweep {
        /// Directory searched recursively
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Directory receiving one bundle per export
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Bundle format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ReportOutputFormat,

        /// Report profile (.json, .yaml)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Write the sweep summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Skip the console summary
        #[arg(short, long)]
        quiet: bool,
    },
}

fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("nessus_report=warn"),
        1 => EnvFilter::new("nessus_report=debug"),
        _ => EnvFilter::new("nessus_report=trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Report {
            file,
            output,
            format,
            profile,
            quiet,
        } => {
            let profile = ReportProfile::resolve(profile.as_deref())?;
            let format = format
                .or_else(|| output.as_deref().and_then(ReportOutputFormat::from_path))
                .unwrap_or_default();
            println!("Parsing {}...", file.display());

            let outcome = pipeline::run(&file, &profile)
                .with_context(|| format!("building report for {}", file.display()))?;

            println!(
                "Found {} hosts, {} vulnerabilities, {} compliance checks.",
                outcome.report.summary.total_hosts,
                outcome.report.summary.total_findings,
                outcome.report.summary.total_compliance
            );
            if !quiet {
                report::print_report(&outcome.report);
            }

            let output_path = output.unwrap_or_else(|| {
                storage::default_output_name(format, chrono::Local::now())
            });
            let bundle = ReportBundle::new(outcome.datasets);
            storage::write_bundle(&bundle, &output_path, format)?;
            println!("Report generated: {}", output_path.display());
        }

        Commands::Sweep {
            directory,
            output_dir,
            format,
            profile,
            summary,
            quiet,
        } => {
            let config = SweepConfig {
                directory,
                output_dir,
                format,
                profile: ReportProfile::resolve(profile.as_deref())?,
            };

            let report = sweep::run(&config)?;
            sweep::print_summary(&report, quiet);

            if let Some(path) = summary {
                sweep::write_report(&report, &path)?;
                println!("Sweep summary saved to: {}", path.display());
            }

            if report.files_failed > 0 {
                anyhow::bail!(
                    "{} of {} exports failed",
                    report.files_failed,
                    report.files_processed
                );
            }
        }
    }

    Ok(())
}
