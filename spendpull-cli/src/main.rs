//! spendpull CLI — pull USAspending transaction data into CSV files.
//!
//! Commands:
//! - `awards` — a fiscal year of award transactions, fetched in weekly chunks
//! - `personnel` — personnel-compensation transactions in a single pass
//!
//! Both commands print per-chunk/per-page progress while running and a
//! summary report when done.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use spendpull_core::api::{StdoutProgress, UsaSpendingClient};
use spendpull_core::frame::format_currency;
use spendpull_runner::{run_chunked_pull, run_single_pull, PullConfig, PullReport};

#[derive(Parser)]
#[command(
    name = "spendpull",
    about = "Pull USAspending transaction data into CSV summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull a fiscal year of award transactions in weekly chunks.
    Awards(PullArgs),
    /// Pull personnel-compensation transactions in a single pass.
    Personnel(PullArgs),
}

#[derive(Args)]
struct PullArgs {
    /// Path to a TOML pull config. Overrides the other options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Federal fiscal year (Oct 1 – Sep 30).
    #[arg(long, default_value_t = 2024)]
    fiscal_year: i32,

    /// Toptier awarding agency name, as USAspending spells it.
    #[arg(long, default_value = "Department of the Interior")]
    agency: String,

    /// Window start override (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Window end override (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Output directory root.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = UsaSpendingClient::new();

    match cli.command {
        Commands::Awards(args) => {
            let config = build_config(&args, |fy, agency| {
                PullConfig::awards_fiscal_year(fy, agency)
            })?;
            let report = run_chunked_pull(&client, &config, &StdoutProgress)?;
            print_awards_report(&report);
        }
        Commands::Personnel(args) => {
            let config = build_config(&args, |fy, agency| {
                PullConfig::personnel_fiscal_year(fy, agency)
            })?;
            let report = run_single_pull(&client, &config, &StdoutProgress)?;
            print_personnel_report(&report);
        }
    }

    Ok(())
}

fn build_config(
    args: &PullArgs,
    defaults: impl Fn(i32, String) -> PullConfig,
) -> Result<PullConfig> {
    let mut config = match &args.config {
        Some(path) => PullConfig::from_file(path)?,
        None => {
            let mut config = defaults(args.fiscal_year, args.agency.clone());
            config.output.dir = args.output_dir.clone();
            config
        }
    };

    if let Some(start) = &args.start {
        config.query.start_date = parse_date_arg(start)?.to_string();
    }
    if let Some(end) = &args.end {
        config.query.end_date = parse_date_arg(end)?.to_string();
    }

    Ok(config)
}

fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
}

fn print_awards_report(report: &PullReport) {
    print_report_header(report);

    if !report.monthly.is_empty() {
        println!();
        println!("--- Monthly Summary ---");
        for row in &report.monthly {
            println!("{}: {}", row.key, format_currency(row.sum));
        }
    }

    if !report.by_category.is_empty() {
        println!();
        println!("--- Spending by Award Category ---");
        for row in &report.by_category {
            println!(
                "{:<16} Count: {:>8}   Amount: {:>18}",
                row.key,
                row.count,
                format_currency(row.sum)
            );
        }
    }
}

fn print_personnel_report(report: &PullReport) {
    print_report_header(report);

    if !report.by_sub_agency.is_empty() {
        println!();
        println!("--- Spending by Sub-Agency ---");
        for row in &report.by_sub_agency {
            println!(
                "{:<50} Count: {:>8}   Amount: {:>18}",
                row.key,
                row.count,
                format_currency(row.sum)
            );
        }
    }

    if !report.by_award_type.is_empty() {
        println!();
        println!("--- Spending by Award Type ---");
        for row in &report.by_award_type {
            println!(
                "{:<50} Count: {:>8}   Amount: {:>18}",
                row.key,
                row.count,
                format_currency(row.sum)
            );
        }
    }
}

fn print_report_header(report: &PullReport) {
    println!();
    println!("=== Pull Summary ===");
    println!("Run:            {}", report.label);
    println!("Period:         {}", report.range);
    println!("Transactions:   {}", report.total_records);
    println!("Total amount:   {}", format_currency(report.total_amount));

    let truncated = report.chunks.iter().filter(|c| c.truncated).count();
    if truncated > 0 {
        println!("WARNING: {truncated} fetch(es) stopped early on an error; data is partial");
    }
    if let Some(path) = &report.output_file {
        println!("Output:         {}", path.display());
    }
}
