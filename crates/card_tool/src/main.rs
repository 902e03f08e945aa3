//! Card Tool CLI
//!
//! Card master validation, statistics, draw simulation, jackpot odds table.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "card_tool")]
#[command(about = "Inspect the card master and reward odds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Check a card master file; exits non-zero when issues are found
    Validate {
        /// Card master CSV (defaults to CARD_MASTER_PATH or data/card_master.csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print card counts per category and rarity
    Stats {
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Simulate reward draws
    Simulate {
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long, default_value = "10000")]
        draws: u32,

        /// Use the boosted weights of packaged game submissions
        #[arg(long, default_value = "false")]
        boost: bool,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print jackpot win probability per loss streak
    Probability {
        #[arg(long, default_value = "25")]
        max: u32,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { csv } => {
            let path = resolve(csv);
            println!("🔍 Validating {}", path.display());
            let report = card_tool::inspect_catalog(&path)?;
            print_report(&report);

            if !report.is_clean() {
                anyhow::bail!("❌ {} issue(s) found", report.issues.len());
            }
            println!("\n✅ Card master is valid");
        }

        Commands::Stats { csv, json } => {
            let report = card_tool::inspect_catalog(&resolve(csv))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Simulate { csv, draws, boost, seed } => {
            let catalog = card_tool::load_catalog(&resolve(csv))?;
            let summary = card_tool::simulate_draws(&catalog, draws, boost, seed);

            println!("🎲 {} draws (boost: {}, seed: {})", summary.draws, summary.boost, summary.seed);
            println!("   Character: {}", summary.characters);
            println!("   Effect:    {}", summary.effects);
            for (rarity, count) in &summary.by_rarity {
                println!("   {:<4} {:>8}  {:.2}%", rarity, count, *count as f64 * 100.0 / summary.draws.max(1) as f64);
            }
            if summary.empty > 0 {
                println!("   Empty draws: {}", summary.empty);
            }
        }

        Commands::Probability { max } => {
            println!("losses  probability");
            for (losses, p) in card_tool::probability_table(max) {
                println!("{:>6}  {:.3}", losses, p);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn resolve(csv: Option<PathBuf>) -> PathBuf {
    csv.unwrap_or_else(reward_core::config::resolve_catalog_path)
}

#[cfg(feature = "cli")]
fn print_report(report: &card_tool::CatalogReport) {
    println!("   Cards:            {}", report.total);
    println!("   Characters:       {}", report.characters);
    for (rarity, count) in &report.character_rarity {
        println!("     {:<4} {}", rarity, count);
    }
    println!("   Effects:          {}", report.effects);
    println!("   Reserved effects: {}", report.reserved_effects);
    println!("   Rows read:        {}", report.stats.rows_read);
    if !report.issues.is_empty() {
        println!("\n⚠️  Issues:");
        for issue in &report.issues {
            println!("   - {}", issue);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("card_tool CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
