//! # Lotto Sync
//!
//! One-shot batch job: load the stored history, fetch the rounds that are
//! missing, save once. Re-running it is the retry mechanism.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin lotto_sync                    # sync with Config.toml / defaults
//! cargo run --bin lotto_sync -- sync --mode sequential --dry-run
//! cargo run --bin lotto_sync -- check           # integrity report
//! cargo run --bin lotto_sync -- stats --top 10  # number statistics
//! cargo run --bin lotto_sync -- stats --combos --lucky 7
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use lotto_sync::{
    reconciler::{AttemptOutcome, Halt, SystemClock},
    settings::{Settings, SyncMode},
    sources,
    stats::{best_combinations, score_numbers},
    store::Finding,
    DatasetStore, Reconciler, Round,
};

#[derive(Parser, Debug)]
#[command(name = "lotto_sync", version, about = "Append newly drawn lottery rounds to a local JSON history")]
struct Cli {
    /// Config file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file, overrides `dataset.path`
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch missing rounds and save them (default)
    Sync {
        #[arg(long, value_enum)]
        mode: Option<SyncMode>,
        /// Fetch and print, but leave the dataset file untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Report integrity problems in the stored dataset
    Check,
    /// Rank numbers by frequency, recent appearances and transitions
    Stats {
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Also list the best balanced 6-number combinations
        #[arg(long)]
        combos: bool,
        /// Number every combination must contain
        #[arg(long, requires = "combos", value_parser = clap::value_parser!(u8).range(1..=45))]
        lucky: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(path) = cli.dataset {
        settings.dataset.path = path;
    }
    let store = DatasetStore::new(settings.dataset.path.clone());

    match cli.command.unwrap_or(Command::Sync { mode: None, dry_run: false }) {
        Command::Sync { mode, dry_run } => {
            let mode = mode.unwrap_or(settings.sync.mode);
            run_sync(&settings, &store, mode, dry_run).await
        }
        Command::Check => run_check(&settings, &store),
        Command::Stats { top, combos, lucky } => run_stats(&store, top, combos, lucky),
    }
}

async fn run_sync(settings: &Settings, store: &DatasetStore, mode: SyncMode, dry_run: bool) -> Result<()> {
    // Fatal before any request is made.
    let mut dataset = store.load()?;

    let calendar = settings.calendar();
    let sources = sources::from_settings(&settings.sources, calendar)?;
    let reconciler = Reconciler::new(sources, calendar, Arc::new(SystemClock)).with_mode(mode);

    println!(
        "🔍 Latest stored round {}, expected round {}",
        dataset.cursor(),
        reconciler.expected_round()
    );

    let report = reconciler.reconcile(dataset.cursor()).await;

    for attempt in &report.attempts {
        match &attempt.outcome {
            AttemptOutcome::Fetched(round) => {
                println!("   ✅ {} via {}: round {}", attempt.target, attempt.source, round)
            }
            AttemptOutcome::Failed { reason, .. } => {
                println!("   ❌ {} via {}: {}", attempt.target, attempt.source, reason)
            }
        }
    }
    for record in report.records.iter().rev() {
        println!("{}", record);
    }

    if !report.gaps.is_empty() {
        println!("{} rounds skipped, will be retried next run: {:?}", "⚠️".yellow(), report.gaps);
    }
    if let Some(Halt::Transport { round, reason }) = &report.halt {
        println!(
            "{}",
            format!("⚠️ Stopped at round {} on a network failure ({}); newer rounds may exist", round, reason)
                .yellow()
        );
    }
    if let Some(Halt::NoRoundSource) = &report.halt {
        println!("{}", "⚠️ No configured source can fetch rounds by number".yellow());
    }

    if report.is_empty() {
        println!("{}", "📭 No new data".bold());
        return Ok(());
    }

    let added = dataset.merge(report.records, Local::now().date_naive());
    if dry_run {
        println!("{}", format!("🧪 Dry run: {} new draws not saved", added).bold());
        return Ok(());
    }

    store.save(&dataset)?;
    println!(
        "{}",
        format!("✅ {} new draws saved (latest round {})", added, dataset.latest_round)
            .green()
            .bold()
    );
    Ok(())
}

fn run_check(settings: &Settings, store: &DatasetStore) -> Result<()> {
    let dataset = store.load()?;
    let findings = dataset.check(&settings.calendar());

    if findings.is_empty() {
        println!(
            "{}",
            format!("✅ {} draws, latest round {}, no problems", dataset.data.len(), dataset.latest_round).green()
        );
        return Ok(());
    }

    for finding in &findings {
        match finding {
            Finding::MissingRounds(ranges) => {
                let runs: Vec<String> = ranges.iter().map(format_run).collect();
                println!("❌ {} missing rounds: {}", Finding::missing_count(ranges), runs.join(", "))
            }
            Finding::DateMismatch { round, stored, expected } => {
                println!("❌ round {} is dated {}, calendar says {}", round, stored, expected)
            }
            Finding::RoundOutOfCalendar(round) => println!("❌ round {} is beyond any datable draw", round),
            Finding::UnknownBonus(rounds) => println!("⚠️ {} draws without bonus: {:?}", rounds.len(), rounds),
        }
    }

    let problems = findings.iter().filter(|f| f.is_problem()).count();
    if problems == 0 {
        println!("{}", format!("✅ {} draws, latest round {}, usable", dataset.data.len(), dataset.latest_round).green());
        return Ok(());
    }
    anyhow::bail!("{} problems found in {}", problems, store.path().display())
}

fn format_run(run: &RangeInclusive<Round>) -> String {
    if run.start() == run.end() {
        run.start().to_string()
    } else {
        format!("{}-{}", run.start(), run.end())
    }
}

fn run_stats(store: &DatasetStore, top: usize, combos: bool, lucky: Option<u8>) -> Result<()> {
    let dataset = store.load()?;
    let scores = score_numbers(&dataset.data);
    if scores.is_empty() {
        println!("{}", "📭 Dataset is empty".bold());
        return Ok(());
    }

    println!("📊 {} draws up to round {}", dataset.data.len(), dataset.latest_round);
    println!("  #  num  total  freq  recent  trans");
    for (rank, s) in scores.iter().take(top).enumerate() {
        println!(
            "{:>3}  {:>3}  {:>5.1}  {:>4}  {:>6}  {:>5}",
            rank + 1,
            s.number,
            s.total,
            s.appearances,
            s.recent_appearances,
            s.transitions
        );
    }

    if combos {
        println!();
        match lucky {
            Some(n) => println!("🎯 Best combinations with {}", n),
            None => println!("🎯 Best combinations"),
        }
        let best = best_combinations(&scores, lucky);
        if best.is_empty() {
            println!("{}", "📭 No balanced combination found".bold());
        }
        for (rank, combo) in best.iter().enumerate() {
            let numbers: Vec<String> = combo.numbers.iter().map(|n| format!("{:>2}", n)).collect();
            println!(
                "{:>3}  {}  score {:>5.1}  sum {:>3}  odd:even {}",
                rank + 1,
                numbers.join(" "),
                combo.score,
                combo.sum(),
                combo.odd_even()
            );
        }
    }
    Ok(())
}
