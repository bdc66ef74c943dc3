//! Library Lending Engine CLI
//!
//! Replays a CSV of lending commands against the issue ledger and prints the
//! final inventory.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > books.csv
//! cargo run -- --strategy sync --borrow-limit 5 commands.csv > books.csv
//! cargo run -- --flat-fine 25 --issues issues.csv commands.csv > books.csv
//! RUST_LOG=library_lending_engine=debug cargo run -- commands.csv > books.csv
//! ```
//!
//! Logs go to stderr so stdout stays valid CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable)

use library_lending_engine::cli;
use library_lending_engine::core::{IssueLedger, LogNotifier};
use library_lending_engine::io::{write_books_csv, write_issues_csv};
use library_lending_engine::strategy;
use library_lending_engine::types::IssueFilter;
use std::fs::File;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let args = cli::parse_args();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.log_level.as_str().into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), String> {
    let policy = args.to_policy();
    tracing::debug!(?policy, strategy = ?args.strategy, "starting replay");

    let ledger = Arc::new(IssueLedger::with_notifier(Arc::new(LogNotifier), policy));

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };
    strategy.process(&args.input_file, Arc::clone(&ledger))?;

    let overview = ledger.overview();
    tracing::info!(
        titles = overview.titles,
        total_copies = overview.total_copies,
        issued_copies = overview.issued_copies,
        total_borrows = overview.total_borrows,
        returned_copies = overview.returned_copies(),
        "circulation overview"
    );

    write_books_csv(&ledger.books(), &mut std::io::stdout().lock())?;

    if let Some(path) = &args.issues_output {
        let mut file = File::create(path)
            .map_err(|e| format!("Failed to create file '{}': {}", path.display(), e))?;
        write_issues_csv(&ledger.list_issues(&IssueFilter::default()), &mut file)?;
    }

    Ok(())
}
