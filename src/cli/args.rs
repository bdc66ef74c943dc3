use crate::core::{FinePolicy, LendingPolicy};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Replay library lending commands and report inventory and issue history
#[derive(Parser, Debug)]
#[command(name = "library-lending-engine")]
#[command(about = "Replay library lending commands against the lending ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing lending commands
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy used to replay the commands
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for in-order replay or 'async' for book-parallel batches"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Maximum number of books a member may hold at once
    #[arg(long = "borrow-limit", value_name = "COUNT", help = "Books a member may hold (default: 3)")]
    pub borrow_limit: Option<u32>,

    /// Fine per started day past the due date
    #[arg(
        long = "fine-per-day",
        value_name = "AMOUNT",
        conflicts_with = "flat_fine",
        help = "Fine per started late day (default: 10.00)"
    )]
    pub fine_per_day: Option<Decimal>,

    /// One-off fine for any late return
    #[arg(long = "flat-fine", value_name = "AMOUNT", help = "Flat fine for any late return")]
    pub flat_fine: Option<Decimal>,

    /// Retries after a version conflict before an operation fails
    #[arg(long = "max-retries", value_name = "COUNT", help = "Retries on contention (default: 8)")]
    pub max_retries: Option<u32>,

    /// Where to write the issue history CSV
    #[arg(long = "issues", value_name = "PATH", help = "Also write issue history CSV to PATH")]
    pub issues_output: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        default_value = "info",
        help = "Log filter when RUST_LOG is unset (e.g. 'warn', 'library_lending_engine=debug')"
    )]
    pub log_level: String,
}

/// Available processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values take the defaults; zero values fall back with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create a LendingPolicy from CLI arguments
    ///
    /// A negative fine amount falls back to the default fine policy with a
    /// warning.
    pub fn to_policy(&self) -> LendingPolicy {
        let default = LendingPolicy::default();

        let fine_policy = match (self.fine_per_day, self.flat_fine) {
            (Some(rate), _) => FinePolicy::PerDay(rate),
            (None, Some(amount)) => FinePolicy::Flat(amount),
            (None, None) => default.fine_policy,
        };
        let fine_policy = match fine_policy {
            FinePolicy::PerDay(amount) | FinePolicy::Flat(amount) if amount < Decimal::ZERO => {
                tracing::warn!(%amount, "negative fine amount, using default fine policy");
                default.fine_policy
            }
            valid => valid,
        };

        LendingPolicy::new(
            self.borrow_limit.unwrap_or(default.borrow_limit),
            fine_policy,
            self.max_retries.unwrap_or(default.max_retries),
        )
    }
}
