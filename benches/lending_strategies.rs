//! Benchmark suite for the replay strategies and contended issuance
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Inputs are generated into temporary files: every book is stocked, then
//! members cycle through issue and return commands spread over the books.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use library_lending_engine::cli::StrategyType;
use library_lending_engine::strategy::{create_strategy, BatchConfig};
use library_lending_engine::{IssueLedger, LendingPolicy, LogNotifier};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

const BOOKS: u32 = 64;

fn main() {
    divan::main();
}

fn ledger() -> Arc<IssueLedger> {
    Arc::new(IssueLedger::with_notifier(
        Arc::new(LogNotifier),
        LendingPolicy::default(),
    ))
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Command file with `rounds` issue/return pairs
fn command_file(rounds: u32) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "type,member,book,date,due,copies").unwrap();
    for book in 0..BOOKS {
        writeln!(file, "stock,,{},,,4", book).unwrap();
    }
    for round in 0..rounds {
        let member = round % 500;
        let book = round % BOOKS;
        let issued = start() + TimeDelta::hours(i64::from(round));
        let due = issued + TimeDelta::days(14);
        let returned = issued + TimeDelta::days(i64::from(round % 20));
        writeln!(
            file,
            "issue,{},{},{},{},",
            member,
            book,
            issued.to_rfc3339(),
            due.to_rfc3339()
        )
        .unwrap();
        writeln!(file, "return,{},{},{},,", member, book, returned.to_rfc3339()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[divan::bench(args = [1_000, 100_000])]
fn sync_strategy(bencher: divan::Bencher, rounds: u32) {
    let file = command_file(rounds);
    let strategy = create_strategy(StrategyType::Sync, None);

    bencher.bench_local(|| {
        strategy
            .process(file.path(), ledger())
            .expect("Processing failed")
    });
}

#[divan::bench(args = [1_000, 100_000])]
fn async_strategy(bencher: divan::Bencher, rounds: u32) {
    let file = command_file(rounds);
    let strategy = create_strategy(StrategyType::Async, Some(BatchConfig::default()));

    bencher.bench_local(|| {
        strategy
            .process(file.path(), ledger())
            .expect("Processing failed")
    });
}

/// Many threads issuing and returning copies of a single book
#[divan::bench(args = [2, 8])]
fn contended_issue_return(bencher: divan::Bencher, threads: u32) {
    bencher.bench_local(|| {
        let ledger = ledger();
        ledger.register_book(0, 2).unwrap();

        let handles: Vec<_> = (0..threads)
            .map(|member| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for round in 0..200 {
                        let issued = start() + TimeDelta::hours(round);
                        if ledger
                            .issue_book(member, 0, issued, issued + TimeDelta::days(7))
                            .is_ok()
                        {
                            let _ = ledger.return_book(member, 0, issued + TimeDelta::days(1));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
