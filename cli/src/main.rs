//! CLI driver (spec.md §6): not part of the core, a thin script runner
//! over `database::Database`.
//!
//! Styled after `benchmarking/src/main.rs`'s `clap`-derived args and
//! plain `println!` reporting — no subcommands, no progress bars, just
//! enough structure to run one of two fixed scenarios and exit non-zero
//! on failure.

mod board;

use board::{Board, BoardEncoder, RECORD_WIDTH};
use clap::Parser;
use database::{Database, PutOutcome, RecordEncoder};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Comma-separated column drop sequence, e.g. "3,4,1,2,5". With no
    /// sequence given, runs the built-in duplicate-rejection check.
    sequence: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.sequence {
        Some(seq) => run_scripted_sequence(&seq),
        None => run_duplicate_rejection_check(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), String>;

fn run_scripted_sequence(seq: &str) -> CliResult {
    println!("Sequence: {}", seq);
    let mut db = Database::<BoardEncoder, RECORD_WIDTH>::create("c4index_scripted")
        .map_err(|e| format!("failed to create database: {}", e))?;

    let mut current = Board::new();
    for token in seq.split(',') {
        let col: usize = token
            .trim()
            .parse()
            .map_err(|_| format!("not a column index: {:?}", token))?;

        let next = current
            .drop(col)
            .ok_or_else(|| format!("illegal drop in column {}", col))?;

        println!(">>>>> insert board with move in column {}", col);
        db.put(&next.to_record()).map_err(|e| format!("put failed: {}", e))?;

        let key = BoardEncoder::encode(&next.to_record());
        let retrieved = db
            .get(key)
            .map_err(|e| format!("get failed: {}", e))?
            .ok_or_else(|| format!("key {:#x} not found immediately after insert", key))?;
        if retrieved != next.to_record() {
            return Err(format!("round-trip mismatch for key {:#x}", key));
        }

        current = next;
    }

    println!("node count: {}, row count: {}", db.counters().creates, db.row_count());
    db.close().map_err(|e| format!("close failed: {}", e))
}

fn run_duplicate_rejection_check() -> CliResult {
    println!("Intentionally storing dupes (should be ignored)");

    let mut db = Database::<BoardEncoder, RECORD_WIDTH>::create("c4index_dupes")
        .map_err(|e| format!("failed to create database: {}", e))?;

    let drops = [3usize, 4, 1, 2, 5, 1, 4, 6, 3, 4];
    let mut current = Board::new();

    for &col in &drops {
        let next = current.drop(col).ok_or_else(|| format!("illegal drop in column {}", col))?;

        let outcome = db.put(&next.to_record()).map_err(|e| format!("put failed: {}", e))?;
        if outcome != PutOutcome::Inserted {
            return Err(format!("expected Inserted for a fresh board, got {:?}", outcome));
        }

        let dup = current.drop(col).ok_or_else(|| format!("illegal drop in column {}", col))?;
        println!(">>>>>> checking that the dupe board is not inserted");
        let dup_outcome = db.put(&dup.to_record()).map_err(|e| format!("put failed: {}", e))?;
        if dup_outcome != PutOutcome::Updated {
            return Err(format!("expected Updated for a duplicate board, got {:?}", dup_outcome));
        }

        current = next;
    }

    if db.row_count() != drops.len() as u64 {
        return Err(format!("expected {} rows, found {}", drops.len(), db.row_count()));
    }

    db.close().map_err(|e| format!("close failed: {}", e))
}
