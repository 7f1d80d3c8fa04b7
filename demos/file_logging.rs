//! File logging example
//!
//! Demonstrates writing batches to a rotating JSON-lines file shared by
//! several threads.
//!
//! Run with: cargo run --example file_logging

use json_log_target::exporters::{JsonFileExporter, RotationPolicy};
use json_log_target::prelude::*;
use json_log_target::record;
use std::thread;

fn main() -> Result<()> {
    println!("=== JSON Log Target - File Logging Example ===\n");

    let policy = RotationPolicy::new()
        .with_max_file_size(64 * 1024)
        .with_max_log_files(3)
        .with_compression(true);

    let target: SharedTarget = JsonTarget::builder()
        .exporter(JsonFileExporter::with_policy("application.json.log", policy)?)
        .export_interval(10)
        .build()?
        .into();

    println!("1. Logging from four worker threads:");
    let workers: Vec<_> = (1..=4)
        .map(|worker| {
            let target = target.clone();
            thread::spawn(move || -> Result<()> {
                for item in 1..=5 {
                    let record = record!(
                        LogLevel::Info,
                        "app.worker",
                        "Worker {} processed item {}/5",
                        worker,
                        item
                    );
                    target.collect(vec![record], false)?;
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker
            .join()
            .map_err(|_| TargetError::other("worker thread panicked"))??;
    }

    println!("\n2. Flushing the remainder:");
    target.collect(
        vec![record!(LogLevel::Info, "app", "All operations completed")],
        true,
    )?;
    println!("   exported {} records", target.metrics().exported());

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.json.log' for the full log output");

    Ok(())
}
