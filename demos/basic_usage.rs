//! Basic target usage example
//!
//! Demonstrates batching, message decoding, context capture and masking
//! with records written as JSON lines to stdout.
//!
//! Run with: cargo run --example basic_usage

use json_log_target::exporters::JsonLinesExporter;
use json_log_target::prelude::*;
use json_log_target::{error, info, warn};

fn main() -> Result<()> {
    println!("=== JSON Log Target - Basic Usage Example ===\n");

    let globals = GlobalContext::new();
    globals.set("env", "demo");

    // Flush every three records, hide passwords wherever they appear
    let mut target = JsonTarget::builder()
        .exporter(JsonLinesExporter::stdout())
        .export_interval(3)
        .log_vars(["env", "request"])
        .mask_vars(["message.password", "context.request.token"])
        .context_source(globals.clone())
        .build()?;

    println!("1. Plain and JSON messages (flushed at the third record):");
    info!(target, "app.http", "Server listening on port {}", 8080)?;
    info!(target, "app.auth", r#"{{"user": "ann", "password": "hunter2"}}"#)?;
    warn!(target, "app.cache", "Cache miss rate {}%", 40)?;

    println!("\n2. Context captured at flush time:");
    {
        let request = serde_json::json!({"id": "r-17", "token": "abc"});
        let _request = globals.scoped("request", request);
        error!(target, "app.db", "Query timed out after {} ms", 500)?;
        target.flush()?;
    }

    println!("\n3. Levels filtered before batching:");
    let mut quiet = JsonTarget::builder()
        .exporter(JsonLinesExporter::stdout())
        .min_level(LogLevel::Warn)
        .include_context(false)
        .build()?;
    info!(quiet, "app", "Info message (hidden)")?;
    warn!(quiet, "app", "Warning message (visible)")?;
    quiet.flush()?;

    println!("\n=== Example completed successfully! ===");
    println!(
        "Collected {} records, exported {}",
        target.metrics().collected(),
        target.metrics().exported()
    );

    Ok(())
}
