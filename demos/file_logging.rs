//! File logging example
//!
//! Demonstrates one relay fanning out to the console, a text file and a
//! collector-shaped JSON lines file.
//!
//! Run with: cargo run --example file_logging

use rust_log_relay::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Relay - File Logging Example ===\n");

    let relay = Arc::new(
        Relay::builder()
            .location_info(true)
            .sink(ConsoleSink::new())
            .sink(FileSink::new("application.log")?)
            .sink(
                JsonSink::file("application.jsonl")?
                    .with_application("file-logging-demo")
                    .with_environment("local"),
            )
            .build()?,
    );
    let logger = KeyValueLogger::new("demo.files", Arc::clone(&relay));

    println!("1. Logging to console, text file and JSON file:");
    logger.info("Application started");
    logger.with("path", "config.toml").debug("Loading configuration");
    logger.warn("Using default settings for some options");

    println!("\n2. Logging an error with its cause chain:");
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "plugin.so not found");
    logger.with("plugin", "metrics").error_with_error("Failed to load optional plugin", &err);

    for i in 1..=5 {
        logger.with("item", i).and("total", 5).info("Processing item");
    }

    relay.close();

    println!("\n=== Example completed! ===");
    println!("Check 'application.log' and 'application.jsonl' for the output");

    Ok(())
}
