//! Basic relay usage example
//!
//! Demonstrates a relay feeding the console sink, plain records, diagnostic
//! contexts and the key/value logger.
//!
//! Run with: cargo run --example basic_usage

use rust_log_relay::prelude::*;
use rust_log_relay::kv_info;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Relay - Basic Usage Example ===\n");

    let relay = Arc::new(
        Relay::builder()
            .buffer_size(64)
            .location_info(true)
            .sink(ConsoleSink::new())
            .build()?,
    );

    println!("1. Submitting records at different levels:");
    for level in LogLevel::ALL {
        relay.submit(LogRecord::new("basic", level, format!("This is a {} message", level)));
    }

    println!("\n2. Diagnostic contexts travel with the event:");
    {
        let _user = Mdc::put("user_id", 42);
        let _scope = Ndc::push("checkout");
        relay.submit(LogRecord::new("basic", LogLevel::Info, "Cart submitted"));
    }

    println!("\n3. Key/value logging:");
    let logger = KeyValueLogger::new("basic.kv", Arc::clone(&relay)).with_min_level(LogLevel::Info);
    logger.info("Service ready");
    logger
        .with("order_id", 1001)
        .and("amount", 25.5)
        .info("Order placed");
    kv_info!(logger, "Processed {} orders", 3);
    logger.debug("Filtered out by the minimum level");

    relay.close();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
