//! Overflow and recovery example
//!
//! Floods a tiny buffer in discard mode to show discard summaries, then
//! switches to blocking mode, and finally shows the dispatcher being replaced
//! after it is interrupted. Relay diagnostics are printed through
//! `tracing-subscriber`.
//!
//! Run with: cargo run --example overflow_and_recovery

use rust_log_relay::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A deliberately slow sink so the buffer fills up
struct SlowSink {
    inner: MemorySink,
}

impl Sink for SlowSink {
    fn append(&self, event: &LogEvent) -> Result<()> {
        thread::sleep(Duration::from_millis(2));
        self.inner.append(event)
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== Rust Log Relay - Overflow and Recovery Example ===\n");

    let slow = Arc::new(SlowSink {
        inner: MemorySink::unbounded("slow-inner"),
    });
    let relay = Arc::new(
        Relay::builder()
            .buffer_size(4)
            .overflow_policy(OverflowPolicy::Discard)
            .sink_handle(slow.clone())
            .build()?,
    );

    println!("1. Flooding a 4-slot buffer from 4 threads (discard mode):");
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let relay = Arc::clone(&relay);
            thread::spawn(move || {
                for i in 0..50 {
                    let level = if i % 10 == 0 { LogLevel::Error } else { LogLevel::Info };
                    relay.submit(LogRecord::new(format!("worker-{}", t), level, format!("job {}", i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    println!("\n2. Switching to blocking mode:");
    relay.set_blocking(true);
    for i in 0..20 {
        relay.submit(LogRecord::new("main", LogLevel::Info, format!("blocking {}", i)));
    }

    println!("\n3. Interrupting the dispatcher:");
    relay.interrupt_dispatcher();
    while relay.is_dispatcher_running() {
        thread::sleep(Duration::from_millis(1));
    }
    relay.submit(LogRecord::new("main", LogLevel::Warn, "delivered by a new dispatcher"));

    relay.close();

    let summaries: Vec<String> = slow
        .inner
        .messages()
        .into_iter()
        .filter(|m| m.starts_with("Discarded "))
        .collect();
    for summary in &summaries {
        println!("   {}", summary);
    }

    let metrics = relay.metrics();
    println!("\n=== Metrics ===");
    println!("   submitted:           {}", metrics.submitted());
    println!("   delivered:           {}", metrics.delivered());
    println!("   discarded:           {}", metrics.discarded());
    println!("   discard summaries:   {}", metrics.discard_summaries());
    println!("   dispatcher restarts: {}", metrics.dispatcher_restarts());
    println!("   drop rate:           {:.1}%", metrics.drop_rate());

    Ok(())
}
