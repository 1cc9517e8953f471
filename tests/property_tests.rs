//! Property-based tests for rust_log_relay using proptest

use proptest::prelude::*;
use rust_log_relay::prelude::*;
use rust_log_relay::{DiscardSummarizer, DEFAULT_BUFFER_SIZE};
use std::collections::BTreeMap;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        assert_eq!(level, parsed);
    }

    /// Test that LogLevel ordering agrees with severity rank
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        assert_eq!(level1 < level2, level1.rank() < level2.rank());
        assert_eq!(level1 == level2, level1.rank() == level2.rank());
    }

    /// Test that parsing ignores case and surrounding whitespace
    #[test]
    fn test_log_level_parse_is_lenient(level in any_level(), lower in any::<bool>()) {
        let text = if lower {
            format!("  {}  ", level.to_str().to_lowercase())
        } else {
            level.to_str().to_string()
        };
        assert_eq!(text.parse::<LogLevel>().unwrap(), level);
    }

    /// Test that FromStr for LogLevel handles invalid input gracefully
    #[test]
    fn test_log_level_invalid_parse(invalid_str in "[^TDIWEFtdiwefor]+") {
        let result: std::result::Result<LogLevel, String> = invalid_str.parse();
        if !invalid_str.trim().is_empty() {
            assert!(result.is_err(),
                    "Expected parse error for '{}', got: {:?}", invalid_str, result);
        }
    }
}

// ============================================================================
// LogEvent Message Sanitization Tests (Security Critical!)
// ============================================================================

proptest! {
    /// Test that control characters never survive capture (prevents log injection)
    #[test]
    fn test_message_sanitization(message in ".*") {
        let event = LogEvent::new("app", LogLevel::Info, &message);

        for (raw, escaped) in [('\n', "\\n"), ('\r', "\\r"), ('\t', "\\t")] {
            assert!(!event.message.contains(raw),
                    "LogEvent contains unsanitized {:?}: {:?}", raw, event.message);
            if message.contains(raw) {
                assert!(event.message.contains(escaped));
            }
        }
    }

    /// Test that log injection attacks are prevented
    #[test]
    fn test_log_injection_prevention(
        legitimate_msg in "[a-zA-Z0-9 ]+",
        injected_level in prop_oneof![Just("ERROR"), Just("WARN"), Just("FATAL")]
    ) {
        let malicious_input = format!("{}\n{}: Fake admin login", legitimate_msg, injected_level);
        let event = LogEvent::new("app", LogLevel::Info, malicious_input);

        assert_eq!(event.message.split('\n').count(), 1,
                   "Message was not properly sanitized: {:?}", event.message);
    }

    /// Test that LogEvent JSON serialization roundtrips
    #[test]
    fn test_log_event_json_roundtrip(message in ".*", level in any_level()) {
        let event = LogEvent::new("app", level, message);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}

// ============================================================================
// Discard Summary Tests
// ============================================================================

proptest! {
    /// Summaries count every discard and keep the first event at the highest severity
    #[test]
    fn test_discard_summaries(discards in prop::collection::vec((0u8..4, any_level()), 1..60)) {
        let mut summarizer = DiscardSummarizer::new();
        for (i, (source, level)) in discards.iter().enumerate() {
            summarizer.record_discard(LogEvent::new(format!("source-{}", source), *level, format!("m{}", i)));
        }
        assert_eq!(summarizer.total_discarded(), discards.len() as u64);

        // Expected: per source, count and first event at max level
        let mut expected: BTreeMap<String, (u64, LogLevel, usize)> = BTreeMap::new();
        for (i, (source, level)) in discards.iter().enumerate() {
            let entry = expected
                .entry(format!("source-{}", source))
                .or_insert((0, *level, i));
            entry.0 += 1;
            if *level > entry.1 {
                entry.1 = *level;
                entry.2 = i;
            }
        }

        let events = summarizer.drain();
        assert!(summarizer.is_empty());
        assert_eq!(events.len(), expected.len());

        for (event, (source, (count, level, index))) in events.iter().zip(expected.iter()) {
            assert_eq!(&event.source, source);
            assert_eq!(event.level, *level);
            assert_eq!(
                event.message,
                format!("Discarded {} messages due to full event buffer including: m{}", count, index)
            );
        }
    }

    /// Negative sizes are rejected, everything else maps to at least one slot
    #[test]
    fn test_buffer_size_coercion(size in -1_000i64..100_000) {
        let config = RelayConfig { buffer_size: size, ..RelayConfig::default() };
        match config.effective_capacity() {
            Ok(capacity) => {
                assert!(size >= 0);
                assert_eq!(capacity, (size as usize).max(1));
            }
            Err(err) => {
                assert!(size < 0);
                assert!(err.is_configuration());
            }
        }
    }
}

#[test]
fn test_default_buffer_size() {
    assert_eq!(RelayConfig::default().buffer_size, DEFAULT_BUFFER_SIZE as i64);
    assert_eq!(DEFAULT_BUFFER_SIZE, 128);
}

// ============================================================================
// Relay Ordering Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A blocking relay delivers exactly what one producer submitted, in order
    #[test]
    fn test_blocking_relay_preserves_order(
        messages in prop::collection::vec("[a-z0-9 ]{0,16}", 0..200),
        buffer_size in 0i64..8
    ) {
        let memory = Arc::new(MemorySink::unbounded("memory"));
        let relay = Relay::builder()
            .buffer_size(buffer_size)
            .blocking(true)
            .sink_handle(memory.clone())
            .build()
            .unwrap();

        for message in &messages {
            relay.submit(LogRecord::new("app", LogLevel::Info, message.as_str()));
        }
        relay.close();

        assert_eq!(memory.messages(), messages);
    }

    /// A discarding relay never loses track of an event
    #[test]
    fn test_discarding_relay_accounts_for_events(count in 0usize..300, buffer_size in 0i64..4) {
        let memory = Arc::new(MemorySink::unbounded("memory"));
        let relay = Relay::builder()
            .buffer_size(buffer_size)
            .sink_handle(memory.clone())
            .build()
            .unwrap();

        for i in 0..count {
            relay.submit(LogRecord::new("app", LogLevel::Info, i.to_string()));
        }
        relay.close();

        let summarized: u64 = memory
            .messages()
            .iter()
            .filter_map(|m| m.strip_prefix("Discarded "))
            .filter_map(|rest| rest.split_whitespace().next()?.parse::<u64>().ok())
            .sum();
        let delivered = memory
            .messages()
            .iter()
            .filter(|m| !m.starts_with("Discarded "))
            .count() as u64;

        assert_eq!(delivered + summarized, count as u64);
        assert_eq!(summarized, relay.metrics().discarded());
    }
}
