//! Offline scan against the mock prober.
//!
//! This demo shows how to:
//! - Drive a scan without touching the network
//! - Trip the circuit breaker with a burst of 403 answers
//! - Read the run summary
//!
//! Run with: cargo run --example mock_scan

use reflex::backends::MockProber;
use reflex::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    // `q` reflects, `page` never does; the first four probes are refused.
    let prober = MockProber::new()
        .with_reflecting_param("q")
        .with_rate_limited_first(4)
        .with_latency(Duration::from_millis(10));

    let config = ScanManagerConfig::new()
        .with_workers(4)
        .with_requeue(RequeueConfig::new().with_max_jitter(Duration::from_millis(250)))
        .with_breaker(
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_cooldown(Duration::from_secs(2)),
        );

    let sink = Arc::new(MemorySink::new());
    let manager = ScanManager::builder()
        .with_prober(prober)
        .with_arc_sink(sink.clone())
        .with_config(config)
        .build()?;

    let urls = (1..=6).map(|i| format!("http://shop.test/search?q=item{}&page={}", i, i));
    let summary = manager.run(StaticSource::new(urls)).await?;

    println!("Findings:");
    for url in sink.urls() {
        println!("  {}", url);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
