//! # Example: flaky_retry
//!
//! Drives a flaky operation with a shared [`Delay`]: every failure grows the
//! level, every success shrinks it, and Ctrl-C aborts the current wait.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► backoff(&shutdown)          (waits level × 100ms, cancellable)
//!   ├─► call()
//!   │     ├─ Err ─► increment()     0 → 2 → 6 → 14 → 20
//!   │     └─ Ok  ─► decrement()
//!   └─► stop after 12 calls or on Ctrl-C
//! }
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=expdelay=trace cargo run --example flaky_retry
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use expdelay::{Config, Delay};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static CALLS: AtomicU64 = AtomicU64::new(0);

/// Fails on four calls out of every seven.
async fn call() -> Result<u64, String> {
    let n = CALLS.fetch_add(1, Ordering::Relaxed) + 1;
    tokio::time::sleep(Duration::from_millis(20)).await;
    if n % 7 < 4 {
        Err(format!("connection refused #{n}"))
    } else {
        Ok(n)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg: Config = serde_json::from_str(r#"{"max": 20, "factor": 2}"#)?;
    let delay = Arc::new(Delay::new(cfg));
    delay.set_time_unit(Duration::from_millis(100));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    for _ in 0..12 {
        let outcome = delay.backoff(&shutdown).await;
        if let Some(err) = outcome.error {
            warn!(error = %err, elapsed = ?outcome.elapsed, "wait aborted");
            break;
        }

        match call().await {
            Ok(n) => {
                delay.decrement();
                info!(call = n, level = delay.level(), "call succeeded");
            }
            Err(e) => {
                delay.increment();
                warn!(error = %e, level = delay.level(), next = ?delay.duration(), "call failed");
            }
        }
    }

    info!(level = delay.level(), "done");
    Ok(())
}
