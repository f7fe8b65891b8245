//! # Demo: failover
//!
//! Scripted walkthrough of the supervision loop, without signals:
//!
//! 1. start with controllers A and B,
//! 2. kill B's stream and watch its actor revive it with backoff,
//! 3. swap A out for C and watch reconciliation stop/start streams,
//! 4. shut down and print the final health snapshot.
//!
//! ## Run
//! ```bash
//! cargo run --example failover
//! ```

use std::sync::Arc;
use std::time::Duration;

use cellvisor::{
    sim::SimCell, BackoffPolicy, Config, JitterPolicy, LogWriter, Supervisor,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let mut cfg = Config::default();
    cfg.poll_interval = Duration::from_secs(2);
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(500),
        max: Duration::from_secs(2),
        factor: 2.0,
        jitter: JitterPolicy::None,
    };

    let cell = SimCell::new();
    let a = cell.add_controller("arm-a");
    let b = cell.add_controller("arm-b");

    let supervisor = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build(Arc::new(cell.clone()));

    let shutdown = CancellationToken::new();
    let run = {
        let supervisor = Arc::clone(&supervisor);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { supervisor.run_until(shutdown).await })
    };

    tokio::time::sleep(Duration::from_secs(3)).await;
    tracing::info!("--- killing arm-b's stream ---");
    b.fail_stream("demo failure");

    tokio::time::sleep(Duration::from_secs(3)).await;
    tracing::info!("--- swapping arm-a for arm-c ---");
    cell.remove_controller(a.id());
    cell.add_controller("arm-c");

    tokio::time::sleep(Duration::from_secs(5)).await;
    tracing::info!("--- shutting down ---");
    shutdown.cancel();
    run.await??;

    let restarts = supervisor.health().restarts(b.id()).await;
    tracing::info!(controller = %b.id(), restarts, "final restart count");
    Ok(())
}
