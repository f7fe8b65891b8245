//! # Demo: daemon
//!
//! Runs the supervisor over a simulated cell until Ctrl-C.
//!
//! Two controllers stream from the start; a background script trips and
//! clears the emergency stop on one of them so the log shows safety
//! reports, restarts and the care publications a broker-backed reporter
//! would send.
//!
//! ## Run
//! ```bash
//! RUST_LOG=cellvisor=debug cargo run --example daemon
//! ```

use std::sync::Arc;
use std::time::Duration;

use cellvisor::{sim::SimCell, Config, LogReporter, LogWriter, SafetyState, Supervisor};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut cfg = Config::from_env()?;
    // Tighter cadence than production so the demo stays watchable.
    cfg.poll_interval = Duration::from_secs(5);

    let cell = SimCell::new();
    let left = cell.add_controller("ur-left");
    cell.add_controller("ur-right");

    let reporter = Arc::new(LogReporter::new(
        cfg.connection_id.clone(),
        cfg.customer_id.clone(),
    ));
    let supervisor = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .with_reporter(reporter)
        .build(Arc::new(cell.clone()));

    // Script: trip the left arm's e-stop every 20s, clear it 5s later,
    // and kill its stream once in between.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(20)).await;
            left.set_safety_state(SafetyState::EmergencyStop);
            tokio::time::sleep(Duration::from_secs(5)).await;
            left.set_safety_state(SafetyState::Normal);
            tokio::time::sleep(Duration::from_secs(10)).await;
            left.fail_stream("simulated link loss");
        }
    });

    supervisor.run().await?;
    Ok(())
}
