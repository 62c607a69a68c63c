//! Walk an Impulse Shield through a full lock cycle with a short cooldown
//!
//! Run with:
//! ```bash
//! cargo run --example shield_demo
//! ```

use pockit_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use pockit_core::shield::{Amount, ImpulseShield, ShieldHandle, TracingNotifier};
use pockit_core::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging_with_config(LogConfig::new(LogLevel::Debug).with_target(false))?;

    let shield = ImpulseShield::new(
        3,
        Amount::from_dollars(500),
        Arc::new(MemoryStore::new()),
        Arc::new(TracingNotifier),
    );
    let (handle, service) = ShieldHandle::spawn(shield, Duration::from_secs(1));

    // Too early: rejected with the remaining time
    info!(outcome = ?handle.toggle().await?, "first toggle");

    tokio::time::sleep(Duration::from_millis(3100)).await;
    info!(outcome = ?handle.toggle().await?, "after cooldown");

    info!(outcome = ?handle.toggle().await?, "relock");
    let snapshot = handle.snapshot().await?;
    info!(
        status = snapshot.status_text(),
        remaining = ?snapshot.remaining_text(),
        "final state"
    );

    handle.shutdown().await?;
    service.await?;
    Ok(())
}
