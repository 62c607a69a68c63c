//! Metrics for observability
//!
//! Recorded through the `metrics` facade. Without an installed recorder every
//! call is a no-op, so library code records unconditionally.

use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const SHIELD_TICKS: &str = "shield.ticks";
pub const SHIELD_UNLOCK_GRANTED: &str = "shield.unlock.granted";
pub const SHIELD_UNLOCK_REJECTED: &str = "shield.unlock.rejected";
pub const SHIELD_LOCK_ARMED: &str = "shield.lock.armed";
pub const SHIELD_PERSIST_FAILED: &str = "shield.persist.failed";
pub const SHIELD_COOLDOWN_REMAINING: &str = "shield.cooldown.remaining_secs";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(SHIELD_TICKS, "Countdown ticks applied while locked");
    describe_counter!(SHIELD_UNLOCK_GRANTED, "Unlock requests honored");
    describe_counter!(
        SHIELD_UNLOCK_REJECTED,
        "Unlock requests rejected during the cooling-off period"
    );
    describe_counter!(SHIELD_LOCK_ARMED, "Times the cooldown was (re)armed by a lock");
    describe_counter!(SHIELD_PERSIST_FAILED, "Failed writes of the shield record");
    describe_gauge!(SHIELD_COOLDOWN_REMAINING, "Seconds left in the current cooldown");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a gauge metric
pub fn record_gauge(name: &'static str, value: f64) {
    gauge!(name).set(value);
}
