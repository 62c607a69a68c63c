//! Impulse Shield controller
//!
//! Owns the [`LockState`] record and decides whether an unlock request is
//! honored. Every mutation is written through to the injected store; a failed
//! write is logged and counted but never rolls back the in-memory state.

use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::error::ShieldError;
use super::notify::{Notification, Notifier};
use super::state::{format_remaining, Amount, LockState, ShieldSnapshot};
use crate::config::ShieldConfig;
use crate::metrics::{
    record_counter, record_gauge, SHIELD_COOLDOWN_REMAINING, SHIELD_LOCK_ARMED,
    SHIELD_PERSIST_FAILED, SHIELD_TICKS, SHIELD_UNLOCK_GRANTED, SHIELD_UNLOCK_REJECTED,
};
use crate::store::{load_record, save_record, KeyValueStore, StoreError};

/// Store key of the persisted lock record
pub const SHIELD_STATE_KEY: &str = "impulse_shield";

/// Successful state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unlocked,
    Locked,
}

/// Result of the presentation-layer `toggle` intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Unlocked,
    Locked,
    /// Unlock refused; the user has been notified
    Rejected { remaining_secs: u64 },
}

impl From<Transition> for ToggleOutcome {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Unlocked => ToggleOutcome::Unlocked,
            Transition::Locked => ToggleOutcome::Locked,
        }
    }
}

pub struct ImpulseShield {
    state: LockState,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl ImpulseShield {
    /// Start a fresh session: locked with the full cooldown ahead.
    pub fn new(
        cooldown_secs: u64,
        locked_amount: Amount,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state: LockState::fresh(cooldown_secs, locked_amount),
            store,
            notifier,
        }
    }

    /// [`load`](Self::load) with cooldown and amount taken from config
    pub fn from_config(
        config: &ShieldConfig,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StoreError> {
        Self::load(
            config.cooldown_secs(),
            Amount::from_cents(config.locked_amount_cents),
            store,
            notifier,
        )
    }

    /// Resume from the persisted record, or start fresh if there is none.
    ///
    /// The configured cooldown replaces the persisted one; a remaining time
    /// longer than the new cooldown is cut down to it.
    pub fn load(
        cooldown_secs: u64,
        locked_amount: Amount,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StoreError> {
        let state = match load_record::<LockState>(store.as_ref(), SHIELD_STATE_KEY)? {
            Some(mut state) => {
                state.cooldown_duration = cooldown_secs;
                state.cooldown_remaining = state.cooldown_remaining.min(cooldown_secs);
                debug!(
                    is_locked = state.is_locked,
                    remaining = state.cooldown_remaining,
                    "resumed shield state"
                );
                state
            }
            None => {
                debug!("no persisted shield state, starting fresh");
                LockState::fresh(cooldown_secs, locked_amount)
            }
        };

        Ok(Self {
            state,
            store,
            notifier,
        })
    }

    pub fn state(&self) -> &LockState {
        &self.state
    }

    pub fn snapshot(&self) -> ShieldSnapshot {
        ShieldSnapshot::from(&self.state)
    }

    /// Whether the countdown still has seconds to consume
    pub fn needs_ticks(&self) -> bool {
        self.state.is_locked && self.state.cooldown_remaining > 0
    }

    /// Consume one second of cooldown. No-op while unlocked or at zero.
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Consume up to `secs` seconds of cooldown in one step, persisting once.
    ///
    /// Used to catch up after the ticker stalled. Returns the seconds actually
    /// applied, which is never more than what remained.
    pub fn advance(&mut self, secs: u64) -> u64 {
        if !self.needs_ticks() || secs == 0 {
            return 0;
        }

        let applied = secs.min(self.state.cooldown_remaining);
        self.state.cooldown_remaining -= applied;
        record_counter(SHIELD_TICKS, applied);
        record_gauge(
            SHIELD_COOLDOWN_REMAINING,
            self.state.cooldown_remaining as f64,
        );

        if self.state.cooldown_remaining == 0 {
            info!("cooling-off period elapsed, unlock permitted");
        } else if applied > 1 {
            debug!(
                applied,
                remaining = self.state.cooldown_remaining,
                "countdown caught up"
            );
        } else {
            trace!(remaining = self.state.cooldown_remaining, "tick");
        }

        self.persist();
        applied
    }

    /// Release the lock if the cooldown has elapsed.
    ///
    /// Calling this while already unlocked changes nothing.
    pub fn request_unlock(&mut self) -> Result<(), ShieldError> {
        if !self.state.is_locked {
            debug!("unlock requested while already unlocked");
            return Ok(());
        }

        if self.state.cooldown_remaining > 0 {
            record_counter(SHIELD_UNLOCK_REJECTED, 1);
            debug!(
                remaining = self.state.cooldown_remaining,
                "unlock rejected, cooldown active"
            );
            return Err(ShieldError::CooldownActive {
                remaining_secs: self.state.cooldown_remaining,
            });
        }

        self.state.is_locked = false;
        record_counter(SHIELD_UNLOCK_GRANTED, 1);
        info!(amount = %self.state.locked_amount, "funds unlocked");
        self.persist();

        self.notifier.notify(Notification::new(
            "Funds unlocked!",
            "Your funds are now available.",
        ));
        Ok(())
    }

    /// Engage the lock and re-arm the full cooldown, whatever the current state.
    pub fn lock(&mut self) {
        let was_locked = self.state.is_locked;
        self.state.is_locked = true;
        self.state.cooldown_remaining = self.state.cooldown_duration;

        record_counter(SHIELD_LOCK_ARMED, 1);
        record_gauge(
            SHIELD_COOLDOWN_REMAINING,
            self.state.cooldown_remaining as f64,
        );
        info!(
            amount = %self.state.locked_amount,
            cooldown = self.state.cooldown_duration,
            rearmed = was_locked,
            "funds locked"
        );
        self.persist();

        self.notifier.notify(Notification::new(
            "Funds locked!",
            format!(
                "Your funds are protected for the next {}.",
                describe_period(self.state.cooldown_duration)
            ),
        ));
    }

    /// Single entry point for the presentation layer: unlock when locked,
    /// lock when unlocked. A cooldown rejection is reported to the notifier
    /// and returned as [`ToggleOutcome::Rejected`].
    pub fn toggle(&mut self) -> ToggleOutcome {
        if !self.state.is_locked {
            self.lock();
            return Transition::Locked.into();
        }

        match self.request_unlock() {
            Ok(()) => Transition::Unlocked.into(),
            Err(ShieldError::CooldownActive { remaining_secs }) => {
                self.notifier.notify(Notification::destructive(
                    "Still in cooling off period!",
                    format!(
                        "Please wait {} before unlocking.",
                        format_remaining(remaining_secs)
                    ),
                ));
                ToggleOutcome::Rejected { remaining_secs }
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = save_record(self.store.as_ref(), SHIELD_STATE_KEY, &self.state) {
            record_counter(SHIELD_PERSIST_FAILED, 1);
            warn!(error = %e, "failed to persist shield state");
        }
    }
}

fn describe_period(seconds: u64) -> String {
    if seconds % 3600 == 0 {
        format!("{} hours", seconds / 3600)
    } else {
        format_remaining(seconds)
    }
}
