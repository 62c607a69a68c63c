//! Lock state and the values derived from it

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency amount in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    /// Whole dollars, saturating at `u64::MAX` cents
    pub const fn from_dollars(dollars: u64) -> Self {
        Amount(dollars.saturating_mul(100))
    }

    pub const fn cents(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Persistent lock record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub is_locked: bool,
    pub locked_amount: Amount,
    /// Seconds left before unlock is permitted. Only meaningful while locked.
    pub cooldown_remaining: u64,
    /// Period re-applied on every lock, in seconds
    pub cooldown_duration: u64,
}

impl LockState {
    /// Session-start state: locked, full cooldown ahead
    pub fn fresh(cooldown_duration: u64, locked_amount: Amount) -> Self {
        Self {
            is_locked: true,
            locked_amount,
            cooldown_remaining: cooldown_duration,
            cooldown_duration,
        }
    }

    pub fn status(&self) -> ShieldStatus {
        if self.is_locked {
            ShieldStatus::Protected
        } else {
            ShieldStatus::Available
        }
    }

    /// Elapsed share of the cooldown in percent, `None` while unlocked
    pub fn cooldown_progress_percent(&self) -> Option<f64> {
        if !self.is_locked {
            return None;
        }
        if self.cooldown_duration == 0 {
            return Some(100.0);
        }
        let elapsed = self.cooldown_duration.saturating_sub(self.cooldown_remaining);
        let percent = elapsed as f64 / self.cooldown_duration as f64 * 100.0;
        Some(percent.clamp(0.0, 100.0))
    }

    /// Unlock would be honored right now
    pub fn is_unlockable(&self) -> bool {
        self.is_locked && self.cooldown_remaining == 0
    }
}

/// Display status of the locked funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShieldStatus {
    Protected,
    Available,
}

impl ShieldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShieldStatus::Protected => "Protected",
            ShieldStatus::Available => "Available",
        }
    }
}

impl fmt::Display for ShieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShieldSnapshot {
    pub is_locked: bool,
    pub locked_amount: Amount,
    pub cooldown_remaining: u64,
    pub cooldown_progress_percent: Option<f64>,
    pub status: ShieldStatus,
}

impl ShieldSnapshot {
    pub fn status_text(&self) -> &'static str {
        self.status.as_str()
    }

    /// `"{h}h {m}m {s}s"` while a countdown is running
    pub fn remaining_text(&self) -> Option<String> {
        (self.is_locked && self.cooldown_remaining > 0)
            .then(|| format_remaining(self.cooldown_remaining))
    }
}

impl From<&LockState> for ShieldSnapshot {
    fn from(state: &LockState) -> Self {
        Self {
            is_locked: state.is_locked,
            locked_amount: state.locked_amount,
            cooldown_remaining: state.cooldown_remaining,
            cooldown_progress_percent: state.cooldown_progress_percent(),
            status: state.status(),
        }
    }
}

/// Format seconds as `"{h}h {m}m {s}s"`. Hours are not wrapped into days.
pub fn format_remaining(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}h {}m {}s", hours, minutes, secs)
}
