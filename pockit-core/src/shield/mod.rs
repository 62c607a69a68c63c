//! Impulse Shield
//!
//! Keeps a designated amount locked behind a cooling-off period. The
//! controller ([`ImpulseShield`]) is a plain synchronous state machine; the
//! service ([`ShieldHandle`]/[`ShieldService`]) owns it on a single task and
//! drives the one-second countdown.
//!
//! ```text
//!        lock()                       tick() x cooldown
//!   ┌──────────────┐   ┌─────────────────────────────────────┐
//!   │              ▼   │                                     ▼
//! UNLOCKED    LOCKED(remaining > 0) ──────────────▶ LOCKED(remaining == 0)
//!   ▲                  │  request_unlock(): CooldownActive         │
//!   │                  └──────────┘                                │
//!   └──────────────────────── request_unlock() ────────────────────┘
//! ```

pub mod controller;
pub mod error;
pub mod notify;
pub mod service;
pub mod state;

pub use controller::{ImpulseShield, ToggleOutcome, Transition, SHIELD_STATE_KEY};
pub use error::ShieldError;
pub use notify::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use service::{ShieldCommand, ShieldHandle, ShieldService};
pub use state::{format_remaining, Amount, LockState, ShieldSnapshot, ShieldStatus};
