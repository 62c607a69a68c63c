use thiserror::Error;

use super::state::format_remaining;

/// Errors raised by the shield state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShieldError {
    /// Unlock requested before the cooling-off period elapsed
    #[error("Still in cooling off period: {} remaining", format_remaining(*remaining_secs))]
    CooldownActive { remaining_secs: u64 },
}

impl ShieldError {
    /// Seconds left before an unlock will be honored
    pub fn remaining_secs(&self) -> u64 {
        match self {
            ShieldError::CooldownActive { remaining_secs } => *remaining_secs,
        }
    }
}
