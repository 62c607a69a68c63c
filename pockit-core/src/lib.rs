//! Pockit core: the Impulse Shield cooling-off lock and the plumbing around
//! it (persistence, notifications, config, logging, metrics, shutdown).

pub mod config;
pub mod logging;
pub mod metrics;
pub mod motivation;
pub mod shield;
pub mod shutdown;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use logging::{init_logging, LogLevel};
pub use shield::{ImpulseShield, ShieldHandle, ShieldSnapshot, ToggleOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = Config::default();
    }
}
