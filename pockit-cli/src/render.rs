//! Terminal rendering of shield snapshots and notifications

use pockit_core::shield::{Notification, ShieldSnapshot};

const BAR_WIDTH: usize = 20;

/// Multi-line status block
pub fn snapshot(snapshot: &ShieldSnapshot) -> String {
    let mut out = format!(
        "Locked Funds: {}\nStatus: {}",
        snapshot.locked_amount,
        snapshot.status_text()
    );

    if let (Some(remaining), Some(percent)) =
        (snapshot.remaining_text(), snapshot.cooldown_progress_percent)
    {
        out.push_str(&format!(
            "\nUnlocks in: {}\nProgress: {} {:.1}%",
            remaining,
            progress_bar(percent),
            floor_tenth(percent)
        ));
    } else if snapshot.is_locked {
        out.push_str("\nCooling-off period complete, unlock available");
    }

    out
}

pub fn notification(notification: &Notification) -> String {
    let marker = if notification.is_destructive() { "!" } else { "*" };
    format!(
        "[{}] {} {}",
        marker, notification.title, notification.description
    )
}

/// Truncate to one decimal so a running countdown never reads 100.0%
fn floor_tenth(percent: f64) -> f64 {
    (percent * 10.0).floor() / 10.0
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).floor() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pockit_core::shield::{Amount, LockState};

    fn locked(duration: u64, remaining: u64) -> ShieldSnapshot {
        let mut state = LockState::fresh(duration, Amount::from_dollars(500));
        state.cooldown_remaining = remaining;
        ShieldSnapshot::from(&state)
    }

    #[test]
    fn test_nearly_done_is_not_full() {
        let out = snapshot(&locked(172_800, 3));
        assert!(out.contains("Unlocks in: 0h 0m 3s"));
        assert!(out.contains("99.9%"), "{out}");
        assert!(!out.contains("100.0%"));
        assert!(out.contains('-'));
    }

    #[test]
    fn test_half_way() {
        let out = snapshot(&locked(172_800, 86_400));
        assert!(out.contains("Locked Funds: $500.00"));
        assert!(out.contains("Status: Protected"));
        assert!(out.contains("[##########----------] 50.0%"));
    }

    #[test]
    fn test_complete_cooldown() {
        let out = snapshot(&locked(60, 0));
        assert!(out.contains("unlock available"));
        assert!(!out.contains("Unlocks in"));
    }
}
