/*
    ShieldService

    Runs the Impulse Shield on a single task so ticks and user intents are
    applied one at a time, in order. The rest of the application talks to it
    through a cloneable ShieldHandle.

    ┌──────────────┐  Toggle / Snapshot / Shutdown  ┌──────────────────────────┐
    │ ShieldHandle │ ─────────────────────────────▶ │ ShieldService event loop │
    └──────────────┘ ◀───────── oneshot reply ───── │   owns ImpulseShield     │
                                                    │   owns Option<Interval>  │
                                                    └──────────────────────────┘

    The ticker only exists while the countdown has seconds left. Unlocking or
    reaching zero drops it; locking again builds a new one whose first tick is a
    full period away. When the loop exits the ticker goes with it.

    Missed ticks are not replayed. After a stall (suspend, a blocked runtime)
    the next tick reports every whole period elapsed since the last one applied
    and the shield catches up in a single step and a single write.
*/

use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::controller::{ImpulseShield, ToggleOutcome};
use super::state::ShieldSnapshot;

/// Commands accepted by the service
#[derive(Debug)]
pub enum ShieldCommand {
    Toggle {
        response_tx: oneshot::Sender<ToggleOutcome>,
    },
    Snapshot {
        response_tx: oneshot::Sender<ShieldSnapshot>,
    },
    Shutdown,
}

/// The service task is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("shield service has stopped")]
pub struct ServiceStopped;

/// Handle to a running [`ShieldService`]
#[derive(Clone)]
pub struct ShieldHandle {
    command_tx: mpsc::Sender<ShieldCommand>,
}

impl ShieldHandle {
    /// Move `shield` onto a new task ticking every `tick_period`.
    ///
    /// The task ends on [`ShieldHandle::shutdown`] or once every handle is
    /// dropped. Must be called from within a tokio runtime.
    pub fn spawn(shield: ImpulseShield, tick_period: Duration) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let mut service = ShieldService::new(shield, tick_period, command_rx);
        // Armed here rather than on first poll so the countdown starts now.
        service.sync_ticker(true);
        let handle = tokio::spawn(service.run());

        (ShieldHandle { command_tx }, handle)
    }

    /// Forward the user's lock/unlock intent
    pub async fn toggle(&self) -> Result<ToggleOutcome, ServiceStopped> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ShieldCommand::Toggle { response_tx })
            .await
            .map_err(|_| ServiceStopped)?;
        response_rx.await.map_err(|_| ServiceStopped)
    }

    /// Current state for rendering
    pub async fn snapshot(&self) -> Result<ShieldSnapshot, ServiceStopped> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ShieldCommand::Snapshot { response_tx })
            .await
            .map_err(|_| ServiceStopped)?;
        response_rx.await.map_err(|_| ServiceStopped)
    }

    /// Stop the service and cancel its ticker
    pub async fn shutdown(&self) -> Result<(), ServiceStopped> {
        self.command_tx
            .send(ShieldCommand::Shutdown)
            .await
            .map_err(|_| ServiceStopped)
    }
}

/// Event loop owning the shield and its ticker
pub struct ShieldService {
    shield: ImpulseShield,
    tick_period: Duration,
    ticker: Option<Ticker>,
    command_rx: mpsc::Receiver<ShieldCommand>,
}

impl ShieldService {
    fn new(
        shield: ImpulseShield,
        tick_period: Duration,
        command_rx: mpsc::Receiver<ShieldCommand>,
    ) -> Self {
        Self {
            shield,
            tick_period,
            ticker: None,
            command_rx,
        }
    }

    async fn run(mut self) {
        info!(
            period_ms = self.tick_period.as_millis() as u64,
            "shield service started"
        );

        loop {
            tokio::select! {
                // Due ticks go first so a command never sees a stale countdown.
                biased;

                periods = next_tick(&mut self.ticker) => {
                    self.shield.advance(periods);
                    self.sync_ticker(false);
                }
                command = self.command_rx.recv() => match command {
                    Some(ShieldCommand::Toggle { response_tx }) => {
                        let outcome = self.shield.toggle();
                        self.sync_ticker(outcome == ToggleOutcome::Locked);
                        let _ = response_tx.send(outcome);
                    }
                    Some(ShieldCommand::Snapshot { response_tx }) => {
                        let _ = response_tx.send(self.shield.snapshot());
                    }
                    Some(ShieldCommand::Shutdown) => {
                        debug!("shutdown requested");
                        break;
                    }
                    None => {
                        debug!("all handles dropped");
                        break;
                    }
                },
            }
        }

        self.ticker = None;
        info!("shield service stopped");
    }

    /// Drop the ticker when there is nothing left to count, and build a fresh
    /// one when `rearm` is set or none is running.
    fn sync_ticker(&mut self, rearm: bool) {
        if !self.shield.needs_ticks() {
            if self.ticker.take().is_some() {
                debug!("ticker cancelled");
            }
            return;
        }

        if rearm || self.ticker.is_none() {
            self.ticker = Some(Ticker::start(self.tick_period));
            debug!("ticker armed");
        }
    }
}

/// Interval plus the instant up to which elapsed periods have been counted
struct Ticker {
    interval: Interval,
    period: Duration,
    counted_until: Instant,
}

impl Ticker {
    fn start(period: Duration) -> Self {
        let now = Instant::now();
        let mut interval = interval_at(now + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            period,
            counted_until: now,
        }
    }

    /// Wait for the next tick and return the whole periods elapsed since the
    /// previous one. Leftover fractions carry into the next call.
    async fn elapsed_periods(&mut self) -> u64 {
        self.interval.tick().await;

        let elapsed = Instant::now().saturating_duration_since(self.counted_until);
        let periods = elapsed.as_nanos() / self.period.as_nanos().max(1);
        let periods = u32::try_from(periods).unwrap_or(u32::MAX);
        self.counted_until += self.period * periods;
        u64::from(periods)
    }
}

async fn next_tick(ticker: &mut Option<Ticker>) -> u64 {
    match ticker {
        Some(ticker) => ticker.elapsed_periods().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shield::notify::{ChannelNotifier, Severity};
    use crate::shield::state::Amount;
    use crate::store::MemoryStore;
    use crate::test_utils::{
        assert_completes_within, recv_timeout, CountingStore, RecordingNotifier,
        DEFAULT_TEST_TIMEOUT,
    };
    use std::sync::Arc;
    use tokio::time::advance;

    const SECOND: Duration = Duration::from_secs(1);

    fn spawn_shield(cooldown_secs: u64) -> (ShieldHandle, JoinHandle<()>) {
        let (handle, join, _rx) = spawn_with_notifications(cooldown_secs);
        (handle, join)
    }

    fn spawn_with_notifications(
        cooldown_secs: u64,
    ) -> (
        ShieldHandle,
        JoinHandle<()>,
        mpsc::UnboundedReceiver<crate::shield::Notification>,
    ) {
        let (notifier, rx) = ChannelNotifier::new();
        let shield = ImpulseShield::new(
            cooldown_secs,
            Amount::from_dollars(500),
            Arc::new(MemoryStore::new()),
            Arc::new(notifier),
        );
        let (handle, join) = ShieldHandle::spawn(shield, SECOND);
        (handle, join, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_follows_clock() {
        let (handle, _join) = spawn_shield(10);

        advance(Duration::from_secs(3)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.cooldown_remaining, 7);
        assert!(snapshot.is_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_stops_at_zero() {
        let (handle, _join) = spawn_shield(5);

        advance(Duration::from_secs(60)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.cooldown_remaining, 0);
        assert_eq!(snapshot.cooldown_progress_percent, Some(100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_catches_up_with_one_write() {
        let store = CountingStore::default();
        let shield = ImpulseShield::new(
            172_800,
            Amount::from_dollars(500),
            Arc::new(store.clone()),
            Arc::new(RecordingNotifier::new()),
        );
        let (handle, _join) = ShieldHandle::spawn(shield, SECOND);

        advance(Duration::from_secs(3 * 60 * 60)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.cooldown_remaining, 162_000);
        assert_eq!(store.puts(), 1);

        // Back on the regular one-second cadence afterwards.
        advance(SECOND).await;
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 161_999);
        assert_eq!(store.puts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_periods_carry_over() {
        let (handle, _join) = spawn_shield(10);

        advance(Duration::from_millis(2_500)).await;
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 8);

        // The half second left over counts toward the next tick.
        advance(Duration::from_millis(1_500)).await;
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_toggle_rejected_and_notified() {
        let (handle, _join, mut rx) = spawn_with_notifications(172_800);

        let outcome = handle.toggle().await.unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Rejected {
                remaining_secs: 172_800
            }
        );

        let toast = recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await.unwrap();
        assert_eq!(toast.severity, Severity::Destructive);
        assert_eq!(toast.description, "Please wait 48h 0m 0s before unlocking.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_unlock() {
        let (handle, _join) = spawn_shield(3);

        advance(Duration::from_secs(3)).await;
        assert_eq!(handle.toggle().await.unwrap(), ToggleOutcome::Unlocked);

        advance(Duration::from_secs(30)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.is_locked);
        assert_eq!(snapshot.cooldown_remaining, 0);
        assert_eq!(snapshot.status_text(), "Available");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relock_uses_fresh_ticker() {
        let (handle, _join) = spawn_shield(3);

        advance(Duration::from_secs(3)).await;
        assert_eq!(handle.toggle().await.unwrap(), ToggleOutcome::Unlocked);

        // Relock off the one-second grid of the first ticker.
        advance(Duration::from_millis(500)).await;
        assert_eq!(handle.toggle().await.unwrap(), ToggleOutcome::Locked);
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 3);

        advance(Duration::from_millis(600)).await;
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 3);

        advance(Duration::from_millis(400)).await;
        assert_eq!(handle.snapshot().await.unwrap().cooldown_remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_service() {
        let (handle, join) = spawn_shield(10);

        handle.shutdown().await.unwrap();
        assert_completes_within(DEFAULT_TEST_TIMEOUT, join)
            .await
            .unwrap();

        assert_eq!(handle.toggle().await, Err(ServiceStopped));
        assert_eq!(handle.snapshot().await.unwrap_err(), ServiceStopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_service() {
        let (handle, join) = spawn_shield(10);
        let clone = handle.clone();

        drop(handle);
        drop(clone);
        assert_completes_within(DEFAULT_TEST_TIMEOUT, join)
            .await
            .unwrap();
    }
}
