//! Interactive `run` session
//!
//! Drives a [`ShieldHandle`] from stdin while the countdown ticks, printing
//! notifications and rotating motivational quotes as they come.

use anyhow::Result;
use pockit_core::config::Config;
use pockit_core::motivation::MotivationFeed;
use pockit_core::shield::{ImpulseShield, Notification, ShieldHandle};
use pockit_core::shutdown::{install_signal_handlers, ShutdownCoordinator, ShutdownHandler};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use crate::render;

const HELP: &str = "Commands: toggle (t), status (s), quote (q), help (h), exit (x)";

pub async fn run(
    config: &Config,
    shield: ImpulseShield,
    notifications: mpsc::UnboundedReceiver<Notification>,
) -> Result<()> {
    let (handle, service) = ShieldHandle::spawn(shield, config.shield.tick_interval);

    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_millis(100)));
    install_signal_handlers(coordinator.clone())?;
    let handler = ShutdownHandler::new(coordinator, "session");

    let outcome = handler
        .run(|| interact(&handle, notifications, config.shield.quote_interval))
        .await;

    handle.shutdown().await.ok();
    service.await?;

    match outcome {
        Some(result) => result,
        None => {
            info!("session interrupted");
            Ok(())
        }
    }
}

async fn interact(
    handle: &ShieldHandle,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    quote_interval: Duration,
) -> Result<()> {
    let mut input = spawn_stdin_reader();
    let mut feed = MotivationFeed::new();
    let mut quotes = interval_at(Instant::now() + quote_interval, quote_interval);

    println!("{}", render::snapshot(&handle.snapshot().await?));
    println!("\"{}\"", feed.current());
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    debug!("stdin closed");
                    break;
                };
                match line.trim() {
                    "toggle" | "t" => {
                        handle.toggle().await?;
                    }
                    "status" | "s" => println!("{}", render::snapshot(&handle.snapshot().await?)),
                    "quote" | "q" => println!("\"{}\"", feed.next_quote()),
                    "help" | "h" => println!("{}", HELP),
                    "exit" | "x" | "quit" => break,
                    "" => {}
                    other => println!("Unknown command '{}'. {}", other, HELP),
                }
            }
            Some(notification) = notifications.recv() => {
                println!("{}", render::notification(&notification));
            }
            _ = quotes.tick() => {
                println!("\"{}\"", feed.next_quote());
            }
        }
    }

    // Anything raised by the last command
    while let Ok(notification) = notifications.try_recv() {
        println!("{}", render::notification(&notification));
    }
    Ok(())
}

/// Blocking stdin reads live on their own thread so an idle prompt never
/// holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
