//! Maps the logical timer queue onto real time.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use super::SWEEP_INTERVAL_MINUTES;
use crate::clock::Clock;
use crate::events::Event;
use crate::session::Session;
use crate::task::TaskSource;

/// How long to sleep before the next poll: until the next timer, never
/// longer than one sweep interval.
pub fn sleep_for(now: DateTime<Utc>, next: Option<DateTime<Utc>>) -> std::time::Duration {
    let cap = Duration::minutes(SWEEP_INTERVAL_MINUTES);
    let wait = next.map_or(cap, |at| (at - now).min(cap));
    wait.to_std().unwrap_or(std::time::Duration::ZERO)
}

fn log_event(event: &Event) {
    match event {
        Event::NotificationDispatched { notification, .. } => {
            tracing::debug!(tag = %notification.tag, "driver dispatched notification");
        }
        Event::NotificationSkipped { tag, reason, .. } => {
            tracing::debug!(%tag, ?reason, "driver skipped notification");
        }
        Event::DeliveryFailed { tag, .. } => {
            tracing::warn!(%tag, "notification could not be delivered");
        }
        _ => {}
    }
}

/// Poll the session until `shutdown` flips to `true` (or its sender is
/// dropped), then cancel every timer.
///
/// The session lock is held only while polling. Returns the number of
/// notifications dispatched.
pub async fn run<S, C>(session: Arc<Mutex<Session<S, C>>>, mut shutdown: watch::Receiver<bool>) -> usize
where
    S: TaskSource + Send + 'static,
    C: Clock + 'static,
{
    let mut dispatched = 0;
    tracing::info!("scheduler driver started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let wait = {
            let mut session = session.lock().await;
            let events = session.tick();
            events.iter().for_each(log_event);
            dispatched += events.iter().filter(|e| e.dispatched().is_some()).count();
            sleep_for(session.now(), session.next_wakeup())
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    let cancelled = session.lock().await.shutdown();
    tracing::info!(cancelled = cancelled.len(), dispatched, "scheduler driver stopped");
    dispatched
}
