use std::{sync::Arc, time::Duration as StdDuration};

use almanac_core::{config::ReminderSettings, AlmanacError};
use chrono::Duration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock,
    error::{Result, SchedulerError},
    registry::RegistryHandle,
    sink::DeliverySink,
};

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Reminders found due (and marked notified).
    pub due: usize,
    /// Of those, how many the sink accepted.
    pub delivered: usize,
}

/// Periodic reminder poller, not yet started.
///
/// [`spawn`](Self::spawn) moves it onto a Tokio task and returns the running
/// [`SchedulerTask`]; [`run`](Self::run) drives it on the caller's task.
pub struct ReminderScheduler {
    registry: RegistryHandle,
    sink: Arc<dyn DeliverySink>,
    clock: Arc<dyn Clock>,
    tick_interval: StdDuration,
}

impl ReminderScheduler {
    /// Validates the tick/band pairing and applies the band to `registry`.
    pub fn new(
        registry: RegistryHandle,
        sink: Arc<dyn DeliverySink>,
        clock: Arc<dyn Clock>,
        settings: &ReminderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let band = i64::try_from(settings.acceptance_band_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                AlmanacError::Config(format!(
                    "reminders.acceptance_band_secs ({}) is out of range",
                    settings.acceptance_band_secs
                ))
            })?;
        registry.set_band(band);
        Ok(Self {
            registry,
            sink,
            clock,
            tick_interval: StdDuration::from_millis(settings.tick_interval_ms),
        })
    }

    pub fn tick_interval(&self) -> StdDuration {
        self.tick_interval
    }

    /// One due-check: capture `now` once, collect due reminders, deliver each.
    ///
    /// A failed delivery is logged and skipped; the reminder is already marked
    /// notified and will not come back.
    pub fn tick(&self) -> TickOutcome {
        let now = self.clock.now();
        let due = self.registry.due_at(now);
        let mut outcome = TickOutcome {
            due: due.len(),
            delivered: 0,
        };

        for event in due {
            let id = event.id().clone();
            info!(event_id = %id, at = %event.datetime(), "reminder due");
            match self.sink.deliver(event) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => warn!(event_id = %id, error = %e, "reminder delivery failed, dropped"),
            }
        }
        outcome
    }

    /// Poll loop. Ticks every `tick_interval` until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            tracked = self.registry.len(),
            "reminder scheduler started"
        );
        self.report_lapsed_on_startup();

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let outcome = self.tick();
                    if outcome.due > 0 {
                        debug!(due = outcome.due, delivered = outcome.delivered, "tick complete");
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as a stop request too.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("reminder scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Start the poll loop on a background task.
    pub fn spawn(self) -> SchedulerTask {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx));
        SchedulerTask {
            shutdown_tx,
            handle,
        }
    }

    /// Reminders whose window closed while nothing was polling are never fired.
    fn report_lapsed_on_startup(&self) {
        let lapsed = self.registry.lapsed_at(self.clock.now());
        if lapsed > 0 {
            warn!(count = lapsed, "reminders missed before scheduler start");
        }
    }
}

/// Handle to a running [`ReminderScheduler`].
pub struct SchedulerTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SchedulerTask {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.handle.await.map_err(|e| {
            error!("reminder scheduler task failed: {e}");
            SchedulerError::TaskFailed(e.to_string())
        })
    }
}
