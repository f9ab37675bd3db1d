use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use almanac_calendar::{Calendar, SharedCalendar};
use almanac_core::config::{AlmanacConfig, ReminderSettings};
use almanac_scheduler::{
    ChannelSink, Clock, DeliverySink, EventRecord, ReminderNotice, ReminderScheduler,
    RegistryHandle, SchedulerTask, SystemClock,
};
use almanac_store::open_store;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{info, warn};

/// Load the calendar, start the reminder loop, print reminders until Ctrl-C.
pub async fn run(config: &AlmanacConfig) -> anyhow::Result<()> {
    let calendar = Calendar::open(
        open_store(&config.storage)?,
        RegistryHandle::default(),
        &config.categories,
    )?;
    info!(
        events = calendar.len(),
        reminders = calendar.registry().len(),
        "calendar ready"
    );

    // Scheduler → presenter queue; the tick only enqueues.
    let (sink, rx) = ChannelSink::channel(config.reminders.delivery_buffer);
    let daemon = Daemon::start(
        Arc::new(Mutex::new(calendar)),
        Arc::new(sink),
        Arc::new(SystemClock),
        &config.reminders,
    )?;
    let presenter = tokio::spawn(present(rx));

    tokio::signal::ctrl_c().await?;
    info!("interrupt received");

    // Stopping drops the sink, which closes the queue and ends the presenter.
    daemon.stop().await?;
    presenter.await?;
    Ok(())
}

/// The reminder loop plus a watcher that folds `add`/`delete` runs from
/// other processes into the registry the loop polls.
pub struct Daemon {
    scheduler: SchedulerTask,
    watcher: JoinHandle<()>,
    watcher_shutdown: watch::Sender<bool>,
}

impl Daemon {
    pub fn start(
        calendar: SharedCalendar,
        sink: Arc<dyn DeliverySink>,
        clock: Arc<dyn Clock>,
        settings: &ReminderSettings,
    ) -> anyhow::Result<Self> {
        let registry = calendar
            .lock()
            .expect("calendar poisoned")
            .registry()
            .clone();
        let scheduler = ReminderScheduler::new(registry, sink, clock, settings)?;
        let (watcher_shutdown, shutdown_rx) = watch::channel(false);
        let watcher = tokio::spawn(watch_store(calendar, scheduler.tick_interval(), shutdown_rx));
        Ok(Self {
            scheduler: scheduler.spawn(),
            watcher,
            watcher_shutdown,
        })
    }

    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.watcher_shutdown.send(true);
        self.watcher.await?;
        self.scheduler.stop().await?;
        Ok(())
    }
}

/// Re-read the store once per scheduler tick.
async fn watch_store(
    calendar: SharedCalendar,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let refreshed = calendar.lock().expect("calendar poisoned").refresh();
                match refreshed {
                    Ok(outcome) if outcome.is_empty() => {}
                    Ok(outcome) => info!(
                        added = outcome.added,
                        removed = outcome.removed,
                        "calendar changed on disk"
                    ),
                    Err(e) => warn!(error = %e, "calendar refresh failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn present(mut rx: mpsc::Receiver<Arc<EventRecord>>) {
    while let Some(event) = rx.recv().await {
        println!("{}\n", ReminderNotice::from(event.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_calendar::{EventDraft, EventSelector};
    use almanac_scheduler::ManualClock;
    use almanac_store::JsonFileStore;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn draft(text: &str) -> EventDraft {
        EventDraft {
            text: text.into(),
            date: "2024-01-01".into(),
            time: "10:00".into(),
            lead_minutes: "30".into(),
            category: "General".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn follows_add_and_delete_from_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_events.json");
        let categories = vec!["General".to_string()];
        let open = || {
            Calendar::open(
                Box::new(JsonFileStore::new(&path)),
                RegistryHandle::default(),
                &categories,
            )
            .unwrap()
        };

        let calendar: SharedCalendar = Arc::new(Mutex::new(open()));
        let (sink, mut rx) = ChannelSink::channel(8);
        let clock = Arc::new(ManualClock::new(at(9, 0)));
        let daemon = Daemon::start(
            Arc::clone(&calendar),
            Arc::new(sink),
            clock.clone(),
            &ReminderSettings::default(),
        )
        .unwrap();

        // What `almanac add` and `almanac delete` do.
        let mut foreground = open();
        let kept = foreground.create(&draft("Standup"), at(9, 0)).unwrap();
        let cancelled = foreground.create(&draft("Retro"), at(9, 0)).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        {
            let cal = calendar.lock().unwrap();
            assert!(cal.registry().contains(kept.id()));
            assert!(cal.registry().contains(cancelled.id()));
        }

        foreground
            .delete(at(9, 0).date(), &EventSelector::Id(cancelled.id().clone()))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!calendar.lock().unwrap().registry().contains(cancelled.id()));

        clock.set(at(9, 30));
        tokio::time::sleep(Duration::from_secs(3)).await;
        daemon.stop().await.unwrap();

        let mut fired = Vec::new();
        while let Some(event) = rx.recv().await {
            fired.push(event.id().clone());
        }
        assert_eq!(fired, vec![kept.id().clone()]);
    }
}
