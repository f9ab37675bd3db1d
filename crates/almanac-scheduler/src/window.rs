use std::sync::atomic::{AtomicBool, Ordering};

use almanac_core::{config::DEFAULT_ACCEPTANCE_BAND_SECS, EventId};
use chrono::{Duration, NaiveDateTime};

/// Width of the acceptance band used by [`ReminderWindow::is_due`].
pub fn default_band() -> Duration {
    Duration::seconds(DEFAULT_ACCEPTANCE_BAND_SECS as i64)
}

/// Per-event reminder eligibility.
///
/// Exists only for events with a non-zero lead time. The `notified` flag
/// flips to `true` once and never back; a fresh window is built whenever the
/// owning event's time or lead changes.
#[derive(Debug)]
pub struct ReminderWindow {
    event_id: EventId,
    notify_at: NaiveDateTime,
    notified: AtomicBool,
}

impl ReminderWindow {
    /// `None` when `lead_minutes == 0`: the event asked for no reminder.
    pub fn compute(event_id: &EventId, datetime: NaiveDateTime, lead_minutes: u32) -> Option<Self> {
        if lead_minutes == 0 {
            return None;
        }
        Some(Self {
            event_id: event_id.clone(),
            notify_at: datetime - Duration::minutes(i64::from(lead_minutes)),
            notified: AtomicBool::new(false),
        })
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn notify_at(&self) -> NaiveDateTime {
        self.notify_at
    }

    pub fn is_notified(&self) -> bool {
        self.notified.load(Ordering::SeqCst)
    }

    /// Due within the default one-minute band.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.is_due_within(now, default_band())
    }

    /// True iff not yet notified and `notify_at <= now < notify_at + band`.
    ///
    /// A poll that lands after the band has closed does not fire: late
    /// reminders are dropped rather than shown arbitrarily late.
    pub fn is_due_within(&self, now: NaiveDateTime, band: Duration) -> bool {
        !self.is_notified() && self.notify_at <= now && now < self.notify_at + band
    }

    /// Never notified and the band closed before `now`.
    pub fn has_lapsed(&self, now: NaiveDateTime, band: Duration) -> bool {
        !self.is_notified() && now >= self.notify_at + band
    }

    pub fn mark_notified(&self) {
        self.notified.store(true, Ordering::SeqCst);
    }
}
