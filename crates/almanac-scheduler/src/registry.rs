use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use almanac_core::EventId;
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::{event::EventRecord, window::default_band};

/// Working set of events that still owe a reminder, keyed by event id.
///
/// Holds shared references only; the calendar keeps its own.
#[derive(Debug)]
pub struct ReminderRegistry {
    entries: HashMap<EventId, Arc<EventRecord>>,
    band: Duration,
}

impl Default for ReminderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::with_band(default_band())
    }

    pub fn with_band(band: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            band,
        }
    }

    pub fn band(&self) -> Duration {
        self.band
    }

    pub fn set_band(&mut self, band: Duration) {
        self.band = band;
    }

    /// Insert or overwrite. Events without a reminder window are ignored.
    /// Returns whether the event is now tracked.
    pub fn register(&mut self, event: Arc<EventRecord>) -> bool {
        if !event.has_reminder() {
            return false;
        }
        debug!(event_id = %event.id(), "reminder registered");
        self.entries.insert(event.id().clone(), event);
        true
    }

    /// Remove by id. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: &EventId) -> Option<Arc<EventRecord>> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            debug!(event_id = %id, "reminder unregistered");
        }
        removed
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect every reminder due at `now` and mark each one notified.
    ///
    /// An entry leaves the registry once its reminder has fired and the
    /// event's own time is behind `now`: in the same call when the reminder
    /// fires late, otherwise on the first call after the event starts.
    /// Result order is unspecified.
    pub fn due_at(&mut self, now: NaiveDateTime) -> Vec<Arc<EventRecord>> {
        let band = self.band;
        let mut due = Vec::new();

        self.entries.retain(|id, event| {
            let Some(window) = event.reminder() else {
                return false;
            };
            if window.is_due_within(now, band) {
                window.mark_notified();
                due.push(Arc::clone(event));
            }
            let spent = window.is_notified() && now > event.datetime();
            if spent {
                debug!(event_id = %id, "reminder evicted");
            }
            !spent
        });

        due
    }

    /// Reminders whose band closed before `now` without ever firing.
    pub fn lapsed_at(&self, now: NaiveDateTime) -> usize {
        self.entries
            .values()
            .filter_map(|e| e.reminder())
            .filter(|w| w.has_lapsed(now, self.band))
            .count()
    }
}

/// Cloneable, thread-safe handle to one [`ReminderRegistry`].
///
/// The calendar (register on create, unregister on delete) and the scheduler
/// loop (`due_at`) serialize through the same mutex, so an unregister that
/// returns is visible to every later tick.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    inner: Arc<Mutex<ReminderRegistry>>,
}

impl RegistryHandle {
    pub fn new(registry: ReminderRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReminderRegistry> {
        self.inner.lock().expect("reminder registry poisoned")
    }

    pub fn register(&self, event: Arc<EventRecord>) -> bool {
        self.lock().register(event)
    }

    pub fn unregister(&self, id: &EventId) -> Option<Arc<EventRecord>> {
        self.lock().unregister(id)
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn due_at(&self, now: NaiveDateTime) -> Vec<Arc<EventRecord>> {
        self.lock().due_at(now)
    }

    pub fn lapsed_at(&self, now: NaiveDateTime) -> usize {
        self.lock().lapsed_at(now)
    }

    pub fn band(&self) -> Duration {
        self.lock().band()
    }

    pub fn set_band(&self, band: Duration) {
        self.lock().set_band(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_core::Category;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn event(id: &str, h: u32, m: u32, lead: u32) -> Arc<EventRecord> {
        Arc::new(EventRecord::create(
            id,
            at(h, m, 0),
            lead,
            Category::General,
            Some(id.into()),
        ))
    }

    #[test]
    fn zero_lead_events_are_not_registered() {
        let mut reg = ReminderRegistry::new();
        assert!(!reg.register(event("lunch", 12, 0, 0)));
        assert!(reg.register(event("call", 12, 30, 15)));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&EventId::from("call")));
    }

    #[test]
    fn register_overwrites_same_id() {
        let mut reg = ReminderRegistry::new();
        reg.register(event("a", 10, 0, 30));
        reg.register(event("a", 11, 0, 30));
        assert_eq!(reg.len(), 1);
        assert!(reg.due_at(at(9, 30, 0)).is_empty());
        assert_eq!(reg.due_at(at(10, 30, 0)).len(), 1);
    }

    #[test]
    fn unregister_twice_is_noop() {
        let mut reg = ReminderRegistry::new();
        reg.register(event("a", 10, 0, 30));
        assert!(reg.unregister(&EventId::from("a")).is_some());
        assert!(reg.unregister(&EventId::from("a")).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn due_reported_once_then_inert_until_event_passes() {
        let mut reg = ReminderRegistry::new();
        let e = event("a", 10, 0, 30);
        reg.register(Arc::clone(&e));

        assert!(reg.due_at(at(9, 29, 59)).is_empty());

        let due = reg.due_at(at(9, 30, 0));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id().as_str(), "a");
        assert!(e.reminder().unwrap().is_notified());
        // Event not started yet: still tracked but will not fire again.
        assert!(reg.contains(e.id()));

        assert!(reg.due_at(at(9, 30, 30)).is_empty());
        assert!(reg.contains(e.id()));

        // Once the event itself has passed, the spent entry is swept.
        assert!(reg.due_at(at(10, 0, 1)).is_empty());
        assert!(!reg.contains(e.id()));
    }

    #[test]
    fn late_fire_evicts_in_same_call() {
        // A band wide enough to still accept a poll after the event started.
        let mut reg = ReminderRegistry::with_band(Duration::minutes(10));
        let e = event("a", 10, 0, 5);
        reg.register(Arc::clone(&e));

        let due = reg.due_at(at(10, 1, 0));
        assert_eq!(due.len(), 1);
        assert!(!reg.contains(e.id()));
    }

    #[test]
    fn missed_band_never_fires() {
        let mut reg = ReminderRegistry::new();
        reg.register(event("a", 10, 0, 30));
        assert_eq!(reg.lapsed_at(at(9, 31, 0)), 1);
        assert!(reg.due_at(at(9, 31, 0)).is_empty());
    }

    #[test]
    fn scenario_two_events_same_date() {
        let mut reg = ReminderRegistry::new();
        reg.register(event("first", 14, 0, 0));
        reg.register(event("second", 15, 0, 15));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&EventId::from("second")));
    }

    #[test]
    fn handle_shares_state() {
        let handle = RegistryHandle::default();
        let other = handle.clone();
        handle.register(event("a", 10, 0, 30));
        assert!(other.contains(&EventId::from("a")));
        other.unregister(&EventId::from("a"));
        assert!(handle.is_empty());
        assert!(handle.due_at(at(9, 30, 0)).is_empty());
    }
}
