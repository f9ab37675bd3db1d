use almanac_core::{
    portable::{DATETIME_FORMAT, DATE_FORMAT},
    Category, EventId, PortableEvent,
};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::{
    error::{Result, SchedulerError},
    window::ReminderWindow,
};

/// One calendar event plus its derived reminder window.
///
/// Shared as `Arc<EventRecord>` between the calendar (which owns the
/// collection) and the reminder registry, so removing it from one never
/// depends on the other. Never mutated once built: moving an event or
/// changing its lead time means a new record with a fresh window.
#[derive(Debug)]
pub struct EventRecord {
    id: EventId,
    text: String,
    datetime: NaiveDateTime,
    lead_minutes: u32,
    category: Category,
    reminder: Option<ReminderWindow>,
}

impl EventRecord {
    /// Build a record and its reminder window. No validation here; callers
    /// check the date-time before getting this far.
    pub fn create(
        text: impl Into<String>,
        datetime: NaiveDateTime,
        lead_minutes: u32,
        category: Category,
        id: Option<EventId>,
    ) -> Self {
        let mut event = Self {
            id: id.unwrap_or_default(),
            text: text.into(),
            datetime: truncate_to_minute(datetime),
            lead_minutes,
            category,
            reminder: None,
        };
        event.recompute_reminder();
        event
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Date string the event is filed under.
    pub fn date_key(&self) -> String {
        self.datetime.format(DATE_FORMAT).to_string()
    }

    pub fn lead_minutes(&self) -> u32 {
        self.lead_minutes
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn reminder(&self) -> Option<&ReminderWindow> {
        self.reminder.as_ref()
    }

    pub fn has_reminder(&self) -> bool {
        self.reminder.is_some()
    }

    fn recompute_reminder(&mut self) {
        self.reminder = ReminderWindow::compute(&self.id, self.datetime, self.lead_minutes);
    }

    pub fn to_portable(&self) -> PortableEvent {
        PortableEvent {
            text: self.text.clone(),
            datetime: self.datetime.format(DATETIME_FORMAT).to_string(),
            reminder_minutes: self.lead_minutes,
            category: self.category.clone(),
            event_id: Some(self.id.clone()),
        }
    }

    pub fn from_portable(record: PortableEvent) -> Result<Self> {
        let datetime = NaiveDateTime::parse_from_str(&record.datetime, DATETIME_FORMAT)
            .map_err(|e| SchedulerError::InvalidRecord(format!("{:?}: {e}", record.datetime)))?;
        Ok(Self::create(
            record.text,
            datetime,
            record.reminder_minutes,
            record.category,
            record.event_id,
        ))
    }
}

fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn create_assigns_fresh_id() {
        let a = EventRecord::create("a", at(10, 0), 0, Category::General, None);
        let b = EventRecord::create("b", at(10, 0), 0, Category::General, None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn create_keeps_supplied_id() {
        let e = EventRecord::create("a", at(10, 0), 0, Category::Work, Some("fixed".into()));
        assert_eq!(e.id().as_str(), "fixed");
    }

    #[test]
    fn create_computes_window() {
        let e = EventRecord::create("standup", at(10, 0), 30, Category::Work, None);
        let w = e.reminder().expect("window present");
        assert_eq!(w.notify_at(), at(9, 30));
        assert_eq!(w.event_id(), e.id());

        let no_reminder = EventRecord::create("lunch", at(12, 0), 0, Category::General, None);
        assert!(!no_reminder.has_reminder());
    }

    #[test]
    fn seconds_are_dropped() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 42)
            .unwrap();
        let e = EventRecord::create("x", dt, 0, Category::General, None);
        assert_eq!(e.datetime(), at(10, 0));
    }

    #[test]
    fn portable_shape() {
        let e = EventRecord::create("Dentist", at(10, 0), 30, Category::Personal, Some("e1".into()));
        let p = e.to_portable();
        assert_eq!(p.text, "Dentist");
        assert_eq!(p.datetime, "2024-01-01 10:00");
        assert_eq!(p.reminder_minutes, 30);
        assert_eq!(p.category, Category::Personal);
        assert_eq!(p.event_id, Some(EventId::from("e1")));
        assert_eq!(e.date_key(), "2024-01-01");
    }

    #[test]
    fn from_portable_starts_un_notified() {
        let e = EventRecord::create("x", at(10, 0), 30, Category::General, None);
        e.reminder().unwrap().mark_notified();

        let reloaded = EventRecord::from_portable(e.to_portable()).unwrap();
        assert_eq!(reloaded.id(), e.id());
        assert!(!reloaded.reminder().unwrap().is_notified());
    }

    #[test]
    fn from_portable_without_id_generates_one() {
        let p = PortableEvent {
            text: "x".into(),
            datetime: "2024-01-01 10:00".into(),
            reminder_minutes: 0,
            category: Category::General,
            event_id: None,
        };
        let e = EventRecord::from_portable(p).unwrap();
        assert!(!e.id().as_str().is_empty());
    }

    #[test]
    fn from_portable_rejects_bad_datetime() {
        let p = PortableEvent {
            text: "x".into(),
            datetime: "01/01/2024 10am".into(),
            reminder_minutes: 5,
            category: Category::General,
            event_id: None,
        };
        assert!(matches!(
            EventRecord::from_portable(p),
            Err(SchedulerError::InvalidRecord(_))
        ));
    }
}
