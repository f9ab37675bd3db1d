use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
};

use almanac_core::{portable::DATE_FORMAT, Category, EventId, PortableEvent, PortableSnapshot};
use almanac_scheduler::{EventRecord, RegistryHandle};
use almanac_store::EventStore;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::{error::Result, input::EventDraft};

/// Calendar shared between the reminder daemon's store watcher and its owner.
pub type SharedCalendar = Arc<Mutex<Calendar>>;

/// Which event on a date to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSelector {
    /// Position in [`Calendar::events_on`] order (by time).
    Index(usize),
    Id(EventId),
}

/// What a [`Calendar::refresh`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub added: usize,
    pub removed: usize,
}

impl RefreshOutcome {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// The primary event collection, filed by date.
///
/// Every create/delete is saved first and only then applied to the
/// collection and the reminder registry, so a failed save changes nothing.
pub struct Calendar {
    events: BTreeMap<NaiveDate, Vec<Arc<EventRecord>>>,
    registry: RegistryHandle,
    store: Box<dyn EventStore>,
    categories: Vec<Category>,
    /// Snapshot last read from or written to the store.
    synced: PortableSnapshot,
}

impl Calendar {
    /// Load the saved snapshot and register every event that wants a reminder.
    ///
    /// Unparseable records and duplicate ids are skipped with a warning rather
    /// than failing the whole load.
    pub fn open(
        store: Box<dyn EventStore>,
        registry: RegistryHandle,
        categories: &[String],
    ) -> Result<Self> {
        let snapshot = store.load()?;
        let mut calendar = Self {
            events: BTreeMap::new(),
            registry,
            store,
            categories: categories.iter().map(|c| Category::from(c.as_str())).collect(),
            synced: PortableSnapshot::new(),
        };
        calendar.reconcile(snapshot);

        info!(
            events = calendar.len(),
            reminders = calendar.registry.len(),
            "calendar loaded"
        );
        Ok(calendar)
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Events on `date`, earliest first.
    pub fn events_on(&self, date: NaiveDate) -> Vec<Arc<EventRecord>> {
        let mut day = self.events.get(&date).cloned().unwrap_or_default();
        day.sort_by_key(|e| e.datetime());
        day
    }

    /// Dates that currently hold at least one event.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.events.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<Arc<EventRecord>> {
        self.events
            .values()
            .flatten()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// Validate `draft`, save it, then file the event and register its reminder.
    pub fn create(&mut self, draft: &EventDraft, now: NaiveDateTime) -> Result<Arc<EventRecord>> {
        let valid = draft.validate(now, &self.categories)?;
        let event = Arc::new(EventRecord::create(
            valid.text,
            valid.datetime,
            valid.lead_minutes,
            valid.category,
            None,
        ));

        let mut snapshot = self.snapshot();
        snapshot
            .entry(event.date_key())
            .or_default()
            .push(event.to_portable());
        self.save(snapshot)?;

        self.events
            .entry(event.date())
            .or_default()
            .push(Arc::clone(&event));
        self.registry.register(Arc::clone(&event));
        info!(event_id = %event.id(), at = %event.datetime(), lead = event.lead_minutes(), "event created");
        Ok(event)
    }

    /// Remove one event from `date`. `Ok(None)` when nothing matched.
    pub fn delete(
        &mut self,
        date: NaiveDate,
        selector: &EventSelector,
    ) -> Result<Option<Arc<EventRecord>>> {
        let target = match selector {
            EventSelector::Index(i) => self.events_on(date).get(*i).map(|e| e.id().clone()),
            EventSelector::Id(id) => Some(id.clone()),
        };
        let Some(target) = target else {
            return Ok(None);
        };
        let Some(pos) = self
            .events
            .get(&date)
            .and_then(|day| day.iter().position(|e| *e.id() == target))
        else {
            return Ok(None);
        };

        // Snapshot days mirror `events` order, so `pos` indexes both.
        let key = date.format(DATE_FORMAT).to_string();
        let mut snapshot = self.snapshot();
        if let Some(records) = snapshot.get_mut(&key) {
            records.remove(pos);
            if records.is_empty() {
                snapshot.remove(&key);
            }
        }
        self.save(snapshot)?;

        let Some(day) = self.events.get_mut(&date) else {
            return Ok(None);
        };
        let removed = day.remove(pos);
        if day.is_empty() {
            self.events.remove(&date);
        }
        self.registry.unregister(removed.id());
        info!(event_id = %removed.id(), "event deleted");
        Ok(Some(removed))
    }

    /// Re-read the store and apply whatever another process changed.
    ///
    /// Records are matched to the ones already held by id and content. A
    /// match keeps its in-memory record, so a reminder that already fired
    /// stays notified; new or changed records are registered afresh and
    /// vanished ones unregistered. Cheap when the store is unchanged.
    pub fn refresh(&mut self) -> Result<RefreshOutcome> {
        let snapshot = self.store.load()?;
        if snapshot == self.synced {
            return Ok(RefreshOutcome::default());
        }
        let outcome = self.reconcile(snapshot);
        debug!(added = outcome.added, removed = outcome.removed, "calendar refreshed");
        Ok(outcome)
    }

    /// Portable view of the whole collection, keyed by date string.
    pub fn snapshot(&self) -> PortableSnapshot {
        self.events
            .iter()
            .map(|(date, day)| {
                (
                    date.format(DATE_FORMAT).to_string(),
                    day.iter().map(|e| e.to_portable()).collect(),
                )
            })
            .collect()
    }

    fn save(&mut self, snapshot: PortableSnapshot) -> Result<()> {
        self.store.save(&snapshot)?;
        self.synced = snapshot;
        Ok(())
    }

    /// Replace the collection with `snapshot`, reusing held records that match.
    fn reconcile(&mut self, snapshot: PortableSnapshot) -> RefreshOutcome {
        let mut previous: Vec<Arc<EventRecord>> =
            std::mem::take(&mut self.events).into_values().flatten().collect();
        let mut seen = HashSet::new();
        let mut outcome = RefreshOutcome::default();

        for (day, records) in &snapshot {
            for record in records {
                let held = previous.iter().position(|e| same_record(e, record));
                let (event, fresh) = match held {
                    Some(i) => (previous.swap_remove(i), false),
                    None => match EventRecord::from_portable(record.clone()) {
                        Ok(e) => (Arc::new(e), true),
                        Err(e) => {
                            warn!(%day, error = %e, "skipping unreadable event");
                            continue;
                        }
                    },
                };
                if !seen.insert(event.id().clone()) {
                    warn!(%day, event_id = %event.id(), "skipping duplicate event id");
                    continue;
                }
                if fresh {
                    outcome.added += 1;
                    self.registry.register(Arc::clone(&event));
                }
                self.events.entry(event.date()).or_default().push(event);
            }
        }

        for gone in previous {
            outcome.removed += 1;
            // A changed record keeps its id; its new version is already registered.
            if !seen.contains(gone.id()) {
                self.registry.unregister(gone.id());
            }
        }

        self.synced = snapshot;
        outcome
    }
}

/// Same event as `record`. Records saved without an id match on content alone.
fn same_record(event: &EventRecord, record: &PortableEvent) -> bool {
    let mut held = event.to_portable();
    if record.event_id.is_none() {
        held.event_id = None;
    }
    held == *record
}
