use std::{fmt, sync::Arc};

use almanac_core::EventId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{error::SinkError, event::EventRecord};

/// Receives due reminders for presentation.
///
/// Called from the scheduler's tick; implementations hand the event off and
/// return immediately. An `Err` is logged by the scheduler and the reminder
/// is not retried.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, event: Arc<EventRecord>) -> Result<(), SinkError>;
}

impl<F> DeliverySink for F
where
    F: Fn(Arc<EventRecord>) -> Result<(), SinkError> + Send + Sync,
{
    fn deliver(&self, event: Arc<EventRecord>) -> Result<(), SinkError> {
        self(event)
    }
}

/// Queues due events on a bounded mpsc channel for a separate consumer task.
///
/// Uses `try_send`, so a slow consumer shows up as [`SinkError::Full`] rather
/// than a stalled tick.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Arc<EventRecord>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Arc<EventRecord>>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, with room for `capacity` pending reminders.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Arc<EventRecord>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl DeliverySink for ChannelSink {
    fn deliver(&self, event: Arc<EventRecord>) -> Result<(), SinkError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// Display-ready reminder payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub event_id: EventId,
    pub text: String,
    /// `HH:MM` of the event itself.
    pub time: String,
    pub category: String,
    pub lead_minutes: u32,
}

impl From<&EventRecord> for ReminderNotice {
    fn from(event: &EventRecord) -> Self {
        Self {
            event_id: event.id().clone(),
            text: event.text().to_string(),
            time: event.datetime().format("%H:%M").to_string(),
            category: event.category().to_string(),
            lead_minutes: event.lead_minutes(),
        }
    }
}

impl fmt::Display for ReminderNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Event Reminder")?;
        writeln!(f, "Event: {}", self.text)?;
        writeln!(f, "Time: {}", self.time)?;
        write!(f, "Category: {}", self.category)
    }
}
