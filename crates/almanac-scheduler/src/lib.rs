//! `almanac-scheduler` — one-shot event reminders driven by a Tokio poll loop.
//!
//! # Overview
//!
//! Each [`EventRecord`] with a non-zero lead time carries a
//! [`ReminderWindow`]: the instant `datetime - lead` plus a one-way
//! "notified" flag. The [`ReminderRegistry`] holds the events that still owe
//! a reminder; the [`ReminderScheduler`] polls it on a fixed tick and hands
//! every due event to a [`DeliverySink`].
//!
//! | Piece               | Shared as                         |
//! |---------------------|-----------------------------------|
//! | `EventRecord`       | `Arc<EventRecord>`                |
//! | `ReminderRegistry`  | `RegistryHandle` (mutex-guarded)  |
//! | `DeliverySink`      | `Arc<dyn DeliverySink>`           |
//! | `Clock`             | `Arc<dyn Clock>`                  |

pub mod clock;
pub mod engine;
pub mod error;
pub mod event;
pub mod registry;
pub mod sink;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ReminderScheduler, SchedulerTask, TickOutcome};
pub use error::{Result, SchedulerError, SinkError};
pub use event::EventRecord;
pub use registry::{RegistryHandle, ReminderRegistry};
pub use sink::{ChannelSink, DeliverySink, ReminderNotice};
pub use window::ReminderWindow;
