use std::{path::Path, sync::Mutex};

use almanac_core::{EventId, PortableEvent, PortableSnapshot};
use rusqlite::Connection;
use tracing::debug;

use crate::{
    db::init_db,
    error::{Result, StoreError},
    EventStore,
};

/// Snapshot store on a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }
}

impl EventStore for SqliteStore {
    fn load(&self) -> Result<PortableSnapshot> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        let mut stmt = conn.prepare(
            "SELECT day, text, datetime, reminder_minutes, category, event_id
             FROM events ORDER BY day, position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,         // day
                row.get::<_, String>(1)?,         // text
                row.get::<_, String>(2)?,         // datetime
                row.get::<_, i64>(3)?,            // reminder_minutes
                row.get::<_, String>(4)?,         // category
                row.get::<_, Option<String>>(5)?, // event_id
            ))
        })?;

        let mut snapshot = PortableSnapshot::new();
        for row in rows {
            let (day, text, datetime, minutes, category, event_id) = row?;
            let reminder_minutes = u32::try_from(minutes).map_err(|_| {
                StoreError::Corrupt(format!("reminder_minutes out of range: {minutes}"))
            })?;
            snapshot.entry(day).or_default().push(PortableEvent {
                text,
                datetime,
                reminder_minutes,
                category: category.into(),
                event_id: event_id.map(EventId::from),
            });
        }
        debug!(days = snapshot.len(), "events loaded from sqlite");
        Ok(snapshot)
    }

    fn save(&self, snapshot: &PortableSnapshot) -> Result<()> {
        let mut conn = self.conn.lock().expect("sqlite connection poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM events", [])?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO events
                 (day, position, event_id, text, datetime, reminder_minutes, category)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)",
            )?;
            for (day, events) in snapshot {
                for (position, event) in events.iter().enumerate() {
                    insert.execute(rusqlite::params![
                        day,
                        position as i64,
                        event.event_id.as_ref().map(|id| id.as_str()),
                        event.text,
                        event.datetime,
                        i64::from(event.reminder_minutes),
                        event.category.as_str(),
                    ])?;
                }
            }
        }
        tx.commit()?;
        debug!(days = snapshot.len(), "events saved to sqlite");
        Ok(())
    }
}
