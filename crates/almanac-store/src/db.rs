use rusqlite::Connection;

use crate::error::Result;

/// Initialise the event schema in `conn`.
///
/// Creates the `events` table (idempotent) and an index matching the load
/// order so a reload reads rows back date by date, in insertion order.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS events (
            day              TEXT    NOT NULL,   -- YYYY-MM-DD
            position         INTEGER NOT NULL,   -- order within the day
            event_id         TEXT,
            text             TEXT    NOT NULL,
            datetime         TEXT    NOT NULL,   -- YYYY-MM-DD HH:MM
            reminder_minutes INTEGER NOT NULL,
            category         TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_events_day ON events (day, position);
        ",
    )?;
    Ok(())
}
