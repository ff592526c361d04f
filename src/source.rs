//! Reading tagged notes out of Bear's SQLite database.
//!
//! Relevant part of the schema (Core Data naming):
//! ```sql
//! CREATE TABLE ZSFNOTE (
//!     Z_PK              INTEGER PRIMARY KEY,
//!     ZUNIQUEIDENTIFIER VARCHAR,
//!     ZTITLE            VARCHAR,
//!     ZTEXT             VARCHAR,
//!     ZCREATIONDATE     TIMESTAMP,   -- seconds since 2001-01-01
//!     ...
//! );
//! ```
//!
//! The database is opened read-only and never locked by us.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};

use crate::error::Result;
use crate::note::Note;

const TAGGED_NOTES_QUERY: &str = "SELECT Z_PK, ZUNIQUEIDENTIFIER, ZTITLE, ZTEXT, ZCREATIONDATE \
     FROM ZSFNOTE WHERE ZTEXT LIKE ?1 ORDER BY Z_PK";

pub(crate) fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch("PRAGMA cache_size = -4096;")?;
    Ok(conn)
}

/// Something that can list the notes carrying a tag.
pub trait NoteSource {
    /// Notes whose body contains `#<tag>` anywhere. This is a plain
    /// substring match: `#blogroll` matches tag `blog` too.
    fn fetch_tagged(&mut self, tag: &str) -> Result<Vec<Note>>;
}

pub struct BearDatabase {
    conn: Connection,
}

impl BearDatabase {
    /// Open the database and make sure it looks like a Bear store.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        conn.prepare(TAGGED_NOTES_QUERY)?;
        Ok(Self { conn })
    }
}

impl NoteSource for BearDatabase {
    fn fetch_tagged(&mut self, tag: &str) -> Result<Vec<Note>> {
        let pattern = format!("%#{}%", tag);
        let mut stmt = self.conn.prepare_cached(TAGGED_NOTES_QUERY)?;
        let rows = stmt.query_map([pattern], note_from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            match row? {
                Some(note) => notes.push(note),
                None => log::warn!("Skipping note row without title or text"),
            }
        }
        Ok(notes)
    }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Option<Note>> {
    let pk: i64 = row.get(0)?;
    let unique_id: Option<String> = row.get(1)?;
    let title: Option<String> = row.get(2)?;
    // Bear stores ZTEXT as TEXT, but accept blobs as well.
    let raw_body = match row.get_ref(3)? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
        _ => None,
    };
    let creation_timestamp: Option<f64> = row.get(4)?;

    let (Some(title), Some(raw_body)) = (title, raw_body) else {
        return Ok(None);
    };
    Ok(Some(Note {
        pk,
        unique_id: unique_id.unwrap_or_default(),
        title,
        raw_body,
        creation_timestamp: creation_timestamp.unwrap_or_default(),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seen {
    New,
    Changed,
    Unchanged,
}

/// Last body seen for each note title, shared by the poller and the writer.
#[derive(Debug, Default)]
pub struct SeenCache {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
}

impl SeenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `note` and report whether it differs from the last sighting.
    pub fn observe(&self, note: &Note) -> Seen {
        let mut bodies = self.bodies.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = match bodies.get(&note.title) {
            None => Seen::New,
            Some(body) if *body == note.raw_body => return Seen::Unchanged,
            Some(_) => Seen::Changed,
        };
        bodies.insert(note.title.clone(), note.raw_body.clone());
        seen
    }

    /// Drop the record of `note` so the next poll offers it again.
    ///
    /// Nothing happens if a newer body has been observed since.
    pub fn forget(&self, note: &Note) {
        let mut bodies = self.bodies.lock().unwrap_or_else(PoisonError::into_inner);
        if bodies.get(&note.title) == Some(&note.raw_body) {
            bodies.remove(&note.title);
        }
    }

    pub fn len(&self) -> usize {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
