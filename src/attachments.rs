//! Images embedded in notes, mirrored next to the page they belong to.
//!
//! Bear keeps one row per file in `ZSFNOTEFILE` and the bytes under
//! `Local Files/Note Images/<ZUNIQUEIDENTIFIER>/<ZFILENAME>`.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::source::open_db;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
}

pub trait AttachmentStore {
    /// Attachments of the note with primary key `note_pk`, in database order.
    fn list(&self, note_pk: i64) -> Result<Vec<Attachment>>;

    fn read(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}

/// A store without any attachments.
pub struct NoAttachments;

impl AttachmentStore for NoAttachments {
    fn list(&self, _note_pk: i64) -> Result<Vec<Attachment>> {
        Ok(Vec::new())
    }

    fn read(&self, _attachment: &Attachment) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

pub struct BearAttachments {
    conn: Connection,
    images_dir: PathBuf,
}

impl BearAttachments {
    pub fn open(db_path: &Path, images_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            conn: open_db(db_path)?,
            images_dir,
        })
    }
}

/// Where Bear keeps note images, relative to its database file.
pub fn default_images_dir(db_path: &Path) -> PathBuf {
    let container = db_path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    container.join("Application Data/Local Files/Note Images")
}

impl AttachmentStore for BearAttachments {
    fn list(&self, note_pk: i64) -> Result<Vec<Attachment>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT ZUNIQUEIDENTIFIER, ZFILENAME FROM ZSFNOTEFILE WHERE ZNOTE = ?1 ORDER BY Z_PK",
        )?;
        let rows = stmt.query_map([note_pk], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
            ))
        })?;

        let mut attachments = Vec::new();
        for row in rows {
            match row? {
                (Some(id), Some(filename)) => attachments.push(Attachment { id, filename }),
                _ => log::warn!("Skipping malformed attachment row for note {}", note_pk),
            }
        }
        Ok(attachments)
    }

    fn read(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let path = self
            .images_dir
            .join(&attachment.id)
            .join(&attachment.filename);
        fs::read(&path).map_err(|source| Error::ReadAttachment { path, source })
    }
}

/// Copy the attachments of `note_pk` into `dir`.
///
/// Files already holding the same bytes are left alone. Failures are logged
/// and never fail the page itself. Returns the number of files written.
pub fn mirror(store: &dyn AttachmentStore, note_pk: i64, dir: &Path) -> usize {
    let attachments = match store.list(note_pk) {
        Ok(a) => a,
        Err(e) => {
            log::warn!("Could not list attachments of note {}: {}", note_pk, e);
            return 0;
        }
    };

    let mut copied = 0;
    for attachment in attachments {
        // Only the final path component, so a filename can't escape `dir`.
        let Some(name) = Path::new(&attachment.filename).file_name() else {
            log::warn!(
                "Skipping attachment with odd filename {:?}",
                attachment.filename
            );
            continue;
        };
        let dest = dir.join(name);

        let data = match store.read(&attachment) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };

        if fs::read(&dest).is_ok_and(|current| current == data) {
            log::debug!("Attachment {} is up to date", dest.display());
            continue;
        }

        log::info!("Copying {} to {}", attachment.filename, dest.display());
        match fs::write(&dest, &data) {
            Ok(()) => copied += 1,
            Err(source) => log::warn!("{}", Error::WriteAttachment { path: dest, source }),
        }
    }
    copied
}
