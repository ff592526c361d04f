use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::attachments::{self, AttachmentStore};
use crate::error::{Error, Result};
use crate::frontmatter::{ManagedKeys, parse_custom_front_matter};
use crate::note::TransformedNote;
use crate::renderer;

pub const INDEX_FILE: &str = "index.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Unchanged,
}

/// Writes page bundles under `<hugo_dir>/<content_dir>`.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    content_root: PathBuf,
    managed: ManagedKeys,
}

impl DocumentWriter {
    pub fn new(content_root: PathBuf, managed: ManagedKeys) -> Self {
        Self {
            content_root,
            managed,
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Create the content root and check that we can write into it.
    pub fn ensure_root(&self) -> Result<()> {
        let root = &self.content_root;
        fs::create_dir_all(root)
            .and_then(|()| tempfile::tempfile_in(root).map(drop))
            .map_err(|source| Error::OutputRoot {
                path: root.clone(),
                source,
            })
    }

    pub fn page_path(&self, note: &TransformedNote) -> PathBuf {
        self.content_root.join(&note.slug).join(INDEX_FILE)
    }

    /// Render `note` into its bundle, replacing `index.md` only if the bytes
    /// change.
    ///
    /// Custom front matter already present in `index.md` is carried over.
    /// The new page is written to a temporary file in the bundle and renamed
    /// into place, so readers never see a partial page.
    pub fn write(
        &self,
        note: &TransformedNote,
        store: &dyn AttachmentStore,
    ) -> Result<WriteResult> {
        let dir = self.content_root.join(&note.slug);
        fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
            path: dir.clone(),
            source,
        })?;

        attachments::mirror(store, note.pk, &dir);

        let path = dir.join(INDEX_FILE);
        let existing = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(Error::ReadDocument { path, source }),
        };

        let custom = match &existing {
            Some(bytes) if !bytes.is_empty() => {
                parse_custom_front_matter(&String::from_utf8_lossy(bytes), &self.managed)
            }
            _ => Vec::new(),
        };

        let rendered = renderer::render_to_vec(note, &custom);
        let temp = write_temp(&dir, &rendered)?;

        if existing.as_deref() == Some(rendered.as_slice()) {
            // Dropping the temp file deletes it.
            drop(temp);
            return Ok(WriteResult::Unchanged);
        }

        temp.persist(&path).map_err(|e| Error::Persist {
            path: path.clone(),
            source: e.error,
        })?;

        Ok(if existing.is_some() {
            WriteResult::Updated
        } else {
            WriteResult::Created
        })
    }
}

fn write_temp(dir: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let to_error = |source| Error::WriteTemp {
        dir: dir.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".index")
        .suffix(".md.tmp")
        .tempfile_in(dir)
        .map_err(to_error)?;

    // NamedTempFile is created 0600; pages should stay readable like any
    // other file in the site.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(to_error)?;
    }

    temp.write_all(contents).map_err(to_error)?;
    temp.flush().map_err(to_error)?;
    Ok(temp)
}
