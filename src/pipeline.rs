//! Poller and publisher, joined by a one-slot channel.
//!
//! The poller queries the source, filters out notes whose body hasn't
//! changed since the last poll, and hands the rest to the publisher one at a
//! time. The publisher transforms and writes each note. On shutdown the
//! poller stops at once; the publisher finishes whatever was already queued.

use std::ops::ControlFlow;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick};

use crate::attachments::AttachmentStore;
use crate::error::Result;
use crate::note::{Note, TransformOptions, transform};
use crate::source::{NoteSource, Seen, SeenCache};
use crate::writer::{DocumentWriter, WriteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Poll once, publish everything found, exit.
    Once,
    /// Poll every `interval` until shutdown.
    Watch { interval: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Created,
    Updated,
    Unchanged,
    /// The note has no tag line where the configuration says it should be.
    Skipped,
}

impl From<WriteResult> for ProcessResult {
    fn from(result: WriteResult) -> Self {
        match result {
            WriteResult::Created => Self::Created,
            WriteResult::Updated => Self::Updated,
            WriteResult::Unchanged => Self::Unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl Summary {
    fn record(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Created => self.created += 1,
            ProcessResult::Updated => self.updated += 1,
            ProcessResult::Unchanged => self.unchanged += 1,
            ProcessResult::Skipped => self.skipped += 1,
        }
    }
}

/// Everything the publisher needs besides the notes themselves.
pub struct Publisher<'a, A> {
    pub options: &'a TransformOptions,
    pub writer: &'a DocumentWriter,
    pub attachments: A,
}

/// Transform and write a single note.
pub fn process_note(
    note: &Note,
    options: &TransformOptions,
    writer: &DocumentWriter,
    attachments: &dyn AttachmentStore,
) -> Result<ProcessResult> {
    log::debug!("Handling {}", note.title);
    let Some(page) = transform(note, options) else {
        return Ok(ProcessResult::Skipped);
    };
    let result = writer.write(&page, attachments)?;
    let path = writer.page_path(&page);
    match result {
        WriteResult::Created => log::info!("Created {}", path.display()),
        WriteResult::Updated => log::info!("Updated {}", path.display()),
        WriteResult::Unchanged => log::debug!("{} is unchanged", path.display()),
    }
    Ok(result.into())
}

/// Run the poller on this thread and the publisher on a scoped one.
///
/// `shutdown` fires when it receives a message or its sender is dropped.
/// A note that fails to publish is forgotten by `cache`, so the next poll
/// offers it again.
pub fn run<S, A>(
    mut source: S,
    publisher: Publisher<'_, A>,
    cache: &SeenCache,
    note_tag: &str,
    mode: Mode,
    shutdown: &Receiver<()>,
) -> Summary
where
    S: NoteSource,
    A: AttachmentStore + Send,
{
    let (tx, rx) = bounded::<Note>(1);

    let summary = std::thread::scope(|s| {
        let consumer = s.spawn(move || publish(rx, publisher, cache));

        match mode {
            Mode::Once => {
                if poll(&mut source, &tx, cache, note_tag, shutdown).is_break() {
                    log::debug!("Poll stopped before queueing every note");
                }
            }
            Mode::Watch { interval } => {
                log::info!("Watching Bear tag #{} for changes", note_tag);
                watch(&mut source, &tx, cache, note_tag, interval, shutdown);
            }
        }
        // Closing the channel lets the publisher drain and return.
        drop(tx);

        consumer.join().unwrap_or_else(|_| {
            log::error!("Publisher thread panicked");
            Summary::default()
        })
    });

    log::info!(
        "Done. {} created, {} updated, {} unchanged, {} skipped. Errors: {}",
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.skipped,
        summary.errors,
    );
    summary
}

fn watch<S: NoteSource>(
    source: &mut S,
    tx: &Sender<Note>,
    cache: &SeenCache,
    note_tag: &str,
    interval: Duration,
    shutdown: &Receiver<()>,
) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => {
                if poll(source, tx, cache, note_tag, shutdown).is_break() {
                    break;
                }
            }
            recv(shutdown) -> _ => break,
        }
    }
    log::info!("Poller exiting");
}

/// Query the source once and queue every new or changed note.
fn poll<S: NoteSource>(
    source: &mut S,
    tx: &Sender<Note>,
    cache: &SeenCache,
    note_tag: &str,
    shutdown: &Receiver<()>,
) -> ControlFlow<()> {
    let notes = match source.fetch_tagged(note_tag) {
        Ok(notes) => notes,
        Err(e) => {
            log::error!("Polling Bear failed: {}", e);
            return ControlFlow::Continue(());
        }
    };

    for note in notes {
        match cache.observe(&note) {
            Seen::Unchanged => continue,
            Seen::New => log::info!("Not cached note {} - possibly publishing", note.title),
            Seen::Changed => log::info!("Differences detected in {} - updating Hugo", note.title),
        }

        let title = note.title.clone();
        select! {
            send(tx, note) -> res => {
                if res.is_err() {
                    log::error!("Publisher is gone, dropping {}", title);
                    return ControlFlow::Break(());
                }
            }
            recv(shutdown) -> _ => {
                log::info!("Shutdown requested, not queueing {}", title);
                return ControlFlow::Break(());
            }
        }
    }
    ControlFlow::Continue(())
}

fn publish<A: AttachmentStore>(
    rx: Receiver<Note>,
    publisher: Publisher<'_, A>,
    cache: &SeenCache,
) -> Summary {
    let mut summary = Summary::default();
    // Ends once the poller has dropped its sender and the queue is empty.
    for note in rx {
        match process_note(
            &note,
            publisher.options,
            publisher.writer,
            &publisher.attachments,
        ) {
            Ok(result) => summary.record(result),
            Err(e) => {
                log::error!("Failed to publish {}: {}", note.title, e);
                cache.forget(&note);
                summary.errors += 1;
            }
        }
    }
    log::debug!("Publisher exiting");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::{Attachment, NoAttachments};
    use crate::frontmatter::ManagedKeys;
    use crate::writer::INDEX_FILE;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Serves a scripted sequence of poll results, then empty polls.
    struct Scripted(Vec<Vec<Note>>);

    impl NoteSource for Scripted {
        fn fetch_tagged(&mut self, _tag: &str) -> Result<Vec<Note>> {
            if self.0.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(self.0.remove(0))
            }
        }
    }

    /// Takes `delay` to list a note's attachments, so each write is slow.
    struct SlowAttachments {
        delay: Duration,
    }

    impl AttachmentStore for SlowAttachments {
        fn list(&self, _note_pk: i64) -> Result<Vec<Attachment>> {
            std::thread::sleep(self.delay);
            Ok(Vec::new())
        }

        fn read(&self, _attachment: &Attachment) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn note(title: &str, body: &str) -> Note {
        Note {
            pk: 1,
            unique_id: String::new(),
            title: title.into(),
            raw_body: body.as_bytes().to_vec(),
            creation_timestamp: 43_200.0,
        }
    }

    fn options() -> TransformOptions {
        TransformOptions {
            note_tag: "blog".into(),
            tag_line: -1,
            omit_non_note_tag_prefix: true,
            categories: true,
            tags: false,
            time_format: "%Y-%m-%d".into(),
        }
    }

    fn run_once(source: Scripted, root: &Path, cache: &SeenCache) -> Summary {
        let options = options();
        let writer = DocumentWriter::new(root.to_path_buf(), ManagedKeys::new(true, false));
        let (_keep, shutdown) = bounded::<()>(1);
        run(
            source,
            Publisher {
                options: &options,
                writer: &writer,
                attachments: NoAttachments,
            },
            cache,
            "blog",
            Mode::Once,
            &shutdown,
        )
    }

    #[test]
    fn test_once_publishes_and_skips() {
        let root = TempDir::new().unwrap();
        let cache = SeenCache::new();
        let source = Scripted(vec![vec![
            note("First Post", "# First Post\n\nHello\n#blog/rust"),
            note("Lonely", "#blog"),
        ]]);

        let summary = run_once(source, root.path(), &cache);

        // "Lonely" only has a title line, which is also its tag line.
        assert_eq!(summary.created, 2);
        assert_eq!(summary.errors, 0);
        let page = root.path().join("first-post").join(INDEX_FILE);
        assert_eq!(
            fs::read_to_string(page).unwrap(),
            "---\ntitle: \"First Post\"\ndate: 2001-01-01\ncategories: [\"Rust\"]\ndraft: false\n---\n\nHello"
        );
    }

    #[test]
    fn test_duplicate_bodies_are_filtered() {
        let root = TempDir::new().unwrap();
        let cache = SeenCache::new();
        let n = note("Post", "# Post\nbody\n#blog");
        run_once(Scripted(vec![vec![n.clone()]]), root.path(), &cache);

        let summary = run_once(Scripted(vec![vec![n]]), root.path(), &cache);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_failed_write_is_retried_next_poll() {
        let root = TempDir::new().unwrap();
        let cache = SeenCache::new();
        let n = note("Blocked", "# Blocked\nbody\n#blog");
        // A file where the bundle directory should be.
        fs::write(root.path().join("blocked"), "").unwrap();

        let summary = run_once(Scripted(vec![vec![n.clone()]]), root.path(), &cache);
        assert_eq!(summary.errors, 1);
        assert!(cache.is_empty());

        fs::remove_file(root.path().join("blocked")).unwrap();
        let summary = run_once(Scripted(vec![vec![n]]), root.path(), &cache);
        assert_eq!(summary.created, 1);
    }

    #[test]
    fn test_watch_stops_on_shutdown_after_draining() {
        let root = TempDir::new().unwrap();
        let cache = SeenCache::new();
        let options = options();
        let managed = ManagedKeys::new(true, false);
        let writer = DocumentWriter::new(root.path().to_path_buf(), managed);
        let (stop, shutdown) = bounded::<()>(1);
        let source = Scripted(vec![vec![
            note("One", "# One\nbody\n#blog"),
            note("Two", "# Two\nbody\n#blog"),
        ]]);

        let summary = std::thread::scope(|s| {
            let handle = s.spawn(|| {
                run(
                    source,
                    Publisher {
                        options: &options,
                        writer: &writer,
                        attachments: NoAttachments,
                    },
                    &cache,
                    "blog",
                    Mode::Watch {
                        interval: Duration::from_millis(10),
                    },
                    &shutdown,
                )
            });
            // Wait for both pages before asking the watcher to stop.
            let deadline = std::time::Instant::now() + Duration::from_secs(10);
            while !root.path().join("two").join(INDEX_FILE).exists()
                && std::time::Instant::now() < deadline
            {
                std::thread::sleep(Duration::from_millis(10));
            }
            drop(stop);
            handle.join().unwrap()
        });

        assert_eq!(summary.created, 2);
        assert!(root.path().join("one").join(INDEX_FILE).exists());
    }

    #[test]
    fn test_shutdown_keeps_queued_notes() {
        let root = TempDir::new().unwrap();
        let cache = SeenCache::new();
        let options = options();
        let managed = ManagedKeys::new(true, false);
        let writer = DocumentWriter::new(root.path().to_path_buf(), managed);
        let (stop, shutdown) = bounded::<()>(1);
        let source = Scripted(vec![vec![
            note("One", "# One\nbody\n#blog"),
            note("Two", "# Two\nbody\n#blog"),
            note("Three", "# Three\nbody\n#blog"),
            note("Four", "# Four\nbody\n#blog"),
        ]]);

        let summary = std::thread::scope(|s| {
            let handle = s.spawn(|| {
                run(
                    source,
                    Publisher {
                        options: &options,
                        writer: &writer,
                        attachments: SlowAttachments {
                            delay: Duration::from_millis(300),
                        },
                    },
                    &cache,
                    "blog",
                    Mode::Watch {
                        interval: Duration::from_millis(10),
                    },
                    &shutdown,
                )
            });
            // "One" is being written, "Two" waits in the channel and the
            // poller is blocked on "Three".
            std::thread::sleep(Duration::from_millis(100));
            assert!(!root.path().join("one").join(INDEX_FILE).exists());
            stop.send(()).unwrap();
            handle.join().unwrap()
        });

        assert_eq!(summary.created, 2);
        assert_eq!(summary.errors, 0);
        assert!(root.path().join("one").join(INDEX_FILE).exists());
        assert!(root.path().join("two").join(INDEX_FILE).exists());
        assert!(!root.path().join("three").exists());
        assert!(!root.path().join("four").exists());
    }
}
