//! Change notification seam.
//!
//! A [`Notifier`] watches a directory subtree and streams [`ChangeEvent`]s over
//! a crossbeam channel. Stopping the notifier closes the stream, which is how
//! the reload loop learns it should exit.
//!
//! ```text
//! FsNotifier      notify watcher → ChangeEvent ─┐
//!                                               ├→ Outlet → Receiver<ChangeEvent>
//! ChannelNotifier EventEmitter   → ChangeEvent ─┘
//! ```

mod channel;
mod fs;

pub use channel::{ChannelNotifier, EventEmitter};
pub use fs::FsNotifier;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::Result;

/// What happened to the watched paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    /// Access, metadata-only and unclassified events.
    Other,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Other => "other",
        }
    }

    /// Whether the event can change the compiled file set.
    pub fn is_content(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A single file-system change under the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub paths: Vec<PathBuf>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, paths: Vec<PathBuf>) -> Self {
        Self { kind, paths }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Created, vec![path.into()])
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Modified, vec![path.into()])
    }

    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Removed, vec![path.into()])
    }
}

/// Source of change events for a directory subtree.
pub trait Notifier: Send + 'static {
    /// Start watching `root`. The returned stream stays open until [`stop`](Self::stop).
    fn start(&mut self, root: &Path) -> Result<Receiver<ChangeEvent>>;

    /// Stop watching and close the stream. Safe to call more than once.
    fn stop(&mut self);
}

/// The single sending end of a notifier stream.
///
/// The sender lives behind a shared slot so that [`close`](Self::close) drops
/// it no matter how many producers hold the outlet; once closed, the receiver
/// drains and then disconnects.
#[derive(Clone, Default)]
pub(crate) struct Outlet {
    slot: Arc<Mutex<Option<Sender<ChangeEvent>>>>,
}

impl Outlet {
    /// Open a fresh stream, replacing (and closing) any previous one.
    pub(crate) fn open(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = unbounded();
        *self.slot.lock() = Some(tx);
        rx
    }

    /// Push an event; returns `false` if the stream is closed or never opened.
    pub(crate) fn send(&self, event: ChangeEvent) -> bool {
        match self.slot.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub(crate) fn close(&self) {
        self.slot.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlet_close_disconnects() {
        let outlet = Outlet::default();
        assert!(!outlet.send(ChangeEvent::created("/tmp/a.tmpl")));

        let rx = outlet.open();
        assert!(outlet.send(ChangeEvent::modified("/tmp/a.tmpl")));
        outlet.close();
        assert!(!outlet.send(ChangeEvent::removed("/tmp/a.tmpl")));

        // Buffered event is still delivered, then the stream ends.
        assert_eq!(rx.recv().unwrap().kind, ChangeKind::Modified);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_change_kind_is_content() {
        assert!(ChangeKind::Created.is_content());
        assert!(ChangeKind::Modified.is_content());
        assert!(ChangeKind::Removed.is_content());
        assert!(!ChangeKind::Other.is_content());
    }
}
