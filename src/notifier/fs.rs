use std::path::Path;

use crossbeam::channel::Receiver;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{ChangeEvent, ChangeKind, Notifier, Outlet};
use crate::error::{Error, Result};

/// Recursive file-system notifier on top of `notify`'s recommended backend.
#[derive(Default)]
pub struct FsNotifier {
    /// Watcher handle (must be kept alive while watching)
    watcher: Option<RecommendedWatcher>,
    outlet: Outlet,
}

impl FsNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for FsNotifier {
    fn start(&mut self, root: &Path) -> Result<Receiver<ChangeEvent>> {
        let rx = self.outlet.open();

        let outlet = self.outlet.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let kind = classify(&event.kind);
                    crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
                    outlet.send(ChangeEvent::new(kind, event.paths));
                }
                Err(e) => crate::debug!("watch"; "notify error: {}", e),
            }
        });

        let mut watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                self.outlet.close();
                return Err(Error::Watch(root.to_path_buf(), e));
            }
        };

        if let Err(e) = watcher.watch(root, RecursiveMode::Recursive) {
            self.outlet.close();
            return Err(Error::Watch(root.to_path_buf(), e));
        }

        self.watcher = Some(watcher);
        Ok(rx)
    }

    fn stop(&mut self) {
        // Close first: late events from the backend thread are dropped.
        self.outlet.close();
        self.watcher.take();
    }
}

/// Map a notify event kind onto the cache's coarse classification.
fn classify(kind: &EventKind) -> ChangeKind {
    use notify::event::ModifyKind;

    match kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        // Metadata-only changes (mtime/atime/chmod) never alter template content
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Other,
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => ChangeKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};
    use tempfile::TempDir;

    #[test]
    fn test_classify_event_kinds() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            ChangeKind::Created
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            ChangeKind::Removed
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            ChangeKind::Modified
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))),
            ChangeKind::Other
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Any)),
            ChangeKind::Other
        );
    }

    #[test]
    fn test_start_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let mut notifier = FsNotifier::new();
        let err = notifier.start(&missing).unwrap_err();
        assert!(matches!(err, Error::Watch(path, _) if path == missing));
    }

    #[test]
    fn test_stop_closes_stream() {
        let temp = TempDir::new().unwrap();

        let mut notifier = FsNotifier::new();
        let rx = notifier.start(temp.path()).unwrap();
        notifier.stop();
        notifier.stop();

        // Drain anything the backend delivered before stop, then disconnect.
        while rx.recv().is_ok() {}
    }
}
