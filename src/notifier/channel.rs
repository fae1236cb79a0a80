use std::path::Path;

use crossbeam::channel::Receiver;

use super::{ChangeEvent, Notifier, Outlet};
use crate::error::Result;

/// Notifier fed by hand through an [`EventEmitter`].
///
/// For embedders that already run their own watcher (or none at all) and want
/// to drive reloads themselves.
pub struct ChannelNotifier {
    outlet: Outlet,
}

/// Producer handle paired with a [`ChannelNotifier`].
#[derive(Clone)]
pub struct EventEmitter {
    outlet: Outlet,
}

impl ChannelNotifier {
    pub fn new() -> (Self, EventEmitter) {
        let outlet = Outlet::default();
        let emitter = EventEmitter {
            outlet: outlet.clone(),
        };
        (Self { outlet }, emitter)
    }
}

impl Notifier for ChannelNotifier {
    fn start(&mut self, _root: &Path) -> Result<Receiver<ChangeEvent>> {
        Ok(self.outlet.open())
    }

    fn stop(&mut self) {
        self.outlet.close();
    }
}

impl EventEmitter {
    /// Push `event` to the running notifier.
    ///
    /// Returns `false` before the notifier is started and after it is stopped.
    pub fn emit(&self, event: ChangeEvent) -> bool {
        self.outlet.send(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::ChangeKind;

    #[test]
    fn test_emit_lifecycle() {
        let (mut notifier, emitter) = ChannelNotifier::new();
        assert!(!emitter.emit(ChangeEvent::created("a.tmpl")));

        let rx = notifier.start(Path::new(".")).unwrap();
        assert!(emitter.emit(ChangeEvent::created("a.tmpl")));
        assert_eq!(rx.recv().unwrap().kind, ChangeKind::Created);

        notifier.stop();
        assert!(!emitter.emit(ChangeEvent::removed("a.tmpl")));
        assert!(rx.recv().is_err());
    }
}
