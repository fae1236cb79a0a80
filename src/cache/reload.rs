//! Background recompilation loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use crossbeam::channel::Receiver;

use super::{CompileParameters, Hooks, Reloaded, Snapshot};
use crate::compiler::Compiler;
use crate::error::Result;
use crate::notifier::ChangeEvent;
use crate::scan;

/// Owns everything the reload thread touches.
///
/// The initial compile runs before the thread starts, so the reloader is the
/// only writer of `current` for the whole active lifetime.
pub(super) struct Reloader<C: Compiler> {
    pub(super) params: Arc<CompileParameters>,
    pub(super) compiler: Arc<C>,
    pub(super) current: Arc<ArcSwapOption<Snapshot<C::Artifact>>>,
    pub(super) hooks: Hooks,
    pub(super) closing: Arc<AtomicBool>,
}

impl<C: Compiler> Reloader<C> {
    /// Enumerate and compile the full file set into the next snapshot.
    pub(super) fn compile(&self) -> Result<Snapshot<C::Artifact>> {
        let params = &self.params;
        let sources = scan::collect_files(&params.root, &params.extension)?;
        let artifact = self.compiler.compile(&sources, &params.functions)?;

        let generation = self.current.load_full().map_or(0, |s| s.generation) + 1;
        Ok(Snapshot {
            artifact,
            generation,
            entries: sources.into_iter().map(|s| s.name).collect(),
        })
    }

    /// Consume change events in order until the stream closes or close is
    /// requested. Every relevant event triggers one full recompile.
    pub(super) fn run(self, events: Receiver<ChangeEvent>) {
        for event in events.iter() {
            if self.closing.load(Ordering::SeqCst) {
                break;
            }
            if !self.params.is_relevant(&event) {
                crate::debug!("watch"; "ignored {} {:?}", event.kind.label(), event.paths);
                continue;
            }

            crate::debug!("watch"; "{} {:?}, recompiling", event.kind.label(), event.paths);
            self.recompile();
        }

        crate::debug!("watch"; "reload loop stopped");
    }

    fn recompile(&self) {
        match self.compile() {
            Ok(snapshot) => {
                let reloaded = Reloaded {
                    generation: snapshot.generation,
                    entries: snapshot.entries.len(),
                };
                self.current.store(Some(Arc::new(snapshot)));
                crate::debug!("watch"; "published generation {}", reloaded.generation);

                if let Some(on_reload) = &self.hooks.on_reload {
                    on_reload(&reloaded);
                }
            }
            // Previous snapshot stays published.
            Err(e) => (self.hooks.on_error)(e),
        }
    }
}
