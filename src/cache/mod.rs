//! Live template cache.
//!
//! Keeps a compiled artifact of every template under a root fresh while the
//! files change on disk, and lets any number of threads render against it.
//!
//! # Architecture
//!
//! ```text
//! activate ─→ initial compile ─→ publish (generation 1)
//!                                   │
//! Notifier ─→ ChangeEvent ─→ Reloader (own thread) ─→ full recompile ─→ publish (n + 1)
//!                                   │                        │ error
//!                                   ▼                        ▼
//!              execute ←─ ArcSwapOption<Snapshot>        error sink (stale artifact kept)
//! ```
//!
//! Readers load the current snapshot lock-free and keep it alive for the
//! duration of their render, so a concurrent publish never tears a read.

mod reload;


use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Serialize;

use crate::compiler::{Compiler, FunctionTable, TeraCompiler};
use crate::error::{Error, Result, error_chain};
use crate::notifier::{ChangeEvent, FsNotifier, Notifier};
use crate::scan;
use reload::Reloader;

/// Callback receiving errors from background recompilation.
///
/// Runs on the reload thread: it must not block for long and must not call
/// [`LiveCache::close`]. Other cache methods are safe to call from it.
pub type ErrorSink = Arc<dyn Fn(Error) + Send + Sync>;

/// Callback invoked after every successful background publish.
pub type ReloadHook = Arc<dyn Fn(&Reloaded) + Send + Sync>;

/// Summary of a published recompilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reloaded {
    pub generation: u64,
    pub entries: usize,
}

/// Everything a compile needs, fixed at activation.
#[derive(Debug, Clone)]
pub struct CompileParameters {
    pub root: PathBuf,
    pub extension: String,
    pub functions: FunctionTable,
}

impl CompileParameters {
    /// Whether `event` can change the compiled file set.
    ///
    /// Any path that is not a regular file is kept whatever the event kind:
    /// a directory, or a path already gone from disk, may have taken matching
    /// files with it (a directory renamed out of the root arrives as a
    /// modification of a path that no longer exists).
    pub fn is_relevant(&self, event: &ChangeEvent) -> bool {
        if !event.kind.is_content() {
            return false;
        }
        if event.paths.is_empty() {
            return true;
        }

        event.paths.iter().any(|path| {
            scan::matches_extension(path, &self.extension) || !path.is_file()
        })
    }
}

/// One published compilation result.
pub(crate) struct Snapshot<A> {
    pub(crate) artifact: A,
    pub(crate) generation: u64,
    pub(crate) entries: Vec<String>,
}

#[derive(Clone)]
pub(crate) struct Hooks {
    pub(crate) on_error: ErrorSink,
    pub(crate) on_reload: Option<ReloadHook>,
}

enum Phase {
    Idle,
    Active(Worker),
    Closed,
}

/// Handle on the running reload thread.
struct Worker {
    handle: JoinHandle<()>,
    closing: Arc<AtomicBool>,
}

struct Lifecycle<N> {
    notifier: N,
    phase: Phase,
}

/// Live-reloading cache of compiled templates.
///
/// ```no_run
/// use livetmpl::{FunctionTable, LiveCache};
///
/// let cache = LiveCache::new("templates", "tmpl", |err| eprintln!("reload failed: {err}"));
/// cache.activate(FunctionTable::new())?;
///
/// let mut out = Vec::new();
/// cache.execute(&mut out, "index.tmpl", &serde_json::json!({ "title": "home" }), &FunctionTable::new())?;
///
/// cache.close();
/// # Ok::<(), livetmpl::Error>(())
/// ```
pub struct LiveCache<C: Compiler = TeraCompiler, N: Notifier = FsNotifier> {
    root: PathBuf,
    extension: String,
    compiler: Arc<C>,
    current: Arc<ArcSwapOption<Snapshot<C::Artifact>>>,
    hooks: Hooks,
    lifecycle: Mutex<Lifecycle<N>>,
}

impl LiveCache {
    /// Cache over `root` for files with `extension`, watching the file system.
    pub fn new<F>(root: impl Into<PathBuf>, extension: impl Into<String>, on_error: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        Self::builder(root, extension).on_error(on_error).build()
    }

    pub fn builder(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> LiveCacheBuilder<TeraCompiler, FsNotifier> {
        LiveCacheBuilder {
            root: root.into(),
            extension: extension.into(),
            compiler: TeraCompiler::new(),
            notifier: FsNotifier::new(),
            hooks: Hooks {
                on_error: Arc::new(log_reload_error),
                on_reload: None,
            },
        }
    }
}

impl<C: Compiler, N: Notifier> LiveCache<C, N> {
    /// Compile everything under the root and start watching for changes.
    ///
    /// On error nothing is published and no watcher runs; activation may be
    /// retried. Activating an active cache fails with [`Error::AlreadyActive`],
    /// a closed one with [`Error::Closed`].
    pub fn activate(&self, functions: FunctionTable) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.phase {
            Phase::Idle => {}
            Phase::Active(_) => return Err(Error::AlreadyActive),
            Phase::Closed => return Err(Error::Closed),
        }

        let closing = Arc::new(AtomicBool::new(false));
        let reloader = Reloader {
            params: Arc::new(CompileParameters {
                root: self.root.clone(),
                extension: self.extension.clone(),
                functions,
            }),
            compiler: Arc::clone(&self.compiler),
            current: Arc::clone(&self.current),
            hooks: self.hooks.clone(),
            closing: Arc::clone(&closing),
        };

        let snapshot = reloader.compile()?;
        crate::debug!("watch"; "activated with {} templates", snapshot.entries.len());
        self.current.store(Some(Arc::new(snapshot)));

        let events = match lifecycle.notifier.start(&self.root) {
            Ok(events) => events,
            Err(e) => {
                self.current.store(None);
                return Err(e);
            }
        };

        let spawned = thread::Builder::new()
            .name("livetmpl-reload".into())
            .spawn(move || reloader.run(events));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                lifecycle.notifier.stop();
                self.current.store(None);
                return Err(Error::Spawn(e));
            }
        };

        lifecycle.phase = Phase::Active(Worker { handle, closing });
        Ok(())
    }

    /// Render entry `name` of the current artifact into `out`.
    ///
    /// `overrides` are visible to this call only. Concurrent callers, and a
    /// recompilation in progress, are unaffected.
    pub fn execute<T>(
        &self,
        mut out: impl Write,
        name: &str,
        data: &T,
        overrides: &FunctionTable,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let snapshot = self.current.load_full().ok_or(Error::Inactive)?;
        let data = serde_json::to_value(data)?;
        self.compiler
            .render(&snapshot.artifact, &mut out, name, &data, overrides)
    }

    /// Render entry `name` into a string, without overrides.
    pub fn render_to_string<T>(&self, name: &str, data: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let mut out = Vec::new();
        self.execute(&mut out, name, data, &FunctionTable::new())?;
        String::from_utf8(out).map_err(|e| Error::render(name, e))
    }

    /// Stop watching and wait for the reload thread to exit.
    ///
    /// A recompilation already running is finished first; queued events are
    /// discarded. The last published artifact stays available to `execute`.
    /// Calling `close` again is a no-op, and returns without waiting.
    /// Closing from the reload thread itself (the cache dropped inside a hook)
    /// does not wait either.
    pub fn close(&self) {
        let worker = {
            let mut lifecycle = self.lifecycle.lock();
            let Phase::Active(worker) = std::mem::replace(&mut lifecycle.phase, Phase::Closed)
            else {
                return;
            };
            worker.closing.store(true, Ordering::SeqCst);
            lifecycle.notifier.stop();
            worker
        };

        // Dropped from a hook: the loop sees `closing` once the hook returns.
        if worker.handle.thread().id() == thread::current().id() {
            crate::debug!("watch"; "closed {} from the reload thread", self.root.display());
            return;
        }

        if worker.handle.join().is_err() {
            crate::log!("error"; "reload thread panicked");
        }
        crate::debug!("watch"; "closed {}", self.root.display());
    }

    pub fn is_active(&self) -> bool {
        matches!(self.lifecycle.lock().phase, Phase::Active(_))
    }

    /// Version of the published artifact: 0 before activation, 1 after the
    /// initial compile, incremented by every successful recompilation.
    pub fn generation(&self) -> u64 {
        self.current.load_full().map_or(0, |s| s.generation)
    }

    /// Entry names of the published artifact, in enumeration order.
    pub fn entries(&self) -> Vec<String> {
        self.current
            .load_full()
            .map(|s| s.entries.clone())
            .unwrap_or_default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl<C: Compiler, N: Notifier> Drop for LiveCache<C, N> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Configures and creates a [`LiveCache`].
pub struct LiveCacheBuilder<C, N> {
    root: PathBuf,
    extension: String,
    compiler: C,
    notifier: N,
    hooks: Hooks,
}

impl<C: Compiler, N: Notifier> LiveCacheBuilder<C, N> {
    /// Receive background recompilation errors. Defaults to logging them.
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.hooks.on_error = Arc::new(on_error);
        self
    }

    /// Be told about every successful background recompilation.
    pub fn on_reload<F>(mut self, on_reload: F) -> Self
    where
        F: Fn(&Reloaded) + Send + Sync + 'static,
    {
        self.hooks.on_reload = Some(Arc::new(on_reload));
        self
    }

    pub fn compiler<C2: Compiler>(self, compiler: C2) -> LiveCacheBuilder<C2, N> {
        LiveCacheBuilder {
            root: self.root,
            extension: self.extension,
            compiler,
            notifier: self.notifier,
            hooks: self.hooks,
        }
    }

    pub fn notifier<N2: Notifier>(self, notifier: N2) -> LiveCacheBuilder<C, N2> {
        LiveCacheBuilder {
            root: self.root,
            extension: self.extension,
            compiler: self.compiler,
            notifier,
            hooks: self.hooks,
        }
    }

    pub fn build(self) -> LiveCache<C, N> {
        LiveCache {
            root: self.root,
            extension: self.extension,
            compiler: Arc::new(self.compiler),
            current: Arc::new(ArcSwapOption::empty()),
            hooks: self.hooks,
            lifecycle: Mutex::new(Lifecycle {
                notifier: self.notifier,
                phase: Phase::Idle,
            }),
        }
    }
}

fn log_reload_error(err: Error) {
    crate::log!("error"; "{}", error_chain(&err));
}
