//! Live-reloading template cache.
//!
//! [`LiveCache`] compiles every template under a root directory into one
//! artifact, watches the directory, and recompiles the whole set whenever a
//! template is created, modified or removed. Any number of threads can render
//! against the cache at any time; a render always sees one complete compiled
//! version, and a failed recompile keeps the previous version serving.
//!
//! # Module Structure
//!
//! ```text
//! cache/      # LiveCache, activation, reload loop, shutdown
//! compiler/   # Compiler trait, FunctionTable, tera backend
//! notifier/   # Notifier trait, notify-backed and channel-fed notifiers
//! scan        # template file enumeration
//! config/     # livetmpl.toml
//! error       # Error
//! logger      # log!/debug! macros
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod logger;
pub mod notifier;
pub mod scan;

pub use cache::{CompileParameters, ErrorSink, LiveCache, LiveCacheBuilder, ReloadHook, Reloaded};
pub use compiler::{Compiler, FunctionTable, TemplateFn, TeraCompiler};
pub use error::{BoxError, Error, Result, error_chain};
pub use notifier::{ChangeEvent, ChangeKind, ChannelNotifier, EventEmitter, FsNotifier, Notifier};
pub use scan::SourceFile;
