//! Error types for the live template cache.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by a template engine.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the cache, its collaborators and the enumeration pass.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to scan `{0}`")]
    Scan(PathBuf, #[source] jwalk::Error),

    #[error("failed to compile templates")]
    Compile(#[source] BoxError),

    #[error("failed to render `{name}`")]
    Render {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to watch `{0}`")]
    Watch(PathBuf, #[source] notify::Error),

    #[error("render data is not serializable")]
    Data(#[from] serde_json::Error),

    #[error("template cache is not active")]
    Inactive,

    #[error("template cache is already active")]
    AlreadyActive,

    #[error("template cache has been closed")]
    Closed,

    #[error("failed to spawn the reload thread")]
    Spawn(#[source] std::io::Error),
}

impl Error {
    /// Wrap an engine error raised while compiling.
    pub fn compile(err: impl Into<BoxError>) -> Self {
        Self::Compile(err.into())
    }

    /// Wrap an engine error raised while rendering `name`.
    pub fn render(name: impl Into<String>, err: impl Into<BoxError>) -> Self {
        Self::Render {
            name: name.into(),
            source: err.into(),
        }
    }
}

/// Render `err` and its whole source chain on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
