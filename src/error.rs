//! Error taxonomy for the playground.
//!
//! Nothing here is fatal to the component: compile and eval errors are
//! captured into [`CompileResult`](crate::compiler::CompileResult) and shown
//! inline in the panels, load errors are recorded per plugin entry, and
//! persistence errors are logged and swallowed. Only [`ReplError`] escapes,
//! and only from the terminal event loop.

use std::io;

/// Failure while running the terminal app loop.
#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    /// IO error during terminal operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// No transformer was injected before building the repl.
    #[error("no transformer set. Call .transformer() before .build()")]
    NoTransformer,
    /// No plugin fetcher was injected before building the repl.
    #[error("no plugin fetcher set. Call .fetcher() before .build()")]
    NoFetcher,
}

/// Error raised by the transform step.
///
/// Carries the message verbatim; the view renders it under the compiled
/// panel rather than propagating it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compile error: {0}")]
pub struct CompileError(pub String);

/// Error raised while executing compiled output (evaluate mode only).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("eval error: {0}")]
pub struct EvalError(pub String);

/// Asynchronous plugin load failure.
///
/// Non-fatal: recorded as `did_error` on the entry, which silently drops the
/// plugin's effect from compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load plugin {package}: {reason}")]
pub struct LoadError {
    /// Package id of the plugin that failed to load.
    pub package: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Failure writing the persisted snapshot to a port.
///
/// Persistence is fire-and-forget; these are logged at warn level and never
/// surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// IO error from a file-backed port.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
