//! Terminal playground for source-transform pipelines.
//!
//! Type source code, toggle transformation plugins and presets, and watch
//! compiled output update live. The crate is the coordination layer: the
//! actual transform engine, plugin fetching, and persistence backends are
//! injected ports.
//!
//! # Architecture
//!
//! - [`repl::Repl`] owns the UI state and runs every state transition:
//!   mutate, scan for plugin loads, compile, persist.
//! - [`loader::Loader`] issues asynchronous plugin fetches and detects the
//!   settle point so each batch triggers exactly one recompilation.
//! - [`compiler::run_compile`] calls the injected [`compiler::Transformer`],
//!   capturing compile and eval errors instead of propagating them.
//! - [`persist`] merges stored state with query-string overrides on load
//!   and writes the flattened snapshot back after every settled change.
//! - [`view`] renders the two code panels and the options panel;
//!   [`app::PlaygroundApp`] is the crossterm/tokio event loop around it all.
//!
//! # Example
//!
//! ```ignore
//! use playground::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (repl, completions) = Repl::builder()
//!         .transformer(MyTransformer)
//!         .fetcher(MyFetcher)
//!         .store(FileStore::new("session.json"))
//!         .build()?;
//!
//!     PlaygroundApp::new(repl, completions).run().await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod compiler;
pub mod error;
pub mod loader;
pub mod persist;
pub mod registry;
pub mod repl;
pub mod state;
pub mod view;

pub use error::{CompileError, EvalError, LoadError, PersistError, ReplError};

/// Convenience re-exports for building a playground.
pub mod prelude {
    pub use crate::app::PlaygroundApp;
    pub use crate::compiler::{CompileResult, TransformOptions, Transformer};
    pub use crate::error::{CompileError, EvalError, LoadError, PersistError, ReplError};
    pub use crate::loader::{LoadOutcome, PluginFetcher};
    pub use crate::persist::{
        FileStore, MemoryQuery, MemoryStore, PersistedState, QueryPort, StateStore, STORAGE_KEY,
    };
    pub use crate::registry::PluginConfig;
    pub use crate::repl::{Repl, ReplBuilder};
    pub use crate::state::{PluginEntry, PluginHandle, ReplState};
}
