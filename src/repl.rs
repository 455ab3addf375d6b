//! The playground component.
//!
//! [`Repl`] owns the UI state and the injected ports, and exposes the state
//! transitions: boot, source edits, toggles, and load completions. Every
//! transition follows the same shape: mutate synchronously, scan for loads,
//! compile, persist. Asynchronous load completions re-enter through
//! [`Repl::plugin_loaded`], fed from the channel returned by
//! [`ReplBuilder::build`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::compiler::{run_compile, TransformOptions, Transformer};
use crate::error::ReplError;
use crate::loader::{LoadOutcome, Loader, PluginFetcher};
use crate::persist::{
    encode_query, MemoryQuery, MemoryStore, PersistedState, QueryPort, StateStore, STORAGE_KEY,
};
use crate::state::{classify, ReplFlag, ReplState, SettingTarget};

/// Builder for [`Repl`].
///
/// Transformer and fetcher are required; the persistence ports default to
/// in-memory implementations.
#[derive(Default)]
pub struct ReplBuilder {
    transformer: Option<Box<dyn Transformer>>,
    fetcher: Option<Arc<dyn PluginFetcher>>,
    store: Option<Box<dyn StateStore>>,
    query: Option<Box<dyn QueryPort>>,
}

impl ReplBuilder {
    /// Set the compile/evaluate collaborator.
    pub fn transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformer = Some(Box::new(transformer));
        self
    }

    /// Set the plugin fetch collaborator.
    pub fn fetcher(mut self, fetcher: impl PluginFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Set the storage collaborator (defaults to [`MemoryStore`]).
    pub fn store(mut self, store: impl StateStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Set the query-string collaborator (defaults to [`MemoryQuery`]).
    pub fn query(mut self, query: impl QueryPort + 'static) -> Self {
        self.query = Some(Box::new(query));
        self
    }

    /// Build the repl and the load-completion receiver.
    ///
    /// The caller owns the receiver and must feed each [`LoadOutcome`] back
    /// through [`Repl::plugin_loaded`]; the app loop does this in its
    /// `select!`.
    pub fn build(self) -> Result<(Repl, mpsc::UnboundedReceiver<LoadOutcome>), ReplError> {
        let transformer = self.transformer.ok_or(ReplError::NoTransformer)?;
        let fetcher = self.fetcher.ok_or(ReplError::NoFetcher)?;
        let (loader, completions) = Loader::new(fetcher);

        Ok((
            Repl {
                state: ReplState::default(),
                loader,
                transformer,
                store: self.store.unwrap_or_else(|| Box::new(MemoryStore::new())),
                query: self.query.unwrap_or_else(|| Box::new(MemoryQuery::new())),
            },
            completions,
        ))
    }
}

/// Interactive playground: source in, compiled output and toggles out.
pub struct Repl {
    state: ReplState,
    loader: Loader,
    transformer: Box<dyn Transformer>,
    store: Box<dyn StateStore>,
    query: Box<dyn QueryPort>,
}

impl Repl {
    /// Start building a repl.
    pub fn builder() -> ReplBuilder {
        ReplBuilder::default()
    }

    /// Current UI state, for rendering.
    pub fn state(&self) -> &ReplState {
        &self.state
    }

    /// Number of plugin loads in flight.
    pub fn loads_in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    /// Reconstruct state from the persistence ports and run the initial
    /// compile.
    ///
    /// Boot is a load, not a settled mutation: it scans and compiles but
    /// does not write back. Must be called from within a tokio runtime.
    pub fn boot(&mut self) {
        let persisted = PersistedState::from_sources(
            self.store.load(STORAGE_KEY).as_deref(),
            &self.query.read(),
        );
        self.state = ReplState::from_persisted(&persisted);
        self.scan();
        self.compile_now();
    }

    /// Replace the source code, recompile, persist.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.state.source = source.into();
        self.compile_now();
        self.persist();
    }

    /// Append typed text to the source (view convenience).
    pub fn push_source(&mut self, text: &str) {
        self.state.source.push_str(text);
        self.compile_now();
        self.persist();
    }

    /// Delete the last character of the source (view convenience).
    pub fn pop_source(&mut self) {
        self.state.source.pop();
        self.compile_now();
        self.persist();
    }

    /// Set a named setting to a boolean value.
    ///
    /// The name resolves, in order, to a top-level flag, a plugin, or a
    /// preset. An unrecognized name mutates nothing, but the scan, compile,
    /// and persist passes still run, exactly as for a recognized one.
    pub fn toggle(&mut self, name: &str, value: bool) {
        match classify(name, &self.state) {
            SettingTarget::Flag(ReplFlag::Evaluate) => self.state.evaluate = value,
            SettingTarget::Flag(ReplFlag::LineWrap) => self.state.line_wrap = value,
            SettingTarget::Plugin(package) => {
                if let Some(entry) = self.state.plugins.get_mut(package) {
                    entry.is_enabled = value;
                }
            }
            SettingTarget::Preset(package) => {
                if let Some(entry) = self.state.presets.get_mut(package) {
                    entry.is_enabled = value;
                }
            }
            SettingTarget::Unknown => {
                warn!(name, "toggle for unrecognized setting");
            }
        }

        self.scan();
        self.compile_now();
        self.persist();
    }

    /// Flip a named setting (view convenience).
    pub fn flip(&mut self, name: &str) {
        let value = match classify(name, &self.state) {
            SettingTarget::Flag(ReplFlag::Evaluate) => self.state.evaluate,
            SettingTarget::Flag(ReplFlag::LineWrap) => self.state.line_wrap,
            SettingTarget::Plugin(package) => self.state.plugins[package].is_enabled,
            SettingTarget::Preset(package) => self.state.presets[package].is_enabled,
            SettingTarget::Unknown => true,
        };
        self.toggle(name, !value);
    }

    /// Record a load completion.
    ///
    /// Returns `true` when the completion settled the batch, in which case
    /// one recompilation has run and the snapshot has been persisted.
    pub fn plugin_loaded(&mut self, outcome: LoadOutcome) -> bool {
        let settled = self.loader.settle(
            outcome,
            &mut [&mut self.state.plugins, &mut self.state.presets],
        );
        if settled {
            self.compile_now();
            self.persist();
        }
        settled
    }

    /// Issue loads for every enabled-but-unloaded entry.
    fn scan(&mut self) {
        self.loader
            .scan(&mut [&mut self.state.plugins, &mut self.state.presets]);
    }

    /// Compile the current source with the active presets.
    fn compile_now(&mut self) {
        let options = TransformOptions {
            presets: self.state.active_preset_packages(),
            evaluate: self.state.evaluate,
            prettify: self.state.prettify(),
        };
        let result = run_compile(self.transformer.as_ref(), &self.state.source, &options);
        self.state.compiled = result.compiled;
        self.state.compile_error = result.compile_error;
        self.state.eval_error = result.eval_error;
    }

    /// Write the snapshot to both ports, fire-and-forget.
    fn persist(&mut self) {
        let snapshot = self.snapshot();

        match snapshot.to_blob() {
            Ok(blob) => {
                if let Err(error) = self.store.save(STORAGE_KEY, &blob) {
                    warn!(%error, "failed to persist state blob");
                }
            }
            Err(error) => warn!(%error, "failed to serialize state snapshot"),
        }

        let query = encode_query(&snapshot.to_query_pairs());
        if let Err(error) = self.query.write(&query) {
            warn!(%error, "failed to persist query string");
        }
    }

    /// Assemble the persisted snapshot from the current state.
    fn snapshot(&self) -> PersistedState {
        PersistedState {
            code: self.state.source.clone(),
            evaluate: self.state.evaluate,
            line_wrap: self.state.line_wrap,
            presets: self.state.active_preset_labels().join(","),
            plugins: self
                .state
                .plugins
                .values()
                .map(|entry| (entry.config.package.to_string(), entry.is_enabled))
                .collect(),
        }
    }
}
