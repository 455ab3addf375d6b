//! Plugin loader coordinator.
//!
//! Every enabled plugin must be loaded before compilation can use it. The
//! coordinator scans both tables, issues one asynchronous fetch per entry
//! that needs it, and counts loads in flight. Completions come back over an
//! unbounded channel drained by the task that owns the state; when the
//! counter returns to zero the batch has settled and the caller triggers
//! exactly one recompilation.
//!
//! There is no cancellation: disabling a plugin mid-flight lets the
//! completion land anyway. It still decrements the counter, and the flag
//! update on a disabled entry is harmless because the entry is excluded from
//! compilation regardless.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::registry::PluginConfig;
use crate::state::{PluginEntry, PluginHandle};

/// Port for fetching/activating a plugin.
///
/// Implementations are free to take as long as they like; no timeout is
/// enforced.
#[async_trait]
pub trait PluginFetcher: Send + Sync {
    /// Fetch and activate the plugin described by `config`.
    async fn fetch(&self, config: PluginConfig) -> Result<PluginHandle, LoadError>;
}

/// Completion of one fetch task.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Package id the fetch was issued for.
    pub package: String,
    /// Handle on success, `None` on failure.
    pub handle: Option<PluginHandle>,
}

/// Coordinates asynchronous plugin loads for the playground.
///
/// The in-flight counter is owned here and only touched from the
/// coordinating task; fetch tasks communicate exclusively through the
/// completion channel.
pub struct Loader {
    fetcher: Arc<dyn PluginFetcher>,
    completions: mpsc::UnboundedSender<LoadOutcome>,
    in_flight: usize,
}

impl Loader {
    /// Create a loader around a fetcher port.
    ///
    /// Returns the loader and the receiving end of the completion channel;
    /// the owner of the state drains the receiver and feeds each outcome to
    /// [`Loader::settle`].
    pub fn new(fetcher: Arc<dyn PluginFetcher>) -> (Self, mpsc::UnboundedReceiver<LoadOutcome>) {
        let (completions, rx) = mpsc::unbounded_channel();
        (
            Self {
                fetcher,
                completions,
                in_flight: 0,
            },
            rx,
        )
    }

    /// Number of loads currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Issue fetches for every entry that is enabled, unloaded, and not
    /// already loading.
    ///
    /// Returns the number of fetches issued; zero means the scan was a
    /// no-op and no settle point (and thus no recompilation) is pending
    /// from it. Must be called from within a tokio runtime.
    pub fn scan(&mut self, tables: &mut [&mut IndexMap<&'static str, PluginEntry>]) -> usize {
        let mut issued = 0;
        for table in tables {
            for entry in table.values_mut() {
                if !entry.needs_load() {
                    continue;
                }
                entry.is_loading = true;
                entry.did_error = false;
                self.in_flight += 1;
                issued += 1;
                self.spawn_fetch(entry.config);
            }
        }
        if issued > 0 {
            debug!(issued, in_flight = self.in_flight, "issued plugin loads");
        }
        issued
    }

    /// Record one completion.
    ///
    /// Decrements the in-flight counter and updates the matching entry
    /// (loaded on success, errored on failure). Returns `true` exactly when
    /// the counter reaches zero: the settle point for the current batch.
    pub fn settle(
        &mut self,
        outcome: LoadOutcome,
        tables: &mut [&mut IndexMap<&'static str, PluginEntry>],
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        let entry = tables
            .iter_mut()
            .find_map(|table| table.get_mut(outcome.package.as_str()));
        match entry {
            Some(entry) => {
                if outcome.handle.is_none() {
                    warn!(package = %outcome.package, "plugin load failed");
                }
                entry.finish_load(outcome.handle);
            }
            // Completion for a package no table knows; counter bookkeeping
            // still applies.
            None => warn!(package = %outcome.package, "load completion for unknown package"),
        }

        self.in_flight == 0
    }

    fn spawn_fetch(&self, config: PluginConfig) {
        let fetcher = Arc::clone(&self.fetcher);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            debug!(package = config.package, "fetching plugin");
            let handle = match fetcher.fetch(config).await {
                Ok(handle) => Some(handle),
                Err(error) => {
                    debug!(package = config.package, %error, "plugin fetch failed");
                    None
                }
            };
            // Receiver gone means the repl shut down; nothing to do.
            let _ = completions.send(LoadOutcome {
                package: config.package.to_string(),
                handle,
            });
        });
    }
}
