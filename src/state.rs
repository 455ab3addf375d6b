//! Playground UI state.
//!
//! [`ReplState`] is the single state object: it is owned by
//! [`Repl`](crate::repl::Repl) and mutated only on the coordinating task,
//! between suspension points, so no locking is needed.

use indexmap::IndexMap;

use crate::persist::PersistedState;
use crate::registry::{self, PluginConfig};
use crate::{CompileError, EvalError};

/// Opaque token returned by a successful plugin fetch.
///
/// The real activation artifact lives with the fetcher; the entry only keeps
/// this token so "loaded with a live handle" is distinguishable from
/// "preloaded".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginHandle {
    /// Package id the handle was fetched for.
    pub package: String,
}

/// Enablement and load lifecycle for one plugin or preset.
///
/// Stable-state invariant: `is_loading` and `is_loaded` are mutually
/// exclusive, and `is_loaded` and `did_error` are never both set. A load
/// transitions loading→loaded or loading→errored, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    /// Static descriptor from the registry.
    pub config: PluginConfig,
    /// Whether the user has the entry switched on.
    pub is_enabled: bool,
    /// Whether the entry's code is activated and usable for compilation.
    pub is_loaded: bool,
    /// Whether a fetch for this entry is in flight.
    pub is_loading: bool,
    /// Whether the last fetch for this entry failed.
    pub did_error: bool,
    /// Fetch token, present only after an on-demand load succeeded.
    pub handle: Option<PluginHandle>,
}

impl PluginEntry {
    /// Fresh entry: load state comes from the descriptor's preload flag.
    pub fn new(config: PluginConfig, is_enabled: bool) -> Self {
        Self {
            config,
            is_enabled,
            is_loaded: config.preload,
            is_loading: false,
            did_error: false,
            handle: None,
        }
    }

    /// Whether this entry takes part in compilation.
    pub fn is_active(&self) -> bool {
        self.is_enabled && self.is_loaded
    }

    /// Whether the coordinator should issue a fetch for this entry.
    pub fn needs_load(&self) -> bool {
        self.is_enabled && !self.is_loaded && !self.is_loading
    }

    /// Record a fetch completion.
    pub(crate) fn finish_load(&mut self, handle: Option<PluginHandle>) {
        self.is_loading = false;
        match handle {
            Some(handle) => {
                self.is_loaded = true;
                self.did_error = false;
                self.handle = Some(handle);
            }
            None => {
                self.did_error = true;
            }
        }
    }
}

/// The whole playground state: source, output, flags, and both tables.
#[derive(Debug, Clone, Default)]
pub struct ReplState {
    /// Source code being edited.
    pub source: String,
    /// Last successful compiled output, if any.
    pub compiled: Option<String>,
    /// Compile-phase error from the last compile, if any.
    pub compile_error: Option<CompileError>,
    /// Execution-phase error from the last evaluate run, if any.
    pub eval_error: Option<EvalError>,
    /// Whether compiled output is executed after each compile.
    pub evaluate: bool,
    /// Whether the source panel wraps long lines instead of truncating.
    pub line_wrap: bool,
    /// Plugin table, in registry order.
    pub plugins: IndexMap<&'static str, PluginEntry>,
    /// Preset table, in registry order.
    pub presets: IndexMap<&'static str, PluginEntry>,
}

impl ReplState {
    /// Reconstruct state from a fully-defaulted persisted snapshot.
    ///
    /// Preset enablement comes from the persisted comma-joined labels;
    /// plugin enablement from the flattened per-plugin flags.
    pub fn from_persisted(persisted: &PersistedState) -> Self {
        let preset_packages = registry::packages_for_labels(
            persisted
                .presets
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty()),
        );
        let plugin_packages = persisted
            .plugins
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(package, _)| package.as_str())
            .collect();

        Self {
            source: persisted.code.clone(),
            evaluate: persisted.evaluate,
            line_wrap: persisted.line_wrap,
            plugins: registry::build_entries(registry::PLUGINS, &plugin_packages),
            presets: registry::build_entries(registry::PRESETS, &preset_packages),
            ..Self::default()
        }
    }

    /// Package ids of presets that are enabled and loaded, in registry order.
    pub fn active_preset_packages(&self) -> Vec<String> {
        self.presets
            .values()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.config.package.to_string())
            .collect()
    }

    /// Labels of presets that are enabled and loaded, in registry order,
    /// with the synthetic `babili` label appended when that plugin is
    /// enabled and loaded.
    pub fn active_preset_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .presets
            .values()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.config.label.to_string())
            .collect();
        if self
            .plugins
            .get(registry::BABILI_PACKAGE)
            .is_some_and(PluginEntry::is_active)
        {
            labels.push("babili".to_string());
        }
        labels
    }

    /// Whether output should be prettified: the prettier plugin is enabled
    /// and loaded.
    pub fn prettify(&self) -> bool {
        self.plugins
            .get(registry::PRETTIER_PACKAGE)
            .is_some_and(PluginEntry::is_active)
    }
}

/// Where a toggle name resolved.
///
/// Toggle names are classified first, then dispatched; an unrecognized name
/// is an explicit [`SettingTarget::Unknown`] rather than a dynamic lookup
/// that silently misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingTarget {
    /// A top-level UI flag.
    Flag(ReplFlag),
    /// A plugin entry, by package id.
    Plugin(&'static str),
    /// A preset entry, by package id.
    Preset(&'static str),
    /// No match anywhere. Toggling this is a defined no-op.
    Unknown,
}

/// Top-level boolean UI flags addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplFlag {
    /// `"evaluate"`: execute compiled output after each compile.
    Evaluate,
    /// `"lineWrap"`: wrap long source lines in the view.
    LineWrap,
}

/// Classify a toggle name against flags, then plugins, then presets.
///
/// Exactly one branch applies; the first match wins.
pub fn classify(name: &str, state: &ReplState) -> SettingTarget {
    match name {
        "evaluate" => return SettingTarget::Flag(ReplFlag::Evaluate),
        "lineWrap" => return SettingTarget::Flag(ReplFlag::LineWrap),
        _ => {}
    }
    if let Some(entry) = state.plugins.get(name) {
        return SettingTarget::Plugin(entry.config.package);
    }
    if let Some(entry) = state.presets.get(name) {
        return SettingTarget::Preset(entry.config.package);
    }
    SettingTarget::Unknown
}
