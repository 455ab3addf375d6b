//! Static registry of plugins and presets.
//!
//! The registry is the single source of ordering: every table derived from
//! it preserves descriptor order, and the preset list handed to the
//! transformer is always a subset of [`PRESETS`] in this order.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::state::PluginEntry;

/// Static descriptor for one plugin or preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginConfig {
    /// Package id, unique across plugins and presets. Toggle names resolve
    /// against this.
    pub package: &'static str,
    /// Short label used in the persisted preset list and the options panel.
    pub label: &'static str,
    /// Whether the plugin ships pre-activated (no fetch needed).
    pub preload: bool,
}

/// Standalone plugins (independently enabled and loaded).
pub const PLUGINS: &[PluginConfig] = &[
    PluginConfig {
        package: "babili-standalone",
        label: "babili",
        preload: false,
    },
    PluginConfig {
        package: "prettier",
        label: "prettier",
        preload: false,
    },
];

/// Presets: named, ordered bundles of transformations.
pub const PRESETS: &[PluginConfig] = &[
    PluginConfig {
        package: "babel-preset-es2015",
        label: "es2015",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-es2015-loose",
        label: "es2015-loose",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-es2016",
        label: "es2016",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-es2017",
        label: "es2017",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-latest",
        label: "latest",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-react",
        label: "react",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-stage-0",
        label: "stage-0",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-stage-1",
        label: "stage-1",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-stage-2",
        label: "stage-2",
        preload: true,
    },
    PluginConfig {
        package: "babel-preset-stage-3",
        label: "stage-3",
        preload: true,
    },
];

/// The plugin whose label is appended to the persisted preset list when it is
/// enabled and loaded.
pub const BABILI_PACKAGE: &str = "babili-standalone";

/// The plugin that drives the prettify flag when enabled and loaded.
pub const PRETTIER_PACKAGE: &str = "prettier";

/// Build the enablement table for one descriptor list.
///
/// One entry per descriptor, keyed by package id, in descriptor order.
/// `enabled` holds the package ids that start enabled; `is_loaded` starts as
/// the descriptor's preload flag.
pub fn build_entries(
    configs: &'static [PluginConfig],
    enabled: &HashSet<&str>,
) -> IndexMap<&'static str, PluginEntry> {
    configs
        .iter()
        .map(|config| {
            (
                config.package,
                PluginEntry::new(*config, enabled.contains(config.package)),
            )
        })
        .collect()
}

/// Resolve persisted preset labels back to package ids.
///
/// Labels with no matching preset are ignored; a persisted `babili` label
/// resolves to the babili plugin's package so the plugin table can pick it
/// up at boot.
pub fn packages_for_labels<'a>(labels: impl Iterator<Item = &'a str>) -> HashSet<&'static str> {
    labels
        .filter_map(|label| {
            PRESETS
                .iter()
                .chain(PLUGINS)
                .find(|config| config.label == label)
                .map(|config| config.package)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_entries_preserves_order_and_uniqueness() {
        let enabled = HashSet::from(["babel-preset-react"]);
        let table = build_entries(PRESETS, &enabled);

        assert_eq!(table.len(), PRESETS.len());
        for (entry, config) in table.values().zip(PRESETS) {
            assert_eq!(entry.config.package, config.package);
        }
    }

    #[test]
    fn test_build_entries_enablement_and_preload() {
        let enabled = HashSet::from(["babel-preset-es2015"]);
        let table = build_entries(PRESETS, &enabled);

        let es2015 = &table["babel-preset-es2015"];
        assert!(es2015.is_enabled);
        assert!(es2015.is_loaded); // presets are preloaded
        assert!(!es2015.is_loading);
        assert!(!es2015.did_error);

        let react = &table["babel-preset-react"];
        assert!(!react.is_enabled);
    }

    #[test]
    fn test_plugins_start_unloaded() {
        let enabled = HashSet::from(["prettier"]);
        let table = build_entries(PLUGINS, &enabled);

        let prettier = &table["prettier"];
        assert!(prettier.is_enabled);
        assert!(!prettier.is_loaded);
    }

    #[test]
    fn test_packages_for_labels() {
        let packages = packages_for_labels(["es2015", "react", "stage-2"].into_iter());
        assert_eq!(
            packages,
            HashSet::from([
                "babel-preset-es2015",
                "babel-preset-react",
                "babel-preset-stage-2"
            ])
        );
    }

    #[test]
    fn test_packages_for_labels_ignores_unknown_and_maps_babili() {
        let packages = packages_for_labels(["babili", "not-a-preset"].into_iter());
        assert_eq!(packages, HashSet::from([BABILI_PACKAGE]));
    }
}
