//! Site configuration module.
//!
//! Handles loading, validating, and seeding the layout registry from a
//! `site.toml` file. User files are merged on top of the stock defaults, so
//! they need only name what they change. Unknown keys are rejected.
//!
//! ## Configuration Options
//!
//! ```toml
//! title = "Karazeh"
//! output_dir = "doc/compiled"
//!
//! [layout]
//! banner = false                  # prepend a Layout::Banner region to the default layout
//!
//! [layout.rewrite]
//! "/readme.html" = "/index.html"  # final path substitution, destinations unique
//!
//! [[layout.custom]]               # tried in order, first match wins
//! match = { by = "namespace", on = ["articles"] }
//!
//! [[layout.custom.regions]]
//! name = "Layout::Sidebar"
//! outlets = [{ name = "Markdown::Browser", options = { flat = true } }]
//!
//! [[plugins]]                     # run in order
//! name = "core::theme"
//! kind = "theme"
//! ```
//!
//! The default layout is either declared under `layout.regions` or supplied
//! by a theme plugin. Declaring neither is an error at build time.

use crate::layout::{
    Layout, MatchCondition, MatchDimension, MatchPredicate, OutletBinding, Region, RewriteRule,
};
use crate::pipeline::PluginKind;
use crate::registry::{Registry, RegistryError};
use crate::types::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the banner region and the outlet bound inside it.
pub const BANNER: &str = "Layout::Banner";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Layout error: {0}")]
    Registry(#[from] RegistryError),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, rendered by the banner outlet.
    pub title: String,
    /// Where the serializer collaborator writes pages. Not used by composition.
    pub output_dir: String,
    pub layout: LayoutOptions,
    /// Plugins in execution order.
    pub plugins: Vec<PluginDescriptor>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
            output_dir: "dist".to_string(),
            layout: LayoutOptions::default(),
            plugins: Vec::new(),
        }
    }
}

/// `[layout]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOptions {
    /// Prepend a banner region to the default layout.
    pub banner: bool,
    /// Regions of the default layout. When absent, a theme supplies it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
    /// Output path → replacement path.
    pub rewrite: BTreeMap<String, String>,
    /// Custom layouts in match order.
    pub custom: Vec<CustomLayoutConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomLayoutConfig {
    #[serde(rename = "match")]
    pub matcher: MatchSpec,
    pub regions: Vec<Region>,
}

/// A single match clause, or several that must all hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchSpec {
    One(MatchClause),
    All(Vec<MatchClause>),
}

impl MatchSpec {
    pub fn clauses(&self) -> &[MatchClause] {
        match self {
            Self::One(clause) => std::slice::from_ref(clause),
            Self::All(clauses) => clauses,
        }
    }

    pub fn to_predicate(&self) -> MatchPredicate {
        MatchPredicate::new(
            self.clauses()
                .iter()
                .map(|c| MatchCondition::new(c.by, c.on.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchClause {
    pub by: MatchDimension,
    pub on: Vec<String>,
}

/// One `[[plugins]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginDescriptor {
    pub name: String,
    pub kind: PluginKind,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl SiteConfig {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Validation("title must not be empty".into()));
        }
        if let Some(regions) = &self.layout.regions {
            validate_regions("layout.regions", regions)?;
        }
        for (i, custom) in self.layout.custom.iter().enumerate() {
            let at = format!("layout.custom[{i}]");
            if custom.matcher.clauses().is_empty() {
                return Err(ConfigError::Validation(format!("{at}.match must not be empty")));
            }
            if custom.matcher.clauses().iter().any(|c| c.on.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{at}.match.on must list at least one value"
                )));
            }
            validate_regions(&format!("{at}.regions"), &custom.regions)?;
        }
        for (source, destination) in &self.layout.rewrite {
            if !source.starts_with('/') || !destination.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "layout.rewrite paths must start with '/': {source} -> {destination}"
                )));
            }
        }
        for (i, plugin) in self.plugins.iter().enumerate() {
            if plugin.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "plugins[{i}].name must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Build the layout registry: custom layouts, rewrite rules, and the
    /// default layout when one is declared here.
    pub fn seed_registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        if let Some(regions) = &self.layout.regions {
            let layout = Layout::new("default", regions.clone());
            registry.declare_default_layout(self.layout.with_banner(layout))?;
        }
        for (i, custom) in self.layout.custom.iter().enumerate() {
            registry.declare_layout(
                custom.matcher.to_predicate(),
                Layout::new(format!("custom#{}", i + 1), custom.regions.clone()),
            )?;
        }
        for (source, destination) in &self.layout.rewrite {
            registry.declare_rewrite(RewriteRule::new(source, destination))?;
        }
        Ok(registry)
    }
}

impl LayoutOptions {
    /// Prepend the banner region when `banner` is on.
    pub fn with_banner(&self, mut layout: Layout) -> Layout {
        if self.banner {
            layout.regions.insert(
                0,
                Region::new(BANNER).with_outlet(OutletBinding::new(BANNER)),
            );
        }
        layout
    }
}

fn validate_regions(at: &str, regions: &[Region]) -> Result<(), ConfigError> {
    for (i, region) in regions.iter().enumerate() {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{at}[{i}].name must not be empty"
            )));
        }
        if region.outlets.iter().any(|o| o.name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{at}[{i}] ({}) has an outlet without a name",
                region.name
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::warn!(path = %path.display(), "config file not found, using stock defaults");
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docframe configuration
# ======================
# Every key is optional. Values shown are the defaults.

# Site title. Rendered by the Layout::Banner outlet.
title = "Documentation"

# Directory the page serializer writes to. Composition itself never writes.
output_dir = "dist"

[layout]
# Prepend a `Layout::Banner` region (bound to the `Layout::Banner` outlet)
# to the default layout.
banner = false

# Regions of the default layout. When omitted, the first theme plugin that
# provides a default layout supplies it.
#
# [[layout.regions]]
# name = "Layout::Content"
# options = { framed = true }
# outlets = [{ name = "Core::Title" }, { name = "Core::Body" }]

# Final path substitutions, applied once per page after rendering.
# Two rules must not share a destination.
[layout.rewrite]
# "/readme.html" = "/index.html"

# Custom layouts. Tried in declaration order; the first whose `match` holds
# wins, so list narrower matches before broader ones.
#
# `by` is one of:
#   namespace  document namespace is one of `on`
#   url        output path equals an `on` entry, or starts with it when the
#              entry ends in `*`
# `match` may also be an array of clauses that must all hold.
#
# [[layout.custom]]
# match = { by = "namespace", on = ["articles"] }
#
# [[layout.custom.regions]]
# name = "Layout::Sidebar"
# outlets = [{ name = "Core::Title", options = { flat = true } }]
#
# [[layout.custom.regions]]
# name = "Layout::Content"
# options = { framed = true }
# outlets = [{ name = "Core::Body" }]

# Plugins, run in order. `kind` is `content` or `theme`. No two plugins may
# provide the same document identity or register the same outlet name.
#
# [[plugins]]
# name = "core::theme"
# kind = "theme"
#
# [[plugins]]
# name = "core::documents"
# kind = "content"
# options = { source = "documents.json" }
"##
}
