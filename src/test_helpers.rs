//! Shared builders for the docframe test suite.
//!
//! Small in-memory plugins and registries so module tests can exercise the
//! pipeline, resolver, and compositor without touching the filesystem.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let registry = registry_with_default(vec![
//!     Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
//! ]);
//! let outlets = outlets_of(body_theme());
//! ```

use crate::layout::{Layout, OutletBinding, Region};
use crate::pipeline::{
    ContentProvider, OutletRegistry, Pipeline, Plugin, ProviderError, RenderFn, ThemeProvider,
};
use crate::registry::Registry;
use crate::types::{Document, DocumentSet, Fragment, Options};
use std::sync::Arc;

// =========================================================================
// Registries
// =========================================================================

/// Registry with only a default layout made of `regions`.
pub fn registry_with_default(regions: Vec<Region>) -> Registry {
    let mut registry = Registry::new();
    registry
        .declare_default_layout(Layout::new("default", regions))
        .unwrap();
    registry
}

/// Outlet registry produced by running a single theme plugin.
pub fn outlets_of(theme: Plugin) -> OutletRegistry {
    Pipeline::new().with(theme).run().unwrap().outlets
}

// =========================================================================
// Content plugins
// =========================================================================

struct StaticSource {
    name: String,
    documents: Vec<Document>,
}

impl ContentProvider for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn provide(&self, _prior: &DocumentSet) -> Result<Vec<Document>, ProviderError> {
        Ok(self.documents.clone())
    }
}

/// Content plugin returning a fixed list of documents.
pub fn static_source(name: &str, documents: Vec<Document>) -> Plugin {
    Plugin::Content(Box::new(StaticSource {
        name: name.to_string(),
        documents,
    }))
}

// =========================================================================
// Theme plugins
// =========================================================================

struct FixedTheme {
    name: String,
    outlets: Vec<(String, RenderFn)>,
    default_layout: Option<Layout>,
}

impl ThemeProvider for FixedTheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn outlets(&self) -> Vec<(String, RenderFn)> {
        self.outlets.clone()
    }

    fn default_layout(&self) -> Option<Layout> {
        self.default_layout.clone()
    }
}

fn theme(name: &str, outlets: Vec<(String, RenderFn)>, default_layout: Option<Layout>) -> Plugin {
    Plugin::Theme(Box::new(FixedTheme {
        name: name.to_string(),
        outlets,
        default_layout,
    }))
}

/// Theme whose outlets render `"{outlet}:{document id}"`.
pub fn echo_theme(name: &str, outlets: &[&str]) -> Plugin {
    let outlets = outlets
        .iter()
        .map(|outlet| {
            let label = outlet.to_string();
            let render: RenderFn =
                Arc::new(move |doc: &Document, _: &Options| Fragment::from(format!("{label}:{}", doc.id)));
            (outlet.to_string(), render)
        })
        .collect();
    theme(name, outlets, None)
}

/// Theme with a single `Core::Body` outlet rendering the body verbatim.
pub fn body_theme() -> Plugin {
    let render: RenderFn = Arc::new(|doc: &Document, _: &Options| Fragment::from(doc.body.as_str()));
    theme("body", vec![("Core::Body".to_string(), render)], None)
}

/// Theme with one outlet rendering its options as `key=value` pairs.
pub fn options_theme(outlet: &str) -> Plugin {
    let render: RenderFn = Arc::new(|_: &Document, options: &Options| {
        let pairs: Vec<String> = options
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        Fragment::from(pairs.join(","))
    });
    theme("options", vec![(outlet.to_string(), render)], None)
}

/// Theme that registers `outlet` and a default layout binding it in `region`.
pub fn layout_theme(name: &str, region: &str, outlet: &str) -> Plugin {
    let render: RenderFn = Arc::new(|doc: &Document, _: &Options| Fragment::from(doc.body.as_str()));
    let layout = Layout::new(
        "default",
        vec![Region::new(region).with_outlet(OutletBinding::new(outlet))],
    );
    theme(name, vec![(outlet.to_string(), render)], Some(layout))
}
