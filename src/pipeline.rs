//! Plugin pipeline: collects documents and outlet implementations.
//!
//! Plugins run strictly in declaration order. Each step is two-phase:
//!
//! 1. **Collect** — the plugin is handed a read-only view of everything merged
//!    so far and returns its contribution by value.
//! 2. **Merge** — the contribution is folded into the cumulative output,
//!    rejecting any document identity, outlet name, or default layout that an
//!    earlier plugin already owns.
//!
//! No plugin ever holds a mutable reference to shared state, and nothing is
//! silently shadowed: plugin order decides who owns a name, and a second claim
//! is a [`PluginError`].

use crate::layout::Layout;
use crate::types::{Document, DocumentSet, Fragment, Options};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Error type content providers may return from their own I/O or parsing.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Rendering function bound to an outlet name.
pub type RenderFn = Arc<dyn Fn(&Document, &Options) -> Fragment + Send + Sync>;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Document `{id}` from plugin `{plugin}` (plugins[{index}]) is already provided by plugins[{owner}]")]
    DuplicateDocument {
        id: String,
        plugin: String,
        index: usize,
        owner: usize,
    },
    #[error("Outlet `{outlet}` from plugin `{plugin}` (plugins[{index}]) is already registered by plugins[{owner}]")]
    DuplicateOutlet {
        outlet: String,
        plugin: String,
        index: usize,
        owner: usize,
    },
    #[error("Plugin `{plugin}` (plugins[{index}]) provides a default layout, but plugins[{owner}] already did")]
    DuplicateDefaultLayout {
        plugin: String,
        index: usize,
        owner: usize,
    },
    #[error("Plugin `{plugin}` (plugins[{index}]) failed: {source}")]
    Provider {
        plugin: String,
        index: usize,
        source: ProviderError,
    },
    #[error("Unknown plugin `{name}` at plugins[{index}]")]
    UnknownPlugin { name: String, index: usize },
    #[error("Plugin `{name}` at plugins[{index}] is declared as `{declared}` but is a `{actual}` plugin")]
    KindMismatch {
        name: String,
        index: usize,
        declared: PluginKind,
        actual: PluginKind,
    },
}

/// What a plugin contributes to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Content,
    Theme,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Theme => write!(f, "theme"),
        }
    }
}

/// A plugin that produces documents.
pub trait ContentProvider {
    fn name(&self) -> &str;

    /// Return this plugin's documents. `prior` holds every document merged
    /// from earlier plugins; it is read-only.
    fn provide(&self, prior: &DocumentSet) -> Result<Vec<Document>, ProviderError>;
}

/// A plugin that supplies outlet implementations and, optionally, a default
/// layout.
pub trait ThemeProvider {
    fn name(&self) -> &str;

    fn outlets(&self) -> Vec<(String, RenderFn)>;

    fn default_layout(&self) -> Option<Layout> {
        None
    }
}

pub enum Plugin {
    Content(Box<dyn ContentProvider>),
    Theme(Box<dyn ThemeProvider>),
}

impl Plugin {
    pub fn name(&self) -> &str {
        match self {
            Self::Content(p) => p.name(),
            Self::Theme(p) => p.name(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        match self {
            Self::Content(_) => PluginKind::Content,
            Self::Theme(_) => PluginKind::Theme,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plugin({} {})", self.kind(), self.name())
    }
}

struct RegisteredOutlet {
    render: RenderFn,
    plugin: usize,
}

/// Outlet name → rendering function, filled by theme plugins.
#[derive(Default)]
pub struct OutletRegistry {
    outlets: BTreeMap<String, RegisteredOutlet>,
}

impl OutletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RenderFn> {
        self.outlets.get(name).map(|o| &o.render)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outlets.contains_key(name)
    }

    /// Index of the plugin that registered `name`.
    pub fn owner(&self, name: &str) -> Option<usize> {
        self.outlets.get(name).map(|o| o.plugin)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outlets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outlets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }
}

impl std::fmt::Debug for OutletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.outlets.keys()).finish()
    }
}

/// Cumulative output of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub documents: DocumentSet,
    pub outlets: OutletRegistry,
    /// Default layout contributed by a theme, with the contributing plugin index.
    pub default_layout: Option<(usize, Layout)>,
    document_owners: BTreeMap<String, usize>,
}

impl PipelineOutput {
    /// Index of the plugin that provided document `id`.
    pub fn document_owner(&self, id: &str) -> Option<usize> {
        self.document_owners.get(id).copied()
    }

    fn merge_documents(
        &mut self,
        index: usize,
        plugin: &str,
        documents: Vec<Document>,
    ) -> Result<(), PluginError> {
        for document in documents {
            if let Some(&owner) = self.document_owners.get(&document.id) {
                return Err(PluginError::DuplicateDocument {
                    id: document.id,
                    plugin: plugin.to_string(),
                    index,
                    owner,
                });
            }
            self.document_owners.insert(document.id.clone(), index);
            self.documents.insert(document.id.clone(), document);
        }
        Ok(())
    }

    fn merge_theme(
        &mut self,
        index: usize,
        plugin: &str,
        outlets: Vec<(String, RenderFn)>,
        default_layout: Option<Layout>,
    ) -> Result<(), PluginError> {
        for (name, render) in outlets {
            if let Some(owner) = self.outlets.owner(&name) {
                return Err(PluginError::DuplicateOutlet {
                    outlet: name,
                    plugin: plugin.to_string(),
                    index,
                    owner,
                });
            }
            self.outlets.outlets.insert(
                name,
                RegisteredOutlet {
                    render,
                    plugin: index,
                },
            );
        }
        if let Some(layout) = default_layout {
            if let Some((owner, _)) = &self.default_layout {
                return Err(PluginError::DuplicateDefaultLayout {
                    plugin: plugin.to_string(),
                    index,
                    owner: *owner,
                });
            }
            self.default_layout = Some((index, layout));
        }
        Ok(())
    }
}

/// Ordered sequence of plugins.
#[derive(Debug, Default)]
pub struct Pipeline {
    plugins: Vec<Plugin>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn with(mut self, plugin: Plugin) -> Self {
        self.push(plugin);
        self
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Run every plugin once, in order, and return the merged output.
    pub fn run(&self) -> Result<PipelineOutput, PluginError> {
        let mut output = PipelineOutput::default();
        for (index, plugin) in self.plugins.iter().enumerate() {
            match plugin {
                Plugin::Content(provider) => {
                    let documents = provider.provide(&output.documents).map_err(|source| {
                        PluginError::Provider {
                            plugin: provider.name().to_string(),
                            index,
                            source,
                        }
                    })?;
                    debug!(
                        plugin = provider.name(),
                        index,
                        documents = documents.len(),
                        "collected content"
                    );
                    output.merge_documents(index, provider.name(), documents)?;
                }
                Plugin::Theme(theme) => {
                    let outlets = theme.outlets();
                    debug!(
                        plugin = theme.name(),
                        index,
                        outlets = outlets.len(),
                        "collected outlets"
                    );
                    output.merge_theme(index, theme.name(), outlets, theme.default_layout())?;
                }
            }
        }
        info!(
            plugins = self.plugins.len(),
            documents = output.documents.len(),
            outlets = output.outlets.len(),
            "pipeline finished"
        );
        Ok(output)
    }
}
