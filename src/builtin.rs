//! Plugin catalog and the plugins that ship with docframe.
//!
//! `[[plugins]]` entries name a plugin; the [`PluginCatalog`] turns each name
//! into a constructed [`Plugin`], checking that the declared `kind` agrees
//! with what the factory builds.
//!
//! Built-ins:
//!
//! | Name | Kind | Provides |
//! |------|------|----------|
//! | `core::documents` | content | documents from inline `documents` and/or a JSON manifest at `source` |
//! | `core::theme` | theme | `Core::Body`, `Core::Title`, `Layout::Banner`, and a default layout |
//!
//! The document manifest is the hand-off format of an upstream scanner:
//!
//! ```json
//! [
//!   { "source": "README.md", "body": "..." },
//!   { "source": "doc/articles/010-Intro.md", "namespace": "articles", "title": "Intro", "body": "..." },
//!   { "id": "changelog", "output_path": "/changes.html", "body": "..." }
//! ]
//! ```

use crate::config::{BANNER, PluginDescriptor};
use crate::layout::{Layout, OutletBinding, Region};
use crate::naming;
use crate::pipeline::{
    ContentProvider, Pipeline, Plugin, PluginError, PluginKind, ProviderError, RenderFn,
    ThemeProvider,
};
use crate::types::{Document, DocumentSet, Fragment, Options};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DOCUMENTS: &str = "core::documents";
pub const THEME: &str = "core::theme";

/// Context handed to plugin factories.
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Directory relative paths in plugin options resolve against.
    pub base_dir: PathBuf,
    /// Site title from the configuration.
    pub title: String,
}

pub type PluginFactory = fn(&Options, &PluginContext) -> Result<Plugin, ProviderError>;

struct CatalogEntry {
    kind: PluginKind,
    factory: PluginFactory,
}

/// Plugin name → factory.
#[derive(Default)]
pub struct PluginCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with `core::documents` and `core::theme` registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register(DOCUMENTS, PluginKind::Content, DocumentsSource::plugin);
        catalog.register(THEME, PluginKind::Theme, CoreTheme::plugin);
        catalog
    }

    pub fn register(&mut self, name: &str, kind: PluginKind, factory: PluginFactory) {
        self.entries
            .insert(name.to_string(), CatalogEntry { kind, factory });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Instantiate every descriptor, in order, into a pipeline.
    pub fn instantiate(
        &self,
        descriptors: &[PluginDescriptor],
        context: &PluginContext,
    ) -> Result<Pipeline, PluginError> {
        let mut pipeline = Pipeline::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            let entry =
                self.entries
                    .get(&descriptor.name)
                    .ok_or_else(|| PluginError::UnknownPlugin {
                        name: descriptor.name.clone(),
                        index,
                    })?;
            if entry.kind != descriptor.kind {
                return Err(PluginError::KindMismatch {
                    name: descriptor.name.clone(),
                    index,
                    declared: descriptor.kind,
                    actual: entry.kind,
                });
            }
            let plugin = (entry.factory)(&descriptor.options, context).map_err(|source| {
                PluginError::Provider {
                    plugin: descriptor.name.clone(),
                    index,
                    source,
                }
            })?;
            pipeline.push(plugin);
        }
        Ok(pipeline)
    }
}

// =============================================================================
// core::documents
// =============================================================================

/// One manifest entry. Either `id` or `source` must be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl DocumentEntry {
    pub fn into_document(self) -> Result<Document, ProviderError> {
        let id = match (self.id, &self.source) {
            (Some(id), _) => id,
            (None, Some(source)) => naming::id_from_source(source),
            (None, None) => return Err("document entry needs an `id` or a `source`".into()),
        };
        if id.is_empty() {
            return Err(format!(
                "document entry `{}` yields an empty id",
                self.source.unwrap_or_default()
            )
            .into());
        }
        let output_path = self
            .output_path
            .unwrap_or_else(|| naming::default_output_path(&id));
        Ok(Document {
            id,
            namespace: self.namespace,
            output_path,
            title: self.title,
            body: self.body,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DocumentsOptions {
    source: Option<PathBuf>,
    documents: Vec<DocumentEntry>,
}

/// Content plugin serving documents resolved by an upstream scanner.
#[derive(Debug)]
pub struct DocumentsSource {
    manifest: Option<PathBuf>,
    inline: Vec<DocumentEntry>,
}

impl DocumentsSource {
    pub fn new(manifest: Option<PathBuf>, inline: Vec<DocumentEntry>) -> Self {
        Self { manifest, inline }
    }

    fn plugin(options: &Options, context: &PluginContext) -> Result<Plugin, ProviderError> {
        let options: DocumentsOptions =
            serde_json::from_value(serde_json::Value::Object(options.clone()))?;
        let manifest = options.source.map(|p| context.base_dir.join(p));
        Ok(Plugin::Content(Box::new(Self::new(
            manifest,
            options.documents,
        ))))
    }

    fn read_manifest(path: &Path) -> Result<Vec<DocumentEntry>, ProviderError> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let entries = serde_json::from_str(&content)
            .map_err(|e| format!("invalid document manifest {}: {e}", path.display()))?;
        Ok(entries)
    }
}

impl ContentProvider for DocumentsSource {
    fn name(&self) -> &str {
        DOCUMENTS
    }

    fn provide(&self, _prior: &DocumentSet) -> Result<Vec<Document>, ProviderError> {
        let mut entries = match &self.manifest {
            Some(path) => Self::read_manifest(path)?,
            None => Vec::new(),
        };
        entries.extend(self.inline.iter().cloned());
        entries
            .into_iter()
            .map(DocumentEntry::into_document)
            .collect()
    }
}

// =============================================================================
// core::theme
// =============================================================================

pub const BODY_OUTLET: &str = "Core::Body";
pub const TITLE_OUTLET: &str = "Core::Title";

/// Minimal theme: passes content through untouched.
#[derive(Debug, Clone)]
pub struct CoreTheme {
    title: String,
}

impl CoreTheme {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn plugin(options: &Options, context: &PluginContext) -> Result<Plugin, ProviderError> {
        if let Some(key) = options.keys().next() {
            return Err(format!("unknown option `{key}`").into());
        }
        Ok(Plugin::Theme(Box::new(Self::new(context.title.clone()))))
    }
}

impl ThemeProvider for CoreTheme {
    fn name(&self) -> &str {
        THEME
    }

    fn outlets(&self) -> Vec<(String, RenderFn)> {
        let body: RenderFn = Arc::new(|doc: &Document, _: &Options| Fragment::from(doc.body.as_str()));
        let title: RenderFn = Arc::new(|doc: &Document, options: &Options| {
            let text = doc.display_title();
            match options.get("prefix").and_then(|v| v.as_str()) {
                Some(prefix) => Fragment::from(format!("{prefix}{text}")),
                None => Fragment::from(text),
            }
        });
        let site_title = self.title.clone();
        let banner: RenderFn =
            Arc::new(move |_: &Document, _: &Options| Fragment::from(site_title.as_str()));
        vec![
            (BODY_OUTLET.to_string(), body),
            (TITLE_OUTLET.to_string(), title),
            (BANNER.to_string(), banner),
        ]
    }

    fn default_layout(&self) -> Option<Layout> {
        Some(Layout::new(
            "default",
            vec![Region::new("Layout::Content").with_outlet(OutletBinding::new(BODY_OUTLET))],
        ))
    }
}
