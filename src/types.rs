//! Shared types that flow between the pipeline, the resolver, and the compositor.
//!
//! Documents are produced once by content plugins and never mutated afterwards.
//! Fragments are the opaque strings outlets produce; the compositor only orders
//! them, it never looks inside.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form rendering options attached to regions, outlets, and plugins.
///
/// Kept as JSON values so option maps survive the trip from `site.toml` to
/// the page tree handed to the serializer without a lossy conversion.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// All documents of one build, keyed by identity.
///
/// A `BTreeMap` so iteration (and therefore composition order) is stable.
pub type DocumentSet = BTreeMap<String, Document>;

/// A unit of content produced by a content plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identity, e.g. `readme` or `doc/getting-started`.
    pub id: String,
    /// Classification used to select custom layouts (e.g. `articles`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Address of the page before rewrite rules are applied.
    pub output_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Content as handed over by the content plugin (markdown, HTML, ...).
    #[serde(default)]
    pub body: String,
}

impl Document {
    /// Create a document with the conventional output path `/{id}.html`.
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            output_path: crate::naming::default_output_path(&id),
            id,
            namespace: None,
            title: None,
            body: body.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Title for display, falling back to the identity.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Output of a single outlet invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
