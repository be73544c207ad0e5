//! Layout resolution.
//!
//! Custom layouts are tried in declaration order and the first whose
//! predicate accepts the document wins. There is no specificity ranking:
//! configurations list narrower namespace sets before broader ones by hand.
//! When nothing matches, the default layout applies.

use crate::layout::Layout;
use crate::registry::{Registry, RegistryError};
use crate::types::Document;
use tracing::debug;

/// Picks the layout for each document. Pure: the same document and registry
/// always resolve to the same layout.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
    default_layout: &'a Layout,
}

impl<'a> Resolver<'a> {
    /// Fails if the registry has no default layout.
    pub fn new(registry: &'a Registry) -> Result<Self, RegistryError> {
        Ok(Self {
            registry,
            default_layout: registry.default_layout()?,
        })
    }

    pub fn resolve(&self, document: &Document) -> &'a Layout {
        let layout = self
            .registry
            .custom_layouts()
            .iter()
            .find(|custom| custom.predicate.evaluate(document))
            .map(|custom| &custom.layout)
            .unwrap_or(self.default_layout);
        debug!(document = %document.id, layout = %layout.name, "resolved layout");
        layout
    }
}
