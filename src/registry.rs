//! Declarations of layouts and rewrite rules.
//!
//! The registry is filled once while the configuration loads and is read-only
//! afterwards: the resolver and compositor only ever borrow it immutably.
//! Every declaration is validated on the way in, so a registry that exists is
//! a registry whose layouts have unique region names and whose rewrite rules
//! have unique destinations.

use crate::layout::{CustomLayout, Layout, MatchPredicate, RewriteRule};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate region `{region}` in layout `{layout}`")]
    DuplicateRegion { layout: String, region: String },
    #[error(
        "Rewrite `{incoming}` -> `{destination}` conflicts with `{existing}` -> `{destination}`"
    )]
    ConflictingRewrite {
        destination: String,
        existing: String,
        incoming: String,
    },
    #[error("Rewrite source `{path}` is declared more than once")]
    DuplicateRewriteSource { path: String },
    #[error("A default layout is already declared")]
    DuplicateDefaultLayout,
    #[error("No default layout declared")]
    MissingDefaultLayout,
    #[error("Custom layout `{layout}` has an empty match predicate")]
    EmptyMatch { layout: String },
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    default_layout: Option<Layout>,
    custom_layouts: Vec<CustomLayout>,
    rewrites: Vec<RewriteRule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the layout used when no custom layout matches.
    pub fn declare_default_layout(&mut self, layout: Layout) -> Result<(), RegistryError> {
        if self.default_layout.is_some() {
            return Err(RegistryError::DuplicateDefaultLayout);
        }
        check_regions(&layout)?;
        self.default_layout = Some(layout);
        Ok(())
    }

    /// Declare a custom layout. Declaration order is match order.
    pub fn declare_layout(
        &mut self,
        predicate: MatchPredicate,
        layout: Layout,
    ) -> Result<(), RegistryError> {
        check_regions(&layout)?;
        if predicate.is_degenerate() {
            return Err(RegistryError::EmptyMatch {
                layout: layout.name,
            });
        }
        self.custom_layouts.push(CustomLayout { predicate, layout });
        Ok(())
    }

    pub fn declare_rewrite(&mut self, rule: RewriteRule) -> Result<(), RegistryError> {
        if let Some(existing) = self
            .rewrites
            .iter()
            .find(|r| r.destination == rule.destination)
        {
            return Err(RegistryError::ConflictingRewrite {
                destination: rule.destination,
                existing: existing.source.clone(),
                incoming: rule.source,
            });
        }
        if self.rewrites.iter().any(|r| r.source == rule.source) {
            return Err(RegistryError::DuplicateRewriteSource { path: rule.source });
        }
        self.rewrites.push(rule);
        Ok(())
    }

    pub fn default_layout(&self) -> Result<&Layout, RegistryError> {
        self.default_layout
            .as_ref()
            .ok_or(RegistryError::MissingDefaultLayout)
    }

    pub fn has_default_layout(&self) -> bool {
        self.default_layout.is_some()
    }

    pub fn custom_layouts(&self) -> &[CustomLayout] {
        &self.custom_layouts
    }

    /// Default layout first (if declared), then custom layouts in order.
    pub fn layouts(&self) -> impl Iterator<Item = &Layout> {
        self.default_layout
            .iter()
            .chain(self.custom_layouts.iter().map(|c| &c.layout))
    }

    pub fn rewrites(&self) -> &[RewriteRule] {
        &self.rewrites
    }

    /// Destination for an output path, if a rule's source matches it exactly.
    pub fn rewrite(&self, path: &str) -> Option<&str> {
        self.rewrites
            .iter()
            .find(|r| r.source == path)
            .map(|r| r.destination.as_str())
    }
}

fn check_regions(layout: &Layout) -> Result<(), RegistryError> {
    match layout.duplicate_region() {
        Some(region) => Err(RegistryError::DuplicateRegion {
            layout: layout.name.clone(),
            region: region.to_string(),
        }),
        None => Ok(()),
    }
}
