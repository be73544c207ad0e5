//! Page composition.
//!
//! For every document, in identity order:
//!
//! ```text
//! document ──resolve──▶ layout
//!          ──for region, for outlet──▶ render(document, outlet options)
//!          ──assemble──▶ page at document.output_path
//!          ──rewrite──▶ page at its final address
//! ```
//!
//! Every outlet binding of every layout is checked against the outlet
//! registry before the first document renders, so a configuration/plugin
//! mismatch aborts the build with no output at all. Rewriting happens last
//! and only changes where a page lands, never what was rendered into it.

use crate::layout::Layout;
use crate::pipeline::OutletRegistry;
use crate::registry::{Registry, RegistryError};
use crate::resolve::Resolver;
use crate::types::{Document, DocumentSet, Fragment, Options};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error(
        "Outlet `{outlet}` in region `{region}` of layout `{layout}` is not registered by any plugin{}",
        document_context(.document)
    )]
    UnresolvedOutlet {
        outlet: String,
        region: String,
        layout: String,
        document: Option<String>,
    },
    #[error("Documents `{first}` and `{second}` both land on `{path}`")]
    PathCollision {
        path: String,
        first: String,
        second: String,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn document_context(document: &Option<String>) -> String {
    match document {
        Some(id) => format!(" (while rendering `{id}`)"),
        None => String::new(),
    }
}

/// Rendered fragments of one region, in outlet declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRegion {
    pub name: String,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    pub fragments: Vec<Fragment>,
}

/// A composed page, ready for an external serializer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Final address after rewrite rules.
    pub path: String,
    /// Address before rewrite rules; equal to `path` when no rule applied.
    pub source_path: String,
    pub document: String,
    pub layout: String,
    pub regions: Vec<RenderedRegion>,
}

impl Page {
    /// All fragments in region order, then outlet order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.regions.iter().flat_map(|r| r.fragments.iter())
    }

    pub fn region(&self, name: &str) -> Option<&RenderedRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn is_rewritten(&self) -> bool {
        self.path != self.source_path
    }
}

/// Final path → page.
pub type PageTree = BTreeMap<String, Page>;

/// Renders documents through their resolved layouts.
///
/// Construction validates every outlet binding; a `Compositor` that exists can
/// render any document without hitting an unresolved outlet.
#[derive(Debug)]
pub struct Compositor<'a> {
    registry: &'a Registry,
    outlets: &'a OutletRegistry,
    resolver: Resolver<'a>,
}

impl<'a> Compositor<'a> {
    pub fn new(registry: &'a Registry, outlets: &'a OutletRegistry) -> Result<Self, ComposeError> {
        let resolver = Resolver::new(registry)?;
        validate_outlets(registry, outlets)?;
        Ok(Self {
            registry,
            outlets,
            resolver,
        })
    }

    /// Render one document into a page at its final address.
    pub fn compose_document(&self, document: &Document) -> Result<Page, ComposeError> {
        let layout = self.resolver.resolve(document);
        let regions = self.render_regions(layout, document)?;
        let path = self
            .registry
            .rewrite(&document.output_path)
            .unwrap_or(document.output_path.as_str())
            .to_string();
        if path != document.output_path {
            debug!(document = %document.id, from = %document.output_path, to = %path, "rewrote page");
        }
        Ok(Page {
            path,
            source_path: document.output_path.clone(),
            document: document.id.clone(),
            layout: layout.name.clone(),
            regions,
        })
    }

    /// Render every document. Fails as a whole: no partial page tree.
    pub fn compose(&self, documents: &DocumentSet) -> Result<PageTree, ComposeError> {
        let mut pages = PageTree::new();
        for document in documents.values() {
            let page = self.compose_document(document)?;
            if let Some(existing) = pages.get(&page.path) {
                return Err(ComposeError::PathCollision {
                    path: page.path,
                    first: existing.document.clone(),
                    second: page.document,
                });
            }
            pages.insert(page.path.clone(), page);
        }
        info!(pages = pages.len(), "composed page tree");
        Ok(pages)
    }

    fn render_regions(
        &self,
        layout: &Layout,
        document: &Document,
    ) -> Result<Vec<RenderedRegion>, ComposeError> {
        layout
            .regions
            .iter()
            .map(|region| {
                let fragments = region
                    .outlets
                    .iter()
                    .map(|binding| {
                        let render = self.outlets.get(&binding.name).ok_or_else(|| {
                            ComposeError::UnresolvedOutlet {
                                outlet: binding.name.clone(),
                                region: region.name.clone(),
                                layout: layout.name.clone(),
                                document: Some(document.id.clone()),
                            }
                        })?;
                        Ok(render(document, &binding.options))
                    })
                    .collect::<Result<Vec<_>, ComposeError>>()?;
                Ok(RenderedRegion {
                    name: region.name.clone(),
                    options: region.options.clone(),
                    fragments,
                })
            })
            .collect()
    }
}

/// Check that every outlet bound in any layout has an implementation.
pub fn validate_outlets(registry: &Registry, outlets: &OutletRegistry) -> Result<(), ComposeError> {
    for layout in registry.layouts() {
        for (region, binding) in layout.bindings() {
            if !outlets.contains(&binding.name) {
                return Err(ComposeError::UnresolvedOutlet {
                    outlet: binding.name.clone(),
                    region: region.name.clone(),
                    layout: layout.name.clone(),
                    document: None,
                });
            }
        }
    }
    Ok(())
}

/// Validate, then render every document into a page tree.
pub fn compose(
    registry: &Registry,
    documents: &DocumentSet,
    outlets: &OutletRegistry,
) -> Result<PageTree, ComposeError> {
    Compositor::new(registry, outlets)?.compose(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{
        MatchCondition, MatchDimension, MatchPredicate, OutletBinding, Region, RewriteRule,
    };
    use crate::test_helpers::*;

    fn documents(docs: Vec<Document>) -> DocumentSet {
        docs.into_iter().map(|d| (d.id.clone(), d)).collect()
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.fragments().map(Fragment::as_str).collect()
    }

    #[test]
    fn fragments_follow_region_then_outlet_order() {
        let registry = registry_with_default(vec![
            Region::new("A").with_outlet(OutletBinding::new("o1")),
            Region::new("B").with_outlet(OutletBinding::new("o2")),
        ]);
        let outlets = outlets_of(echo_theme("theme", &["o1", "o2"]));
        let docs = documents(vec![Document::new("readme", "hello")]);

        let pages = compose(&registry, &docs, &outlets).unwrap();
        let page = &pages["/readme.html"];
        assert_eq!(texts(page), vec!["o1:readme", "o2:readme"]);
        assert_eq!(page.regions[0].name, "A");
        assert_eq!(page.regions[1].name, "B");
    }

    #[test]
    fn multiple_outlets_in_one_region_keep_order() {
        let registry = registry_with_default(vec![Region::new("Content")
            .with_outlet(OutletBinding::new("o2"))
            .with_outlet(OutletBinding::new("o1"))]);
        let outlets = outlets_of(echo_theme("theme", &["o1", "o2"]));
        let docs = documents(vec![Document::new("a", "")]);
        let pages = compose(&registry, &docs, &outlets).unwrap();
        assert_eq!(texts(&pages["/a.html"]), vec!["o2:a", "o1:a"]);
    }

    #[test]
    fn outlet_options_reach_render_function() {
        let registry = registry_with_default(vec![Region::new("Content").with_outlet(
            OutletBinding::new("Core::Body").with_option("flat", true),
        )]);
        let outlets = outlets_of(options_theme("Core::Body"));
        let docs = documents(vec![Document::new("a", "")]);
        let pages = compose(&registry, &docs, &outlets).unwrap();
        assert_eq!(texts(&pages["/a.html"]), vec!["flat=true"]);
    }

    #[test]
    fn region_options_carried_to_page() {
        let registry = registry_with_default(vec![Region::new("Content")
            .with_option("framed", true)
            .with_outlet(OutletBinding::new("Core::Body"))]);
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("a", "x")]);
        let pages = compose(&registry, &docs, &outlets).unwrap();
        let region = pages["/a.html"].region("Content").unwrap();
        assert_eq!(region.options.get("framed"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn rewrite_moves_page_after_rendering() {
        let mut registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        registry
            .declare_rewrite(RewriteRule::new("/readme.html", "/index.html"))
            .unwrap();
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("readme", "hello")]);

        let pages = compose(&registry, &docs, &outlets).unwrap();
        assert!(!pages.contains_key("/readme.html"));
        let page = &pages["/index.html"];
        assert_eq!(texts(page), vec!["hello"]);
        assert_eq!(page.source_path, "/readme.html");
        assert!(page.is_rewritten());
        assert_eq!(page.layout, "default");
    }

    #[test]
    fn rewrite_does_not_affect_layout_selection() {
        let mut registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        registry
            .declare_layout(
                MatchPredicate::new(vec![MatchCondition::new(
                    MatchDimension::Url,
                    vec!["/index.html".into()],
                )]),
                Layout::new(
                    "custom#1",
                    vec![Region::new("Other").with_outlet(OutletBinding::new("Core::Body"))],
                ),
            )
            .unwrap();
        registry
            .declare_rewrite(RewriteRule::new("/readme.html", "/index.html"))
            .unwrap();
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("readme", "hello")]);
        let pages = compose(&registry, &docs, &outlets).unwrap();
        assert_eq!(pages["/index.html"].layout, "default");
    }

    #[test]
    fn custom_layout_regions_used_for_matching_namespace() {
        let mut registry = registry_with_default(vec![
            Region::new("Layout::Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        registry
            .declare_layout(
                MatchPredicate::namespace(["articles"]),
                Layout::new(
                    "custom#1",
                    vec![
                        Region::new("Layout::Sidebar").with_outlet(OutletBinding::new("o1")),
                        Region::new("Layout::Content").with_outlet(OutletBinding::new("Core::Body")),
                    ],
                ),
            )
            .unwrap();
        let pipeline = crate::pipeline::Pipeline::new()
            .with(body_theme())
            .with(echo_theme("extra", &["o1"]));
        let outlets = pipeline.run().unwrap().outlets;
        let docs = documents(vec![
            Document::new("articles/intro", "body").with_namespace("articles"),
            Document::new("readme", "hello"),
        ]);

        let pages = compose(&registry, &docs, &outlets).unwrap();
        let article = &pages["/articles/intro.html"];
        assert_eq!(article.layout, "custom#1");
        let names: Vec<&str> = article.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Layout::Sidebar", "Layout::Content"]);
        assert_eq!(pages["/readme.html"].layout, "default");
        assert_eq!(pages["/readme.html"].regions.len(), 1);
    }

    #[test]
    fn unresolved_outlet_fails_before_rendering() {
        let registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Markdown::Document")),
        ]);
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("readme", "hello")]);

        let first = compose(&registry, &docs, &outlets).unwrap_err();
        assert_eq!(
            first,
            ComposeError::UnresolvedOutlet {
                outlet: "Markdown::Document".into(),
                region: "Content".into(),
                layout: "default".into(),
                document: None,
            }
        );
        let second = compose(&registry, &docs, &outlets).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn unresolved_outlet_in_unused_custom_layout_still_fatal() {
        let mut registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        registry
            .declare_layout(
                MatchPredicate::namespace(["never"]),
                Layout::new(
                    "custom#1",
                    vec![Region::new("Nav").with_outlet(OutletBinding::new("Missing"))],
                ),
            )
            .unwrap();
        let outlets = outlets_of(body_theme());
        let err = Compositor::new(&registry, &outlets).unwrap_err();
        assert!(matches!(err, ComposeError::UnresolvedOutlet { ref layout, .. } if layout == "custom#1"));
    }

    #[test]
    fn missing_default_layout_is_error() {
        let registry = Registry::new();
        let outlets = OutletRegistry::new();
        assert!(matches!(
            Compositor::new(&registry, &outlets),
            Err(ComposeError::Registry(RegistryError::MissingDefaultLayout))
        ));
    }

    #[test]
    fn rewrite_into_existing_path_collides() {
        let mut registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        registry
            .declare_rewrite(RewriteRule::new("/readme.html", "/index.html"))
            .unwrap();
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("index", "i"), Document::new("readme", "r")]);
        let err = compose(&registry, &docs, &outlets).unwrap_err();
        assert_eq!(
            err,
            ComposeError::PathCollision {
                path: "/index.html".into(),
                first: "index".into(),
                second: "readme".into(),
            }
        );
    }

    #[test]
    fn empty_document_set_composes_empty_tree() {
        let registry = registry_with_default(vec![Region::new("Content")]);
        let outlets = OutletRegistry::new();
        let pages = compose(&registry, &DocumentSet::new(), &outlets).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn page_tree_serializes_fragments_as_strings() {
        let registry = registry_with_default(vec![
            Region::new("Content").with_outlet(OutletBinding::new("Core::Body")),
        ]);
        let outlets = outlets_of(body_theme());
        let docs = documents(vec![Document::new("readme", "hello")]);
        let pages = compose(&registry, &docs, &outlets).unwrap();
        let json = serde_json::to_value(&pages).unwrap();
        assert_eq!(
            json["/readme.html"]["regions"][0]["fragments"],
            serde_json::json!(["hello"])
        );
    }
}
