//! Declarative layout model: regions, outlet bindings, match predicates, and
//! rewrite rules.
//!
//! A [`Layout`] is an ordered list of [`Region`]s; each region is an ordered
//! list of [`OutletBinding`]s. Order is significant at both levels because it
//! is the rendering order of the resulting page.
//!
//! Custom layouts carry a [`MatchPredicate`]: a conjunction of
//! [`MatchCondition`]s drawn from a closed set of match dimensions. Adding a
//! dimension means adding a variant here; the resolver's first-match-wins scan
//! does not change.

use crate::types::{Document, Options};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An outlet bound inside a region, with its own rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutletBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl OutletBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// A named slot in a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    pub name: String,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    #[serde(default)]
    pub outlets: Vec<OutletBinding>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
            outlets: Vec::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn with_outlet(mut self, outlet: OutletBinding) -> Self {
        self.outlets.push(outlet);
        self
    }
}

/// An ordered sequence of regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// Display name: `default`, or `custom#N` for the N-th custom layout.
    pub name: String,
    pub regions: Vec<Region>,
}

impl Layout {
    pub fn new(name: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            name: name.into(),
            regions,
        }
    }

    /// Every outlet binding in rendering order, paired with its region.
    pub fn bindings(&self) -> impl Iterator<Item = (&Region, &OutletBinding)> {
        self.regions
            .iter()
            .flat_map(|region| region.outlets.iter().map(move |outlet| (region, outlet)))
    }

    /// First pair of regions sharing a name, if any.
    pub fn duplicate_region(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.regions
            .iter()
            .find(|r| !seen.insert(r.name.as_str()))
            .map(|r| r.name.as_str())
    }
}

/// Match dimensions understood by custom layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDimension {
    Namespace,
    Url,
}

impl std::fmt::Display for MatchDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespace => write!(f, "namespace"),
            Self::Url => write!(f, "url"),
        }
    }
}

/// A single test over one match dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCondition {
    /// Document namespace is one of the listed namespaces. Documents without a
    /// namespace never match.
    Namespace(BTreeSet<String>),
    /// Pre-rewrite output path equals one of the patterns, or starts with a
    /// pattern's prefix when it ends in `*`.
    Url(Vec<String>),
}

impl MatchCondition {
    pub fn new(by: MatchDimension, on: Vec<String>) -> Self {
        match by {
            MatchDimension::Namespace => Self::Namespace(on.into_iter().collect()),
            MatchDimension::Url => Self::Url(on),
        }
    }

    pub fn dimension(&self) -> MatchDimension {
        match self {
            Self::Namespace(_) => MatchDimension::Namespace,
            Self::Url(_) => MatchDimension::Url,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Namespace(set) => set.iter().map(String::as_str).collect(),
            Self::Url(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Namespace(set) => set.is_empty(),
            Self::Url(patterns) => patterns.is_empty(),
        }
    }

    pub fn evaluate(&self, document: &Document) -> bool {
        match self {
            Self::Namespace(set) => document
                .namespace
                .as_ref()
                .is_some_and(|ns| set.contains(ns)),
            Self::Url(patterns) => patterns
                .iter()
                .any(|pattern| url_matches(pattern, &document.output_path)),
        }
    }
}

fn url_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

/// Conjunction of match conditions guarding a custom layout.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPredicate {
    conditions: Vec<MatchCondition>,
}

impl MatchPredicate {
    pub fn new(conditions: Vec<MatchCondition>) -> Self {
        Self { conditions }
    }

    pub fn namespace<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![MatchCondition::Namespace(
            namespaces.into_iter().map(Into::into).collect(),
        )])
    }

    pub fn conditions(&self) -> &[MatchCondition] {
        &self.conditions
    }

    /// A predicate with no conditions, or with a condition over an empty set,
    /// can never be satisfied meaningfully and is rejected at declaration.
    pub fn is_degenerate(&self) -> bool {
        self.conditions.is_empty() || self.conditions.iter().any(MatchCondition::is_empty)
    }

    pub fn evaluate(&self, document: &Document) -> bool {
        self.conditions.iter().all(|c| c.evaluate(document))
    }
}

impl std::fmt::Display for MatchPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|c| format!("{}: {}", c.dimension(), c.values().join(", ")))
            .collect();
        write!(f, "{}", clauses.join(" & "))
    }
}

/// A layout that applies only to documents its predicate accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomLayout {
    pub predicate: MatchPredicate,
    pub layout: Layout,
}

/// Final path substitution applied after rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    pub source: String,
    pub destination: String,
}

impl RewriteRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Document {
        Document::new("articles/intro", "").with_namespace("articles")
    }

    #[test]
    fn namespace_condition_matches_membership() {
        let cond = MatchCondition::new(
            MatchDimension::Namespace,
            vec!["guides".into(), "articles".into()],
        );
        assert!(cond.evaluate(&article()));
        assert!(!cond.evaluate(&Document::new("readme", "")));
    }

    #[test]
    fn namespace_condition_is_exact() {
        let cond = MatchCondition::new(MatchDimension::Namespace, vec!["articles".into()]);
        let nested = Document::new("x", "").with_namespace("articles.news");
        assert!(!cond.evaluate(&nested));
    }

    #[test]
    fn url_condition_exact_and_prefix() {
        let exact = MatchCondition::new(MatchDimension::Url, vec!["/readme.html".into()]);
        assert!(exact.evaluate(&Document::new("readme", "")));
        assert!(!exact.evaluate(&Document::new("readme2", "")));

        let prefix = MatchCondition::new(MatchDimension::Url, vec!["/articles/*".into()]);
        assert!(prefix.evaluate(&article()));
        assert!(!prefix.evaluate(&Document::new("readme", "")));
    }

    #[test]
    fn predicate_is_conjunction() {
        let predicate = MatchPredicate::new(vec![
            MatchCondition::new(MatchDimension::Namespace, vec!["articles".into()]),
            MatchCondition::new(MatchDimension::Url, vec!["/other/*".into()]),
        ]);
        assert!(!predicate.evaluate(&article()));
    }

    #[test]
    fn degenerate_predicates() {
        assert!(MatchPredicate::new(vec![]).is_degenerate());
        assert!(MatchPredicate::namespace(Vec::<String>::new()).is_degenerate());
        assert!(!MatchPredicate::namespace(["articles"]).is_degenerate());
    }

    #[test]
    fn predicate_display() {
        let predicate = MatchPredicate::namespace(["articles", "guides"]);
        assert_eq!(predicate.to_string(), "namespace: articles, guides");
    }

    #[test]
    fn bindings_follow_declaration_order() {
        let layout = Layout::new(
            "default",
            vec![
                Region::new("A")
                    .with_outlet(OutletBinding::new("o1"))
                    .with_outlet(OutletBinding::new("o2")),
                Region::new("B").with_outlet(OutletBinding::new("o3")),
            ],
        );
        let names: Vec<(&str, &str)> = layout
            .bindings()
            .map(|(r, o)| (r.name.as_str(), o.name.as_str()))
            .collect();
        assert_eq!(names, vec![("A", "o1"), ("A", "o2"), ("B", "o3")]);
    }

    #[test]
    fn duplicate_region_detected() {
        let layout = Layout::new(
            "default",
            vec![Region::new("A"), Region::new("B"), Region::new("A")],
        );
        assert_eq!(layout.duplicate_region(), Some("A"));
    }

    #[test]
    fn region_deserializes_from_toml() {
        let region: Region = toml::from_str(
            r#"
name = "Layout::Content"
options = { framed = true }
outlets = [{ name = "Markdown::Document" }, { name = "Markdown::Browser", options = { flat = true } }]
"#,
        )
        .unwrap();
        assert_eq!(region.options.get("framed"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(region.outlets.len(), 2);
        assert_eq!(
            region.outlets[1].options.get("flat"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
