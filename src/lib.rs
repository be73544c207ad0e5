//! # docframe
//!
//! Layout composition engine for documentation sites. A declarative
//! configuration names layouts made of regions, regions made of outlets, and
//! an ordered list of plugins. Content plugins produce documents; theme
//! plugins implement outlets. docframe renders every document through its
//! layout and hands back a page tree for an external serializer to write.
//!
//! # Architecture: Four Steps
//!
//! ```text
//! 1. Registry     site.toml  →  layouts + rewrite rules     (validated on load)
//! 2. Pipeline     plugins    →  documents + outlets         (in declaration order)
//! 3. Resolver     document   →  layout                      (first match wins)
//! 4. Compositor   documents  →  page tree                   (rewrites applied last)
//! ```
//!
//! Each step finishes before the next begins, on one thread. Registry and
//! outlet registry are read-only once rendering starts, and any error aborts
//! the whole build: there is no partial page tree.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | Declared layouts and rewrite rules, with uniqueness checks |
//! | [`pipeline`] | Plugin traits, ordered execution, conflict-checked merging |
//! | [`resolve`] | First-match-wins layout selection |
//! | [`compose`] | Outlet validation, rendering, rewriting |
//! | [`layout`] | Region/outlet/layout model and match predicates |
//! | [`types`] | `Document`, `Fragment`, option maps |
//! | [`config`] | `site.toml` loading, stock defaults, validation |
//! | [`builtin`] | Plugin catalog, `core::documents`, `core::theme` |
//! | [`naming`] | Source path → document identity conventions |
//! | [`site`] | End-to-end build orchestration |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## First Match, Not Best Match
//!
//! Custom layouts are tried in the order they are declared. A document in
//! namespace `articles` that matches two layouts gets the first. Authors
//! order narrow matches before broad ones; the engine never ranks them.
//!
//! ## No Silent Shadowing
//!
//! Two plugins providing the same document, two themes registering the same
//! outlet, or two rewrite rules sharing a destination are all errors. Plugin
//! order decides ownership, never replacement.
//!
//! ## Eager Outlet Validation
//!
//! Every outlet bound in every layout, including custom layouts no document
//! matches, must resolve before the first page renders.

pub mod builtin;
pub mod compose;
pub mod config;
pub mod layout;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod site;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
