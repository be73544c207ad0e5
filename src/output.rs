//! CLI output formatting.
//!
//! Each report has a `format_*` function returning lines (pure, testable) and
//! a `print_*` wrapper that writes them to stdout.
//!
//! ## Check
//!
//! ```text
//! Layouts
//! 001 default
//!     Layout::Content: Core::Body
//! 002 custom#1 [namespace: articles]
//!     Layout::Sidebar (flat): Core::Title
//!     Layout::Content (framed): Core::Body
//!
//! Rewrites
//!     /readme.html → /index.html
//!
//! Plugins
//! 001 core::theme (theme)
//! 002 core::documents (content)
//! ```
//!
//! ## Compose
//!
//! ```text
//! Pages
//! 001 /articles/intro.html ← articles/intro [custom#1]
//! 002 /index.html ← readme [default]
//!     Rewritten from: /readme.html
//!
//! Composed 2 pages (1 rewritten) from 2 documents
//! ```

use crate::layout::{Layout, Region};
use crate::pipeline::Pipeline;
use crate::registry::Registry;
use crate::site::Build;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn region_line(region: &Region) -> String {
    let flags: Vec<&str> = region
        .options
        .iter()
        .filter(|(_, v)| v.as_bool() == Some(true))
        .map(|(k, _)| k.as_str())
        .collect();
    let label = if flags.is_empty() {
        region.name.clone()
    } else {
        format!("{} ({})", region.name, flags.join(", "))
    };
    let outlets: Vec<&str> = region.outlets.iter().map(|o| o.name.as_str()).collect();
    if outlets.is_empty() {
        format!("    {label}: (empty)")
    } else {
        format!("    {label}: {}", outlets.join(", "))
    }
}

fn layout_lines(lines: &mut Vec<String>, index: usize, layout: &Layout, guard: Option<String>) {
    match guard {
        Some(guard) => lines.push(format!("{} {} [{}]", format_index(index), layout.name, guard)),
        None => lines.push(format!("{} {}", format_index(index), layout.name)),
    }
    lines.extend(layout.regions.iter().map(region_line));
}

/// Format the layouts, rewrite rules, and plugins of a configured site.
pub fn format_check_output(registry: &Registry, pipeline: &Pipeline) -> Vec<String> {
    let mut lines = vec!["Layouts".to_string()];
    let mut index = 1;
    match registry.default_layout() {
        Ok(layout) => {
            layout_lines(&mut lines, index, layout, None);
            index += 1;
        }
        Err(_) => lines.push("    default: supplied by theme".to_string()),
    }
    for custom in registry.custom_layouts() {
        layout_lines(
            &mut lines,
            index,
            &custom.layout,
            Some(custom.predicate.to_string()),
        );
        index += 1;
    }

    if !registry.rewrites().is_empty() {
        lines.push(String::new());
        lines.push("Rewrites".to_string());
        for rule in registry.rewrites() {
            lines.push(format!("    {} \u{2192} {}", rule.source, rule.destination));
        }
    }

    lines.push(String::new());
    lines.push("Plugins".to_string());
    if pipeline.plugins().is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, plugin) in pipeline.plugins().iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            plugin.name(),
            plugin.kind()
        ));
    }
    lines
}

pub fn print_check_output(registry: &Registry, pipeline: &Pipeline) {
    for line in format_check_output(registry, pipeline) {
        println!("{}", line);
    }
}

/// Format the composed page tree.
pub fn format_compose_output(build: &Build) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    let mut rewritten = 0;
    for (i, page) in build.pages.values().enumerate() {
        lines.push(format!(
            "{} {} \u{2190} {} [{}]",
            format_index(i + 1),
            page.path,
            page.document,
            page.layout
        ));
        if page.is_rewritten() {
            rewritten += 1;
            lines.push(format!("    Rewritten from: {}", page.source_path));
        }
    }
    for rule in build.unused_rewrites() {
        lines.push(format!(
            "    Unused rewrite: {} \u{2192} {}",
            rule.source, rule.destination
        ));
    }
    lines.push(String::new());
    let plural = if build.pages.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Composed {} page{} ({} rewritten) from {} documents",
        build.pages.len(),
        plural,
        rewritten,
        build.documents.len()
    ));
    lines
}

pub fn print_compose_output(build: &Build) {
    for line in format_compose_output(build) {
        println!("{}", line);
    }
}
