//! Naming conventions that turn source paths into document identities.
//!
//! Content plugins hand over source paths like `doc/010-Getting-Started.md`.
//! Each path component may carry an optional numeric ordering prefix (`NNN-`)
//! which is stripped from the identity:
//!
//! - `README.md` → `readme`
//! - `doc/010-Getting-Started.md` → `doc/getting-started`
//! - `doc/020-api/001-Index.md` → `doc/api/index`
//!
//! Identities map to output paths as `/{id}.html`, so `README.md` lands on
//! `/readme.html` until a rewrite rule moves it.

/// An entry name split into its ordering prefix and the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `20` from `020-Getting-Started`)
    pub number: Option<u32>,
    /// Raw name part after `NNN-`, dashes preserved. Empty if number-only.
    /// For unnumbered entries, this is the full input.
    pub name: String,
}

/// Parse an entry name following the `NNN-name` convention.
///
/// - `"020-Getting-Started"` → number=Some(20), name="Getting-Started"
/// - `"001"` → number=Some(1), name=""
/// - `"wip-drafts"` → number=None, name="wip-drafts"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-')
        && let Ok(num) = prefix.parse::<u32>()
    {
        return ParsedName {
            number: Some(num),
            name: rest.to_string(),
        };
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            name: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
    }
}

/// Derive a document identity from a source path.
///
/// Strips the extension of the last component, the numeric prefix of every
/// component, and lowercases the result. A number-only component keeps its
/// digits so it never collapses to an empty segment.
pub fn id_from_source(source: &str) -> String {
    let trimmed = source.trim_start_matches("./").trim_matches('/');
    let mut segments: Vec<String> = Vec::new();
    let mut components = trimmed.split('/').filter(|c| !c.is_empty()).peekable();
    while let Some(component) = components.next() {
        let stem = if components.peek().is_none() {
            component
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .filter(|stem| !stem.is_empty())
                .unwrap_or(component)
        } else {
            component
        };
        let parsed = parse_entry_name(stem);
        let segment = if parsed.name.is_empty() {
            stem
        } else {
            parsed.name.as_str()
        };
        segments.push(segment.to_lowercase());
    }
    segments.join("/")
}

/// Conventional output path for a document identity.
pub fn default_output_path(id: &str) -> String {
    format!("/{}.html", id.trim_matches('/'))
}
