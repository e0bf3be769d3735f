//! Memorial page slugs.

use std::sync::OnceLock;

use regex::Regex;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new("[^a-z0-9]+").expect("Invalid slug separator pattern"))
}

/// Derive a URL-safe slug from a display name.
///
/// The name is lowercased, every run of characters outside `[a-z0-9]`
/// becomes a single hyphen, and hyphens at either end are dropped. A name
/// with no ASCII letters or digits yields an empty slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    separator()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
