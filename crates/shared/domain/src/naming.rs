//! Human-readable names derived from slugs.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_\s]+").expect("valid regex"));

/// Title-case a slug: split on hyphens, underscores and whitespace, then
/// upper-case the first letter of every token.
///
/// `leg-day` becomes `Leg Day`.
pub fn humanize_slug(slug: &str) -> String {
    SLUG_SEPARATORS
        .split(slug.trim())
        .filter(|token| !token.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
