use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

/// Width of the `categories.slug` column.
pub const MAX_SLUG_LEN: usize = 255;
// Leaves room for a `-<n>` suffix within MAX_SLUG_LEN.
const MAX_BASE_LEN: usize = MAX_SLUG_LEN - 15;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lowercases the title and collapses every run of non `[a-z0-9]` characters
/// into one hyphen, capped at `MAX_BASE_LEN`. May return an empty string.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();
    // Only ASCII survives the replacement, so any byte index is a boundary.
    if slug.len() > MAX_BASE_LEN {
        slug.truncate(MAX_BASE_LEN);
        slug.truncate(slug.trim_end_matches('-').len());
    }
    slug
}

/// `n == 1` is the bare slug, then `slug-2`, `slug-3`, ...
pub fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}

/// First candidate of `base` not present in `taken`.
pub fn first_free(base: &str, taken: &[String]) -> String {
    let taken: HashSet<&str> = taken.iter().map(String::as_str).collect();
    let mut n = 1;
    loop {
        let slug = candidate(base, n);
        if !taken.contains(slug.as_str()) {
            return slug;
        }
        n += 1;
    }
}
