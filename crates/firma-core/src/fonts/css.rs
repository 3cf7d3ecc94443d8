//! Web-font stylesheet parsing
//!
//! A `css2` stylesheet carries one `@font-face` block per unicode range, each
//! preceded by a `/* subset */` comment. We only need the `src: url(...)`
//! entries and their declared formats.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LATIN_WOFF2: Regex =
        Regex::new(r#"/\* latin \*/[\s\S]*?src:\s*url\(([^)]+?)\)\s*format\(['"]woff2['"]\)"#)
            .expect("latin woff2 pattern");
    static ref ANY_WOFF2: Regex =
        Regex::new(r#"src:\s*url\(([^)]+?)\)\s*format\(['"]woff2['"]\)"#).expect("woff2 pattern");
    static ref TRUETYPE: Regex =
        Regex::new(r#"src:\s*url\(([^)]+?)\)\s*format\(['"]truetype['"]\)"#)
            .expect("truetype pattern");
}

/// Candidate font file URLs, most preferred first, without duplicates.
pub fn font_urls(css: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for pattern in [&*LATIN_WOFF2, &*ANY_WOFF2, &*TRUETYPE] {
        if let Some(url) = pattern.captures(css).and_then(|c| c.get(1)) {
            let url = url.as_str().trim_matches(|c| c == '\'' || c == '"').to_string();
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}
