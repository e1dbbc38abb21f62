//! String-level URL handling shared by the crawl and download stages.
//!
//! Links are deduplicated by their raw text, so nothing here resolves
//! relative references or otherwise canonicalises a URL.

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Prefixes `http://` onto a seed URL that carries no HTTP scheme.
pub fn normalize_seed(url: &str) -> String {
    if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// Makes a discovered image link fetchable: scheme-relative links
/// (`//host/path`) get `http:`, scheme-less links get `http://`.
pub fn normalize_link(link: &str) -> String {
    if has_http_scheme(link) {
        link.to_string()
    } else if let Some(rest) = link.strip_prefix("//") {
        format!("http://{}", rest)
    } else {
        format!("http://{}", link)
    }
}

/// Local file name for a URL: everything after the last `/`.
///
/// Query strings are kept as part of the name, and two URLs sharing a final
/// segment map to the same file.
pub fn derived_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or_default()
}
