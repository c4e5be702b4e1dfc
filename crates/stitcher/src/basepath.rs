//! Base-path normalization for navigation detection.
//!
//! Two URLs count as the same page when their normalized paths compare equal:
//! digit runs collapse to `*` (numeric ids) and everything after a literal
//! `pages` segment collapses to `*` (per-page slugs). The normalized form is
//! used for equality only and is never stored as a canonical URL.

use chrono::{DateTime, Utc};
use url::Url;

pub fn normalize(url: &str) -> String {
    let path = extract_path(url);
    collapse_digit_runs(&truncate_after_pages(&path))
}

/// Midpoint between two instants; degenerates to `b` when `a == b`.
pub fn midpoint(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a + (b - a) / 2
}

fn extract_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative references fail to parse; take the raw string minus any
        // query or fragment.
        Err(_) => {
            let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
            url[..end].to_string()
        }
    }
}

fn truncate_after_pages(path: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        if segment == "pages" {
            kept.push(segment);
            kept.push("*");
            return kept.join("/");
        }
        kept.push(segment);
    }
    kept.join("/")
}

fn collapse_digit_runs(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_run = false;
    for c in path.chars() {
        if c.is_ascii_digit() {
            if !in_run {
                out.push('*');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn digit_runs_collapse() {
        assert_eq!(normalize("https://app.example/accounts/123/detail"), "/accounts/*/detail");
        assert_eq!(normalize("/orders/42/items/7"), "/orders/*/items/*");
        assert_eq!(normalize("/a/1"), "/a/*");
    }

    #[test]
    fn everything_after_pages_segment_collapses() {
        assert_eq!(normalize("/pages/123"), "/pages/*");
        assert_eq!(normalize("https://app.example/pages/welcome-page"), "/pages/*");
        assert_eq!(normalize("/site/pages/a/b/c"), "/site/pages/*");
    }

    #[test]
    fn pages_must_be_an_exact_segment() {
        assert_eq!(normalize("/subpages/7"), "/subpages/*");
        assert_eq!(normalize("/pages9/x"), "/pages*/x");
    }

    #[test]
    fn equivalent_templated_urls_compare_equal() {
        assert_eq!(normalize("/pages/123"), normalize("/pages/456"));
        assert_eq!(
            normalize("https://app.example/users/9/edit"),
            normalize("https://app.example/users/1024/edit")
        );
        assert_ne!(normalize("/a/1"), normalize("/b/2"));
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(normalize("https://app.example/a/1?tab=2#x"), "/a/*");
        assert_eq!(normalize("/a/1?tab=2"), "/a/*");
    }

    #[test]
    fn midpoint_falls_between() {
        let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let b = Utc.timestamp_opt(1_700_000_010, 0).unwrap();
        let mid = midpoint(a, b);
        assert!(mid > a && mid < b);
        assert_eq!(mid, Utc.timestamp_opt(1_700_000_005, 0).unwrap());
        assert_eq!(midpoint(a, a), a);
    }
}
